//! The QoL drivers diagram: twelve drivers grouped by dimension and the
//! directed influences between them.

use std::{collections::BTreeMap, fmt::Write as _};

use serde::Serialize;

use crate::{palette::Rgb, scenario::Dimension, svg::escape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    SocialNetworks,
    CommunityParticipation,
    EmotionalSecurity,
    SenseOfAutonomy,
    Purpose,
    Downshift,
    ProximityToServices,
    GreenSpaces,
    MobilityAccessibility,
    SocialInfrastructures,
    Safety,
    PhysicalActivity,
}

impl Driver {
    pub const ALL: [Driver; 12] = [
        Driver::SocialNetworks,
        Driver::CommunityParticipation,
        Driver::EmotionalSecurity,
        Driver::SenseOfAutonomy,
        Driver::Purpose,
        Driver::Downshift,
        Driver::ProximityToServices,
        Driver::GreenSpaces,
        Driver::MobilityAccessibility,
        Driver::SocialInfrastructures,
        Driver::Safety,
        Driver::PhysicalActivity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Driver::SocialNetworks => "Social networks",
            Driver::CommunityParticipation => "Community participation",
            Driver::EmotionalSecurity => "Emotional security",
            Driver::SenseOfAutonomy => "Sense of autonomy",
            Driver::Purpose => "Purpose",
            Driver::Downshift => "Downshift",
            Driver::ProximityToServices => "Proximity to services",
            Driver::GreenSpaces => "Green spaces",
            Driver::MobilityAccessibility => "Mobility & accessibility",
            Driver::SocialInfrastructures => "Social infrastructures",
            Driver::Safety => "Safety",
            Driver::PhysicalActivity => "Physical activity & active lifestyle",
        }
    }

    pub fn dimension(self) -> Dimension {
        match self {
            Driver::SocialNetworks | Driver::CommunityParticipation => Dimension::Social,
            Driver::EmotionalSecurity
            | Driver::SenseOfAutonomy
            | Driver::Purpose
            | Driver::Downshift => Dimension::Psychological,
            Driver::ProximityToServices
            | Driver::GreenSpaces
            | Driver::MobilityAccessibility
            | Driver::SocialInfrastructures
            | Driver::Safety => Dimension::Environmental,
            Driver::PhysicalActivity => Dimension::Physical,
        }
    }
}

/// Frame and link colour for each dimension.
pub fn dimension_color(dimension: Dimension) -> Rgb {
    match dimension {
        Dimension::Social => Rgb::from_hex(0xff69b4),
        Dimension::Psychological => Rgb::from_hex(0xf39c12),
        Dimension::Environmental => Rgb::from_hex(0x27ae60),
        Dimension::Physical => Rgb::from_hex(0x3498db),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub from: Driver,
    pub to: Driver,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriversDiagram {
    links: Vec<Link>,
}

impl DriversDiagram {
    pub fn builtin() -> Self {
        use Driver::*;

        let environmental = [
            ProximityToServices,
            GreenSpaces,
            MobilityAccessibility,
            SocialInfrastructures,
            Safety,
        ];
        let mut links = Vec::new();
        for to in [SocialNetworks, CommunityParticipation] {
            links.extend(environmental.iter().map(|&from| Link { from, to }));
        }
        links.extend(
            [
                (GreenSpaces, EmotionalSecurity),
                (MobilityAccessibility, SenseOfAutonomy),
                (SocialInfrastructures, Downshift),
                (Safety, PhysicalActivity),
                (EmotionalSecurity, CommunityParticipation),
                (SenseOfAutonomy, CommunityParticipation),
                (Purpose, CommunityParticipation),
                (Downshift, PhysicalActivity),
            ]
            .into_iter()
            .map(|(from, to)| Link { from, to }),
        );
        Self { links }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn drivers_in(&self, dimension: Dimension) -> impl Iterator<Item = Driver> {
        Driver::ALL
            .into_iter()
            .filter(move |driver| driver.dimension() == dimension)
    }

    pub fn links_from(&self, driver: Driver) -> Vec<Driver> {
        self.links
            .iter()
            .filter(|link| link.from == driver)
            .map(|link| link.to)
            .collect()
    }

    pub fn links_into(&self, driver: Driver) -> Vec<Driver> {
        self.links
            .iter()
            .filter(|link| link.to == driver)
            .map(|link| link.from)
            .collect()
    }

    /// Link counts between dimensions, keyed `(source, target)`.
    pub fn dimension_links(&self) -> BTreeMap<(Dimension, Dimension), usize> {
        let mut counts = BTreeMap::new();
        for link in &self.links {
            *counts
                .entry((link.from.dimension(), link.to.dimension()))
                .or_insert(0) += 1;
        }
        counts
    }
}

const VIEW_WIDTH: f64 = 1100.0;
const VIEW_HEIGHT: f64 = 740.0;
const FRAME_WIDTH: f64 = 400.0;
const FRAME_HEIGHT: f64 = 280.0;
const PILL_HEIGHT: f64 = 36.0;
const PILL_GAP: f64 = 8.0;
const PILL_TOP: f64 = 56.0;

#[derive(Debug, Clone, Copy)]
struct Pill {
    x: f64,
    y: f64,
    width: f64,
}

impl Pill {
    fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + PILL_HEIGHT / 2.0)
    }

    /// Point on the pill edge facing `toward`.
    fn anchor(&self, toward: (f64, f64)) -> (f64, f64) {
        let (cx, cy) = self.center();
        let dx = toward.0 - cx;
        let dy = toward.1 - cy;
        if dx.abs() * PILL_HEIGHT >= dy.abs() * self.width {
            (cx + self.width / 2.0 * dx.signum(), cy)
        } else {
            (cx, cy + PILL_HEIGHT / 2.0 * dy.signum())
        }
    }
}

/// Social and psychological frames on the left, environmental and physical
/// on the right, matching the report figure.
fn frame_origin(dimension: Dimension) -> (f64, f64) {
    match dimension {
        Dimension::Social => (70.0, 60.0),
        Dimension::Psychological => (70.0, 390.0),
        Dimension::Environmental => (630.0, 60.0),
        Dimension::Physical => (630.0, 390.0),
    }
}

fn layout(diagram: &DriversDiagram) -> BTreeMap<Driver, Pill> {
    let mut pills = BTreeMap::new();
    for dimension in Dimension::ALL {
        let (fx, fy) = frame_origin(dimension);
        for (idx, driver) in diagram.drivers_in(dimension).enumerate() {
            let width = (driver.label().chars().count() as f64 * 9.5 + 40.0).min(FRAME_WIDTH - 40.0);
            pills.insert(
                driver,
                Pill {
                    x: fx + (FRAME_WIDTH - width) / 2.0,
                    y: fy + PILL_TOP + idx as f64 * (PILL_HEIGHT + PILL_GAP),
                    width,
                },
            );
        }
    }
    pills
}

pub fn render_drivers_svg(diagram: &DriversDiagram) -> String {
    let pills = layout(diagram);
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg viewBox="0 0 {VIEW_WIDTH} {VIEW_HEIGHT}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="Drivers diagram">"#
    );
    svg.push_str("<defs>\n");
    for dimension in Dimension::ALL {
        let _ = writeln!(
            svg,
            r#"<marker id="arrow-{}" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth"><path d="M0,0 L10,3 L0,6 z" fill="{}"/></marker>"#,
            marker_id(dimension),
            dimension_color(dimension)
        );
    }
    svg.push_str("</defs>\n");

    for dimension in Dimension::ALL {
        let (fx, fy) = frame_origin(dimension);
        let color = dimension_color(dimension);
        let _ = writeln!(
            svg,
            r#"<rect x="{fx}" y="{fy}" width="{FRAME_WIDTH}" height="{FRAME_HEIGHT}" rx="20" ry="20" fill="none" stroke="{color}" stroke-width="4"/>"#
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="22" font-weight="800" fill="{color}">{}</text>"#,
            fx + 30.0,
            fy + 40.0,
            dimension.label().to_uppercase()
        );
    }

    for link in diagram.links() {
        let (Some(source), Some(target)) = (pills.get(&link.from), pills.get(&link.to)) else {
            continue;
        };
        let start = source.anchor(target.center());
        let end = target.anchor(source.center());
        let bend = (end.0 - start.0) * 0.35;
        let dimension = link.from.dimension();
        let _ = writeln!(
            svg,
            r#"<path d="M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}" stroke="{}" stroke-width="4" fill="none" opacity="0.85" marker-end="url(#arrow-{})"><title>{} → {}</title></path>"#,
            start.0,
            start.1,
            start.0 + bend,
            start.1,
            end.0 - bend,
            end.1,
            end.0,
            end.1,
            dimension_color(dimension),
            marker_id(dimension),
            escape(link.from.label()),
            escape(link.to.label())
        );
    }

    for (driver, pill) in &pills {
        let (cx, cy) = pill.center();
        let _ = writeln!(
            svg,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{PILL_HEIGHT}" rx="18" ry="18" fill="{}" stroke="#ffffff" stroke-width="3"/><text x="{cx:.1}" y="{:.1}" font-size="16" font-weight="700" fill="#ffffff" text-anchor="middle">{}</text>"##,
            pill.x,
            pill.y,
            pill.width,
            dimension_color(driver.dimension()),
            cy + 6.0,
            escape(driver.label())
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn marker_id(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Social => "social",
        Dimension::Psychological => "psychological",
        Dimension::Environmental => "environmental",
        Dimension::Physical => "physical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_environmental_driver_feeds_both_social_drivers() {
        let diagram = DriversDiagram::builtin();
        for driver in diagram.drivers_in(Dimension::Environmental) {
            let targets = diagram.links_from(driver);
            assert!(targets.contains(&Driver::SocialNetworks));
            assert!(targets.contains(&Driver::CommunityParticipation));
        }
        assert_eq!(diagram.links().len(), 18);
    }

    #[test]
    fn physical_activity_has_two_sources() {
        let diagram = DriversDiagram::builtin();
        assert_eq!(
            diagram.links_into(Driver::PhysicalActivity),
            vec![Driver::Safety, Driver::Downshift]
        );
        assert!(diagram.links_from(Driver::PhysicalActivity).is_empty());
    }

    #[test]
    fn dimension_counts_aggregate_links() {
        let counts = DriversDiagram::builtin().dimension_links();
        assert_eq!(counts[&(Dimension::Environmental, Dimension::Social)], 10);
        assert_eq!(counts[&(Dimension::Environmental, Dimension::Psychological)], 3);
        assert_eq!(counts[&(Dimension::Environmental, Dimension::Physical)], 1);
        assert_eq!(counts[&(Dimension::Psychological, Dimension::Social)], 3);
        assert_eq!(counts[&(Dimension::Psychological, Dimension::Physical)], 1);
        assert_eq!(counts.values().sum::<usize>(), 18);
    }

    #[test]
    fn every_driver_has_one_dimension_group() {
        let diagram = DriversDiagram::builtin();
        let total: usize = Dimension::ALL
            .into_iter()
            .map(|dimension| diagram.drivers_in(dimension).count())
            .sum();
        assert_eq!(total, Driver::ALL.len());
        assert_eq!(diagram.drivers_in(Dimension::Environmental).count(), 5);
    }

    #[test]
    fn svg_has_a_pill_per_driver_and_a_path_per_link() {
        let diagram = DriversDiagram::builtin();
        let svg = render_drivers_svg(&diagram);
        assert_eq!(svg.matches("text-anchor=\"middle\"").count(), 12);
        assert_eq!(svg.matches("marker-end=").count(), 18);
        assert!(svg.contains("Mobility &amp; accessibility"));
        assert!(svg.contains("#ff69b4"));
    }
}
