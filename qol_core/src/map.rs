//! Choropleth view: one shared scale over neighbourhoods and the municipal
//! reference, shaded regions and the SVG rendering of both.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    bundle::DataBundle,
    catalog::IndicatorDefinition,
    classify::{build_scale, classify, Classification, ClassificationScale, ColorMode},
    config::{MapConfig, MapSize},
    geo::{GeoPoint, Region, RegionLayer},
    palette::{Rgb, REDS},
    reading::{display_decimals, format_reading},
    svg::{escape, Projection},
};

const MARGIN: f64 = 16.0;
const LEGEND_HEIGHT: f64 = 56.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionShade {
    pub name: String,
    pub value: Option<f64>,
    pub value_text: String,
    pub classification: Classification,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub definition: IndicatorDefinition,
    pub mode: ColorMode,
    pub scale: ClassificationScale,
    pub neighbourhoods: Vec<RegionShade>,
    pub municipality: Option<RegionShade>,
    pub decimals: usize,
}

impl MapView {
    pub fn build(
        bundle: &DataBundle,
        definition: &IndicatorDefinition,
        mode: ColorMode,
        map: &MapConfig,
    ) -> Self {
        let mode = match mode {
            ColorMode::Discrete { classes, binning } => ColorMode::Discrete {
                classes: map.clamp_classes(classes),
                binning,
            },
            ColorMode::Continuous => ColorMode::Continuous,
        };
        let column = &definition.column_key;
        let neighbourhood_values: Vec<Option<f64>> = bundle
            .neighbourhoods
            .values_for(column)
            .into_iter()
            .map(|entry| entry.value)
            .collect();
        let reference = bundle.municipal_reference(column);

        let mut combined = neighbourhood_values.clone();
        if reference.is_some() {
            combined.push(reference);
        }
        let scale = build_scale(&combined, mode);
        let decimals = display_decimals(&neighbourhood_values);

        let shade = |region: &Region, value: Option<f64>| {
            let classification = classify(value, &scale);
            RegionShade {
                name: region.name.clone(),
                value,
                value_text: format_reading(value, decimals),
                classification,
                color: REDS.color_for(classification),
            }
        };
        let neighbourhoods = bundle
            .neighbourhoods
            .regions()
            .iter()
            .zip(&neighbourhood_values)
            .map(|(region, value)| shade(region, *value))
            .collect();
        let municipality = bundle
            .municipality
            .first()
            .map(|region| shade(region, reference));

        tracing::debug!(
            target: "qol::classify",
            column = %column,
            mode = ?mode,
            "map_view.built"
        );
        Self {
            definition: definition.clone(),
            mode,
            scale,
            neighbourhoods,
            municipality,
            decimals,
        }
    }

    /// Caption under the legend: label plus unit.
    pub fn caption(&self) -> String {
        self.definition.axis_label()
    }

    /// `(label, colour)` legend entries.
    pub fn legend(&self) -> Vec<(String, Rgb)> {
        let swatches = REDS.legend(&self.scale);
        match self.scale.boundaries() {
            Some(boundaries) => boundaries
                .windows(2)
                .zip(swatches)
                .map(|(pair, color)| {
                    (
                        format!("{} – {}", trim_number(pair[0]), trim_number(pair[1])),
                        color,
                    )
                })
                .collect(),
            None => {
                let last = swatches.len().saturating_sub(1).max(1) as f64;
                let (min, max) = (self.scale.min(), self.scale.max());
                swatches
                    .into_iter()
                    .enumerate()
                    .map(|(idx, color)| {
                        let value = min + (max - min) * idx as f64 / last;
                        (format_reading(Some(value), self.decimals), color)
                    })
                    .collect()
            }
        }
    }
}

fn trim_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Which outline layers to draw on top of the shaded regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlays {
    pub districts: bool,
    pub municipality_outline: bool,
    pub boundary: bool,
}

impl Default for Overlays {
    fn default() -> Self {
        Self {
            districts: true,
            municipality_outline: true,
            boundary: true,
        }
    }
}

pub fn render_choropleth_svg(
    view: &MapView,
    bundle: &DataBundle,
    map: &MapConfig,
    size: MapSize,
    overlays: Overlays,
) -> String {
    let width = map.width() as f64;
    let height = map.height(size) as f64;
    let map_height = (height - LEGEND_HEIGHT).max(MARGIN * 4.0);
    let projection = fit_projection(bundle, map, width, map_height);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg viewBox="0 0 {width} {height}" width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{}">"#,
        escape(&view.caption())
    );
    let _ = writeln!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);

    if let (Some(region), Some(shade)) = (bundle.municipality.first(), &view.municipality) {
        write_region(&mut svg, &projection, region, shade, 0.55, "#555555", 0.7);
    }
    let _ = writeln!(svg, r#"<g id="neighbourhoods">"#);
    for (region, shade) in bundle.neighbourhoods.regions().iter().zip(&view.neighbourhoods) {
        write_region(&mut svg, &projection, region, shade, 0.85, "#333333", 0.6);
    }
    let _ = writeln!(svg, "</g>");

    if overlays.districts {
        write_outline(&mut svg, &projection, &bundle.districts, "#222222", 1.0);
    }
    if overlays.municipality_outline {
        write_outline(&mut svg, &projection, &bundle.municipality, "#000000", 1.6);
    }
    if overlays.boundary {
        write_outline(&mut svg, &projection, &bundle.boundary, "#1f77b4", 2.2);
        if let Some(point) = bundle.boundary.top_label_point() {
            let (x, y) = projection.project(point);
            let _ = writeln!(
                svg,
                r##"<text x="{x:.1}" y="{:.1}" font-size="14" font-weight="700" fill="#111111" stroke="#ffffff" stroke-width="3" paint-order="stroke">{}</text>"##,
                y - 4.0,
                escape(map.boundary_label())
            );
        }
    }

    write_legend(&mut svg, view, width, height);
    svg.push_str("</svg>\n");
    svg
}

fn fit_projection(bundle: &DataBundle, map: &MapConfig, width: f64, height: f64) -> Projection {
    let layers = [
        &bundle.municipality,
        &bundle.neighbourhoods,
        &bundle.districts,
        &bundle.boundary,
    ];
    let bounds = layers
        .iter()
        .filter_map(|layer| layer.bounds())
        .reduce(|(min_a, max_a), (min_b, max_b)| {
            (
                GeoPoint {
                    lon: min_a.lon.min(min_b.lon),
                    lat: min_a.lat.min(min_b.lat),
                },
                GeoPoint {
                    lon: max_a.lon.max(max_b.lon),
                    lat: max_a.lat.max(max_b.lat),
                },
            )
        });
    match bounds {
        Some((min, max)) => Projection::fit(min, max, width, height, MARGIN),
        None => {
            let center = bundle
                .municipality
                .center()
                .unwrap_or_else(|| map.fallback_center());
            Projection::around(center, width, height, MARGIN)
        }
    }
}

fn write_region(
    svg: &mut String,
    projection: &Projection,
    region: &Region,
    shade: &RegionShade,
    fill_opacity: f64,
    stroke: &str,
    stroke_width: f64,
) {
    if region.rings.is_empty() {
        return;
    }
    let _ = writeln!(
        svg,
        r#"<path d="{}" fill="{}" fill-opacity="{fill_opacity}" fill-rule="evenodd" stroke="{stroke}" stroke-width="{stroke_width}"><title>{}: {}</title></path>"#,
        projection.path_data(&region.rings),
        shade.color,
        escape(&shade.name),
        escape(&shade.value_text)
    );
}

fn write_outline(
    svg: &mut String,
    projection: &Projection,
    layer: &RegionLayer,
    stroke: &str,
    stroke_width: f64,
) {
    for region in layer.regions().iter().filter(|region| !region.rings.is_empty()) {
        let _ = writeln!(
            svg,
            r#"<path d="{}" fill="none" stroke="{stroke}" stroke-width="{stroke_width}" pointer-events="none"/>"#,
            projection.path_data(&region.rings)
        );
    }
}

fn write_legend(svg: &mut String, view: &MapView, width: f64, height: f64) {
    let entries = view.legend();
    if entries.is_empty() {
        return;
    }
    let top = height - LEGEND_HEIGHT + 8.0;
    let swatch_width = ((width - 2.0 * MARGIN) / entries.len() as f64).max(1.0);
    let _ = writeln!(svg, r##"<g id="legend" font-size="10" fill="#222222">"##);
    let _ = writeln!(
        svg,
        r#"<text x="{MARGIN}" y="{:.1}" font-size="12" font-weight="600">{}</text>"#,
        top - 2.0,
        escape(&view.caption())
    );
    for (idx, (label, color)) in entries.iter().enumerate() {
        let x = MARGIN + swatch_width * idx as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{:.1}" width="{swatch_width:.1}" height="12" fill="{color}"/><text x="{x:.1}" y="{:.1}">{}</text>"#,
            top + 4.0,
            top + 30.0,
            escape(label)
        );
    }
    let _ = writeln!(svg, "</g>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::IndicatorCatalog, classify::Binning, palette::NO_DATA};

    const NEIGHBOURHOODS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"buurtnaam": "De Burgen", "v": 10},
             "geometry": {"type": "Polygon", "coordinates": [[[5.60, 52.00], [5.62, 52.00], [5.62, 52.02], [5.60, 52.00]]]}},
            {"type": "Feature", "properties": {"buurtnaam": "Rietkampen", "v": 30},
             "geometry": {"type": "Polygon", "coordinates": [[[5.62, 52.00], [5.64, 52.00], [5.64, 52.02], [5.62, 52.00]]]}},
            {"type": "Feature", "properties": {"buurtnaam": "Stadspoort & Co", "v": null},
             "geometry": {"type": "Polygon", "coordinates": [[[5.64, 52.00], [5.66, 52.00], [5.66, 52.02], [5.64, 52.00]]]}}
        ]
    }"#;

    const MUNICIPALITY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "Ede", "v": 20},
             "geometry": {"type": "Polygon", "coordinates": [[[5.55, 51.98], [5.70, 51.98], [5.70, 52.06], [5.55, 51.98]]]}}
        ]
    }"#;

    fn bundle() -> DataBundle {
        DataBundle {
            catalog: IndicatorCatalog::default(),
            neighbourhoods: RegionLayer::from_geojson_str(NEIGHBOURHOODS).expect("layer parses"),
            municipality: RegionLayer::from_geojson_str(MUNICIPALITY).expect("layer parses"),
            districts: RegionLayer::empty(),
            boundary: RegionLayer::from_geojson_str(MUNICIPALITY).expect("layer parses"),
        }
    }

    fn definition() -> IndicatorDefinition {
        IndicatorDefinition {
            dimension: "Social".to_string(),
            label: "Volunteers".to_string(),
            column_key: "v".to_string(),
            unit: "%".to_string(),
        }
    }

    #[test]
    fn scale_spans_neighbourhoods_and_reference() {
        let view = MapView::build(&bundle(), &definition(), ColorMode::Continuous, &MapConfig::default());
        assert_eq!(view.scale.min(), 10.0);
        assert_eq!(view.scale.max(), 30.0);
        let municipality = view.municipality.as_ref().expect("municipality shaded");
        assert_eq!(municipality.classification, Classification::Position(0.5));
        assert_eq!(view.neighbourhoods[2].color, NO_DATA);
        assert_eq!(view.neighbourhoods[2].value_text, "n/a");
    }

    #[test]
    fn discrete_classes_are_clamped_to_config() {
        let mode = ColorMode::Discrete {
            classes: 42,
            binning: Binning::EqualInterval,
        };
        let map = MapConfig::default();
        let view = MapView::build(&bundle(), &definition(), mode, &map);
        assert_eq!(view.scale.class_count(), Some(map.clamp_classes(42)));
        assert_eq!(view.legend().len(), map.clamp_classes(42));
    }

    #[test]
    fn svg_carries_titles_legend_and_label() {
        let bundle = bundle();
        let map = MapConfig::default();
        let view = MapView::build(&bundle, &definition(), ColorMode::Continuous, &map);
        let svg = render_choropleth_svg(&view, &bundle, &map, MapSize::Normal, Overlays::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<title>De Burgen: 10.00</title>"));
        assert!(svg.contains("<title>Stadspoort &amp; Co: n/a</title>"));
        assert!(svg.contains("Volunteers [%]"));
        assert!(svg.contains(&escape(map.boundary_label()).into_owned()));
        assert!(svg.contains(r##"fill="#cccccc""##));
    }

    #[test]
    fn empty_layers_fall_back_to_configured_center() {
        let bundle = DataBundle {
            catalog: IndicatorCatalog::default(),
            neighbourhoods: RegionLayer::empty(),
            municipality: RegionLayer::empty(),
            districts: RegionLayer::empty(),
            boundary: RegionLayer::empty(),
        };
        let map = MapConfig::default();
        let view = MapView::build(&bundle, &definition(), ColorMode::Continuous, &map);
        assert!(view.neighbourhoods.is_empty());
        assert!(view.municipality.is_none());
        let svg = render_choropleth_svg(&view, &bundle, &map, MapSize::HalfPage, Overlays::default());
        assert!(svg.contains(&format!(r#"height="{}""#, map.height(MapSize::HalfPage))));
    }
}
