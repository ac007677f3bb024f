use std::borrow::Cow;

use crate::geo::{GeoPoint, Ring};

pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Equirectangular projection of a lon/lat box onto a pixel viewport,
/// corrected by the cosine of the box's mid latitude and letterboxed.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    min: GeoPoint,
    max: GeoPoint,
    lon_scale: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    pub fn fit(min: GeoPoint, max: GeoPoint, width: f64, height: f64, margin: f64) -> Self {
        let mid_lat = ((min.lat + max.lat) / 2.0).to_radians();
        let lon_scale = mid_lat.cos().abs().max(1e-6);
        let geo_width = ((max.lon - min.lon) * lon_scale).max(1e-9);
        let geo_height = (max.lat - min.lat).max(1e-9);
        let usable_w = (width - 2.0 * margin).max(1.0);
        let usable_h = (height - 2.0 * margin).max(1.0);
        let scale = (usable_w / geo_width).min(usable_h / geo_height);
        Self {
            min,
            max,
            lon_scale,
            scale,
            offset_x: margin + (usable_w - geo_width * scale) / 2.0,
            offset_y: margin + (usable_h - geo_height * scale) / 2.0,
        }
    }

    /// A small box around `center`, for layers without geometry.
    pub fn around(center: GeoPoint, width: f64, height: f64, margin: f64) -> Self {
        let half = 0.05;
        Self::fit(
            GeoPoint {
                lon: center.lon - half,
                lat: center.lat - half,
            },
            GeoPoint {
                lon: center.lon + half,
                lat: center.lat + half,
            },
            width,
            height,
            margin,
        )
    }

    pub fn project(&self, point: GeoPoint) -> (f64, f64) {
        (
            self.offset_x + (point.lon - self.min.lon) * self.lon_scale * self.scale,
            self.offset_y + (self.max.lat - point.lat) * self.scale,
        )
    }

    /// Path data for a set of rings; holes render through `fill-rule="evenodd"`.
    pub fn path_data(&self, rings: &[Ring]) -> String {
        let mut data = String::new();
        for ring in rings {
            for (idx, point) in ring.iter().enumerate() {
                let (x, y) = self.project(*point);
                let command = if idx == 0 { 'M' } else { 'L' };
                data.push_str(&format!("{command}{x:.1},{y:.1}"));
            }
            data.push('Z');
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("Mobility & Accessibility"), "Mobility &amp; Accessibility");
        assert_eq!(escape("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn projection_keeps_north_up_and_inside_viewport() {
        let min = GeoPoint { lon: 5.0, lat: 52.0 };
        let max = GeoPoint { lon: 5.2, lat: 52.1 };
        let projection = Projection::fit(min, max, 400.0, 300.0, 10.0);
        let (x0, y0) = projection.project(GeoPoint { lon: 5.0, lat: 52.1 });
        let (x1, y1) = projection.project(GeoPoint { lon: 5.2, lat: 52.0 });
        assert!(x0 < x1);
        assert!(y0 < y1);
        for value in [x0, x1] {
            assert!((10.0 - 1e-9..=390.0 + 1e-9).contains(&value));
        }
        for value in [y0, y1] {
            assert!((10.0 - 1e-9..=290.0 + 1e-9).contains(&value));
        }
    }

    #[test]
    fn path_data_closes_each_ring() {
        let projection = Projection::around(GeoPoint { lon: 5.66, lat: 52.04 }, 100.0, 100.0, 0.0);
        let ring = vec![
            GeoPoint { lon: 5.65, lat: 52.03 },
            GeoPoint { lon: 5.67, lat: 52.03 },
            GeoPoint { lon: 5.66, lat: 52.05 },
        ];
        let data = projection.path_data(&[ring.clone(), ring]);
        assert_eq!(data.matches('M').count(), 2);
        assert_eq!(data.matches('Z').count(), 2);
    }
}
