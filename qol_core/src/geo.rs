//! GeoJSON region layers.
//!
//! Every geometry is normalised to a flat list of rings before anything else
//! sees it, so callers never branch on `Polygon` versus `MultiPolygon`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

use crate::reading::{parse_reading, EntityValue};

/// Property keys tried, in order, for a region's display name.
pub const NAME_KEYS: [&str; 4] = ["buurtnaam", "Buurtnaam", "name", "NAAM"];
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

pub type Ring = Vec<GeoPoint>;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to read region layer from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse region layer: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("region layer must be a FeatureCollection, found {found:?}")]
    NotFeatureCollection { found: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: String,
    pub rings: Vec<Ring>,
    pub properties: JsonMap<String, Value>,
}

impl Region {
    fn from_feature(feature: &Value) -> Self {
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let name = NAME_KEYS
            .iter()
            .filter_map(|key| properties.get(*key))
            .find_map(|value| match value {
                Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let rings = feature.get("geometry").map(geometry_rings).unwrap_or_default();
        Self {
            name,
            rings,
            properties,
        }
    }

    pub fn reading(&self, column: &str) -> Option<f64> {
        parse_reading(self.properties.get(column))
    }

    pub fn points(&self) -> impl Iterator<Item = &GeoPoint> {
        self.rings.iter().flatten()
    }
}

fn geometry_rings(geometry: &Value) -> Vec<Ring> {
    let coordinates = geometry.get("coordinates");
    match (geometry.get("type").and_then(Value::as_str), coordinates) {
        (Some("Polygon"), Some(polygon)) => polygon_rings(polygon),
        (Some("MultiPolygon"), Some(Value::Array(polygons))) => {
            polygons.iter().flat_map(polygon_rings).collect()
        }
        _ => Vec::new(),
    }
}

fn polygon_rings(polygon: &Value) -> Vec<Ring> {
    let Some(rings) = polygon.as_array() else {
        return Vec::new();
    };
    rings
        .iter()
        .filter_map(Value::as_array)
        .map(|ring| ring.iter().filter_map(parse_point).collect::<Ring>())
        .filter(|ring| !ring.is_empty())
        .collect()
}

fn parse_point(raw: &Value) -> Option<GeoPoint> {
    let coords = raw.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some(GeoPoint { lon, lat })
}

/// A `FeatureCollection` of named regions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionLayer {
    regions: Vec<Region>,
}

impl RegionLayer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_geojson_str(json: &str) -> Result<Self, GeoError> {
        let document: Value = serde_json::from_str(json)?;
        match document.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {}
            other => {
                return Err(GeoError::NotFeatureCollection {
                    found: other.map(str::to_string),
                })
            }
        }
        let regions = document
            .get("features")
            .and_then(Value::as_array)
            .map(|features| features.iter().map(Region::from_feature).collect())
            .unwrap_or_default();
        Ok(Self { regions })
    }

    pub fn from_file(path: &Path) -> Result<Self, GeoError> {
        let contents = fs::read_to_string(path).map_err(|source| GeoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::from_geojson_str(&contents)?;
        tracing::info!(
            target: "qol::data",
            path = %path.display(),
            regions = layer.len(),
            "region_layer.loaded"
        );
        Ok(layer)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn first(&self) -> Option<&Region> {
        self.regions.first()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.regions
            .iter()
            .any(|region| region.properties.contains_key(column))
    }

    /// Readings for `column`, one per region, in feature order.
    pub fn values_for(&self, column: &str) -> Vec<EntityValue> {
        self.regions
            .iter()
            .map(|region| EntityValue::new(region.name.clone(), region.reading(column)))
            .collect()
    }

    /// Mean of all ring points, or `None` for a layer without geometry.
    pub fn center(&self) -> Option<GeoPoint> {
        let (sum_lon, sum_lat, count) = self
            .regions
            .iter()
            .flat_map(|region| region.points())
            .fold((0.0, 0.0, 0usize), |(lon, lat, n), point| {
                (lon + point.lon, lat + point.lat, n + 1)
            });
        (count > 0).then(|| GeoPoint {
            lon: sum_lon / count as f64,
            lat: sum_lat / count as f64,
        })
    }

    /// Northernmost point of the layer; used to anchor its label.
    pub fn top_label_point(&self) -> Option<GeoPoint> {
        self.regions
            .iter()
            .flat_map(|region| region.points())
            .copied()
            .max_by(|a, b| a.lat.total_cmp(&b.lat))
    }

    /// `(min, max)` corners over every point.
    pub fn bounds(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.regions.iter().flat_map(|region| region.points()).fold(None, |acc, point| {
            Some(match acc {
                None => (*point, *point),
                Some((min, max)) => (
                    GeoPoint {
                        lon: min.lon.min(point.lon),
                        lat: min.lat.min(point.lat),
                    },
                    GeoPoint {
                        lon: max.lon.max(point.lon),
                        lat: max.lat.max(point.lat),
                    },
                ),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"buurtnaam": "De Burgen", "x_col": 12},
                "geometry": {"type": "Polygon", "coordinates": [[[5.0, 52.0], [5.1, 52.0], [5.1, 52.1], [5.0, 52.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAAM": "De Horsten", "x_col": "n.v.t."},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[5.2, 52.0], [5.3, 52.0], [5.3, 52.2], [5.2, 52.0]]],
                    [[[5.4, 52.0], [5.5, 52.0], [5.5, 52.1], [5.4, 52.0]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "Point", "coordinates": [5.0, 52.0]}
            }
        ]
    }"#;

    #[test]
    fn regions_are_normalised() {
        let layer = RegionLayer::from_geojson_str(LAYER).expect("layer parses");
        assert_eq!(layer.len(), 3);
        let names: Vec<&str> = layer.regions().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["De Burgen", "De Horsten", UNKNOWN_NAME]);
        assert_eq!(layer.regions()[0].rings.len(), 1);
        assert_eq!(layer.regions()[1].rings.len(), 2);
        assert!(layer.regions()[2].rings.is_empty());
    }

    #[test]
    fn values_keep_missing_entries() {
        let layer = RegionLayer::from_geojson_str(LAYER).expect("layer parses");
        let values = layer.values_for("x_col");
        assert_eq!(values[0], EntityValue::new("De Burgen", Some(12.0)));
        assert!(values[1].is_missing());
        assert!(values[2].is_missing());
        assert!(layer.has_column("x_col"));
        assert!(!layer.has_column("y_col"));
    }

    #[test]
    fn label_point_is_northernmost() {
        let layer = RegionLayer::from_geojson_str(LAYER).expect("layer parses");
        let top = layer.top_label_point().expect("has points");
        assert_eq!(top, GeoPoint { lon: 5.3, lat: 52.2 });
        let (min, max) = layer.bounds().expect("has points");
        assert_eq!(min, GeoPoint { lon: 5.0, lat: 52.0 });
        assert_eq!(max, GeoPoint { lon: 5.5, lat: 52.2 });
    }

    #[test]
    fn rejects_other_documents() {
        let err = RegionLayer::from_geojson_str(r#"{"type": "Feature"}"#).unwrap_err();
        assert!(matches!(err, GeoError::NotFeatureCollection { found: Some(ref t) } if t == "Feature"));
    }

    #[test]
    fn missing_features_means_empty_layer() {
        let layer = RegionLayer::from_geojson_str(r#"{"type": "FeatureCollection"}"#)
            .expect("layer parses");
        assert!(layer.is_empty());
        assert!(layer.center().is_none());
        assert!(layer.top_label_point().is_none());
    }
}
