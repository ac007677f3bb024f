use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

use crate::geo::GeoPoint;

pub const BUILTIN_DASHBOARD_CONFIG: &str = include_str!("data/dashboard_config.json");
pub const CONFIG_PATH_ENV: &str = "QOL_DASHBOARD_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    data: DataFiles,
    map: MapConfig,
    chart: ChartConfig,
    groups: GroupConfig,
    render: RenderConfig,
    reference_label: ReferenceLabel,
}

impl DashboardConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_DASHBOARD_CONFIG)
                .expect("builtin dashboard config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, DashboardConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| DashboardConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = DashboardConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn data(&self) -> &DataFiles {
        &self.data
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    pub fn chart(&self) -> &ChartConfig {
        &self.chart
    }

    pub fn groups(&self) -> &GroupConfig {
        &self.groups
    }

    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    pub fn reference_label(&self) -> &str {
        &self.reference_label.0
    }
}

#[derive(Debug, Error)]
pub enum DashboardConfigError {
    #[error("failed to parse dashboard config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read dashboard config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File names inside the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub catalog: String,
    pub neighbourhoods: String,
    pub municipality: String,
    pub districts: String,
    pub boundary: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            catalog: "variables_catalog.csv".to_string(),
            neighbourhoods: "neighbourhoods_veld.geojson".to_string(),
            municipality: "municipality_ede.geojson".to_string(),
            districts: "wijkenbuurtenwijken.geojson".to_string(),
            boundary: "wijk_boundary_veld.geojson".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSize {
    HalfPage,
    Normal,
    FullPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapHeights {
    half_page: u32,
    normal: u32,
    full_page: u32,
}

impl Default for MapHeights {
    fn default() -> Self {
        Self {
            half_page: 460,
            normal: 700,
            full_page: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    heights: MapHeights,
    width: u32,
    default_classes: usize,
    min_classes: usize,
    max_classes: usize,
    fallback_center: [f64; 2],
    boundary_label: String,
}

impl MapConfig {
    pub fn height(&self, size: MapSize) -> u32 {
        match size {
            MapSize::HalfPage => self.heights.half_page,
            MapSize::Normal => self.heights.normal,
            MapSize::FullPage => self.heights.full_page,
        }
        .max(1)
    }

    pub fn width(&self) -> u32 {
        self.width.max(1)
    }

    pub fn default_classes(&self) -> usize {
        self.clamp_classes(self.default_classes)
    }

    /// Clamp a requested class count into the configured range.
    pub fn clamp_classes(&self, requested: usize) -> usize {
        let min = self.min_classes.max(1);
        let max = self.max_classes.max(min);
        requested.clamp(min, max)
    }

    /// Centre used when a layer has no geometry; stored as `[lat, lon]`.
    pub fn fallback_center(&self) -> GeoPoint {
        GeoPoint {
            lat: self.fallback_center[0],
            lon: self.fallback_center[1],
        }
    }

    pub fn boundary_label(&self) -> &str {
        &self.boundary_label
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            heights: MapHeights::default(),
            width: 900,
            default_classes: 7,
            min_classes: 5,
            max_classes: 9,
            fallback_center: [52.04, 5.66],
            boundary_label: "Ede–Veldhuizen".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    headroom: f64,
    bar_width: usize,
}

impl ChartConfig {
    /// Fraction of the largest value added above it on the value axis.
    pub fn headroom(&self) -> f64 {
        if self.headroom.is_finite() {
            self.headroom.max(0.0)
        } else {
            0.0
        }
    }

    /// Width in characters of the text bar chart.
    pub fn bar_width(&self) -> usize {
        self.bar_width.max(8)
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            headroom: 0.08,
            bar_width: 48,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub primary_names: Vec<String>,
    pub primary_label: String,
    pub secondary_label: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            primary_names: vec!["de burgen".to_string(), "de horsten".to_string()],
            primary_label: "Veldhuizen A".to_string(),
            secondary_label: "Veldhuizen B".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub interactive: bool,
    pub svg_export: bool,
    pub color: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            svg_export: true,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
struct ReferenceLabel(String);

impl Default for ReferenceLabel {
    fn default() -> Self {
        Self("Ede average".to_string())
    }
}

/// Metadata about where the active configuration came from.
#[derive(Debug, Clone)]
pub struct DashboardConfigMetadata {
    path: Option<PathBuf>,
}

impl DashboardConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_dashboard_config_from_env() -> (Arc<DashboardConfig>, DashboardConfigMetadata) {
    let override_path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/dashboard_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match DashboardConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "qol::config",
                    path = %path.display(),
                    "dashboard_config.loaded=file"
                );
                return (Arc::new(config), DashboardConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "qol::config",
                    path = %path.display(),
                    error = %err,
                    "dashboard_config.load_failed"
                );
            }
        }
    }

    let config = DashboardConfig::builtin();
    tracing::info!(target: "qol::config", "dashboard_config.loaded=builtin");
    (config, DashboardConfigMetadata::new(None))
}
