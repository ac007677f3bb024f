//! Core crate for the Ede-Veldhuizen quality-of-life dashboard.
//!
//! Loads the indicator catalog and region layers, classifies readings onto a
//! shared colour scale and propagates the bench intervention through the four
//! QoL dimensions. Presentation lives in `qol_inspector`; everything here is
//! plain data in, plain data out.

mod bundle;
mod capabilities;
pub mod catalog;
pub mod classify;
mod comparison;
mod config;
pub mod drivers;
pub mod geo;
pub mod map;
pub mod palette;
mod reading;
pub mod scenario;
mod svg;

pub use bundle::{resolve_data_dir, DataBundle, LoadError, DATA_DIR_ENV};
pub use capabilities::RenderCapabilities;
pub use catalog::{CatalogError, IndicatorCatalog, IndicatorDefinition};
pub use classify::{build_scale, classify, Binning, Classification, ClassificationScale, ColorMode};
pub use comparison::{Comparison, ComparisonError, ComparisonRow, Group, SortOrder};
pub use config::{
    load_dashboard_config_from_env, ChartConfig, DashboardConfig, DashboardConfigError,
    DashboardConfigMetadata, DataFiles, GroupConfig, MapConfig, MapSize, RenderConfig,
    BUILTIN_DASHBOARD_CONFIG, CONFIG_PATH_ENV,
};
pub use drivers::{render_drivers_svg, Driver, DriversDiagram};
pub use geo::{GeoError, GeoPoint, Region, RegionLayer};
pub use map::{render_choropleth_svg, MapView, Overlays, RegionShade};
pub use reading::{display_decimals, format_reading, parse_reading, EntityValue};
pub use scenario::{
    gauge_bound, propagate, score, Dimension, FactorDelta, InterventionState, ScenarioRun,
    WeightedOutcome,
};
