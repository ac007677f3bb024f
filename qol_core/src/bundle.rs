use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{
    catalog::{CatalogError, IndicatorCatalog},
    config::DataFiles,
    geo::{GeoError, RegionLayer},
};

pub const DATA_DIR_ENV: &str = "QOL_DATA_DIR";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required files: {}", .0.join(", "))]
    MissingFiles(Vec<String>),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Everything the dashboard pages read from the data directory.
#[derive(Debug, Clone)]
pub struct DataBundle {
    pub catalog: IndicatorCatalog,
    pub neighbourhoods: RegionLayer,
    pub municipality: RegionLayer,
    pub districts: RegionLayer,
    pub boundary: RegionLayer,
}

impl DataBundle {
    pub fn load(data_dir: &Path, files: &DataFiles) -> Result<Self, LoadError> {
        let catalog_path = data_dir.join(&files.catalog);
        let neighbourhoods_path = data_dir.join(&files.neighbourhoods);
        let municipality_path = data_dir.join(&files.municipality);

        let missing: Vec<String> = [&files.catalog, &files.neighbourhoods, &files.municipality]
            .into_iter()
            .filter(|name| !data_dir.join(name.as_str()).exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingFiles(missing));
        }

        let bundle = Self {
            catalog: IndicatorCatalog::from_file(&catalog_path)?,
            neighbourhoods: RegionLayer::from_file(&neighbourhoods_path)?,
            municipality: RegionLayer::from_file(&municipality_path)?,
            districts: load_optional(&data_dir.join(&files.districts))?,
            boundary: load_optional(&data_dir.join(&files.boundary))?,
        };
        tracing::info!(
            target: "qol::data",
            data_dir = %data_dir.display(),
            indicators = bundle.catalog.len(),
            neighbourhoods = bundle.neighbourhoods.len(),
            "data_bundle.loaded"
        );
        Ok(bundle)
    }

    /// The municipal reading for `column`, taken from the first municipality feature.
    pub fn municipal_reference(&self, column: &str) -> Option<f64> {
        self.municipality
            .first()
            .and_then(|region| region.reading(column))
    }
}

fn load_optional(path: &Path) -> Result<RegionLayer, GeoError> {
    if path.exists() {
        RegionLayer::from_file(path)
    } else {
        tracing::debug!(
            target: "qol::data",
            path = %path.display(),
            "region_layer.optional_absent"
        );
        Ok(RegionLayer::empty())
    }
}

/// `explicit`, else `$QOL_DATA_DIR`, else `./data`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}
