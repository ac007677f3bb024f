use std::{
    collections::{BTreeSet, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 4] = ["dimension", "label", "column", "unit"];

/// One indicator: where it sits in the catalog and which data column holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub dimension: String,
    pub label: String,
    #[serde(rename = "column")]
    pub column_key: String,
    #[serde(default)]
    pub unit: String,
}

impl IndicatorDefinition {
    /// Unit for display; blank and `-` mean unitless.
    pub fn display_unit(&self) -> Option<&str> {
        let unit = self.unit.trim();
        (!unit.is_empty() && unit != "-").then_some(unit)
    }

    pub fn axis_label(&self) -> String {
        match self.display_unit() {
            Some(unit) => format!("{} [{}]", self.label, unit),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read indicator catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse indicator catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("indicator catalog missing columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("duplicate indicator {label:?} in dimension {dimension:?}")]
    Duplicate { dimension: String, label: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorCatalog {
    indicators: Vec<IndicatorDefinition>,
}

impl IndicatorCatalog {
    pub fn from_csv_str(text: &str) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: HashSet<String> = reader.headers()?.iter().map(str::to_string).collect();
        let missing: BTreeSet<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.contains(*column))
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::MissingColumns {
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }

        let mut seen = HashSet::new();
        let mut indicators = Vec::new();
        for (row, record) in reader.deserialize::<IndicatorDefinition>().enumerate() {
            let definition = record?;
            if definition.dimension.is_empty() || definition.label.is_empty() {
                tracing::warn!(
                    target: "qol::data",
                    row = row + 1,
                    "catalog.row_skipped=blank_dimension_or_label"
                );
                continue;
            }
            if !seen.insert((definition.dimension.clone(), definition.label.clone())) {
                return Err(CatalogError::Duplicate {
                    dimension: definition.dimension,
                    label: definition.label,
                });
            }
            indicators.push(definition);
        }

        Ok(Self { indicators })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_csv_str(&contents)?;
        tracing::info!(
            target: "qol::data",
            path = %path.display(),
            indicators = catalog.len(),
            "catalog.loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.indicators.iter()
    }

    /// Sorted, de-duplicated dimension names.
    pub fn dimensions(&self) -> Vec<&str> {
        let unique: BTreeSet<&str> = self
            .indicators
            .iter()
            .map(|entry| entry.dimension.as_str())
            .collect();
        unique.into_iter().collect()
    }

    /// Labels within `dimension`, in catalog order.
    pub fn labels_for(&self, dimension: &str) -> Vec<&str> {
        self.indicators
            .iter()
            .filter(|entry| entry.dimension == dimension)
            .map(|entry| entry.label.as_str())
            .collect()
    }

    pub fn lookup(&self, dimension: &str, label: &str) -> Option<&IndicatorDefinition> {
        self.indicators
            .iter()
            .find(|entry| entry.dimension == dimension && entry.label == label)
    }

    /// First indicator of the first dimension, the default selection.
    pub fn first(&self) -> Option<&IndicatorDefinition> {
        let dimension = self.dimensions().into_iter().next()?;
        self.indicators
            .iter()
            .find(|entry| entry.dimension == dimension)
    }
}
