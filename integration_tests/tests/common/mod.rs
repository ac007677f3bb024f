use std::path::PathBuf;
use std::sync::Arc;

use qol_core::{DashboardConfig, DataBundle};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn config() -> Arc<DashboardConfig> {
    DashboardConfig::builtin()
}

pub fn load_fixture_bundle() -> anyhow::Result<DataBundle> {
    let dir = fixtures_dir();
    debug_assert!(dir.exists(), "missing fixtures at {}", dir.display());
    Ok(DataBundle::load(&dir, config().data())?)
}
