use std::{
    fs,
    path::{Path, PathBuf},
};

use form4kit::{HarvestConfig, HarvestUrls, Harvester};

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

/// Config pointing both endpoints at a mock server.
#[allow(dead_code)]
pub fn mock_config(uri: &str) -> HarvestConfig {
    HarvestConfig::new("test-key", "test_agent example@example.com").with_base_urls(HarvestUrls {
        query: uri.to_string(),
        archives: uri.to_string(),
    })
}

#[allow(dead_code)]
pub fn harvester(uri: &str) -> Harvester {
    Harvester::with_config(mock_config(uri)).unwrap()
}
