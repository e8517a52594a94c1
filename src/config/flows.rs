//! Flow definition sources

use serde::Deserialize;
use std::path::PathBuf;

/// Bundled flows are always registered; `directory` adds YAML files on top.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowsConfig {
    pub directory: Option<PathBuf>,
}
