//! CLI command implementations

pub mod check;
pub mod run;

use anyhow::{Context, Result};
use sobel_pipeline::RunConfig;
use std::path::Path;

/// Loads a YAML config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}
