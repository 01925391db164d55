//! Config check command.

use crate::CheckArgs;
use anyhow::{Context, Result};

/// Resolves and validates the config, then prints it as YAML.
pub fn run(args: CheckArgs) -> Result<()> {
    let config = args.config.resolve()?;
    config.validate().context("Invalid configuration")?;
    let yaml = config.to_yaml().context("Failed to render config")?;
    print!("{yaml}");
    println!("# report: {}", config.report_file().display());
    Ok(())
}
