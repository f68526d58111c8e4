pub(crate) mod deploy;
pub(crate) mod render;

use anyhow::Context;
use std::path::Path;
use sw_core::DeployerConfig;

/// Deployer settings from a TOML file, or the defaults
pub(crate) fn load_deployer_config(path: Option<&Path>) -> anyhow::Result<DeployerConfig> {
    let Some(path) = path else {
        return Ok(DeployerConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
