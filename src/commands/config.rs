use anyhow::{bail, Context, Result};
use clap::Args;
use sortpuz_data::ParseConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct InitConfigArgs {
    /// Where to write the calibration
    #[arg(value_name = "FILE", default_value = crate::pipeline::DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitConfigArgs {
    pub fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            bail!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            );
        }

        let config = ParseConfig::default();
        let is_json = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let content = if is_json {
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?
        } else {
            config.to_toml_string()?
        };

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("Wrote built-in calibration to {}", self.path.display());
        Ok(())
    }
}
