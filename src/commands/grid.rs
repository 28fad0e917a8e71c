use super::LayoutArgs;
use crate::pipeline::{render_grid, resolve_config, Pipeline};
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

#[derive(Debug, Clone, Args)]
pub struct GridArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Output the grid as JSON
    #[arg(long)]
    pub json: bool,
}

impl GridArgs {
    pub fn execute(&self, config: Option<&Path>) -> Result<()> {
        let pipeline = Pipeline::new(resolve_config(config)?);
        let grid = pipeline.grid(&self.layout.descriptor())?;

        if self.json {
            let json = serde_json::to_string_pretty(&grid).context("Failed to serialize grid")?;
            println!("{}", json);
        } else {
            print!("{}", render_grid(&grid));
        }
        Ok(())
    }
}
