use super::LayoutArgs;
use crate::pipeline::{render_board, resolve_config, Pipeline};
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Screenshot to read
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Output the board as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExtractArgs {
    pub fn execute(&self, config: Option<&Path>) -> Result<()> {
        let pipeline = Pipeline::new(resolve_config(config)?);
        let state = pipeline.extract_file(&self.image, &self.layout.descriptor())?;

        if self.json {
            let json = serde_json::to_string_pretty(&state).context("Failed to serialize board")?;
            println!("{}", json);
        } else {
            print!("{}", render_board(&state));
            for (label, count) in state.label_counts() {
                println!("{:<12} {}", label, count);
            }
        }
        Ok(())
    }
}
