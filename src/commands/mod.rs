mod config;
mod extract;
mod grid;
mod palette;

use anyhow::Result;
use clap::{Args, Subcommand};
use sortpuz_state::LayoutDescriptor;
use std::path::Path;

use config::InitConfigArgs;
use extract::ExtractArgs;
use grid::GridArgs;
use palette::{ClassifyArgs, PaletteArgs};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the board from a screenshot
    Extract(ExtractArgs),
    /// Print the pixel coordinate of every slot
    Grid(GridArgs),
    /// List palette colors in classification order
    Palette(PaletteArgs),
    /// Classify a single RGB color
    Classify(ClassifyArgs),
    /// Write the built-in calibration to a file
    InitConfig(InitConfigArgs),
}

impl Command {
    pub fn execute(&self, config: Option<&Path>) -> Result<()> {
        match self {
            Self::Extract(args) => args.execute(config),
            Self::Grid(args) => args.execute(config),
            Self::Palette(args) => args.execute(config),
            Self::Classify(args) => args.execute(config),
            Self::InitConfig(args) => args.execute(),
        }
    }
}

/// Puzzle layout shared by the commands that build a grid
#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
    /// Tube count of the top and bottom rows, e.g. 6,5
    #[arg(short, long, value_name = "TOP,BOTTOM", value_parser = parse_tube_counts)]
    pub tubes: [usize; 2],

    /// Color slots per tube
    #[arg(short, long, value_name = "N")]
    pub slots: usize,
}

impl LayoutArgs {
    pub fn descriptor(&self) -> LayoutDescriptor {
        LayoutDescriptor::new(self.tubes, self.slots)
    }
}

fn parse_tube_counts(s: &str) -> Result<[usize; 2], String> {
    let (top, bottom) = s
        .split_once(',')
        .ok_or_else(|| format!("expected TOP,BOTTOM, got '{}'", s))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid tube count '{}': {}", part.trim(), e))
    };
    Ok([parse(top)?, parse(bottom)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tube_counts() {
        assert_eq!(parse_tube_counts("6,5"), Ok([6, 5]));
        assert_eq!(parse_tube_counts(" 7 , 0"), Ok([7, 0]));
        assert!(parse_tube_counts("6").is_err());
        assert!(parse_tube_counts("6,x").is_err());
        assert!(parse_tube_counts("6,5,4").is_err());
    }
}
