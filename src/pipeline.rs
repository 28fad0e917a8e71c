use anyhow::{Context, Result};
use image::RgbaImage;
use sortpuz_capture::{load_frame, FrameSampler};
use sortpuz_data::ParseConfig;
use sortpuz_state::{BoardGrid, BoardState, LayoutDescriptor};
use sortpuz_vision::{extract, generate_grid};
use std::fmt::Write;
use std::path::Path;
use tracing::{info, warn};

/// Calibration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "color_parsing.toml";

/// Load the calibration.
///
/// An explicit path must exist. Without one, `./color_parsing.toml` is used
/// when present, otherwise the built-in calibration.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ParseConfig> {
    if let Some(path) = explicit {
        return ParseConfig::load(path);
    }

    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        ParseConfig::load(fallback)
    } else {
        warn!(
            "No {} in the working directory. Using built-in calibration.",
            DEFAULT_CONFIG_FILE
        );
        Ok(ParseConfig::default())
    }
}

/// Screenshot -> grid -> samples -> board state
pub struct Pipeline {
    config: ParseConfig,
}

impl Pipeline {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    pub fn grid(&self, layout: &LayoutDescriptor) -> Result<BoardGrid> {
        generate_grid(layout, &self.config.coordinates)
            .with_context(|| format!("Cannot build sample grid for {}", layout))
    }

    pub fn extract_frame(&self, frame: &RgbaImage, layout: &LayoutDescriptor) -> Result<BoardState> {
        let state = extract(layout, &self.config, &FrameSampler::new(frame))?;
        info!(
            "Extracted {} ({} unclassified slots)",
            layout,
            state.unclassified().len()
        );
        Ok(state)
    }

    pub fn extract_file(&self, path: &Path, layout: &LayoutDescriptor) -> Result<BoardState> {
        let frame = load_frame(path)?;
        self.extract_frame(&frame, layout)
            .with_context(|| format!("Failed to extract board from {}", path.display()))
    }
}

/// One block per row, one column per tube, slots top to bottom.
/// Unclassified slots show as `?`.
pub fn render_board(state: &BoardState) -> String {
    render_rows(state, |color| {
        if color.is_classified() {
            color.label().to_string()
        } else {
            "?".to_string()
        }
    })
}

/// Same layout as `render_board`, showing sample coordinates
pub fn render_grid(grid: &BoardGrid) -> String {
    render_rows(grid, |point| point.to_string())
}

fn render_rows<T>(board: &sortpuz_state::Board<T>, cell: impl Fn(&T) -> String) -> String {
    let cells = board.map(|v| cell(v));
    let width = cells.iter().map(|(_, s)| s.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (row_idx, row) in cells.rows().iter().enumerate() {
        let _ = writeln!(out, "Row {} ({} tubes)", row_idx, row.len());
        for slot in 0..cells.slots_per_tube() {
            let line = row
                .iter()
                .map(|tube| format!("{:<width$}", tube.slots()[slot], width = width))
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(out, "  {}", line.trim_end());
        }
    }
    out
}
