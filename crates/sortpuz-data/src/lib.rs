use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sortpuz_state::{Rgb, ROW_COUNT};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Maximum per-channel difference for a sample to match a palette color
pub type Tolerance = u8;

/// Problems in an otherwise well-formed configuration file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("row {row}: column entry with zero tubes")]
    ZeroTubes { row: usize },
    #[error("row {row}: {tubes} tubes listed more than once")]
    DuplicateTubeCount { row: usize, tubes: usize },
    #[error("row {row}: entry for {tubes} tubes has {found} x coordinates")]
    ColumnLength {
        row: usize,
        tubes: usize,
        found: usize,
    },
    #[error("slot spacing entry with zero slots")]
    ZeroSlots,
    #[error("slot spacing for {slots} slots listed more than once")]
    DuplicateSlotCount { slots: usize },
    #[error("palette is empty")]
    EmptyPalette,
    #[error("palette entry {index} has an empty name")]
    EmptyColorName { index: usize },
    #[error("palette color '{name}' listed more than once")]
    DuplicateColorName { name: String },
}

/// A palette label with its reference color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub rgb: Rgb,
}

impl NamedColor {
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// Ordered reference colors. Order is classification priority: the first
/// entry whose window contains a sample wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NamedColor>", into = "Vec<NamedColor>")]
pub struct Palette {
    colors: Vec<NamedColor>,
}

impl Palette {
    pub fn new(colors: Vec<NamedColor>) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        let mut seen = HashSet::new();
        for (index, color) in colors.iter().enumerate() {
            if color.name.is_empty() {
                return Err(ConfigError::EmptyColorName { index });
            }
            if !seen.insert(color.name.as_str()) {
                return Err(ConfigError::DuplicateColorName {
                    name: color.name.clone(),
                });
            }
        }
        Ok(Self { colors })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedColor> {
        self.colors.iter()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Reference color for a label
    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.colors.iter().find(|c| c.name == name).map(|c| c.rgb)
    }
}

impl TryFrom<Vec<NamedColor>> for Palette {
    type Error = ConfigError;

    fn try_from(colors: Vec<NamedColor>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<NamedColor> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a NamedColor;
    type IntoIter = std::slice::Iter<'a, NamedColor>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

/// Calibrated tube x positions and base y coordinate for one screen row
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowTable {
    y_base: i32,
    x_positions: BTreeMap<usize, Vec<i32>>,
}

/// Pixel lookup tables calibrated against one screen layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateTable {
    rows: [RowTable; ROW_COUNT],
    y_deltas: BTreeMap<usize, i32>,
}

impl CoordinateTable {
    /// X coordinate of every tube column when `row` shows `tube_count` tubes
    pub fn x_positions(&self, row: usize, tube_count: usize) -> Option<&[i32]> {
        self.rows
            .get(row)?
            .x_positions
            .get(&tube_count)
            .map(Vec::as_slice)
    }

    /// Y coordinate of the first slot of every tube in `row`
    pub fn y_base(&self, row: usize) -> Option<i32> {
        self.rows.get(row).map(|r| r.y_base)
    }

    /// Vertical distance between consecutive slots for a tube of `slots` slots
    pub fn y_delta(&self, slots: usize) -> Option<i32> {
        self.y_deltas.get(&slots).copied()
    }

    /// Tube counts calibrated for `row`, ascending
    pub fn tube_counts(&self, row: usize) -> Vec<usize> {
        self.rows
            .get(row)
            .map(|r| r.x_positions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Slot counts with a calibrated spacing, ascending
    pub fn slot_counts(&self) -> Vec<usize> {
        self.y_deltas.keys().copied().collect()
    }
}

/// Everything the extractor needs: coordinate tables, palette and tolerance.
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigFile", into = "ConfigFile")]
pub struct ParseConfig {
    pub coordinates: CoordinateTable,
    pub palette: Palette,
    pub tolerance: Tolerance,
}

/// On-disk shape of the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    tolerance: Tolerance,
    rows: [RowConfig; ROW_COUNT],
    slot_spacing: Vec<SlotSpacing>,
    palette: Vec<NamedColor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RowConfig {
    y: i32,
    columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnConfig {
    tubes: usize,
    x: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotSpacing {
    slots: usize,
    delta: i32,
}

impl TryFrom<ConfigFile> for ParseConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let [top, bottom] = file.rows;
        let rows = [row_table(0, top)?, row_table(1, bottom)?];

        let mut y_deltas = BTreeMap::new();
        for spacing in file.slot_spacing {
            if spacing.slots == 0 {
                return Err(ConfigError::ZeroSlots);
            }
            if y_deltas.insert(spacing.slots, spacing.delta).is_some() {
                return Err(ConfigError::DuplicateSlotCount {
                    slots: spacing.slots,
                });
            }
        }

        Ok(Self {
            coordinates: CoordinateTable { rows, y_deltas },
            palette: Palette::new(file.palette)?,
            tolerance: file.tolerance,
        })
    }
}

fn row_table(row: usize, config: RowConfig) -> Result<RowTable, ConfigError> {
    let mut x_positions = BTreeMap::new();
    for column in config.columns {
        if column.tubes == 0 {
            return Err(ConfigError::ZeroTubes { row });
        }
        if column.x.len() != column.tubes {
            return Err(ConfigError::ColumnLength {
                row,
                tubes: column.tubes,
                found: column.x.len(),
            });
        }
        let tubes = column.tubes;
        if x_positions.insert(tubes, column.x).is_some() {
            return Err(ConfigError::DuplicateTubeCount { row, tubes });
        }
    }
    Ok(RowTable {
        y_base: config.y,
        x_positions,
    })
}

impl From<ParseConfig> for ConfigFile {
    fn from(config: ParseConfig) -> Self {
        let rows = config.coordinates.rows.map(|row| RowConfig {
            y: row.y_base,
            columns: row
                .x_positions
                .into_iter()
                .map(|(tubes, x)| ColumnConfig { tubes, x })
                .collect(),
        });
        Self {
            tolerance: config.tolerance,
            rows,
            slot_spacing: config
                .coordinates
                .y_deltas
                .into_iter()
                .map(|(slots, delta)| SlotSpacing { slots, delta })
                .collect(),
            palette: config.palette.into(),
        }
    }
}

impl ParseConfig {
    /// Load from a `.toml` or `.json` file, chosen by extension (TOML otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!(
            "Loaded {} palette colors, tolerance {} from {}",
            config.palette.len(),
            config.tolerance,
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON configuration")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        defaults::config()
    }
}

/// Shipped calibration for a 1080x2400 portrait screenshot
pub mod defaults {
    use super::*;

    pub const TOLERANCE: Tolerance = 10;

    /// Y of the top slot in each row
    pub const ROW_Y: [i32; ROW_COUNT] = [736, 1420];

    /// (slots per tube, y delta)
    pub const SLOT_SPACING: &[(usize, i32)] = &[(3, 100), (4, 75), (5, 60), (6, 50)];

    /// Tube column x positions, identical for both rows
    pub const COLUMNS: &[&[i32]] = &[
        &[540],
        &[270, 810],
        &[180, 540, 900],
        &[135, 405, 675, 945],
        &[108, 324, 540, 756, 972],
        &[90, 270, 450, 630, 810, 990],
        &[77, 231, 386, 540, 694, 849, 1003],
    ];

    /// Palette in priority order
    pub const PALETTE: &[(&str, [u8; 3])] = &[
        ("Red", [216, 82, 81]),
        ("Light Green", [73, 208, 103]),
        ("Light Blue", [0, 184, 238]),
        ("Brown", [157, 113, 86]),
        ("Orange", [249, 122, 19]),
        ("Pink", [242, 135, 239]),
        ("Beige", [249, 181, 82]),
        ("Purple", [156, 87, 193]),
        ("Yellow", [255, 244, 92]),
        ("Empty", [228, 218, 209]),
    ];

    pub fn palette() -> Palette {
        Palette {
            colors: PALETTE
                .iter()
                .map(|&(name, rgb)| NamedColor::new(name, Rgb::from(rgb)))
                .collect(),
        }
    }

    pub fn config() -> ParseConfig {
        let rows = ROW_Y.map(|y_base| RowTable {
            y_base,
            x_positions: COLUMNS.iter().map(|xs| (xs.len(), xs.to_vec())).collect(),
        });
        ParseConfig {
            coordinates: CoordinateTable {
                rows,
                y_deltas: SLOT_SPACING.iter().copied().collect(),
            },
            palette: palette(),
            tolerance: TOLERANCE,
        }
    }
}
