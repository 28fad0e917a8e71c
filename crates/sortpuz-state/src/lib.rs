use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

/// Number of tube rows on screen. The supported layout always draws two.
pub const ROW_COUNT: usize = 2;

/// Pixel-space coordinate in the screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 8-bit RGB triple, always in R, G, B order regardless of the source buffer.
/// Serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(rgb: Rgb) -> Self {
        rgb.channels()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// How the puzzle is drawn: tube columns in each of the two rows, and how many
/// color slots every tube holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub row_tube_counts: [usize; ROW_COUNT],
    pub slots_per_tube: usize,
}

impl LayoutDescriptor {
    pub const fn new(row_tube_counts: [usize; ROW_COUNT], slots_per_tube: usize) -> Self {
        Self {
            row_tube_counts,
            slots_per_tube,
        }
    }

    pub fn tube_count(&self) -> usize {
        self.row_tube_counts.iter().sum()
    }

    pub fn slot_count(&self) -> usize {
        self.tube_count() * self.slots_per_tube
    }
}

impl fmt::Display for LayoutDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{} tubes x {} slots",
            self.row_tube_counts[0], self.row_tube_counts[1], self.slots_per_tube
        )
    }
}

/// A sampled color together with the palette label it matched.
///
/// An empty label means no palette entry was within tolerance. That is a
/// valid result, not a failure. Values are immutable: classifying a different
/// sample produces a new `ClassifiedColor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassifiedColor {
    label: String,
    rgb: Rgb,
}

impl ClassifiedColor {
    pub fn new(label: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            label: label.into(),
            rgb,
        }
    }

    /// Sentinel for a sample that matched nothing in the palette
    pub fn unclassified(rgb: Rgb) -> Self {
        Self {
            label: String::new(),
            rgb,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }

    pub fn is_classified(&self) -> bool {
        !self.label.is_empty()
    }
}

/// Violations of the fixed two-row board shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("board must have exactly 2 rows, found {found}")]
    RowCount { found: usize },
    #[error("row {row} has no tubes")]
    EmptyRow { row: usize },
    #[error("tube {tube} in row {row} has no slots")]
    EmptyTube { row: usize, tube: usize },
    #[error("tube {tube} in row {row} has {found} slots, expected {expected}")]
    SlotCountMismatch {
        row: usize,
        tube: usize,
        expected: usize,
        found: usize,
    },
}

/// Address of one slot on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotPosition {
    pub row: usize,
    pub tube: usize,
    pub slot: usize,
}

impl fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} tube {} slot {}", self.row, self.tube, self.slot)
    }
}

/// Ordered slots of a single tube. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tube<T> {
    slots: Vec<T>,
}

impl<T> Tube<T> {
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }
}

/// Ordered tubes of one on-screen row. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TubeRow<T> {
    tubes: Vec<Tube<T>>,
}

impl<T> TubeRow<T> {
    pub fn tubes(&self) -> &[Tube<T>] {
        &self.tubes
    }

    pub fn len(&self) -> usize {
        self.tubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tubes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tube<T>> {
        self.tubes.iter()
    }
}

/// Two rows of tubes, every tube holding the same number of slots.
///
/// The shape is checked once at construction, so every `Board` in hand has
/// exactly two non-empty rows and uniform non-empty tubes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board<T> {
    rows: [TubeRow<T>; ROW_COUNT],
    slots_per_tube: usize,
}

/// Pixel coordinate of every slot
pub type BoardGrid = Board<Point>;

/// Classified color of every slot
pub type BoardState = Board<ClassifiedColor>;

impl<T> Board<T> {
    /// Build a board from the two rows, validating arity.
    pub fn from_rows(rows: [Vec<Vec<T>>; ROW_COUNT]) -> Result<Self, ShapeError> {
        let mut slots_per_tube = None;

        for (row_idx, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(ShapeError::EmptyRow { row: row_idx });
            }
            for (tube_idx, tube) in row.iter().enumerate() {
                if tube.is_empty() {
                    return Err(ShapeError::EmptyTube {
                        row: row_idx,
                        tube: tube_idx,
                    });
                }
                match slots_per_tube {
                    None => slots_per_tube = Some(tube.len()),
                    Some(expected) if expected != tube.len() => {
                        return Err(ShapeError::SlotCountMismatch {
                            row: row_idx,
                            tube: tube_idx,
                            expected,
                            found: tube.len(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        // Both rows are non-empty, so at least one tube was seen
        let slots_per_tube = slots_per_tube.unwrap_or_default();
        let rows = rows.map(|row| TubeRow {
            tubes: row.into_iter().map(|slots| Tube { slots }).collect(),
        });

        Ok(Self {
            rows,
            slots_per_tube,
        })
    }

    /// Build a board from generic nesting (row -> tube -> slot).
    pub fn from_nested(nested: Vec<Vec<Vec<T>>>) -> Result<Self, ShapeError> {
        let found = nested.len();
        let rows: [Vec<Vec<T>>; ROW_COUNT] = nested
            .try_into()
            .map_err(|_| ShapeError::RowCount { found })?;
        Self::from_rows(rows)
    }

    pub fn into_nested(self) -> Vec<Vec<Vec<T>>> {
        self.rows
            .into_iter()
            .map(|row| row.tubes.into_iter().map(|tube| tube.slots).collect())
            .collect()
    }

    pub fn rows(&self) -> &[TubeRow<T>; ROW_COUNT] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&TubeRow<T>> {
        self.rows.get(row)
    }

    pub fn get(&self, pos: SlotPosition) -> Option<&T> {
        self.rows
            .get(pos.row)?
            .tubes
            .get(pos.tube)?
            .slots
            .get(pos.slot)
    }

    pub fn slots_per_tube(&self) -> usize {
        self.slots_per_tube
    }

    pub fn tube_counts(&self) -> [usize; ROW_COUNT] {
        [self.rows[0].len(), self.rows[1].len()]
    }

    /// The layout this board has, recovered from its shape
    pub fn layout(&self) -> LayoutDescriptor {
        LayoutDescriptor::new(self.tube_counts(), self.slots_per_tube)
    }

    /// Every slot in row -> tube -> slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotPosition, &T)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, tube_row)| {
            tube_row.tubes.iter().enumerate().flat_map(move |(tube, t)| {
                t.slots
                    .iter()
                    .enumerate()
                    .map(move |(slot, value)| (SlotPosition { row, tube, slot }, value))
            })
        })
    }

    /// Same shape, every slot transformed by `f`
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Board<U> {
        match self.try_map(|v| Ok::<U, Infallible>(f(v))) {
            Ok(board) => board,
            Err(never) => match never {},
        }
    }

    /// Same shape, stopping at the first slot whose transform fails.
    /// Slots are visited in row -> tube -> slot order.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Board<U>, E> {
        let top = map_row(&self.rows[0], &mut f)?;
        let bottom = map_row(&self.rows[1], &mut f)?;
        Ok(Board {
            rows: [top, bottom],
            slots_per_tube: self.slots_per_tube,
        })
    }
}

fn map_row<T, U, E>(
    row: &TubeRow<T>,
    mut f: impl FnMut(&T) -> Result<U, E>,
) -> Result<TubeRow<U>, E> {
    let tubes = row
        .tubes
        .iter()
        .map(|tube| {
            tube.slots
                .iter()
                .map(&mut f)
                .collect::<Result<Vec<_>, E>>()
                .map(|slots| Tube { slots })
        })
        .collect::<Result<Vec<_>, E>>()?;
    Ok(TubeRow { tubes })
}

impl BoardState {
    /// Count of slots per palette label, unclassified slots excluded
    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for (_, color) in self.iter().filter(|(_, c)| c.is_classified()) {
            *counts.entry(color.label()).or_insert(0) += 1;
        }
        counts
    }

    /// Positions whose sample matched no palette entry
    pub fn unclassified(&self) -> Vec<SlotPosition> {
        self.iter()
            .filter(|(_, c)| !c.is_classified())
            .map(|(pos, _)| pos)
            .collect()
    }
}

impl<T: Serialize> Serialize for Board<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Board<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nested = Vec::<Vec<Vec<T>>>::deserialize(deserializer)?;
        Board::from_nested(nested).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(counts: [usize; 2], slots: usize) -> Board<usize> {
        let mut n = 0;
        let rows = counts.map(|c| {
            (0..c)
                .map(|_| {
                    (0..slots)
                        .map(|_| {
                            n += 1;
                            n
                        })
                        .collect()
                })
                .collect()
        });
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn test_from_rows_records_shape() {
        let board = numbered([6, 5], 4);
        assert_eq!(board.tube_counts(), [6, 5]);
        assert_eq!(board.slots_per_tube(), 4);
        assert_eq!(board.layout(), LayoutDescriptor::new([6, 5], 4));
        assert_eq!(board.iter().count(), 44);
    }

    #[test]
    fn test_from_nested_rejects_wrong_row_count() {
        let err = Board::from_nested(vec![vec![vec![1]]]).unwrap_err();
        assert_eq!(err, ShapeError::RowCount { found: 1 });

        let err = Board::from_nested(vec![vec![vec![1]]; 3]).unwrap_err();
        assert_eq!(err, ShapeError::RowCount { found: 3 });
    }

    #[test]
    fn test_from_rows_rejects_empty_row_and_tube() {
        let err = Board::<u8>::from_rows([vec![vec![1]], vec![]]).unwrap_err();
        assert_eq!(err, ShapeError::EmptyRow { row: 1 });

        let err = Board::<u8>::from_rows([vec![vec![1], vec![]], vec![vec![1]]]).unwrap_err();
        assert_eq!(err, ShapeError::EmptyTube { row: 0, tube: 1 });
    }

    #[test]
    fn test_from_rows_rejects_ragged_tubes() {
        let err = Board::from_rows([vec![vec![1, 2]], vec![vec![1, 2], vec![3]]]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::SlotCountMismatch {
                row: 1,
                tube: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_iter_is_row_tube_slot_order() {
        let board = numbered([2, 1], 2);
        let values: Vec<usize> = board.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);

        let positions: Vec<SlotPosition> = board.iter().map(|(p, _)| p).collect();
        assert_eq!(positions[2], SlotPosition { row: 0, tube: 1, slot: 0 });
        assert_eq!(positions[5], SlotPosition { row: 1, tube: 0, slot: 1 });
    }

    #[test]
    fn test_try_map_stops_at_first_error() {
        let board = numbered([2, 2], 2);
        let mut visited = Vec::new();
        let result: Result<Board<usize>, usize> = board.try_map(|&v| {
            visited.push(v);
            if v == 3 {
                Err(v)
            } else {
                Ok(v * 10)
            }
        });
        assert_eq!(result.unwrap_err(), 3);
        assert_eq!(visited, vec![1, 2, 3]);
    }

    #[test]
    fn test_map_preserves_shape() {
        let board = numbered([3, 1], 5);
        let mapped = board.map(|v| v.to_string());
        assert_eq!(mapped.layout(), board.layout());
        assert_eq!(
            mapped.get(SlotPosition { row: 1, tube: 0, slot: 4 }),
            Some(&"20".to_string())
        );
    }

    #[test]
    fn test_board_state_helpers() {
        let red = ClassifiedColor::new("Red", Rgb::new(216, 82, 81));
        let unknown = ClassifiedColor::unclassified(Rgb::new(1, 2, 3));
        let state = Board::from_rows([
            vec![vec![red.clone(), red.clone()]],
            vec![vec![red.clone(), unknown]],
        ])
        .unwrap();

        assert_eq!(state.label_counts().get("Red"), Some(&3));
        assert_eq!(state.label_counts().len(), 1);
        assert_eq!(
            state.unclassified(),
            vec![SlotPosition { row: 1, tube: 0, slot: 1 }]
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_shape() {
        let grid: BoardGrid = numbered([6, 5], 4).map(|&v| Point::new(v as i32, 0));
        let json = serde_json::to_string(&grid).unwrap();
        let back: BoardGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert_eq!(back.tube_counts(), [6, 5]);
    }

    #[test]
    fn test_deserialize_rejects_bad_shape() {
        let json = r#"[[[{"x":1,"y":2}]]]"#;
        assert!(serde_json::from_str::<BoardGrid>(json).is_err());
    }

    #[test]
    fn test_rgb_serializes_as_array() {
        let color = ClassifiedColor::new("Red", Rgb::new(216, 82, 81));
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, r#"{"label":"Red","rgb":[216,82,81]}"#);
    }
}
