use sortpuz_data::CoordinateTable;
use sortpuz_state::{BoardGrid, LayoutDescriptor, Point, ShapeError};
use thiserror::Error;
use tracing::debug;

/// The layout descriptor cannot be turned into a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("row {row} has zero tubes")]
    ZeroTubes { row: usize },
    #[error("tubes have zero slots")]
    ZeroSlots,
    #[error("no x coordinates calibrated for {count} tubes in row {row}")]
    UnknownTubeCount { row: usize, count: usize },
    #[error("no slot spacing calibrated for {slots} slots per tube")]
    UnknownSlotCount { slots: usize },
    #[error("no y coordinate calibrated for row {row}")]
    UnknownRow { row: usize },
    #[error("slot {slot} of row {row} lies outside the i32 coordinate range")]
    CoordinateOverflow { row: usize, slot: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Compute the pixel coordinate of every slot of every tube.
///
/// Slot `i` of a tube in row `r` sits at `y_base(r) + i * y_delta(slots)`,
/// straight below the tube's column x. Either the whole grid is produced or
/// a `LayoutError` is returned.
pub fn generate_grid(
    layout: &LayoutDescriptor,
    table: &CoordinateTable,
) -> Result<BoardGrid, LayoutError> {
    let slots = layout.slots_per_tube;
    if let Some(row) = layout.row_tube_counts.iter().position(|&c| c == 0) {
        return Err(LayoutError::ZeroTubes { row });
    }
    if slots == 0 {
        return Err(LayoutError::ZeroSlots);
    }

    let y_delta = table
        .y_delta(slots)
        .ok_or(LayoutError::UnknownSlotCount { slots })?;

    let top = tube_row(0, layout.row_tube_counts[0], slots, y_delta, table)?;
    let bottom = tube_row(1, layout.row_tube_counts[1], slots, y_delta, table)?;

    debug!("Generated grid for {} (y delta {})", layout, y_delta);

    Ok(BoardGrid::from_rows([top, bottom])?)
}

/// Points for every tube of one row
fn tube_row(
    row: usize,
    count: usize,
    slots: usize,
    y_delta: i32,
    table: &CoordinateTable,
) -> Result<Vec<Vec<Point>>, LayoutError> {
    let y_base = table.y_base(row).ok_or(LayoutError::UnknownRow { row })?;
    let xs = table
        .x_positions(row, count)
        .ok_or(LayoutError::UnknownTubeCount { row, count })?;

    // Same y offsets for every tube of the row
    let ys = (0..slots)
        .map(|slot| {
            slot_y(y_base, y_delta, slot).ok_or(LayoutError::CoordinateOverflow { row, slot })
        })
        .collect::<Result<Vec<i32>, _>>()?;

    Ok(xs
        .iter()
        .map(|&x| ys.iter().map(|&y| Point::new(x, y)).collect())
        .collect())
}

fn slot_y(y_base: i32, y_delta: i32, slot: usize) -> Option<i32> {
    i32::try_from(slot)
        .ok()?
        .checked_mul(y_delta)?
        .checked_add(y_base)
}
