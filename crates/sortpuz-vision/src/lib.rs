mod classifier;
mod grid;

pub use classifier::{classify, within_tolerance, ColorClassifier};
pub use grid::{generate_grid, LayoutError};

use sortpuz_capture::PixelSampler;
use sortpuz_data::ParseConfig;
use sortpuz_state::{BoardState, LayoutDescriptor};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a board could not be extracted
#[derive(Debug, Error)]
pub enum ExtractError<E> {
    #[error("invalid layout")]
    InvalidLayout(#[from] LayoutError),
    /// The sampler's own error, unchanged
    #[error("sampling failed")]
    Sampling(#[source] E),
}

/// Read and classify every slot of the board.
///
/// Points are sampled in row -> tube -> slot order. The first sampling error
/// aborts the extraction and is returned as-is inside `ExtractError::Sampling`.
/// Slots matching no palette color get an empty label and do not abort.
pub fn extract<S: PixelSampler>(
    layout: &LayoutDescriptor,
    config: &ParseConfig,
    sampler: &S,
) -> Result<BoardState, ExtractError<S::Error>> {
    let grid = generate_grid(layout, &config.coordinates)?;

    let state = grid.try_map(|&point| -> Result<_, ExtractError<S::Error>> {
        let rgb = sampler.sample(point).map_err(ExtractError::Sampling)?;
        let color = classify(rgb, &config.palette, config.tolerance);
        debug!("{} -> {} '{}'", point, rgb, color.label());
        Ok(color)
    })?;

    let unclassified = state.unclassified();
    if !unclassified.is_empty() {
        warn!(
            "{} of {} slots matched no palette color (first at {})",
            unclassified.len(),
            layout.slot_count(),
            unclassified[0]
        );
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortpuz_capture::{FrameSampler, SampleError};
    use sortpuz_data::defaults;
    use sortpuz_state::{Point, Rgb, SlotPosition};
    use std::cell::RefCell;

    fn red_sampler(_: Point) -> Result<Rgb, SampleError> {
        Ok(Rgb::new(216, 82, 81))
    }

    #[test]
    fn test_extract_all_red() {
        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([6, 5], 4);
        let state = extract(&layout, &config, &red_sampler).unwrap();

        assert_eq!(state.tube_counts(), [6, 5]);
        assert_eq!(state.slots_per_tube(), 4);
        assert_eq!(state.iter().count(), 44);
        assert!(state.iter().all(|(_, c)| c.label() == "Red"));
        assert_eq!(state.label_counts().get("Red"), Some(&44));
    }

    #[test]
    fn test_extract_invalid_layout() {
        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([0, 5], 4);
        let err = extract(&layout, &config, &red_sampler).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidLayout(LayoutError::ZeroTubes { row: 0 })
        ));
    }

    #[test]
    fn test_extract_propagates_sampler_error() {
        #[derive(Debug, PartialEq)]
        struct Boom(Point);

        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([2, 2], 3);
        let calls = RefCell::new(0);
        let sampler = |p: Point| {
            *calls.borrow_mut() += 1;
            if *calls.borrow() == 4 {
                Err(Boom(p))
            } else {
                Ok(Rgb::new(0, 0, 0))
            }
        };

        match extract(&layout, &config, &sampler) {
            Err(ExtractError::Sampling(Boom(p))) => {
                // Fourth sample is the first slot of the second tube in row 0
                assert_eq!(p, Point::new(810, 736));
            }
            other => panic!("expected sampling failure, got {:?}", other.map(|_| ())),
        }
        assert_eq!(*calls.borrow(), 4);
    }

    #[test]
    fn test_extract_out_of_bounds_frame() {
        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([6, 5], 4);
        let frame = image::RgbaImage::new(100, 100);
        let err = extract(&layout, &config, &FrameSampler::new(&frame)).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Sampling(SampleError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_extract_error_message_not_repeated() {
        use std::error::Error as _;

        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([6, 5], 4);
        let frame = image::RgbaImage::new(100, 100);
        let err = extract(&layout, &config, &FrameSampler::new(&frame)).unwrap_err();

        assert_eq!(err.to_string(), "sampling failed");
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("outside the 100x100 frame"), "{}", source);

        let chained = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chained.matches("outside the 100x100 frame").count(), 1);
    }

    #[test]
    fn test_extract_from_painted_frame() {
        let config = ParseConfig::default();
        let layout = LayoutDescriptor::new([3, 2], 4);
        let grid = generate_grid(&layout, &config.coordinates).unwrap();

        // Background far from every palette color; slot 0 of each tube is
        // left unpainted, the rest get palette colors in order
        let mut frame = image::RgbaImage::from_pixel(1080, 2400, image::Rgba([10, 10, 10, 255]));
        let palette = defaults::palette();
        let colors: Vec<Rgb> = palette.iter().map(|c| c.rgb).collect();
        for (i, (pos, point)) in grid.iter().enumerate() {
            if pos.slot == 0 {
                continue;
            }
            let Rgb { r, g, b } = colors[i % colors.len()];
            frame.put_pixel(point.x as u32, point.y as u32, image::Rgba([r, g, b, 255]));
        }

        let state = extract(&layout, &config, &FrameSampler::new(&frame)).unwrap();
        for (i, (pos, color)) in state.iter().enumerate() {
            if pos.slot == 0 {
                assert!(!color.is_classified(), "{}", pos);
            } else {
                let expected = &palette.iter().nth(i % colors.len()).unwrap().name;
                assert_eq!(color.label(), expected.as_str(), "{}", pos);
            }
        }
        assert_eq!(state.unclassified().len(), 5);
        assert_eq!(
            state.unclassified()[4],
            SlotPosition { row: 1, tube: 1, slot: 0 }
        );
    }
}
