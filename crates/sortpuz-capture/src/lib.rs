use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use sortpuz_state::{Point, Rgb};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a pixel could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("point ({x}, {y}) is outside the {width}x{height} frame")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("frame buffer holds {found} bytes, {needed} needed")]
    ShortBuffer { needed: usize, found: usize },
}

/// Reads the color at a single pixel coordinate.
///
/// Implementations own any channel-order correction, so callers always get
/// R, G, B order back.
pub trait PixelSampler {
    type Error;

    fn sample(&self, point: Point) -> Result<Rgb, Self::Error>;
}

impl<F, E> PixelSampler for F
where
    F: Fn(Point) -> Result<Rgb, E>,
{
    type Error = E;

    fn sample(&self, point: Point) -> Result<Rgb, E> {
        self(point)
    }
}

/// Load a screenshot from disk as RGBA
pub fn load_frame(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    debug!(
        "Loaded frame {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Convert a point to in-bounds pixel indices
fn pixel_index(point: Point, width: u32, height: u32) -> Result<(u32, u32), SampleError> {
    let out_of_bounds = SampleError::OutOfBounds {
        x: point.x,
        y: point.y,
        width,
        height,
    };
    let x = u32::try_from(point.x).map_err(|_| out_of_bounds.clone())?;
    let y = u32::try_from(point.y).map_err(|_| out_of_bounds.clone())?;
    if x >= width || y >= height {
        return Err(out_of_bounds);
    }
    Ok((x, y))
}

/// Samples a decoded `RgbaImage`. Alpha is ignored.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler<'a> {
    frame: &'a RgbaImage,
}

impl<'a> FrameSampler<'a> {
    pub fn new(frame: &'a RgbaImage) -> Self {
        Self { frame }
    }
}

impl PixelSampler for FrameSampler<'_> {
    type Error = SampleError;

    fn sample(&self, point: Point) -> Result<Rgb, SampleError> {
        let (x, y) = pixel_index(point, self.frame.width(), self.frame.height())?;
        let Rgba([r, g, b, _]) = *self.frame.get_pixel(x, y);
        Ok(Rgb::new(r, g, b))
    }
}

/// Byte layout of one pixel in a raw frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb8,
    /// OpenCV's default channel order
    Bgr8,
    Rgba8,
    Bgra8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }

    /// Reorder one pixel's bytes into R, G, B
    fn to_rgb(self, px: &[u8]) -> Rgb {
        match self {
            Self::Rgb8 | Self::Rgba8 => Rgb::new(px[0], px[1], px[2]),
            Self::Bgr8 | Self::Bgra8 => Rgb::new(px[2], px[1], px[0]),
        }
    }
}

/// Samples an interleaved frame buffer produced by some other decoder or
/// capture API.
#[derive(Debug, Clone, Copy)]
pub struct RawFrameSampler<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> RawFrameSampler<'a> {
    /// Tightly packed rows
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, SampleError> {
        let stride = width as usize * format.bytes_per_pixel();
        Self::with_stride(data, width, height, stride, format)
    }

    /// Rows padded to `stride` bytes
    pub fn with_stride(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, SampleError> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        // An overflowing size saturates and fails the length check
        let needed = match height.checked_sub(1) {
            None => 0,
            Some(last_row) => stride
                .max(row_bytes)
                .checked_mul(last_row as usize)
                .and_then(|n| n.checked_add(row_bytes))
                .unwrap_or(usize::MAX),
        };
        if data.len() < needed || stride < row_bytes {
            return Err(SampleError::ShortBuffer {
                needed,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl PixelSampler for RawFrameSampler<'_> {
    type Error = SampleError;

    fn sample(&self, point: Point) -> Result<Rgb, SampleError> {
        let (x, y) = pixel_index(point, self.width, self.height)?;
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride + x as usize * bpp;
        Ok(self.format.to_rgb(&self.data[offset..offset + bpp]))
    }
}

/// Draw a hollow square around `point` so sample positions can be checked by
/// eye. The center pixel is left untouched. Parts outside the frame are skipped.
pub fn mark_point(frame: &mut RgbaImage, point: Point, radius: i32, color: Rgba<u8>) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx.abs() != radius && dy.abs() != radius {
                continue;
            }
            let (x, y) = (point.x + dx, point.y + dy);
            if x >= 0 && y >= 0 && x < w && y < h {
                frame.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
