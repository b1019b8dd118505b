//! Grayscale raster views.
//!
//! `ImageView` is a borrowed 2D view into a contiguous 1D buffer;
//! `OwnedImage` is the owning counterpart produced by stages that build a
//! new raster. Every stage treats its input as immutable and hands a fresh
//! buffer downstream, so no aliasing crosses a stage boundary.

use crate::util::{IrisMatchError, IrisMatchResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed contiguous 8-bit grayscale view.
#[derive(Copy, Clone)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> ImageView<'a> {
    /// Creates a view over `width * height` pixels in row-major order.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> IrisMatchResult<Self> {
        let needed = checked_area(width, height)?;
        if data.len() != needed {
            return Err(IrisMatchError::BufferMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The backing row-major pixel slice.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Pixel at `(x, y)`, if within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Pixel at signed coordinates, `None` when outside the frame.
    ///
    /// Geometric sampling (polar unwrap, circle tracing) produces signed
    /// coordinates; out-of-frame lookups are a normal masked condition, not
    /// an error.
    pub fn get_signed(&self, x: i64, y: i64) -> Option<u8> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Contiguous slice for row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }
}

/// Owned contiguous 8-bit grayscale raster.
#[derive(Clone)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an owned raster from a row-major buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> IrisMatchResult<Self> {
        let needed = checked_area(width, height)?;
        if data.len() != needed {
            return Err(IrisMatchError::BufferMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrowed view over this raster.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }

    /// The backing row-major pixel slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

fn checked_area(width: usize, height: usize) -> IrisMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(IrisMatchError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(IrisMatchError::InvalidDimensions { width, height })
}
