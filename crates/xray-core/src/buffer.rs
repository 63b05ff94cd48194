//! Interleaved RGBA8 pixel buffer.
//!
//! [`PixelBuffer`] is the one data model every engine consumes and produces:
//! `width * height` pixels, four bytes each in R, G, B, A order, row-major
//! with the origin at the top-left corner.
//!
//! # Memory Layout
//!
//! ```text
//! Memory: [R G B A R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A R G B A ...]  <- Row 1
//!         ...
//! ```
//!
//! # Ownership
//!
//! Operations never mutate their input. Each one allocates and returns a new
//! buffer, so a `PixelBuffer` can be moved to a worker thread and back
//! without synchronization.
//!
//! # Usage
//!
//! ```rust
//! use xray_core::PixelBuffer;
//!
//! let mut buf = PixelBuffer::new(4, 2);
//! buf.set_pixel(1, 1, [255, 0, 0, 255]).unwrap();
//! assert_eq!(buf.pixel(1, 1).unwrap(), [255, 0, 0, 255]);
//! assert_eq!(buf.data().len(), 4 * 2 * 4);
//! ```

use crate::pixel::CHANNELS;
use crate::{Error, Result};

/// Owned RGBA8 pixel buffer.
///
/// # Invariants
///
/// `data.len() == width * height * 4` at all times.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer of the given size with every sample zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `width * height * 4` overflows `usize`.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wraps existing RGBA samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height * 4`.
    ///
    /// ```rust
    /// use xray_core::PixelBuffer;
    ///
    /// assert!(PixelBuffer::from_data(2, 2, vec![0; 16]).is_ok());
    /// assert!(PixelBuffer::from_data(2, 2, vec![0; 15]).is_err());
    /// ```
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = sample_len(width, height)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflows usize"))?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Creates a buffer where every pixel is `px`.
    pub fn filled(width: u32, height: u32, px: [u8; 4]) -> Self {
        let mut buf = Self::new(width, height);
        for chunk in buf.data.chunks_exact_mut(CHANNELS) {
            chunk.copy_from_slice(&px);
        }
        buf
    }

    /// Creates a buffer by evaluating `f(x, y)` for every pixel.
    ///
    /// ```rust
    /// use xray_core::PixelBuffer;
    ///
    /// let ramp = PixelBuffer::from_fn(3, 1, |x, _| [x as u8 * 10, 0, 0, 255]);
    /// assert_eq!(ramp.pixel(2, 0).unwrap()[0], 20);
    /// ```
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let mut buf = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let idx = buf.index(x, y);
                buf.data[idx..idx + CHANNELS].copy_from_slice(&f(x, y));
            }
        }
        buf
    }

    /// Buffer width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if the buffer holds no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw interleaved samples.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns its samples.
    #[inline]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Sample index of pixel `(x, y)`. Coordinates are not checked.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Returns `true` if `(x, y)` lies inside the buffer.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Reads pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Result<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(self.pixel_unchecked(x, y))
    }

    /// Reads pixel `(x, y)` without the bounds check on coordinates.
    ///
    /// Panics if the computed index lies past the end of the buffer.
    #[inline]
    pub fn pixel_unchecked(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Reads the pixel at `(x, y)` with coordinates clamped to the edge.
    ///
    /// The buffer must not be empty.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 4] {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel_unchecked(cx, cy)
    }

    /// Writes pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        let i = self.index(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&px);
        Ok(())
    }

    /// Iterates over pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|c| [c[0], c[1], c[2], c[3]])
    }

    /// Iterates over rows as byte slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        // chunks_exact(0) panics, an empty buffer yields no rows
        let len = self.row_len().max(1);
        self.data.chunks_exact(len)
    }

    /// Checks that `other` has the same dimensions.
    pub fn ensure_same_size(&self, other: &PixelBuffer) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), other.dimensions()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples", &self.data.len())
            .finish()
    }
}

fn sample_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
}
