//! Frame and plane buffers.
//!
//! All buffers are row-major, top-to-bottom, without padding:
//!
//! ```text
//! Frame: [B G R B G R ...]  <- Row 0   (3 bytes per pixel)
//!        [B G R B G R ...]  <- Row 1
//! Plane: [Y Y Y Y ...]      <- Row 0   (1 byte per pixel)
//! ```
//!
//! [`Plane`] carries a marker type so a luminance plane cannot be passed
//! where a gradient plane is expected:
//!
//! ```rust
//! use sobel_core::{GrayImage, Resolution, SobelImage};
//!
//! let res = Resolution::new(64, 48).unwrap();
//! let gray = GrayImage::new(res);
//! let sobel = SobelImage::new(res);
//! assert_eq!(gray.as_bytes().len(), sobel.as_bytes().len());
//! ```

use crate::{CoreError, CoreResult, RowRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Smallest accepted width or height.
pub const MIN_DIMENSION: u32 = 3;

/// Frame size, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// 640x480, the capture size the pipeline was tuned for.
    pub const VGA: Self = Self {
        width: 640,
        height: 480,
    };

    /// Creates a validated resolution.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] when either side is below
    /// [`MIN_DIMENSION`] or the color buffer size overflows `usize`.
    pub fn new(width: u32, height: u32) -> CoreResult<Self> {
        let res = Self { width, height };
        res.validate()?;
        Ok(res)
    }

    /// Checks an already-built resolution (e.g. one read from a config file).
    pub fn validate(&self) -> CoreResult<()> {
        if self.width < MIN_DIMENSION || self.height < MIN_DIMENSION {
            return Err(CoreError::invalid_dimensions(
                self.width,
                self.height,
                format!("both sides must be at least {MIN_DIMENSION}"),
            ));
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(Frame::CHANNELS))
            .ok_or_else(|| {
                CoreError::invalid_dimensions(self.width, self.height, "buffer size overflows")
            })?;
        Ok(())
    }

    /// Width as `usize`.
    #[inline]
    pub fn w(&self) -> usize {
        self.width as usize
    }

    /// Height as `usize`.
    #[inline]
    pub fn h(&self) -> usize {
        self.height as usize
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.w() * self.h()
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Captured color frame, 3 interleaved 8-bit channels in B, G, R order.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    resolution: Resolution,
}

impl Frame {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 3;

    /// Creates a black frame.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            data: vec![0; resolution.pixel_count() * Self::CHANNELS],
            resolution,
        }
    }

    /// Wraps existing BGR bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BufferSize`] if `data` is not exactly
    /// `width * height * 3` bytes.
    pub fn from_bgr(resolution: Resolution, data: Vec<u8>) -> CoreResult<Self> {
        let expected = resolution.pixel_count() * Self::CHANNELS;
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { data, resolution })
    }

    /// Creates a frame where every pixel is `bgr`.
    pub fn filled(resolution: Resolution, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(resolution.pixel_count() * Self::CHANNELS);
        for _ in 0..resolution.pixel_count() {
            data.extend_from_slice(&bgr);
        }
        Self { data, resolution }
    }

    /// Frame size.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Raw BGR bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw BGR bytes, for capture sources filling in place.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the `[b, g, r]` triple at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        debug_assert!(x < self.resolution.width && y < self.resolution.height);
        let i = (y as usize * self.resolution.w() + x as usize) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Sets the `[b, g, r]` triple at (x, y).
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        debug_assert!(x < self.resolution.width && y < self.resolution.height);
        let i = (y as usize * self.resolution.w() + x as usize) * Self::CHANNELS;
        self.data[i..i + Self::CHANNELS].copy_from_slice(&bgr);
    }

    /// Bytes covering `rows`.
    #[inline]
    pub fn rows(&self, rows: RowRange) -> &[u8] {
        &self.data[rows.byte_range(self.resolution.w() * Self::CHANNELS)]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

/// Marker for what a single-channel [`Plane`] holds.
pub trait PlaneKind: Send + Sync + 'static {
    /// Short label used in logs.
    const NAME: &'static str;
}

/// Luminance produced by the grayscale kernel.
#[derive(Debug, Clone, Copy)]
pub struct Luma;

/// Gradient magnitude produced by the Sobel kernel.
#[derive(Debug, Clone, Copy)]
pub struct Gradient;

impl PlaneKind for Luma {
    const NAME: &'static str = "gray";
}

impl PlaneKind for Gradient {
    const NAME: &'static str = "sobel";
}

/// Grayscale image.
pub type GrayImage = Plane<Luma>;

/// Gradient magnitude image.
///
/// Rows 0 and H-1 and columns 0 and W-1 are never written by the kernel;
/// they keep whatever the plane held when it was allocated (zero).
pub type SobelImage = Plane<Gradient>;

/// Single-channel 8-bit image.
pub struct Plane<K: PlaneKind> {
    data: Vec<u8>,
    resolution: Resolution,
    _kind: PhantomData<K>,
}

impl<K: PlaneKind> Plane<K> {
    /// Creates a zeroed plane.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            data: vec![0; resolution.pixel_count()],
            resolution,
            _kind: PhantomData,
        }
    }

    /// Wraps existing bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BufferSize`] if `data` is not `width * height` bytes.
    pub fn from_vec(resolution: Resolution, data: Vec<u8>) -> CoreResult<Self> {
        if data.len() != resolution.pixel_count() {
            return Err(CoreError::BufferSize {
                expected: resolution.pixel_count(),
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            resolution,
            _kind: PhantomData,
        })
    }

    /// Plane size.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Raw pointer to the first byte.
    ///
    /// Does not create a reference to the buffer, so the pointer stays
    /// valid across later calls to [`as_bytes`](Self::as_bytes) as long as
    /// the plane is not resized or dropped.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    /// Consumes the plane and returns its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Value at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.resolution.width && y < self.resolution.height);
        self.data[y as usize * self.resolution.w() + x as usize]
    }

    /// Sets the value at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        debug_assert!(x < self.resolution.width && y < self.resolution.height);
        let w = self.resolution.w();
        self.data[y as usize * w + x as usize] = value;
    }

    /// One row.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let w = self.resolution.w();
        &self.data[y * w..(y + 1) * w]
    }

    /// Bytes covering `rows`.
    #[inline]
    pub fn rows(&self, rows: RowRange) -> &[u8] {
        &self.data[rows.byte_range(self.resolution.w())]
    }

    /// Mutable bytes covering `rows`.
    #[inline]
    pub fn rows_mut(&mut self, rows: RowRange) -> &mut [u8] {
        let range = rows.byte_range(self.resolution.w());
        &mut self.data[range]
    }
}

impl<K: PlaneKind> Clone for Plane<K> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            resolution: self.resolution,
            _kind: PhantomData,
        }
    }
}

impl<K: PlaneKind> PartialEq for Plane<K> {
    fn eq(&self, other: &Self) -> bool {
        self.resolution == other.resolution && self.data == other.data
    }
}

impl<K: PlaneKind> Eq for Plane<K> {}

impl<K: PlaneKind> fmt::Debug for Plane<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plane")
            .field("kind", &K::NAME)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}
