//! Strided sample-plane views.
//!
//! A plane is a borrowed 2D window over caller-owned sample memory: a base
//! slice, a row stride (which may exceed the visible width for alignment or
//! padding), and the visible dimensions. The motion-compensation engine never
//! owns pixel memory; it reads reference planes through [`PlaneRef`] and
//! writes predictions through [`PlaneMut`].
//!
//! Fractional interpolation reads a support window around the addressed
//! position (2 samples up/left and 3 down/right for luma, 1 down/right for
//! chroma). Supplying that margin — typically by decoding into an
//! edge-padded frame — is the caller's responsibility; the views here only
//! validate overall geometry, not per-call margins.

use crate::error::{Error, Result};

/// Read-only view of a sample plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneRef<'a> {
    /// Create a view over `data` with the given geometry.
    ///
    /// Fails if the stride is narrower than a row, any dimension is zero, or
    /// the buffer cannot hold `height` rows.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        validate_geometry(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The full backing slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Linear index of the sample at `(x, y)`.
    #[inline]
    pub fn offset_of(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    /// Sample at `(x, y)`.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[self.offset_of(x, y)]
    }

    /// Row `y` of the visible area.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Subslice starting at `(x, y)`, running to the end of the buffer.
    ///
    /// Interpolation operators index into this window with their own support
    /// offsets; positions outside the plane panic on the slice bounds check.
    #[inline]
    pub fn window(&self, x: usize, y: usize) -> &'a [u8] {
        &self.data[self.offset_of(x, y)..]
    }
}

/// Mutable view of a sample plane, used for prediction destinations.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    /// Create a mutable view over `data` with the given geometry.
    pub fn new(data: &'a mut [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        validate_geometry(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data
    }

    #[inline]
    pub fn offset_of(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    /// Mutable subslice starting at `(x, y)`.
    #[inline]
    pub fn window_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let off = self.offset_of(x, y);
        &mut self.data[off..]
    }

    /// Reborrow as a read-only view.
    pub fn as_ref(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

fn validate_geometry(len: usize, width: usize, height: usize, stride: usize) -> Result<()> {
    if width == 0 || height == 0 || stride < width {
        return Err(Error::InvalidPlaneGeometry {
            width,
            height,
            stride,
        });
    }
    // The last row only needs `width` samples, not a full stride.
    let needed = (height - 1) * stride + width;
    if len < needed {
        return Err(Error::BufferTooSmall {
            needed,
            available: len,
        });
    }
    Ok(())
}
