//! Error types for the subpel library.
//!
//! Interpolation itself is infallible; errors only arise when constructing
//! plane views or partitioning parallel work.

use thiserror::Error;

/// Result alias used across the subpel crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the subpel library.
#[derive(Error, Debug)]
pub enum Error {
    /// Plane geometry is inconsistent (zero-sized, or stride narrower than a row).
    #[error("invalid plane geometry: {width}x{height} with stride {stride}")]
    InvalidPlaneGeometry {
        width: usize,
        height: usize,
        stride: usize,
    },

    /// Backing buffer cannot hold the described plane.
    #[error("plane buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Block size outside the supported set.
    #[error("unsupported block size {width}x{height}")]
    UnsupportedBlockSize { width: usize, height: usize },

    /// A parallel job straddles a band boundary and cannot be scheduled.
    #[error("block at ({x}, {y}) crosses a band boundary")]
    BlockCrossesBand { x: usize, y: usize },

    /// Band partitioning was requested with a zero band height.
    #[error("invalid band height {0}")]
    InvalidBandHeight(usize),
}
