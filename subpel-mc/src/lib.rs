//! # Subpel MC
//!
//! Sub-pixel motion compensation for block-based video coding:
//!
//! - **Quarter-pel luma** via the six-tap half-pel FIR `[1, -5, 20, 20, -5, 1]`
//!   plus rounded pairwise averaging for the quarter and three-quarter
//!   phases — 16 fixed reconstruction paths selected by the low two bits of
//!   the motion vector.
//! - **Eighth-pel chroma** via bilinear weighting over the four neighbouring
//!   integer samples, with a constant 8×8 weight table.
//! - **Runtime dispatch**: a scalar reference implementation plus SSE2 /
//!   SSSE3 / AVX2 and NEON kernels, bound into an operator table exactly
//!   once at engine construction. Every back-end is bit-exact with the
//!   reference — conformance depends on identical pixels everywhere.
//!
//! ## Usage
//!
//! ```
//! use subpel_mc::{McEngine, MotionVector, PlaneRef};
//!
//! let samples = vec![128u8; 64 * 64];
//! let reference = PlaneRef::new(&samples, 64, 64, 64).unwrap();
//! let mut prediction = vec![0u8; 16 * 16];
//!
//! // (8, 8) already includes the vector's integer part; the engine
//! // consumes the fractional phase.
//! McEngine::global().luma(
//!     &mut prediction,
//!     16,
//!     reference,
//!     8,
//!     8,
//!     MotionVector::new(2, 1),
//!     16,
//!     16,
//! );
//! ```
//!
//! ## Caller contract
//!
//! The engine performs no motion-vector clipping and no edge emulation:
//! the reference plane must carry enough margin around the addressed window
//! (2 samples up/left and `size + 3` down-right for fractional luma, one
//! extra sample down-right for fractional chroma). Frame-boundary padding
//! belongs to the decoder's frame store, not to this crate. Contract
//! violations panic on slice bounds checks; they are never memory-unsafe.
//!
//! ## Threading
//!
//! Everything here is synchronous and lock-free. Concurrent callers only
//! need disjoint destination regions; the [`parallel`] module provides a
//! band partitioner on top of rayon.

pub mod avg;
pub mod block;
pub mod chroma;
pub mod engine;
pub mod filter;
pub mod luma;
pub mod parallel;

mod simd;

pub use chroma::mc_chroma_ref;
pub use engine::{Backend, BlockOpFn, McConfig, McEngine, McFn, McOps, PixelAvgFn};
pub use filter::CHROMA_WEIGHTS;
pub use luma::mc_luma_ref;
pub use parallel::{compensate_bands, BlockJob, PlaneKind};

// The vocabulary types, re-exported so most users need only this crate.
pub use subpel_core::{CpuFeatures, Error, MotionVector, PlaneMut, PlaneRef, Result};
