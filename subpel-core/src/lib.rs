//! # Subpel Core
//!
//! Core types shared by the subpel motion-compensation engine:
//! - Strided sample-plane views over caller-owned memory
//! - Motion vectors with quarter-pel / eighth-pel phase accessors
//! - Runtime CPU feature detection
//! - Error types for the validation surfaces
//!
//! The hot interpolation paths live in the `subpel-mc` crate; this crate only
//! holds the vocabulary types they operate on.

pub mod cpu;
pub mod error;
pub mod mv;
pub mod plane;

pub use cpu::CpuFeatures;
pub use error::{Error, Result};
pub use mv::MotionVector;
pub use plane::{PlaneMut, PlaneRef};
