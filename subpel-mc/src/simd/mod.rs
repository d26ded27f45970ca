//! SIMD back-ends for the interpolation operators.
//!
//! Every function here is bit-exact with its scalar counterpart in
//! [`crate::block`], [`crate::avg`] and [`crate::chroma`] — that equivalence
//! is the conformance contract, enforced by the property tests in
//! `tests/equivalence.rs`.
//!
//! # Coverage
//!
//! Not every operator has a kernel at every tier; tiers inherit the widest
//! earlier kernel for anything they do not override:
//!
//! | Operator          | SSE2 | SSSE3        | AVX2         | NEON |
//! |-------------------|------|--------------|--------------|------|
//! | half-pel hor      | ✅   | ✅ (pshufb)  | ✅           | ✅   |
//! | half-pel ver      | ✅   | SSE2         | ✅           | ✅   |
//! | half-pel center   | ✅   | SSE2         | SSE2         | ✅   |
//! | pixel average     | ✅   | SSE2         | SSE2         | ✅   |
//! | chroma bilinear   | ✅ (width 8) | SSE2 | SSE2        | ✅ (width 8) |
//! | block copy        | scalar everywhere (`copy_from_slice` is already a memcpy) ||||
//!
//! Chroma widths 2 and 4 stay scalar at all tiers; the vector path needs an
//! 8-sample row. Block sizes that are not a multiple of the vector width
//! (the extended 5/9/17 half-pel planes) are handled with a scalar tail.
//!
//! # Safety
//!
//! All kernels are `unsafe fn` gated on `#[target_feature]`. They are only
//! ever installed into an operator table after [`subpel_core::CpuFeatures`]
//! reported the matching feature, which is what makes the call sites sound.

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64;

#[cfg(target_arch = "aarch64")]
pub(crate) mod aarch64;
