//! Operator table and capability selection.
//!
//! The engine binds one implementation per operator exactly once, at
//! construction: the scalar reference first, then each detected tier
//! overrides the operators it accelerates, in priority order
//! scalar → SSE2 → SSSE3 → AVX2 on x86_64 and scalar → NEON on AArch64.
//! After that the table is immutable, so concurrent readers need no
//! synchronization; callers partition destination blocks among themselves.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use subpel_core::{CpuFeatures, MotionVector, PlaneRef};

use crate::{avg, block, chroma, luma};

/// Block operator: `(dst, dst_stride, src, src_stride, width, height)`.
pub type BlockOpFn = fn(&mut [u8], usize, &[u8], usize, usize, usize);

/// Averaging operator:
/// `(dst, dst_stride, src_a, a_stride, src_b, b_stride, width, height)`.
pub type PixelAvgFn = fn(&mut [u8], usize, &[u8], usize, &[u8], usize, usize, usize);

/// Top-level compensation entry:
/// `(dst, dst_stride, src, src_offset, src_stride, mv_x, mv_y, width, height)`.
pub type McFn = fn(&mut [u8], usize, &[u8], usize, usize, i16, i16, usize, usize);

/// Implementation tier backing an operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    Scalar,
    Sse2,
    Ssse3,
    Avx2,
    Neon,
}

impl Backend {
    /// The CPU features this tier needs. Tiers are cumulative on x86_64,
    /// matching how selection layers the overrides.
    pub fn required_features(self) -> CpuFeatures {
        match self {
            Backend::Scalar => CpuFeatures::empty(),
            Backend::Sse2 => CpuFeatures::SSE2,
            Backend::Ssse3 => CpuFeatures::SSE2 | CpuFeatures::SSSE3,
            Backend::Avx2 => CpuFeatures::SSE2 | CpuFeatures::SSSE3 | CpuFeatures::AVX2,
            Backend::Neon => CpuFeatures::NEON,
        }
    }
}

/// Engine configuration.
///
/// `backend: None` selects the widest tier the CPU supports; forcing a tier
/// is mainly useful for conformance testing and benchmarking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct McConfig {
    pub backend: Option<Backend>,
}

/// The operator function table: populated once, read-only afterwards.
pub struct McOps {
    /// Quarter-pel luma compensation (position dispatch included).
    pub luma: McFn,
    /// Eighth-pel chroma compensation.
    pub chroma: McFn,
    /// Horizontal half-pel plane filter (supports the extended widths).
    pub halfpel_hor: BlockOpFn,
    /// Vertical half-pel plane filter.
    pub halfpel_ver: BlockOpFn,
    /// Combined half-pel plane filter.
    pub halfpel_center: BlockOpFn,
    /// Full-pixel block copy.
    pub copy: BlockOpFn,
    /// Rounded pairwise averaging.
    pub pixel_avg: PixelAvgFn,
    backend: Backend,
}

impl McOps {
    /// Bind the most specific implementation of each operator for `caps`.
    pub fn select(caps: CpuFeatures) -> Self {
        let mut ops = Self {
            luma: luma::mc_luma_ref,
            chroma: chroma::mc_chroma_ref,
            halfpel_hor: block::halfpel_hor,
            halfpel_ver: block::halfpel_ver,
            halfpel_center: block::halfpel_center,
            copy: block::copy_sized,
            pixel_avg: avg::pixel_avg,
            backend: Backend::Scalar,
        };

        #[cfg(target_arch = "x86_64")]
        {
            if caps.contains(CpuFeatures::SSE2) {
                ops.luma = x86::mc_luma_sse2;
                ops.chroma = x86::mc_chroma_sse2;
                ops.halfpel_hor = x86::halfpel_hor_sse2;
                ops.halfpel_ver = x86::halfpel_ver_sse2;
                ops.halfpel_center = x86::halfpel_center_sse2;
                ops.pixel_avg = x86::pixel_avg_sse2;
                ops.backend = Backend::Sse2;
            }
            if caps.contains(CpuFeatures::SSE2 | CpuFeatures::SSSE3) {
                ops.luma = x86::mc_luma_ssse3;
                ops.halfpel_hor = x86::halfpel_hor_ssse3;
                ops.backend = Backend::Ssse3;
            }
            if caps.contains(CpuFeatures::SSE2 | CpuFeatures::AVX2) {
                ops.luma = x86::mc_luma_avx2;
                ops.halfpel_hor = x86::halfpel_hor_avx2;
                ops.halfpel_ver = x86::halfpel_ver_avx2;
                ops.backend = Backend::Avx2;
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if caps.contains(CpuFeatures::NEON) {
                ops.luma = arm::mc_luma_neon;
                ops.chroma = arm::mc_chroma_neon;
                ops.halfpel_hor = arm::halfpel_hor_neon;
                ops.halfpel_ver = arm::halfpel_ver_neon;
                ops.halfpel_center = arm::halfpel_center_neon;
                ops.pixel_avg = arm::pixel_avg_neon;
                ops.backend = Backend::Neon;
            }
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        let _ = caps;

        ops
    }

    /// The tier the table was bound from.
    pub fn backend(&self) -> Backend {
        self.backend
    }
}

/// The motion-compensation engine: an operator table plus the plane-level
/// entry points.
pub struct McEngine {
    ops: McOps,
}

impl McEngine {
    /// Detect CPU features and bind the widest available tier.
    pub fn new() -> Self {
        Self::with_features(CpuFeatures::detect())
    }

    /// Bind operators for an explicit feature set. The caller is
    /// responsible for only naming features the CPU actually has.
    pub fn with_features(caps: CpuFeatures) -> Self {
        let ops = McOps::select(caps);
        tracing::debug!(backend = ?ops.backend, "bound motion-compensation operators");
        Self { ops }
    }

    /// Build an engine from a configuration, falling back to auto-detection
    /// when a forced tier is not supported by the running CPU.
    pub fn with_config(config: McConfig) -> Self {
        match config.backend {
            None => Self::new(),
            Some(tier) => {
                let wanted = tier.required_features();
                if CpuFeatures::detect().contains(wanted) {
                    Self::with_features(wanted)
                } else {
                    tracing::warn!(
                        ?tier,
                        "forced backend unsupported by this CPU, autodetecting instead"
                    );
                    Self::new()
                }
            }
        }
    }

    /// The process-wide engine, bound on first use.
    pub fn global() -> &'static McEngine {
        static ENGINE: OnceLock<McEngine> = OnceLock::new();
        ENGINE.get_or_init(McEngine::new)
    }

    pub fn backend(&self) -> Backend {
        self.ops.backend
    }

    /// The raw operator table, for callers that drive it directly.
    pub fn ops(&self) -> &McOps {
        &self.ops
    }

    /// Quarter-pel luma prediction of a `width × height` block.
    ///
    /// `(x, y)` addresses the integer-position sample in the reference
    /// plane — the integer part of the motion vector has already been
    /// applied by the caller; only the fractional phase is consumed here.
    /// For fractional phases the plane must provide 2 samples of margin
    /// above/left of `(x, y)` and `width + 3` / `height + 3` to the right /
    /// below. Violations panic on the slice bounds check.
    pub fn luma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        mv: MotionVector,
        width: usize,
        height: usize,
    ) {
        debug_assert_margins_luma(&src, x, y, mv, width, height);
        (self.ops.luma)(
            dst,
            dst_stride,
            src.data(),
            src.offset_of(x, y),
            src.stride(),
            mv.x,
            mv.y,
            width,
            height,
        );
    }

    /// Eighth-pel chroma prediction of a `width × height` block.
    ///
    /// Same addressing contract as [`Self::luma`]; fractional phases need
    /// one extra sample of margin to the right and below `(x, y)`.
    pub fn chroma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        mv: MotionVector,
        width: usize,
        height: usize,
    ) {
        (self.ops.chroma)(
            dst,
            dst_stride,
            src.data(),
            src.offset_of(x, y),
            src.stride(),
            mv.x,
            mv.y,
            width,
            height,
        );
    }

    /// Horizontal half-pel plane filter at `(x, y)`, including the extended
    /// widths (5/9/17) used when materializing encoder half-pel planes.
    /// Needs 2 columns of margin left of `x` and `width + 2` to the right.
    pub fn luma_halfpel_hor(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        let off = src.offset_of(x, y) - 2;
        (self.ops.halfpel_hor)(dst, dst_stride, &src.data()[off..], src.stride(), width, height);
    }

    /// Vertical half-pel plane filter at `(x, y)`. Needs 2 rows of margin
    /// above `y` and `height + 2` below.
    pub fn luma_halfpel_ver(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        let off = src.offset_of(x, y) - 2 * src.stride();
        (self.ops.halfpel_ver)(dst, dst_stride, &src.data()[off..], src.stride(), width, height);
    }

    /// Combined half-pel plane filter at `(x, y)`. Needs 2 samples of
    /// margin up/left and `width + 2` / `height + 2` down-right.
    pub fn luma_halfpel_center(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        let off = src.offset_of(x, y) - 2 * src.stride() - 2;
        (self.ops.halfpel_center)(
            dst,
            dst_stride,
            &src.data()[off..],
            src.stride(),
            width,
            height,
        );
    }

    /// Full-pixel block copy at `(x, y)` through the bound operator table.
    pub fn copy(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        (self.ops.copy)(dst, dst_stride, src.window(x, y), src.stride(), width, height);
    }

    /// Rounded average of two prediction blocks (bi-prediction blend).
    #[allow(clippy::too_many_arguments)]
    pub fn pixel_avg(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src_a: &[u8],
        src_a_stride: usize,
        src_b: &[u8],
        src_b_stride: usize,
        width: usize,
        height: usize,
    ) {
        (self.ops.pixel_avg)(
            dst,
            dst_stride,
            src_a,
            src_a_stride,
            src_b,
            src_b_stride,
            width,
            height,
        );
    }
}

impl Default for McEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn debug_assert_margins_luma(
    src: &PlaneRef<'_>,
    x: usize,
    y: usize,
    mv: MotionVector,
    width: usize,
    height: usize,
) {
    debug_assert!(
        mv.is_luma_integer()
            || (x >= 2
                && y >= 2
                && x + width + 3 <= src.width()
                && y + height + 3 <= src.height()),
        "fractional luma MC at ({x}, {y}) lacks the interpolation margin"
    );
}

/// Safe wrappers around the x86_64 kernels.
///
/// Installing one of these into the table is only done after the matching
/// feature was detected, which upholds the kernels' safety contract.
#[cfg(target_arch = "x86_64")]
mod x86 {
    use crate::block;
    use crate::chroma::mc_chroma_with;
    use crate::luma::{mc_luma_with, LumaKernels};
    use crate::simd::x86_64 as kernels;

    pub fn halfpel_hor_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_hor_sse2(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_ver_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_ver_sse2(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_center_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_center_sse2(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_hor_ssse3(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_hor_ssse3(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_hor_avx2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_hor_avx2(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_ver_avx2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_ver_avx2(dst, ds, src, ss, w, h) }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pixel_avg_sse2(
        dst: &mut [u8],
        ds: usize,
        a: &[u8],
        astride: usize,
        b: &[u8],
        bstride: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::pixel_avg_sse2(dst, ds, a, astride, b, bstride, w, h) }
    }

    #[allow(clippy::too_many_arguments)]
    fn chroma_bilinear_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        dx: usize,
        dy: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::chroma_bilinear_sse2(dst, ds, src, ss, dx, dy, w, h) }
    }

    static SSE2_KERNELS: LumaKernels = LumaKernels {
        hor: halfpel_hor_sse2,
        ver: halfpel_ver_sse2,
        center: halfpel_center_sse2,
        copy: block::copy_sized,
        avg: pixel_avg_sse2,
    };

    static SSSE3_KERNELS: LumaKernels = LumaKernels {
        hor: halfpel_hor_ssse3,
        ver: halfpel_ver_sse2,
        center: halfpel_center_sse2,
        copy: block::copy_sized,
        avg: pixel_avg_sse2,
    };

    static AVX2_KERNELS: LumaKernels = LumaKernels {
        hor: halfpel_hor_avx2,
        ver: halfpel_ver_avx2,
        center: halfpel_center_sse2,
        copy: block::copy_sized,
        avg: pixel_avg_sse2,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn mc_luma_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_luma_with(&SSE2_KERNELS, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mc_luma_ssse3(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_luma_with(&SSSE3_KERNELS, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mc_luma_avx2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_luma_with(&AVX2_KERNELS, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mc_chroma_sse2(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_chroma_with(chroma_bilinear_sse2, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }
}

/// Safe wrappers around the NEON kernels.
#[cfg(target_arch = "aarch64")]
mod arm {
    use crate::chroma::mc_chroma_with;
    use crate::luma::{mc_luma_with, LumaKernels};
    use crate::simd::aarch64 as kernels;
    use crate::block;

    pub fn halfpel_hor_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_hor_neon(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_ver_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_ver_neon(dst, ds, src, ss, w, h) }
    }

    pub fn halfpel_center_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::halfpel_center_neon(dst, ds, src, ss, w, h) }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pixel_avg_neon(
        dst: &mut [u8],
        ds: usize,
        a: &[u8],
        astride: usize,
        b: &[u8],
        bstride: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::pixel_avg_neon(dst, ds, a, astride, b, bstride, w, h) }
    }

    #[allow(clippy::too_many_arguments)]
    fn chroma_bilinear_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        ss: usize,
        dx: usize,
        dy: usize,
        w: usize,
        h: usize,
    ) {
        unsafe { kernels::chroma_bilinear_neon(dst, ds, src, ss, dx, dy, w, h) }
    }

    static NEON_KERNELS: LumaKernels = LumaKernels {
        hor: halfpel_hor_neon,
        ver: halfpel_ver_neon,
        center: halfpel_center_neon,
        copy: block::copy_sized,
        avg: pixel_avg_neon,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn mc_luma_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_luma_with(&NEON_KERNELS, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mc_chroma_neon(
        dst: &mut [u8],
        ds: usize,
        src: &[u8],
        off: usize,
        ss: usize,
        mv_x: i16,
        mv_y: i16,
        w: usize,
        h: usize,
    ) {
        mc_chroma_with(chroma_bilinear_neon, dst, ds, src, off, ss, mv_x, mv_y, w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_selection_is_always_possible() {
        let engine = McEngine::with_features(CpuFeatures::empty());
        assert_eq!(engine.backend(), Backend::Scalar);
    }

    #[test]
    fn auto_selection_matches_detected_features() {
        let caps = CpuFeatures::detect();
        let engine = McEngine::new();
        let expected = McOps::select(caps).backend();
        assert_eq!(engine.backend(), expected);
    }

    #[test]
    fn forced_unsupported_backend_falls_back() {
        // NEON cannot be forced on x86_64 and vice versa; either way the
        // engine must come up usable.
        #[cfg(target_arch = "x86_64")]
        let impossible = Backend::Neon;
        #[cfg(not(target_arch = "x86_64"))]
        let impossible = Backend::Avx2;

        let engine = McEngine::with_config(McConfig {
            backend: Some(impossible),
        });
        assert_ne!(engine.backend(), impossible);
    }

    #[test]
    fn global_engine_is_stable() {
        let a = McEngine::global().backend();
        let b = McEngine::global().backend();
        assert_eq!(a, b);
    }

    #[test]
    fn engine_entry_points_run() {
        let data: Vec<u8> = (0..64 * 64).map(|i| (i % 251) as u8).collect();
        let plane = PlaneRef::new(&data, 64, 64, 64).unwrap();
        let engine = McEngine::new();

        let mut dst = vec![0u8; 16 * 16];
        engine.luma(
            &mut dst,
            16,
            plane,
            8,
            8,
            MotionVector::new(3, 1),
            16,
            16,
        );
        engine.chroma(&mut dst, 16, plane, 8, 8, MotionVector::new(5, 7), 8, 8);
        engine.luma_halfpel_hor(&mut dst, 16, plane, 8, 8, 16, 16);
        engine.luma_halfpel_ver(&mut dst, 16, plane, 8, 8, 16, 16);
        engine.luma_halfpel_center(&mut dst, 16, plane, 8, 8, 16, 16);

        engine.copy(&mut dst, 16, plane, 8, 8, 16, 16);
        assert_eq!(dst[0], data[8 * 64 + 8]);

        let a = vec![1u8; 64];
        let b = vec![2u8; 64];
        let mut avg_dst = vec![0u8; 64];
        engine.pixel_avg(&mut avg_dst, 8, &a, 8, &b, 8, 8, 8);
        assert!(avg_dst.iter().all(|&v| v == 2));
    }
}
