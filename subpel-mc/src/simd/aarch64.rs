//! AArch64 NEON kernels.
//!
//! Same layout conventions as the scalar operators in [`crate::block`]. The
//! rounding steps map directly onto NEON's rounding-narrow instructions:
//! `vqrshrun_n_s16(x, 5)` is exactly `clamp((x + 16) >> 5)` and
//! `vqrshrn_n_s32(x, 10)` is `sat16((x + 512) >> 10)`.

use std::arch::aarch64::*;

use crate::block::{MAX_HALFPEL_H, MAX_HALFPEL_W};
use crate::filter::{round_center, round_half, six_tap_i16, six_tap_u8, CHROMA_WEIGHTS};

/// Six-tap over widened 16-bit lanes: `(p0+p5) - 5*(p1+p4) + 20*(p2+p3)`.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn six_tap_s16(
    p0: uint8x8_t,
    p1: uint8x8_t,
    p2: uint8x8_t,
    p3: uint8x8_t,
    p4: uint8x8_t,
    p5: uint8x8_t,
) -> int16x8_t {
    let p05 = vreinterpretq_s16_u16(vaddl_u8(p0, p5));
    let p14 = vreinterpretq_s16_u16(vaddl_u8(p1, p4));
    let p23 = vreinterpretq_s16_u16(vaddl_u8(p2, p3));
    vmlsq_n_s16(vmlaq_n_s16(p05, p23, 20), p14, 5)
}

/// Horizontal half-pel filter, NEON.
///
/// # Safety
///
/// NEON must be available (guaranteed on AArch64, still feature-gated).
/// `src` must hold `height` rows of `width + 5` samples at `src_stride`;
/// `dst` must hold `height` rows of `width` samples at `dst_stride`.
#[target_feature(enable = "neon")]
pub unsafe fn halfpel_hor_neon(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    debug_assert!(src.len() >= (height - 1) * src_stride + width + 5);
    for r in 0..height {
        let row = r * src_stride;
        let drow = r * dst_stride;
        let mut c = 0;
        while c + 8 <= width {
            let base = src.as_ptr().add(row + c);
            let sum = six_tap_s16(
                vld1_u8(base),
                vld1_u8(base.add(1)),
                vld1_u8(base.add(2)),
                vld1_u8(base.add(3)),
                vld1_u8(base.add(4)),
                vld1_u8(base.add(5)),
            );
            vst1_u8(dst.as_mut_ptr().add(drow + c), vqrshrun_n_s16::<5>(sum));
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], 1));
            c += 1;
        }
    }
}

/// Vertical half-pel filter, NEON.
///
/// # Safety
///
/// NEON must be available. `src` must hold `height + 5` rows of `width`
/// samples at `src_stride`.
#[target_feature(enable = "neon")]
pub unsafe fn halfpel_ver_neon(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    debug_assert!(src.len() >= (height + 4) * src_stride + width);
    for r in 0..height {
        let row = r * src_stride;
        let drow = r * dst_stride;
        let mut c = 0;
        while c + 8 <= width {
            let base = src.as_ptr().add(row + c);
            let sum = six_tap_s16(
                vld1_u8(base),
                vld1_u8(base.add(src_stride)),
                vld1_u8(base.add(2 * src_stride)),
                vld1_u8(base.add(3 * src_stride)),
                vld1_u8(base.add(4 * src_stride)),
                vld1_u8(base.add(5 * src_stride)),
            );
            vst1_u8(dst.as_mut_ptr().add(drow + c), vqrshrun_n_s16::<5>(sum));
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], src_stride));
            c += 1;
        }
    }
}

/// Combined half-pel filter (diagonal position), NEON.
///
/// # Safety
///
/// NEON must be available. `src` must hold `height + 5` rows of `width + 5`
/// samples at `src_stride`; `width <= 17`, `height <= 17`.
#[target_feature(enable = "neon")]
pub unsafe fn halfpel_center_neon(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    debug_assert!(width <= MAX_HALFPEL_W && height + 5 <= MAX_HALFPEL_H);
    let mut tmp = [0i16; MAX_HALFPEL_W * MAX_HALFPEL_H];

    for r in 0..height + 5 {
        let row = r * src_stride;
        let mut c = 0;
        while c + 8 <= width {
            let base = src.as_ptr().add(row + c);
            let sum = six_tap_s16(
                vld1_u8(base),
                vld1_u8(base.add(1)),
                vld1_u8(base.add(2)),
                vld1_u8(base.add(3)),
                vld1_u8(base.add(4)),
                vld1_u8(base.add(5)),
            );
            vst1q_s16(tmp.as_mut_ptr().add(r * width + c), sum);
            c += 8;
        }
        while c < width {
            tmp[r * width + c] = six_tap_u8(&src[row + c..], 1) as i16;
            c += 1;
        }
    }

    for r in 0..height {
        let drow = r * dst_stride;
        let mut c = 0;
        while c + 8 <= width {
            let base = tmp.as_ptr().add(r * width + c);
            let t0 = vld1q_s16(base);
            let t1 = vld1q_s16(base.add(width));
            let t2 = vld1q_s16(base.add(2 * width));
            let t3 = vld1q_s16(base.add(3 * width));
            let t4 = vld1q_s16(base.add(4 * width));
            let t5 = vld1q_s16(base.add(5 * width));
            // Pairwise sums stay within i16 (|t| <= 10710); the weighted
            // combination widens to i32.
            let a = vaddq_s16(t0, t5);
            let b = vaddq_s16(t1, t4);
            let cc = vaddq_s16(t2, t3);

            let sum_lo = vmlsl_n_s16(
                vmlal_n_s16(vmovl_s16(vget_low_s16(a)), vget_low_s16(cc), 20),
                vget_low_s16(b),
                5,
            );
            let sum_hi = vmlsl_n_s16(
                vmlal_n_s16(vmovl_s16(vget_high_s16(a)), vget_high_s16(cc), 20),
                vget_high_s16(b),
                5,
            );
            let r_lo = vqrshrn_n_s32::<10>(sum_lo);
            let r_hi = vqrshrn_n_s32::<10>(sum_hi);
            vst1_u8(
                dst.as_mut_ptr().add(drow + c),
                vqmovun_s16(vcombine_s16(r_lo, r_hi)),
            );
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_center(six_tap_i16(&tmp[r * width + c..], width));
            c += 1;
        }
    }
}

/// Rounded pairwise average, NEON (`vrhadd` is exactly `(a + b + 1) >> 1`).
///
/// # Safety
///
/// NEON must be available. Both sources and the destination must hold
/// `height` rows of `width` samples at their respective strides.
#[target_feature(enable = "neon")]
pub unsafe fn pixel_avg_neon(
    dst: &mut [u8],
    dst_stride: usize,
    src_a: &[u8],
    src_a_stride: usize,
    src_b: &[u8],
    src_b_stride: usize,
    width: usize,
    height: usize,
) {
    for r in 0..height {
        let arow = r * src_a_stride;
        let brow = r * src_b_stride;
        let drow = r * dst_stride;
        let mut c = 0;
        while c + 16 <= width {
            let a = vld1q_u8(src_a.as_ptr().add(arow + c));
            let b = vld1q_u8(src_b.as_ptr().add(brow + c));
            vst1q_u8(dst.as_mut_ptr().add(drow + c), vrhaddq_u8(a, b));
            c += 16;
        }
        while c + 8 <= width {
            let a = vld1_u8(src_a.as_ptr().add(arow + c));
            let b = vld1_u8(src_b.as_ptr().add(brow + c));
            vst1_u8(dst.as_mut_ptr().add(drow + c), vrhadd_u8(a, b));
            c += 8;
        }
        while c < width {
            let a = u16::from(src_a[arow + c]);
            let b = u16::from(src_b[brow + c]);
            dst[drow + c] = ((a + b + 1) >> 1) as u8;
            c += 1;
        }
    }
}

/// Bilinear chroma interpolation, NEON. Vectorizes 8-sample rows; widths 2
/// and 4 fall through to the scalar loop.
///
/// # Safety
///
/// NEON must be available. `src` must hold `height + 1` rows of `width + 1`
/// samples at `src_stride`; `dx`/`dy` in `0..8`, not both zero.
#[target_feature(enable = "neon")]
pub unsafe fn chroma_bilinear_neon(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    dx: usize,
    dy: usize,
    width: usize,
    height: usize,
) {
    let [a, b, c, d] = CHROMA_WEIGHTS[dy][dx];
    let wa = vdup_n_u8(a);
    let wb = vdup_n_u8(b);
    let wc = vdup_n_u8(c);
    let wd = vdup_n_u8(d);

    for r in 0..height {
        let top = r * src_stride;
        let bot = top + src_stride;
        let drow = r * dst_stride;
        let mut col = 0;
        while col + 8 <= width {
            let t0 = vld1_u8(src.as_ptr().add(top + col));
            let t1 = vld1_u8(src.as_ptr().add(top + col + 1));
            let b0 = vld1_u8(src.as_ptr().add(bot + col));
            let b1 = vld1_u8(src.as_ptr().add(bot + col + 1));
            let mut sum = vmull_u8(t0, wa);
            sum = vmlal_u8(sum, t1, wb);
            sum = vmlal_u8(sum, b0, wc);
            sum = vmlal_u8(sum, b1, wd);
            // Weighted sums stay below 2^14, so the rounding narrow is exact.
            vst1_u8(dst.as_mut_ptr().add(drow + col), vrshrn_n_u16::<6>(sum));
            col += 8;
        }
        while col < width {
            let sum = a as u32 * src[top + col] as u32
                + b as u32 * src[top + col + 1] as u32
                + c as u32 * src[bot + col] as u32
                + d as u32 * src[bot + col + 1] as u32;
            dst[drow + col] = ((sum + 32) >> 6) as u8;
            col += 1;
        }
    }
}
