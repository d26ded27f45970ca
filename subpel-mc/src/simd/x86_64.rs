//! x86_64 kernels: SSE2, SSSE3 and AVX2.
//!
//! Layout conventions match the scalar operators in [`crate::block`]: the
//! horizontal filter receives its source two columns before the first output
//! sample, the vertical filter two rows above, the center filter both.
//!
//! The six-tap arithmetic stays in 16-bit lanes for the single-pass filters
//! (the sum of `(p0+p5) - 5(p1+p4) + 20(p2+p3)` is bounded by -2550..=10710)
//! and widens to 32-bit for the second pass of the center filter.

use std::arch::x86_64::*;

use crate::block::{MAX_HALFPEL_H, MAX_HALFPEL_W};
use crate::filter::{round_center, round_half, six_tap_i16, six_tap_u8, CHROMA_WEIGHTS};

/// Load 8 bytes and zero-extend to 16-bit lanes.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load8_epi16(ptr: *const u8) -> __m128i {
    _mm_unpacklo_epi8(
        _mm_loadl_epi64(ptr as *const __m128i),
        _mm_setzero_si128(),
    )
}

/// `(p0+p5) - 5*(p1+p4) + 20*(p2+p3)` over 16-bit lanes.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn six_tap_epi16(
    p0: __m128i,
    p1: __m128i,
    p2: __m128i,
    p3: __m128i,
    p4: __m128i,
    p5: __m128i,
) -> __m128i {
    let p05 = _mm_add_epi16(p0, p5);
    let p14 = _mm_add_epi16(p1, p4);
    let p23 = _mm_add_epi16(p2, p3);
    let t = _mm_add_epi16(p05, _mm_mullo_epi16(p23, _mm_set1_epi16(20)));
    _mm_sub_epi16(t, _mm_mullo_epi16(p14, _mm_set1_epi16(5)))
}

/// `clamp((sum + 16) >> 5)` and narrow 8 lanes to bytes.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn round_half_epi16(sum: __m128i) -> __m128i {
    let rounded = _mm_srai_epi16::<5>(_mm_add_epi16(sum, _mm_set1_epi16(16)));
    _mm_packus_epi16(rounded, rounded)
}

/// Sign-extend the low 4 lanes of an i16 vector to i32.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn widen_lo_epi32(v: __m128i) -> __m128i {
    _mm_srai_epi32::<16>(_mm_unpacklo_epi16(_mm_setzero_si128(), v))
}

/// Sign-extend the high 4 lanes of an i16 vector to i32.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn widen_hi_epi32(v: __m128i) -> __m128i {
    _mm_srai_epi32::<16>(_mm_unpackhi_epi16(_mm_setzero_si128(), v))
}

/// `a + 20*c - 5*b` over i32 lanes, without a 32-bit multiply (SSE2 has
/// none): `20x = (x<<4)+(x<<2)`, `5x = (x<<2)+x`.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn six_tap_combine_epi32(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
    let c20 = _mm_add_epi32(_mm_slli_epi32::<4>(c), _mm_slli_epi32::<2>(c));
    let b5 = _mm_add_epi32(_mm_slli_epi32::<2>(b), b);
    _mm_sub_epi32(_mm_add_epi32(a, c20), b5)
}

/// Horizontal half-pel filter, SSE2.
///
/// # Safety
///
/// The CPU must support SSE2. `src` must hold `height` rows of
/// `width + 5` samples at `src_stride`; `dst` must hold `height` rows of
/// `width` samples at `dst_stride`.
#[target_feature(enable = "sse2")]
pub unsafe fn halfpel_hor_sse2(
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
            let sum = six_tap_epi16(
                load8_epi16(base),
                load8_epi16(base.add(1)),
                load8_epi16(base.add(2)),
                load8_epi16(base.add(3)),
                load8_epi16(base.add(4)),
                load8_epi16(base.add(5)),
            );
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                round_half_epi16(sum),
            );
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], 1));
            c += 1;
        }
    }
}

/// Vertical half-pel filter, SSE2.
///
/// # Safety
///
/// The CPU must support SSE2. `src` must hold `height + 5` rows of `width`
/// samples at `src_stride`; `dst` as for [`halfpel_hor_sse2`].
#[target_feature(enable = "sse2")]
pub unsafe fn halfpel_ver_sse2(
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
            let sum = six_tap_epi16(
                load8_epi16(base),
                load8_epi16(base.add(src_stride)),
                load8_epi16(base.add(2 * src_stride)),
                load8_epi16(base.add(3 * src_stride)),
                load8_epi16(base.add(4 * src_stride)),
                load8_epi16(base.add(5 * src_stride)),
            );
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                round_half_epi16(sum),
            );
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], src_stride));
            c += 1;
        }
    }
}

/// Combined half-pel filter (diagonal position), SSE2.
///
/// Horizontal pass into a 16-bit scratch, vertical pass in 32-bit lanes with
/// one final `(+512) >> 10` rounding, exactly as the scalar reference.
///
/// # Safety
///
/// The CPU must support SSE2. `src` must hold `height + 5` rows of
/// `width + 5` samples at `src_stride`; `width <= 17`, `height <= 17`.
#[target_feature(enable = "sse2")]
pub unsafe fn halfpel_center_sse2(
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
            let sum = six_tap_epi16(
                load8_epi16(base),
                load8_epi16(base.add(1)),
                load8_epi16(base.add(2)),
                load8_epi16(base.add(3)),
                load8_epi16(base.add(4)),
                load8_epi16(base.add(5)),
            );
            _mm_storeu_si128(tmp.as_mut_ptr().add(r * width + c) as *mut __m128i, sum);
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
            let t0 = _mm_loadu_si128(base as *const __m128i);
            let t1 = _mm_loadu_si128(base.add(width) as *const __m128i);
            let t2 = _mm_loadu_si128(base.add(2 * width) as *const __m128i);
            let t3 = _mm_loadu_si128(base.add(3 * width) as *const __m128i);
            let t4 = _mm_loadu_si128(base.add(4 * width) as *const __m128i);
            let t5 = _mm_loadu_si128(base.add(5 * width) as *const __m128i);
            let a = _mm_add_epi16(t0, t5);
            let b = _mm_add_epi16(t1, t4);
            let cc = _mm_add_epi16(t2, t3);

            let sum_lo =
                six_tap_combine_epi32(widen_lo_epi32(a), widen_lo_epi32(b), widen_lo_epi32(cc));
            let sum_hi =
                six_tap_combine_epi32(widen_hi_epi32(a), widen_hi_epi32(b), widen_hi_epi32(cc));
            let k512 = _mm_set1_epi32(512);
            let r_lo = _mm_srai_epi32::<10>(_mm_add_epi32(sum_lo, k512));
            let r_hi = _mm_srai_epi32::<10>(_mm_add_epi32(sum_hi, k512));
            let narrowed = _mm_packs_epi32(r_lo, r_hi);
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                _mm_packus_epi16(narrowed, narrowed),
            );
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_center(six_tap_i16(&tmp[r * width + c..], width));
            c += 1;
        }
    }
}

/// Rounded pairwise average, SSE2 (`pavgb` is exactly `(a + b + 1) >> 1`).
///
/// # Safety
///
/// The CPU must support SSE2. Both sources and the destination must hold
/// `height` rows of `width` samples at their respective strides.
#[target_feature(enable = "sse2")]
pub unsafe fn pixel_avg_sse2(
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
            let a = _mm_loadu_si128(src_a.as_ptr().add(arow + c) as *const __m128i);
            let b = _mm_loadu_si128(src_b.as_ptr().add(brow + c) as *const __m128i);
            _mm_storeu_si128(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                _mm_avg_epu8(a, b),
            );
            c += 16;
        }
        while c + 8 <= width {
            let a = _mm_loadl_epi64(src_a.as_ptr().add(arow + c) as *const __m128i);
            let b = _mm_loadl_epi64(src_b.as_ptr().add(brow + c) as *const __m128i);
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                _mm_avg_epu8(a, b),
            );
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

/// Bilinear chroma interpolation, SSE2. Vectorizes 8-sample rows; widths 2
/// and 4 fall through to the scalar loop.
///
/// # Safety
///
/// The CPU must support SSE2. `src` must hold `height + 1` rows of
/// `width + 1` samples at `src_stride`; `dx`/`dy` in `0..8`, not both zero.
#[target_feature(enable = "sse2")]
pub unsafe fn chroma_bilinear_sse2(
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
    let wa = _mm_set1_epi16(a as i16);
    let wb = _mm_set1_epi16(b as i16);
    let wc = _mm_set1_epi16(c as i16);
    let wd = _mm_set1_epi16(d as i16);
    let k32 = _mm_set1_epi16(32);

    for r in 0..height {
        let top = r * src_stride;
        let bot = top + src_stride;
        let drow = r * dst_stride;
        let mut col = 0;
        while col + 8 <= width {
            let t0 = load8_epi16(src.as_ptr().add(top + col));
            let t1 = load8_epi16(src.as_ptr().add(top + col + 1));
            let b0 = load8_epi16(src.as_ptr().add(bot + col));
            let b1 = load8_epi16(src.as_ptr().add(bot + col + 1));
            // Weighted sums stay below 2^16; the low-16 multiply is exact.
            let mut sum = _mm_mullo_epi16(t0, wa);
            sum = _mm_add_epi16(sum, _mm_mullo_epi16(t1, wb));
            sum = _mm_add_epi16(sum, _mm_mullo_epi16(b0, wc));
            sum = _mm_add_epi16(sum, _mm_mullo_epi16(b1, wd));
            let out = _mm_srli_epi16::<6>(_mm_add_epi16(sum, k32));
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + col) as *mut __m128i,
                _mm_packus_epi16(out, out),
            );
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

/// Horizontal half-pel filter, SSSE3. Builds the six tap vectors from one
/// 16-byte load with `pshufb` and folds the multiplies into `pmaddubsw`.
///
/// # Safety
///
/// The CPU must support SSSE3. Source/destination contracts as for
/// [`halfpel_hor_sse2`].
#[target_feature(enable = "ssse3")]
pub unsafe fn halfpel_hor_ssse3(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    // Pair shuffles: lane j of the madd input holds (p[j+k], p[j+k+1]).
    let m01 = _mm_setr_epi8(0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8);
    let m23 = _mm_setr_epi8(2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10);
    let m45 = _mm_setr_epi8(4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12);
    let c01 = _mm_setr_epi8(1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5);
    let c23 = _mm_set1_epi8(20);
    let c45 = _mm_setr_epi8(-5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1, -5, 1);

    for r in 0..height {
        let row = r * src_stride;
        let drow = r * dst_stride;
        let mut c = 0;
        // The 16-byte load overshoots the 13 samples a group needs, so stop
        // the vector loop early enough to stay inside the slice.
        while c + 8 <= width && row + c + 16 <= src.len() {
            let v = _mm_loadu_si128(src.as_ptr().add(row + c) as *const __m128i);
            let s01 = _mm_maddubs_epi16(_mm_shuffle_epi8(v, m01), c01);
            let s23 = _mm_maddubs_epi16(_mm_shuffle_epi8(v, m23), c23);
            let s45 = _mm_maddubs_epi16(_mm_shuffle_epi8(v, m45), c45);
            let sum = _mm_add_epi16(_mm_add_epi16(s01, s23), s45);
            _mm_storel_epi64(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                round_half_epi16(sum),
            );
            c += 8;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], 1));
            c += 1;
        }
    }
}

/// Load 16 bytes and zero-extend to 16-bit lanes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load16_epi16(ptr: *const u8) -> __m256i {
    _mm256_cvtepu8_epi16(_mm_loadu_si128(ptr as *const __m128i))
}

/// Six-tap over 256-bit 16-bit lanes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn six_tap_epi16_256(
    p0: __m256i,
    p1: __m256i,
    p2: __m256i,
    p3: __m256i,
    p4: __m256i,
    p5: __m256i,
) -> __m256i {
    let p05 = _mm256_add_epi16(p0, p5);
    let p14 = _mm256_add_epi16(p1, p4);
    let p23 = _mm256_add_epi16(p2, p3);
    let t = _mm256_add_epi16(p05, _mm256_mullo_epi16(p23, _mm256_set1_epi16(20)));
    _mm256_sub_epi16(t, _mm256_mullo_epi16(p14, _mm256_set1_epi16(5)))
}

/// Round, narrow and de-interleave 16 lanes to 16 contiguous bytes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn round_half_epi16_256(sum: __m256i) -> __m128i {
    let rounded = _mm256_srai_epi16::<5>(_mm256_add_epi16(sum, _mm256_set1_epi16(16)));
    let packed = _mm256_packus_epi16(rounded, rounded);
    // packus works per 128-bit lane; pull qwords 0 and 2 together.
    let fixed = _mm256_permute4x64_epi64::<0b0000_1000>(packed);
    _mm256_castsi256_si128(fixed)
}

/// Horizontal half-pel filter, AVX2 (16 samples per step).
///
/// # Safety
///
/// The CPU must support AVX2. Contracts as for [`halfpel_hor_sse2`].
#[target_feature(enable = "avx2")]
pub unsafe fn halfpel_hor_avx2(
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
        while c + 16 <= width {
            let base = src.as_ptr().add(row + c);
            let sum = six_tap_epi16_256(
                load16_epi16(base),
                load16_epi16(base.add(1)),
                load16_epi16(base.add(2)),
                load16_epi16(base.add(3)),
                load16_epi16(base.add(4)),
                load16_epi16(base.add(5)),
            );
            _mm_storeu_si128(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                round_half_epi16_256(sum),
            );
            c += 16;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], 1));
            c += 1;
        }
    }
}

/// Vertical half-pel filter, AVX2.
///
/// # Safety
///
/// The CPU must support AVX2. Contracts as for [`halfpel_ver_sse2`].
#[target_feature(enable = "avx2")]
pub unsafe fn halfpel_ver_avx2(
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
        while c + 16 <= width {
            let base = src.as_ptr().add(row + c);
            let sum = six_tap_epi16_256(
                load16_epi16(base),
                load16_epi16(base.add(src_stride)),
                load16_epi16(base.add(2 * src_stride)),
                load16_epi16(base.add(3 * src_stride)),
                load16_epi16(base.add(4 * src_stride)),
                load16_epi16(base.add(5 * src_stride)),
            );
            _mm_storeu_si128(
                dst.as_mut_ptr().add(drow + c) as *mut __m128i,
                round_half_epi16_256(sum),
            );
            c += 16;
        }
        while c < width {
            dst[drow + c] = round_half(six_tap_u8(&src[row + c..], src_stride));
            c += 1;
        }
    }
}
