//! Size-specialized block operators: copy and half-pel filtering.
//!
//! All operators share the signature
//! `(dst, dst_stride, src, src_stride, width, height)` so they can live in
//! the operator function table. Width and height are explicit parameters:
//! besides the regular block sizes (4/8/16 luma, 2/4/8 chroma) the half-pel
//! operators also serve the extended sizes 5/9/17 used when an encoder
//! materializes whole half-pel planes with one extra column or row of
//! support for the diagonal quarter-pel positions.
//!
//! Source window conventions (the caller guarantees the margins exist):
//! - [`copy_block`]: `src[0]` is the first output sample.
//! - [`halfpel_hor`]: `src[0]` is two *columns* left of the first output
//!   sample; each row reads `width + 5` samples.
//! - [`halfpel_ver`]: `src[0]` is two *rows* above the first output sample;
//!   each column reads `height + 5` samples.
//! - [`halfpel_center`]: `src[0]` is two rows above and two columns left of
//!   the first output sample; the full read window is
//!   `(width + 5) × (height + 5)`.
//!
//! Reads outside the provided slice are a caller-contract violation and
//! panic on the slice bounds check.

use crate::filter::{round_center, round_half, six_tap_i16, six_tap_u8};

/// Largest half-pel output width (16 + 1 extended column).
pub(crate) const MAX_HALFPEL_W: usize = 17;
/// Largest half-pel output height plus filter support.
pub(crate) const MAX_HALFPEL_H: usize = 17 + 5;

/// Straight copy of a `width × height` block.
pub fn copy_block(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    for r in 0..height {
        let s = &src[r * src_stride..r * src_stride + width];
        dst[r * dst_stride..r * dst_stride + width].copy_from_slice(s);
    }
}

/// Copy for the 2-wide chroma blocks.
pub fn copy_w2(dst: &mut [u8], dst_stride: usize, src: &[u8], src_stride: usize, height: usize) {
    copy_block(dst, dst_stride, src, src_stride, 2, height);
}

/// Copy for 4-wide blocks.
pub fn copy_w4(dst: &mut [u8], dst_stride: usize, src: &[u8], src_stride: usize, height: usize) {
    copy_block(dst, dst_stride, src, src_stride, 4, height);
}

/// Copy for 8-wide blocks.
pub fn copy_w8(dst: &mut [u8], dst_stride: usize, src: &[u8], src_stride: usize, height: usize) {
    copy_block(dst, dst_stride, src, src_stride, 8, height);
}

/// Copy for 16-wide blocks.
pub fn copy_w16(dst: &mut [u8], dst_stride: usize, src: &[u8], src_stride: usize, height: usize) {
    copy_block(dst, dst_stride, src, src_stride, 16, height);
}

/// Copy dispatching to the width-specialized variant where one exists.
pub fn copy_sized(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    match width {
        16 => copy_w16(dst, dst_stride, src, src_stride, height),
        8 => copy_w8(dst, dst_stride, src, src_stride, height),
        4 => copy_w4(dst, dst_stride, src, src_stride, height),
        2 => copy_w2(dst, dst_stride, src, src_stride, height),
        _ => copy_block(dst, dst_stride, src, src_stride, width, height),
    }
}

/// Horizontal half-pel filter.
pub fn halfpel_hor(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    for r in 0..height {
        let row = r * src_stride;
        for c in 0..width {
            dst[r * dst_stride + c] = round_half(six_tap_u8(&src[row + c..], 1));
        }
    }
}

/// Vertical half-pel filter.
pub fn halfpel_ver(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    for r in 0..height {
        let row = r * src_stride;
        for c in 0..width {
            dst[r * dst_stride + c] = round_half(six_tap_u8(&src[row + c..], src_stride));
        }
    }
}

/// Combined horizontal + vertical half-pel filter (the diagonal position).
///
/// Filters horizontally into a signed 16-bit scratch of
/// `width × (height + 5)`, then vertically over the scratch columns with a
/// single final rounding. Intermediates stay in `-2550..=10710`, comfortably
/// inside `i16`.
pub fn halfpel_center(
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
        for c in 0..width {
            tmp[r * width + c] = six_tap_u8(&src[row + c..], 1) as i16;
        }
    }
    for r in 0..height {
        for c in 0..width {
            dst[r * dst_stride + c] = round_center(six_tap_i16(&tmp[r * width + c..], width));
        }
    }
}
