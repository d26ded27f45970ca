//! Cross-implementation equivalence and conformance scenarios.
//!
//! The central regression property: every SIMD tier the running CPU
//! supports must produce pixel-for-pixel the same output as the scalar
//! reference, for every fractional phase and block size. The remaining
//! tests pin the end-to-end scenarios that a conforming implementation
//! must reproduce exactly.

use proptest::collection::vec;
use proptest::prelude::*;
use subpel_core::{CpuFeatures, MotionVector, PlaneRef};
use subpel_mc::{mc_luma_ref, Backend, McEngine, CHROMA_WEIGHTS};

const PLANE_W: usize = 48;
const PLANE_H: usize = 48;
const ORIGIN_X: usize = 16;
const ORIGIN_Y: usize = 16;

/// One engine per tier the running CPU supports, scalar first.
fn supported_engines() -> Vec<(Backend, McEngine)> {
    let caps = CpuFeatures::detect();
    let mut engines = vec![(Backend::Scalar, McEngine::with_features(CpuFeatures::empty()))];
    for tier in [Backend::Sse2, Backend::Ssse3, Backend::Avx2, Backend::Neon] {
        if caps.contains(tier.required_features()) {
            engines.push((tier, McEngine::with_features(tier.required_features())));
        }
    }
    engines
}

const LUMA_SIZES: [(usize, usize); 7] =
    [(4, 4), (4, 8), (8, 4), (8, 8), (8, 16), (16, 8), (16, 16)];
const CHROMA_SIZES: [(usize, usize); 6] = [(2, 2), (2, 4), (4, 2), (4, 4), (8, 4), (8, 8)];

proptest! {
    /// SIMD vs reference, luma, all phases and sizes.
    #[test]
    fn luma_tiers_match_reference(
        data in vec(any::<u8>(), PLANE_W * PLANE_H),
        mv_x in -56i16..=55,
        mv_y in -56i16..=55,
        size in 0usize..LUMA_SIZES.len(),
    ) {
        let (w, h) = LUMA_SIZES[size];
        let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
        let mv = MotionVector::new(mv_x, mv_y);
        let (ix, iy) = mv.luma_int();
        let x = (ORIGIN_X as isize + ix) as usize;
        let y = (ORIGIN_Y as isize + iy) as usize;

        let mut reference = vec![0u8; w * h];
        mc_luma_ref(
            &mut reference,
            w,
            &data,
            y * PLANE_W + x,
            PLANE_W,
            mv.x,
            mv.y,
            w,
            h,
        );

        for (tier, engine) in supported_engines() {
            let mut out = vec![0u8; w * h];
            engine.luma(&mut out, w, plane, x, y, mv, w, h);
            prop_assert_eq!(
                &out,
                &reference,
                "tier {:?} diverged at mv ({}, {}), {}x{}",
                tier,
                mv_x,
                mv_y,
                w,
                h
            );
        }
    }

    /// SIMD vs reference, chroma, all phases and sizes.
    #[test]
    fn chroma_tiers_match_reference(
        data in vec(any::<u8>(), PLANE_W * PLANE_H),
        mv_x in -56i16..=55,
        mv_y in -56i16..=55,
        size in 0usize..CHROMA_SIZES.len(),
    ) {
        let (w, h) = CHROMA_SIZES[size];
        let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
        let mv = MotionVector::new(mv_x, mv_y);
        let (ix, iy) = mv.chroma_int();
        let x = (ORIGIN_X as isize + ix) as usize;
        let y = (ORIGIN_Y as isize + iy) as usize;

        let engines = supported_engines();
        let (scalar_tier, scalar) = &engines[0];
        assert_eq!(*scalar_tier, Backend::Scalar);
        let mut reference = vec![0u8; w * h];
        scalar.chroma(&mut reference, w, plane, x, y, mv, w, h);

        for (tier, engine) in &engines {
            let mut out = vec![0u8; w * h];
            engine.chroma(&mut out, w, plane, x, y, mv, w, h);
            prop_assert_eq!(&out, &reference, "tier {:?} diverged", tier);
        }
    }

    /// Half-pel plane operators (including extended widths) match across tiers.
    #[test]
    fn halfpel_plane_operators_match_reference(
        data in vec(any::<u8>(), PLANE_W * PLANE_H),
        wsel in 0usize..3,
    ) {
        // Extended sizes: one extra column/row over the block sizes.
        let (w, h) = [(5usize, 5usize), (9, 9), (17, 17)][wsel];
        let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
        let engines = supported_engines();
        let (_, scalar) = &engines[0];

        let mut expect_h = vec![0u8; w * h];
        let mut expect_v = vec![0u8; w * h];
        let mut expect_c = vec![0u8; w * h];
        scalar.luma_halfpel_hor(&mut expect_h, w, plane, ORIGIN_X, ORIGIN_Y, w, h);
        scalar.luma_halfpel_ver(&mut expect_v, w, plane, ORIGIN_X, ORIGIN_Y, w, h);
        scalar.luma_halfpel_center(&mut expect_c, w, plane, ORIGIN_X, ORIGIN_Y, w, h);

        for (tier, engine) in &engines {
            let mut out = vec![0u8; w * h];
            engine.luma_halfpel_hor(&mut out, w, plane, ORIGIN_X, ORIGIN_Y, w, h);
            prop_assert_eq!(&out, &expect_h, "hor {:?} {}x{}", tier, w, h);
            engine.luma_halfpel_ver(&mut out, w, plane, ORIGIN_X, ORIGIN_Y, w, h);
            prop_assert_eq!(&out, &expect_v, "ver {:?} {}x{}", tier, w, h);
            engine.luma_halfpel_center(&mut out, w, plane, ORIGIN_X, ORIGIN_Y, w, h);
            prop_assert_eq!(&out, &expect_c, "center {:?} {}x{}", tier, w, h);
        }
    }

    /// Averaging is commutative at every tier.
    #[test]
    fn pixel_avg_commutes(
        a in vec(any::<u8>(), 16 * 16),
        b in vec(any::<u8>(), 16 * 16),
    ) {
        for (tier, engine) in supported_engines() {
            let mut ab = vec![0u8; 16 * 16];
            let mut ba = vec![0u8; 16 * 16];
            engine.pixel_avg(&mut ab, 16, &a, 16, &b, 16, 16, 16);
            engine.pixel_avg(&mut ba, 16, &b, 16, &a, 16, 16, 16);
            prop_assert_eq!(&ab, &ba, "tier {:?}", tier);
        }
    }

    /// Constant-valued input is a fixed point of every fractional phase:
    /// the six-tap DC gain and the bilinear weights both normalize to 1.
    #[test]
    fn flat_input_is_fixed_point(value in any::<u8>(), fx in 0i16..4, fy in 0i16..4) {
        let data = vec![value; PLANE_W * PLANE_H];
        let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
        for (tier, engine) in supported_engines() {
            let mut out = vec![0u8; 16 * 16];
            engine.luma(&mut out, 16, plane, ORIGIN_X, ORIGIN_Y, MotionVector::new(fx, fy), 16, 16);
            prop_assert!(out.iter().all(|&v| v == value), "tier {:?} phase ({}, {})", tier, fx, fy);
        }
    }
}

#[test]
fn flat_16x16_with_zero_vector_copies_exactly() {
    let data = vec![128u8; PLANE_W * PLANE_H];
    let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
    let mut out = vec![0u8; 16 * 16];
    McEngine::global().luma(
        &mut out,
        16,
        plane,
        ORIGIN_X,
        ORIGIN_Y,
        MotionVector::ZERO,
        16,
        16,
    );
    assert!(out.iter().all(|&v| v == 128));
}

#[test]
fn pure_horizontal_halfpel_matches_manual_convolution() {
    // Columns alternate 0/255; phase (2, 0) must equal the hand-computed
    // six-tap per column.
    let mut data = vec![0u8; PLANE_W * PLANE_H];
    for y in 0..PLANE_H {
        for x in 0..PLANE_W {
            data[y * PLANE_W + x] = if x % 2 == 0 { 0 } else { 255 };
        }
    }
    let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();

    let mut out = vec![0u8; 16 * 16];
    McEngine::global().luma(
        &mut out,
        16,
        plane,
        ORIGIN_X,
        ORIGIN_Y,
        MotionVector::new(2, 0),
        16,
        16,
    );

    for r in 0..16 {
        for c in 0..16 {
            let base = (ORIGIN_Y + r) * PLANE_W + ORIGIN_X + c - 2;
            let p: Vec<i32> = (0..6).map(|k| data[base + k] as i32).collect();
            let sum = p[0] - 5 * p[1] + 20 * p[2] + 20 * p[3] - 5 * p[4] + p[5];
            let expected = ((sum + 16) >> 5).clamp(0, 255) as u8;
            assert_eq!(out[r * 16 + c], expected, "({c}, {r})");
        }
    }
}

#[test]
fn chroma_exact_quarter_point_averages_corners() {
    // Phase (4, 4): weights are all 16, so the output reduces to
    // (a + b + c + d + 2) >> 2.
    let mut data = vec![0u8; PLANE_W * PLANE_H];
    let base = ORIGIN_Y * PLANE_W + ORIGIN_X;
    data[base] = 11;
    data[base + 1] = 47;
    data[base + PLANE_W] = 199;
    data[base + PLANE_W + 1] = 250;
    let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();

    let mut out = vec![0u8; 1];
    McEngine::global().chroma(
        &mut out,
        1,
        plane,
        ORIGIN_X,
        ORIGIN_Y,
        MotionVector::new(4, 4),
        1,
        1,
    );
    assert_eq!(out[0], ((11 + 47 + 199 + 250 + 2) >> 2) as u8);
}

#[test]
fn chroma_phase_zero_returns_top_left_sample() {
    let data: Vec<u8> = (0..PLANE_W * PLANE_H).map(|i| (i % 256) as u8).collect();
    let plane = PlaneRef::new(&data, PLANE_W, PLANE_H, PLANE_W).unwrap();
    let mut out = vec![0u8; 4 * 4];
    McEngine::global().chroma(
        &mut out,
        4,
        plane,
        ORIGIN_X,
        ORIGIN_Y,
        MotionVector::new(8, -8),
        4,
        4,
    );
    for r in 0..4 {
        for c in 0..4 {
            assert_eq!(out[r * 4 + c], data[(ORIGIN_Y + r) * PLANE_W + ORIGIN_X + c]);
        }
    }
}

#[test]
fn chroma_weight_table_rows_sum_to_64() {
    for row in CHROMA_WEIGHTS.iter() {
        for quad in row.iter() {
            assert_eq!(quad.iter().map(|&w| w as u32).sum::<u32>(), 64);
        }
    }
}
