//! Band-parallel motion compensation.
//!
//! The engine itself is a pure synchronous computation; what makes parallel
//! use safe is destination partitioning. This module provides the standard
//! partitioning: the destination plane is split into horizontal bands of
//! non-overlapping rows and each band's blocks are compensated on a rayon
//! worker. Blocks may not straddle a band boundary — that is the one
//! structural error this helper reports rather than relying on the caller.
//!
//! Reference planes are shared read-only across workers; the operator table
//! was bound before any worker started. Neither needs locking.

use rayon::prelude::*;
use subpel_core::{Error, MotionVector, PlaneRef, Result};

use crate::engine::McEngine;

/// One block to compensate: destination position, size and motion vector.
///
/// `x`/`y` address the block in the destination plane; the reference
/// position is derived from them plus the vector's integer part, so the
/// reference plane must be padded far enough for the vectors in use.
#[derive(Debug, Clone, Copy)]
pub struct BlockJob {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub mv: MotionVector,
}

/// Which plane kind the jobs address; selects quarter-pel or eighth-pel
/// reconstruction and the matching integer-part split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    Luma,
    Chroma,
}

/// Compensate `jobs` into `dst`, parallelized over bands of `band_height`
/// destination rows.
///
/// Jobs are grouped by the band containing them; a job whose rows cross a
/// band boundary yields [`Error::BlockCrossesBand`]. Out-of-plane positions
/// are a caller-contract violation and panic, as on the sequential path.
pub fn compensate_bands(
    engine: &McEngine,
    kind: PlaneKind,
    dst: &mut [u8],
    dst_stride: usize,
    src: PlaneRef<'_>,
    jobs: &[BlockJob],
    band_height: usize,
) -> Result<()> {
    if band_height == 0 {
        return Err(Error::InvalidBandHeight(band_height));
    }

    let band_len = band_height * dst_stride;
    let num_bands = dst.len().div_ceil(band_len);
    let mut buckets: Vec<Vec<BlockJob>> = vec![Vec::new(); num_bands];
    for job in jobs {
        let first = job.y / band_height;
        let last = (job.y + job.height - 1) / band_height;
        if first != last || first >= num_bands {
            return Err(Error::BlockCrossesBand { x: job.x, y: job.y });
        }
        buckets[first].push(*job);
    }

    dst.par_chunks_mut(band_len)
        .zip(buckets.par_iter())
        .enumerate()
        .for_each(|(band, (band_dst, band_jobs))| {
            let band_y0 = band * band_height;
            for job in band_jobs {
                let local = (job.y - band_y0) * dst_stride + job.x;
                let dst_block = &mut band_dst[local..];
                let (int_x, int_y) = match kind {
                    PlaneKind::Luma => job.mv.luma_int(),
                    PlaneKind::Chroma => job.mv.chroma_int(),
                };
                let ref_x = job.x as isize + int_x;
                let ref_y = job.y as isize + int_y;
                debug_assert!(ref_x >= 0 && ref_y >= 0, "reference plane underflow");
                match kind {
                    PlaneKind::Luma => engine.luma(
                        dst_block,
                        dst_stride,
                        src,
                        ref_x as usize,
                        ref_y as usize,
                        job.mv,
                        job.width,
                        job.height,
                    ),
                    PlaneKind::Chroma => engine.chroma(
                        dst_block,
                        dst_stride,
                        src,
                        ref_x as usize,
                        ref_y as usize,
                        job.mv,
                        job.width,
                        job.height,
                    ),
                }
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 64;
    const H: usize = 64;

    fn reference() -> Vec<u8> {
        (0..W * H).map(|i| (i * 17 % 256) as u8).collect()
    }

    fn jobs_16x16() -> Vec<BlockJob> {
        let mvs = [
            MotionVector::new(0, 0),
            MotionVector::new(2, 0),
            MotionVector::new(1, 3),
            MotionVector::new(-3, 2),
            MotionVector::new(6, -5),
            MotionVector::new(2, 2),
        ];
        let mut jobs = Vec::new();
        let mut i = 0;
        for y in (16..48).step_by(16) {
            for x in (16..48).step_by(16) {
                jobs.push(BlockJob {
                    x,
                    y,
                    width: 16,
                    height: 16,
                    mv: mvs[i % mvs.len()],
                });
                i += 1;
            }
        }
        jobs
    }

    #[test]
    fn matches_sequential_compensation() {
        let data = reference();
        let src = PlaneRef::new(&data, W, H, W).unwrap();
        let engine = McEngine::new();
        let jobs = jobs_16x16();

        let mut parallel_dst = vec![0u8; W * H];
        compensate_bands(&engine, PlaneKind::Luma, &mut parallel_dst, W, src, &jobs, 16).unwrap();

        let mut sequential_dst = vec![0u8; W * H];
        for job in &jobs {
            let (ix, iy) = job.mv.luma_int();
            let rx = (job.x as isize + ix) as usize;
            let ry = (job.y as isize + iy) as usize;
            let off = job.y * W + job.x;
            engine.luma(
                &mut sequential_dst[off..],
                W,
                src,
                rx,
                ry,
                job.mv,
                job.width,
                job.height,
            );
        }

        assert_eq!(parallel_dst, sequential_dst);
    }

    #[test]
    fn rejects_band_crossing_blocks() {
        let data = reference();
        let src = PlaneRef::new(&data, W, H, W).unwrap();
        let engine = McEngine::new();
        let jobs = [BlockJob {
            x: 0,
            y: 8,
            width: 16,
            height: 16,
            mv: MotionVector::ZERO,
        }];

        let mut dst = vec![0u8; W * H];
        let err = compensate_bands(&engine, PlaneKind::Luma, &mut dst, W, src, &jobs, 16)
            .unwrap_err();
        assert!(matches!(err, Error::BlockCrossesBand { x: 0, y: 8 }));
    }

    #[test]
    fn rejects_zero_band_height() {
        let data = reference();
        let src = PlaneRef::new(&data, W, H, W).unwrap();
        let engine = McEngine::new();
        let mut dst = vec![0u8; W * H];
        let err = compensate_bands(&engine, PlaneKind::Luma, &mut dst, W, src, &[], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidBandHeight(0)));
    }

    #[test]
    fn chroma_jobs_use_eighth_pel_split() {
        let data = reference();
        let src = PlaneRef::new(&data, W, H, W).unwrap();
        let engine = McEngine::new();
        let jobs = [BlockJob {
            x: 8,
            y: 8,
            width: 8,
            height: 8,
            mv: MotionVector::new(12, -4),
        }];

        let mut dst = vec![0u8; W * H];
        compensate_bands(&engine, PlaneKind::Chroma, &mut dst, W, src, &jobs, 8).unwrap();

        let mut expected = vec![0u8; 8 * 8];
        // x + (12 >> 3) = 9, y + (-4 >> 3) = 7
        engine.chroma(&mut expected, 8, src, 9, 7, MotionVector::new(12, -4), 8, 8);
        for r in 0..8 {
            assert_eq!(&dst[(8 + r) * W + 8..(8 + r) * W + 16], &expected[r * 8..r * 8 + 8]);
        }
    }
}
