//! AVX kernels for x86_64 (256-bit float registers).
//!
//! Contains `f32`/`f64` multiply, float row sums and the lane-crossing
//! transpose tiles for 32- and 64-bit elements. The tiles route integer bit
//! patterns through float shuffles, which move data without inspecting it.
//!
//! All functions require runtime AVX detection before calling.

#![allow(clippy::wildcard_imports)]
#![allow(clippy::cast_ptr_alignment)]

use std::arch::x86_64::*;

use super::block::{RowSumKernel, TransposeTile};
use super::scalar;

// =============================================================================
// Multiply
// =============================================================================

macro_rules! mul_kernels {
    ($($t:ty, $lanes:expr => $mul:ident, $mul_value:ident,
        $load:ident, $store:ident, $set1:ident, $op:ident;)*) => {
        $(
            /// AVX elementwise multiply.
            ///
            /// # Safety
            ///
            /// CPU supports AVX.
            #[target_feature(enable = "avx")]
            pub(crate) unsafe fn $mul(a: &[$t], b: &[$t], c: &mut [$t]) {
                let n = c.len().min(a.len()).min(b.len());
                let body = n - n % $lanes;
                let (pa, pb, pc) = (a.as_ptr(), b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    $store(pc.add(i), $op($load(pa.add(i)), $load(pb.add(i))));
                    i += $lanes;
                }
                scalar::mul(&a[body..n], &b[body..n], &mut c[body..n]);
            }

            /// AVX multiply by a broadcast value.
            ///
            /// # Safety
            ///
            /// CPU supports AVX.
            #[target_feature(enable = "avx")]
            pub(crate) unsafe fn $mul_value(a: $t, b: &[$t], c: &mut [$t]) {
                let n = c.len().min(b.len());
                let body = n - n % $lanes;
                let va = $set1(a);
                let (pb, pc) = (b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    $store(pc.add(i), $op(va, $load(pb.add(i))));
                    i += $lanes;
                }
                scalar::mul_value(a, &b[body..n], &mut c[body..n]);
            }
        )*
    };
}

mul_kernels! {
    f32, 8 => mul_f32, mul_value_f32,
        _mm256_loadu_ps, _mm256_storeu_ps, _mm256_set1_ps, _mm256_mul_ps;
    f64, 4 => mul_f64, mul_value_f64,
        _mm256_loadu_pd, _mm256_storeu_pd, _mm256_set1_pd, _mm256_mul_pd;
}

// =============================================================================
// Float row sums
// =============================================================================

/// Horizontal sum of eight `f32` lanes.
#[target_feature(enable = "avx")]
#[inline]
pub(crate) unsafe fn hsum_ps(v: __m256) -> f32 {
    let s = _mm_add_ps(_mm256_castps256_ps128(v), _mm256_extractf128_ps(v, 1));
    let s = _mm_add_ps(s, _mm_movehl_ps(s, s));
    let s = _mm_add_ss(s, _mm_shuffle_ps(s, s, 0x55));
    _mm_cvtss_f32(s)
}

/// Horizontal sum of four `f64` lanes.
#[target_feature(enable = "avx")]
#[inline]
pub(crate) unsafe fn hsum_pd(v: __m256d) -> f64 {
    let s = _mm_add_pd(_mm256_castpd256_pd128(v), _mm256_extractf128_pd(v, 1));
    let s = _mm_add_sd(s, _mm_unpackhi_pd(s, s));
    _mm_cvtsd_f64(s)
}

/// `f32 → f32` row sum, 8 lanes.
pub(crate) struct RowSumF32;

impl RowSumKernel<f32, f32> for RowSumF32 {
    const LANES: usize = 8;

    #[inline]
    unsafe fn sum(row: &[f32]) -> f32 {
        row_sum_f32(row)
    }
}

#[target_feature(enable = "avx")]
unsafe fn row_sum_f32(row: &[f32]) -> f32 {
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_ps();
    let mut i = 0;
    while i < row.len() {
        acc = _mm256_add_ps(acc, _mm256_loadu_ps(p.add(i)));
        i += 8;
    }
    hsum_ps(acc)
}

/// `f64 → f64` row sum, 4 lanes.
pub(crate) struct RowSumF64;

impl RowSumKernel<f64, f64> for RowSumF64 {
    const LANES: usize = 4;

    #[inline]
    unsafe fn sum(row: &[f64]) -> f64 {
        row_sum_f64(row)
    }
}

#[target_feature(enable = "avx")]
unsafe fn row_sum_f64(row: &[f64]) -> f64 {
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_pd();
    let mut i = 0;
    while i < row.len() {
        acc = _mm256_add_pd(acc, _mm256_loadu_pd(p.add(i)));
        i += 4;
    }
    hsum_pd(acc)
}

// =============================================================================
// Transpose tiles
// =============================================================================

/// 8×8 tile of 32-bit elements.
pub(crate) struct Transpose8x8U32;

impl TransposeTile<u32> for Transpose8x8U32 {
    const BM: usize = 8;
    const BN: usize = 8;

    #[inline]
    unsafe fn tile(src: *const u32, lda: usize, dst: *mut u32, ldb: usize) {
        transpose_8x8_u32(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "avx")]
unsafe fn transpose_8x8_u32(src: *const u32, lda: usize, dst: *mut u32, ldb: usize) {
    let src = src.cast::<f32>();
    let dst = dst.cast::<f32>();
    let r0 = _mm256_loadu_ps(src);
    let r1 = _mm256_loadu_ps(src.add(lda));
    let r2 = _mm256_loadu_ps(src.add(2 * lda));
    let r3 = _mm256_loadu_ps(src.add(3 * lda));
    let r4 = _mm256_loadu_ps(src.add(4 * lda));
    let r5 = _mm256_loadu_ps(src.add(5 * lda));
    let r6 = _mm256_loadu_ps(src.add(6 * lda));
    let r7 = _mm256_loadu_ps(src.add(7 * lda));

    // Within each 128-bit half: pairs, then quads.
    let t0 = _mm256_unpacklo_ps(r0, r1);
    let t1 = _mm256_unpackhi_ps(r0, r1);
    let t2 = _mm256_unpacklo_ps(r2, r3);
    let t3 = _mm256_unpackhi_ps(r2, r3);
    let t4 = _mm256_unpacklo_ps(r4, r5);
    let t5 = _mm256_unpackhi_ps(r4, r5);
    let t6 = _mm256_unpacklo_ps(r6, r7);
    let t7 = _mm256_unpackhi_ps(r6, r7);

    let s0 = _mm256_shuffle_ps(t0, t2, 0x44);
    let s1 = _mm256_shuffle_ps(t0, t2, 0xEE);
    let s2 = _mm256_shuffle_ps(t1, t3, 0x44);
    let s3 = _mm256_shuffle_ps(t1, t3, 0xEE);
    let s4 = _mm256_shuffle_ps(t4, t6, 0x44);
    let s5 = _mm256_shuffle_ps(t4, t6, 0xEE);
    let s6 = _mm256_shuffle_ps(t5, t7, 0x44);
    let s7 = _mm256_shuffle_ps(t5, t7, 0xEE);

    // Across halves: low halves give columns 0..4, high halves 4..8.
    let out = [
        _mm256_permute2f128_ps(s0, s4, 0x20),
        _mm256_permute2f128_ps(s1, s5, 0x20),
        _mm256_permute2f128_ps(s2, s6, 0x20),
        _mm256_permute2f128_ps(s3, s7, 0x20),
        _mm256_permute2f128_ps(s0, s4, 0x31),
        _mm256_permute2f128_ps(s1, s5, 0x31),
        _mm256_permute2f128_ps(s2, s6, 0x31),
        _mm256_permute2f128_ps(s3, s7, 0x31),
    ];
    for (k, v) in out.into_iter().enumerate() {
        _mm256_storeu_ps(dst.add(k * ldb), v);
    }
}

/// 4×4 tile of 64-bit elements.
pub(crate) struct Transpose4x4U64;

impl TransposeTile<u64> for Transpose4x4U64 {
    const BM: usize = 4;
    const BN: usize = 4;

    #[inline]
    unsafe fn tile(src: *const u64, lda: usize, dst: *mut u64, ldb: usize) {
        transpose_4x4_u64(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "avx")]
unsafe fn transpose_4x4_u64(src: *const u64, lda: usize, dst: *mut u64, ldb: usize) {
    let src = src.cast::<f64>();
    let dst = dst.cast::<f64>();
    let r0 = _mm256_loadu_pd(src);
    let r1 = _mm256_loadu_pd(src.add(lda));
    let r2 = _mm256_loadu_pd(src.add(2 * lda));
    let r3 = _mm256_loadu_pd(src.add(3 * lda));

    let t0 = _mm256_unpacklo_pd(r0, r1);
    let t1 = _mm256_unpackhi_pd(r0, r1);
    let t2 = _mm256_unpacklo_pd(r2, r3);
    let t3 = _mm256_unpackhi_pd(r2, r3);

    let out = [
        _mm256_permute2f128_pd(t0, t2, 0x20),
        _mm256_permute2f128_pd(t1, t3, 0x20),
        _mm256_permute2f128_pd(t0, t2, 0x31),
        _mm256_permute2f128_pd(t1, t3, 0x31),
    ];
    for (k, v) in out.into_iter().enumerate() {
        _mm256_storeu_pd(dst.add(k * ldb), v);
    }
}
