//! SSE3 kernels for x86_64.
//!
//! Float row sums: lanes are accumulated vertically and folded with `hadd`
//! once per row, so the summation order differs from the scalar loop and the
//! results agree within rounding tolerance only.

#![allow(clippy::wildcard_imports)]

use std::arch::x86_64::*;

use super::block::RowSumKernel;

/// `f32 → f32` row sum, 4 lanes.
pub(crate) struct RowSumF32;

impl RowSumKernel<f32, f32> for RowSumF32 {
    const LANES: usize = 4;

    #[inline]
    unsafe fn sum(row: &[f32]) -> f32 {
        row_sum_f32(row)
    }
}

#[target_feature(enable = "sse3")]
unsafe fn row_sum_f32(row: &[f32]) -> f32 {
    let p = row.as_ptr();
    let mut acc = _mm_setzero_ps();
    let mut i = 0;
    while i < row.len() {
        acc = _mm_add_ps(acc, _mm_loadu_ps(p.add(i)));
        i += 4;
    }
    let s = _mm_hadd_ps(acc, acc);
    _mm_cvtss_f32(_mm_hadd_ps(s, s))
}

/// `f64 → f64` row sum, 2 lanes.
pub(crate) struct RowSumF64;

impl RowSumKernel<f64, f64> for RowSumF64 {
    const LANES: usize = 2;

    #[inline]
    unsafe fn sum(row: &[f64]) -> f64 {
        row_sum_f64(row)
    }
}

#[target_feature(enable = "sse3")]
unsafe fn row_sum_f64(row: &[f64]) -> f64 {
    let p = row.as_ptr();
    let mut acc = _mm_setzero_pd();
    let mut i = 0;
    while i < row.len() {
        acc = _mm_add_pd(acc, _mm_loadu_pd(p.add(i)));
        i += 2;
    }
    _mm_cvtsd_f64(_mm_hadd_pd(acc, acc))
}
