//! AVX2 kernels for x86_64 (256-bit integer registers).
//!
//! Contains saturating adds for every integer width and the integer row sums.
//! Integer results are bit-identical to the scalar kernels.
//!
//! All functions require runtime AVX2 detection before calling.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::wildcard_imports)]

use std::arch::x86_64::*;

use super::block::RowSumKernel;
use super::scalar;
use super::x86_sse2::hsum_epi32;

// =============================================================================
// Saturating add
// =============================================================================

/// Signed 32-bit saturating add (same overflow test as the SSE2 variant).
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn adds_epi32(a: __m256i, b: __m256i) -> __m256i {
    let sum = _mm256_add_epi32(a, b);
    let overflow = _mm256_srai_epi32(
        _mm256_and_si256(_mm256_xor_si256(a, sum), _mm256_xor_si256(b, sum)),
        31,
    );
    let saturated = _mm256_xor_si256(_mm256_srai_epi32(a, 31), _mm256_set1_epi32(i32::MAX));
    _mm256_blendv_epi8(sum, saturated, overflow)
}

/// Unsigned 32-bit saturating add.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn adds_epu32(a: __m256i, b: __m256i) -> __m256i {
    let sum = _mm256_add_epi32(a, b);
    // a <= sum (unsigned) exactly when max(a, sum) == sum.
    let no_overflow = _mm256_cmpeq_epi32(_mm256_max_epu32(a, sum), sum);
    _mm256_or_si256(sum, _mm256_xor_si256(no_overflow, _mm256_set1_epi32(-1)))
}

macro_rules! adds_kernels {
    ($($t:ty => $adds:ident, $adds_value:ident, $op:ident;)*) => {
        $(
            /// AVX2 saturating add.
            ///
            /// # Safety
            ///
            /// CPU supports AVX2.
            #[target_feature(enable = "avx2")]
            pub(crate) unsafe fn $adds(a: &[$t], b: &[$t], c: &mut [$t]) {
                const LANES: usize = 32 / std::mem::size_of::<$t>();
                let n = c.len().min(a.len()).min(b.len());
                let body = n - n % LANES;
                let (pa, pb, pc) = (a.as_ptr(), b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    let va = _mm256_loadu_si256(pa.add(i).cast());
                    let vb = _mm256_loadu_si256(pb.add(i).cast());
                    _mm256_storeu_si256(pc.add(i).cast(), $op(va, vb));
                    i += LANES;
                }
                scalar::adds(&a[body..n], &b[body..n], &mut c[body..n]);
            }

            /// AVX2 saturating add of a broadcast value.
            ///
            /// # Safety
            ///
            /// CPU supports AVX2.
            #[target_feature(enable = "avx2")]
            pub(crate) unsafe fn $adds_value(a: $t, b: &[$t], c: &mut [$t]) {
                const LANES: usize = 32 / std::mem::size_of::<$t>();
                let n = c.len().min(b.len());
                let body = n - n % LANES;
                let splat = [a; LANES];
                let va = _mm256_loadu_si256(splat.as_ptr().cast());
                let (pb, pc) = (b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    let vb = _mm256_loadu_si256(pb.add(i).cast());
                    _mm256_storeu_si256(pc.add(i).cast(), $op(va, vb));
                    i += LANES;
                }
                scalar::adds_value(a, &b[body..n], &mut c[body..n]);
            }
        )*
    };
}

adds_kernels! {
    i8 => adds_i8, adds_value_i8, _mm256_adds_epi8;
    u8 => adds_u8, adds_value_u8, _mm256_adds_epu8;
    i16 => adds_i16, adds_value_i16, _mm256_adds_epi16;
    u16 => adds_u16, adds_value_u16, _mm256_adds_epu16;
    i32 => adds_i32, adds_value_i32, adds_epi32;
    u32 => adds_u32, adds_value_u32, adds_epu32;
}

// =============================================================================
// Integer row sums
// =============================================================================

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum256_epi32(v: __m256i) -> i32 {
    hsum_epi32(_mm_add_epi32(
        _mm256_castsi256_si128(v),
        _mm256_extracti128_si256(v, 1),
    ))
}

/// `i8 → i32`, 32 lanes.
pub(crate) struct RowSumI8;

impl RowSumKernel<i8, i32> for RowSumI8 {
    const LANES: usize = 32;

    #[inline]
    unsafe fn sum(row: &[i8]) -> i32 {
        row_sum_i8(row)
    }
}

#[target_feature(enable = "avx2")]
unsafe fn row_sum_i8(row: &[i8]) -> i32 {
    let ones = _mm256_set1_epi16(1);
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < row.len() {
        let v = _mm256_loadu_si256(p.add(i).cast());
        let lo = _mm256_cvtepi8_epi16(_mm256_castsi256_si128(v));
        let hi = _mm256_cvtepi8_epi16(_mm256_extracti128_si256(v, 1));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(lo, ones));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(hi, ones));
        i += 32;
    }
    hsum256_epi32(acc)
}

/// `u8 → u32`, 32 lanes.
pub(crate) struct RowSumU8;

impl RowSumKernel<u8, u32> for RowSumU8 {
    const LANES: usize = 32;

    #[inline]
    unsafe fn sum(row: &[u8]) -> u32 {
        row_sum_u8(row)
    }
}

#[target_feature(enable = "avx2")]
unsafe fn row_sum_u8(row: &[u8]) -> u32 {
    let zero = _mm256_setzero_si256();
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < row.len() {
        let v = _mm256_loadu_si256(p.add(i).cast());
        acc = _mm256_add_epi64(acc, _mm256_sad_epu8(v, zero));
        i += 32;
    }
    let mut lanes = [0_u64; 4];
    _mm256_storeu_si256(lanes.as_mut_ptr().cast(), acc);
    lanes.iter().fold(0_u64, |s, &x| s.wrapping_add(x)) as u32
}

/// `i16 → i32`, 16 lanes.
pub(crate) struct RowSumI16;

impl RowSumKernel<i16, i32> for RowSumI16 {
    const LANES: usize = 16;

    #[inline]
    unsafe fn sum(row: &[i16]) -> i32 {
        row_sum_i16(row)
    }
}

#[target_feature(enable = "avx2")]
unsafe fn row_sum_i16(row: &[i16]) -> i32 {
    let ones = _mm256_set1_epi16(1);
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < row.len() {
        let v = _mm256_loadu_si256(p.add(i).cast());
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(v, ones));
        i += 16;
    }
    hsum256_epi32(acc)
}

/// `u16 → u32`, 16 lanes.
pub(crate) struct RowSumU16;

impl RowSumKernel<u16, u32> for RowSumU16 {
    const LANES: usize = 16;

    #[inline]
    unsafe fn sum(row: &[u16]) -> u32 {
        row_sum_u16(row)
    }
}

#[target_feature(enable = "avx2")]
unsafe fn row_sum_u16(row: &[u16]) -> u32 {
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < row.len() {
        let v = _mm256_loadu_si256(p.add(i).cast());
        let lo = _mm256_cvtepu16_epi32(_mm256_castsi256_si128(v));
        let hi = _mm256_cvtepu16_epi32(_mm256_extracti128_si256(v, 1));
        acc = _mm256_add_epi32(acc, _mm256_add_epi32(lo, hi));
        i += 16;
    }
    hsum256_epi32(acc) as u32
}

/// `i32 → i32` and `u32 → u32`, 8 lanes.
pub(crate) struct RowSumI32;

impl RowSumKernel<i32, i32> for RowSumI32 {
    const LANES: usize = 8;

    #[inline]
    unsafe fn sum(row: &[i32]) -> i32 {
        row_sum_32(row)
    }
}

impl RowSumKernel<u32, u32> for RowSumI32 {
    const LANES: usize = 8;

    #[inline]
    unsafe fn sum(row: &[u32]) -> u32 {
        row_sum_32(row) as u32
    }
}

#[target_feature(enable = "avx2")]
unsafe fn row_sum_32<T>(row: &[T]) -> i32 {
    let p = row.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < row.len() {
        acc = _mm256_add_epi32(acc, _mm256_loadu_si256(p.add(i).cast()));
        i += 8;
    }
    hsum256_epi32(acc)
}
