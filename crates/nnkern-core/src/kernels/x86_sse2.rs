//! SSE and SSE2 kernels for x86_64 (128-bit registers).
//!
//! Contains saturating adds for every integer width, `f32`/`f64` multiply,
//! integer row sums and the 128-bit transpose tiles.
//!
//! All functions require runtime feature detection before calling.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::many_single_char_names)]

use std::arch::x86_64::*;

use super::block::{RowSumKernel, TransposeTile};
use super::scalar;

// =============================================================================
// Saturating add
// =============================================================================

/// Signed 32-bit saturating add; SSE2 has no native instruction for it.
///
/// Overflow occurred when both operands share a sign that the wrapped sum
/// does not. The saturated value is `MAX` for non-negative `a`, `MIN` otherwise.
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn adds_epi32(a: __m128i, b: __m128i) -> __m128i {
    let sum = _mm_add_epi32(a, b);
    let overflow = _mm_srai_epi32(
        _mm_and_si128(_mm_xor_si128(a, sum), _mm_xor_si128(b, sum)),
        31,
    );
    let saturated = _mm_xor_si128(_mm_srai_epi32(a, 31), _mm_set1_epi32(i32::MAX));
    _mm_or_si128(
        _mm_and_si128(overflow, saturated),
        _mm_andnot_si128(overflow, sum),
    )
}

/// Unsigned 32-bit saturating add: the wrapped sum is below `a` on overflow.
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn adds_epu32(a: __m128i, b: __m128i) -> __m128i {
    let bias = _mm_set1_epi32(i32::MIN);
    let sum = _mm_add_epi32(a, b);
    let overflow = _mm_cmpgt_epi32(_mm_xor_si128(a, bias), _mm_xor_si128(sum, bias));
    _mm_or_si128(sum, overflow)
}

macro_rules! adds_kernels {
    ($($t:ty => $adds:ident, $adds_value:ident, $op:ident;)*) => {
        $(
            /// SSE2 saturating add.
            ///
            /// # Safety
            ///
            /// CPU supports SSE2.
            #[target_feature(enable = "sse2")]
            pub(crate) unsafe fn $adds(a: &[$t], b: &[$t], c: &mut [$t]) {
                const LANES: usize = 16 / std::mem::size_of::<$t>();
                let n = c.len().min(a.len()).min(b.len());
                let body = n - n % LANES;
                let (pa, pb, pc) = (a.as_ptr(), b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    // SAFETY: i + LANES <= body <= len of every slice.
                    let va = _mm_loadu_si128(pa.add(i).cast());
                    let vb = _mm_loadu_si128(pb.add(i).cast());
                    _mm_storeu_si128(pc.add(i).cast(), $op(va, vb));
                    i += LANES;
                }
                scalar::adds(&a[body..n], &b[body..n], &mut c[body..n]);
            }

            /// SSE2 saturating add of a broadcast value.
            ///
            /// # Safety
            ///
            /// CPU supports SSE2.
            #[target_feature(enable = "sse2")]
            pub(crate) unsafe fn $adds_value(a: $t, b: &[$t], c: &mut [$t]) {
                const LANES: usize = 16 / std::mem::size_of::<$t>();
                let n = c.len().min(b.len());
                let body = n - n % LANES;
                let splat = [a; LANES];
                let va = _mm_loadu_si128(splat.as_ptr().cast());
                let (pb, pc) = (b.as_ptr(), c.as_mut_ptr());
                let mut i = 0;
                while i < body {
                    let vb = _mm_loadu_si128(pb.add(i).cast());
                    _mm_storeu_si128(pc.add(i).cast(), $op(va, vb));
                    i += LANES;
                }
                scalar::adds_value(a, &b[body..n], &mut c[body..n]);
            }
        )*
    };
}

adds_kernels! {
    i8 => adds_i8, adds_value_i8, _mm_adds_epi8;
    u8 => adds_u8, adds_value_u8, _mm_adds_epu8;
    i16 => adds_i16, adds_value_i16, _mm_adds_epi16;
    u16 => adds_u16, adds_value_u16, _mm_adds_epu16;
    i32 => adds_i32, adds_value_i32, adds_epi32;
    u32 => adds_u32, adds_value_u32, adds_epu32;
}

// =============================================================================
// Multiply
// =============================================================================

macro_rules! mul_kernels {
    ($($t:ty, $feature:tt, $lanes:expr => $mul:ident, $mul_value:ident,
        $load:ident, $store:ident, $set1:ident, $op:ident;)*) => {
        $(
            /// 128-bit elementwise multiply.
            ///
            /// # Safety
            ///
            /// CPU supports the enabled feature.
            #[target_feature(enable = $feature)]
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

            /// 128-bit multiply by a broadcast value.
            ///
            /// # Safety
            ///
            /// CPU supports the enabled feature.
            #[target_feature(enable = $feature)]
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
    f32, "sse", 4 => mul_f32, mul_value_f32,
        _mm_loadu_ps, _mm_storeu_ps, _mm_set1_ps, _mm_mul_ps;
    f64, "sse2", 2 => mul_f64, mul_value_f64,
        _mm_loadu_pd, _mm_storeu_pd, _mm_set1_pd, _mm_mul_pd;
}

// =============================================================================
// Integer row sums
// =============================================================================

/// Horizontal wrapping sum of four 32-bit lanes.
#[target_feature(enable = "sse2")]
#[inline]
pub(crate) unsafe fn hsum_epi32(v: __m128i) -> i32 {
    let s = _mm_add_epi32(v, _mm_shuffle_epi32(v, 0x4E));
    let s = _mm_add_epi32(s, _mm_shuffle_epi32(s, 0xB1));
    _mm_cvtsi128_si32(s)
}

/// Runs `step` over each 16-byte chunk of `row` and folds the 32-bit lanes.
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn sum_epi32_lanes<T>(row: &[T], step: impl Fn(__m128i, __m128i) -> __m128i) -> i32 {
    let lanes = 16 / std::mem::size_of::<T>();
    let p = row.as_ptr();
    let mut acc = _mm_setzero_si128();
    let mut i = 0;
    while i < row.len() {
        acc = step(acc, _mm_loadu_si128(p.add(i).cast()));
        i += lanes;
    }
    hsum_epi32(acc)
}

/// `i8 → i32`: sign-extend to 16 bits, then `madd` adjacent pairs.
pub(crate) struct RowSumI8;

impl RowSumKernel<i8, i32> for RowSumI8 {
    const LANES: usize = 16;

    #[inline]
    unsafe fn sum(row: &[i8]) -> i32 {
        row_sum_i8(row)
    }
}

#[target_feature(enable = "sse2")]
unsafe fn row_sum_i8(row: &[i8]) -> i32 {
    let ones = _mm_set1_epi16(1);
    sum_epi32_lanes(row, |acc, v| {
        let lo = _mm_srai_epi16(_mm_unpacklo_epi8(v, v), 8);
        let hi = _mm_srai_epi16(_mm_unpackhi_epi8(v, v), 8);
        let acc = _mm_add_epi32(acc, _mm_madd_epi16(lo, ones));
        _mm_add_epi32(acc, _mm_madd_epi16(hi, ones))
    })
}

/// `u8 → u32`: `sad` against zero yields two 64-bit partial sums per chunk.
pub(crate) struct RowSumU8;

impl RowSumKernel<u8, u32> for RowSumU8 {
    const LANES: usize = 16;

    #[inline]
    unsafe fn sum(row: &[u8]) -> u32 {
        row_sum_u8(row)
    }
}

#[target_feature(enable = "sse2")]
unsafe fn row_sum_u8(row: &[u8]) -> u32 {
    let zero = _mm_setzero_si128();
    let p = row.as_ptr();
    let mut acc = _mm_setzero_si128();
    let mut i = 0;
    while i < row.len() {
        let v = _mm_loadu_si128(p.add(i).cast());
        acc = _mm_add_epi64(acc, _mm_sad_epu8(v, zero));
        i += 16;
    }
    let lo = _mm_cvtsi128_si64(acc) as u64;
    let hi = _mm_cvtsi128_si64(_mm_unpackhi_epi64(acc, acc)) as u64;
    lo.wrapping_add(hi) as u32
}

/// `i16 → i32`: `madd` against ones widens and adds pairs.
pub(crate) struct RowSumI16;

impl RowSumKernel<i16, i32> for RowSumI16 {
    const LANES: usize = 8;

    #[inline]
    unsafe fn sum(row: &[i16]) -> i32 {
        row_sum_i16(row)
    }
}

#[target_feature(enable = "sse2")]
unsafe fn row_sum_i16(row: &[i16]) -> i32 {
    let ones = _mm_set1_epi16(1);
    sum_epi32_lanes(row, |acc, v| _mm_add_epi32(acc, _mm_madd_epi16(v, ones)))
}

/// `u16 → u32`: zero-extend by interleaving with zero.
pub(crate) struct RowSumU16;

impl RowSumKernel<u16, u32> for RowSumU16 {
    const LANES: usize = 8;

    #[inline]
    unsafe fn sum(row: &[u16]) -> u32 {
        row_sum_u16(row)
    }
}

#[target_feature(enable = "sse2")]
unsafe fn row_sum_u16(row: &[u16]) -> u32 {
    let zero = _mm_setzero_si128();
    sum_epi32_lanes(row, |acc, v| {
        let acc = _mm_add_epi32(acc, _mm_unpacklo_epi16(v, zero));
        _mm_add_epi32(acc, _mm_unpackhi_epi16(v, zero))
    }) as u32
}

/// `i32 → i32` and `u32 → u32`: plain wrapping lane adds.
pub(crate) struct RowSumI32;

impl RowSumKernel<i32, i32> for RowSumI32 {
    const LANES: usize = 4;

    #[inline]
    unsafe fn sum(row: &[i32]) -> i32 {
        row_sum_32(row)
    }
}

impl RowSumKernel<u32, u32> for RowSumI32 {
    const LANES: usize = 4;

    #[inline]
    unsafe fn sum(row: &[u32]) -> u32 {
        row_sum_32(row) as u32
    }
}

#[target_feature(enable = "sse2")]
unsafe fn row_sum_32<T>(row: &[T]) -> i32 {
    sum_epi32_lanes(row, |acc, v| _mm_add_epi32(acc, v))
}

// =============================================================================
// Transpose tiles
// =============================================================================

/// 8×8 byte tile: three rounds of interleaves (8 → 16 → 32 bits).
pub(crate) struct Transpose8x8U8;

impl TransposeTile<u8> for Transpose8x8U8 {
    const BM: usize = 8;
    const BN: usize = 8;

    #[inline]
    unsafe fn tile(src: *const u8, lda: usize, dst: *mut u8, ldb: usize) {
        transpose_8x8_u8(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "sse2")]
unsafe fn transpose_8x8_u8(src: *const u8, lda: usize, dst: *mut u8, ldb: usize) {
    let r = |k: usize| _mm_loadl_epi64(src.add(k * lda).cast());
    let t0 = _mm_unpacklo_epi8(r(0), r(1));
    let t1 = _mm_unpacklo_epi8(r(2), r(3));
    let t2 = _mm_unpacklo_epi8(r(4), r(5));
    let t3 = _mm_unpacklo_epi8(r(6), r(7));

    let u0 = _mm_unpacklo_epi16(t0, t1);
    let u1 = _mm_unpackhi_epi16(t0, t1);
    let u2 = _mm_unpacklo_epi16(t2, t3);
    let u3 = _mm_unpackhi_epi16(t2, t3);

    // Each vector holds two output rows of 8 bytes.
    let v = [
        _mm_unpacklo_epi32(u0, u2),
        _mm_unpackhi_epi32(u0, u2),
        _mm_unpacklo_epi32(u1, u3),
        _mm_unpackhi_epi32(u1, u3),
    ];
    for (k, v) in v.into_iter().enumerate() {
        _mm_storel_epi64(dst.add(2 * k * ldb).cast(), v);
        _mm_storel_epi64(dst.add((2 * k + 1) * ldb).cast(), _mm_unpackhi_epi64(v, v));
    }
}

/// 8×8 tile of 16-bit words: interleave 16 → 32 → 64 bits.
pub(crate) struct Transpose8x8U16;

impl TransposeTile<u16> for Transpose8x8U16 {
    const BM: usize = 8;
    const BN: usize = 8;

    #[inline]
    unsafe fn tile(src: *const u16, lda: usize, dst: *mut u16, ldb: usize) {
        transpose_8x8_u16(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "sse2")]
unsafe fn transpose_8x8_u16(src: *const u16, lda: usize, dst: *mut u16, ldb: usize) {
    let r = |k: usize| _mm_loadu_si128(src.add(k * lda).cast());
    let (r0, r1, r2, r3) = (r(0), r(1), r(2), r(3));
    let (r4, r5, r6, r7) = (r(4), r(5), r(6), r(7));

    let t0 = _mm_unpacklo_epi16(r0, r1);
    let t1 = _mm_unpackhi_epi16(r0, r1);
    let t2 = _mm_unpacklo_epi16(r2, r3);
    let t3 = _mm_unpackhi_epi16(r2, r3);
    let t4 = _mm_unpacklo_epi16(r4, r5);
    let t5 = _mm_unpackhi_epi16(r4, r5);
    let t6 = _mm_unpacklo_epi16(r6, r7);
    let t7 = _mm_unpackhi_epi16(r6, r7);

    let u0 = _mm_unpacklo_epi32(t0, t2);
    let u1 = _mm_unpackhi_epi32(t0, t2);
    let u2 = _mm_unpacklo_epi32(t1, t3);
    let u3 = _mm_unpackhi_epi32(t1, t3);
    let u4 = _mm_unpacklo_epi32(t4, t6);
    let u5 = _mm_unpackhi_epi32(t4, t6);
    let u6 = _mm_unpacklo_epi32(t5, t7);
    let u7 = _mm_unpackhi_epi32(t5, t7);

    let out = [
        _mm_unpacklo_epi64(u0, u4),
        _mm_unpackhi_epi64(u0, u4),
        _mm_unpacklo_epi64(u1, u5),
        _mm_unpackhi_epi64(u1, u5),
        _mm_unpacklo_epi64(u2, u6),
        _mm_unpackhi_epi64(u2, u6),
        _mm_unpacklo_epi64(u3, u7),
        _mm_unpackhi_epi64(u3, u7),
    ];
    for (k, v) in out.into_iter().enumerate() {
        _mm_storeu_si128(dst.add(k * ldb).cast(), v);
    }
}

/// 4×4 tile of 32-bit elements.
pub(crate) struct Transpose4x4U32;

impl TransposeTile<u32> for Transpose4x4U32 {
    const BM: usize = 4;
    const BN: usize = 4;

    #[inline]
    unsafe fn tile(src: *const u32, lda: usize, dst: *mut u32, ldb: usize) {
        transpose_4x4_u32(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "sse2")]
unsafe fn transpose_4x4_u32(src: *const u32, lda: usize, dst: *mut u32, ldb: usize) {
    let r = |k: usize| _mm_loadu_si128(src.add(k * lda).cast());
    let (r0, r1, r2, r3) = (r(0), r(1), r(2), r(3));

    let t0 = _mm_unpacklo_epi32(r0, r1);
    let t1 = _mm_unpacklo_epi32(r2, r3);
    let t2 = _mm_unpackhi_epi32(r0, r1);
    let t3 = _mm_unpackhi_epi32(r2, r3);

    let out = [
        _mm_unpacklo_epi64(t0, t1),
        _mm_unpackhi_epi64(t0, t1),
        _mm_unpacklo_epi64(t2, t3),
        _mm_unpackhi_epi64(t2, t3),
    ];
    for (k, v) in out.into_iter().enumerate() {
        _mm_storeu_si128(dst.add(k * ldb).cast(), v);
    }
}

/// 2×2 tile of 64-bit elements.
pub(crate) struct Transpose2x2U64;

impl TransposeTile<u64> for Transpose2x2U64 {
    const BM: usize = 2;
    const BN: usize = 2;

    #[inline]
    unsafe fn tile(src: *const u64, lda: usize, dst: *mut u64, ldb: usize) {
        transpose_2x2_u64(src, lda, dst, ldb);
    }
}

#[target_feature(enable = "sse2")]
unsafe fn transpose_2x2_u64(src: *const u64, lda: usize, dst: *mut u64, ldb: usize) {
    let r0 = _mm_loadu_si128(src.cast());
    let r1 = _mm_loadu_si128(src.add(lda).cast());
    _mm_storeu_si128(dst.cast(), _mm_unpacklo_epi64(r0, r1));
    _mm_storeu_si128(dst.add(ldb).cast(), _mm_unpackhi_epi64(r0, r1));
}
