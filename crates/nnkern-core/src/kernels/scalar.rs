//! Portable scalar kernels.
//!
//! These serve as:
//! - the fallback on CPUs (or architectures) without a SIMD variant
//! - the reference every SIMD variant is tested against
//! - the remainder handler for elements that do not fill a whole block
//!
//! Kernels trust their callers: lengths and strides were validated by the
//! `cpu_*` layer, and only slice indexing guards against misuse.

use std::ops::Range;

use crate::element::{Accumulator, Element, FloatElement, GatherIndex, SaturatingElement};

// =============================================================================
// Saturating add
// =============================================================================

/// `c[i] = saturate(a[i] + b[i])` for `i < c.len()`.
#[inline]
pub fn adds<T: SaturatingElement>(a: &[T], b: &[T], c: &mut [T]) {
    for ((c, &a), &b) in c.iter_mut().zip(a).zip(b) {
        *c = a.adds(b);
    }
}

/// `c[i] = saturate(a + b[i])` for `i < c.len()`.
#[inline]
pub fn adds_value<T: SaturatingElement>(a: T, b: &[T], c: &mut [T]) {
    for (c, &b) in c.iter_mut().zip(b) {
        *c = a.adds(b);
    }
}

// =============================================================================
// Multiply
// =============================================================================

/// `c[i] = a[i] * b[i]` for `i < c.len()`.
#[inline]
pub fn mul<T: FloatElement>(a: &[T], b: &[T], c: &mut [T]) {
    for ((c, &a), &b) in c.iter_mut().zip(a).zip(b) {
        *c = a * b;
    }
}

/// `c[i] = a * b[i]` for `i < c.len()`.
#[inline]
pub fn mul_value<T: FloatElement>(a: T, b: &[T], c: &mut [T]) {
    for (c, &b) in c.iter_mut().zip(b) {
        *c = a * b;
    }
}

// =============================================================================
// Transpose
// =============================================================================

/// `b[j][i] = a[i][j]` for `i` in `rows`, `j` in `cols`.
///
/// `a` has row stride `rsa`, `b` has row stride `rsb`.
#[inline]
pub fn common_transpose<T: Copy>(
    a: &[T],
    rsa: usize,
    b: &mut [T],
    rsb: usize,
    rows: Range<usize>,
    cols: Range<usize>,
) {
    for i in rows {
        let row = &a[i * rsa..];
        for j in cols.clone() {
            b[j * rsb + i] = row[j];
        }
    }
}

/// Transposes the `m × n` matrix `a` into the `n × m` matrix `b`.
#[inline]
pub fn transpose<T: Copy>(m: usize, n: usize, a: &[T], rsa: usize, b: &mut [T], rsb: usize) {
    common_transpose(a, rsa, b, rsb, 0..m, 0..n);
}

// =============================================================================
// Mapping (gather)
// =============================================================================

/// `c[i] = p[b[i]]` for `i < c.len()`.
///
/// Indices must be in range; the `cpu_mapping` entry point checks them.
#[inline]
pub fn mapping<T1: Element, T2: GatherIndex>(p: &[T1], b: &[T2], c: &mut [T1]) {
    for (c, &index) in c.iter_mut().zip(b) {
        let index = index.to_index().unwrap_or(usize::MAX);
        *c = p[index];
    }
}

// =============================================================================
// Row reductions
// =============================================================================

/// Sum of `row`, widened to `T2` element by element.
#[inline]
pub fn row_sum<T1: Element, T2: Accumulator<T1>>(init: T2, row: &[T1]) -> T2 {
    row.iter()
        .fold(init, |acc, &x| acc.accumulate(T2::widen(x)))
}

/// `b[i] += Σ_j a[i][j]` over an `m × n` matrix with row stride `rsa`.
#[inline]
pub fn reduce_row_sum<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    for (i, out) in b.iter_mut().enumerate().take(m) {
        let row = &a[i * rsa..i * rsa + n];
        *out = out.accumulate(row_sum(T2::default(), row));
    }
}

/// `b[i] = max_j a[i][j]` (widened). Rows must be non-empty.
#[inline]
pub fn reduce_row_max<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    reduce_row_by(m, n, a, rsa, b, |best, x| x > best);
}

/// `b[i] = min_j a[i][j]` (widened). Rows must be non-empty.
#[inline]
pub fn reduce_row_min<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    reduce_row_by(m, n, a, rsa, b, |best, x| x < best);
}

fn reduce_row_by<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
    replaces: impl Fn(T2, T2) -> bool,
) {
    for (i, out) in b.iter_mut().enumerate().take(m) {
        let row = &a[i * rsa..i * rsa + n];
        let mut best = T2::widen(row[0]);
        for &x in &row[1..] {
            let x = T2::widen(x);
            if replaces(best, x) {
                best = x;
            }
        }
        *out = best;
    }
}

// =============================================================================
// Repeat / tile
// =============================================================================

/// Writes `n` consecutive copies of `src` into `dst`.
#[inline]
pub fn repeat<T: Copy>(src: &[T], dst: &mut [T], n: usize) {
    if src.is_empty() {
        return;
    }
    for chunk in dst.chunks_exact_mut(src.len()).take(n) {
        chunk.copy_from_slice(src);
    }
}

/// Tiles the `rows × cols` matrix `src` `m` times vertically and `n` times
/// horizontally into `dst`, which has `rows * m` rows of `cols * n` elements.
#[inline]
pub fn repeat_2d<T: Copy>(
    rows: usize,
    cols: usize,
    src: &[T],
    rss: usize,
    dst: &mut [T],
    rsd: usize,
    m: usize,
    n: usize,
) {
    for r in 0..rows {
        let src_row = &src[r * rss..r * rss + cols];
        let first = r * rsd;
        repeat(src_row, &mut dst[first..first + cols * n], n);
    }
    // Copy the first band of rows into the remaining `m - 1` bands.
    let band = rows * rsd;
    let width = cols * n;
    for k in 1..m {
        let (head, tail) = dst.split_at_mut(k * band);
        for r in 0..rows {
            let at = r * rsd;
            tail[at..at + width].copy_from_slice(&head[at..at + width]);
        }
    }
}

// =============================================================================
// GEVV / GEMM family
// =============================================================================

/// `y[j] = y[j] + alpha * x[j]` for `j < y.len()`.
#[inline]
pub fn axpy<T: FloatElement>(alpha: T, x: &[T], y: &mut [T]) {
    for (y, &x) in y.iter_mut().zip(x) {
        *y = *y + alpha * x;
    }
}

/// Dot product, summed left to right.
#[inline]
pub fn dot<T: FloatElement>(x: &[T], y: &[T]) -> T {
    x.iter()
        .zip(y)
        .fold(T::ZERO, |acc, (&x, &y)| acc + x * y)
}

/// `C[i][j] += a[i] * b[j]` for the `m × n` matrix `C` with row stride `rsc`.
#[inline]
pub fn addvv<T: FloatElement>(m: usize, n: usize, a: &[T], b: &[T], c: &mut [T], rsc: usize) {
    for (i, &alpha) in a.iter().enumerate().take(m) {
        axpy(alpha, &b[..n], &mut c[i * rsc..i * rsc + n]);
    }
}

/// `C(m×n) += A(m×k) · B(k×n)`.
#[inline]
pub fn addmm<T: FloatElement>(
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    rsa: usize,
    b: &[T],
    rsb: usize,
    c: &mut [T],
    rsc: usize,
) {
    for i in 0..m {
        let c_row = &mut c[i * rsc..i * rsc + n];
        for p in 0..k {
            axpy(a[i * rsa + p], &b[p * rsb..p * rsb + n], c_row);
        }
    }
}

/// `C(m×n) += A(m×k) · B(n×k)ᵗ`.
#[inline]
pub fn addmmt<T: FloatElement>(
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    rsa: usize,
    b: &[T],
    rsb: usize,
    c: &mut [T],
    rsc: usize,
) {
    for i in 0..m {
        let a_row = &a[i * rsa..i * rsa + k];
        for j in 0..n {
            let d = dot(a_row, &b[j * rsb..j * rsb + k]);
            c[i * rsc + j] = c[i * rsc + j] + d;
        }
    }
}
