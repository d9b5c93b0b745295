//! Tiling drivers.
//!
//! A driver walks the largest block-aligned region with a SIMD kernel and
//! hands the rows and columns that do not fill a whole block to the scalar
//! kernels, so every ISA variant covers exactly the same elements.

use super::scalar;
use crate::element::{Accumulator, Element};

/// In-register transpose of one `BM × BN` tile.
///
/// `dst[c * ldb + r] = src[r * lda + c]` for `r < BM`, `c < BN`.
pub(crate) trait TransposeTile<T: Copy> {
    /// Tile rows.
    const BM: usize;
    /// Tile columns.
    const BN: usize;

    /// Transposes one full tile.
    ///
    /// # Safety
    ///
    /// - The CPU supports the tile's instruction set.
    /// - `src` is readable for `BM` rows of stride `lda` and `BN` elements each.
    /// - `dst` is writable for `BN` rows of stride `ldb` and `BM` elements each.
    unsafe fn tile(src: *const T, lda: usize, dst: *mut T, ldb: usize);
}

/// Partial row sum over a block-aligned prefix.
pub(crate) trait RowSumKernel<T1: Element, T2: Accumulator<T1>> {
    /// Elements consumed per SIMD step.
    const LANES: usize;

    /// Sum of `row`, whose length is a multiple of `LANES`.
    ///
    /// # Safety
    ///
    /// The CPU supports the kernel's instruction set.
    unsafe fn sum(row: &[T1]) -> T2;
}

/// Transposes the `m × n` matrix `a` into `b` tile by tile.
///
/// # Safety
///
/// - The CPU supports `K`'s instruction set.
/// - `a` covers `(m - 1) * rsa + n` elements and `b` covers `(n - 1) * rsb + m`
///   elements whenever `m` and `n` are non-zero.
pub(crate) unsafe fn transpose_blocked<T: Copy, K: TransposeTile<T>>(
    m: usize,
    n: usize,
    a: &[T],
    rsa: usize,
    b: &mut [T],
    rsb: usize,
) {
    let mb = m - m % K::BM;
    let nb = n - n % K::BN;

    let pa = a.as_ptr();
    let pb = b.as_mut_ptr();
    for i in (0..mb).step_by(K::BM) {
        for j in (0..nb).step_by(K::BN) {
            // SAFETY: i + BM <= m and j + BN <= n, so the tile lies inside
            // both spans guaranteed by the caller.
            K::tile(pa.add(i * rsa + j), rsa, pb.add(j * rsb + i), rsb);
        }
    }

    // Right edge of the tiled rows, then every remaining row.
    scalar::common_transpose(a, rsa, b, rsb, 0..mb, nb..n);
    scalar::common_transpose(a, rsa, b, rsb, mb..m, 0..n);
}

/// `b[i] += Σ_j a[i][j]`: SIMD over the aligned prefix of each row, scalar
/// over its tail.
///
/// # Safety
///
/// The CPU supports `K`'s instruction set.
pub(crate) unsafe fn reduce_row_sum_blocked<T1, T2, K>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) where
    T1: Element,
    T2: Accumulator<T1>,
    K: RowSumKernel<T1, T2>,
{
    let body = n - n % K::LANES;
    for (i, out) in b.iter_mut().enumerate().take(m) {
        let row = &a[i * rsa..i * rsa + n];
        let partial = K::sum(&row[..body]);
        let total = scalar::row_sum(partial, &row[body..]);
        *out = out.accumulate(total);
    }
}
