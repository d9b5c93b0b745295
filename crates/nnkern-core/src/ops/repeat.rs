//! Repeat (tile) and row broadcast.

use super::{checked, require_data, require_shape, require_size};
use crate::buffer::{Matrix, Shaped, Tensor, Vector};
use crate::dispatch;
use crate::element::Element;
use crate::error::{Error, Result};

fn require_count(axis: &'static str, count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::InvalidRepeatParameter { axis });
    }
    Ok(())
}

/// `c = [a, a, .., a]`: `n` copies of `a` back to back.
pub fn cpu_repeat<T: Element>(c: &mut Vector<T>, a: &Vector<T>, n: usize) -> Result<()> {
    checked("cpu_repeat", || {
        require_data("a", a)?;
        require_data("c", c)?;
        require_count("n", n)?;
        require_size("c", a.len() * n, c.len())
    })?;
    dispatch::repeat(a.as_slice(), c.as_mut_slice(), n);
    Ok(())
}

/// Tiles `a` `m` times vertically and `n` times horizontally.
///
/// `c` must be `(a.rows() * m) × (a.cols() * n)`.
pub fn cpu_repeat_matrix<T: Element>(
    c: &mut Matrix<T>,
    a: &Matrix<T>,
    m: usize,
    n: usize,
) -> Result<()> {
    checked("cpu_repeat_matrix", || {
        require_data("a", a)?;
        require_data("c", c)?;
        require_count("m", m)?;
        require_count("n", n)?;
        require_shape("c", vec![a.rows() * m, a.cols() * n], c.shape())
    })?;
    let rsd = c.row_stride();
    dispatch::repeat_2d(
        a.rows(),
        a.cols(),
        a.data(),
        a.row_stride(),
        c.data_mut(),
        rsd,
        m,
        n,
    );
    Ok(())
}

/// Tiles `a` `l × m × n` times along (batch, rows, cols).
///
/// Slab `s` of `c` is slab `s % a.batch()` of `a` tiled `m × n` times.
pub fn cpu_repeat_tensor<T: Element>(
    c: &mut Tensor<T>,
    a: &Tensor<T>,
    l: usize,
    m: usize,
    n: usize,
) -> Result<()> {
    checked("cpu_repeat_tensor", || {
        require_data("a", a)?;
        require_data("c", c)?;
        require_count("l", l)?;
        require_count("m", m)?;
        require_count("n", n)?;
        require_shape(
            "c",
            vec![a.batch() * l, a.rows() * m, a.cols() * n],
            c.shape(),
        )
    })?;

    let (rss, rsd) = (a.row_stride(), c.row_stride());
    let src_slab = a.rows() * rss;
    let dst_slab = c.rows() * rsd;
    for s in 0..a.batch() {
        dispatch::repeat_2d(
            a.rows(),
            a.cols(),
            &a.data()[s * src_slab..],
            rss,
            &mut c.data_mut()[s * dst_slab..],
            rsd,
            m,
            n,
        );
    }

    // Copy the first `a.batch()` slabs into the remaining `l - 1` groups.
    let (rows, width) = (c.rows(), c.cols());
    let data = c.data_mut();
    for t in a.batch()..a.batch() * l {
        let from = t % a.batch();
        for r in 0..rows {
            let src = (from * rows + r) * rsd;
            let dst = (t * rows + r) * rsd;
            data.copy_within(src..src + width, dst);
        }
    }
    Ok(())
}

/// Copies the vector `a` into every row of `c`.
pub fn cpu_broadcast_rows<T: Element>(c: &mut Matrix<T>, a: &Vector<T>) -> Result<()> {
    checked("cpu_broadcast_rows", || {
        require_data("a", a)?;
        require_data("c", c)?;
        require_size("a", c.cols(), a.len())
    })?;
    for r in 0..c.rows() {
        dispatch::repeat(a.as_slice(), c.row_mut(r), 1);
    }
    Ok(())
}
