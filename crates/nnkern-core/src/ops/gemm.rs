//! GEVV / GTVV / GEMM family.
//!
//! The `add*` forms accumulate into `c`; the others zero- or
//! copy-initialize `c` after validation and then accumulate.

use super::{checked, fill_zero, require_data, require_shape, require_size};
use crate::buffer::{Matrix, Shaped, Vector};
use crate::dispatch::{self, GemmDispatch};
use crate::error::Result;

fn check_mm<T: GemmDispatch>(c: &Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    require_data("a", a)?;
    require_data("b", b)?;
    require_data("c", c)?;
    require_shape("b", vec![a.cols(), b.cols()], b.shape())?;
    require_shape("c", vec![a.rows(), b.cols()], c.shape())
}

fn check_mmt<T: GemmDispatch>(c: &Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    require_data("a", a)?;
    require_data("b", b)?;
    require_data("c", c)?;
    require_shape("b", vec![b.rows(), a.cols()], b.shape())?;
    require_shape("c", vec![a.rows(), b.rows()], c.shape())
}

fn check_vv<T: GemmDispatch>(
    c: &Matrix<T>,
    a: &Vector<T>,
    b: &Vector<T>,
    transposed: bool,
) -> Result<()> {
    require_data("a", a)?;
    require_data("b", b)?;
    require_data("c", c)?;
    let expected = if transposed {
        vec![b.len(), a.len()]
    } else {
        vec![a.len(), b.len()]
    };
    require_shape("c", expected, c.shape())
}

fn addmm_unchecked<T: GemmDispatch>(c: &mut Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) {
    let rsc = c.row_stride();
    dispatch::addmm(
        a.rows(),
        b.cols(),
        a.cols(),
        a.data(),
        a.row_stride(),
        b.data(),
        b.row_stride(),
        c.data_mut(),
        rsc,
    );
}

fn addmmt_unchecked<T: GemmDispatch>(c: &mut Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) {
    let rsc = c.row_stride();
    dispatch::addmmt(
        a.rows(),
        b.rows(),
        a.cols(),
        a.data(),
        a.row_stride(),
        b.data(),
        b.row_stride(),
        c.data_mut(),
        rsc,
    );
}

/// `C(m×n) += A(m×k) · B(k×n)`.
pub fn cpu_addmm<T: GemmDispatch>(c: &mut Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    checked("cpu_addmm", || check_mm(c, a, b))?;
    addmm_unchecked(c, a, b);
    Ok(())
}

/// `C = A · B`.
pub fn cpu_gemm<T: GemmDispatch>(c: &mut Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    checked("cpu_gemm", || check_mm(c, a, b))?;
    fill_zero(c);
    addmm_unchecked(c, a, b);
    Ok(())
}

/// `C = bias + A · B`, with the vector `bias` copied into every row of `C` first.
pub fn cpu_gemm_bias<T: GemmDispatch>(
    c: &mut Matrix<T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    bias: &Vector<T>,
) -> Result<()> {
    checked("cpu_gemm_bias", || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_data("bias", bias)?;
        check_mm(c, a, b)?;
        require_size("bias", b.cols(), bias.len())
    })?;
    for r in 0..c.rows() {
        dispatch::repeat(bias.as_slice(), c.row_mut(r), 1);
    }
    addmm_unchecked(c, a, b);
    Ok(())
}

/// `C(m×n) += A(m×k) · B(n×k)ᵗ`.
pub fn cpu_addmmt<T: GemmDispatch>(
    c: &mut Matrix<T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Result<()> {
    checked("cpu_addmmt", || check_mmt(c, a, b))?;
    addmmt_unchecked(c, a, b);
    Ok(())
}

/// `C = A · Bᵗ`.
pub fn cpu_gemmt<T: GemmDispatch>(c: &mut Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    checked("cpu_gemmt", || check_mmt(c, a, b))?;
    fill_zero(c);
    addmmt_unchecked(c, a, b);
    Ok(())
}

/// GEVV accumulate: `C(m×n) += a(m) ⊗ b(n)`.
pub fn cpu_addvv<T: GemmDispatch>(c: &mut Matrix<T>, a: &Vector<T>, b: &Vector<T>) -> Result<()> {
    checked("cpu_addvv", || check_vv(c, a, b, false))?;
    let rsc = c.row_stride();
    dispatch::addvv(a.len(), b.len(), a.as_slice(), b.as_slice(), c.data_mut(), rsc);
    Ok(())
}

/// GEVV: `C = a ⊗ b`.
pub fn cpu_gevv<T: GemmDispatch>(c: &mut Matrix<T>, a: &Vector<T>, b: &Vector<T>) -> Result<()> {
    checked("cpu_gevv", || check_vv(c, a, b, false))?;
    fill_zero(c);
    let rsc = c.row_stride();
    dispatch::addvv(a.len(), b.len(), a.as_slice(), b.as_slice(), c.data_mut(), rsc);
    Ok(())
}

/// GTVV accumulate: `C(n×m) += (a(m) ⊗ b(n))ᵗ`.
pub fn cpu_addtvv<T: GemmDispatch>(
    c: &mut Matrix<T>,
    a: &Vector<T>,
    b: &Vector<T>,
) -> Result<()> {
    checked("cpu_addtvv", || check_vv(c, a, b, true))?;
    let rsc = c.row_stride();
    dispatch::addtvv(a.len(), b.len(), a.as_slice(), b.as_slice(), c.data_mut(), rsc);
    Ok(())
}

/// GTVV: `C = (a ⊗ b)ᵗ`.
pub fn cpu_gtvv<T: GemmDispatch>(c: &mut Matrix<T>, a: &Vector<T>, b: &Vector<T>) -> Result<()> {
    checked("cpu_gtvv", || check_vv(c, a, b, true))?;
    fill_zero(c);
    let rsc = c.row_stride();
    dispatch::addtvv(a.len(), b.len(), a.as_slice(), b.as_slice(), c.data_mut(), rsc);
    Ok(())
}
