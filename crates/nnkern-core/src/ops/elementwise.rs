//! Saturating add and float multiply: full, value-broadcast and
//! element-broadcast forms.

use super::{checked, require_data, require_shape, require_size};
use crate::buffer::{Matrix, Shaped, Tensor, Vector};
use crate::dispatch::{self, AddsDispatch, MulDispatch};
use crate::element::Element;
use crate::error::Result;

type BinaryKernel<T> = fn(&[T], &[T], &mut [T]);
type ValueKernel<T> = fn(T, &[T], &mut [T]);

fn apply_binary<B: Shaped>(c: &mut B, a: &B, b: &B, kernel: BinaryKernel<B::Elem>) {
    if a.is_contiguous() && b.is_contiguous() && c.is_contiguous() {
        let n = a.size();
        kernel(&a.data()[..n], &b.data()[..n], &mut c.data_mut()[..n]);
    } else {
        for r in 0..a.total_rows() {
            kernel(a.row(r), b.row(r), c.row_mut(r));
        }
    }
}

fn apply_value<B: Shaped>(c: &mut B, a: B::Elem, b: &B, kernel: ValueKernel<B::Elem>) {
    if b.is_contiguous() && c.is_contiguous() {
        let n = b.size();
        kernel(a, &b.data()[..n], &mut c.data_mut()[..n]);
    } else {
        for r in 0..b.total_rows() {
            kernel(a, b.row(r), c.row_mut(r));
        }
    }
}

fn binary<B: Shaped>(
    op: &'static str,
    c: &mut B,
    a: &B,
    b: &B,
    kernel: BinaryKernel<B::Elem>,
) -> Result<()> {
    checked(op, || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_data("c", c)?;
        require_shape("b", a.shape(), b.shape())?;
        require_shape("c", a.shape(), c.shape())
    })?;
    apply_binary(c, a, b, kernel);
    Ok(())
}

fn value<B: Shaped>(
    op: &'static str,
    c: &mut B,
    a: B::Elem,
    b: &B,
    kernel: ValueKernel<B::Elem>,
) -> Result<()> {
    checked(op, || {
        require_data("b", b)?;
        require_data("c", c)?;
        require_shape("c", b.shape(), c.shape())
    })?;
    apply_value(c, a, b, kernel);
    Ok(())
}

/// `c[r] = kernel(a, b[r])` for every row `r`: a vector broadcast across rows.
fn rows<B: Shaped>(
    op: &'static str,
    c: &mut B,
    a: &Vector<B::Elem>,
    b: &B,
    kernel: BinaryKernel<B::Elem>,
) -> Result<()> {
    checked(op, || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_data("c", c)?;
        require_size("a", b.row_size(), a.len())?;
        require_shape("c", b.shape(), c.shape())
    })?;
    for r in 0..b.total_rows() {
        kernel(a.as_slice(), b.row(r), c.row_mut(r));
    }
    Ok(())
}

/// `c[s] = kernel(a, b[s])` for every slab `s`: a matrix broadcast across slabs.
fn slabs<T: Element>(
    op: &'static str,
    c: &mut Tensor<T>,
    a: &Matrix<T>,
    b: &Tensor<T>,
    kernel: BinaryKernel<T>,
) -> Result<()> {
    checked(op, || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_data("c", c)?;
        require_shape("a", vec![b.rows(), b.cols()], a.shape())?;
        require_shape("c", b.shape(), c.shape())
    })?;
    let rows = b.rows();
    for r in 0..b.total_rows() {
        kernel(a.row(r % rows), b.row(r), c.row_mut(r));
    }
    Ok(())
}

// =============================================================================
// Saturating add
// =============================================================================

/// `c = saturate(a + b)`, elementwise over operands of the same shape.
pub fn cpu_adds<B>(c: &mut B, a: &B, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: AddsDispatch,
{
    binary("cpu_adds", c, a, b, dispatch::adds::<B::Elem>)
}

/// `c = saturate(a + b)` for a scalar `a` broadcast over `b`.
pub fn cpu_adds_value<B>(c: &mut B, a: B::Elem, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: AddsDispatch,
{
    value("cpu_adds_value", c, a, b, dispatch::adds_value::<B::Elem>)
}

/// `c[r] = saturate(a + b[r])`: the vector `a` added to every row of `b`.
///
/// `a.len()` must equal `b.row_size()`. Works for matrices and tensors.
pub fn cpu_adds_rows<B>(c: &mut B, a: &Vector<B::Elem>, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: AddsDispatch,
{
    rows("cpu_adds_rows", c, a, b, dispatch::adds::<B::Elem>)
}

/// `c[s] = saturate(a + b[s])`: the matrix `a` added to every slab of `b`.
pub fn cpu_adds_slabs<T: AddsDispatch>(
    c: &mut Tensor<T>,
    a: &Matrix<T>,
    b: &Tensor<T>,
) -> Result<()> {
    slabs("cpu_adds_slabs", c, a, b, dispatch::adds::<T>)
}

// =============================================================================
// Multiply
// =============================================================================

/// `c = a * b`, elementwise over float operands of the same shape.
pub fn cpu_mul<B>(c: &mut B, a: &B, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: MulDispatch,
{
    binary("cpu_mul", c, a, b, dispatch::mul::<B::Elem>)
}

/// `c = a * b` for a scalar `a` broadcast over `b`.
pub fn cpu_mul_value<B>(c: &mut B, a: B::Elem, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: MulDispatch,
{
    value("cpu_mul_value", c, a, b, dispatch::mul_value::<B::Elem>)
}

/// `c[r] = a * b[r]`: the vector `a` multiplied into every row of `b`.
pub fn cpu_mul_rows<B>(c: &mut B, a: &Vector<B::Elem>, b: &B) -> Result<()>
where
    B: Shaped,
    B::Elem: MulDispatch,
{
    rows("cpu_mul_rows", c, a, b, dispatch::mul::<B::Elem>)
}

/// `c[s] = a * b[s]`: the matrix `a` multiplied into every slab of `b`.
pub fn cpu_mul_slabs<T: MulDispatch>(
    c: &mut Tensor<T>,
    a: &Matrix<T>,
    b: &Tensor<T>,
) -> Result<()> {
    slabs("cpu_mul_slabs", c, a, b, dispatch::mul::<T>)
}
