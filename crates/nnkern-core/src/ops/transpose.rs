use super::{checked, require_data, require_shape};
use crate::buffer::{Matrix, Shaped};
use crate::dispatch;
use crate::element::Element;
use crate::error::Result;

/// `b[j][i] = a[i][j]`: `b` must be `a.cols() × a.rows()`.
///
/// Bit-exact for every element type; the transpose only moves data.
pub fn cpu_transpose<T: Element>(b: &mut Matrix<T>, a: &Matrix<T>) -> Result<()> {
    checked("cpu_transpose", || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_shape("b", vec![a.cols(), a.rows()], b.shape())
    })?;
    let (rsa, rsb) = (a.row_stride(), b.row_stride());
    dispatch::transpose(a.rows(), a.cols(), a.data(), rsa, b.data_mut(), rsb);
    Ok(())
}
