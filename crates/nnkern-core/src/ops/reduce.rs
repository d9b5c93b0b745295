//! Row sums and the composite `cpu_reduce`.

use super::{checked, require_data, require_size, ReduceMode};
use crate::buffer::{Matrix, Shaped, Vector};
use crate::dispatch::{self, MulDispatch, RowSumDispatch};
use crate::element::{Element, FloatElement};
use crate::error::{Error, Result};

/// Accumulator types [`cpu_reduce`] can reduce into.
///
/// Averages are only defined for float accumulators.
pub trait ReduceTarget<T1: Element>: RowSumDispatch<T1> {
    /// Whether `RowAvg`/`ColAvg` are defined for this pairing.
    const AVERAGES: bool;

    /// Divides every value by `count`.
    fn scale_by_count(values: &mut [Self], count: usize);
}

macro_rules! impl_int_target {
    ($($src:ty => $acc:ty),*) => {
        $(
            impl ReduceTarget<$src> for $acc {
                const AVERAGES: bool = false;

                fn scale_by_count(_values: &mut [Self], _count: usize) {}
            }
        )*
    };
}

impl_int_target!(i8 => i32, i16 => i32, i32 => i32, u8 => u32, u16 => u32, u32 => u32);

macro_rules! impl_float_target {
    ($($src:ty => $acc:ty),*) => {
        $(
            impl ReduceTarget<$src> for $acc {
                const AVERAGES: bool = true;

                fn scale_by_count(values: &mut [Self], count: usize) {
                    scale(values, count);
                }
            }
        )*
    };
}

impl_float_target!(f32 => f32, f32 => f64, f64 => f64);

fn scale<T: FloatElement + MulDispatch>(values: &mut [T], count: usize) {
    let sums = values.to_vec();
    dispatch::mul_value(T::recip_count(count), &sums, values);
}

/// `b[i] += Σ_j a[i][j]` over every row of `a` (all slabs of a tensor).
///
/// Accumulates into `b`, which the caller initializes. Values are widened to
/// the accumulator type before they are summed.
pub fn cpu_reduce_row_sum<B, T2>(b: &mut Vector<T2>, a: &B) -> Result<()>
where
    B: Shaped,
    T2: RowSumDispatch<B::Elem>,
{
    checked("cpu_reduce_row_sum", || {
        require_data("a", a)?;
        require_data("b", b)?;
        require_size("b", a.total_rows(), b.len())
    })?;
    dispatch::reduce_row_sum(
        a.total_rows(),
        a.row_size(),
        a.data(),
        a.row_stride(),
        b.as_mut_slice(),
    );
    Ok(())
}

/// Reduces `a` along rows or columns into `b`, overwriting it.
///
/// Column modes transpose `a` and reduce its rows. Averages are the sum
/// scaled by `1 / count`; they fail with [`Error::InvalidModeParameter`] for
/// integer accumulators.
pub fn cpu_reduce<T1, T2>(b: &mut Vector<T2>, a: &Matrix<T1>, mode: ReduceMode) -> Result<()>
where
    T1: Element,
    T2: ReduceTarget<T1>,
{
    checked("cpu_reduce", || {
        require_data("a", a)?;
        require_data("b", b)?;
        if mode.is_average() && !T2::AVERAGES {
            return Err(Error::InvalidModeParameter {
                mode,
                from: T1::NAME,
                to: T2::NAME,
            });
        }
        let expected = if mode.is_column() { a.cols() } else { a.rows() };
        require_size("b", expected, b.len())
    })?;

    if mode.is_column() {
        let mut t = Matrix::<T1>::zeros(a.cols(), a.rows());
        let rsb = t.row_stride();
        dispatch::transpose(a.rows(), a.cols(), a.data(), a.row_stride(), t.data_mut(), rsb);
        reduce_rows(b.as_mut_slice(), &t, mode);
    } else {
        reduce_rows(b.as_mut_slice(), a, mode);
    }
    Ok(())
}

fn reduce_rows<T1, T2>(b: &mut [T2], a: &Matrix<T1>, mode: ReduceMode)
where
    T1: Element,
    T2: ReduceTarget<T1>,
{
    let (m, n, rsa) = (a.rows(), a.cols(), a.row_stride());
    match mode {
        ReduceMode::RowMin | ReduceMode::ColMin => {
            dispatch::reduce_row_min(m, n, a.data(), rsa, b);
        }
        ReduceMode::RowMax | ReduceMode::ColMax => {
            dispatch::reduce_row_max(m, n, a.data(), rsa, b);
        }
        ReduceMode::RowSum | ReduceMode::ColSum => {
            b.fill(T2::default());
            dispatch::reduce_row_sum(m, n, a.data(), rsa, b);
        }
        ReduceMode::RowAvg | ReduceMode::ColAvg => {
            b.fill(T2::default());
            dispatch::reduce_row_sum(m, n, a.data(), rsa, b);
            T2::scale_by_count(b, n);
        }
    }
}
