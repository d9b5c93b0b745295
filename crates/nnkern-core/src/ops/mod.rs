//! Shape-checked primitive API.
//!
//! The `cpu_*` functions are the only entry points meant for layer code.
//! Each one validates its operands in a fixed order:
//!
//! 1. emptiness of every operand, inputs before the output (`NotInitialized`)
//! 2. mode and parameter validity (`InvalidModeParameter`, `InvalidPointer`,
//!    `InvalidRepeatParameter`)
//! 3. shape and size compatibility (`InvalidShape`, `InvalidSize`,
//!    `IndexOutOfRange`)
//!
//! and only then hands the storage to [`crate::dispatch`]. A failed call
//! leaves every output untouched. Outputs are never resized: callers size
//! them up front.
//!
//! The output operand comes first: `c` for elementwise and GEMM ops, `b` for
//! reductions and transpose.

use std::fmt;

use crate::buffer::Shaped;
use crate::error::{Error, Result};

mod elementwise;
mod gemm;
mod mapping;
mod reduce;
mod repeat;
mod transpose;

pub use elementwise::{
    cpu_adds, cpu_adds_rows, cpu_adds_slabs, cpu_adds_value, cpu_mul, cpu_mul_rows,
    cpu_mul_slabs, cpu_mul_value,
};
pub use gemm::{
    cpu_addmm, cpu_addmmt, cpu_addtvv, cpu_addvv, cpu_gemm, cpu_gemm_bias, cpu_gemmt, cpu_gevv,
    cpu_gtvv,
};
pub use mapping::cpu_mapping;
pub use reduce::{cpu_reduce, cpu_reduce_row_sum, ReduceTarget};
pub use repeat::{cpu_broadcast_rows, cpu_repeat, cpu_repeat_matrix, cpu_repeat_tensor};
pub use transpose::cpu_transpose;

/// Reduction selected by [`cpu_reduce`]: an axis and an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceMode {
    /// Minimum of each row.
    RowMin,
    /// Maximum of each row.
    RowMax,
    /// Sum of each row.
    RowSum,
    /// Mean of each row.
    RowAvg,
    /// Minimum of each column.
    ColMin,
    /// Maximum of each column.
    ColMax,
    /// Sum of each column.
    ColSum,
    /// Mean of each column.
    ColAvg,
}

impl ReduceMode {
    /// Every mode.
    pub const ALL: [Self; 8] = [
        Self::RowMin,
        Self::RowMax,
        Self::RowSum,
        Self::RowAvg,
        Self::ColMin,
        Self::ColMax,
        Self::ColSum,
        Self::ColAvg,
    ];

    /// Whether the mode reduces along columns.
    #[must_use]
    pub const fn is_column(self) -> bool {
        matches!(
            self,
            Self::ColMin | Self::ColMax | Self::ColSum | Self::ColAvg
        )
    }

    /// Whether the mode averages.
    #[must_use]
    pub const fn is_average(self) -> bool {
        matches!(self, Self::RowAvg | Self::ColAvg)
    }
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RowMin => "reduce_row_min",
            Self::RowMax => "reduce_row_max",
            Self::RowSum => "reduce_row_sum",
            Self::RowAvg => "reduce_row_avg",
            Self::ColMin => "reduce_col_min",
            Self::ColMax => "reduce_col_max",
            Self::ColSum => "reduce_col_sum",
            Self::ColAvg => "reduce_col_avg",
        })
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

/// Runs the checks for `op`, logging a rejection at debug level.
fn checked(op: &'static str, validate: impl FnOnce() -> Result<()>) -> Result<()> {
    validate().inspect_err(|err| tracing::debug!(op, error = %err, "operands rejected"))
}

fn require_data<B: Shaped>(operand: &'static str, buffer: &B) -> Result<()> {
    if buffer.is_empty() {
        return Err(Error::NotInitialized {
            operand,
            kind: B::KIND,
        });
    }
    Ok(())
}

fn require_shape(operand: &'static str, expected: Vec<usize>, actual: Vec<usize>) -> Result<()> {
    if expected != actual {
        return Err(Error::InvalidShape {
            operand,
            expected,
            actual,
        });
    }
    Ok(())
}

fn require_size(operand: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::InvalidSize {
            operand,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Sets every logical element of `c` to zero, leaving row padding alone.
fn fill_zero<B: Shaped>(c: &mut B) {
    for r in 0..c.total_rows() {
        c.row_mut(r).fill(<B::Elem>::default());
    }
}
