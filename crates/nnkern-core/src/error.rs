//! Error types for the shape-checked primitive API.
//!
//! Kernels never fail. Every precondition is checked once by the `cpu_*`
//! entry points before any output is written, and a violation is reported
//! with the offending operand and the shapes involved.

use thiserror::Error;

use crate::buffer::BufferKind;
use crate::ops::ReduceMode;

/// Precondition violations reported by the `cpu_*` primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operand has no elements.
    #[error("{kind} not initialized: operand `{operand}` is empty")]
    NotInitialized {
        /// Name of the operand (`a`, `b`, `c`, ...).
        operand: &'static str,
        /// Container kind of the operand.
        kind: BufferKind,
    },

    /// Flat element counts disagree.
    #[error("invalid size for `{operand}`: expected {expected} elements, got {actual}")]
    InvalidSize {
        /// Name of the operand.
        operand: &'static str,
        /// Required element count.
        expected: usize,
        /// Element count found.
        actual: usize,
    },

    /// Structured shapes disagree where broadcasting needs a specific relationship.
    #[error("invalid shape for `{operand}`: expected {expected:?}, got {actual:?}")]
    InvalidShape {
        /// Name of the operand.
        operand: &'static str,
        /// Required shape.
        expected: Vec<usize>,
        /// Shape found.
        actual: Vec<usize>,
    },

    /// A reduce mode is not defined for the element-type pairing.
    #[error("invalid mode parameters: {mode} is not defined for {from} -> {to}")]
    InvalidModeParameter {
        /// Requested mode.
        mode: ReduceMode,
        /// Source element type.
        from: &'static str,
        /// Accumulator element type.
        to: &'static str,
    },

    /// A required base buffer has no storage to point into.
    #[error("invalid pointer: `{operand}` has no backing storage")]
    InvalidPointer {
        /// Name of the operand.
        operand: &'static str,
    },

    /// A tile count passed to a repeat primitive is zero.
    #[error("invalid repeat parameter: `{axis}` count must be non-zero")]
    InvalidRepeatParameter {
        /// Axis whose count was zero.
        axis: &'static str,
    },

    /// A mapping index points outside its base buffer.
    #[error("mapping index {index} out of range for base of length {len}")]
    IndexOutOfRange {
        /// Offending index.
        index: i64,
        /// Length of the base buffer.
        len: usize,
    },
}

/// Result type alias for `cpu_*` primitives.
pub type Result<T> = std::result::Result<T, Error>;
