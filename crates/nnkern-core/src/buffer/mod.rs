//! Shaped buffers consumed by the `cpu_*` primitives.
//!
//! These are deliberately thin: contiguous row-major storage plus shape
//! queries. A matrix or tensor row may be padded (`row_stride() > row_size()`),
//! which is why every kernel that walks rows receives strides explicitly.

use std::fmt;

use crate::element::Element;

mod matrix;
mod tensor;
mod vector;

pub use matrix::Matrix;
pub use tensor::Tensor;
pub use vector::Vector;

/// Container kind, used to label `NotInitialized` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// One-dimensional buffer.
    Vector,
    /// Two-dimensional buffer.
    Matrix,
    /// Batch of matrices.
    Tensor,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vector => "vector",
            Self::Matrix => "matrix",
            Self::Tensor => "tensor",
        })
    }
}

/// Shape and storage access shared by every buffer kind.
///
/// Storage is laid out as `batch()` slabs of `rows()` rows; row `r` of the
/// flattened `total_rows()` sequence starts at `r * row_stride()`.
pub trait Shaped {
    /// Element type.
    type Elem: Element;

    /// Container kind.
    const KIND: BufferKind;

    /// Rows per matrix slab.
    fn rows(&self) -> usize;

    /// Elements per row.
    fn row_size(&self) -> usize;

    /// Distance in elements between the starts of consecutive rows.
    fn row_stride(&self) -> usize;

    /// Number of matrix slabs.
    fn batch(&self) -> usize {
        1
    }

    /// Raw storage, including row padding.
    fn data(&self) -> &[Self::Elem];

    /// Mutable raw storage, including row padding.
    fn data_mut(&mut self) -> &mut [Self::Elem];

    /// Logical dimensions, outermost first.
    fn shape(&self) -> Vec<usize>;

    /// `rows() * row_size()`.
    fn matrix_size(&self) -> usize {
        self.rows() * self.row_size()
    }

    /// Total number of logical elements.
    fn size(&self) -> usize {
        self.batch() * self.matrix_size()
    }

    /// Rows across all slabs.
    fn total_rows(&self) -> usize {
        self.batch() * self.rows()
    }

    /// Whether the buffer holds no elements.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether rows are packed without padding.
    fn is_contiguous(&self) -> bool {
        self.row_stride() == self.row_size()
    }

    /// Row `r` of the flattened row sequence.
    fn row(&self, r: usize) -> &[Self::Elem] {
        let start = r * self.row_stride();
        let len = self.row_size();
        &self.data()[start..start + len]
    }

    /// Mutable row `r` of the flattened row sequence.
    fn row_mut(&mut self, r: usize) -> &mut [Self::Elem] {
        let start = r * self.row_stride();
        let len = self.row_size();
        &mut self.data_mut()[start..start + len]
    }

    /// Storage span that covers every logical element: up to the end of the last row.
    fn span(&self) -> usize {
        match self.total_rows() {
            0 => 0,
            rows => (rows - 1) * self.row_stride() + self.row_size(),
        }
    }

    /// Logical elements in row-major order, without padding.
    fn to_vec(&self) -> Vec<Self::Elem> {
        let mut out = Vec::with_capacity(self.size());
        for r in 0..self.total_rows() {
            out.extend_from_slice(self.row(r));
        }
        out
    }
}
