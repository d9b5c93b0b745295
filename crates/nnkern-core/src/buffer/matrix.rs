use crate::element::Element;
use crate::error::{Error, Result};

use super::{BufferKind, Shaped};

/// A row-major matrix whose rows may be padded to `row_stride` elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    stride: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Creates a `rows × cols` matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            stride: cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Creates a `rows × cols` matrix filled with `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            stride: cols,
            data: vec![value; rows * cols],
        }
    }

    /// Creates a zeroed `rows × cols` matrix with rows padded to `stride` elements.
    pub fn with_row_stride(rows: usize, cols: usize, stride: usize) -> Result<Self> {
        if stride < cols {
            return Err(Error::InvalidShape {
                operand: "stride",
                expected: vec![cols],
                actual: vec![stride],
            });
        }
        Ok(Self {
            rows,
            cols,
            stride,
            data: vec![T::default(); rows * stride],
        })
    }

    /// Wraps dense row-major storage of exactly `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidSize {
                operand: "data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            stride: cols,
            data,
        })
    }

    /// Number of columns (same as `row_size()`).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(r, c)`.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> T {
        assert!(r < self.rows && c < self.cols, "matrix index out of bounds");
        self.data[r * self.stride + c]
    }

    /// Sets the element at `(r, c)`.
    pub fn set(&mut self, r: usize, c: usize, value: T) {
        assert!(r < self.rows && c < self.cols, "matrix index out of bounds");
        self.data[r * self.stride + c] = value;
    }
}

impl<T: Element> Shaped for Matrix<T> {
    type Elem = T;
    const KIND: BufferKind = BufferKind::Matrix;

    fn rows(&self) -> usize {
        self.rows
    }

    fn row_size(&self) -> usize {
        self.cols
    }

    fn row_stride(&self) -> usize {
        self.stride
    }

    fn data(&self) -> &[T] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.rows, self.cols]
    }
}
