use crate::element::Element;
use crate::error::{Error, Result};

use super::{BufferKind, Shaped};

/// A batch of equally shaped row-major matrices ("slabs").
///
/// Slabs are stored back to back, so the rows of all slabs form one uniformly
/// strided sequence of `batch * rows` rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tensor<T> {
    batch: usize,
    rows: usize,
    cols: usize,
    stride: usize,
    data: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Creates a `batch × rows × cols` tensor of zeros.
    #[must_use]
    pub fn zeros(batch: usize, rows: usize, cols: usize) -> Self {
        Self {
            batch,
            rows,
            cols,
            stride: cols,
            data: vec![T::default(); batch * rows * cols],
        }
    }

    /// Creates a zeroed tensor with rows padded to `stride` elements.
    pub fn with_row_stride(batch: usize, rows: usize, cols: usize, stride: usize) -> Result<Self> {
        if stride < cols {
            return Err(Error::InvalidShape {
                operand: "stride",
                expected: vec![cols],
                actual: vec![stride],
            });
        }
        Ok(Self {
            batch,
            rows,
            cols,
            stride,
            data: vec![T::default(); batch * rows * stride],
        })
    }

    /// Wraps dense storage of exactly `batch * rows * cols` elements.
    pub fn from_vec(batch: usize, rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let expected = batch * rows * cols;
        if data.len() != expected {
            return Err(Error::InvalidSize {
                operand: "data",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            batch,
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

    /// Element at `(slab, r, c)`.
    #[must_use]
    pub fn get(&self, slab: usize, r: usize, c: usize) -> T {
        assert!(
            slab < self.batch && r < self.rows && c < self.cols,
            "tensor index out of bounds"
        );
        self.data[(slab * self.rows + r) * self.stride + c]
    }

    /// Sets the element at `(slab, r, c)`.
    pub fn set(&mut self, slab: usize, r: usize, c: usize, value: T) {
        assert!(
            slab < self.batch && r < self.rows && c < self.cols,
            "tensor index out of bounds"
        );
        self.data[(slab * self.rows + r) * self.stride + c] = value;
    }
}

impl<T: Element> Shaped for Tensor<T> {
    type Elem = T;
    const KIND: BufferKind = BufferKind::Tensor;

    fn rows(&self) -> usize {
        self.rows
    }

    fn row_size(&self) -> usize {
        self.cols
    }

    fn row_stride(&self) -> usize {
        self.stride
    }

    fn batch(&self) -> usize {
        self.batch
    }

    fn data(&self) -> &[T] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.batch, self.rows, self.cols]
    }
}
