use crate::element::Element;

use super::{BufferKind, Shaped};

/// A one-dimensional buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T: Element> Vector<T> {
    /// Creates a vector of `len` default (zero) elements.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![T::default(); len],
        }
    }

    /// Creates a vector of `len` copies of `value`.
    #[must_use]
    pub fn filled(len: usize, value: T) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    /// Wraps existing storage.
    #[must_use]
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the vector and returns its storage.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Element> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T: Element> Shaped for Vector<T> {
    type Elem = T;
    const KIND: BufferKind = BufferKind::Vector;

    fn rows(&self) -> usize {
        usize::from(!self.data.is_empty())
    }

    fn row_size(&self) -> usize {
        self.data.len()
    }

    fn row_stride(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[T] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.data.len()]
    }
}
