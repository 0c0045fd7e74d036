//! Shape type: dimensions of a tensor

use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// Stack allocation threshold for dimensions
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor, row-major
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Split into `(rows, axis)` around the innermost dimension.
    ///
    /// Every leading dimension folds into `rows`. A 0-d shape is one row of
    /// one element.
    pub fn rows_and_axis(&self) -> (usize, usize) {
        match self.0.split_last() {
            Some((&axis, lead)) => (lead.iter().product(), axis),
            None => (1, 1),
        }
    }

    /// Copy of this shape with the innermost dimension replaced.
    pub fn with_last(&self, len: usize) -> Shape {
        let mut dims = self.0.clone();
        if let Some(last) = dims.last_mut() {
            *last = len;
        }
        Shape(dims)
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}
