//! Mapping between logical tensor indices and flat storage offsets.

use smallvec::SmallVec;

use crate::errors::TensorError;

/// Inline capacity for shape and stride arrays. Tensors of rank above this
/// spill to the heap.
type Dims = SmallVec<[usize; 8]>;

/// Return true if `axes` is a valid permutation of dimensions for a tensor
/// of rank `ndim`.
pub fn is_valid_permutation(ndim: usize, axes: &[usize]) -> bool {
    if axes.len() != ndim {
        return false;
    }
    let mut seen = vec![false; ndim];
    for &axis in axes {
        if axis >= ndim || seen[axis] {
            return false;
        }
        seen[axis] = true;
    }
    true
}

/// Validate that a shape is non-empty and every dimension is positive.
pub(crate) fn check_shape(shape: &[usize]) -> Result<(), TensorError> {
    if shape.is_empty() || shape.iter().any(|&d| d == 0) {
        Err(TensorError::BadShape)
    } else {
        Ok(())
    }
}

/// Compute row-major strides for a contiguous buffer of the given shape:
/// `strides[i] = product(shape[i+1..])`.
fn contiguous_strides(shape: &[usize]) -> Dims {
    let mut strides: Dims = SmallVec::from_slice(shape);
    let mut product = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = product;
        product *= shape[i];
    }
    strides
}

/// Describes how a flat storage buffer is addressed as an n-dimensional
/// structure: a shape, one stride per axis, and the storage offset of the
/// layout's logical element 0.
///
/// An empty shape is the rank-0 (scalar) case and addresses exactly one
/// element. Shape and strides always have the same length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Dims,
    strides: Dims,
    offset: usize,
}

impl Layout {
    /// Create a contiguous row-major layout with offset 0.
    pub fn from_shape(shape: &[usize]) -> Layout {
        Layout {
            shape: SmallVec::from_slice(shape),
            strides: contiguous_strides(shape),
            offset: 0,
        }
    }

    /// Create a layout from explicit shape, strides and offset.
    ///
    /// Callers are responsible for ensuring `shape` and `strides` have equal
    /// length and that the addressed range fits the storage the layout will
    /// be paired with.
    pub(crate) fn from_parts(shape: Dims, strides: Dims, offset: usize) -> Layout {
        debug_assert_eq!(shape.len(), strides.len());
        Layout {
            shape,
            strides,
            offset,
        }
    }

    /// Move this layout's window to a new storage offset.
    pub(crate) fn with_offset(mut self, offset: usize) -> Layout {
        self.offset = offset;
        self
    }

    /// Number of axes. 0 for scalars.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Storage offset of the layout's logical element 0.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements addressed: the product of the shape. An empty
    /// shape yields 1 (the scalar case).
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Always false: every layout, including the scalar one, addresses at
    /// least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Size of the dimension `axis`. Panics if `axis >= rank`; callers
    /// validate first.
    pub fn size(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Length of the flat storage range this layout addresses, starting at
    /// [`offset`](Self::offset): `Σ (shape[i]-1)·strides[i] + 1`.
    ///
    /// Equals [`len`](Self::len) for contiguous layouts and for permutations
    /// of contiguous layouts; exceeds it when gaps exist between addressed
    /// elements.
    pub fn span_len(&self) -> usize {
        self.shape
            .iter()
            .zip(&self.strides)
            .map(|(&size, &stride)| (size - 1) * stride)
            .sum::<usize>()
            + 1
    }

    /// Return true if the logical element order matches storage order with
    /// no gaps.
    pub fn is_contiguous(&self) -> bool {
        let mut product = 1;
        for (&size, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if stride != product {
                return false;
            }
            product *= size;
        }
        true
    }

    /// Return true if this layout's shape can be broadcast to `target`.
    ///
    /// Dimensions are compared from the trailing axis backward; a source
    /// dimension matches if it equals the target dimension, is 1, or does
    /// not exist (rank deficit, treated as an implicit leading 1). Returns
    /// false, rather than an error, for an empty target, a zero target
    /// dimension, or a source rank larger than the target's.
    pub fn can_broadcast_to(&self, target: &[usize]) -> bool {
        if check_shape(target).is_err() || self.rank() > target.len() {
            return false;
        }
        let skip = target.len() - self.rank();
        self.shape
            .iter()
            .zip(&target[skip..])
            .all(|(&src, &dst)| src == dst || src == 1)
    }

    /// Iterate over the absolute storage offsets of this layout's elements
    /// in logical row-major order. Yields exactly [`len`](Self::len) items.
    pub fn offsets(&self) -> Offsets<'_> {
        Offsets {
            layout: self,
            index: SmallVec::from_elem(0, self.rank()),
            current: self.offset,
            remaining: self.len(),
        }
    }
}

/// Row-major iterator over the storage offsets addressed by a [Layout].
///
/// Works like an odometer: the trailing axis turns fastest, and the running
/// offset is updated incrementally instead of being recomputed per index.
pub struct Offsets<'a> {
    layout: &'a Layout,
    index: Dims,
    current: usize,
    remaining: usize,
}

impl Iterator for Offsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.current;
        self.remaining -= 1;

        for axis in (0..self.layout.rank()).rev() {
            self.index[axis] += 1;
            self.current += self.layout.strides[axis];
            if self.index[axis] < self.layout.shape[axis] {
                break;
            }
            self.current -= self.layout.strides[axis] * self.layout.shape[axis];
            self.index[axis] = 0;
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets<'_> {}

#[cfg(test)]
mod tests {
    use ndvec_testing::TestCases;
    use smallvec::smallvec;

    use super::{is_valid_permutation, Layout};

    #[test]
    fn test_contiguous_strides() {
        let layout = Layout::from_shape(&[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert_eq!(layout.len(), 24);
        assert_eq!(layout.span_len(), 24);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_scalar_layout() {
        let layout = Layout::from_shape(&[]);
        assert_eq!(layout.rank(), 0);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.span_len(), 1);
        assert!(layout.is_contiguous());
        assert_eq!(layout.offsets().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn test_offsets_row_major() {
        let layout = Layout::from_shape(&[2, 3]);
        assert_eq!(layout.offsets().collect::<Vec<_>>(), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_offsets_permuted() {
        // Transpose of a 2x3 layout: logical order walks columns first.
        let layout = Layout::from_parts(smallvec![3, 2], smallvec![1, 3], 0);
        assert_eq!(layout.offsets().collect::<Vec<_>>(), [0, 3, 1, 4, 2, 5]);
        assert_eq!(layout.span_len(), 6);
        assert!(!layout.is_contiguous());
    }

    #[test]
    fn test_offsets_with_offset() {
        let layout = Layout::from_parts(smallvec![2, 2], smallvec![3, 1], 3);
        assert_eq!(layout.offsets().collect::<Vec<_>>(), [3, 4, 6, 7]);
        assert_eq!(layout.span_len(), 5);
    }

    #[test]
    fn test_can_broadcast_to() {
        #[derive(Debug)]
        struct Case {
            shape: Vec<usize>,
            target: Vec<usize>,
            expected: bool,
        }

        let cases = [
            Case {
                shape: vec![10],
                target: vec![10],
                expected: true,
            },
            Case {
                shape: vec![10],
                target: vec![3, 10],
                expected: true,
            },
            Case {
                shape: vec![10],
                target: vec![7, 1, 10],
                expected: true,
            },
            Case {
                shape: vec![10],
                target: vec![5],
                expected: false,
            },
            Case {
                shape: vec![10, 1],
                target: vec![10, 5],
                expected: true,
            },
            Case {
                shape: vec![2, 3],
                target: vec![3],
                expected: false,
            },
            Case {
                shape: vec![3],
                target: vec![],
                expected: false,
            },
            Case {
                shape: vec![3],
                target: vec![0, 3],
                expected: false,
            },
            // Scalars broadcast to any well-formed shape.
            Case {
                shape: vec![],
                target: vec![4, 2],
                expected: true,
            },
        ];

        cases.test_each(|case| {
            let layout = Layout::from_shape(&case.shape);
            assert_eq!(layout.can_broadcast_to(&case.target), case.expected);
        });
    }

    #[test]
    fn test_is_valid_permutation() {
        assert!(is_valid_permutation(3, &[2, 0, 1]));
        assert!(is_valid_permutation(0, &[]));
        assert!(!is_valid_permutation(3, &[0, 1]));
        assert!(!is_valid_permutation(3, &[0, 1, 1]));
        assert!(!is_valid_permutation(3, &[0, 1, 3]));
        assert!(is_valid_permutation(17, &(0..17).collect::<Vec<_>>()));
        assert!(!is_valid_permutation(17, &vec![0; 17]));
    }
}
