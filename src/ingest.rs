//! Conversion of heterogeneous inputs into flat buffer + shape pairs.
//!
//! [Source] is a closed set of input kinds resolved by one dispatch at the
//! ingestion boundary; the core never sees anything but the resulting
//! `(Vec<T>, shape)` pair. `From` impls cover scalars, vectors, slices,
//! arbitrarily nested arrays and tensors of any other supported element
//! type, so most callers go through
//! [`Tensor::from_source`](crate::Tensor::from_source) without naming
//! `Source` at all.

use crate::errors::TensorError;
use crate::num::Elem;
use crate::tensor::Tensor;

/// An ingestible input: a scalar, a flat sequence, nested sequences, or the
/// contents of a foreign tensor (one with a different element type).
pub enum Source<T: Elem> {
    Scalar(T),
    Flat(Vec<T>),
    Nested(Vec<Source<T>>),
    /// Flat buffer plus shape taken from a tensor of another element type,
    /// already converted.
    Foreign(Vec<T>, Vec<usize>),
}

impl<T: Elem> Source<T> {
    /// Resolve this source into a flat row-major buffer and its shape.
    ///
    /// Fails with [`UnwrapFailure`](TensorError::UnwrapFailure) if any
    /// sequence is empty, nesting is ragged (siblings of unequal shape), or
    /// a foreign buffer does not match its declared shape.
    pub fn resolve(self) -> Result<(Vec<T>, Vec<usize>), TensorError> {
        match self {
            Source::Scalar(x) => Ok((vec![x], Vec::new())),
            Source::Flat(data) => {
                if data.is_empty() {
                    return Err(TensorError::UnwrapFailure);
                }
                let shape = vec![data.len()];
                Ok((data, shape))
            }
            Source::Nested(children) => {
                let n = children.len();
                let mut children = children.into_iter();
                let Some(first) = children.next() else {
                    return Err(TensorError::UnwrapFailure);
                };

                let (mut data, child_shape) = first.resolve()?;
                data.reserve((n - 1) * data.len());
                for child in children {
                    let (child_data, shape) = child.resolve()?;
                    if shape != child_shape {
                        return Err(TensorError::UnwrapFailure);
                    }
                    data.extend(child_data);
                }

                let mut shape = Vec::with_capacity(child_shape.len() + 1);
                shape.push(n);
                shape.extend(child_shape);
                Ok((data, shape))
            }
            Source::Foreign(data, shape) => {
                let expected: usize = shape.iter().product();
                if data.len() != expected || shape.iter().any(|&d| d == 0) {
                    return Err(TensorError::UnwrapFailure);
                }
                Ok((data, shape))
            }
        }
    }
}

impl<T: Elem> From<T> for Source<T> {
    fn from(value: T) -> Source<T> {
        Source::Scalar(value)
    }
}

impl<T: Elem> From<&[T]> for Source<T> {
    fn from(values: &[T]) -> Source<T> {
        Source::Flat(values.to_vec())
    }
}

impl<T: Elem, S: Into<Source<T>>> From<Vec<S>> for Source<T> {
    fn from(values: Vec<S>) -> Source<T> {
        Source::Nested(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Elem, S: Into<Source<T>>, const N: usize> From<[S; N]> for Source<T> {
    fn from(values: [S; N]) -> Source<T> {
        Source::Nested(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Elem, U: Elem> From<&Tensor<U>> for Source<T> {
    fn from(tensor: &Tensor<U>) -> Source<T> {
        let data = tensor
            .ravel()
            .into_iter()
            .map(|x| T::from_f64(x.to_f64()))
            .collect();
        Source::Foreign(data, tensor.shape().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::TensorError;
    use crate::Tensor;

    use super::Source;

    #[test]
    fn test_scalar() {
        let (data, shape) = Source::from(5i32).resolve().unwrap();
        assert_eq!(data, [5]);
        assert!(shape.is_empty());
    }

    #[test]
    fn test_flat() {
        let (data, shape) = Source::from(vec![1i32, 2, 3]).resolve().unwrap();
        assert_eq!(data, [1, 2, 3]);
        assert_eq!(shape, [3]);

        let (data, shape) = Source::from([1.0f32, 2.0]).resolve().unwrap();
        assert_eq!(data, [1.0, 2.0]);
        assert_eq!(shape, [2]);

        let slice: &[u8] = &[7, 8];
        let (data, shape) = Source::from(slice).resolve().unwrap();
        assert_eq!(data, [7, 8]);
        assert_eq!(shape, [2]);
    }

    #[test]
    fn test_nested() {
        let (data, shape) = Source::from([[1i32, 2, 3], [4, 5, 6]]).resolve().unwrap();
        assert_eq!(data, [1, 2, 3, 4, 5, 6]);
        assert_eq!(shape, [2, 3]);

        let (data, shape) = Source::from([[[1i32, 2]], [[3, 4]], [[5, 6]]])
            .resolve()
            .unwrap();
        assert_eq!(data, [1, 2, 3, 4, 5, 6]);
        assert_eq!(shape, [3, 1, 2]);
    }

    #[test]
    fn test_empty_fails() {
        let empty: Vec<i32> = Vec::new();
        assert_eq!(
            Source::from(empty).resolve().err(),
            Some(TensorError::UnwrapFailure)
        );
    }

    #[test]
    fn test_ragged_fails() {
        let ragged: Source<i32> =
            Source::Nested(vec![Source::from(vec![1, 2]), Source::from(vec![3])]);
        assert_eq!(ragged.resolve().err(), Some(TensorError::UnwrapFailure));

        // A scalar next to a sequence is also ragged.
        let mixed: Source<i32> = Source::Nested(vec![Source::from(1), Source::from(vec![2, 3])]);
        assert_eq!(mixed.resolve().err(), Some(TensorError::UnwrapFailure));
    }

    #[test]
    fn test_foreign_tensor() {
        let t = Tensor::from_data(&[2, 2], vec![1i32, 2, 3, 4]).unwrap();
        let (data, shape) = Source::<f64>::from(&t).resolve().unwrap();
        assert_eq!(data, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shape, [2, 2]);
    }

    #[test]
    fn test_tensor_from_source() {
        let t = Tensor::from_source([[1u8, 2], [3, 4]]).unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.ravel(), [1, 2, 3, 4]);

        let s = Tensor::from_source(3.5f32).unwrap();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.item(), Some(3.5));

        let from_foreign: Tensor<f32> = Tensor::from_source(&t).unwrap();
        assert_eq!(from_foreign.shape(), &[2, 2]);
        assert_eq!(from_foreign.ravel(), [1.0, 2.0, 3.0, 4.0]);
    }
}
