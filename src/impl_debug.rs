//! Debug formatting for tensors.

use std::fmt::{Debug, Formatter, Result};

use crate::num::Elem;
use crate::tensor::Tensor;

/// Maximum number of entries printed along one axis before the middle is
/// elided.
const MAX_PER_AXIS: usize = 6;

/// Write the elements of one axis, recursing into nested axes. `data` holds
/// the remaining elements in logical row-major order.
fn write_axis<T: Elem>(f: &mut Formatter<'_>, data: &[T], shape: &[usize]) -> Result {
    if shape.is_empty() {
        return write!(f, "{:?}", data[0]);
    }

    let dim = shape[0];
    let inner: usize = shape[1..].iter().product();
    let shown = if dim > MAX_PER_AXIS {
        MAX_PER_AXIS / 2
    } else {
        dim
    };

    write!(f, "[")?;
    for i in 0..shown {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_axis(f, &data[i * inner..(i + 1) * inner], &shape[1..])?;
    }
    if dim > MAX_PER_AXIS {
        write!(f, ", ...")?;
        for i in dim - shown..dim {
            write!(f, ", ")?;
            write_axis(f, &data[i * inner..(i + 1) * inner], &shape[1..])?;
        }
    }
    write!(f, "]")
}

impl<T: Elem> Debug for Tensor<T> {
    /// Format the tensor as `Tensor(dtype, shape=[..], data)` with long axes
    /// elided. Reads the tensor only through its public surface, so views
    /// print their own window, not the whole buffer.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Tensor({}, shape={:?}, ", T::DTYPE.name(), self.shape())?;
        write_axis(f, &self.ravel(), self.shape())?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use crate::Tensor;

    #[test]
    fn test_debug_scalar() {
        let t = Tensor::from_scalar(5i32);
        assert_eq!(format!("{:?}", t), "Tensor(i32, shape=[], 5)");
    }

    #[test]
    fn test_debug_matrix() {
        let t = Tensor::arange(0i32, 6, 1).unwrap().reshape(&[2, 3]).unwrap();
        assert_eq!(
            format!("{:?}", t),
            "Tensor(i32, shape=[2, 3], [[0, 1, 2], [3, 4, 5]])"
        );
    }

    #[test]
    fn test_debug_elides_long_axes() {
        let t = Tensor::arange(0i32, 10, 1).unwrap();
        assert_eq!(
            format!("{:?}", t),
            "Tensor(i32, shape=[10], [0, 1, 2, ..., 7, 8, 9])"
        );
    }

    #[test]
    fn test_debug_view_prints_window() {
        let t = Tensor::arange(0i32, 5, 1).unwrap();
        let s = t.slice(1, 3).unwrap();
        assert_eq!(format!("{:?}", s), "Tensor(i32, shape=[2], [1, 2])");
    }
}
