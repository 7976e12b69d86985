use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::num::Elem;
use crate::tensor::Tensor;

/// Trait that tests whether two values are approximately equal.
///
/// The comparison takes into account both the absolute difference of the
/// values and the relative difference, in the manner of `allclose` in NumPy
/// and PyTorch. Integer types compare exactly.
pub trait ApproxEq: Sized {
    /// Return the default absolute tolerance value.
    fn default_abs_tolerance() -> Self;

    /// Return the default relative tolerance value.
    fn default_rel_tolerance() -> Self;

    /// Test whether `self` is "close" to `other` according to the formula:
    ///
    /// ```text
    /// (self - other).abs() <= atol + rtol * other.abs()
    /// ```
    fn approx_eq_with_atol_rtol(&self, other: &Self, atol: Self, rtol: Self) -> bool;

    /// Test if `other` is approximately equal to `self` with the default
    /// tolerances for this type.
    fn approx_eq(&self, other: &Self) -> bool {
        self.approx_eq_with_atol_rtol(
            other,
            Self::default_abs_tolerance(),
            Self::default_rel_tolerance(),
        )
    }
}

macro_rules! impl_approx_eq_float {
    ($type:ty, $atol:expr, $rtol:expr) => {
        impl ApproxEq for $type {
            #[inline]
            fn default_abs_tolerance() -> $type {
                $atol
            }

            #[inline]
            fn default_rel_tolerance() -> $type {
                $rtol
            }

            #[inline]
            fn approx_eq_with_atol_rtol(&self, other: &$type, atol: $type, rtol: $type) -> bool {
                (self - other).abs() <= atol + rtol * other.abs()
            }
        }
    };
}

impl_approx_eq_float!(f32, 1e-8, 1e-5);
impl_approx_eq_float!(f64, 1e-10, 1e-9);

macro_rules! impl_approx_eq_int {
    ($type:ty) => {
        impl ApproxEq for $type {
            #[inline]
            fn default_abs_tolerance() -> $type {
                0
            }

            #[inline]
            fn default_rel_tolerance() -> $type {
                0
            }

            #[inline]
            fn approx_eq_with_atol_rtol(&self, other: &$type, _atol: $type, _rtol: $type) -> bool {
                self == other
            }
        }
    };
}

impl_approx_eq_int!(i8);
impl_approx_eq_int!(i16);
impl_approx_eq_int!(i32);
impl_approx_eq_int!(i64);
impl_approx_eq_int!(u8);
impl_approx_eq_int!(u16);
impl_approx_eq_int!(u32);
impl_approx_eq_int!(u64);

#[derive(Debug)]
pub enum ExpectEqualError {
    ShapeMismatch(String),
    ValueMismatch(String),
}

impl Display for ExpectEqualError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectEqualError::ShapeMismatch(details) => write!(f, "{}", details),
            ExpectEqualError::ValueMismatch(details) => write!(f, "{}", details),
        }
    }
}

impl Error for ExpectEqualError {}

/// Check that the shapes of two tensors are equal and that their contents
/// are approximately equal.
///
/// If there are mismatches, this returns an `Err` with a message listing the
/// mismatched flat indices and values.
pub fn expect_equal<T: Elem + ApproxEq>(x: &Tensor<T>, y: &Tensor<T>) -> Result<(), ExpectEqualError> {
    if x.shape() != y.shape() {
        return Err(ExpectEqualError::ShapeMismatch(format!(
            "Tensors have different shapes. {:?} vs. {:?}",
            x.shape(),
            y.shape()
        )));
    }

    let x_data = x.ravel();
    let y_data = y.ravel();
    let mismatches: Vec<_> = x_data
        .iter()
        .zip(y_data.iter())
        .enumerate()
        .filter(|(_, (xi, yi))| !xi.approx_eq(yi))
        .map(|(i, (xi, yi))| (i, *xi, *yi))
        .collect();

    if !mismatches.is_empty() {
        let max_examples = 16;
        Err(ExpectEqualError::ValueMismatch(format!(
            "Tensor values differ at {} of {} indexes: {:?}{}",
            mismatches.len(),
            x.len(),
            &mismatches[..mismatches.len().min(max_examples)],
            if mismatches.len() > max_examples {
                "..."
            } else {
                ""
            }
        )))
    } else {
        Ok(())
    }
}
