//! Elementwise arithmetic, pointwise math and reductions.
//!
//! All mutating operations work in place over the storage range the receiver
//! addresses and return `&mut Self` so calls can be chained. Tensors whose
//! addressed span exactly covers their elements (everything except a slice
//! of a permuted view) run on the parallel primitives in
//! [`parallel`](crate::parallel); the rest fall back to a sequential walk
//! over logical offsets.

use crate::errors::TensorError;
use crate::num::Elem;
use crate::parallel;
use crate::tensor::Tensor;

impl<T: Elem> Tensor<T> {
    /// Combine `other` into `self` elementwise:
    /// `self[i] = f(self[i], other[i])`.
    ///
    /// Shapes must match exactly. Operands pair in storage order over their
    /// addressed spans; the output aliases the receiver. When both operands
    /// address the identical range of one shared buffer the operation
    /// collapses to a single-buffer map; a shifted overlap within one
    /// buffer is resolved by materializing the source elements first.
    fn binary_op<F>(&mut self, other: &Tensor<T>, f: F) -> Result<&mut Self, TensorError>
    where
        F: Fn(T, T) -> T + Sync,
    {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch);
        }

        if self.storage().ptr_eq(other.storage()) {
            if self.span() == other.span() {
                // Both operands are the same elements of the same buffer.
                return Ok(self.apply(|x| f(x, x)));
            }
            // Overlap at shifted offsets: copy the source out, then combine.
            let src = other.ravel();
            let mut dst = self.storage().write();
            for (off, s) in self.layout().offsets().zip(src) {
                dst[off] = f(dst[off], s);
            }
        } else if self.is_flat() && other.is_flat() {
            let (dst_span, src_span) = (self.span(), other.span());
            let mut dst = self.storage().write();
            let src = other.storage().read();
            parallel::zip(&mut dst[dst_span], &src[src_span], f);
        } else {
            let mut dst = self.storage().write();
            let src = other.storage().read();
            for (d, s) in self.layout().offsets().zip(other.layout().offsets()) {
                dst[d] = f(dst[d], src[s]);
            }
        }
        Ok(self)
    }

    /// Elementwise addition of `other` into `self`.
    /// Fails with [`ShapeMismatch`](TensorError::ShapeMismatch) unless the
    /// shapes are equal; broadcasting is never applied.
    pub fn add(&mut self, other: &Tensor<T>) -> Result<&mut Self, TensorError> {
        self.binary_op(other, |a, b| a + b)
    }

    /// Elementwise subtraction of `other` from `self`.
    pub fn sub(&mut self, other: &Tensor<T>) -> Result<&mut Self, TensorError> {
        self.binary_op(other, |a, b| a - b)
    }

    /// Elementwise multiplication of `self` by `other`.
    pub fn mul(&mut self, other: &Tensor<T>) -> Result<&mut Self, TensorError> {
        self.binary_op(other, |a, b| a * b)
    }

    /// Elementwise division of `self` by `other`.
    ///
    /// The divisor is scanned before any element is written: if it contains
    /// a zero the call fails with
    /// [`DivisionByZero`](TensorError::DivisionByZero) and neither operand
    /// is mutated.
    pub fn div(&mut self, other: &Tensor<T>) -> Result<&mut Self, TensorError> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch);
        }
        let has_zero = {
            let src = other.storage().read();
            if other.is_flat() {
                src[other.span()].iter().any(|x| x.is_zero())
            } else {
                other.layout().offsets().any(|off| src[off].is_zero())
            }
        };
        if has_zero {
            return Err(TensorError::DivisionByZero);
        }
        self.binary_op(other, |a, b| a / b)
    }

    /// Apply `f` to every element of `self` in place.
    pub fn apply<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(T) -> T + Sync,
    {
        if self.is_flat() {
            let span = self.span();
            let mut dst = self.storage().write();
            parallel::apply(&mut dst[span], f);
        } else {
            let mut dst = self.storage().write();
            for off in self.layout().offsets() {
                dst[off] = f(dst[off]);
            }
        }
        self
    }

    /// Absolute value of each element.
    pub fn abs(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().abs()))
    }

    /// Sine of each element.
    pub fn sin(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().sin()))
    }

    /// Cosine of each element.
    pub fn cos(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().cos()))
    }

    /// Tangent of each element.
    pub fn tan(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().tan()))
    }

    /// Natural logarithm of each element.
    pub fn ln(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().ln()))
    }

    /// Base-2 logarithm of each element.
    pub fn log2(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().log2()))
    }

    /// Base-10 logarithm of each element.
    pub fn log10(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().log10()))
    }

    /// Base-e exponential of each element.
    pub fn exp(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().exp()))
    }

    /// Raise each element to the power `p`.
    pub fn pow(&mut self, p: T) -> &mut Self {
        let p = p.to_f64();
        self.apply(move |x| T::from_f64(x.to_f64().powf(p)))
    }

    /// Square root of each element.
    pub fn sqrt(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().sqrt()))
    }

    /// Round each element to the nearest integer value.
    pub fn round(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().round()))
    }

    /// Round each element down to the nearest integer value.
    pub fn floor(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().floor()))
    }

    /// Round each element up to the nearest integer value.
    pub fn ceil(&mut self) -> &mut Self {
        self.apply(|x| T::from_f64(x.to_f64().ceil()))
    }

    /// Reduce this tensor's elements to a single value.
    ///
    /// `f` reduces a sub-sequence to one value and is applied twice: once
    /// per chunk in parallel, then once over the chunk partials, so it must
    /// be associative. Order-dependent quantities (such as the mean, whose
    /// chunk means cannot be re-averaged when chunks differ in size) must
    /// instead be derived from an associative reduction, as
    /// [`mean`](Tensor::mean) does.
    pub fn reduce<F>(&self, f: F) -> T
    where
        F: Fn(&[T]) -> T + Sync,
    {
        if self.is_flat() {
            let data = self.storage().read();
            parallel::reduce(&data[self.span()], f)
        } else {
            parallel::reduce(&self.ravel(), f)
        }
    }

    /// Minimum of all elements.
    pub fn min(&self) -> T {
        self.reduce(|s| s.iter().copied().fold(s[0], |a, b| if b < a { b } else { a }))
    }

    /// Maximum of all elements.
    pub fn max(&self) -> T {
        self.reduce(|s| s.iter().copied().fold(s[0], |a, b| if b > a { b } else { a }))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> T {
        self.reduce(|s| s.iter().copied().fold(T::ZERO, |a, b| a + b))
    }

    /// Product of all elements.
    pub fn product(&self) -> T {
        self.reduce(|s| s.iter().copied().fold(T::ONE, |a, b| a * b))
    }

    /// Mean of all elements, computed as `sum / count`. Integer tensors get
    /// an integer quotient.
    pub fn mean(&self) -> T {
        self.sum() / T::from_usize(self.len())
    }
}
