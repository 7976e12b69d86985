//! The tensor type: shared storage plus a layout describing how to address
//! it.

use std::ops::Range;

use smallvec::SmallVec;

use crate::errors::TensorError;
use crate::ingest::Source;
use crate::layout::{check_shape, is_valid_permutation, Layout};
use crate::num::{DType, Elem};
use crate::storage::Storage;
use crate::RandomSource;

/// An n-dimensional numeric array.
///
/// A tensor pairs a reference to a [Storage] buffer with a [Layout] (shape,
/// per-axis strides, storage offset). The view-producing operations
/// [`reshape`](Tensor::reshape), [`index`](Tensor::index),
/// [`slice`](Tensor::slice) and [`permute`](Tensor::permute) construct a new
/// layout over the *same* storage, so several tensors may alias one buffer
/// and mutation through any of them is visible through all. Operations that
/// allocate instead of aliasing say so explicitly
/// ([`copy`](Tensor::copy), [`cast`](Tensor::cast)).
///
/// Because aliasing is the point, `Tensor` deliberately does not implement
/// `Clone`: call [`view`](Tensor::view) to share or [`copy`](Tensor::copy)
/// to duplicate.
pub struct Tensor<T: Elem> {
    storage: Storage<T>,
    layout: Layout,
}

impl<T: Elem> Tensor<T> {
    pub(crate) fn from_parts(storage: Storage<T>, layout: Layout) -> Tensor<T> {
        debug_assert!(layout.offset() + layout.span_len() <= storage.len());
        Tensor { storage, layout }
    }

    pub(crate) fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Flat storage range addressed by this tensor:
    /// `offset .. offset + span_len`.
    pub(crate) fn span(&self) -> Range<usize> {
        let start = self.layout.offset();
        start..start + self.layout.span_len()
    }

    /// Return true if the addressed storage range covers exactly the
    /// tensor's elements, with no gaps. Such tensors take the parallel
    /// flat-span path in elementwise and reduction operations.
    pub(crate) fn is_flat(&self) -> bool {
        self.layout.span_len() == self.layout.len()
    }

    // === Constructors ===

    /// Create a tensor from a flat buffer and a shape.
    ///
    /// `data.len()` must equal the product of `shape`; alternatively an
    /// empty `shape` with a single-element buffer creates a scalar. Fails
    /// with [`BadShape`](TensorError::BadShape) otherwise, or if any
    /// dimension is zero.
    pub fn from_data(shape: &[usize], data: Vec<T>) -> Result<Tensor<T>, TensorError> {
        if shape.is_empty() {
            if data.len() != 1 {
                return Err(TensorError::BadShape);
            }
        } else {
            check_shape(shape)?;
            if data.len() != shape.iter().product::<usize>() {
                return Err(TensorError::BadShape);
            }
        }
        Ok(Tensor::from_parts(
            Storage::new(data),
            Layout::from_shape(shape),
        ))
    }

    /// Create a rank-0 tensor holding a single value.
    pub fn from_scalar(value: T) -> Tensor<T> {
        Tensor::from_parts(Storage::new(vec![value]), Layout::from_shape(&[]))
    }

    /// Create a rank-1 tensor from a vector. Fails with
    /// [`BadShape`](TensorError::BadShape) if the vector is empty.
    pub fn from_vec(data: Vec<T>) -> Result<Tensor<T>, TensorError> {
        let shape = [data.len()];
        Tensor::from_data(&shape, data)
    }

    /// Create a tensor from any ingestible input: a scalar, a flat
    /// sequence, arbitrarily nested sequences, or a tensor of another
    /// element type. See [Source].
    pub fn from_source(source: impl Into<Source<T>>) -> Result<Tensor<T>, TensorError> {
        let (data, shape) = source.into().resolve()?;
        Tensor::from_data(&shape, data)
    }

    // === Fillers ===

    /// Create a tensor of the given shape with every element equal to
    /// `value`.
    pub fn full(shape: &[usize], value: T) -> Result<Tensor<T>, TensorError> {
        check_shape(shape)?;
        let len = shape.iter().product();
        Tensor::from_data(shape, vec![value; len])
    }

    /// Create a tensor of the given shape filled with zeros.
    pub fn zeros(shape: &[usize]) -> Result<Tensor<T>, TensorError> {
        Tensor::full(shape, T::ZERO)
    }

    /// Create a tensor of the given shape filled with ones.
    pub fn ones(shape: &[usize]) -> Result<Tensor<T>, TensorError> {
        Tensor::full(shape, T::ONE)
    }

    /// Create a rank-1 tensor with values `start, start+step, ...` over
    /// `[start, end)`.
    ///
    /// Fails with [`BadStep`](TensorError::BadStep) if `step` is zero or
    /// its sign opposes the interval direction, and with
    /// [`BadInterval`](TensorError::BadInterval) if the interval contains
    /// no steps at all.
    pub fn arange(start: T, end: T, step: T) -> Result<Tensor<T>, TensorError> {
        let (start, end, step) = (start.to_f64(), end.to_f64(), step.to_f64());
        if step == 0. || (step > 0. && end < start) || (step < 0. && end > start) {
            return Err(TensorError::BadStep);
        }
        let len = ((end - start).abs() / step.abs()).floor() as usize;
        if len == 0 {
            return Err(TensorError::BadInterval);
        }
        let data = (0..len)
            .map(|i| T::from_f64(start + i as f64 * step))
            .collect();
        Tensor::from_data(&[len], data)
    }

    /// Create a rank-1 tensor of `n` values evenly spaced on `[start, end]`
    /// (both endpoints included).
    pub fn linspace(start: T, end: T, n: usize) -> Result<Tensor<T>, TensorError> {
        if n == 0 {
            return Err(TensorError::BadShape);
        }
        let (start, end) = (start.to_f64(), end.to_f64());
        if start == end {
            return Tensor::full(&[n], T::from_f64(start));
        }
        let step = (end - start) / (n.max(2) - 1) as f64;
        let data = (0..n).map(|i| T::from_f64(start + i as f64 * step)).collect();
        Tensor::from_data(&[n], data)
    }

    /// Create a rank-1 tensor of `n` values evenly spaced on a log scale,
    /// from `base^start` to `base^end`.
    pub fn logspace(base: f64, start: f64, end: f64, n: usize) -> Result<Tensor<T>, TensorError> {
        if n == 0 {
            return Err(TensorError::BadShape);
        }
        let mut x = base.powf(start);
        let step = base.powf((end - start) / (n.max(2) - 1) as f64);
        let data = (0..n)
            .map(|_| {
                let value = T::from_f64(x);
                x *= step;
                value
            })
            .collect();
        Tensor::from_data(&[n], data)
    }

    /// Create a tensor of the given shape filled with random values from
    /// `rng`.
    ///
    /// The generator is explicit state owned by the caller; the crate keeps
    /// no ambient random source.
    pub fn rand<R: RandomSource<T>>(
        shape: &[usize],
        rng: &mut R,
    ) -> Result<Tensor<T>, TensorError> {
        check_shape(shape)?;
        let len = shape.iter().product();
        let data = (0..len).map(|_| rng.next()).collect();
        Tensor::from_data(shape, data)
    }

    /// Create a tensor of the given shape filled with values drawn from the
    /// standard normal distribution (mean 0, variance 1), derived from a
    /// uniform f64 source via the Box-Muller transform.
    pub fn rand_normal<R: RandomSource<f64>>(
        shape: &[usize],
        rng: &mut R,
    ) -> Result<Tensor<T>, TensorError> {
        check_shape(shape)?;
        let len = shape.iter().product();
        let data = (0..len)
            .map(|_| {
                // ln(0) is -inf, so resample until the first uniform is
                // strictly positive.
                let u1 = loop {
                    let u = rng.next();
                    if u > 0. {
                        break u;
                    }
                };
                let u2 = rng.next();
                let z = (-2. * u1.ln()).sqrt() * (2. * std::f64::consts::PI * u2).cos();
                T::from_f64(z)
            })
            .collect();
        Tensor::from_data(shape, data)
    }

    /// Create a tensor of the given shape filled with integers drawn
    /// uniformly from `[lo, hi)`. Fails with
    /// [`BadInterval`](TensorError::BadInterval) unless `lo < hi`.
    pub fn rand_range<R: RandomSource<f64>>(
        lo: i64,
        hi: i64,
        shape: &[usize],
        rng: &mut R,
    ) -> Result<Tensor<T>, TensorError> {
        if lo >= hi {
            return Err(TensorError::BadInterval);
        }
        check_shape(shape)?;
        let len = shape.iter().product();
        let width = (hi - lo) as f64;
        let data = (0..len)
            .map(|_| T::from_f64((lo as f64 + rng.next() * width).floor()))
            .collect();
        Tensor::from_data(shape, data)
    }

    // === Attributes ===

    /// Runtime tag of the element type.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Number of axes. 0 for scalars.
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// Total number of elements: the product of the shape (1 for scalars).
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Always false: tensors address at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Size of the dimension `axis`, or
    /// [`AxisOutOfBounds`](TensorError::AxisOutOfBounds) if `axis >= rank`.
    pub fn size(&self, axis: usize) -> Result<usize, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::AxisOutOfBounds);
        }
        Ok(self.layout.size(axis))
    }

    /// Size in bytes of this tensor's elements.
    pub fn byte_len(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }

    /// Copy out this tensor's elements as a flat vector in logical
    /// (row-major) order.
    pub fn ravel(&self) -> Vec<T> {
        let data = self.storage.read();
        if self.layout.is_contiguous() {
            data[self.span()].to_vec()
        } else {
            self.layout.offsets().map(|off| data[off]).collect()
        }
    }

    /// Read the element at a full index, or None if any coordinate is out
    /// of bounds or the index's length does not match the rank.
    pub fn get(&self, index: &[usize]) -> Option<T> {
        if index.len() != self.rank() {
            return None;
        }
        let mut offset = self.layout.offset();
        for (&idx, (&dim, &stride)) in index
            .iter()
            .zip(self.shape().iter().zip(self.strides().iter()))
        {
            if idx >= dim {
                return None;
            }
            offset += idx * stride;
        }
        Some(self.storage.get(offset))
    }

    /// Return the value of a single-element tensor, or None if the tensor
    /// holds more than one element.
    pub fn item(&self) -> Option<T> {
        if self.len() == 1 {
            Some(self.storage.get(self.layout.offset()))
        } else {
            None
        }
    }

    /// Return true if this tensor's shape can be broadcast to `target`:
    /// dimensions are compared from the trailing axis backward and match if
    /// equal, if the source dimension is 1, or if the source has no
    /// corresponding axis. Returns false for malformed targets rather than
    /// an error.
    ///
    /// This is an advisory query only: the arithmetic operators require
    /// exact shape equality and never broadcast.
    pub fn broadable(&self, target: &[usize]) -> bool {
        self.layout.can_broadcast_to(target)
    }

    // === Views and copies ===

    /// Return a new tensor handle aliasing this tensor's storage and
    /// addressing the same elements.
    pub fn view(&self) -> Tensor<T> {
        Tensor {
            storage: self.storage.share(),
            layout: self.layout.clone(),
        }
    }

    /// Deep-copy: duplicates the backing buffer and the layout. The result
    /// shares nothing with `self`.
    pub fn copy(&self) -> Tensor<T> {
        Tensor {
            storage: self.storage.deep_copy(),
            layout: self.layout.clone(),
        }
    }

    /// Reinterpret this tensor's elements with a new shape, sharing
    /// storage.
    ///
    /// The product of `shape` must equal [`len`](Tensor::len), and every
    /// dimension must be positive, else
    /// [`BadShape`](TensorError::BadShape). As a special case, an empty
    /// `shape` collapses a single-element tensor to rank 0.
    /// Strides are recomputed as contiguous; the storage offset is kept, so
    /// reshaping a sliced view stays inside its window.
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor<T>, TensorError> {
        if shape.is_empty() {
            if self.len() > 1 {
                return Err(TensorError::BadShape);
            }
        } else {
            check_shape(shape)?;
            if shape.iter().product::<usize>() != self.len() {
                return Err(TensorError::BadShape);
            }
        }
        let layout = Layout::from_shape(shape).with_offset(self.layout.offset());
        Ok(Tensor {
            storage: self.storage.share(),
            layout,
        })
    }

    /// Return a lower-rank view of the position selected by leading
    /// indices.
    ///
    /// With `k` indices (`k <= rank`, else
    /// [`ArgumentCountExceeded`](TensorError::ArgumentCountExceeded)) the
    /// result drops the first `k` axes; indexing every axis yields a rank-0
    /// view readable with [`item`](Tensor::item). Each index must be within
    /// its dimension, else
    /// [`AxisOutOfBounds`](TensorError::AxisOutOfBounds).
    pub fn index(&self, indices: &[usize]) -> Result<Tensor<T>, TensorError> {
        if indices.len() > self.rank() {
            return Err(TensorError::ArgumentCountExceeded);
        }
        for (&idx, &dim) in indices.iter().zip(self.shape()) {
            if idx >= dim {
                return Err(TensorError::AxisOutOfBounds);
            }
        }

        let mut offset = self.layout.offset();
        for (&idx, &stride) in indices.iter().zip(self.strides()) {
            offset += idx * stride;
        }

        let shape = SmallVec::from_slice(&self.shape()[indices.len()..]);
        let strides = SmallVec::from_slice(&self.strides()[indices.len()..]);
        Ok(Tensor {
            storage: self.storage.share(),
            layout: Layout::from_parts(shape, strides, offset),
        })
    }

    /// Return a view restricting axis 0 to `[start, end)`.
    ///
    /// Fails with [`BadShape`](TensorError::BadShape) on a rank-0 tensor
    /// and [`BadInterval`](TensorError::BadInterval) unless
    /// `start < end <= shape[0]`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Tensor<T>, TensorError> {
        if self.rank() == 0 {
            return Err(TensorError::BadShape);
        }
        if start >= end || end > self.layout.size(0) {
            return Err(TensorError::BadInterval);
        }

        let mut shape = SmallVec::from_slice(self.shape());
        shape[0] = end - start;
        let strides = SmallVec::from_slice(self.strides());
        let offset = self.layout.offset() + start * self.layout.strides()[0];
        Ok(Tensor {
            storage: self.storage.share(),
            layout: Layout::from_parts(shape, strides, offset),
        })
    }

    /// Return a view with axes reordered so that result axis `i` is source
    /// axis `axes[i]`. No data moves; only shape and strides are permuted.
    ///
    /// Fails with
    /// [`ArgumentCountExceeded`](TensorError::ArgumentCountExceeded) if
    /// given more axes than the rank, and
    /// [`AxisOutOfBounds`](TensorError::AxisOutOfBounds) if `axes` is not a
    /// permutation of `0..rank`.
    pub fn permute(&self, axes: &[usize]) -> Result<Tensor<T>, TensorError> {
        if axes.len() > self.rank() {
            return Err(TensorError::ArgumentCountExceeded);
        }
        if !is_valid_permutation(self.rank(), axes) {
            return Err(TensorError::AxisOutOfBounds);
        }

        let shape = axes.iter().map(|&a| self.layout.size(a)).collect();
        let strides = axes.iter().map(|&a| self.layout.strides()[a]).collect();
        Ok(Tensor {
            storage: self.storage.share(),
            layout: Layout::from_parts(shape, strides, self.layout.offset()),
        })
    }

    /// Reverse, in place, the flat storage range this tensor addresses.
    ///
    /// This mutates shared storage: every view aliasing the range observes
    /// the reversal.
    pub fn reverse(&mut self) -> &mut Self {
        let span = self.span();
        self.storage.write()[span].reverse();
        self
    }

    /// Convert this tensor's elements to another supported element type.
    /// Allocates a new contiguous tensor of the same shape; conversions go
    /// through f64 and truncate toward zero for integer targets.
    pub fn cast<U: Elem>(&self) -> Tensor<U> {
        let data: Vec<U> = {
            let src = self.storage.read();
            self.layout
                .offsets()
                .map(|off| U::from_f64(src[off].to_f64()))
                .collect()
        };
        Tensor::from_parts(Storage::new(data), Layout::from_shape(self.shape()))
    }

    /// Overwrite this tensor's elements from any ingestible source of
    /// exactly the same shape.
    ///
    /// Fails with [`UnwrapFailure`](TensorError::UnwrapFailure) if the
    /// source cannot be resolved to a flat buffer and
    /// [`ShapeMismatch`](TensorError::ShapeMismatch) if the shapes differ.
    /// Writes are visible through all aliasing views.
    pub fn assign(&mut self, source: impl Into<Source<T>>) -> Result<&mut Self, TensorError> {
        let (data, shape) = source.into().resolve()?;
        if shape != self.shape() {
            return Err(TensorError::ShapeMismatch);
        }
        let mut dst = self.storage.write();
        for (off, value) in self.layout.offsets().zip(data) {
            dst[off] = value;
        }
        drop(dst);
        Ok(self)
    }
}
