//! ndvec provides n-dimensional numeric arrays ("tensors"): flat typed
//! buffers addressed through a shape/stride/offset layout, with parallel
//! elementwise and reduction primitives.
//!
//! # Storage and layout
//!
//! A [Tensor] is a combination of shared data storage and a layout. The
//! storage is a flat buffer of one numeric element type; the layout maps
//! n-dimensional indices onto it through a shape, per-axis strides and a
//! storage offset.
//!
//! The view operations [`reshape`](Tensor::reshape),
//! [`index`](Tensor::index), [`slice`](Tensor::slice) and
//! [`permute`](Tensor::permute) build a new layout over the *same* storage
//! without copying any data. Several tensors
//! may therefore alias one buffer, and mutation through any of them is
//! visible through all; [`copy`](Tensor::copy) is the explicit way out of
//! sharing. Element types are restricted to a closed set of numeric
//! primitives via the sealed [Elem] trait.
//!
//! ```
//! use ndvec::Tensor;
//!
//! # fn main() -> Result<(), ndvec::TensorError> {
//! let t = Tensor::arange(0i32, 6, 1)?;
//! let mut m = t.reshape(&[2, 3])?;
//!
//! // `m` shares storage with `t`: doubling it in place is visible in both.
//! let alias = m.view();
//! m.add(&alias)?;
//! assert_eq!(t.ravel(), [0, 2, 4, 6, 8, 10]);
//!
//! assert_eq!(m.index(&[1, 2])?.item(), Some(10));
//! assert_eq!(m.sum(), 30);
//! # Ok(())
//! # }
//! ```
//!
//! # Parallel compute
//!
//! Arithmetic and reductions delegate to the primitives in [parallel],
//! which split buffers into disjoint contiguous chunks and fan out across
//! the crate [thread pool](threading::thread_pool). Calls block until every
//! worker has joined, so callers never observe partial results. Note that
//! binary operations lock the destination storage for writing and the
//! source for reading; programs running elementwise ops over the same pair
//! of buffers from several threads at once should order those calls
//! externally.
//!
//! # Errors
//!
//! Fallible operations return [`TensorError`]; validation always happens
//! before any mutation, so an `Err` means every operand is unchanged.

pub mod errors;
pub mod ingest;
pub mod layout;
pub mod parallel;
pub mod storage;
pub mod threading;

mod impl_debug;
#[cfg(feature = "serde")]
mod impl_serialize;
mod num;
mod ops;
mod tensor;

/// Trait for sources of random data for tensors, for use with
/// [`Tensor::rand`] and the other random fillers.
///
/// Generators are explicit state passed by the caller; the crate keeps no
/// ambient process-wide random source. [`rng::XorShiftRng`] is the built-in
/// seedable implementation, and with the `random` feature enabled a
/// `fastrand::Rng` can be used as well.
pub trait RandomSource<T> {
    /// Generate the next random value.
    fn next(&mut self) -> T;
}

// Re-exports for convenience.
pub use errors::TensorError;
pub use ingest::Source;
pub use layout::Layout;
pub use num::{DType, Elem};
pub use storage::Storage;
pub use tensor::Tensor;

// These modules are public for use by other crates in this repo, but
// currently considered internal to the project.
#[doc(hidden)]
pub mod rng;
#[doc(hidden)]
pub mod test_util;
