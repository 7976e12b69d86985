//! Parallel compute primitives over flat buffers.
//!
//! The three primitives ([`apply`], [`zip`] and [`reduce`]) fan work out
//! across the crate [thread pool](crate::threading::thread_pool) and block
//! until every worker has finished. Buffers are split into at most
//! `min(workers, len)` contiguous, non-overlapping chunks, so no element is
//! ever written by two workers.
//!
//! None of the primitives validate their inputs; callers pass pre-validated,
//! uniform buffers. A panic raised inside a caller-supplied closure aborts
//! the whole operation: rayon joins the in-flight workers and re-raises the
//! panic on the calling thread, so no partial result is ever returned.
//! Chunks that completed before the fault keep their writes (each chunk is a
//! disjoint range); chunks that never started leave their range untouched.

use rayon::prelude::*;

use crate::num::Elem;
use crate::threading::thread_pool;

/// Chunk length that splits `len` elements into at most
/// `min(workers, len)` near-equal contiguous pieces.
fn chunk_len(len: usize) -> usize {
    let workers = thread_pool().num_threads();
    len.div_ceil(workers).max(1)
}

/// Apply `f` to every element of `buf` in place.
///
/// An empty buffer is a no-op.
pub fn apply<T, F>(buf: &mut [T], f: F)
where
    T: Elem,
    F: Fn(T) -> T + Sync,
{
    if buf.is_empty() {
        return;
    }
    let chunk = chunk_len(buf.len());
    thread_pool().run(|| {
        buf.par_chunks_mut(chunk).for_each(|part| {
            for x in part.iter_mut() {
                *x = f(*x);
            }
        });
    });
}

/// Combine `src` into `dst` elementwise: `dst[i] = f(dst[i], src[i])`.
///
/// The output buffer aliases the first input by construction, which is the
/// in-place form of a binary elementwise operation. `dst` and `src` must
/// have equal lengths; callers validate shapes before delegating here.
pub fn zip<T, F>(dst: &mut [T], src: &[T], f: F)
where
    T: Elem,
    F: Fn(T, T) -> T + Sync,
{
    debug_assert_eq!(dst.len(), src.len());
    if dst.is_empty() {
        return;
    }
    let chunk = chunk_len(dst.len());
    thread_pool().run(|| {
        dst.par_chunks_mut(chunk)
            .zip(src.par_chunks(chunk))
            .for_each(|(d, s)| {
                for i in 0..d.len() {
                    d[i] = f(d[i], s[i]);
                }
            });
    });
}

/// Reduce `buf` to a single value with a two-level reduction.
///
/// Each worker reduces one chunk with `f`; the chunk partials are collected
/// in chunk order and `f` is applied once more to the partial sequence.
/// Because the grouping depends on the worker count, `f` must be
/// associative (and for bit-identical float results, insensitive to
/// reassociation: float sums are only reproducible up to rounding).
/// Quantities like the mean of unequal chunks cannot be expressed this way
/// and must be derived from an associative reduction instead.
///
/// `buf` must be non-empty. A buffer shorter than the worker count
/// degenerates to one chunk per element.
pub fn reduce<T, F>(buf: &[T], f: F) -> T
where
    T: Elem,
    F: Fn(&[T]) -> T + Sync,
{
    debug_assert!(!buf.is_empty());
    let chunk = chunk_len(buf.len());
    if chunk == buf.len() {
        return f(buf);
    }
    let partials: Vec<T> = thread_pool().run(|| buf.par_chunks(chunk).map(&f).collect());
    f(&partials)
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use crate::test_util::ApproxEq;

    use super::{apply, reduce, zip};

    #[test]
    fn test_apply_matches_sequential() {
        for len in 0..=35usize {
            let mut buf: Vec<i64> = (0..len as i64).collect();
            let expected: Vec<i64> = buf.iter().map(|x| x * 2 + 1).collect();

            apply(&mut buf, |x| x * 2 + 1);
            assert_eq!(buf, expected, "len {}", len);
        }
    }

    #[test]
    fn test_zip_matches_sequential() {
        for len in 0..=35usize {
            let mut dst: Vec<i32> = (0..len as i32).collect();
            let src: Vec<i32> = (0..len as i32).map(|x| x * 10).collect();
            let expected: Vec<i32> = dst.iter().zip(&src).map(|(a, b)| a + b).collect();

            zip(&mut dst, &src, |a, b| a + b);
            assert_eq!(dst, expected, "len {}", len);
        }
    }

    #[test]
    fn test_reduce_int_exact() {
        for len in 1..=35usize {
            let buf: Vec<i64> = (1..=len as i64).collect();

            let sum = reduce(&buf, |s| s.iter().sum());
            assert_eq!(sum, buf.iter().sum::<i64>(), "len {}", len);

            let min = reduce(&buf, |s| s.iter().copied().fold(s[0], i64::min));
            assert_eq!(min, 1);

            let max = reduce(&buf, |s| s.iter().copied().fold(s[0], i64::max));
            assert_eq!(max, len as i64);
        }
    }

    #[test]
    fn test_reduce_float_within_tolerance() {
        let buf: Vec<f64> = (0..1000).map(|i| (i as f64) * 0.1).collect();
        let sequential: f64 = buf.iter().sum();
        let parallel = reduce(&buf, |s| s.iter().sum());
        assert!(parallel.approx_eq(&sequential));
    }

    #[test]
    fn test_reduce_shorter_than_worker_count() {
        let buf = [41i32];
        assert_eq!(reduce(&buf, |s| s.iter().sum()), 41);

        let buf = [3i32, 9];
        assert_eq!(reduce(&buf, |s| s.iter().product()), 27);
    }

    #[test]
    fn test_worker_panic_propagates_after_join() {
        let mut buf: Vec<i32> = (0..64).collect();
        let result = catch_unwind(AssertUnwindSafe(|| {
            apply(&mut buf, |x| if x == 63 { panic!("fault") } else { x + 1 });
        }));
        assert!(result.is_err());

        // The process survives and the buffer is still usable; completed
        // chunks keep their writes, untouched chunks keep their old values.
        for (i, &x) in buf.iter().enumerate() {
            assert!(x == i as i32 || x == i as i32 + 1);
        }
    }
}
