//! Shared flat buffers backing tensors.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::num::Elem;

/// A contiguous, shared buffer of numeric elements.
///
/// Cloning a `Storage` handle shares the underlying buffer: writes through
/// one handle are visible through every other. The buffer is freed when the
/// last handle is dropped. Its length is fixed at construction; operations
/// overwrite elements but never grow or shrink it.
///
/// Point and range accessors do no validation of their own beyond the
/// inherent slice bounds checks. Callers (the view algebra and the tensor
/// operators) validate indices before calling, keeping the hot path free of
/// duplicate checks.
#[derive(Debug)]
pub struct Storage<T> {
    data: Arc<RwLock<Vec<T>>>,
    len: usize,
}

impl<T: Elem> Storage<T> {
    pub fn new(data: Vec<T>) -> Storage<T> {
        let len = data.len();
        Storage {
            data: Arc::new(RwLock::new(data)),
            len,
        }
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the buffer contents in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Read the element at a flat index.
    pub fn get(&self, index: usize) -> T {
        self.read()[index]
    }

    /// Overwrite the element at a flat index.
    pub fn set(&self, index: usize, value: T) {
        self.write()[index] = value;
    }

    /// Copy out the elements in `start..end`.
    pub fn read_range(&self, start: usize, end: usize) -> Vec<T> {
        self.read()[start..end].to_vec()
    }

    /// Overwrite the range starting at `start` with `values`.
    pub fn write_range(&self, start: usize, values: &[T]) {
        self.write()[start..start + values.len()].copy_from_slice(values);
    }

    /// Allocate a new buffer holding a copy of this one's contents. The
    /// result shares nothing with `self`.
    pub fn deep_copy(&self) -> Storage<T> {
        Storage::new(self.read().clone())
    }

    /// Return a new handle sharing this buffer.
    pub fn share(&self) -> Storage<T> {
        Storage {
            data: Arc::clone(&self.data),
            len: self.len,
        }
    }

    /// Return true if `self` and `other` are handles to the same buffer.
    pub fn ptr_eq(&self, other: &Storage<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // Lock poisoning can only be caused by a caller-supplied closure
    // panicking mid-operation; each worker writes only within its own
    // disjoint chunk, so the buffer contents stay valid and the poison flag
    // is ignored.

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::Storage;

    #[test]
    fn test_point_and_range_access() {
        let storage = Storage::new(vec![1i32, 2, 3, 4, 5]);
        assert_eq!(storage.len(), 5);
        assert_eq!(storage.byte_len(), 20);
        assert_eq!(storage.get(2), 3);

        storage.set(2, 30);
        assert_eq!(storage.get(2), 30);

        assert_eq!(storage.read_range(1, 4), [2, 30, 4]);
        storage.write_range(3, &[40, 50]);
        assert_eq!(storage.read_range(0, 5), [1, 2, 30, 40, 50]);
    }

    #[test]
    fn test_sharing() {
        let a = Storage::new(vec![0u8; 4]);
        let b = a.share();
        assert!(a.ptr_eq(&b));

        b.set(1, 9);
        assert_eq!(a.get(1), 9);
    }

    #[test]
    fn test_deep_copy() {
        let a = Storage::new(vec![1.0f64, 2.0]);
        let b = a.deep_copy();
        assert!(!a.ptr_eq(&b));

        b.set(0, 7.0);
        assert_eq!(a.get(0), 1.0);
        assert_eq!(b.get(0), 7.0);
    }
}
