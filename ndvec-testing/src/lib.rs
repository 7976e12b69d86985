//! Internal testing utilities for the ndvec crates.

use std::fmt::Debug;
use std::panic::RefUnwindSafe;

/// Utility for creating parametrized (aka. table-driven) tests.
///
/// To create a table driven test:
///
/// 1. Import the `TestCases` trait
/// 2. Create a struct, conventionally named `Case`, that contains the data
///    for a single test case. This struct must implement `Debug`.
/// 3. Create a collection of `Case` instances (eg. an array or Vec),
///    conventionally named `cases`.
/// 4. Call `cases.test_each`, passing the test function as a closure
///
/// `test_each` runs every case under `catch_unwind`. If all cases succeed it
/// returns; otherwise it panics with the count and debug representations of
/// the failing cases, so a single run reports every broken case rather than
/// stopping at the first.
///
/// ## Example
///
/// ```
/// use ndvec_testing::TestCases;
///
/// // Add #[test] attribute
/// fn test_multiply() {
///   #[derive(Debug)]
///   struct Case {
///     a: i32,
///     b: i32,
///     expected: i32,
///   }
///
///   let cases = [
///     Case { a: 3, b: 5, expected: 15 },
///   ];
///
///   cases.test_each(|&Case { a, b, expected }| {
///     assert_eq!(a * b, expected);
///   });
/// }
/// # test_multiply();
/// ```
///
/// Both test cases and the test function must be
/// [unwind safe](std::panic::catch_unwind). Practically this means case
/// fields and captured values must not contain interior mutability; wrap
/// offenders in [`AssertUnwindSafe`](std::panic::AssertUnwindSafe) if needed.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call test function `test` with each test case in `self`, catching any
    /// panics.
    ///
    /// After all cases have been evaluated, return if no panics occurred or
    /// panic with details of failing cases otherwise.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            if std::panic::catch_unwind(|| {
                test(&case);
            })
            .is_err()
            {
                failures.push(case);
            }
        }
        assert_eq!(
            failures.len(),
            0,
            "{} test cases failed: {:?}",
            failures.len(),
            failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::TestCases;

    #[test]
    fn test_each_passes() {
        #[derive(Debug)]
        struct Case {
            x: i32,
            doubled: i32,
        }

        let cases = [Case { x: 2, doubled: 4 }, Case { x: -3, doubled: -6 }];

        cases.test_each(|&Case { x, doubled }| {
            assert_eq!(x * 2, doubled);
        });
    }

    #[test]
    #[should_panic(expected = "1 test cases failed")]
    fn test_each_reports_failures() {
        #[derive(Debug)]
        struct Case {
            x: i32,
        }

        let cases = [Case { x: 1 }, Case { x: 2 }];

        cases.test_each(|&Case { x }| {
            assert_eq!(x % 2, 0);
        });
    }
}
