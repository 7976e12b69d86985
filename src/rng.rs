use crate::RandomSource;

/// Simple, non-cryptographically secure random number generator.
///
/// See <https://en.wikipedia.org/wiki/Xorshift>. Seedable and deterministic,
/// which is what the filler constructors and the test suite need; callers
/// wanting a mainstream generator can enable the `random` feature and pass a
/// `fastrand::Rng` instead.
pub struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    pub fn new(seed: u64) -> XorShiftRng {
        XorShiftRng {
            // Zero is a fixed point of the xorshift step.
            state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed },
        }
    }

    /// Return a random value in the range [0, 2^64]
    pub fn next_u64(&mut self) -> u64 {
        let mut tmp = self.state;
        tmp ^= tmp << 13;
        tmp ^= tmp >> 7;
        tmp ^= tmp << 17;
        self.state = tmp;
        tmp
    }

    /// Return a random value in the range [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // Number of most significant bits to use
        let n_bits = 40;
        let scale = 1.0 / (1u64 << n_bits) as f32;
        let val = self.next_u64() >> (64 - n_bits);
        (val as f32) * scale
    }

    /// Return a random value in the range [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // f64 has a 53-bit significand.
        let n_bits = 53;
        let scale = 1.0 / (1u64 << n_bits) as f64;
        let val = self.next_u64() >> (64 - n_bits);
        (val as f64) * scale
    }

    /// Return an infinite iterator that yields random values of type `T`.
    pub fn iter<T>(&mut self) -> impl Iterator<Item = T> + '_
    where
        Self: RandomSource<T>,
    {
        std::iter::from_fn(|| Some(self.next()))
    }
}

impl RandomSource<f32> for XorShiftRng {
    fn next(&mut self) -> f32 {
        self.next_f32()
    }
}

impl RandomSource<f64> for XorShiftRng {
    fn next(&mut self) -> f64 {
        self.next_f64()
    }
}

macro_rules! impl_random_source {
    ($ty:ty) => {
        impl RandomSource<$ty> for XorShiftRng {
            fn next(&mut self) -> $ty {
                // Take the least significant bits of the 64bit value as the
                // result.
                self.next_u64() as $ty
            }
        }
    };
}

impl_random_source!(u8);
impl_random_source!(i8);
impl_random_source!(i16);
impl_random_source!(u16);
impl_random_source!(i32);
impl_random_source!(u32);
impl_random_source!(i64);
impl_random_source!(u64);

/// Drive fillers with a [`fastrand::Rng`].
#[cfg(feature = "random")]
mod fastrand_source {
    use crate::RandomSource;

    impl RandomSource<f32> for fastrand::Rng {
        fn next(&mut self) -> f32 {
            self.f32()
        }
    }

    impl RandomSource<f64> for fastrand::Rng {
        fn next(&mut self) -> f64 {
            self.f64()
        }
    }

    macro_rules! impl_fastrand_source {
        ($ty:ty) => {
            impl RandomSource<$ty> for fastrand::Rng {
                fn next(&mut self) -> $ty {
                    self.u64(..) as $ty
                }
            }
        };
    }

    impl_fastrand_source!(u8);
    impl_fastrand_source!(i8);
    impl_fastrand_source!(i16);
    impl_fastrand_source!(u16);
    impl_fastrand_source!(i32);
    impl_fastrand_source!(u32);
    impl_fastrand_source!(i64);
    impl_fastrand_source!(u64);
}

#[cfg(test)]
mod tests {
    use super::XorShiftRng;

    #[test]
    fn test_f64_range_and_determinism() {
        let mut rng = XorShiftRng::new(1234);
        let a: Vec<f64> = rng.iter().take(100).collect();
        assert!(a.iter().all(|&x| (0.0..1.0).contains(&x)));

        let mut rng = XorShiftRng::new(1234);
        let b: Vec<f64> = rng.iter().take(100).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_f32_range() {
        let mut rng = XorShiftRng::new(5678);
        assert!(rng.iter::<f32>().take(100).all(|x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_seeds_diverge() {
        let mut a = XorShiftRng::new(1);
        let mut b = XorShiftRng::new(2);
        let xs: Vec<u64> = a.iter().take(4).collect();
        let ys: Vec<u64> = b.iter().take(4).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = XorShiftRng::new(0);
        let xs: Vec<u64> = rng.iter().take(4).collect();
        assert!(xs.iter().any(|&x| x != 0));
    }

    #[test]
    fn test_int_source() {
        let mut rng = XorShiftRng::new(42);
        let xs: Vec<i32> = rng.iter().take(10).collect();
        assert_eq!(xs.len(), 10);
    }

    #[cfg(feature = "random")]
    #[test]
    fn test_fastrand_source() {
        use crate::RandomSource;

        let mut rng = fastrand::Rng::with_seed(7);
        let x: f64 = RandomSource::<f64>::next(&mut rng);
        assert!((0.0..1.0).contains(&x));
    }
}
