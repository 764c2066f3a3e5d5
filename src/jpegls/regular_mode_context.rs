use crate::constants::MAX_K_VALUE;
use crate::error::JpeglsError;
use crate::jpegls::traits::bit_wise_sign;

/// Statistics of one of the 365 regular mode contexts (ISO/IEC 14495-1, A.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularModeContext {
    a: i32,
    b: i32,
    c: i32,
    n: i32,
}

impl RegularModeContext {
    pub fn new(range: i32) -> Self {
        Self {
            a: Self::initialization_value_for_a(range),
            b: 0,
            c: 0,
            n: 1,
        }
    }

    /// Bias correction value C.
    pub fn c(&self) -> i32 {
        self.c
    }

    pub fn a(&self) -> i32 {
        self.a
    }

    pub fn b(&self) -> i32 {
        self.b
    }

    pub fn n(&self) -> i32 {
        self.n
    }

    /// Code segment A.11: -1 when the mapping must be inverted, 0 otherwise. Only k == 0 corrects.
    pub fn error_correction(&self, k: i32) -> i32 {
        if k != 0 {
            return 0;
        }
        bit_wise_sign(2 * self.b + self.n - 1)
    }

    // Code segment A.12 and A.13
    pub fn update_variables(
        &mut self,
        error_value: i32,
        near_lossless: i32,
        reset_threshold: i32,
    ) -> Result<(), JpeglsError> {
        debug_assert!(self.n != 0);

        self.a = self.a.saturating_add(error_value.abs());
        self.b = self.b.saturating_add(error_value.saturating_mul(2 * near_lossless + 1));

        if self.a >= 65536 * 256 || self.b.abs() >= 65536 * 256 {
            return Err(JpeglsError::InvalidData);
        }

        if self.n == reset_threshold {
            self.a >>= 1;
            self.b >>= 1;
            self.n >>= 1;
        }

        self.n += 1;

        const MAX_C: i32 = 127;
        const MIN_C: i32 = -128;

        if self.b + self.n <= 0 {
            self.b += self.n;
            if self.b <= -self.n {
                self.b = -self.n + 1;
            }
            if self.c > MIN_C {
                self.c -= 1;
            }
        } else if self.b > 0 {
            self.b -= self.n;
            if self.b > 0 {
                self.b = 0;
            }
            if self.c < MAX_C {
                self.c += 1;
            }
        }
        Ok(())
    }

    /// Code segment A.10: smallest k with N * 2^k >= A.
    pub fn golomb_coding_parameter(&self) -> Result<i32, JpeglsError> {
        let a = self.a as i64;
        let n = self.n as i64;
        let mut k = 0;
        while (n << k) < a && k < MAX_K_VALUE {
            k += 1;
        }

        if k == MAX_K_VALUE {
            return Err(JpeglsError::InvalidData);
        }
        Ok(k)
    }

    fn initialization_value_for_a(range: i32) -> i32 {
        std::cmp::max(2, (range + 32) / 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_initial_state() {
        let context = RegularModeContext::new(256);
        assert_eq!((context.a(), context.b(), context.c(), context.n()), (4, 0, 0, 1));
        assert_eq!(RegularModeContext::new(4).a(), 2);
        assert_eq!(RegularModeContext::new(65536).a(), 1024);
    }

    #[test]
    fn test_golomb_parameter_follows_statistics() {
        let mut context = RegularModeContext::new(256);
        assert_eq!(context.golomb_coding_parameter(), Ok(2));

        for _ in 0..10 {
            context.update_variables(40, 0, 64).unwrap();
        }
        let k = context.golomb_coding_parameter().unwrap();
        assert!((context.n() as i64) << k >= context.a() as i64);
        assert!(k == 0 || ((context.n() as i64) << (k - 1)) < context.a() as i64);
    }

    #[test]
    fn test_bias_stays_in_bounds() {
        let mut context = RegularModeContext::new(256);
        for _ in 0..1000 {
            context.update_variables(5, 0, 64).unwrap();
            assert!(context.b() <= 0 && context.b() > -context.n());
        }
        assert_eq!(context.c(), 127);

        for _ in 0..1000 {
            context.update_variables(-100, 0, 64).unwrap();
        }
        assert_eq!(context.c(), -128);
        assert!(context.n() <= 64);
    }

    #[test]
    fn test_reset_halves_counters() {
        let mut context = RegularModeContext::new(256);
        for _ in 0..63 {
            context.update_variables(1, 0, 64).unwrap();
        }
        assert_eq!(context.n(), 64);
        context.update_variables(1, 0, 64).unwrap();
        assert_eq!(context.n(), 33);
    }

    #[test]
    fn test_error_correction() {
        let mut context = RegularModeContext::new(256);
        assert_eq!(context.error_correction(0), 0);
        context.update_variables(-3, 0, 64).unwrap();
        assert_eq!(context.error_correction(0), -1);
        assert_eq!(context.error_correction(2), 0);
    }

    #[test]
    fn test_overflowing_statistics_are_rejected() {
        let mut context = RegularModeContext::new(65536);
        let mut result = Ok(());
        for _ in 0..2000 {
            result = context.update_variables(32767, 0, 65535);
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(JpeglsError::InvalidData));
    }

    #[test]
    fn test_golomb_parameter_is_monotonic_in_a() {
        for n in [1, 2, 37, 64, 255, 65535] {
            let mut previous_k = 0;
            let mut a = 1;
            while a < 65536 * 256 {
                let context = RegularModeContext { a, b: 0, c: 0, n };
                let k = context.golomb_coding_parameter().unwrap();
                assert!(k >= previous_k, "n={n} a={a}");
                assert!((n as i64) << k >= a as i64);
                previous_k = k;
                a += 1 + a / 7;
            }
        }
    }

    #[test]
    fn test_statistics_stay_in_bounds_for_random_errors() {
        let mut rng = StdRng::seed_from_u64(0x4A4C53);
        for _ in 0..200 {
            let maximum_sample_value = (1 << rng.random_range(2..=16)) - 1;
            let near_lossless = rng.random_range(0..=(maximum_sample_value / 2).min(255));
            let range = (maximum_sample_value + 2 * near_lossless) / (2 * near_lossless + 1) + 1;
            let reset_threshold = rng.random_range(3..=255);

            let mut context = RegularModeContext::new(range);
            for _ in 0..500 {
                let error_value = rng.random_range(-(range / 2)..=range / 2);
                context.update_variables(error_value, near_lossless, reset_threshold).unwrap();

                assert_ne!(context.n(), 0);
                assert!(context.n() <= reset_threshold);
                assert!(context.a() < 65536 * 256);
                assert!(context.b().abs() < 65536 * 256);
                assert!(-context.n() < context.b() && context.b() <= 0);
                assert!((-128..=127).contains(&context.c()));
                assert!(context.golomb_coding_parameter().is_ok());
            }
        }
    }
}
