use crate::hash::{HashFamily, Symbol, POLY_BASE, POLY_MOD, WEIGHT_BASE};

/// Multiplicative inverse of the weighted-sum base modulo 2^64.
const WEIGHT_BASE_INV: u64 = inverse_mod_2_64(WEIGHT_BASE);

/// Newton iteration for `x` with `b·x ≡ 1 (mod 2^64)`. `b` must be odd.
const fn inverse_mod_2_64(b: u64) -> u64 {
    // Correct to 3 bits for any odd b; each step doubles the precision.
    let mut x = b;
    let mut i = 0;
    while i < 5 {
        x = x.wrapping_mul(2u64.wrapping_sub(b.wrapping_mul(x)));
        i += 1;
    }
    x
}

/// O(1) window update for the hash families that support one.
///
/// The constants depend only on the window length, so a strategy is built
/// once per pattern and reused for every step of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStrategy {
    Additive,
    /// `trailing_weight = 31^(m-1)` mod 2^64, the weight of the entering character.
    WeightedPositional { trailing_weight: u64 },
    /// `leading_weight = 31^(m-1) mod 1e9+7`, the weight of the leaving character.
    PolynomialModular { leading_weight: u64 },
    /// No incremental form; every window is hashed from scratch.
    Recompute,
}

impl RollingStrategy {
    pub fn for_family(family: HashFamily, window_len: usize) -> Self {
        let exp = window_len.saturating_sub(1);
        match family {
            HashFamily::Additive => RollingStrategy::Additive,
            HashFamily::WeightedPositional => RollingStrategy::WeightedPositional {
                trailing_weight: (0..exp).fold(1u64, |w, _| w.wrapping_mul(WEIGHT_BASE)),
            },
            HashFamily::PolynomialModular => RollingStrategy::PolynomialModular {
                leading_weight: pow_mod(POLY_BASE, exp as u64, POLY_MOD),
            },
            HashFamily::Crc32 | HashFamily::DualModulus => RollingStrategy::Recompute,
        }
    }

    pub fn is_rolling(&self) -> bool {
        !matches!(self, RollingStrategy::Recompute)
    }

    /// Digest of the next window, or `None` when the window has to be rehashed.
    #[inline]
    pub fn update(&self, old_digest: u64, old: u32, new: u32) -> Option<u64> {
        let old = old as u64;
        let new = new as u64;
        match *self {
            RollingStrategy::Additive => Some(old_digest.wrapping_sub(old).wrapping_add(new)),
            RollingStrategy::WeightedPositional { trailing_weight } => Some(
                old_digest
                    .wrapping_sub(old)
                    .wrapping_mul(WEIGHT_BASE_INV)
                    .wrapping_add(new.wrapping_mul(trailing_weight)),
            ),
            RollingStrategy::PolynomialModular { leading_weight } => {
                let leaving = (old % POLY_MOD) * leading_weight % POLY_MOD;
                let h = (old_digest + POLY_MOD - leaving) % POLY_MOD;
                Some((h * POLY_BASE + new % POLY_MOD) % POLY_MOD)
            }
            RollingStrategy::Recompute => None,
        }
    }
}

fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut result = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exp >>= 1;
    }
    result
}

/// Digest of a sliding window under one hash family.
pub struct RollingHash {
    family: HashFamily,
    strategy: RollingStrategy,
    digest: u64,
}

impl RollingHash {
    /// Hash the initial window and fix the strategy for its length.
    pub fn new<S: Symbol>(family: HashFamily, window: &[S]) -> Self {
        Self {
            family,
            strategy: RollingStrategy::for_family(family, window.len()),
            digest: family.digest(window),
        }
    }

    /// Slide the window by one: `old` leaves at the front, `new` enters at the
    /// back, `next_window` is the window after the slide. Returns `false` when
    /// the digest had to be recomputed from `next_window`.
    #[inline]
    pub fn rotate<S: Symbol>(&mut self, old: S, new: S, next_window: &[S]) -> bool {
        match self.strategy.update(self.digest, old.code(), new.code()) {
            Some(digest) => {
                self.digest = digest;
                true
            }
            None => {
                self.digest = self.family.digest(next_window);
                false
            }
        }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn strategy(&self) -> RollingStrategy {
        self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_base_inverse() {
        assert_eq!(WEIGHT_BASE.wrapping_mul(WEIGHT_BASE_INV), 1);
    }

    #[test]
    fn test_pow_mod() {
        assert_eq!(pow_mod(31, 0, POLY_MOD), 1);
        assert_eq!(pow_mod(31, 3, POLY_MOD), 29_791);
        assert_eq!(pow_mod(2, 40, POLY_MOD), (1u64 << 40) % POLY_MOD);
    }

    #[test]
    fn test_strategy_selection_is_by_family() {
        assert!(RollingStrategy::for_family(HashFamily::Additive, 4).is_rolling());
        assert!(RollingStrategy::for_family(HashFamily::WeightedPositional, 4).is_rolling());
        assert!(RollingStrategy::for_family(HashFamily::PolynomialModular, 4).is_rolling());
        assert!(!RollingStrategy::for_family(HashFamily::Crc32, 4).is_rolling());
        assert!(!RollingStrategy::for_family(HashFamily::DualModulus, 4).is_rolling());
    }

    #[test]
    fn test_strategy_agrees_with_family_flag() {
        for family in HashFamily::ALL {
            for m in [1, 5, 64] {
                assert_eq!(
                    RollingStrategy::for_family(family, m).is_rolling(),
                    family.is_rolling(),
                    "{:?}",
                    family
                );
            }
        }
    }

    #[test]
    fn test_init_deterministic() {
        let data = b"Hello, World!";
        for family in HashFamily::ALL {
            let h1 = RollingHash::new(family, data);
            let h2 = RollingHash::new(family, data);
            assert_eq!(h1.digest(), h2.digest());
        }
    }

    #[test]
    fn test_rotate_equals_fresh_init() {
        let data = b"ABCDE";
        for family in HashFamily::ALL {
            let mut rolling = RollingHash::new(family, &data[0..4]);
            rolling.rotate(data[0], data[4], &data[1..5]);

            let fresh = RollingHash::new(family, &data[1..5]);
            assert_eq!(rolling.digest(), fresh.digest(), "{:?}", family);
        }
    }

    #[test]
    fn test_rotate_across_whole_text() {
        let text: Vec<char> = "Алгоритм Рабина — Карпа ищет шаблон в тексте".chars().collect();
        for family in HashFamily::ALL {
            for m in [1, 2, 7, 20] {
                let mut rolling = RollingHash::new(family, &text[..m]);
                for i in 0..text.len() - m {
                    rolling.rotate(text[i], text[i + m], &text[i + 1..i + 1 + m]);
                    assert_eq!(
                        rolling.digest(),
                        family.digest(&text[i + 1..i + 1 + m]),
                        "{:?} m={} i={}",
                        family,
                        m,
                        i
                    );
                }
            }
        }
    }

    #[test]
    fn test_weighted_rotate_survives_wraparound() {
        // 31^13 already exceeds 2^64.
        let text: Vec<u8> = (0..200u32).map(|i| (i * 37 % 251) as u8).collect();
        let m = 40;
        let mut rolling = RollingHash::new(HashFamily::WeightedPositional, &text[..m]);
        for i in 0..text.len() - m {
            assert!(rolling.rotate(text[i], text[i + m], &text[i + 1..i + 1 + m]));
        }
        assert_eq!(
            rolling.digest(),
            HashFamily::WeightedPositional.digest(&text[text.len() - m..])
        );
    }

    #[test]
    fn test_recompute_reports_fallback() {
        let data = b"ABCDE";
        let mut rolling = RollingHash::new(HashFamily::Crc32, &data[0..4]);
        assert!(!rolling.rotate(data[0], data[4], &data[1..5]));
    }
}
