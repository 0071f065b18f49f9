use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const POLY_BASE: u64 = 31;
pub const POLY_MOD: u64 = 1_000_000_007;
pub const WEIGHT_BASE: u64 = 31;

const DOUBLE_BASE_2: u64 = 37;
const DOUBLE_MOD_2: u64 = 1_000_000_009;
const CRC32_POLY: u32 = 0xEDB8_8320;

/// A code unit the search engine can hash and compare.
pub trait Symbol: Copy + Eq {
    fn code(self) -> u32;
}

impl Symbol for u8 {
    #[inline]
    fn code(self) -> u32 {
        self as u32
    }
}

impl Symbol for u16 {
    #[inline]
    fn code(self) -> u32 {
        self as u32
    }
}

impl Symbol for char {
    #[inline]
    fn code(self) -> u32 {
        self as u32
    }
}

/// The hash constructions a search can be configured with.
///
/// Digests of different families are never compared against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFamily {
    /// Sum of character codes.
    Additive,
    /// `Σ code(c_i) · 31^i`, wrapping at 2^64.
    WeightedPositional,
    /// `Σ code(c_i) · 31^(m-1-i) mod 1e9+7`.
    PolynomialModular,
    /// Reflected CRC-32 register over the codes, no init or final inversion.
    Crc32,
    /// Two polynomial hashes packed as `(h1 << 32) | h2`.
    DualModulus,
}

impl HashFamily {
    pub const ALL: [HashFamily; 5] = [
        HashFamily::Additive,
        HashFamily::WeightedPositional,
        HashFamily::PolynomialModular,
        HashFamily::Crc32,
        HashFamily::DualModulus,
    ];

    /// Hash a whole window from scratch.
    pub fn digest<S: Symbol>(self, window: &[S]) -> u64 {
        match self {
            HashFamily::Additive => additive(window),
            HashFamily::WeightedPositional => weighted_positional(window),
            HashFamily::PolynomialModular => polynomial_modular(window),
            HashFamily::Crc32 => crc32(window) as u64,
            HashFamily::DualModulus => dual_modulus(window),
        }
    }

    /// Whether the family has an O(1) window update.
    pub fn is_rolling(self) -> bool {
        match self {
            HashFamily::Additive
            | HashFamily::WeightedPositional
            | HashFamily::PolynomialModular => true,
            HashFamily::Crc32 | HashFamily::DualModulus => false,
        }
    }

    /// Name used as the key of saved measurements.
    pub fn name(self) -> &'static str {
        match self {
            HashFamily::Additive => "simple_hash",
            HashFamily::WeightedPositional => "weighted_sum_hash",
            HashFamily::PolynomialModular => "polynomial_hash",
            HashFamily::Crc32 => "rolling_crc32",
            HashFamily::DualModulus => "double_hash",
        }
    }
}

pub fn additive<S: Symbol>(window: &[S]) -> u64 {
    window
        .iter()
        .fold(0u64, |h, &c| h.wrapping_add(c.code() as u64))
}

pub fn weighted_positional<S: Symbol>(window: &[S]) -> u64 {
    let mut h: u64 = 0;
    let mut weight: u64 = 1;
    for &c in window {
        h = h.wrapping_add((c.code() as u64).wrapping_mul(weight));
        weight = weight.wrapping_mul(WEIGHT_BASE);
    }
    h
}

pub fn polynomial_modular<S: Symbol>(window: &[S]) -> u64 {
    horner(window, POLY_BASE, POLY_MOD)
}

pub fn crc32<S: Symbol>(window: &[S]) -> u32 {
    let mut crc: u32 = 0;
    for &c in window {
        crc ^= c.code();
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32_POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

pub fn dual_modulus<S: Symbol>(window: &[S]) -> u64 {
    let h1 = horner(window, POLY_BASE, POLY_MOD);
    let h2 = horner(window, DOUBLE_BASE_2, DOUBLE_MOD_2);
    (h1 << 32) | h2
}

/// `(h·base + code) mod modulus` over the window. Codes are reduced first so
/// the product never leaves `u64` for moduli below 2^32.
fn horner<S: Symbol>(window: &[S], base: u64, modulus: u64) -> u64 {
    window.iter().fold(0u64, |h, &c| {
        (h * base + c.code() as u64 % modulus) % modulus
    })
}

/// How windows are compared: directly, or through a hash family first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Baseline: character-wise comparison of every window, no hashing.
    Direct,
    Hashed(HashFamily),
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Direct,
        Method::Hashed(HashFamily::Additive),
        Method::Hashed(HashFamily::WeightedPositional),
        Method::Hashed(HashFamily::PolynomialModular),
        Method::Hashed(HashFamily::Crc32),
        Method::Hashed(HashFamily::DualModulus),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Direct => "linear_search",
            Method::Hashed(family) => family.name(),
        }
    }
}

impl From<HashFamily> for Method {
    fn from(family: HashFamily) -> Self {
        Method::Hashed(family)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown hash function '{0}' (expected one of: direct, additive, weighted, polynomial, crc32, double)")]
pub struct ParseMethodError(pub String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "linear" | "linear_search" => Method::Direct,
            "additive" | "simple" | "simple_hash" => HashFamily::Additive.into(),
            "weighted" | "weighted-positional" | "weighted_sum_hash" => {
                HashFamily::WeightedPositional.into()
            }
            "polynomial" | "polynomial-modular" | "polynomial_hash" => {
                HashFamily::PolynomialModular.into()
            }
            "crc32" | "rolling_crc32" => HashFamily::Crc32.into(),
            "double" | "dual-modulus" | "double_hash" => HashFamily::DualModulus.into(),
            _ => return Err(ParseMethodError(s.to_string())),
        };
        Ok(method)
    }
}
