//! 256-bit machine word

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};

use primitive_types::U256;

use crate::error::PrimitiveError;

/// 256-bit unsigned machine word.
///
/// Stored as four `u64` limbs in little-endian limb order (limb 0 holds bits
/// 0..64). All arithmetic is modulo 2^256: `+` and `-` wrap, they never panic.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(U256);

impl Word {
    /// Size of a word in bytes
    pub const BYTES: usize = 32;

    /// 0
    pub const ZERO: Word = Word(U256([0, 0, 0, 0]));

    /// 1
    pub const ONE: Word = Word(U256([1, 0, 0, 0]));

    /// 2^256 - 1
    pub const MAX: Word = Word(U256([u64::MAX; 4]));

    /// Create from a `u64`
    pub const fn from_u64(value: u64) -> Self {
        Word(U256([value, 0, 0, 0]))
    }

    /// Create from little-endian limbs
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Word(U256(limbs))
    }

    /// Little-endian limbs
    pub const fn limbs(&self) -> [u64; 4] {
        self.0 .0
    }

    /// Create from exactly 32 big-endian bytes
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Word(U256::from_big_endian(&bytes))
    }

    /// Create from up to 32 big-endian bytes, zero-padded on the left
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, PrimitiveError> {
        if bytes.len() > Self::BYTES {
            return Err(PrimitiveError::InvalidLength {
                expected: Self::BYTES,
                got: bytes.len(),
            });
        }
        Ok(Word(U256::from_big_endian(bytes)))
    }

    /// Big-endian byte representation
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    /// Parse a hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        U256::from_str_radix(digits, 16)
            .map(Word)
            .map_err(|e| PrimitiveError::InvalidHex(format!("{digits}: {e:?}")))
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lowest 64 bits
    pub fn low_u64(&self) -> u64 {
        self.0 .0[0]
    }

    /// Value as `usize`, or `None` if it does not fit
    pub fn to_usize(&self) -> Option<usize> {
        let [low, rest @ ..] = self.0 .0;
        if rest.iter().any(|limb| *limb != 0) {
            return None;
        }
        usize::try_from(low).ok()
    }

    /// `(self + rhs) mod 2^256`
    pub fn wrapping_add(self, rhs: Word) -> Word {
        Word(self.0.overflowing_add(rhs.0).0)
    }

    /// `(self - rhs) mod 2^256`
    pub fn wrapping_sub(self, rhs: Word) -> Word {
        Word(self.0.overflowing_sub(rhs.0).0)
    }

    /// `(self * rhs) mod 2^256`
    pub fn wrapping_mul(self, rhs: Word) -> Word {
        Word(self.0.overflowing_mul(rhs.0).0)
    }

    /// `self^exponent mod 2^256` by square-and-multiply. `0^0` is 1.
    pub fn wrapping_pow(self, exponent: Word) -> Word {
        let mut base = self.0;
        let mut exp = exponent.0;
        let mut result = U256::one();
        while !exp.is_zero() {
            if exp.bit(0) {
                result = result.overflowing_mul(base).0;
            }
            base = base.overflowing_mul(base).0;
            exp = exp >> 1;
        }
        Word(result)
    }

    /// Integer division; division by zero yields zero
    pub fn div(self, rhs: Word) -> Word {
        Word(self.0.checked_div(rhs.0).unwrap_or_default())
    }

    /// Remainder; a zero modulus yields zero
    pub fn rem(self, rhs: Word) -> Word {
        Word(self.0.checked_rem(rhs.0).unwrap_or_default())
    }

    /// Index of the highest set bit, counting from 0. Returns 0 for zero.
    pub fn highest_set_bit(&self) -> u32 {
        for (index, limb) in self.0 .0.iter().enumerate().rev() {
            if *limb != 0 {
                return index as u32 * 64 + (63 - limb.leading_zeros());
            }
        }
        0
    }

    /// Minimal number of bytes needed to hold the value. Returns 0 for zero.
    pub fn byte_len(&self) -> u32 {
        if self.is_zero() {
            0
        } else {
            self.highest_set_bit() / 8 + 1
        }
    }
}

impl Add for Word {
    type Output = Word;

    fn add(self, rhs: Word) -> Word {
        self.wrapping_add(rhs)
    }
}

impl Sub for Word {
    type Output = Word;

    fn sub(self, rhs: Word) -> Word {
        self.wrapping_sub(rhs)
    }
}

impl BitAnd for Word {
    type Output = Word;

    fn bitand(self, rhs: Word) -> Word {
        Word(self.0 & rhs.0)
    }
}

impl BitOr for Word {
    type Output = Word;

    fn bitor(self, rhs: Word) -> Word {
        Word(self.0 | rhs.0)
    }
}

impl BitXor for Word {
    type Output = Word;

    fn bitxor(self, rhs: Word) -> Word {
        Word(self.0 ^ rhs.0)
    }
}

impl Not for Word {
    type Output = Word;

    fn not(self) -> Word {
        Word(!self.0)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Word::from_u64(value)
    }
}

impl From<u128> for Word {
    fn from(value: u128) -> Self {
        Word(U256::from(value))
    }
}

impl From<bool> for Word {
    fn from(value: bool) -> Self {
        if value {
            Word::ONE
        } else {
            Word::ZERO
        }
    }
}

impl From<usize> for Word {
    fn from(value: usize) -> Self {
        Word(U256::from(value))
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Word(value)
    }
}

impl From<Word> for U256 {
    fn from(value: Word) -> Self {
        value.0
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:#x})", self)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        write!(f, "{:x}", self.0)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Word;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Word {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&format_args!("{:#x}", self))
        }
    }

    impl<'de> Deserialize<'de> for Word {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Word::from_hex(&s).map_err(de::Error::custom)
        }
    }
}
