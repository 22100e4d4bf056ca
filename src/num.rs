//! Wide integer support for 256 bit columns.
//!
//! The predicate core only needs ordering, the domain extremes and single-step
//! successor/predecessor arithmetic from 256 bit values, so [`I256`] stays a
//! minimal two-limb type instead of pulling in a big-integer crate.

use std::{cmp::Ordering, fmt};

/// Signed 256 bit integer in two's complement, split into a signed high limb
/// and an unsigned low limb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct I256 {
    hi: i128,
    lo: u128,
}

impl I256 {
    /// Smallest representable value.
    pub const MIN: Self = Self {
        hi: i128::MIN,
        lo: 0,
    };

    /// Largest representable value.
    pub const MAX: Self = Self {
        hi: i128::MAX,
        lo: u128::MAX,
    };

    /// Zero.
    pub const ZERO: Self = Self { hi: 0, lo: 0 };

    /// Builds a value from raw limbs.
    #[must_use]
    pub const fn from_limbs(hi: i128, lo: u128) -> Self {
        Self { hi, lo }
    }

    /// High limb.
    #[must_use]
    pub const fn high(self) -> i128 {
        self.hi
    }

    /// Low limb.
    #[must_use]
    pub const fn low(self) -> u128 {
        self.lo
    }

    /// Next larger value, `None` at [`I256::MAX`].
    #[must_use]
    pub fn checked_inc(self) -> Option<Self> {
        if self == Self::MAX {
            return None;
        }
        let (lo, carry) = self.lo.overflowing_add(1);
        Some(Self {
            hi: if carry { self.hi + 1 } else { self.hi },
            lo,
        })
    }

    /// Next smaller value, `None` at [`I256::MIN`].
    #[must_use]
    pub fn checked_dec(self) -> Option<Self> {
        if self == Self::MIN {
            return None;
        }
        let (lo, borrow) = self.lo.overflowing_sub(1);
        Some(Self {
            hi: if borrow { self.hi - 1 } else { self.hi },
            lo,
        })
    }

    /// True when the value fits into an `i128`.
    #[must_use]
    pub fn is_i128(self) -> bool {
        let sign = if (self.lo >> 127) != 0 { -1 } else { 0 };
        self.hi == sign
    }
}

impl From<i128> for I256 {
    fn from(v: i128) -> Self {
        Self {
            hi: if v < 0 { -1 } else { 0 },
            lo: v as u128,
        }
    }
}

impl From<i64> for I256 {
    fn from(v: i64) -> Self {
        Self::from(v as i128)
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Two's complement order: signed high limb first, unsigned low limb
        // as tie break.
        self.hi.cmp(&other.hi).then(self.lo.cmp(&other.lo))
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_i128() {
            write!(f, "{}", self.lo as i128)
        } else {
            write!(f, "0x{:032x}{:032x}", self.hi as u128, self.lo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_crosses_limb_boundary() {
        let small = I256::from(-1i128);
        let big = I256::from(1i128);
        assert!(small < big);
        assert!(I256::MIN < small);
        assert!(big < I256::MAX);
        assert!(I256::from_limbs(1, 0) > I256::from(i128::MAX));
    }

    #[test]
    fn inc_dec_carry() {
        let v = I256::from_limbs(0, u128::MAX);
        assert_eq!(v.checked_inc(), Some(I256::from_limbs(1, 0)));
        assert_eq!(I256::from_limbs(1, 0).checked_dec(), Some(v));
        assert_eq!(I256::MAX.checked_inc(), None);
        assert_eq!(I256::MIN.checked_dec(), None);
        assert_eq!(I256::from(-1i128).checked_inc(), Some(I256::ZERO));
    }

    #[test]
    fn display_small_values() {
        assert_eq!(I256::from(-42i128).to_string(), "-42");
        assert_eq!(I256::ZERO.to_string(), "0");
    }
}
