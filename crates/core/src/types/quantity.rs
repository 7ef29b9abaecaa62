//! Cart line quantities.
//!
//! A quantity is always in `[1, 99]`. Zero and negative requests are never a
//! quantity: callers turn them into a removal before constructing one.

use serde::{Deserialize, Serialize};

/// A cart line quantity in `[Quantity::MIN, Quantity::MAX]`.
///
/// Deserialization clamps out-of-range persisted values instead of failing, so
/// one bad line does not discard the rest of a stored cart. A stored cart drops
/// lines whose quantity is zero or less before they are decoded, so the lower
/// clamp only matters to other producers of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", from = "i64")]
pub struct Quantity(u8);

impl Quantity {
    /// Smallest representable quantity.
    pub const MIN: Self = Self(1);
    /// Largest quantity a single line may hold.
    pub const MAX: Self = Self(99);

    /// Clamp an arbitrary requested amount into `[1, 99]`.
    ///
    /// ```
    /// use shopstate_core::Quantity;
    ///
    /// assert_eq!(Quantity::clamped(150).get(), 99);
    /// assert_eq!(Quantity::clamped(0).get(), 1);
    /// assert_eq!(Quantity::clamped(7).get(), 7);
    /// ```
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        let bounded = requested.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0));
        // bounded is within 1..=99, so the conversion cannot fail
        Self(u8::try_from(bounded).unwrap_or(Self::MAX.0))
    }

    /// Clamp a requested amount, or `None` if it asks for zero or fewer.
    #[must_use]
    pub fn positive(requested: i64) -> Option<Self> {
        (requested > 0).then(|| Self::clamped(requested))
    }

    /// Add a signed delta, clamping the result into range.
    #[must_use]
    pub fn saturating_add(self, delta: i64) -> Self {
        Self::clamped(i64::from(self.0).saturating_add(delta))
    }

    /// The quantity as an integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        Self::from(quantity.0)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert_eq!(Quantity::positive(0), None);
        assert_eq!(Quantity::positive(-4), None);
        assert_eq!(Quantity::positive(3), Some(Quantity::clamped(3)));
    }

    #[test]
    fn test_deserialize_clamps() {
        let q: Quantity = serde_json::from_str("500").unwrap();
        assert_eq!(q, Quantity::MAX);
        let q: Quantity = serde_json::from_str("0").unwrap();
        assert_eq!(q, Quantity::MIN);
        assert_eq!(serde_json::to_string(&Quantity::clamped(5)).unwrap(), "5");
    }

    proptest! {
        #[test]
        fn prop_clamped_always_in_range(n in any::<i64>()) {
            let q = Quantity::clamped(n).get();
            prop_assert!((1..=99).contains(&q));
        }

        #[test]
        fn prop_saturating_add_matches_clamp(start in 1i64..=99, delta in -500i64..500) {
            let q = Quantity::clamped(start).saturating_add(delta);
            prop_assert_eq!(i64::from(q), (start + delta).clamp(1, 99));
        }
    }
}
