//! Order action: Sell or Buy

use std::fmt;

/// Direction of a rebalance order.
///
/// Sells are listed before buys in a plan: their proceeds fund the buys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Sell,
    Buy,
}

impl Action {
    /// Returns the opposite action.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Action::Buy => Action::Sell,
            Action::Sell => Action::Buy,
        }
    }

    /// Sort rank in the final order list.
    #[inline]
    pub(crate) fn priority(self) -> u8 {
        match self {
            Action::Sell => 0,
            Action::Buy => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        assert_eq!(Action::Buy.opposite(), Action::Sell);
        assert_eq!(Action::Sell.opposite().opposite(), Action::Sell);
    }

    #[test]
    fn sells_rank_first() {
        assert!(Action::Sell.priority() < Action::Buy.priority());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Action::Buy), "buy");
        assert_eq!(format!("{}", Action::Sell), "sell");
    }
}
