use core::fmt;
use num::{BigUint, One, Zero};

/// Bitmask over board positions. Bit `i` is set once position `i` has been
/// used by an accepted word. Bits are only ever added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Coverage(BigUint);

impl Coverage {
    pub fn empty() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_positions(positions: &[usize]) -> Self {
        Self::empty().with_positions(positions)
    }

    pub fn with_positions(&self, positions: &[usize]) -> Self {
        let mut state = self.0.clone();
        for &p in positions {
            state |= BigUint::one() << p;
        }
        Self(state)
    }

    pub fn contains(&self, position: usize) -> bool {
        !((&self.0 >> position) & BigUint::one()).is_zero()
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_superset_of(&self, other: &Coverage) -> bool {
        (&self.0 & &other.0) == other.0
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Fixed-width binary string, most significant position first.
    pub fn to_binary(&self, width: usize) -> String {
        format!("{:0width$b}", self.0, width = width)
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
