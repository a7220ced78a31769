//! Modular index used for every walk around the roster.

use serde::{Deserialize, Serialize};

/// An index that wraps around a fixed modulus.
///
/// Holds `value % modulus`. A zero modulus is treated as one so the index
/// is always valid for a non-empty roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatingIndex {
    value: usize,
    modulus: usize,
}

impl RotatingIndex {
    /// Creates an index at `value` (reduced modulo `modulus`).
    pub fn new(value: usize, modulus: usize) -> Self {
        let modulus = modulus.max(1);
        Self {
            value: value % modulus,
            modulus,
        }
    }

    /// Current position.
    #[inline]
    pub fn get(&self) -> usize {
        self.value
    }

    /// The modulus.
    #[inline]
    pub fn modulus(&self) -> usize {
        self.modulus
    }

    /// Moves forward by `by` positions.
    pub fn advance(&mut self, by: usize) {
        self.value = (self.value + by % self.modulus) % self.modulus;
    }

    /// Position `by` steps ahead, without moving.
    #[inline]
    pub fn offset(&self, by: usize) -> usize {
        (self.value + by % self.modulus) % self.modulus
    }
}
