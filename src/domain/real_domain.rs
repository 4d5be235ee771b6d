//! Real interval domains.

/// A closed real interval `[lo, hi]`. Empty when `lo > hi`.
///
/// Interior holes cannot be represented: removing a sub-interval strictly
/// inside the domain leaves it unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RealDomain {
    lo: f64,
    hi: f64,
}

impl RealDomain {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn lower(&self) -> f64 {
        self.lo
    }

    pub fn upper(&self) -> f64 {
        self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi || self.lo.is_nan() || self.hi.is_nan()
    }

    pub fn is_fixed(&self) -> bool {
        self.lo == self.hi
    }

    /// Whether the domain meets the half-open interval `[lo, hi)`.
    pub fn intersects(&self, lo: f64, hi: f64) -> bool {
        !self.is_empty() && self.hi >= lo && self.lo < hi
    }

    /// Raises the lower bound. Returns whether it moved.
    pub fn update_lower(&mut self, value: f64) -> bool {
        if value > self.lo {
            self.lo = value;
            true
        } else {
            false
        }
    }

    /// Lowers the upper bound. Returns whether it moved.
    pub fn update_upper(&mut self, value: f64) -> bool {
        if value < self.hi {
            self.hi = value;
            true
        } else {
            false
        }
    }

    /// Removes the half-open interval `[lo, hi)` when it covers one end of
    /// the domain. Returns whether the domain changed.
    pub fn remove_half_open(&mut self, lo: f64, hi: f64) -> bool {
        if !self.intersects(lo, hi) {
            return false;
        }
        match (lo <= self.lo, hi > self.hi) {
            (true, true) => {
                self.lo = hi;
                true
            }
            (true, false) => self.update_lower(hi),
            (false, true) => self.update_upper(lo.next_down()),
            (false, false) => false,
        }
    }
}
