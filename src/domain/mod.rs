//! Variable domains.
//!
//! Item variables carry either a finite integer set ([`IntDomain`]) or a
//! real interval ([`RealDomain`]). Bin-count variables are always integer.
//! All range arguments on [`Domain`] use the half-open convention of bins:
//! `[lo, hi)` over `f64`.

mod int_domain;
mod real_domain;

pub use int_domain::IntDomain;
pub use real_domain::RealDomain;

pub(crate) use int_domain::integer_span;

/// The domain of a single variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Domain {
    /// Finite set of integers.
    Int(IntDomain),
    /// Closed real interval.
    Real(RealDomain),
}

impl Domain {
    pub fn is_empty(&self) -> bool {
        match self {
            Domain::Int(d) => d.is_empty(),
            Domain::Real(d) => d.is_empty(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        match self {
            Domain::Int(d) => d.is_fixed(),
            Domain::Real(d) => d.is_fixed(),
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Domain::Int(_))
    }

    /// Lower and upper bound, or `None` when empty.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Domain::Int(d) => Some((d.min()? as f64, d.max()? as f64)),
            Domain::Real(d) => (!d.is_empty()).then(|| (d.lower(), d.upper())),
        }
    }

    /// Whether some value lies in `[lo, hi)`.
    pub fn intersects(&self, lo: f64, hi: f64) -> bool {
        match self {
            Domain::Int(d) => integer_span(lo, hi).is_some_and(|(a, b)| d.intersects(a, b)),
            Domain::Real(d) => d.intersects(lo, hi),
        }
    }

    /// Removes the values in `[lo, hi)`. Returns whether the domain changed.
    pub fn remove_half_open(&mut self, lo: f64, hi: f64) -> bool {
        match self {
            Domain::Int(d) => integer_span(lo, hi).is_some_and(|(a, b)| d.remove_range(a, b)),
            Domain::Real(d) => d.remove_half_open(lo, hi),
        }
    }

    /// Removes every value below `value`.
    pub fn update_lower(&mut self, value: f64) -> bool {
        match self {
            Domain::Int(d) => {
                if value.is_nan() || value == f64::NEG_INFINITY {
                    return false;
                }
                let lo = value.ceil();
                if lo > i64::MAX as f64 {
                    let changed = !d.is_empty();
                    *d = IntDomain::default();
                    return changed;
                }
                lo > i64::MIN as f64 && d.remove_range(i64::MIN, lo as i64 - 1)
            }
            Domain::Real(d) => d.update_lower(value),
        }
    }

    /// Removes every value above `value`.
    pub fn update_upper(&mut self, value: f64) -> bool {
        match self {
            Domain::Int(d) => {
                if value.is_nan() || value == f64::INFINITY {
                    return false;
                }
                let hi = value.floor();
                if hi < i64::MIN as f64 {
                    let changed = !d.is_empty();
                    *d = IntDomain::default();
                    return changed;
                }
                hi < i64::MAX as f64 && d.remove_range(hi as i64 + 1, i64::MAX)
            }
            Domain::Real(d) => d.update_upper(value),
        }
    }
}

impl From<IntDomain> for Domain {
    fn from(d: IntDomain) -> Self {
        Domain::Int(d)
    }
}

impl From<RealDomain> for Domain {
    fn from(d: RealDomain) -> Self {
        Domain::Real(d)
    }
}
