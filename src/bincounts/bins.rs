//! Bin layouts.

use crate::domain::Domain;
use crate::error::BincountsError;

/// A half-open interval `[lo, hi)` of the value range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
}

impl Bin {
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value < self.hi
    }
}

/// An ordered sequence of non-overlapping bins.
///
/// # Examples
///
/// ```
/// use u_bincounts::bincounts::BinLayout;
///
/// let layout = BinLayout::from_boundaries(&[1.0, 3.0, 5.0]).unwrap();
/// assert_eq!(layout.len(), 2);
/// assert_eq!(layout.bin_of(2.9), Some(0));
/// assert_eq!(layout.bin_of(3.0), Some(1));
/// assert_eq!(layout.bin_of(5.0), None);
///
/// assert!(BinLayout::from_boundaries(&[1.0, 1.0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinLayout {
    bins: Vec<Bin>,
}

impl BinLayout {
    /// Contiguous bins `[b[0], b[1]), [b[1], b[2]), ...`.
    pub fn from_boundaries(boundaries: &[f64]) -> Result<Self, BincountsError> {
        if boundaries.len() < 2 {
            return Err(BincountsError::Configuration(format!(
                "at least two bin boundaries are required, got {}",
                boundaries.len()
            )));
        }
        if boundaries.iter().any(|b| b.is_nan()) {
            return Err(BincountsError::Configuration(
                "bin boundaries must not be NaN".into(),
            ));
        }
        if let Some(w) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BincountsError::Configuration(format!(
                "bin boundaries must be strictly increasing, got {} then {}",
                w[0], w[1]
            )));
        }
        let bins = boundaries
            .windows(2)
            .map(|w| Bin { lo: w[0], hi: w[1] })
            .collect();
        Ok(Self { bins })
    }

    /// Contiguous bins over integer boundaries.
    pub fn from_int_boundaries(boundaries: &[i64]) -> Result<Self, BincountsError> {
        let boundaries: Vec<f64> = boundaries.iter().map(|&b| b as f64).collect();
        Self::from_boundaries(&boundaries)
    }

    /// Explicit `(lo, hi)` bins, sorted and non-overlapping. Gaps between
    /// consecutive bins are allowed.
    pub fn from_bins(bins: &[(f64, f64)]) -> Result<Self, BincountsError> {
        if bins.is_empty() {
            return Err(BincountsError::Configuration(
                "at least one bin is required".into(),
            ));
        }
        for &(lo, hi) in bins {
            if lo.is_nan() || hi.is_nan() || lo >= hi {
                return Err(BincountsError::Configuration(format!(
                    "bin [{lo}, {hi}) is empty"
                )));
            }
        }
        if let Some(w) = bins.windows(2).find(|w| w[0].1 > w[1].0) {
            return Err(BincountsError::Configuration(format!(
                "bins [{}, {}) and [{}, {}) overlap or are out of order",
                w[0].0, w[0].1, w[1].0, w[1].1
            )));
        }
        Ok(Self {
            bins: bins.iter().map(|&(lo, hi)| Bin { lo, hi }).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bin(&self, index: usize) -> Bin {
        self.bins[index]
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Whether consecutive bins share their boundary.
    pub fn is_contiguous(&self) -> bool {
        self.bins.windows(2).all(|w| w[0].hi == w[1].lo)
    }

    /// The bin containing `value`.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        let idx = self.bins.partition_point(|b| b.hi <= value);
        self.bins
            .get(idx)
            .filter(|b| b.contains(value))
            .map(|_| idx)
    }

    /// The half-open regions covered by no bin, including the unbounded
    /// regions below the first and above the last bin.
    pub fn gaps(&self) -> Vec<Bin> {
        let mut gaps = Vec::with_capacity(self.bins.len() + 1);
        let mut cursor = f64::NEG_INFINITY;
        for bin in &self.bins {
            if cursor < bin.lo {
                gaps.push(Bin {
                    lo: cursor,
                    hi: bin.lo,
                });
            }
            cursor = bin.hi;
        }
        if cursor < f64::INFINITY {
            gaps.push(Bin {
                lo: cursor,
                hi: f64::INFINITY,
            });
        }
        gaps
    }

    /// Whether every value of `domain` lies in some bin.
    pub fn covers(&self, domain: &Domain) -> bool {
        !self.gaps().iter().any(|g| domain.intersects(g.lo, g.hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntDomain, RealDomain};

    #[test]
    fn test_from_boundaries() {
        let layout = BinLayout::from_int_boundaries(&[1, 3, 4]).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.bin(0), Bin { lo: 1.0, hi: 3.0 });
        assert_eq!(layout.bin(1), Bin { lo: 3.0, hi: 4.0 });
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_rejects_malformed_boundaries() {
        assert!(BinLayout::from_boundaries(&[1.0]).is_err());
        assert!(BinLayout::from_boundaries(&[3.0, 1.0]).is_err());
        assert!(BinLayout::from_boundaries(&[0.0, f64::NAN]).is_err());
        assert!(BinLayout::from_bins(&[]).is_err());
        assert!(BinLayout::from_bins(&[(0.0, 2.0), (1.0, 3.0)]).is_err());
        assert!(BinLayout::from_bins(&[(2.0, 2.0)]).is_err());
    }

    #[test]
    fn test_gapped_layout() {
        let layout = BinLayout::from_bins(&[(0.0, 2.0), (5.0, 6.0)]).unwrap();
        assert!(!layout.is_contiguous());
        assert_eq!(layout.bin_of(3.0), None);
        assert_eq!(layout.bin_of(5.5), Some(1));

        let gaps = layout.gaps();
        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[1], Bin { lo: 2.0, hi: 5.0 });
        assert_eq!(gaps[0].lo, f64::NEG_INFINITY);
        assert_eq!(gaps[2].hi, f64::INFINITY);
    }

    #[test]
    fn test_covers() {
        let layout = BinLayout::from_boundaries(&[1.0, 3.0, 5.0]).unwrap();
        assert!(layout.covers(&Domain::Int(IntDomain::from_values([1, 4]))));
        assert!(!layout.covers(&Domain::Int(IntDomain::from_values([1, 5]))));
        assert!(layout.covers(&Domain::Real(RealDomain::new(1.0, 4.9))));
        assert!(!layout.covers(&Domain::Real(RealDomain::new(0.5, 2.0))));
    }
}
