//! Finite integer domains.

/// A finite set of integers stored as sorted, disjoint, non-adjacent
/// inclusive ranges.
///
/// # Examples
///
/// ```
/// use u_bincounts::domain::IntDomain;
///
/// let d = IntDomain::from_values([1, 2, 4, 5, 9]);
/// assert_eq!(d.ranges(), &[(1, 2), (4, 5), (9, 9)]);
/// assert_eq!(d.size(), 5);
/// assert!(d.contains(4));
/// assert!(!d.contains(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntDomain {
    ranges: Vec<(i64, i64)>,
}

impl IntDomain {
    /// Creates the domain `[lo, hi]`. Empty when `lo > hi`.
    pub fn range(lo: i64, hi: i64) -> Self {
        if lo > hi {
            return Self::default();
        }
        Self {
            ranges: vec![(lo, hi)],
        }
    }

    /// Creates a single-value domain.
    pub fn singleton(value: i64) -> Self {
        Self::range(value, value)
    }

    /// Creates a domain from arbitrary values (duplicates allowed).
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        let mut values: Vec<i64> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();

        let mut ranges: Vec<(i64, i64)> = Vec::new();
        for v in values {
            match ranges.last_mut() {
                Some(last) if last.1.checked_add(1) == Some(v) => last.1 = v,
                _ => ranges.push((v, v)),
            }
        }
        Self { ranges }
    }

    /// The underlying inclusive ranges.
    pub fn ranges(&self) -> &[(i64, i64)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of values in the domain.
    pub fn size(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(a, b)| (b as i128 - a as i128 + 1).min(u64::MAX as i128) as u64)
            .fold(0u64, u64::saturating_add)
    }

    pub fn min(&self) -> Option<i64> {
        self.ranges.first().map(|r| r.0)
    }

    pub fn max(&self) -> Option<i64> {
        self.ranges.last().map(|r| r.1)
    }

    /// Whether exactly one value remains.
    pub fn is_fixed(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].0 == self.ranges[0].1
    }

    pub fn contains(&self, value: i64) -> bool {
        let idx = self.ranges.partition_point(|&(_, b)| b < value);
        self.ranges.get(idx).is_some_and(|&(a, _)| a <= value)
    }

    /// Iterates over all values in increasing order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.iter().flat_map(|&(a, b)| a..=b)
    }

    /// Whether some value lies in `[lo, hi]`.
    pub fn intersects(&self, lo: i64, hi: i64) -> bool {
        if lo > hi {
            return false;
        }
        let idx = self.ranges.partition_point(|&(_, b)| b < lo);
        self.ranges.get(idx).is_some_and(|&(a, _)| a <= hi)
    }

    /// Removes every value in `[lo, hi]`. Returns whether anything was removed.
    pub fn remove_range(&mut self, lo: i64, hi: i64) -> bool {
        if !self.intersects(lo, hi) {
            return false;
        }
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for &(a, b) in &self.ranges {
            if b < lo || a > hi {
                kept.push((a, b));
                continue;
            }
            // a < lo implies lo > i64::MIN, b > hi implies hi < i64::MAX
            if a < lo {
                kept.push((a, lo - 1));
            }
            if b > hi {
                kept.push((hi + 1, b));
            }
        }
        self.ranges = kept;
        true
    }

    /// Keeps only the values in `[lo, hi]`. Returns whether anything was removed.
    pub fn retain_range(&mut self, lo: i64, hi: i64) -> bool {
        if lo > hi {
            let changed = !self.is_empty();
            self.ranges.clear();
            return changed;
        }
        let mut changed = false;
        if lo > i64::MIN {
            changed |= self.remove_range(i64::MIN, lo - 1);
        }
        if hi < i64::MAX {
            changed |= self.remove_range(hi + 1, i64::MAX);
        }
        changed
    }
}

/// Maps the half-open real interval `[lo, hi)` onto the inclusive integer
/// range it contains, or `None` when it contains no integer.
pub(crate) fn integer_span(lo: f64, hi: f64) -> Option<(i64, i64)> {
    if lo.is_nan() || hi.is_nan() {
        return None;
    }
    let a = if lo == f64::NEG_INFINITY {
        i64::MIN
    } else {
        lo.ceil() as i64
    };
    let b = if hi == f64::INFINITY {
        i64::MAX
    } else {
        (hi.ceil() as i64).saturating_sub(1)
    };
    (a <= b).then_some((a, b))
}
