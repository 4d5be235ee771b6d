//! Bincounts configuration.

/// How strictly items must fall into the declared bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// Every item lands in exactly one declared bin. Bins must be contiguous.
    #[default]
    Eq,

    /// Items may fall outside every bin; such items are counted by an
    /// implicit no-bin cell that does not appear in any bin total.
    Le,
}

/// What an event on a single variable recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncrementalPolicy {
    /// Re-run the full pass (all bin counts, then all item cells). Skipped
    /// when no domain has changed since the last completed pass.
    #[default]
    Full,

    /// Item event: all bin counts plus that item's own cells. Bin-count
    /// event: that bin's count only. Cheaper, but other items are not
    /// revisited, so the result can be weaker than a full pass.
    Local,
}

/// Configuration for the Bincounts constraint.
///
/// # Examples
///
/// ```
/// use u_bincounts::bincounts::{BincountsConfig, IncrementalPolicy, Variant};
///
/// let config = BincountsConfig::default()
///     .with_variant(Variant::Le)
///     .with_incremental(IncrementalPolicy::Local)
///     .with_integrality_tolerance(1e-5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BincountsConfig {
    /// Strict or relaxed bin membership.
    pub variant: Variant,

    /// Work done per single-variable event.
    pub incremental: IncrementalPolicy,

    /// Largest accepted distance between an LP optimum and the nearest
    /// integer. Larger deviations are logged and rounded conservatively.
    pub integrality_tolerance: f64,
}

impl Default for BincountsConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            incremental: IncrementalPolicy::default(),
            integrality_tolerance: 1e-6,
        }
    }
}

impl BincountsConfig {
    /// Default configuration for the given variant.
    pub fn for_variant(variant: Variant) -> Self {
        Self::default().with_variant(variant)
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_incremental(mut self, policy: IncrementalPolicy) -> Self {
        self.incremental = policy;
        self
    }

    pub fn with_integrality_tolerance(mut self, tolerance: f64) -> Self {
        self.integrality_tolerance = tolerance;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.integrality_tolerance > 0.0 && self.integrality_tolerance < 0.5) {
            return Err(format!(
                "integrality_tolerance must be in (0, 0.5), got {}",
                self.integrality_tolerance
            ));
        }
        Ok(())
    }
}
