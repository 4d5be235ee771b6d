//! Error types.
//!
//! Two families are kept apart:
//! - [`Contradiction`]: a propagation failure inside a search node. The host
//!   abandons the node; nothing is retried locally.
//! - [`BincountsError`]: a malformed constraint, reported at construction.

use crate::space::VarId;
use thiserror::Error;

/// A propagation failure on a specific variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Contradiction {
    /// A narrowing would have emptied the domain.
    #[error("domain wipeout on {var}")]
    Wipeout {
        /// The variable whose domain became empty.
        var: VarId,
    },

    /// The linear relaxation has no feasible point for a cell of this
    /// variable. Same failure as a wipeout, raised one layer lower.
    #[error("relaxation infeasible for {var}")]
    Infeasible {
        /// The variable the infeasible cell belongs to.
        var: VarId,
    },
}

impl Contradiction {
    /// The variable the failure is attributed to.
    pub fn var(&self) -> VarId {
        match *self {
            Contradiction::Wipeout { var } | Contradiction::Infeasible { var } => var,
        }
    }
}

/// Errors raised while setting up a constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BincountsError {
    /// Invalid bins, mismatched lengths, or an invalid config.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A variable handle that does not belong to the space.
    #[error("unknown variable: {0}")]
    UnknownVariable(VarId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contradiction_var() {
        let w = Contradiction::Wipeout { var: VarId::new(3) };
        let i = Contradiction::Infeasible { var: VarId::new(5) };
        assert_eq!(w.var(), VarId::new(3));
        assert_eq!(i.var(), VarId::new(5));
    }

    #[test]
    fn test_display() {
        let w = Contradiction::Wipeout { var: VarId::new(2) };
        assert_eq!(w.to_string(), "domain wipeout on v2");
        let e = BincountsError::Configuration("boundaries must be strictly increasing".into());
        assert_eq!(
            e.to_string(),
            "configuration error: boundaries must be strictly increasing"
        );
    }
}
