//! Domain modification events.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of domain event kinds.
///
/// Narrowing operations report the kinds of change they caused; propagators
/// declare the kinds they want to be woken up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u8);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    /// Some value was removed.
    pub const REMOVE: EventMask = EventMask(1);
    /// A bound moved.
    pub const BOUND: EventMask = EventMask(1 << 1);
    /// The domain became a single value.
    pub const INSTANTIATE: EventMask = EventMask(1 << 2);
    pub const ALL: EventMask = EventMask(0b111);

    pub fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: EventMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(EventMask::REMOVE) {
            parts.push("remove");
        }
        if self.contains(EventMask::BOUND) {
            parts.push("bound");
        }
        if self.contains(EventMask::INSTANTIATE) {
            parts.push("instantiate");
        }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_algebra() {
        let m = EventMask::REMOVE | EventMask::BOUND;
        assert!(m.contains(EventMask::BOUND));
        assert!(!m.contains(EventMask::INSTANTIATE));
        assert!(m.intersects(EventMask::ALL));
        assert!(!EventMask::NONE.intersects(EventMask::ALL));
        assert!(EventMask::ALL.contains(m));
    }

    #[test]
    fn test_display() {
        assert_eq!(EventMask::NONE.to_string(), "none");
        assert_eq!(
            (EventMask::REMOVE | EventMask::INSTANTIATE).to_string(),
            "remove|instantiate"
        );
    }
}
