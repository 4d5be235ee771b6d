//! Per-(item, column) fits flags.

use super::bins::BinLayout;
use super::config::Variant;
use crate::domain::Domain;
use crate::space::{FlagId, Space, VarId};

/// Whether `domain` still has a value routed through `column`.
///
/// Columns `0..layout.len()` are the bins; column `layout.len()` is the
/// no-bin column of the relaxed variant.
pub(crate) fn column_intersects(domain: &Domain, layout: &BinLayout, column: usize) -> bool {
    if column < layout.len() {
        let bin = layout.bin(column);
        domain.intersects(bin.lo, bin.hi)
    } else {
        !layout.covers(domain)
    }
}

/// Backtrackable boolean cells, one per (item, column), stored item-major
/// in the host space.
///
/// A false flag is a cached proof that the item cannot be routed through
/// that column in the current node.
#[derive(Debug, Clone)]
pub(crate) struct FitsFlags {
    cells: Vec<FlagId>,
    columns: usize,
}

impl FitsFlags {
    /// Allocates the flags and seeds them from the current domains.
    pub(crate) fn seed(
        space: &mut Space,
        items: &[VarId],
        layout: &BinLayout,
        variant: Variant,
    ) -> Self {
        let columns = match variant {
            Variant::Eq => layout.len(),
            Variant::Le => layout.len() + 1,
        };
        let mut cells = Vec::with_capacity(items.len() * columns);
        for &item in items {
            for column in 0..columns {
                let fits = column_intersects(space.domain(item), layout, column);
                cells.push(space.new_flag(fits));
            }
        }
        Self { cells, columns }
    }

    /// Number of columns per item.
    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    pub(crate) fn get(&self, space: &Space, item: usize, column: usize) -> bool {
        space.flag(self.cells[item * self.columns + column])
    }

    /// Clears a flag. Returns whether it was set.
    pub(crate) fn clear(&self, space: &mut Space, item: usize, column: usize) -> bool {
        let cell = self.cells[item * self.columns + column];
        let was = space.flag(cell);
        space.set_flag(cell, false);
        was
    }
}
