//! Backtrackable storage.

/// An arena of versioned cells with checkpoint/restore.
///
/// Each cell keeps a short history of `(level, value)` entries, at most one
/// per checkpoint level. Writing at the current level overwrites the top
/// entry; writing after a checkpoint pushes a new entry that is popped again
/// by [`Trail::backtrack`].
///
/// Cells are created at the root: a cell allocated after a checkpoint keeps
/// its initial value when that checkpoint is backtracked.
///
/// # Examples
///
/// ```
/// use u_bincounts::space::Trail;
///
/// let mut trail = Trail::new();
/// let cell = trail.push(10);
/// trail.checkpoint();
/// trail.set(cell, 20);
/// assert_eq!(*trail.get(cell), 20);
/// trail.backtrack();
/// assert_eq!(*trail.get(cell), 10);
/// ```
#[derive(Debug, Clone)]
pub struct Trail<T> {
    cells: Vec<Vec<(usize, T)>>,
    /// Cells written at each level above the root.
    touched: Vec<Vec<usize>>,
}

impl<T> Default for Trail<T> {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            touched: Vec::new(),
        }
    }
}

impl<T: Clone> Trail<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new cell and returns its index.
    pub fn push(&mut self, value: T) -> usize {
        self.cells.push(vec![(0, value)]);
        self.cells.len() - 1
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Current checkpoint depth (0 at the root).
    pub fn level(&self) -> usize {
        self.touched.len()
    }

    pub fn get(&self, cell: usize) -> &T {
        let history = &self.cells[cell];
        &history[history.len() - 1].1
    }

    pub fn set(&mut self, cell: usize, value: T) {
        let level = self.level();
        let history = &mut self.cells[cell];
        let top = history.len() - 1;
        if history[top].0 == level {
            history[top].1 = value;
        } else {
            history.push((level, value));
            self.touched[level - 1].push(cell);
        }
    }

    /// Applies `f` to a copy of the cell and stores the copy when `f`
    /// reports a change. Returns what `f` returned.
    pub fn update(&mut self, cell: usize, f: impl FnOnce(&mut T) -> bool) -> bool {
        let mut value = self.get(cell).clone();
        let changed = f(&mut value);
        if changed {
            self.set(cell, value);
        }
        changed
    }

    /// Opens a new level.
    pub fn checkpoint(&mut self) {
        self.touched.push(Vec::new());
    }

    /// Restores every cell to its value at the last checkpoint and closes
    /// that level. Returns `false` at the root.
    pub fn backtrack(&mut self) -> bool {
        match self.touched.pop() {
            Some(cells) => {
                for cell in cells {
                    self.cells[cell].pop();
                }
                true
            }
            None => false,
        }
    }
}
