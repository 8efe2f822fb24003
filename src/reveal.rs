use std::collections::BTreeSet;

use tracing::warn;

use crate::grid::Cell;

/// The set of album tiles uncovered so far in one playthrough.
#[derive(Clone, Debug)]
pub struct RevealTracker {
    revealed: BTreeSet<Cell>,
    cols: i32,
    rows: i32,
}

impl RevealTracker {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self { revealed: BTreeSet::new(), cols, rows }
    }

    /// Marks `cell` as shown. Returns `false` (and changes nothing) for a
    /// repeat or an out-of-grid cell.
    pub fn reveal(&mut self, cell: Cell) -> bool {
        if cell.col < 0 || cell.row < 0 || cell.col >= self.cols || cell.row >= self.rows {
            warn!(?cell, cols = self.cols, rows = self.rows, "reveal outside the tile grid ignored");
            return false;
        }
        if !self.revealed.insert(cell) {
            warn!(?cell, "tile already revealed");
            return false;
        }
        true
    }

    pub fn is_revealed(&self, cell: Cell) -> bool { self.revealed.contains(&cell) }

    pub fn is_complete(&self) -> bool { self.revealed.len() == self.total() }

    pub fn len(&self) -> usize { self.revealed.len() }
    pub fn is_empty(&self) -> bool { self.revealed.is_empty() }
    pub fn total(&self) -> usize { (self.cols.max(0) * self.rows.max(0)) as usize }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ { self.revealed.iter().copied() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_distinct_reveals_complete_a_ten_by_ten_grid() {
        let mut tracker = RevealTracker::new(10, 10);
        for row in 0..10 {
            for col in 0..10 {
                assert!(!tracker.is_complete());
                assert!(tracker.reveal(Cell::new(col, row)));
            }
        }
        assert!(tracker.is_complete());
        assert_eq!(tracker.len(), 100);

        // 101st attempt is a duplicate and a no-op.
        assert!(!tracker.reveal(Cell::new(4, 4)));
        assert_eq!(tracker.len(), 100);
        assert!(tracker.is_complete());
    }

    #[test]
    fn duplicates_do_not_count_towards_completion() {
        let mut tracker = RevealTracker::new(2, 1);
        assert!(tracker.reveal(Cell::new(0, 0)));
        assert!(!tracker.reveal(Cell::new(0, 0)));
        assert!(!tracker.is_complete());
        assert!(tracker.reveal(Cell::new(1, 0)));
        assert!(tracker.is_complete());
    }

    #[test]
    fn out_of_grid_cells_are_ignored() {
        let mut tracker = RevealTracker::new(2, 2);
        assert!(!tracker.reveal(Cell::new(2, 0)));
        assert!(!tracker.reveal(Cell::new(0, -1)));
        assert!(tracker.is_empty());
    }
}
