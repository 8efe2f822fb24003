//! Board geometry: pixel positions, grid cells and bounds checks.
//!
//! Two grids share one board: the movement grid (`grid_size`) and the
//! coarser album grid (`album_grid_size`). `Board::to_cell` takes the cell
//! size explicitly so callers say which one they mean.

use serde::{Deserialize, Serialize};

/// A grid-aligned position in pixel units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

/// A `(col, row)` coordinate on one of the board's grids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self { Self { col, row } }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit vector in grid steps.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn offset(self, pos: Pos, step: i32) -> Pos {
        let (dx, dy) = self.delta();
        Pos { x: pos.x + dx * step, y: pos.y + dy * step }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    grid_size: i32,
}

impl Board {
    pub fn new(width: i32, height: i32, grid_size: i32) -> Self {
        Self { width, height, grid_size }
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }
    pub fn grid_size(&self) -> i32 { self.grid_size }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    pub fn to_cell(&self, pos: Pos, cell_size: i32) -> Cell {
        Cell { col: pos.x.div_euclid(cell_size), row: pos.y.div_euclid(cell_size) }
    }

    pub fn is_aligned(&self, pos: Pos) -> bool {
        pos.x % self.grid_size == 0 && pos.y % self.grid_size == 0
    }

    pub fn cols(&self) -> i32 { self.width / self.grid_size }
    pub fn rows(&self) -> i32 { self.height / self.grid_size }

    /// Number of `cell_size` cells needed to cover the board, rounding up.
    pub fn cells_across(&self, cell_size: i32) -> (i32, i32) {
        (
            (self.width + cell_size - 1) / cell_size,
            (self.height + cell_size - 1) / cell_size,
        )
    }

    /// Grid-aligned centre of the board.
    pub fn center(&self) -> Pos {
        let cx = self.width / 2;
        let cy = self.height / 2;
        Pos { x: cx - cx % self.grid_size, y: cy - cy % self.grid_size }
    }

    /// Every movement-grid position, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let step = self.grid_size as usize;
        (0..self.height)
            .step_by(step)
            .flat_map(move |y| (0..self.width).step_by(step).map(move |x| Pos { x, y }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_half_open() {
        let board = Board::new(600, 600, 30);
        assert!(board.in_bounds(Pos::new(0, 0)));
        assert!(board.in_bounds(Pos::new(570, 570)));
        assert!(!board.in_bounds(Pos::new(600, 0)));
        assert!(!board.in_bounds(Pos::new(0, 600)));
        assert!(!board.in_bounds(Pos::new(-30, 0)));
        assert!(!board.in_bounds(Pos::new(0, -30)));
    }

    #[test]
    fn to_cell_uses_the_requested_grid() {
        let board = Board::new(600, 600, 30);
        let p = Pos::new(90, 150);
        assert_eq!(board.to_cell(p, 30), Cell::new(3, 5));
        assert_eq!(board.to_cell(p, 60), Cell::new(1, 2));
    }

    #[test]
    fn center_is_aligned() {
        assert_eq!(Board::new(600, 600, 30).center(), Pos::new(300, 300));
        assert_eq!(Board::new(90, 60, 30).center(), Pos::new(30, 30));
        assert!(Board::new(630, 570, 30).is_aligned(Board::new(630, 570, 30).center()));
    }

    #[test]
    fn positions_cover_the_board_once() {
        let board = Board::new(90, 60, 30);
        let all: Vec<Pos> = board.positions().collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], Pos::new(0, 0));
        assert_eq!(all[5], Pos::new(60, 30));
        assert_eq!(board.cells_across(60), (2, 1));
    }

    #[test]
    fn opposites_pair_up() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }
}
