//! Fixed-length snake on the movement grid, plus the food it chases.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{Board, Direction, Pos};
use crate::reveal::RevealTracker;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// Wall or self collision. The body is left exactly as it was.
    Collided,
    AteFoodAt(Pos),
}

#[derive(Clone, Debug)]
pub struct Snake {
    // Head first.
    body: VecDeque<Pos>,
    direction: Direction,
    turned_this_tick: bool,
    alive: bool,
}

impl Snake {
    /// Builds a straight snake with its head at `head`, trailing away from
    /// `direction` in `step`-pixel increments.
    pub fn new(head: Pos, len: usize, direction: Direction, step: i32) -> Self {
        let back = direction.opposite();
        let body = (0..len.max(1) as i32).map(|i| back.offset(head, step * i)).collect();
        Self { body, direction, turned_this_tick: false, alive: true }
    }

    pub fn body(&self) -> &VecDeque<Pos> { &self.body }
    pub fn len(&self) -> usize { self.body.len() }
    pub fn is_empty(&self) -> bool { self.body.is_empty() }
    pub fn direction(&self) -> Direction { self.direction }
    pub fn is_alive(&self) -> bool { self.alive }

    pub fn head(&self) -> Pos {
        // Never empty: `new` builds at least one segment and `advance` keeps the length.
        self.body[0]
    }

    pub fn occupies(&self, pos: Pos) -> bool { self.body.contains(&pos) }

    /// Accepts `dir` unless it reverses the snake or a turn was already
    /// accepted since the last step.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if self.turned_this_tick || dir == self.direction.opposite() {
            return false;
        }
        if dir != self.direction {
            self.direction = dir;
            self.turned_this_tick = true;
        }
        true
    }

    fn advance(&mut self, new_head: Pos) {
        self.body.pop_back();
        self.body.push_front(new_head);
    }
}

pub struct Simulator {
    board: Board,
    album_grid_size: i32,
    snake: Snake,
    food: Option<Pos>,
    rng: StdRng,
    random_attempts: u32,
}

impl Simulator {
    pub fn new(board: Board, album_grid_size: i32, snake: Snake, seed: u64, random_attempts: u32) -> Self {
        Self {
            board,
            album_grid_size,
            snake,
            food: None,
            rng: StdRng::seed_from_u64(seed),
            random_attempts,
        }
    }

    pub fn board(&self) -> &Board { &self.board }
    pub fn snake(&self) -> &Snake { &self.snake }
    pub fn food(&self) -> Option<Pos> { self.food }

    pub fn set_direction(&mut self, dir: Direction) -> bool { self.snake.set_direction(dir) }

    pub fn step(&mut self) -> StepOutcome {
        self.snake.turned_this_tick = false;
        if !self.snake.alive {
            return StepOutcome::Collided;
        }

        let new_head = self.snake.direction.offset(self.snake.head(), self.board.grid_size());
        debug_assert!(self.board.is_aligned(new_head), "head left the movement grid: {new_head:?}");

        // Bounds and self collision (no wrap), checked before anything moves
        if !self.board.in_bounds(new_head) || self.snake.occupies(new_head) {
            self.snake.alive = false;
            return StepOutcome::Collided;
        }

        self.snake.advance(new_head);

        if self.food == Some(new_head) {
            self.food = None;
            return StepOutcome::AteFoodAt(new_head);
        }
        StepOutcome::Continue
    }

    /// A cell can hold food if the snake isn't on it and its album tile is
    /// still hidden.
    pub fn is_valid_food(&self, pos: Pos, revealed: &RevealTracker) -> bool {
        self.board.in_bounds(pos)
            && !self.snake.occupies(pos)
            && !revealed.is_revealed(self.board.to_cell(pos, self.album_grid_size))
    }

    /// Picks a new food cell: a bounded number of random tries, then a
    /// row-major scan. `None` only when no valid cell exists at all.
    pub fn place_food(&mut self, revealed: &RevealTracker) -> Option<Pos> {
        let (cols, rows) = (self.board.cols(), self.board.rows());
        let g = self.board.grid_size();

        let mut found = None;
        for _ in 0..self.random_attempts {
            let pos = Pos::new(self.rng.gen_range(0..cols) * g, self.rng.gen_range(0..rows) * g);
            if self.is_valid_food(pos, revealed) {
                found = Some(pos);
                break;
            }
        }
        if found.is_none() {
            found = self.board.positions().find(|p| self.is_valid_food(*p, revealed));
        }

        self.food = found;
        found
    }
}
