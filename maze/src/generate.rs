use log::{debug, info};
use rand::seq::SliceRandom;

use crate::grid::{Direction, Maze, Point};
use crate::observer::MazeObserver;
use crate::RECURSION_LIMIT;

impl<O: MazeObserver> Maze<O> {
    /// Carves a spanning tree of passages into the grid with a randomized depth-first walk that
    /// starts at `start`. All walls are expected to be intact and all cells unvisited.
    ///
    /// Panics if `start` lies outside the grid.
    pub fn break_walls_from(&mut self, start: Point) {
        if self.num_cells() > RECURSION_LIMIT {
            debug!(
                "{} cells exceed the recursion limit, carving with an explicit stack",
                self.num_cells()
            );
            Carver::new(start).finish(self);
        } else {
            self.break_walls_r(start);
        }
        info!(
            "carved {} passages in {}x{} maze (seed = {:?})",
            self.passages(),
            self.num_cols(),
            self.num_rows(),
            self.seed()
        );
    }

    fn break_walls_r(&mut self, node: Point) {
        let neighbors = self.enter_carving(node);

        for (dir, neighbor) in neighbors {
            // an earlier sibling may have reached it already
            if !self[neighbor].visited {
                self.break_wall_between(node, dir);
                self.break_walls_r(neighbor);
            }
        }
    }

    /// Marks `node` visited, redraws it and returns its unvisited neighbors in random order
    fn enter_carving(&mut self, node: Point) -> Vec<(Direction, Point)> {
        self.set_visited(node);
        self.render_cell(node);

        let mut neighbors = self.unvisited_neighbors(node);
        neighbors.shuffle(&mut self.rng);
        neighbors
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CarverState {
    Carving,
    Done,
}

#[derive(Debug)]
struct Frame {
    node: Point,
    neighbors: Vec<(Direction, Point)>,
    next: usize,
}

/// Step-wise version of the randomized depth-first carving.
///
/// Every call to [`Carver::step`] either enters one new cell or backs out of one finished cell.
/// The frames on the stack hold exactly what the recursive version keeps on the call stack, so
/// both visit the cells (and draw from the random generator) in the same order.
#[derive(Debug)]
pub struct Carver {
    start: Option<Point>,
    stack: Vec<Frame>,
    carved: usize,
    state: CarverState,
}

impl Carver {
    pub fn new(start: Point) -> Self {
        Self {
            start: Some(start),
            stack: Vec::new(),
            carved: 0,
            state: CarverState::Carving,
        }
    }

    /// Runs to completion and returns the number of walls that were broken
    pub fn finish<O: MazeObserver>(mut self, maze: &mut Maze<O>) -> usize {
        while self.step(maze) == CarverState::Carving {}
        self.carved
    }

    pub fn step<O: MazeObserver>(&mut self, maze: &mut Maze<O>) -> CarverState {
        if self.state == CarverState::Done {
            return self.state;
        }

        if let Some(start) = self.start.take() {
            self.enter(maze, start);
            return self.state;
        }

        let Some(frame) = self.stack.last_mut() else {
            self.state = CarverState::Done;
            return self.state;
        };

        while let Some(&(dir, neighbor)) = frame.neighbors.get(frame.next) {
            frame.next += 1;
            if !maze[neighbor].visited {
                let node = frame.node;
                maze.break_wall_between(node, dir);
                self.carved += 1;
                self.enter(maze, neighbor);
                return self.state;
            }
        }

        // dead end, back out
        self.stack.pop();
        if self.stack.is_empty() {
            self.state = CarverState::Done;
        }
        self.state
    }

    pub fn state(&self) -> CarverState {
        self.state
    }

    /// Number of walls broken so far
    pub fn carved(&self) -> usize {
        self.carved
    }

    /// The cell the walk is currently standing on
    pub fn current(&self) -> Option<Point> {
        self.stack.last().map(|frame| frame.node)
    }

    fn enter<O: MazeObserver>(&mut self, maze: &mut Maze<O>, node: Point) {
        let neighbors = maze.enter_carving(node);
        self.stack.push(Frame {
            node,
            neighbors,
            next: 0,
        });
    }
}
