use std::collections::{HashSet, VecDeque};
use std::fmt::Display;
use std::ops::Index;

use log::{debug, trace};
use nalgebra::Point2;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MazeConfig;
use crate::observer::{MazeObserver, NoopObserver};

/// Grid coordinate of a cell, `col` grows to the east and `row` grows to the south
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub col: usize,
    pub row: usize,
}

impl Point {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// The direction table, in the order the solver tries them
pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::West,
    Direction::East,
];

impl Direction {
    /// (Δcol, Δrow) of the neighbor in this direction
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
        }
    }

    /// The side of the neighbor that faces back towards us
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::North => "north",
                Direction::South => "south",
                Direction::East => "east",
                Direction::West => "west",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Walls {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Default for Walls {
    fn default() -> Self {
        Self {
            north: true,
            south: true,
            east: true,
            west: true,
        }
    }
}

impl Walls {
    pub fn get(&self, side: Direction) -> bool {
        match side {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    pub fn side_mut(&mut self, side: Direction) -> &mut bool {
        match side {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    /// Number of walls still standing
    pub fn count(&self) -> usize {
        DIRECTIONS.iter().filter(|d| self.get(**d)).count()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    pub walls: Walls,
    pub visited: bool,
    position: Point,
    top_left: Point2<i32>,
    bottom_right: Point2<i32>,
    center: Point2<i32>,
}

impl Cell {
    pub fn new(position: Point, top_left: Point2<i32>, bottom_right: Point2<i32>) -> Self {
        Self {
            walls: Walls::default(),
            visited: false,
            position,
            top_left,
            bottom_right,
            center: Point2::new(
                (bottom_right.x - top_left.x) / 2 + top_left.x,
                (bottom_right.y - top_left.y) / 2 + top_left.y,
            ),
        }
    }

    pub fn has_wall(&self, side: Direction) -> bool {
        self.walls.get(side)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn top_left(&self) -> Point2<i32> {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point2<i32> {
        self.bottom_right
    }

    pub fn center(&self) -> Point2<i32> {
        self.center
    }
}

/// A rectangular grid of cells separated by walls.
///
/// Cells are stored column by column and addressed with [`Point`]. The maze owns its random
/// generator so that a seeded maze always carves the same passages, and its observer, which is
/// told about every cell redraw and solver move.
#[derive(Debug)]
pub struct Maze<O: MazeObserver = NoopObserver> {
    num_cols: usize,
    num_rows: usize,
    cells: Vec<Vec<Cell>>,
    entrance: Option<Point>,
    exit: Option<Point>,
    seed: Option<u64>,
    pub(crate) rng: StdRng,
    observer: O,
}

impl Maze<NoopObserver> {
    pub fn new(config: &MazeConfig) -> Result<Self, anyhow::Error> {
        Self::with_observer(config, NoopObserver)
    }
}

impl<O: MazeObserver> Maze<O> {
    pub fn with_observer(config: &MazeConfig, observer: O) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let cells = (0..config.num_cols)
            .map(|col| {
                (0..config.num_rows)
                    .map(|row| {
                        let (top_left, bottom_right) = config.cell_corners(col, row);
                        Cell::new(Point { col, row }, top_left, bottom_right)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut maze = Self {
            num_cols: config.num_cols,
            num_rows: config.num_rows,
            cells,
            entrance: None,
            exit: None,
            seed: config.seed,
            rng,
            observer,
        };
        debug!(
            "created {}x{} maze (seed = {:?})",
            maze.num_cols, maze.num_rows, maze.seed
        );

        maze.draw();
        Ok(maze)
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cells(&self) -> usize {
        self.num_cols * self.num_rows
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn entrance(&self) -> Option<Point> {
        self.entrance
    }

    pub fn exit(&self) -> Option<Point> {
        self.exit
    }

    pub fn is_valid(&self, node: Point) -> bool {
        node.col < self.num_cols && node.row < self.num_rows
    }

    pub fn get(&self, node: Point) -> Option<&Cell> {
        self.cells.get(node.col)?.get(node.row)
    }

    /// All cells, column by column
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// The in-bounds neighbor of `node` in direction `dir`
    pub fn neighbor(&self, node: Point, dir: Direction) -> Option<Point> {
        let (d_col, d_row) = dir.offset();
        let neighbor = Point {
            col: node.col.checked_add_signed(d_col)?,
            row: node.row.checked_add_signed(d_row)?,
        };
        self.is_valid(neighbor).then_some(neighbor)
    }

    /// Neighbors that can be reached from `node` without crossing a wall, in table order
    pub fn open_neighbors(&self, node: Point) -> impl Iterator<Item = (Direction, Point)> + '_ {
        DIRECTIONS.into_iter().filter_map(move |dir| {
            if self[node].has_wall(dir) {
                None
            } else {
                self.neighbor(node, dir).map(|n| (dir, n))
            }
        })
    }

    pub(crate) fn unvisited_neighbors(&self, node: Point) -> Vec<(Direction, Point)> {
        DIRECTIONS
            .into_iter()
            .filter_map(|dir| self.neighbor(node, dir).map(|n| (dir, n)))
            .filter(|(_, n)| !self[*n].visited)
            .collect()
    }

    /// Opens the north wall of the top left cell and the south wall of the bottom right cell and
    /// remembers them as entrance and exit.
    pub fn break_entrance_and_exit(&mut self) {
        let entrance = Point::new(0, 0);
        let exit = Point::new(self.num_cols - 1, self.num_rows - 1);

        self.cells[entrance.col][entrance.row].walls.north = false;
        self.cells[exit.col][exit.row].walls.south = false;
        self.render_cell(entrance);
        self.render_cell(exit);

        self.entrance = Some(entrance);
        self.exit = Some(exit);
        debug!("broke entrance at {} and exit at {}", entrance, exit);
    }

    /// Removes the wall between `node` and its neighbor in direction `dir`, on both sides.
    /// Returns the neighbor, or `None` if `dir` points out of the grid (nothing is changed then).
    pub fn break_wall_between(&mut self, node: Point, dir: Direction) -> Option<Point> {
        let neighbor = self.neighbor(node, dir)?;
        *self.cells[node.col][node.row].walls.side_mut(dir) = false;
        *self.cells[neighbor.col][neighbor.row]
            .walls
            .side_mut(dir.opposite()) = false;
        trace!("broke {} wall between {} and {}", dir, node, neighbor);
        Some(neighbor)
    }

    pub fn reset_cells_visited(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.visited = false;
        }
        debug!("reset visited flags");
    }

    /// Breaks the entrance and exit, carves the passages starting at the entrance and leaves all
    /// cells unvisited, ready to be solved.
    pub fn generate(&mut self) {
        self.break_entrance_and_exit();
        self.break_walls_from(Point::new(0, 0));
        self.reset_cells_visited();
    }

    /// Sends every cell to the observer
    pub fn draw(&mut self) {
        for cell in self.cells.iter().flatten() {
            self.observer.render_cell(cell);
        }
    }

    /// Number of open walls between two cells of the grid (the entrance and exit do not count)
    pub fn passages(&self) -> usize {
        self.cells()
            .map(|cell| {
                let p = cell.position;
                let east = !cell.walls.east && p.col + 1 < self.num_cols;
                let south = !cell.walls.south && p.row + 1 < self.num_rows;
                east as usize + south as usize
            })
            .sum()
    }

    /// True if every cell can be reached from every other cell along exactly one path, i.e. the
    /// passages form a spanning tree of the grid.
    pub fn is_perfect(&self) -> bool {
        if self.passages() != self.num_cells() - 1 {
            return false;
        }

        let start = Point::new(0, 0);
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for (_, n) in self.open_neighbors(node) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen.len() == self.num_cells()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Text rendering with the cells of `path` marked
    pub fn display_path<'a>(&'a self, path: &'a [Point]) -> PathOverlay<'a, O> {
        PathOverlay { maze: self, path }
    }

    pub(crate) fn render_cell(&mut self, node: Point) {
        self.observer.render_cell(&self.cells[node.col][node.row]);
    }

    pub(crate) fn render_move(&mut self, from: Point, to: Point, undo: bool) {
        self.observer.render_move(
            &self.cells[from.col][from.row],
            &self.cells[to.col][to.row],
            undo,
        );
    }

    pub(crate) fn animate(&mut self) {
        self.observer.animate();
    }

    pub(crate) fn set_visited(&mut self, node: Point) {
        self.cells[node.col][node.row].visited = true;
    }

    fn write_ascii(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        marked: &HashSet<Point>,
    ) -> std::fmt::Result {
        let horizontal = |wall: bool| if wall { "---" } else { "   " };

        for col in 0..self.num_cols {
            write!(f, "+{}", horizontal(self.cells[col][0].walls.north))?;
        }
        writeln!(f, "+")?;

        for row in 0..self.num_rows {
            write!(f, "{}", if self.cells[0][row].walls.west { "|" } else { " " })?;
            for col in 0..self.num_cols {
                let cell = &self.cells[col][row];
                let body = if marked.contains(&cell.position) { " o " } else { "   " };
                write!(f, "{}{}", body, if cell.walls.east { "|" } else { " " })?;
            }
            writeln!(f)?;

            for col in 0..self.num_cols {
                write!(f, "+{}", horizontal(self.cells[col][row].walls.south))?;
            }
            writeln!(f, "+")?;
        }

        Ok(())
    }
}

impl<O: MazeObserver> Index<Point> for Maze<O> {
    type Output = Cell;

    fn index(&self, node: Point) -> &Self::Output {
        &self.cells[node.col][node.row]
    }
}

impl<O: MazeObserver> Display for Maze<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_ascii(f, &HashSet::new())
    }
}

pub struct PathOverlay<'a, O: MazeObserver> {
    maze: &'a Maze<O>,
    path: &'a [Point],
}

impl<O: MazeObserver> Display for PathOverlay<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marked = self.path.iter().copied().collect();
        self.maze.write_ascii(f, &marked)
    }
}
