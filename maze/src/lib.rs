pub mod config;
pub mod generate;
pub mod grid;
pub mod observer;
pub mod solve;

use std::fmt::Display;

pub use config::MazeConfig;
pub use generate::{Carver, CarverState};
pub use grid::{Cell, Direction, Maze, Point, Walls, DIRECTIONS};
pub use observer::{Event, EventLog, MazeObserver, NoopObserver};
pub use solve::{PathResult, Solver, SolverState};

/// Grids with more cells than this are carved and solved with the explicit-stack engines
/// instead of native recursion.
pub const RECURSION_LIMIT: usize = 2048;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MazeError {
    /// At least one of the dimensions is zero
    DegenerateGrid { num_cols: usize, num_rows: usize },
    /// Cells must be at least one pixel wide and high
    InvalidCellSize { cell_size_x: i32, cell_size_y: i32 },
    /// The cells reach past the largest representable pixel coordinate
    LayoutOverflow,
    /// Solving was attempted before the entrance and exit were broken
    EntranceExitUnset,
}

impl Display for MazeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MazeError::DegenerateGrid { num_cols, num_rows } => write!(
                f,
                "degenerate grid: {}x{} (columns and rows must be at least 1)",
                num_cols, num_rows
            ),
            MazeError::InvalidCellSize {
                cell_size_x,
                cell_size_y,
            } => write!(
                f,
                "invalid cell size: {}x{} (width and height must be at least 1)",
                cell_size_x, cell_size_y
            ),
            MazeError::LayoutOverflow => {
                write!(f, "maze layout does not fit in 32 bit pixel coordinates")
            }
            MazeError::EntranceExitUnset => {
                write!(f, "entrance and exit must be broken before solving")
            }
        }
    }
}

impl std::error::Error for MazeError {}
