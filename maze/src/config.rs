use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::MazeError;

/// Everything needed to construct a [`crate::Maze`].
///
/// The origin and cell sizes only position the cells for drawing, the maze logic never reads them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)] // missing fields fall back to the default layout
pub struct MazeConfig {
    pub origin_x: i32,
    pub origin_y: i32,
    pub num_cols: usize,
    pub num_rows: usize,
    pub cell_size_x: i32,
    pub cell_size_y: i32,
    /// Fixes the carving order, `None` seeds from entropy.
    /// The maze for a given seed is only stable for one `rand` release, since `StdRng` may
    /// switch algorithms between versions.
    pub seed: Option<u64>,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            origin_x: 80,
            origin_y: 80,
            num_cols: 25,
            num_rows: 15,
            cell_size_x: 25,
            cell_size_y: 25,
            seed: None,
        }
    }
}

impl MazeConfig {
    pub fn new(num_cols: usize, num_rows: usize) -> Self {
        Self {
            num_cols,
            num_rows,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.num_cols < 1 || self.num_rows < 1 {
            return Err(MazeError::DegenerateGrid {
                num_cols: self.num_cols,
                num_rows: self.num_rows,
            }
            .into());
        }
        if self.cell_size_x < 1 || self.cell_size_y < 1 {
            return Err(MazeError::InvalidCellSize {
                cell_size_x: self.cell_size_x,
                cell_size_y: self.cell_size_y,
            }
            .into());
        }
        self.far_corner().ok_or(MazeError::LayoutOverflow)?;
        Ok(())
    }

    /// Pixel size of the area covered by the cells, origin included
    pub fn extent(&self) -> Result<(u32, u32), anyhow::Error> {
        let (width, height) = self.far_corner().ok_or(MazeError::LayoutOverflow)?;
        Ok((width.max(0) as u32, height.max(0) as u32))
    }

    /// Top left and bottom right corner of the cell at `col`, `row`.
    /// Only call on a validated config: every corner lies between the origin and the far corner.
    pub(crate) fn cell_corners(&self, col: usize, row: usize) -> (Point2<i32>, Point2<i32>) {
        let x1 = self.origin_x + col as i32 * self.cell_size_x;
        let y1 = self.origin_y + row as i32 * self.cell_size_y;
        (
            Point2::new(x1, y1),
            Point2::new(x1 + self.cell_size_x, y1 + self.cell_size_y),
        )
    }

    /// Bottom right corner of the last cell, `None` if it does not fit in an `i32`
    fn far_corner(&self) -> Option<(i32, i32)> {
        let span = |origin: i32, count: usize, size: i32| {
            i32::try_from(count)
                .ok()?
                .checked_mul(size)?
                .checked_add(origin)
        };
        Some((
            span(self.origin_x, self.num_cols, self.cell_size_x)?,
            span(self.origin_y, self.num_rows, self.cell_size_y)?,
        ))
    }
}
