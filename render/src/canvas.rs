use std::path::Path;

use image::{Rgb, RgbImage};
use log::trace;
use maze::{Cell, Direction, MazeConfig, MazeObserver};
use nalgebra::Point2;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const WALL: Rgb<u8> = Rgb([0, 0, 0]);
pub const MOVE: Rgb<u8> = Rgb([255, 0, 0]);
pub const UNDO: Rgb<u8> = Rgb([128, 128, 128]);

/// Draws the maze into an image: standing walls in black, broken walls in the background color,
/// solver moves from center to center in red and backtracked moves in grey.
pub struct Canvas {
    image: RgbImage,
    ticks: usize,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
            ticks: 0,
        }
    }

    /// A canvas large enough for the maze described by `config`, with the origin repeated as
    /// margin on the right and bottom
    pub fn for_config(config: &MazeConfig) -> Result<Self, anyhow::Error> {
        let (width, height) = config.extent()?;
        // both terms are at most i32::MAX, so the sum still fits in a u32
        Ok(Self::new(
            width + config.origin_x.max(0) as u32 + 1,
            height + config.origin_y.max(0) as u32 + 1,
        ))
    }

    /// Number of solver steps seen so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        self.image.save(path)?;
        Ok(())
    }

    fn draw_line(&mut self, from: Point2<i32>, to: Point2<i32>, color: Rgb<u8>) {
        // i64 so that `delta * i` cannot overflow for long lines
        let from = from.cast::<i64>();
        let delta = to.cast::<i64>() - from;
        let steps = delta.x.abs().max(delta.y.abs()).max(1);

        for i in 0..=steps {
            let p = from + delta * i / steps;
            if p.x >= 0
                && p.y >= 0
                && (p.x as u32) < self.image.width()
                && (p.y as u32) < self.image.height()
            {
                self.image.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
    }
}

impl MazeObserver for Canvas {
    fn render_cell(&mut self, cell: &Cell) {
        let top_left = cell.top_left();
        let bottom_right = cell.bottom_right();
        let top_right = Point2::new(bottom_right.x, top_left.y);
        let bottom_left = Point2::new(top_left.x, bottom_right.y);

        for (side, from, to) in [
            (Direction::West, top_left, bottom_left),
            (Direction::East, top_right, bottom_right),
            (Direction::North, top_left, top_right),
            (Direction::South, bottom_left, bottom_right),
        ] {
            let color = if cell.has_wall(side) { WALL } else { BACKGROUND };
            self.draw_line(from, to, color);
        }
    }

    fn render_move(&mut self, from: &Cell, to: &Cell, undo: bool) {
        trace!(
            "{} {} -> {}",
            if undo { "undo" } else { "move" },
            from.position(),
            to.position()
        );
        self.draw_line(from.center(), to.center(), if undo { UNDO } else { MOVE });
    }

    fn animate(&mut self) {
        self.ticks += 1;
    }
}
