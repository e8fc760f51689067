use crate::grid::{Cell, Point};

/// Receives drawing notifications while a maze is built, carved and solved.
/// Implementations must not assume anything about control flow, the maze never reads anything
/// back from the observer.
pub trait MazeObserver {
    /// The walls of the cell changed (or a full redraw was requested)
    fn render_cell(&mut self, _cell: &Cell) {}

    /// The solver moved from one cell to an adjacent one, `undo` is set when it backs out again
    fn render_move(&mut self, _from: &Cell, _to: &Cell, _undo: bool) {}

    /// One solver step is about to be taken. Frontends can use this to pace an animation.
    fn animate(&mut self) {}
}

/// Observer that ignores everything, for headless use
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl MazeObserver for NoopObserver {}

impl<O: MazeObserver + ?Sized> MazeObserver for &mut O {
    fn render_cell(&mut self, cell: &Cell) {
        (**self).render_cell(cell)
    }

    fn render_move(&mut self, from: &Cell, to: &Cell, undo: bool) {
        (**self).render_move(from, to, undo)
    }

    fn animate(&mut self) {
        (**self).animate()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Cell(Point),
    Move { from: Point, to: Point, undo: bool },
    Tick,
}

/// Observer that records every notification in order
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// The forward moves that were never undone, i.e. the final path as a list of steps
    pub fn committed_moves(&self) -> Vec<(Point, Point)> {
        let mut moves: Vec<(Point, Point)> = Vec::new();
        for event in &self.events {
            match *event {
                Event::Move {
                    from,
                    to,
                    undo: false,
                } => moves.push((from, to)),
                Event::Move {
                    from,
                    to,
                    undo: true,
                } => {
                    // undos always unwind the most recent forward move
                    if moves.last() == Some(&(from, to)) {
                        moves.pop();
                    }
                }
                _ => {}
            }
        }
        moves
    }

    pub fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }
}

impl MazeObserver for EventLog {
    fn render_cell(&mut self, cell: &Cell) {
        self.events.push(Event::Cell(cell.position()));
    }

    fn render_move(&mut self, from: &Cell, to: &Cell, undo: bool) {
        self.events.push(Event::Move {
            from: from.position(),
            to: to.position(),
            undo,
        });
    }

    fn animate(&mut self) {
        self.events.push(Event::Tick);
    }
}
