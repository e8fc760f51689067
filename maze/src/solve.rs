use log::{debug, info};

use crate::grid::{Direction, Maze, Point, DIRECTIONS};
use crate::observer::MazeObserver;
use crate::{MazeError, RECURSION_LIMIT};

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult {
    /// Every cell from start to goal, both included
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
}

impl PathResult {
    pub fn moves(&self) -> usize {
        self.path.len() - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverState {
    Searching,
    NoPathFound,
    PathFound(PathResult),
}

impl SolverState {
    fn is_done(&self) -> bool {
        !matches!(self, SolverState::Searching)
    }
}

impl<O: MazeObserver> Maze<O> {
    /// Walks from the entrance to the exit through open walls, depth first.
    /// Expects all cells to be unvisited.
    pub fn find_path(&mut self) -> Result<Option<PathResult>, anyhow::Error> {
        let solver = self.solver()?;
        let (start, goal) = (solver.start(), solver.goal());

        let result = if self.num_cells() > RECURSION_LIMIT {
            debug!(
                "{} cells exceed the recursion limit, solving with an explicit stack",
                self.num_cells()
            );
            solver.finish(self)
        } else {
            let mut path = Vec::new();
            if self.solve_r(start, goal, &mut path) {
                SolverState::PathFound(PathResult { path, start, goal })
            } else {
                SolverState::NoPathFound
            }
        };

        match result {
            SolverState::PathFound(result) => {
                info!(
                    "found path from {} to {} in {} moves",
                    result.start,
                    result.goal,
                    result.moves()
                );
                Ok(Some(result))
            }
            _ => {
                info!("no path from {} to {}", start, goal);
                Ok(None)
            }
        }
    }

    /// Returns whether the exit can be reached from the entrance
    pub fn solve(&mut self) -> Result<bool, anyhow::Error> {
        Ok(self.find_path()?.is_some())
    }

    /// A step-wise solver from the entrance to the exit
    pub fn solver(&self) -> Result<Solver, anyhow::Error> {
        match (self.entrance(), self.exit()) {
            (Some(start), Some(goal)) => Ok(Solver::new(start, goal)),
            _ => Err(MazeError::EntranceExitUnset.into()),
        }
    }

    fn solve_r(&mut self, node: Point, goal: Point, path: &mut Vec<Point>) -> bool {
        self.enter_solving(node);
        path.push(node);

        if node == goal {
            return true;
        }

        for dir in DIRECTIONS {
            if let Some(next) = self.passable(node, dir) {
                self.render_move(node, next, false);
                if self.solve_r(next, goal, path) {
                    return true;
                }
                self.render_move(node, next, true);
            }
        }

        path.pop();
        false
    }

    fn enter_solving(&mut self, node: Point) {
        self.animate();
        self.set_visited(node);
    }

    /// The neighbor in direction `dir` if there is no wall in between and it was not visited yet
    fn passable(&self, node: Point, dir: Direction) -> Option<Point> {
        if self[node].has_wall(dir) {
            return None;
        }
        self.neighbor(node, dir).filter(|n| !self[*n].visited)
    }
}

/// Step-wise version of the depth-first search.
///
/// Each call to [`Solver::step`] makes one move forward or backs out of one dead end, emitting
/// the same observer notifications as [`Maze::find_path`] in the same order.
#[derive(Debug)]
pub struct Solver {
    start: Point,
    goal: Point,
    started: bool,
    // the current path, with the index of the next direction to try from each cell
    stack: Vec<(Point, usize)>,
    state: SolverState,
}

impl Solver {
    pub fn new(start: Point, goal: Point) -> Self {
        Self {
            start,
            goal,
            started: false,
            stack: Vec::new(),
            state: SolverState::Searching,
        }
    }

    pub fn finish<O: MazeObserver>(mut self, maze: &mut Maze<O>) -> SolverState {
        loop {
            match self.step(maze) {
                SolverState::Searching => {}
                s => return s,
            }
        }
    }

    pub fn step<O: MazeObserver>(&mut self, maze: &mut Maze<O>) -> SolverState {
        if self.state.is_done() {
            return self.state.clone();
        }

        if !self.started {
            self.started = true;
            self.enter(maze, self.start);
            return self.state.clone();
        }

        let Some((node, next)) = self.stack.last_mut() else {
            self.state = SolverState::NoPathFound;
            return self.state.clone();
        };
        let node = *node;

        while let Some(&dir) = DIRECTIONS.get(*next) {
            *next += 1;
            if let Some(neighbor) = maze.passable(node, dir) {
                maze.render_move(node, neighbor, false);
                self.enter(maze, neighbor);
                return self.state.clone();
            }
        }

        // dead end, back out
        self.stack.pop();
        match self.stack.last() {
            Some(&(parent, _)) => maze.render_move(parent, node, true),
            None => self.state = SolverState::NoPathFound,
        }

        self.state.clone()
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    /// The cells between the start and the current position
    pub fn path(&self) -> Vec<Point> {
        self.stack.iter().map(|(p, _)| *p).collect()
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    fn enter<O: MazeObserver>(&mut self, maze: &mut Maze<O>, node: Point) {
        maze.enter_solving(node);
        self.stack.push((node, 0));

        if node == self.goal {
            self.state = SolverState::PathFound(PathResult {
                path: self.path(),
                start: self.start,
                goal: self.goal,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::MazeConfig;
    use crate::observer::{Event, EventLog};

    fn create_generated_maze(num_cols: usize, num_rows: usize, seed: u64) -> Maze<EventLog> {
        let config = MazeConfig::new(num_cols, num_rows).with_seed(seed);
        let mut maze = Maze::with_observer(&config, EventLog::new()).unwrap();
        maze.generate();
        maze.observer_mut().clear();
        maze
    }

    fn assert_simple_path<O: MazeObserver>(maze: &Maze<O>, result: &PathResult) {
        assert_eq!(result.path.first(), Some(&Point::new(0, 0)));
        assert_eq!(
            result.path.last(),
            Some(&Point::new(maze.num_cols() - 1, maze.num_rows() - 1))
        );

        let mut seen = std::collections::HashSet::new();
        assert!(result.path.iter().all(|p| seen.insert(*p)), "path revisits a cell");

        for pair in result.path.windows(2) {
            assert!(
                maze.open_neighbors(pair[0]).any(|(_, n)| n == pair[1]),
                "{} and {} are not connected",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_solves_generated_mazes() {
        for (cols, rows) in [(1, 1), (2, 1), (1, 4), (3, 3), (12, 10), (25, 15)] {
            for seed in 0..5 {
                let mut maze = create_generated_maze(cols, rows, seed);
                let result = maze.find_path().unwrap().expect("generated maze has a path");

                assert_simple_path(&maze, &result);
                assert!(result.path.iter().all(|p| maze[*p].visited));
            }
        }
    }

    #[test]
    fn test_single_cell() {
        let mut maze = create_generated_maze(1, 1, 0);
        assert!(maze.solve().unwrap());

        // the entrance is the exit, nothing to move
        assert_eq!(maze.observer().events, vec![Event::Tick]);
    }

    #[test]
    fn test_two_cells_move_east() {
        let mut maze = create_generated_maze(2, 1, 4);
        let result = maze.find_path().unwrap().unwrap();

        assert_eq!(result.path, vec![Point::new(0, 0), Point::new(1, 0)]);
        assert_eq!(result.moves(), 1);
        assert_eq!(
            maze.observer().events,
            vec![
                Event::Tick,
                Event::Move {
                    from: Point::new(0, 0),
                    to: Point::new(1, 0),
                    undo: false
                },
                Event::Tick,
            ]
        );
    }

    #[test]
    fn test_backtracks_out_of_dead_end() {
        // 2x2 with a dead end at (0, 1):
        //   (0,0) - (1,0)
        //     |       |
        //   (0,1)   (1,1)
        let mut maze = Maze::with_observer(&MazeConfig::new(2, 2), EventLog::new()).unwrap();
        maze.break_entrance_and_exit();
        maze.break_wall_between(Point::new(0, 0), Direction::South);
        maze.break_wall_between(Point::new(0, 0), Direction::East);
        maze.break_wall_between(Point::new(1, 0), Direction::South);
        maze.observer_mut().clear();

        let result = maze.find_path().unwrap().unwrap();
        assert_eq!(
            result.path,
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(1, 1)]
        );

        // south is tried before east
        let moves: Vec<_> = maze
            .observer()
            .events
            .iter()
            .filter_map(|e| match *e {
                Event::Move { from, to, undo } => Some((from, to, undo)),
                _ => None,
            })
            .collect();
        assert_eq!(
            moves,
            vec![
                (Point::new(0, 0), Point::new(0, 1), false),
                (Point::new(0, 0), Point::new(0, 1), true),
                (Point::new(0, 0), Point::new(1, 0), false),
                (Point::new(1, 0), Point::new(1, 1), false),
            ]
        );
        assert_eq!(
            maze.observer().committed_moves(),
            vec![
                (Point::new(0, 0), Point::new(1, 0)),
                (Point::new(1, 0), Point::new(1, 1)),
            ]
        );
    }

    #[test]
    fn test_no_path() {
        let mut maze = Maze::new(&MazeConfig::new(3, 3)).unwrap();
        maze.break_entrance_and_exit();
        maze.break_wall_between(Point::new(0, 0), Direction::East);

        assert!(!maze.solve().unwrap());
        assert!(maze[Point::new(1, 0)].visited);
        assert!(!maze[Point::new(2, 2)].visited);
    }

    #[test]
    fn test_solve_requires_entrance_and_exit() {
        let mut maze = Maze::new(&MazeConfig::new(3, 3).with_seed(1)).unwrap();
        maze.break_walls_from(Point::new(0, 0));
        maze.reset_cells_visited();

        let err = maze.solve().unwrap_err();
        assert_eq!(
            err.downcast_ref::<MazeError>(),
            Some(&MazeError::EntranceExitUnset)
        );
        assert!(maze.solver().is_err());
    }

    #[test]
    fn test_solver_matches_recursion() {
        for seed in 0..10 {
            let mut recursive = create_generated_maze(11, 8, seed);
            let mut stepped = create_generated_maze(11, 8, seed);

            let expected = recursive.find_path().unwrap().unwrap();
            let solver = stepped.solver().unwrap();
            let state = solver.finish(&mut stepped);

            assert_eq!(state, SolverState::PathFound(expected));
            assert_eq!(recursive.observer().events, stepped.observer().events);
        }
    }

    #[test]
    fn test_solver_steps() {
        let mut maze = create_generated_maze(4, 4, 8);
        let mut solver = maze.solver().unwrap();
        assert_eq!(solver.start(), Point::new(0, 0));
        assert_eq!(solver.goal(), Point::new(3, 3));
        assert!(solver.path().is_empty());

        assert_eq!(solver.step(&mut maze), SolverState::Searching);
        assert_eq!(solver.path(), vec![Point::new(0, 0)]);

        let mut steps = 1;
        while solver.step(&mut maze) == SolverState::Searching {
            steps += 1;
            assert!(steps <= 2 * 16, "solver did not terminate");
        }

        let SolverState::PathFound(result) = solver.state().clone() else {
            panic!("expected a path, got {:?}", solver.state());
        };
        assert_eq!(result.path, solver.path());
        assert_simple_path(&maze, &result);
        // once done the state sticks
        assert!(matches!(solver.step(&mut maze), SolverState::PathFound(_)));
    }

    #[test]
    fn test_large_grid_uses_explicit_stack() {
        let mut maze = Maze::new(&MazeConfig::new(100, 90).with_seed(6)).unwrap();
        assert!(maze.num_cells() > RECURSION_LIMIT);
        maze.generate();

        let result = maze.find_path().unwrap().unwrap();
        assert_simple_path(&maze, &result);
    }
}
