use std::collections::{HashMap, VecDeque};

use super::SolveResult;
use crate::{
    error::MazeError,
    maze::{Coord, Grid},
    visualize::{Progress, Role, StepEvent, StepSource},
};

/// Breadth-first search over passage tiles, one dequeue per [`BfsSolver::advance`].
///
/// The solver owns its copy of the grid. Iterating it yields `Visited` for every
/// dequeued tile, `Frontier` for every enqueued tile and, once the exit is reached, the
/// reconstructed path from entry to exit.
pub struct BfsSolver {
    grid: Grid,
    entry: Coord,
    exit: Coord,
    frontier: VecDeque<Coord>,
    /// Visited tiles mapped to the tile they were reached from
    predecessors: HashMap<Coord, Option<Coord>>,
    visit_order: Vec<Coord>,
    path: Vec<Coord>,
    pending: VecDeque<StepEvent>,
    /// `Some(found)` once the search is over
    outcome: Option<bool>,
}

impl BfsSolver {
    pub fn new(grid: Grid, entry: Coord, exit: Coord) -> Result<Self, MazeError> {
        let entry_is_wall = grid.is_wall(entry)?;
        let exit_is_wall = grid.is_wall(exit)?;

        let mut solver = BfsSolver {
            grid,
            entry,
            exit,
            frontier: VecDeque::new(),
            predecessors: HashMap::new(),
            visit_order: Vec::new(),
            path: Vec::new(),
            pending: VecDeque::new(),
            outcome: None,
        };

        if entry_is_wall || exit_is_wall {
            tracing::warn!(
                "Entry {:?} or exit {:?} is a wall, nothing to search",
                entry,
                exit
            );
            solver.outcome = Some(false);
        } else {
            solver.predecessors.insert(entry, None);
            solver.frontier.push_back(entry);
            solver.pending.push_back(StepEvent::new(entry, Role::Frontier));
        }
        Ok(solver)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// `Some(found)` once the search has ended.
    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    pub fn visit_order(&self) -> &[Coord] {
        &self.visit_order
    }

    pub fn path(&self) -> &[Coord] {
        &self.path
    }

    /// Dequeues one tile, queues its open unvisited neighbors (up, down, left, right) and
    /// stops at the exit or when the frontier runs dry.
    pub fn advance(&mut self) -> Progress {
        if self.outcome.is_some() {
            return Progress::Done;
        }
        let Some(current) = self.frontier.pop_front() else {
            self.outcome = Some(false);
            return Progress::Done;
        };
        self.visit_order.push(current);
        self.pending.push_back(StepEvent::new(current, Role::Visited));

        if current == self.exit {
            // First time the exit is dequeued is the shortest route by BFS layering
            self.path = self.reconstruct_path();
            let (entry, exit) = (self.entry, self.exit);
            self.pending.extend(self.path.iter().map(|&coord| {
                let role = match coord {
                    c if c == entry => Role::Entry,
                    c if c == exit => Role::Exit,
                    _ => Role::Path,
                };
                StepEvent::new(coord, role)
            }));
            self.outcome = Some(true);
            tracing::debug!("Exit {:?} reached, path of {} tiles", exit, self.path.len());
            return Progress::Running;
        }

        let unvisited = self
            .grid
            .open_neighbors(current)
            .filter(|c| !self.predecessors.contains_key(c))
            .collect::<Vec<_>>();
        for neighbor in unvisited {
            self.predecessors.insert(neighbor, Some(current));
            self.frontier.push_back(neighbor);
            self.pending.push_back(StepEvent::new(neighbor, Role::Frontier));
        }

        if self.frontier.is_empty() {
            self.outcome = Some(false);
            tracing::debug!(
                "Frontier exhausted after {} tiles, exit unreachable",
                self.visit_order.len()
            );
        }
        Progress::Running
    }

    /// Walks the predecessor links back from the exit, then reverses.
    fn reconstruct_path(&self) -> Vec<Coord> {
        let mut path = vec![self.exit];
        let mut current = self.exit;
        while let Some(&Some(previous)) = self.predecessors.get(&current) {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }

    /// Runs the remaining steps and returns the result.
    pub fn finish(mut self) -> SolveResult {
        while self.advance() == Progress::Running {}
        SolveResult {
            found: self.outcome == Some(true),
            visit_order: self.visit_order,
            path: self.path,
        }
    }
}

impl Iterator for BfsSolver {
    type Item = StepEvent;

    fn next(&mut self) -> Option<StepEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.advance() == Progress::Done {
                return None;
            }
        }
    }
}

impl StepSource for BfsSolver {
    fn has_next(&self) -> bool {
        !self.pending.is_empty() || self.outcome.is_none()
    }
}

/// BFS depth of every passage tile reachable from `from`, without stopping early.
/// Empty if `from` is outside the grid or a wall.
pub fn bfs_depths(grid: &Grid, from: Coord) -> HashMap<Coord, usize> {
    let mut depths = HashMap::new();
    if grid.is_wall(from) != Ok(false) {
        return depths;
    }
    depths.insert(from, 0);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        let depth = depths[&current] + 1;
        for neighbor in grid.open_neighbors(current) {
            if !depths.contains_key(&neighbor) {
                depths.insert(neighbor, depth);
                queue.push_back(neighbor);
            }
        }
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generators::generate_maze, solvers::solve_maze, visualize::Frame};
    use rstest::rstest;

    #[test]
    fn test_single_cell_maze() {
        let grid = generate_maze(1, 1, Some(11)).unwrap();
        let result = solve_maze(&grid, grid.entry().unwrap(), grid.exit().unwrap()).unwrap();
        assert!(result.found);
        assert_eq!(result.path, vec![(1, 0), (1, 1), (1, 2)]);
        assert_eq!(result.visit_order, vec![(1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_disconnected_regions() {
        let grid = Grid::from_rows(&["#######", "S  #  E", "#######"]).unwrap();
        let result = solve_maze(&grid, grid.entry().unwrap(), grid.exit().unwrap()).unwrap();
        assert!(!result.found);
        assert!(result.path.is_empty());
        assert_eq!(result.visit_order, vec![(1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_wall_endpoint() {
        let grid = Grid::from_rows(&["#####", "S   #", "#####"]).unwrap();
        let result = solve_maze(&grid, (1, 0), (1, 4)).unwrap();
        assert_eq!(result, SolveResult::default());
    }

    #[test]
    fn test_out_of_bounds_endpoint() {
        let grid = Grid::new(2, 2).unwrap();
        assert_eq!(
            solve_maze(&grid, (1, 0), (1, 5)),
            Err(MazeError::OutOfBounds {
                row: 1,
                col: 5,
                rows: 5,
                cols: 5
            })
        );
    }

    #[test]
    fn test_shortest_route_in_open_room() {
        // With cycles available BFS still takes the shortest route
        let grid = Grid::from_rows(&["#######", "S     #", "#     #", "#     E", "#######"]).unwrap();
        let result = solve_maze(&grid, (1, 0), (3, 6)).unwrap();
        assert!(result.found);
        assert_eq!(result.path.len(), 9);
        // Fixed direction order prefers going down before right
        assert_eq!(&result.path[..4], &[(1, 0), (1, 1), (2, 1), (3, 1)]);
    }

    #[rstest]
    #[case(3, 3)]
    #[case(12, 7)]
    #[case(1, 20)]
    #[case(30, 30)]
    fn test_path_is_valid_and_shortest(#[case] width: u8, #[case] height: u8) {
        for seed in 0..5 {
            let grid = generate_maze(width, height, Some(seed)).unwrap();
            let (entry, exit) = (grid.entry().unwrap(), grid.exit().unwrap());
            let result = solve_maze(&grid, entry, exit).unwrap();
            assert!(result.found);
            assert_eq!(result.path.first(), Some(&entry));
            assert_eq!(result.path.last(), Some(&exit));
            assert_eq!(result.visit_order.last(), Some(&exit));
            for pair in result.path.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert_eq!(a.0.abs_diff(b.0) + a.1.abs_diff(b.1), 1);
                assert_eq!(grid.is_wall(b), Ok(false));
            }
            let depths = bfs_depths(&grid, entry);
            assert_eq!(result.path.len() - 1, depths[&exit]);
        }
    }

    #[test]
    fn test_same_grid_same_solve() {
        let grid = generate_maze(25, 25, Some(5)).unwrap();
        let (entry, exit) = (grid.entry().unwrap(), grid.exit().unwrap());
        let first = solve_maze(&grid, entry, exit).unwrap();
        let second = solve_maze(&grid, entry, exit).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_steps_match_finish() {
        let grid = generate_maze(8, 6, Some(2)).unwrap();
        let (entry, exit) = (grid.entry().unwrap(), grid.exit().unwrap());
        let expected = solve_maze(&grid, entry, exit).unwrap();

        let mut frame = Frame::from_grid(&grid);
        let mut solver = BfsSolver::new(grid, entry, exit).unwrap();
        assert!(solver.has_next());
        let mut visited = Vec::new();
        while let Some(event) = solver.next() {
            if event.role == Role::Visited {
                visited.push(event.coord);
            }
            frame.apply(event);
        }
        assert!(!solver.has_next());
        assert_eq!(solver.outcome(), Some(true));
        assert_eq!(visited, expected.visit_order);
        assert_eq!(solver.path(), expected.path.as_slice());
        // Entry and exit keep their roles, the rest of the path is drawn
        assert_eq!(frame.count(Role::Path), expected.path.len() - 2);
        assert_eq!(frame.role(entry), Some(Role::Entry));
        assert_eq!(frame.role(exit), Some(Role::Exit));
    }

    #[test]
    fn test_bfs_depths() {
        let grid = Grid::from_rows(&["#####", "S   #", "### #", "#   E", "#####"]).unwrap();
        let depths = bfs_depths(&grid, (1, 0));
        assert_eq!(depths[&(1, 0)], 0);
        assert_eq!(depths[&(2, 3)], 4);
        assert_eq!(depths[&(3, 4)], 6);
        assert_eq!(depths[&(3, 1)], 7);
        assert_eq!(depths.len(), 9);
        assert!(bfs_depths(&grid, (0, 0)).is_empty());
        assert!(bfs_depths(&grid, (10, 0)).is_empty());
    }
}
