use std::collections::VecDeque;

use rand::{Rng, rngs::StdRng};

use super::{Openings, get_rng};
use crate::{
    error::MazeError,
    maze::{Coord, Grid, Tile},
    visualize::{Progress, Role, StepEvent, StepSource},
};

/// Randomized depth-first carving, one stack iteration per [`MazeCarver::advance`].
///
/// Iterating the carver yields the step events of the carving as it happens. The
/// carved grid is available at any point through [`MazeCarver::grid`].
pub struct MazeCarver {
    grid: Grid,
    rng: StdRng,
    /// The stack keeps only carved maze cells. The top is the current cell.
    stack: Vec<Coord>,
    openings: Openings,
    /// Events produced by the last advance and not yet pulled
    pending: VecDeque<StepEvent>,
    /// Set once the entry and exit have been opened
    finished: bool,
}

impl MazeCarver {
    /// Sets up carving on a fully walled grid and carves a uniformly random start cell.
    pub fn new(
        width: u8,
        height: u8,
        seed: Option<u64>,
        openings: Openings,
    ) -> Result<Self, MazeError> {
        let mut grid = Grid::new(width, height)?;
        let mut rng = get_rng(seed);

        // Initialize the starting point
        let start: Coord = (
            rng.random_range(0..height as u16) * 2 + 1,
            rng.random_range(0..width as u16) * 2 + 1,
        );
        grid.set(start, Tile::Passage);
        tracing::debug!("Carving {}x{} maze from {:?}", width, height, start);

        Ok(MazeCarver {
            grid,
            rng,
            stack: vec![start],
            openings,
            pending: VecDeque::from([StepEvent::new(start, Role::Frontier)]),
            finished: false,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Whether carving is over and the openings are in place.
    pub fn is_done(&self) -> bool {
        self.finished
    }

    /// Performs one step: carve towards a random unvisited neighbor of the current cell,
    /// backtrack if there is none, or open the entry and exit once the stack is empty.
    pub fn advance(&mut self) -> Progress {
        if self.finished {
            return Progress::Done;
        }
        match self.stack.last().copied() {
            Some(cell) => self.carve_from(cell),
            None => self.open_border(),
        }
        Progress::Running
    }

    fn carve_from(&mut self, cell: Coord) {
        let neighbors = self
            .grid
            .neighbors4(cell)
            .filter(|&c| self.grid[c] == Tile::Wall)
            .collect::<Vec<_>>();

        if neighbors.is_empty() {
            // Dead end: backtrack, the cell stays carved
            self.stack.pop();
            self.pending.push_back(StepEvent::new(cell, Role::Passage));
            if let Some(&previous) = self.stack.last() {
                self.pending.push_back(StepEvent::new(previous, Role::Frontier));
            }
            return;
        }

        let neighbor = neighbors[self.rng.random_range(0..neighbors.len())];
        let wall = Grid::wall_between(cell, neighbor);
        self.grid.set(wall, Tile::Passage);
        self.grid.set(neighbor, Tile::Passage);
        self.pending.extend([
            StepEvent::new(cell, Role::Passage),
            StepEvent::new(wall, Role::Passage),
            StepEvent::new(neighbor, Role::Frontier),
        ]);
        // The current cell stays beneath the neighbor so it gets revisited on backtrack
        self.stack.push(neighbor);
    }

    fn open_border(&mut self) {
        let (entry, exit) = self.openings.locate(&self.grid, &mut self.rng);
        self.grid.mark_openings(entry, exit);
        self.pending.extend([
            StepEvent::new(entry, Role::Entry),
            StepEvent::new(exit, Role::Exit),
        ]);
        self.finished = true;
        tracing::debug!("Carving done, opened entry {:?} and exit {:?}", entry, exit);
    }

    /// Runs the remaining steps and returns the finished grid.
    pub fn finish(mut self) -> Grid {
        while self.advance() == Progress::Running {}
        self.grid
    }
}

impl Iterator for MazeCarver {
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

impl StepSource for MazeCarver {
    fn has_next(&self) -> bool {
        !self.pending.is_empty() || !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generators::generate_maze, solvers::bfs_depths, visualize::Frame};
    use rstest::rstest;

    #[test]
    fn test_single_cell_maze() {
        let grid = generate_maze(1, 1, Some(7)).unwrap();
        assert_eq!(grid.to_string(), "###\n   \n###\n");
        assert_eq!(grid.entry(), Some((1, 0)));
        assert_eq!(grid.exit(), Some((1, 2)));
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 3)]
    #[case(10, 1)]
    #[case(1, 10)]
    #[case(15, 15)]
    #[case(40, 25)]
    fn test_maze_is_perfect(#[case] width: u8, #[case] height: u8) {
        for seed in 0..5 {
            let grid = generate_maze(width, height, Some(seed)).unwrap();
            let num_cells = width as usize * height as usize;
            // Every cell is carved
            assert!(grid.maze_cells().all(|c| grid[c] == Tile::Passage));
            // A spanning tree over the cells has exactly cells - 1 edges
            assert_eq!(grid.open_wall_count(), num_cells - 1);
            // Pillars never get carved
            for row in (0..grid.rows()).step_by(2) {
                for col in (0..grid.cols()).step_by(2) {
                    assert_eq!(grid[(row, col)], Tile::Wall);
                }
            }
            // Everything is reachable from the entry
            let depths = bfs_depths(&grid, grid.entry().unwrap());
            assert!(grid.maze_cells().all(|c| depths.contains_key(&c)));
            assert!(depths.contains_key(&grid.exit().unwrap()));
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        let first = generate_maze(30, 20, Some(42)).unwrap();
        let second = generate_maze(30, 20, Some(42)).unwrap();
        assert_eq!(first, second);
        let other = generate_maze(30, 20, Some(43)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_steps_match_finish() {
        let mut carver = MazeCarver::new(6, 4, Some(3), Openings::Sides).unwrap();
        let mut frame = Frame::from_grid(carver.grid());
        assert!(carver.has_next());
        for event in carver.by_ref() {
            frame.apply(event);
        }
        assert!(!carver.has_next());
        assert!(carver.is_done());
        assert_eq!(carver.advance(), Progress::Done);

        let grid = carver.into_grid();
        assert_eq!(grid, generate_maze(6, 4, Some(3)).unwrap());
        // Playing back all events leaves no frontier and matches the grid tiles
        assert_eq!(frame, Frame::from_grid(&grid));
        assert_eq!(frame.count(Role::Frontier), 0);
    }

    #[test]
    fn test_first_event_is_start_cell() {
        let mut carver = MazeCarver::new(5, 5, Some(9), Openings::Sides).unwrap();
        let first = carver.next().unwrap();
        assert_eq!(first.role, Role::Frontier);
        assert!(carver.grid().is_maze_cell(first.coord));
        assert_eq!(carver.grid()[first.coord], Tile::Passage);
    }
}
