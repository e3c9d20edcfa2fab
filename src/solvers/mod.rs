mod bfs;

pub use bfs::{BfsSolver, bfs_depths};

use crate::{
    error::MazeError,
    maze::{Coord, Grid},
};

/// Outcome of a breadth-first solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveResult {
    /// Tiles in the order they were dequeued, ending with the exit when it was reached.
    pub visit_order: Vec<Coord>,
    /// Shortest route from entry to exit, both included. Empty when there is none.
    pub path: Vec<Coord>,
    /// Whether the exit was reached. `false` means the maze is unsolvable, which is a
    /// valid answer and not an error.
    pub found: bool,
}

/// Solves the maze with breadth-first search from `entry` to `exit`.
///
/// Fails only if `entry` or `exit` lies outside the grid.
pub fn solve_maze(grid: &Grid, entry: Coord, exit: Coord) -> Result<SolveResult, MazeError> {
    let result = BfsSolver::new(grid.clone(), entry, exit)?.finish();
    if result.found {
        tracing::info!(
            "Solved maze: path of {} tiles after visiting {} tiles",
            result.path.len(),
            result.visit_order.len()
        );
    } else {
        tracing::warn!(
            "No path from {:?} to {:?} after visiting {} tiles",
            entry,
            exit,
            result.visit_order.len()
        );
    }
    Ok(result)
}
