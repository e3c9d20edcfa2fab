//! Randomized depth-first maze carving and breadth-first solving, observable one step at
//! a time.

pub mod app;
pub mod config;
pub mod error;
pub mod generators;
pub mod maze;
pub mod solvers;
pub mod visualize;

pub use error::{AppError, MazeError};
pub use generators::{Openings, generate_maze, generate_maze_with};
pub use maze::{Coord, Grid, Tile};
pub use solvers::{SolveResult, solve_maze};
