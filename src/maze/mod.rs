pub mod cell;
pub mod grid;

pub use cell::Tile;
pub use grid::Grid;

/// A tile coordinate on the doubled grid, as `(row, col)`.
pub type Coord = (u16, u16);
