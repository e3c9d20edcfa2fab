use thiserror::Error;

/// Errors raised by the maze core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze dimensions must be positive (got width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    /// A coordinate outside the grid was used. Indicates a bug in the caller.
    #[error("coordinate (row={row}, col={col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: u16,
        col: u16,
        rows: u16,
        cols: u16,
    },

    #[error("opening (row={row}, col={col}) is not on the grid border")]
    InvalidOpening { row: u16, col: u16 },
}

/// Errors surfaced by the binaries.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error("failed to set up logging: {0}")]
    Logging(String),
}
