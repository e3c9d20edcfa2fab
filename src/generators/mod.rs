use std::{fmt, str::FromStr};

use rand::{Rng, SeedableRng, rngs::StdRng};

mod dfs;

pub use dfs::MazeCarver;

use crate::{
    error::MazeError,
    maze::{Coord, Grid},
};

/// Get a random number generator, optionally seeded for reproducibility.
fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Where the entry and exit are cut into the outer wall once carving is done.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Openings {
    /// Left wall and right wall, both on the middle cell row.
    #[default]
    Sides,
    /// Left wall of the top-left cell and right wall of the bottom-right cell.
    Corners,
    /// Border walls of two distinct edge cells, picked at random.
    RandomEdges,
}

impl Openings {
    pub const ALL: [Openings; 3] = [Openings::Sides, Openings::Corners, Openings::RandomEdges];

    /// Returns `(entry, exit)` for the given grid.
    fn locate(self, grid: &Grid, rng: &mut StdRng) -> (Coord, Coord) {
        let (rows, cols) = (grid.rows(), grid.cols());
        match self {
            Openings::Sides => {
                let middle = (grid.height() as u16 / 2) * 2 + 1;
                ((middle, 0), (middle, cols - 1))
            }
            Openings::Corners => ((1, 0), (rows - 2, cols - 1)),
            Openings::RandomEdges => {
                let mut candidates = border_openings(grid);
                if candidates.len() < 2 {
                    // A single cell maze has one edge cell, so use two of its walls
                    candidates = vec![(1, 0), (1, cols - 1)];
                }
                let first = rng.random_range(0..candidates.len());
                let mut second = rng.random_range(0..candidates.len() - 1);
                if second >= first {
                    second += 1;
                }
                (candidates[first], candidates[second])
            }
        }
    }
}

/// One border wall per edge cell, so two distinct candidates never open the same cell.
///
/// Top and bottom rows cover every cell of those rows, corners included. Left and
/// right columns only add the cells in between. Order: top, bottom, left, right.
fn border_openings(grid: &Grid) -> Vec<Coord> {
    let (rows, cols) = (grid.rows(), grid.cols());
    let across = (1..cols).step_by(2);
    // Cell rows strictly between the first and the last one
    let between = (3..rows.saturating_sub(3)).step_by(2);
    let bottom = across.clone().filter(|_| grid.height() > 1);
    let right = between.clone().filter(|_| grid.width() > 1);
    across
        .map(|col| (0, col))
        .chain(bottom.map(|col| (rows - 1, col)))
        .chain(between.map(|row| (row, 0)))
        .chain(right.map(|row| (row, cols - 1)))
        .collect()
}

impl fmt::Display for Openings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Openings::Sides => write!(f, "sides"),
            Openings::Corners => write!(f, "corners"),
            Openings::RandomEdges => write!(f, "random-edges"),
        }
    }
}

impl FromStr for Openings {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Openings::ALL
            .into_iter()
            .find(|openings| openings.to_string() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown openings '{}', expected sides, corners or random-edges", s))
    }
}

/// Carves a perfect maze with randomized depth-first search and opens the entry and exit
/// on the left and right sides.
pub fn generate_maze(width: u8, height: u8, seed: Option<u64>) -> Result<Grid, MazeError> {
    generate_maze_with(width, height, seed, Openings::default())
}

/// Same as [`generate_maze`] with a choice of where the openings go.
pub fn generate_maze_with(
    width: u8,
    height: u8,
    seed: Option<u64>,
    openings: Openings,
) -> Result<Grid, MazeError> {
    let grid = MazeCarver::new(width, height, seed, openings)?.finish();
    tracing::info!(
        "Generated {}x{} maze (seed {:?}) with entry {:?} and exit {:?}",
        width,
        height,
        seed,
        grid.entry(),
        grid.exit()
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_sides_openings() {
        let grid = generate_maze(4, 5, Some(1)).unwrap();
        assert_eq!(grid.entry(), Some((5, 0)));
        assert_eq!(grid.exit(), Some((5, 8)));
    }

    #[test]
    fn test_corner_openings() {
        let grid = generate_maze_with(4, 5, Some(1), Openings::Corners).unwrap();
        assert_eq!(grid.entry(), Some((1, 0)));
        assert_eq!(grid.exit(), Some((9, 8)));
    }

    /// The maze cell an opening leads into.
    fn opened_cell(grid: &Grid, opening: Coord) -> Option<Coord> {
        grid.adjacent(opening).find(|&c| grid.is_maze_cell(c))
    }

    #[rstest]
    #[case(1, 6)]
    #[case(7, 1)]
    #[case(2, 2)]
    #[case(3, 3)]
    #[case(9, 9)]
    fn test_random_edge_openings(#[case] width: u8, #[case] height: u8) {
        for seed in 0..200 {
            let grid = generate_maze_with(width, height, Some(seed), Openings::RandomEdges).unwrap();
            let (entry, exit) = (grid.entry().unwrap(), grid.exit().unwrap());
            for opening in [entry, exit] {
                assert!(grid.is_border(opening));
                assert_eq!(grid.is_wall(opening), Ok(false));
                assert!(opened_cell(&grid, opening).is_some());
            }
            // Entry and exit never lead into the same cell
            assert_ne!(opened_cell(&grid, entry), opened_cell(&grid, exit));
        }
    }

    #[test]
    fn test_random_edge_openings_single_cell() {
        for seed in 0..20 {
            let grid = generate_maze_with(1, 1, Some(seed), Openings::RandomEdges).unwrap();
            let mut openings = [grid.entry().unwrap(), grid.exit().unwrap()];
            openings.sort();
            assert_eq!(openings, [(1, 0), (1, 2)]);
        }
    }

    #[rstest]
    #[case(2, 1, vec![(0, 1), (0, 3)])]
    #[case(1, 3, vec![(0, 1), (6, 1), (3, 0)])]
    #[case(3, 3, vec![(0, 1), (0, 3), (0, 5), (6, 1), (6, 3), (6, 5), (3, 0), (3, 6)])]
    fn test_border_openings(#[case] width: u8, #[case] height: u8, #[case] expected: Vec<Coord>) {
        let grid = Grid::new(width, height).unwrap();
        assert_eq!(border_openings(&grid), expected);
    }

    #[test]
    fn test_border_openings_one_per_edge_cell() {
        for (width, height) in [(1, 2), (2, 1), (4, 4), (5, 2), (1, 7)] {
            let grid = Grid::new(width, height).unwrap();
            let mut cells = border_openings(&grid)
                .into_iter()
                .map(|opening| opened_cell(&grid, opening).unwrap())
                .collect::<Vec<_>>();
            let count = cells.len();
            cells.sort();
            cells.dedup();
            assert_eq!(cells.len(), count);
            let edge_cells = grid
                .maze_cells()
                .filter(|&(row, col)| {
                    row == 1 || col == 1 || row == grid.rows() - 2 || col == grid.cols() - 2
                })
                .count();
            assert_eq!(count, edge_cells);
        }
    }

    #[test]
    fn test_openings_from_str() {
        assert_eq!("sides".parse::<Openings>(), Ok(Openings::Sides));
        assert_eq!("Random-Edges".parse::<Openings>(), Ok(Openings::RandomEdges));
        assert!("diagonal".parse::<Openings>().is_err());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            generate_maze(0, 5, None),
            Err(MazeError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
    }
}
