use std::fmt;

use super::{Coord, cell::Tile};
use crate::error::MazeError;

/// The doubled grid backing a maze.
///
/// A maze of `width` x `height` cells is stored as `2 * height + 1` rows by
/// `2 * width + 1` columns of tiles, addressed as `(row, col)`. Tiles with two odd
/// coordinates are maze cells, tiles with exactly one odd coordinate are the walls
/// between two adjacent cells, and the rest are pillars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    data: Box<[Tile]>,
    width: u8,
    height: u8,
    rows: u16,
    cols: u16,
    entry: Option<Coord>,
    exit: Option<Coord>,
}

impl Grid {
    /// Allocates a grid for a `width` x `height` maze with every tile set to wall.
    pub fn new(width: u8, height: u8) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            });
        }
        // n cells in each dimension -> n + 1 walls -> 2n + 1 total
        let rows = height as u16 * 2 + 1;
        let cols = width as u16 * 2 + 1;
        let data = vec![Tile::Wall; rows as usize * cols as usize].into_boxed_slice();
        Ok(Grid {
            data,
            width,
            height,
            rows,
            cols,
            entry: None,
            exit: None,
        })
    }

    /// Builds a grid from text rows: `#` is a wall, every other character is a passage.
    /// `S` and `E` additionally mark the entry and exit, which must lie on the border.
    ///
    /// Row and column counts must both be odd, at least 3, and every row must have the
    /// same length.
    pub fn from_rows(lines: &[&str]) -> Result<Self, MazeError> {
        let rows = lines.len();
        let cols = lines.first().map_or(0, |line| line.chars().count());
        let invalid = MazeError::InvalidDimensions {
            width: cols.saturating_sub(1) / 2,
            height: rows.saturating_sub(1) / 2,
        };

        let ragged = lines.iter().any(|line| line.chars().count() != cols);
        if rows < 3 || cols < 3 || rows % 2 == 0 || cols % 2 == 0 || ragged {
            return Err(invalid);
        }
        let width = u8::try_from((cols - 1) / 2).map_err(|_| invalid.clone())?;
        let height = u8::try_from((rows - 1) / 2).map_err(|_| invalid)?;

        let mut grid = Grid::new(width, height)?;
        for (row, line) in lines.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let coord = (row as u16, col as u16);
                grid.set(coord, Tile::from(c));
                if matches!(c, 'S' | 'E') && !grid.is_border(coord) {
                    return Err(MazeError::InvalidOpening {
                        row: coord.0,
                        col: coord.1,
                    });
                }
                match c {
                    'S' => grid.entry = Some(coord),
                    'E' => grid.exit = Some(coord),
                    _ => {}
                }
            }
        }
        Ok(grid)
    }

    /// Width of the maze in cells.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Height of the maze in cells.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of tile rows, `2 * height + 1`.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of tile columns, `2 * width + 1`.
    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn entry(&self) -> Option<Coord> {
        self.entry
    }

    pub fn exit(&self) -> Option<Coord> {
        self.exit
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.0 < self.rows && coord.1 < self.cols
    }

    pub fn is_border(&self, coord: Coord) -> bool {
        let (row, col) = coord;
        row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1
    }

    /// Whether the tile is a maze cell (both coordinates odd).
    pub fn is_maze_cell(&self, coord: Coord) -> bool {
        self.in_bounds(coord) && coord.0 % 2 == 1 && coord.1 % 2 == 1
    }

    fn ravel_index(&self, coord: Coord) -> usize {
        coord.0 as usize * self.cols as usize + coord.1 as usize
    }

    fn checked_index(&self, coord: Coord) -> Result<usize, MazeError> {
        if self.in_bounds(coord) {
            Ok(self.ravel_index(coord))
        } else {
            Err(MazeError::OutOfBounds {
                row: coord.0,
                col: coord.1,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn tile(&self, coord: Coord) -> Result<Tile, MazeError> {
        self.checked_index(coord).map(|idx| self.data[idx])
    }

    pub fn is_wall(&self, coord: Coord) -> Result<bool, MazeError> {
        self.tile(coord).map(Tile::is_wall)
    }

    pub fn set_passage(&mut self, coord: Coord) -> Result<(), MazeError> {
        let idx = self.checked_index(coord)?;
        self.data[idx] = Tile::Passage;
        Ok(())
    }

    /// Unchecked write used by the algorithms on coordinates they computed themselves.
    ///
    /// # Panics
    /// If `coord` is outside the grid.
    pub(crate) fn set(&mut self, coord: Coord, tile: Tile) {
        let idx = self.ravel_index(coord);
        self.data[idx] = tile;
    }

    /// Tiles `step` away in the cardinal directions, in the fixed order up, down, left,
    /// right, keeping only those inside the grid.
    fn stepped_neighbors(&self, coord: Coord, step: u16) -> impl Iterator<Item = Coord> + '_ {
        let (row, col) = coord;
        let inside = self.in_bounds(coord);
        // Underflow wraps to a huge value and overflow saturates at u16::MAX; both are
        // filtered out by the bounds check since the grid never exceeds 511 tiles.
        [
            (row.wrapping_sub(step), col),
            (row.saturating_add(step), col),
            (row, col.wrapping_sub(step)),
            (row, col.saturating_add(step)),
        ]
        .into_iter()
        .filter(move |&c| inside && self.in_bounds(c))
    }

    /// Get neighbors of a maze cell.
    /// A neighbor is the tile exactly two steps away (up, down, left, right), so the wall
    /// tile in between is skipped.
    pub fn neighbors4(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.stepped_neighbors(coord, 2)
    }

    /// Tiles one step away, in the same fixed order as [`Grid::neighbors4`].
    pub fn adjacent(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.stepped_neighbors(coord, 1)
    }

    /// Adjacent tiles that are passages.
    pub fn open_neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.adjacent(coord).filter(|&c| !self[c].is_wall())
    }

    /// The wall tile between two maze cells that are two steps apart.
    pub fn wall_between(a: Coord, b: Coord) -> Coord {
        (a.0.midpoint(b.0), a.1.midpoint(b.1))
    }

    /// All maze cells, row by row.
    pub fn maze_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height as u16)
            .flat_map(move |y| (0..self.width as u16).map(move |x| (y * 2 + 1, x * 2 + 1)))
    }

    /// Number of open walls between two maze cells. Border openings are not counted.
    pub fn open_wall_count(&self) -> usize {
        (1..self.rows - 1)
            .flat_map(|row| (1..self.cols - 1).map(move |col| (row, col)))
            .filter(|&(row, col)| (row + col) % 2 == 1 && !self[(row, col)].is_wall())
            .count()
    }

    /// Opens `entry` and `exit` in the outer wall and records them.
    pub fn set_openings(&mut self, entry: Coord, exit: Coord) -> Result<(), MazeError> {
        for coord in [entry, exit] {
            self.checked_index(coord)?;
            if !self.is_border(coord) {
                return Err(MazeError::InvalidOpening {
                    row: coord.0,
                    col: coord.1,
                });
            }
        }
        self.mark_openings(entry, exit);
        Ok(())
    }

    /// Unchecked version of [`Grid::set_openings`].
    ///
    /// # Panics
    /// If either coordinate is outside the grid.
    pub(crate) fn mark_openings(&mut self, entry: Coord, exit: Coord) {
        self.set(entry, Tile::Passage);
        self.set(exit, Tile::Passage);
        self.entry = Some(entry);
        self.exit = Some(exit);
    }
}

impl std::ops::Index<Coord> for Grid {
    type Output = Tile;

    fn index(&self, index: Coord) -> &Self::Output {
        &self.data[self.ravel_index(index)]
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line = (0..self.cols)
                .map(|col| self[(row, col)].symbol())
                .collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_all_walls() {
        let grid = Grid::new(3, 2).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (5, 7));
        assert!(grid.data.iter().all(|tile| tile.is_wall()));
        assert_eq!(grid.entry(), None);
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 5),
            Err(MazeError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
        assert!(Grid::new(4, 0).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::new(2, 2).unwrap();
        assert_eq!(
            grid.is_wall((5, 0)),
            Err(MazeError::OutOfBounds {
                row: 5,
                col: 0,
                rows: 5,
                cols: 5
            })
        );
        assert!(grid.set_passage((0, 5)).is_err());
        assert!(grid.set_passage((4, 4)).is_ok());
        assert_eq!(grid.is_wall((4, 4)), Ok(false));
    }

    #[test]
    fn test_neighbors4() {
        let grid = Grid::new(3, 3).unwrap();
        let neighbors = grid.neighbors4((3, 3)).collect::<Vec<_>>();
        assert_eq!(neighbors, vec![(1, 3), (5, 3), (3, 1), (3, 5)]);
        // Corner cell only has two neighbors
        let neighbors = grid.neighbors4((1, 1)).collect::<Vec<_>>();
        assert_eq!(neighbors, vec![(3, 1), (1, 3)]);
        // No neighbors outside the grid
        assert_eq!(grid.neighbors4((9, 9)).count(), 0);
    }

    #[test]
    fn test_open_neighbors() {
        let grid = Grid::from_rows(&["#####", "S   #", "### #", "#   E", "#####"]).unwrap();
        let neighbors = grid.open_neighbors((1, 3)).collect::<Vec<_>>();
        assert_eq!(neighbors, vec![(2, 3), (1, 2)]);
        let neighbors = grid.open_neighbors((1, 0)).collect::<Vec<_>>();
        assert_eq!(neighbors, vec![(1, 1)]);
    }

    #[test]
    fn test_wall_between() {
        assert_eq!(Grid::wall_between((1, 1), (1, 3)), (1, 2));
        assert_eq!(Grid::wall_between((5, 3), (3, 3)), (4, 3));
        // No overflow at the top of the coordinate range
        assert_eq!(
            Grid::wall_between((u16::MAX, 1), (u16::MAX - 2, 1)),
            (u16::MAX - 1, 1)
        );
    }

    #[test]
    fn test_from_rows() {
        let grid = Grid::from_rows(&["#####", "S   #", "### #", "#   E", "#####"]).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(grid.entry(), Some((1, 0)));
        assert_eq!(grid.exit(), Some((3, 4)));
        assert_eq!(grid[(2, 3)], Tile::Passage);
        assert_eq!(grid[(2, 1)], Tile::Wall);

        assert!(Grid::from_rows(&["###", "# #"]).is_err());
        assert!(Grid::from_rows(&["###", "# ##", "###"]).is_err());
        assert!(Grid::from_rows(&[]).is_err());

        // Openings marked inside the maze are rejected like in set_openings
        assert_eq!(
            Grid::from_rows(&["#####", "S   #", "### #", "#  E#", "#####"]),
            Err(MazeError::InvalidOpening { row: 3, col: 3 })
        );
        assert_eq!(
            Grid::from_rows(&["#####", "# S #", "#####"]),
            Err(MazeError::InvalidOpening { row: 1, col: 2 })
        );
    }

    #[test]
    fn test_set_openings() {
        let mut grid = Grid::new(2, 2).unwrap();
        assert_eq!(
            grid.set_openings((1, 1), (3, 4)),
            Err(MazeError::InvalidOpening { row: 1, col: 1 })
        );
        assert!(grid.set_openings((1, 0), (9, 4)).is_err());
        assert_eq!(grid.entry(), None);

        grid.set_openings((1, 0), (3, 4)).unwrap();
        assert_eq!(grid.entry(), Some((1, 0)));
        assert_eq!(grid.exit(), Some((3, 4)));
        assert_eq!(grid[(3, 4)], Tile::Passage);
        // Openings are not interior walls
        assert_eq!(grid.open_wall_count(), 0);
    }

    #[test]
    fn test_display() {
        let mut grid = Grid::new(1, 1).unwrap();
        grid.set_passage((1, 1)).unwrap();
        assert_eq!(grid.to_string(), "###\n# #\n###\n");
    }
}
