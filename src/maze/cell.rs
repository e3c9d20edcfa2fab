/// A single tile of the doubled grid: either solid wall or open passage.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    #[default]
    Wall,
    Passage,
}

impl Tile {
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Character used by the plain text rendering.
    pub fn symbol(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Passage => ' ',
        }
    }
}

impl From<char> for Tile {
    /// `#` is a wall, anything else is a passage.
    fn from(c: char) -> Self {
        match c {
            '#' => Tile::Wall,
            _ => Tile::Passage,
        }
    }
}
