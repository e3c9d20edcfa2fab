//! Step-by-step observation of generation and solving.
//!
//! Algorithms emit a finite stream of [`StepEvent`]s and never draw anything. Consumers
//! pull events at their own pace and apply them to a [`Frame`] to know what each tile
//! should look like.

use std::fmt;

use crate::maze::{Coord, Grid, Tile};

/// What a tile currently represents to a viewer.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Wall,
    Passage,
    /// Dequeued by the solver.
    Visited,
    /// Part of the reconstructed solution.
    Path,
    Entry,
    Exit,
    /// Head of the carving stack, or a tile waiting in the solver's queue.
    Frontier,
}

impl Role {
    /// Character used by the plain text rendering.
    pub fn symbol(self) -> char {
        match self {
            Role::Wall => '#',
            Role::Passage => ' ',
            Role::Visited => '.',
            Role::Path => '*',
            Role::Entry => 'S',
            Role::Exit => 'E',
            Role::Frontier => '+',
        }
    }

    /// Entry and exit keep their role once assigned.
    fn is_pinned(self) -> bool {
        matches!(self, Role::Entry | Role::Exit)
    }
}

impl From<Tile> for Role {
    fn from(tile: Tile) -> Self {
        match tile {
            Tile::Wall => Role::Wall,
            Tile::Passage => Role::Passage,
        }
    }
}

/// One observable unit of algorithm progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    pub coord: Coord,
    pub role: Role,
}

impl StepEvent {
    pub fn new(coord: Coord, role: Role) -> Self {
        StepEvent { coord, role }
    }
}

/// Result of a single `advance` call on a stepping algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Running,
    Done,
}

/// A lazy, finite stream of step events.
pub trait StepSource: Iterator<Item = StepEvent> {
    /// Whether another event can still be pulled.
    fn has_next(&self) -> bool;
}

impl<S: StepSource + ?Sized> StepSource for &mut S {
    fn has_next(&self) -> bool {
        (**self).has_next()
    }
}

/// A captured event stream that can be played back any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    events: Vec<StepEvent>,
}

impl Recording {
    /// Drains `source` to completion.
    pub fn capture<S: StepSource>(source: S) -> Self {
        Recording {
            events: source.collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }

    /// A fresh pass over the recorded events.
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, StepEvent>> {
        self.events.iter().copied()
    }
}

/// A role change applied to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub coord: Coord,
    pub old: Role,
    pub new: Role,
}

impl Change {
    /// The change that undoes this one.
    pub fn reverted(self) -> Self {
        Change {
            coord: self.coord,
            old: self.new,
            new: self.old,
        }
    }
}

/// Role overlay for every tile of a grid, as last shown to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    roles: Box<[Role]>,
    rows: u16,
    cols: u16,
}

impl Frame {
    /// Roles as implied by the grid's tiles, with entry and exit marked.
    pub fn from_grid(grid: &Grid) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());
        let roles = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Role::from(grid[(row, col)])))
            .collect::<Box<[Role]>>();
        let mut frame = Frame { roles, rows, cols };
        if let Some(entry) = grid.entry() {
            frame.set(entry, Role::Entry);
        }
        if let Some(exit) = grid.exit() {
            frame.set(exit, Role::Exit);
        }
        frame
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    fn ravel_index(&self, coord: Coord) -> Option<usize> {
        (coord.0 < self.rows && coord.1 < self.cols)
            .then(|| coord.0 as usize * self.cols as usize + coord.1 as usize)
    }

    pub fn role(&self, coord: Coord) -> Option<Role> {
        self.ravel_index(coord).map(|idx| self.roles[idx])
    }

    /// Applies an event. Returns the resulting change, or `None` if the tile is outside
    /// the frame, already has that role, or is a pinned entry/exit tile.
    pub fn apply(&mut self, event: StepEvent) -> Option<Change> {
        let idx = self.ravel_index(event.coord)?;
        let old = self.roles[idx];
        if old == event.role || old.is_pinned() {
            return None;
        }
        self.roles[idx] = event.role;
        Some(Change {
            coord: event.coord,
            old,
            new: event.role,
        })
    }

    /// Overwrites a tile's role unconditionally. Used to replay or revert changes.
    pub fn set(&mut self, coord: Coord, role: Role) {
        if let Some(idx) = self.ravel_index(coord) {
            self.roles[idx] = role;
        }
    }

    /// Number of tiles currently showing `role`.
    pub fn count(&self, role: Role) -> usize {
        self.roles.iter().filter(|&&r| r == role).count()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.roles.chunks(self.cols as usize) {
            let line = line.iter().map(|role| role.symbol()).collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
