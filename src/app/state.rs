use std::time::Duration;

use crate::{
    app::history::StepHistory,
    config::{self, Settings},
    error::MazeError,
    generators::{MazeCarver, Openings},
    maze::Grid,
    solvers::{BfsSolver, bfs_depths},
    visualize::{Change, Frame, StepEvent},
};

/// Maximum number of frame changes kept for stepping backward while paused.
const MAX_HISTORY_STEPS: usize = 10_000;

/// What the viewer asks the state to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Timer fired: play one step unless paused
    Tick,
    TogglePause,
    /// Step forward in history or to the future when paused
    StepForward,
    /// Step backward in history when paused
    StepBackward,
    SpeedUp,
    SlowDown,
    /// Start solving a carved maze
    Solve,
    /// Carve a fresh maze with the next seed
    Regenerate,
    /// Terminal was resized
    Resize,
    Quit,
}

enum Phase {
    Carving(MazeCarver),
    /// Carving is done and no solve has been requested yet
    Carved(Grid),
    Solving(BfsSolver),
    Solved {
        found: bool,
        path_len: usize,
        visited: usize,
        /// Tiles reachable from the entry at all
        reachable: usize,
    },
}

/// The whole viewer state. Passed by value through [`update`].
pub struct AppState {
    width: u8,
    height: u8,
    seed: Option<u64>,
    openings: Openings,
    auto_solve: bool,
    phase: Phase,
    /// Roles as currently shown
    frame: Frame,
    history: StepHistory,
    paused: bool,
    step_delay: Duration,
    /// Changes applied to the frame but not drawn yet
    dirty: Vec<Change>,
    /// The whole frame must be drawn again
    needs_full_redraw: bool,
    quit: bool,
}

impl AppState {
    pub fn new(width: u8, height: u8, settings: &Settings) -> Result<Self, MazeError> {
        let carver = MazeCarver::new(width, height, settings.seed, settings.openings)?;
        let frame = Frame::from_grid(carver.grid());
        tracing::info!(
            "Starting {}x{} maze (seed {:?}, openings {})",
            width,
            height,
            settings.seed,
            settings.openings
        );
        Ok(AppState {
            width,
            height,
            seed: settings.seed,
            openings: settings.openings,
            auto_solve: settings.auto_solve,
            phase: Phase::Carving(carver),
            frame,
            history: StepHistory::new(MAX_HISTORY_STEPS),
            paused: false,
            step_delay: settings.step_delay,
            dirty: Vec::new(),
            needs_full_redraw: true,
            quit: false,
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Whether there is nothing left to play.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Carved(_) | Phase::Solved { .. }) && !self.history.is_rewound()
    }

    /// `Some(found)` once a solve has finished.
    pub fn solve_outcome(&self) -> Option<bool> {
        match self.phase {
            Phase::Solved { found, .. } => Some(found),
            _ => None,
        }
    }

    /// Changes applied since the last call.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.dirty)
    }

    /// Whether the whole frame needs drawing. Resets the flag.
    pub fn take_full_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_full_redraw)
    }

    /// One line summary for the status bar.
    pub fn status(&self) -> String {
        let phase = match &self.phase {
            Phase::Carving(_) => "Carving".to_string(),
            Phase::Carved(_) => "Carved, press s to solve".to_string(),
            Phase::Solving(solver) => format!("Solving, {} visited", solver.visit_order().len()),
            Phase::Solved {
                found: true,
                path_len,
                visited,
                reachable,
            } => format!(
                "Solved: path of {} tiles, {} of {} reachable tiles visited",
                path_len, visited, reachable
            ),
            Phase::Solved { found: false, .. } => "No path found".to_string(),
        };
        let seed = self
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string());
        let paused = if self.paused { " | PAUSED" } else { "" };
        format!(
            "{} | {}x{} seed {} | {} ms/step{} | r: regenerate  g: settings  Esc: quit",
            phase,
            self.width,
            self.height,
            seed,
            self.step_delay.as_millis(),
            paused
        )
    }

    fn show(&mut self, change: Change) {
        self.frame.set(change.coord, change.new);
        self.dirty.push(change);
    }

    fn next_event(&mut self) -> Option<StepEvent> {
        match &mut self.phase {
            Phase::Carving(carver) => carver.next(),
            Phase::Solving(solver) => solver.next(),
            Phase::Carved(_) | Phase::Solved { .. } => None,
        }
    }

    /// Moves on from a drained phase. Returns whether a new event source was started.
    fn finish_phase(&mut self) -> bool {
        let next = match &self.phase {
            Phase::Carving(carver) => {
                let grid = carver.grid().clone();
                Some(if self.auto_solve {
                    solving_phase(grid)
                } else {
                    Phase::Carved(grid)
                })
            }
            Phase::Solving(solver) => Some(Phase::Solved {
                found: solver.outcome() == Some(true),
                path_len: solver.path().len(),
                visited: solver.visit_order().len(),
                reachable: solver
                    .grid()
                    .entry()
                    .map_or(0, |entry| bfs_depths(solver.grid(), entry).len()),
            }),
            Phase::Carved(_) | Phase::Solved { .. } => None,
        };
        match next {
            Some(next) => {
                let started = matches!(next, Phase::Solving(_));
                self.phase = next;
                started
            }
            None => false,
        }
    }

    /// Shows one more change: replayed from history if rewound, otherwise pulled from the
    /// running algorithm. Events that change nothing on screen are skipped.
    fn step_forward(&mut self) {
        if let Some(change) = self.history.redo() {
            self.show(change);
            return;
        }
        loop {
            match self.next_event() {
                Some(event) => {
                    if let Some(change) = self.frame.apply(event) {
                        self.history.record(change);
                        self.dirty.push(change);
                        return;
                    }
                }
                None => {
                    if !self.finish_phase() {
                        return;
                    }
                }
            }
        }
    }

    fn step_backward(&mut self) {
        if let Some(change) = self.history.undo() {
            self.show(change);
        }
    }

    fn solve(&mut self) {
        if let Phase::Carved(grid) = &self.phase {
            let grid = grid.clone();
            // Make sure the carved maze is fully shown before the solve starts
            while let Some(change) = self.history.redo() {
                self.show(change);
            }
            self.phase = solving_phase(grid);
        }
    }

    fn regenerate(&mut self) {
        let settings = Settings {
            seed: self.seed.map(|s| s.wrapping_add(1)),
            openings: self.openings,
            step_delay: self.step_delay,
            auto_solve: self.auto_solve,
            ..Settings::default()
        };
        match AppState::new(self.width, self.height, &settings) {
            Ok(state) => {
                let paused = self.paused;
                *self = state;
                self.paused = paused;
            }
            Err(e) => tracing::error!("Could not regenerate maze: {}", e),
        }
    }
}

fn solving_phase(grid: Grid) -> Phase {
    let (Some(entry), Some(exit)) = (grid.entry(), grid.exit()) else {
        tracing::warn!("Maze has no entry or exit, nothing to solve");
        return Phase::Carved(grid);
    };
    match BfsSolver::new(grid.clone(), entry, exit) {
        Ok(solver) => {
            tracing::debug!("Solving from {:?} to {:?}", entry, exit);
            Phase::Solving(solver)
        }
        Err(e) => {
            tracing::error!("Could not start solving: {}", e);
            Phase::Carved(grid)
        }
    }
}

/// Applies one action and hands the state back.
pub fn update(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::Tick => {
            if !state.paused {
                state.step_forward();
            }
        }
        Action::TogglePause => {
            if state.paused {
                // Catch up with everything stepped back over before resuming
                while let Some(change) = state.history.redo() {
                    state.show(change);
                }
            }
            state.paused = !state.paused;
        }
        Action::StepForward => {
            if state.paused {
                state.step_forward();
            }
        }
        Action::StepBackward => {
            if state.paused {
                state.step_backward();
            }
        }
        Action::SpeedUp => state.step_delay = config::faster(state.step_delay),
        Action::SlowDown => state.step_delay = config::slower(state.step_delay),
        Action::Solve => state.solve(),
        Action::Regenerate => state.regenerate(),
        Action::Resize => state.needs_full_redraw = true,
        Action::Quit => state.quit = true,
    }
    state
}
