mod history;
mod renderer;
mod state;

pub use renderer::{Renderer, glyph};
pub use state::{Action, AppState, update};

use std::{
    io::{Stdout, Write},
    time::Duration,
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};

use crate::{
    config::{self, Settings},
    error::AppError,
    generators::{Openings, generate_maze_with},
    solvers::BfsSolver,
    visualize::{Frame, Recording},
};

/// How long to wait for input when nothing is playing.
const IDLE_POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Set a panic hook to restore terminal state on panic
/// This ensures that the terminal is not left in raw mode or alternate screen on panic
fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal(&mut std::io::stdout()); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

/// Setup terminal in raw mode and enter alternate screen
/// Also sets a panic hook to restore terminal on panic
pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    set_panic_hook();
    queue!(
        stdout,
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide,
        cursor::MoveTo(0, 0)
    )?;
    stdout.flush()?;
    Ok(())
}

/// Restore terminal to its previous state
/// Leave alternate screen and disable raw mode
pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    queue!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
    stdout.flush()?;
    terminal::disable_raw_mode()?;
    Ok(())
}

/// Maps a pressed key to what the viewer should do.
///
/// `g` (settings) is not an [`Action`] since it needs the terminal, see [`run`].
fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Left => Some(Action::StepBackward),
        KeyCode::Right => Some(Action::StepForward),
        KeyCode::Up => Some(Action::SpeedUp),
        KeyCode::Down => Some(Action::SlowDown),
        KeyCode::Char('s') => Some(Action::Solve),
        KeyCode::Char('r') => Some(Action::Regenerate),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

/// Interactive viewer loop.
///
/// Asks for whatever dimensions `settings` leaves open, then plays carving and solving
/// one step per tick until the user quits. A single thread polls the terminal for input
/// with the step delay as timeout, so every poll that times out is a tick.
pub fn run(stdout: &mut Stdout, settings: &Settings) -> Result<(), AppError> {
    let Some((width, height)) = ask_maze_dimensions(stdout, settings.width, settings.height)?
    else {
        return Ok(());
    };
    if !show_controls(stdout)? {
        return Ok(());
    }

    let mut settings = Settings {
        width: Some(width),
        height: Some(height),
        ..settings.clone()
    };
    let mut state = AppState::new(width, height, &settings)?;
    let mut renderer = Renderer::new();

    tracing::info!("Started main app loop");
    loop {
        renderer.draw(&mut state)?;
        if state.should_quit() {
            break;
        }

        let timeout = if state.is_paused() || state.is_idle() {
            IDLE_POLL_TIMEOUT
        } else {
            state.step_delay()
        };
        if !event::poll(timeout)? {
            state = update(state, Action::Tick);
            continue;
        }

        state = match event::read()? {
            event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                match key_event.code {
                    KeyCode::Char('g') => {
                        match ask_settings(stdout, &settings, state.step_delay())? {
                            Some(new_settings) => {
                                let (width, height) = new_settings.dimensions_or_default();
                                settings = new_settings;
                                AppState::new(width, height, &settings)?
                            }
                            // Dialog cancelled, bring the maze back
                            None => update(state, Action::Resize),
                        }
                    }
                    code => match key_action(code) {
                        Some(action) => {
                            tracing::debug!("Key {:?} mapped to {:?}", code, action);
                            update(state, action)
                        }
                        None => state,
                    },
                }
            }
            event::Event::Resize(_, _) => update(state, Action::Resize),
            _ => state,
        };
    }
    tracing::info!("Exiting main app loop");
    Ok(())
}

/// Generates (and unless disabled, solves) a maze without animation and writes the final
/// frame as text to `out`.
pub fn run_headless<W: Write>(settings: &Settings, out: &mut W) -> Result<(), AppError> {
    let (width, height) = settings.dimensions_or_default();
    let grid = generate_maze_with(width, height, settings.seed, settings.openings)?;
    let mut frame = Frame::from_grid(&grid);

    let summary = match (settings.auto_solve, grid.entry(), grid.exit()) {
        (true, Some(entry), Some(exit)) => {
            let mut solver = BfsSolver::new(grid.clone(), entry, exit)?;
            let recording = Recording::capture(&mut solver);
            for event in recording.iter() {
                frame.apply(event);
            }
            if solver.outcome() == Some(true) {
                format!(
                    "Path of {} tiles found after visiting {} tiles",
                    solver.path().len(),
                    solver.visit_order().len()
                )
            } else {
                "No path found".to_string()
            }
        }
        _ => "Not solved".to_string(),
    };

    write!(out, "{}", frame)?;
    writeln!(out, "{}", summary)?;
    out.flush()?;
    Ok(())
}

/// Prints the key bindings and waits for a key press.
/// Returns false if the user pressed Esc.
fn show_controls(stdout: &mut Stdout) -> std::io::Result<bool> {
    queue!(
        stdout,
        style::PrintStyledContent(
            "Controls:\r\n"
                .with(Color::Yellow)
                .attribute(Attribute::Bold)
        ),
        style::PrintStyledContent("  Enter/Space: Pause/Resume animation\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  ←/→: Step backward/forward when paused\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  ↑/↓: Speed up/slow down animation\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  s: Solve the carved maze\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  r: Regenerate\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  g: Settings\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  Esc/q: Exit\r\n\r\n".with(Color::Cyan)),
        style::PrintStyledContent(
            "Press any key to start, or Esc to exit...\r\n"
                .with(Color::Blue)
                .attribute(Attribute::Bold)
        ),
    )?;
    stdout.flush()?;
    wait_for_keypress()
}

/// Blocks until a key is pressed. Returns false if it was Esc.
fn wait_for_keypress() -> std::io::Result<bool> {
    loop {
        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind == event::KeyEventKind::Press {
                return Ok(code != KeyCode::Esc);
            }
        }
    }
}

/// Settings dialog: asks for new dimensions, openings and step delay.
/// Returns None if the user cancels with Esc.
fn ask_settings(
    stdout: &mut Stdout,
    settings: &Settings,
    step_delay: Duration,
) -> std::io::Result<Option<Settings>> {
    queue!(
        stdout,
        terminal::Clear(ClearType::All),
        cursor::MoveTo(0, 0)
    )?;
    stdout.flush()?;

    let Some((width, height)) = ask_maze_dimensions(stdout, None, None)? else {
        return Ok(None);
    };
    let Some(openings) = select_from_menu(
        stdout,
        "Select where the entry and exit go (use arrow keys and Enter, or Esc to cancel):",
        &Openings::ALL,
    )?
    else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Openings set to {}\r\n", openings)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let prompt = format!("Step delay in ms (currently {}): ", step_delay.as_millis());
    let Some(step_delay) =
        prompt_with_validation(stdout, &prompt, |s| parse_step_delay(s, step_delay))?
    else {
        return Ok(None);
    };
    tracing::info!(
        "Settings changed to {}x{} with {} openings and {:?} per step",
        width,
        height,
        openings,
        step_delay
    );
    Ok(Some(Settings {
        width: Some(width),
        height: Some(height),
        openings,
        step_delay,
        ..settings.clone()
    }))
}

/// Get user input with real-time validation and feedback
/// Returns None if user cancels input with Esc
/// Returns Some(T) if user inputs a valid input and presses Enter, where T is the validated type
fn prompt_with_validation<F, T>(
    stdout: &mut Stdout,
    prompt: &str,
    validate: F,
) -> std::io::Result<Option<T>>
where
    F: Fn(&str) -> Result<T, String>,
{
    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;
    stdout.flush()?;

    let mut input = String::new();

    let validated = loop {
        // Re-render prompt line
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(
            prompt.with(Color::Cyan).attribute(Attribute::Bold),
        ))?;

        // Decide color based on validity
        let validation_result = validate(input.trim());
        let color = if validation_result.is_ok() {
            Color::Green
        } else {
            Color::Red
        };
        queue!(
            stdout,
            style::SetForegroundColor(color),
            style::Print(&input),
            style::ResetColor,
            style::Print(" \r\n")
        )?;

        // Error message line (if any)
        if let Err(msg) = validation_result {
            stdout.queue(style::PrintStyledContent(
                msg.with(Color::DarkGrey).attribute(Attribute::Dim),
            ))?;
        }
        stdout.flush()?;

        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => {
                    if let Ok(value) = validate(input.trim()) {
                        break Some(value);
                    }
                }
                KeyCode::Char(c) if !c.is_whitespace() && !c.is_control() => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => break None,
                _ => {}
            }
        }
    };
    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(validated)
}

/// Largest maze dimension in cells that fits `term_size` terminal cells when each tile
/// takes `cell_size` of them. The doubled grid needs `2 * n + 1` tiles for `n` cells.
fn get_max_maze_size(term_size: u16, cell_size: u16) -> u8 {
    let tiles = term_size / cell_size.max(1);
    (tiles.saturating_sub(1) / 2).clamp(1, u8::MAX as u16) as u8
}

/// Parses a maze dimension between 1 and `max_size`. Empty input means `max_size`.
fn parse_dimension(s: &str, max_size: u8) -> Result<u8, String> {
    if s.is_empty() {
        return Ok(max_size);
    }
    let error_msg = format!(
        "Please enter a number between 1 and {}, or nothing for {}.",
        max_size, max_size
    );
    match s.parse::<u8>() {
        Ok(n) if (1..=max_size).contains(&n) => Ok(n),
        _ => Err(error_msg),
    }
}

/// Parses a step delay in milliseconds within the allowed bounds. Empty input keeps
/// `current`.
fn parse_step_delay(s: &str, current: Duration) -> Result<Duration, String> {
    if s.is_empty() {
        return Ok(current);
    }
    let (min, max) = (
        config::MIN_STEP_DELAY.as_millis(),
        config::MAX_STEP_DELAY.as_millis(),
    );
    let error_msg = format!(
        "Please enter a number of milliseconds between {} and {}, or nothing to keep {}.",
        min,
        max,
        current.as_millis()
    );
    match s.parse::<u64>() {
        Ok(ms) if (min..=max).contains(&(ms as u128)) => Ok(Duration::from_millis(ms)),
        _ => Err(error_msg),
    }
}

/// Ask user for the maze dimensions that are not known yet.
/// Returns None if user cancels input with Esc
fn ask_maze_dimensions(
    stdout: &mut Stdout,
    width: Option<u8>,
    height: Option<u8>,
) -> std::io::Result<Option<(u8, u8)>> {
    if let (Some(width), Some(height)) = (width, height) {
        return Ok(Some((width, height)));
    }

    stdout.execute(style::PrintStyledContent(
        "Enter maze dimensions in cells, or press Esc to exit. \
Maximum acceptable values are based on current terminal size.\r\n"
            .with(Color::Blue),
    ))?;

    // Fallback to max size if terminal size cannot be determined
    let (max_width, max_height) = match terminal::size() {
        Ok((term_width, term_height)) => (
            get_max_maze_size(term_width, Renderer::CELL_WIDTH),
            // Reserve rows for the status line
            get_max_maze_size(term_height.saturating_sub(Renderer::NUM_STATUS_ROWS), 1),
        ),
        Err(_) => (u8::MAX, u8::MAX),
    };

    let width = match width {
        Some(w) => w,
        None => match prompt_with_validation(stdout, "Width: ", |s| parse_dimension(s, max_width))?
        {
            Some(w) => w,
            None => return Ok(None),
        },
    };
    stdout.execute(style::PrintStyledContent(
        format!("Width set to {}\r\n", width)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let height = match height {
        Some(h) => h,
        None => {
            match prompt_with_validation(stdout, "Height: ", |s| parse_dimension(s, max_height))? {
                Some(h) => h,
                None => return Ok(None),
            }
        }
    };
    stdout.execute(style::PrintStyledContent(
        format!("Height set to {}\r\n", height)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    Ok(Some((width, height)))
}

/// Menu navigated with the arrow keys.
/// Returns None if user cancels with Esc
fn select_from_menu<T: std::fmt::Display + Copy>(
    stdout: &mut Stdout,
    prompt: &str,
    options: &[T],
) -> std::io::Result<Option<T>> {
    if options.is_empty() {
        return Ok(None);
    }

    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;

    let mut selected = 0;

    let selected_option = loop {
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(prompt.with(Color::Yellow)))?;
        for (i, option) in options.iter().enumerate() {
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::Reverse))?;
            }
            stdout.queue(style::Print(format!("\r\n{}", option)))?;
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::NoReverse))?;
            }
        }
        stdout.queue(style::Print("\r\n"))?;
        stdout.flush()?;

        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                // Only handle key press events
                continue;
            }
            match code {
                KeyCode::Up => {
                    selected = match selected {
                        0 => options.len() - 1,
                        _ => selected - 1,
                    };
                }
                KeyCode::Down => {
                    selected = (selected + 1) % options.len();
                }
                KeyCode::Enter => break Some(options[selected]),
                KeyCode::Esc => break None,
                _ => {}
            }
        }
    };
    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(selected_option)
}
