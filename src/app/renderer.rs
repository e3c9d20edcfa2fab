use std::io::{Stdout, Write};

use crossterm::{
    cursor, queue,
    style::{self, Attribute, Color, StyledContent, Stylize},
    terminal::{self, ClearType},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::{
    app::state::AppState,
    visualize::{Change, Frame, Role},
};

/// Styled two column glyph for a role.
pub fn glyph(role: Role) -> StyledContent<&'static str> {
    let styled_symbol = match role {
        Role::Wall => "⬜".with(Color::White),
        Role::Passage => "  ".with(Color::Reset),
        Role::Visited => "* ".with(Color::Blue),
        Role::Path => "🟨".with(Color::Yellow),
        Role::Entry => "🟩".with(Color::Green),
        Role::Exit => "🟥".with(Color::Red),
        Role::Frontier => "🟪".with(Color::Magenta),
    };

    #[cfg(debug_assertions)]
    {
        use unicode_width::UnicodeWidthStr;
        assert_eq!(
            styled_symbol.content().width(),
            Renderer::CELL_WIDTH as usize,
            "Each cell must occupy exactly two character widths."
        );
    }

    styled_symbol
}

/// Draws an [`AppState`] onto the terminal: the maze on top, a status line below it.
pub struct Renderer {
    /// Standard output handle to write to the terminal
    stdout: Stdout,
    /// Whether the last full draw fit in the terminal
    fits: bool,
}

impl Renderer {
    /// The width of each tile when rendered, in character widths.
    pub const CELL_WIDTH: u16 = 2;
    /// Rows kept free below the maze for the status line.
    pub const NUM_STATUS_ROWS: u16 = 2;

    pub fn new() -> Self {
        Self {
            stdout: std::io::stdout(),
            fits: false,
        }
    }

    /// Draws whatever changed since the last call.
    ///
    /// The whole frame is drawn when the state asks for it, otherwise only the pending
    /// changes are. Nothing but a notice is drawn while the terminal is too small.
    pub fn draw(&mut self, state: &mut AppState) -> std::io::Result<()> {
        let full_redraw = state.take_full_redraw();
        let changes = state.take_changes();
        let frame = state.frame();

        if full_redraw {
            self.fits = Renderer::fits_terminal(frame)?;
            if !self.fits {
                return self.draw_too_small(frame);
            }
            self.draw_frame(frame)?;
        } else if self.fits {
            self.draw_changes(&changes)?;
        } else {
            // Wait for a resize to try again
            return Ok(());
        }

        self.draw_status(&state.status(), frame.rows())?;
        self.stdout.flush()
    }

    fn fits_terminal(frame: &Frame) -> std::io::Result<bool> {
        let (term_width, term_height) = terminal::size()?;
        Ok(
            term_width as u32 >= frame.cols() as u32 * Renderer::CELL_WIDTH as u32
                && term_height as u32 >= frame.rows() as u32 + Renderer::NUM_STATUS_ROWS as u32,
        )
    }

    fn draw_too_small(&mut self, frame: &Frame) -> std::io::Result<()> {
        let msg = format!(
            "Terminal size is too small to display the {}x{} tile maze ({} columns and {} rows needed). Please resize the terminal.\r\n",
            frame.cols(),
            frame.rows(),
            frame.cols() as u32 * Renderer::CELL_WIDTH as u32,
            frame.rows() as u32 + Renderer::NUM_STATUS_ROWS as u32,
        );
        queue!(
            self.stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0),
            style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold)),
            style::PrintStyledContent(
                "Press Esc to exit...\r\n"
                    .with(Color::Blue)
                    .attribute(Attribute::Bold)
            )
        )?;
        self.stdout.flush()
    }

    fn draw_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        queue!(
            self.stdout,
            cursor::Hide,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        for row in 0..frame.rows() {
            for col in 0..frame.cols() {
                let role = frame.role((row, col)).unwrap_or_default();
                queue!(self.stdout, style::PrintStyledContent(glyph(role)))?;
            }
            queue!(self.stdout, style::Print("\r\n"))?;
        }
        Ok(())
    }

    fn draw_changes(&mut self, changes: &[Change]) -> std::io::Result<()> {
        for change in changes {
            let (row, col) = change.coord;
            queue!(
                self.stdout,
                cursor::MoveTo(col * Renderer::CELL_WIDTH, row),
                style::PrintStyledContent(glyph(change.new))
            )?;
        }
        Ok(())
    }

    fn draw_status(&mut self, status: &str, row: u16) -> std::io::Result<()> {
        let (term_width, _) = terminal::size()?;
        let (status, _) = status.unicode_truncate(term_width as usize);
        queue!(
            self.stdout,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::CurrentLine),
            style::PrintStyledContent(status.with(Color::Cyan).attribute(Attribute::Bold))
        )
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn test_glyphs_are_two_columns_wide() {
        for role in [
            Role::Wall,
            Role::Passage,
            Role::Visited,
            Role::Path,
            Role::Entry,
            Role::Exit,
            Role::Frontier,
        ] {
            assert_eq!(glyph(role).content().width(), Renderer::CELL_WIDTH as usize);
        }
    }

    #[test]
    fn test_status_truncation() {
        let (status, width) = "Solving, 12 visited | 5x5".unicode_truncate(7);
        assert_eq!(status, "Solving");
        assert_eq!(width, 7);
    }
}
