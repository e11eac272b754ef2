use std::io::{self, Stdout};

use crossterm::{cursor, execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::{layout::render_layout, Presenter, Snapshot};

/// Full-screen table display.
///
/// Uses the alternate screen so log output and the previous shell contents
/// are left untouched. Raw mode stays off, so Ctrl+C still reaches the
/// process as an interrupt.
pub struct TerminalPresenter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalPresenter {
    pub fn enter() -> anyhow::Result<Self> {
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;

        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Leave the alternate screen and show the cursor again.
    pub fn restore(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.terminal.draw(|f| render_layout(f, snapshot))?;
        Ok(())
    }
}

impl Drop for TerminalPresenter {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!(error = %e, "Failed to restore terminal");
        }
    }
}
