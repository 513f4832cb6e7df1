//! Progress reporting for loads.
//!
//! `Ui` is what the writer talks to. `UiApp` draws it full-screen with
//! ratatui, `LogUi` sends it to the `log` facade and `SilentUi` drops it.

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

use components::{LogLevel, LogPanel, ProgressPanel, StatusPanel};

/// Application phases shown in the status panel
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Reading,
    Resetting,
    Loading,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Reading => write!(f, "Reading source files"),
            Phase::Resetting => write!(f, "Resetting schema"),
            Phase::Loading => write!(f, "Loading tables"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// How far the loader has got through the current table
#[derive(Debug, Clone)]
pub struct TableProgress {
    pub table: String,
    pub loaded: u64,
    pub total: u64,
}

impl TableProgress {
    /// An empty table counts as fully loaded
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.loaded as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Trait for UI implementations - allows the TUI, plain logging and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);

    fn warn(&mut self, message: impl Into<String>) {
        self.log(message);
    }

    /// Polled between tables; returning true stops the load before the next table
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Full-screen loader view: status, progress gauge and activity log
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    log: LogPanel,
    stop_requested: bool,
    restored: bool,
}

impl UiApp {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::new(),
            log: LogPanel::new(),
            stop_requested: false,
            restored: false,
        })
    }

    /// `q`, Esc or Ctrl+C asks the loader to stop after the current table
    fn poll_stop_key(&mut self) -> bool {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(CrosstermEvent::Key(key)) = event::read() else {
                continue;
            };
            let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                if !self.stop_requested {
                    self.log.add(LogLevel::Warning, "Stop requested, finishing current table");
                }
                self.stop_requested = true;
            }
        }
        self.stop_requested
    }

    fn draw(&mut self) -> Result<()> {
        let (status, progress, log) = (&self.status, &self.progress, &self.log);

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Length(3), Constraint::Min(5)])
                .split(frame.area());

            status.render(frame, chunks[0]);
            progress.render(frame, chunks[1]);
            log.render(frame, chunks[2]);
        })?;

        Ok(())
    }

    /// Show the load summary, wait for a key, then give the terminal back
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.status.set_phase(Phase::Complete);
        self.status.set_info(summary);
        self.log.add(LogLevel::Info, "Press any key to exit");
        self.draw()?;

        loop {
            if let CrosstermEvent::Key(_) = event::read()? {
                break;
            }
        }

        self.restore()
    }

    /// Give the terminal back without waiting
    pub fn restore(mut self) -> Result<()> {
        self.leave_screen()
    }

    fn leave_screen(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.set_phase(phase);
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.status.set_info(info);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress.set(TableProgress {
            table: label.into(),
            loaded: current,
            total,
        });
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(LogLevel::Info, message);
        self.draw().ok();
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.status.record_warning();
        self.log.add(LogLevel::Warning, message);
        self.draw().ok();
    }

    fn should_stop(&mut self) -> bool {
        let stop = self.poll_stop_key();
        self.draw().ok();
        stop
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        self.leave_screen().ok();
    }
}

/// Non-interactive UI that forwards everything to the `log` facade
#[derive(Default)]
pub struct LogUi {
    phase: Option<Phase>,
}

impl LogUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        if self.phase.as_ref() != Some(&phase) {
            log::info!("{}", phase);
            self.phase = Some(phase);
        }
    }

    fn set_info(&mut self, info: impl Into<String>) {
        log::info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        log::debug!("{}: {}/{}", label.into(), current, total);
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        log::info!("{}", message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        log::warn!("{}", message.into());
    }
}

/// Silent UI implementation for testing
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
