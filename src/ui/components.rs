//! Panels drawn by `UiApp`

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;

use super::{Phase, TableProgress};

/// Status panel showing current phase, source/target info and warning count
pub struct StatusPanel {
    phase: Phase,
    info: String,
    warnings: usize,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Reading,
            info: String::new(),
            warnings: 0,
        }
    }

    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let phase_style = match self.phase {
            Phase::Complete => Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        };

        let phase_indicator = match self.phase {
            Phase::Reading => "◐",
            Phase::Resetting => "↺",
            Phase::Loading => "⚙",
            Phase::Complete => "✓",
        };

        let warning_style = if self.warnings > 0 {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", phase_indicator), phase_style),
                Span::styled(self.phase.to_string(), phase_style),
                Span::raw("   "),
                Span::styled(format!("{} warnings", self.warnings), warning_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Chichewa Text2SQL Loader ")
            .border_style(Style::default().fg(Color::Blue));

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }
}

/// Gauge for the table currently being loaded
pub struct ProgressPanel {
    current: Option<TableProgress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn set(&mut self, progress: TableProgress) {
        self.current = Some(progress);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.current else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio())
            .label(format!(
                "{}: {}/{} records",
                progress.table, progress.loaded, progress.total
            ));
        frame.render_widget(gauge, area);
    }
}

/// Severity of an activity log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
}

/// Log panel showing scrollable history
pub struct LogPanel {
    entries: Vec<(LogLevel, String)>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 200,
        }
    }

    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push((level, message.into()));
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .enumerate()
            .map(|(i, (level, entry))| {
                let latest = i == self.entries.len() - start - 1;
                let style = match (level, latest) {
                    (LogLevel::Warning, _) => Style::default().fg(Color::Yellow),
                    (LogLevel::Info, true) => Style::default().fg(Color::White),
                    (LogLevel::Info, false) => Style::default().fg(Color::DarkGray),
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}
