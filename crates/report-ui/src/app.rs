//! Interactive overdue report.
//!
//! [`App`] owns the [`OverdueSession`], the active chart and the selected
//! bar. Processing runs on the event-loop task between frames; the loop
//! polls the keyboard with a 250 ms timeout.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use report_runtime::batch::OverdueSession;
use report_runtime::chart_manager::ChartId;

use crate::{chart_view, log_view};
use crate::themes::Theme;

const LOG_PANEL_HEIGHT: u16 = 8;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    /// Process the selected files again.
    Reload,
    Quit,
}

/// Root state of the report TUI.
pub struct App {
    pub theme: Theme,
    pub session: OverdueSession,
    /// Chart shown in the main panel.
    pub active: ChartId,
    /// Index of the selected bar within the active chart.
    pub selected: usize,
    pub should_quit: bool,
    /// Set while a run is pending, so the next frame shows a notice first.
    pub processing: bool,
}

impl App {
    pub fn new(theme_name: &str, session: OverdueSession) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            session,
            active: ChartId::Overdue,
            selected: 0,
            should_quit: false,
            processing: true,
        }
    }

    fn bar_count(&self) -> usize {
        self.session
            .charts()
            .get(self.active)
            .map(|h| h.spec.bars.len())
            .unwrap_or(0)
    }

    /// Apply a key press to the state.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                KeyAction::Quit
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                KeyAction::Quit
            }
            KeyCode::Tab => {
                self.active = self.active.next();
                self.selected = 0;
                KeyAction::None
            }
            KeyCode::Right | KeyCode::Down => {
                let count = self.bar_count();
                if count > 0 {
                    self.selected = (self.selected + 1) % count;
                }
                KeyAction::None
            }
            KeyCode::Left | KeyCode::Up => {
                let count = self.bar_count();
                if count > 0 {
                    self.selected = (self.selected + count - 1) % count;
                }
                KeyAction::None
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.session.clear();
                self.selected = 0;
                KeyAction::None
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.processing = true;
                KeyAction::Reload
            }
            _ => KeyAction::None,
        }
    }

    /// Process the selected files and reset the selection.
    pub async fn process(&mut self) {
        self.session.run().await;
        self.selected = 0;
        self.processing = false;
    }

    /// Run the TUI until `q` or `Ctrl+C`. The first frame triggers the
    /// initial processing run.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            if self.processing {
                self.process().await;
                continue;
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if self.handle_key(key) == KeyAction::Quit {
                            break Ok(());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Render the current state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let [header, tabs, main, logs, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(LOG_PANEL_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let jobs = self.session.jobs();
        let status = if self.processing {
            Span::styled("Processando...", self.theme.warning)
        } else {
            Span::styled(
                format!(
                    "{} arquivo(s) · {} jobs",
                    self.session.files().len(),
                    jobs.len()
                ),
                self.theme.label,
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("RELATÓRIO DE OVERDUE ", self.theme.header),
                status,
            ])),
            header,
        );

        let charts = self.session.charts();
        let titles = |id: ChartId| {
            charts
                .get(id)
                .map(|h| h.spec.title.clone())
                .unwrap_or_else(|| id.to_string())
        };
        frame.render_widget(
            Paragraph::new(chart_view::tabs_line(self.active, titles, &self.theme)),
            tabs,
        );

        chart_view::render_chart(
            frame,
            main,
            charts.get(self.active),
            self.selected,
            &self.theme,
        );
        log_view::render_logs(frame, logs, self.session.log(), &self.theme);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Tab gráfico · ←/→ barra · r processar · c limpar · q sair",
                self.theme.dim,
            ))),
            footer,
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
