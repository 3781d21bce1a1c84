//! Application loop for the quick-panel TUI.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::app::export::write_manifest;
use crate::app::render::ManifestRenderer;
use crate::app::selection::SelectionSession;
use crate::app::session::{SessionSnapshot, SessionStore, target_key};
use crate::domain::model::{ApiVersion, TypeSet};
use crate::ui::components::listing::Listing;
use crate::ui::components::preview::Preview;

const TICK_RATE: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Interactive editor for one target manifest.
pub struct UiApp {
    session: SelectionSession,
    store: SessionStore,
    target: PathBuf,
    target_key: String,
    preview_xml: String,
    needs_refresh: bool,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl UiApp {
    /// Restore the target's last selection and cursor, if the store has one.
    pub fn new(
        universe: TypeSet,
        target: PathBuf,
        store: SessionStore,
        renderer: ManifestRenderer,
        version: ApiVersion,
    ) -> Result<Self> {
        let target_key = target_key(&target);
        let snapshot = store.load(&target_key)?.unwrap_or_default();
        let session = SelectionSession::new(
            universe,
            snapshot.selection,
            snapshot.selected_index,
            renderer,
            version,
        );
        let preview_xml = session.render_manifest()?;

        Ok(Self {
            session,
            store,
            target,
            target_key,
            preview_xml,
            needs_refresh: false,
            status: None,
            should_quit: false,
        })
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.draw(terminal)?;
            self.tick()?;

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key)?;
            }
        }
        Ok(())
    }

    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|frame| self.render(frame))?;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(size);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(layout[0]);

        let title = self
            .target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.target_key.clone());

        Listing.render(
            frame,
            main_chunks[0],
            self.session.listing(),
            self.session.cursor(),
            &title,
        );
        Preview.render(
            &self.preview_xml,
            &title,
            main_chunks[1],
            frame.buffer_mut(),
        );
        self.render_status(frame, layout[1]);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::from(vec![
                Span::styled("j/k", Style::default().fg(Color::Cyan)),
                Span::raw(" move · "),
                Span::styled("space", Style::default().fg(Color::Cyan)),
                Span::raw(" toggle · "),
                Span::styled("w", Style::default().fg(Color::Cyan)),
                Span::raw(" write · "),
                Span::styled("q", Style::default().fg(Color::Cyan)),
                Span::raw(" quit"),
            ]),
        };
        frame.render_widget(Paragraph::new(line), inner);
    }

    /// Applies the refresh scheduled by the last toggle, then expires the status line.
    pub fn tick(&mut self) -> Result<()> {
        if self.needs_refresh {
            self.preview_xml = self.session.render_manifest()?;
            self.needs_refresh = false;
        }
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.session.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.session.move_cursor(-1),
            KeyCode::Home => self.session.move_cursor(isize::MIN),
            KeyCode::End => self.session.move_cursor(isize::MAX),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current()?,
            KeyCode::Char('w') => self.write_target()?,
            _ => {}
        }
        Ok(())
    }

    fn toggle_current(&mut self) -> Result<()> {
        let index = self.session.cursor();
        match self.session.toggle(index) {
            Ok(outcome) => {
                tracing::debug!(line = ?outcome.target, "toggled");
                self.save_session()?;
                self.needs_refresh = true;
                let count = self.session.selection().len();
                self.set_status(StatusLevel::Info, format!("{count} types selected"));
            }
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
        Ok(())
    }

    fn save_session(&mut self) -> Result<()> {
        let snapshot = SessionSnapshot {
            selection: self.session.selection().clone(),
            selected_index: self.session.cursor(),
        };
        self.store.save(&self.target_key, &snapshot)
    }

    fn write_target(&mut self) -> Result<()> {
        let xml = self.session.render_manifest()?;
        match write_manifest(&self.target, &xml) {
            Ok(()) => self.set_status(
                StatusLevel::Success,
                format!("Wrote {}", self.target.display()),
            ),
            Err(err) => self.set_status(StatusLevel::Error, format!("{err:#}")),
        }
        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub fn preview_xml(&self) -> &str {
        &self.preview_xml
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + STATUS_TTL,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

enum StatusLevel {
    Info,
    Success,
    Error,
}
