//! Application state and event loop

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Widget,
    DefaultTerminal, Frame,
};
use tokio::sync::watch;

use crate::config::{ConfigStore, EndpointConfig};
use crate::services::{Refresher, RefreshTrigger, StatsClient};
use crate::types::RefreshState;

use super::widgets::{endpoints::EndpointList, header::Header};

/// Keybinding hints shown in the footer
const FOOTER: &str = "r refresh · j/k scroll · q quit";

/// Main application
pub struct App {
    state: RefreshState,
    endpoints: Vec<EndpointConfig>,
    trigger: RefreshTrigger,
    scroll: usize,
    spinner_frame: usize,
    should_quit: bool,
}

impl App {
    fn new(trigger: RefreshTrigger, endpoints: Vec<EndpointConfig>) -> Self {
        Self {
            state: RefreshState::default(),
            endpoints,
            trigger,
            scroll: 0,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Handle keyboard events
    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        self.should_quit = true;
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        self.trigger.request();
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.scroll = self.scroll.saturating_sub(1);
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.scroll = (self.scroll + 1).min(self.max_scroll());
                    }
                    _ => {}
                }
            }
        }
    }

    fn max_scroll(&self) -> usize {
        self.state
            .result
            .as_ref()
            .map(|r| r.snapshots.len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Swap in a freshly published refresh state
    fn apply_state(&mut self, state: RefreshState) {
        self.state = state;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Advance the spinner while a pass is in flight
    fn tick(&mut self) {
        if self.state.refreshing {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::vertical([
            Constraint::Length(2), // header + rule
            Constraint::Min(0),    // endpoint cards
            Constraint::Length(1), // keybindings
        ])
        .split(area);

        Header::new(&self.state, &self.endpoints, self.spinner_frame).render(chunks[0], buf);
        EndpointList::new(&self.state, self.scroll).render(chunks[1], buf);

        if chunks[2].height > 0 {
            buf.set_string(
                chunks[2].x + 1,
                chunks[2].y,
                FOOTER,
                Style::default().fg(Color::DarkGray),
            );
        }
    }
}

/// Run the TUI application
pub async fn run(store: Arc<ConfigStore>) -> anyhow::Result<()> {
    let client = StatsClient::new()?;
    let refresher = Refresher::new(client, store.clone());
    let mut state_rx = refresher.subscribe();
    let trigger = refresher.trigger();
    let worker = tokio::spawn(refresher.run());

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut state_rx, trigger, &store).await;
    ratatui::restore();
    worker.abort();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    state_rx: &mut watch::Receiver<RefreshState>,
    trigger: RefreshTrigger,
    store: &ConfigStore,
) -> anyhow::Result<()> {
    let mut config_rx = store.subscribe();
    let mut app = App::new(trigger, store.endpoints());

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Pick up a newly published refresh state (non-blocking)
        if state_rx.has_changed()? {
            app.apply_state(state_rx.borrow_and_update().clone());
        }
        // Config edits update the summary opt-in list
        if config_rx.has_changed().unwrap_or(false) {
            config_rx.borrow_and_update();
            app.endpoints = store.endpoints();
        }

        // Poll events with a 100ms timeout so the spinner animates
        if event::poll(Duration::from_millis(100))? {
            app.handle_event(event::read()?);
        } else {
            app.tick();
        }
    }

    Ok(())
}
