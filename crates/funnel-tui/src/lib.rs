//! Terminal User Interface for funnel.
//!
//! Browse, filter, and page through investors, and move them through the
//! outreach funnel for either owner. Talks to a backend through
//! [`FunnelClient`]: over HTTP ([`HttpClient`]) or straight to the database
//! ([`LocalClient`]).

mod app;
pub mod client;
mod debounce;
pub mod dispatch;
mod http;
mod local;
pub mod state;
mod theme;
mod ui;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use ratatui::{backend::CrosstermBackend, Terminal};

use funnel_core::model::Stage;

use app::{update, App, Message, Mode};

pub use client::FunnelClient;
pub use dispatch::{dispatch, Intent};
pub use http::HttpClient;
pub use local::LocalClient;
pub use state::{Dashboard, OwnerFilter, PageView};

/// Run the TUI application
pub fn run<C: FunnelClient + 'static>(client: C) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(Box::new(client));

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Handle events with timeout
        let message = if event::poll(Duration::from_millis(100))? {
            handle_event(event::read()?, terminal, app)?
        } else {
            Some(Message::Tick(Instant::now()))
        };

        // Process message and any follow-up messages
        let mut next = message;
        while let Some(msg) = next {
            next = update(app, msg);
        }
    }

    Ok(())
}

/// Handle an event and return a message (if any)
fn handle_event(
    event: Event,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
) -> Result<Option<Message>> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            handle_key(key.code, key.modifiers, terminal, app)
        }
        _ => Ok(None),
    }
}

/// Handle keyboard input
fn handle_key(
    code: KeyCode,
    modifiers: KeyModifiers,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
) -> Result<Option<Message>> {
    // Help overlay takes priority - any key dismisses it
    if app.show_help {
        return Ok(Some(Message::ToggleHelp));
    }

    // Suspend (Ctrl+Z) works in every mode
    if code == KeyCode::Char('z') && modifiers.contains(KeyModifiers::CONTROL) {
        suspend(terminal)?;
        return Ok(None);
    }

    Ok(match app.mode {
        Mode::Browse => handle_browse_key(code),
        Mode::Search => handle_search_key(code),
        Mode::EditNote { .. } => handle_note_key(code),
    })
}

fn handle_browse_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Char('?') => Some(Message::ToggleHelp),
        KeyCode::Char('R') => Some(Message::Refresh),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => Some(Message::MoveSelection(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(Message::MoveSelection(-1)),
        KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
        KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PrevPage),

        // Filters
        KeyCode::Char('/') => Some(Message::StartSearch),
        KeyCode::Char('o') => Some(Message::CycleOwnerFilter),
        KeyCode::Char('0') => Some(Message::ClearStageFilter),
        KeyCode::Char(c @ '1'..='8') => c
            .to_digit(10)
            .and_then(|d| usize::try_from(d).ok())
            .and_then(|d| Stage::ALL.get(d - 1))
            .map(|stage| Message::ToggleStageFilter(*stage)),

        // Progress
        KeyCode::Tab => Some(Message::SwitchOwner),
        KeyCode::Char(' ') => Some(Message::ToggleOwner),
        KeyCode::Char('l') | KeyCode::Right => Some(Message::NextStage),
        KeyCode::Char('h') | KeyCode::Left => Some(Message::PrevStage),
        KeyCode::Char('e') => Some(Message::EditNote),

        _ => None,
    }
}

fn handle_search_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Enter | KeyCode::Esc => Some(Message::SearchDone),
        KeyCode::Backspace => Some(Message::SearchBackspace),
        KeyCode::Char(c) => Some(Message::SearchInput(c)),
        _ => None,
    }
}

fn handle_note_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Enter => Some(Message::SaveNote),
        KeyCode::Esc => Some(Message::CancelEdit),
        KeyCode::Backspace => Some(Message::NoteBackspace),
        KeyCode::Char(c) => Some(Message::NoteInput(c)),
        _ => None,
    }
}

/// Suspend the TUI (Ctrl+Z support)
fn suspend(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    // Restore terminal before suspending
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Send SIGTSTP to suspend
    signal::kill(Pid::this(), Signal::SIGTSTP)?;

    // Re-setup terminal when resumed
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;

    Ok(())
}
