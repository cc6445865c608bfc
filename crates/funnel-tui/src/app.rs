//! Application state and logic for the TUI.

use std::time::Instant;

use funnel_core::model::{Investor, Owner, Stage};

use crate::client::FunnelClient;
use crate::debounce::Debouncer;
use crate::dispatch::{dispatch, Intent};
use crate::state::Dashboard;

/// What keystrokes currently go to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Table navigation and actions
    Browse,
    /// Typing into the search line
    Search,
    /// Editing the note of one investor
    EditNote { investor_id: i64, buffer: String },
}

/// Messages for the Elm architecture update loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Move selection by delta (negative = up, positive = down)
    MoveSelection(i32),
    NextPage,
    PrevPage,

    // Filters
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    /// Leave search mode and apply the term immediately
    SearchDone,
    CycleOwnerFilter,
    ToggleStageFilter(Stage),
    ClearStageFilter,

    // Progress for the focused owner
    /// Focus the other owner
    SwitchOwner,
    ToggleOwner,
    NextStage,
    PrevStage,

    // Notes
    EditNote,
    NoteInput(char),
    NoteBackspace,
    SaveNote,
    CancelEdit,

    /// Periodic wakeup from the event loop
    Tick(Instant),
    /// Reload investors from the backend
    Refresh,
    ToggleHelp,
    Quit,
}

/// Application state
pub struct App {
    client: Box<dyn FunnelClient>,

    /// Investor cache with filters and paging
    pub dashboard: Dashboard,

    /// Row index within the current page
    pub selected: usize,

    /// Owner that progress keys act on
    pub focus_owner: Owner,

    pub mode: Mode,

    /// Search line contents; applied to the dashboard after the debounce
    pub search_input: String,
    debounce: Debouncer,

    /// Show help overlay
    pub show_help: bool,

    /// Should quit
    pub should_quit: bool,

    /// Status message (shown in status bar)
    pub status_message: Option<String>,
}

impl App {
    /// Create the app and load the initial investor list.
    ///
    /// A failed load leaves the table empty with the error in the status bar.
    #[must_use]
    pub fn new(client: Box<dyn FunnelClient>) -> Self {
        let mut app = Self {
            client,
            dashboard: Dashboard::default(),
            selected: 0,
            focus_owner: Owner::ALL[0],
            mode: Mode::Browse,
            search_input: String::new(),
            debounce: Debouncer::default(),
            show_help: false,
            should_quit: false,
            status_message: None,
        };
        app.refresh();
        app
    }

    /// Reload all investors from the backend, keeping filters.
    pub fn refresh(&mut self) {
        match self.client.fetch_investors() {
            Ok(investors) => {
                let count = investors.len();
                self.dashboard.replace_investors(investors);
                self.clamp_selection();
                self.status_message = Some(format!("Loaded {count} investors"));
            }
            Err(e) => {
                self.status_message = Some(format!("Load failed: {e:#}"));
            }
        }
    }

    /// The highlighted investor, if the page has any rows
    #[must_use]
    pub fn selected_investor(&self) -> Option<&Investor> {
        self.dashboard.page_view().items.get(self.selected).copied()
    }

    /// Typed search text not yet applied to the dashboard
    #[must_use]
    pub const fn search_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    fn clamp_selection(&mut self) {
        let rows = self.dashboard.page_view().items.len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    fn move_selection(&mut self, delta: i32) {
        let rows = self.dashboard.page_view().items.len();
        if rows == 0 {
            return;
        }
        let step = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        self.selected = if delta < 0 {
            self.selected.saturating_sub(step)
        } else {
            (self.selected + step).min(rows - 1)
        };
    }

    /// Push the typed search term into the dashboard.
    fn apply_search(&mut self) {
        if self.dashboard.filters().search != self.search_input {
            self.dashboard.set_search(self.search_input.clone());
            self.selected = 0;
        }
    }

    fn run_intent(&mut self, intent: Intent, done: String) {
        self.status_message = Some(
            match dispatch(self.client.as_ref(), &mut self.dashboard, intent) {
                Ok(()) => done,
                Err(e) => format!("Save failed: {e:#}"),
            },
        );
    }

    fn toggle_owner(&mut self) {
        let owner = self.focus_owner;
        let Some(investor) = self.selected_investor() else {
            return;
        };
        let (investor_id, active) = (investor.id, !investor.is_owned_by(owner));
        let done = if active {
            format!("{owner}: started at {}", Stage::FIRST)
        } else {
            format!("{owner}: cleared")
        };
        self.run_intent(
            Intent::ToggleOwner {
                investor_id,
                owner,
                active,
            },
            done,
        );
    }

    fn step_stage(&mut self, forward: bool) {
        let owner = self.focus_owner;
        let Some(investor) = self.selected_investor() else {
            return;
        };
        let investor_id = investor.id;
        let current = investor.progress_for(owner).map(|p| p.stage);

        let target = match (current, forward) {
            (None, true) => Some(Stage::FIRST),
            (None, false) => None,
            (Some(stage), true) => stage.next(),
            (Some(stage), false) => stage.prev(),
        };
        let Some(stage) = target else {
            self.status_message = Some(match current {
                None => format!("{owner} has no stage here"),
                Some(stage) => format!("{owner} is already at {stage}"),
            });
            return;
        };

        self.run_intent(
            Intent::SetStage {
                investor_id,
                owner,
                stage,
            },
            format!("{owner}: {} ({stage})", stage.title()),
        );
    }
}

/// Update the model based on a message (Elm architecture)
pub fn update(app: &mut App, message: Message) -> Option<Message> {
    // Ticks run even under the help overlay so a pending search still lands
    if let Message::Tick(now) = message {
        if app.debounce.fire(now) {
            app.apply_search();
        }
        return None;
    }

    // Help overlay takes priority
    if app.show_help {
        if let Message::ToggleHelp = message {
            app.show_help = false;
        }
        return None;
    }

    match message {
        Message::ToggleHelp => {
            app.show_help = true;
            None
        }
        Message::Quit => {
            app.should_quit = true;
            None
        }
        Message::Refresh => {
            app.refresh();
            None
        }
        Message::MoveSelection(delta) => {
            app.move_selection(delta);
            None
        }
        Message::NextPage => {
            if app.dashboard.next_page() {
                app.selected = 0;
            }
            None
        }
        Message::PrevPage => {
            if app.dashboard.prev_page() {
                app.selected = 0;
            }
            None
        }
        Message::StartSearch => {
            app.mode = Mode::Search;
            None
        }
        Message::SearchInput(c) => {
            app.search_input.push(c);
            app.debounce.touch(Instant::now());
            None
        }
        Message::SearchBackspace => {
            app.search_input.pop();
            app.debounce.touch(Instant::now());
            None
        }
        Message::SearchDone => {
            app.debounce.cancel();
            app.apply_search();
            app.mode = Mode::Browse;
            None
        }
        Message::CycleOwnerFilter => {
            let owner = app.dashboard.filters().owner.cycle();
            app.dashboard.set_owner_filter(owner);
            app.selected = 0;
            app.status_message = Some(format!("Owner filter: {owner}"));
            None
        }
        Message::ToggleStageFilter(stage) => {
            app.dashboard.toggle_stage_filter(stage);
            app.selected = 0;
            None
        }
        Message::ClearStageFilter => {
            app.dashboard.clear_stage_filter();
            app.selected = 0;
            None
        }
        Message::SwitchOwner => {
            app.focus_owner = app.focus_owner.other();
            app.status_message = Some(format!("Acting as {}", app.focus_owner));
            None
        }
        Message::ToggleOwner => {
            app.toggle_owner();
            None
        }
        Message::NextStage => {
            app.step_stage(true);
            None
        }
        Message::PrevStage => {
            app.step_stage(false);
            None
        }
        Message::EditNote => {
            if let Some(investor) = app.selected_investor() {
                app.mode = Mode::EditNote {
                    investor_id: investor.id,
                    buffer: investor.notes.clone().unwrap_or_default(),
                };
            }
            None
        }
        Message::NoteInput(c) => {
            if let Mode::EditNote { buffer, .. } = &mut app.mode {
                buffer.push(c);
            }
            None
        }
        Message::NoteBackspace => {
            if let Mode::EditNote { buffer, .. } = &mut app.mode {
                buffer.pop();
            }
            None
        }
        Message::SaveNote => {
            if let Mode::EditNote {
                investor_id,
                buffer,
            } = std::mem::replace(&mut app.mode, Mode::Browse)
            {
                app.run_intent(
                    Intent::SaveNote {
                        investor_id,
                        text: buffer,
                    },
                    "Note saved".to_string(),
                );
            }
            None
        }
        Message::CancelEdit => {
            app.mode = Mode::Browse;
            None
        }
        Message::Tick(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use funnel_core::model::{NewInvestor, ProgressEntry};
    use funnel_core::store::DbPool;
    use tempfile::TempDir;

    use crate::debounce::SEARCH_DEBOUNCE;
    use crate::local::LocalClient;
    use crate::state::OwnerFilter;

    fn setup(names: &[&str]) -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DbPool::open(&dir.path().join("funnel.db"), 2, Duration::from_secs(1)).unwrap();
        {
            let db = pool.get().unwrap();
            for name in names {
                db.insert_investor_if_absent(&NewInvestor::named(*name))
                    .unwrap();
            }
        }
        let app = App::new(Box::new(LocalClient::new(pool)));
        (dir, app)
    }

    fn send(app: &mut App, message: Message) {
        let mut next = Some(message);
        while let Some(msg) = next {
            next = update(app, msg);
        }
    }

    fn type_search(app: &mut App, text: &str) {
        send(app, Message::StartSearch);
        for c in text.chars() {
            send(app, Message::SearchInput(c));
        }
    }

    #[test]
    fn test_initial_load() {
        let (_dir, app) = setup(&["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(app.dashboard.len(), 2);
        assert_eq!(app.status_message.as_deref(), Some("Loaded 2 investors"));
        assert_eq!(app.selected_investor().unwrap().name, "Ada Lovelace");
    }

    #[test]
    fn test_selection_is_clamped() {
        let (_dir, mut app) = setup(&["A", "B", "C"]);
        send(&mut app, Message::MoveSelection(10));
        assert_eq!(app.selected, 2);
        send(&mut app, Message::MoveSelection(-1));
        assert_eq!(app.selected, 1);
        send(&mut app, Message::MoveSelection(-5));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_search_waits_for_debounce() {
        let (_dir, mut app) = setup(&["Ada Lovelace", "Grace Hopper"]);
        type_search(&mut app, "grace");

        // Not applied yet
        assert_eq!(app.dashboard.filtered_len(), 2);
        send(&mut app, Message::Tick(Instant::now()));
        assert_eq!(app.dashboard.filtered_len(), 2);

        send(&mut app, Message::Tick(Instant::now() + SEARCH_DEBOUNCE));
        assert_eq!(app.dashboard.filtered_len(), 1);
        assert_eq!(app.mode, Mode::Search);
    }

    #[test]
    fn test_search_done_applies_immediately() {
        let (_dir, mut app) = setup(&["Ada Lovelace", "Grace Hopper"]);
        type_search(&mut app, "ada");
        send(&mut app, Message::SearchDone);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.dashboard.filtered_len(), 1);

        // Pending tick was cancelled
        send(&mut app, Message::Tick(Instant::now() + SEARCH_DEBOUNCE));
        assert_eq!(app.dashboard.filtered_len(), 1);
    }

    #[test]
    fn test_toggle_owner_and_step_stages() {
        let (_dir, mut app) = setup(&["Ada Lovelace"]);

        send(&mut app, Message::ToggleOwner);
        let progress = &app.selected_investor().unwrap().owner_progress;
        assert_eq!(progress, &vec![ProgressEntry::active(Owner::Anton, Stage::FIRST)]);

        send(&mut app, Message::NextStage);
        send(&mut app, Message::NextStage);
        assert_eq!(
            app.selected_investor().unwrap().progress_for(Owner::Anton).unwrap().stage,
            Stage::InviteResponse
        );

        send(&mut app, Message::PrevStage);
        assert_eq!(
            app.selected_investor().unwrap().progress_for(Owner::Anton).unwrap().stage,
            Stage::InviteAccepted
        );

        // Other owner is independent
        send(&mut app, Message::SwitchOwner);
        assert_eq!(app.focus_owner, Owner::Pavel);
        send(&mut app, Message::NextStage);
        let investor = app.selected_investor().unwrap();
        assert!(investor.is_owned_by(Owner::Anton));
        assert!(investor.is_owned_by(Owner::Pavel));

        send(&mut app, Message::ToggleOwner);
        assert!(!app.selected_investor().unwrap().is_owned_by(Owner::Pavel));
    }

    #[test]
    fn test_stage_bounds_are_noops() {
        let (_dir, mut app) = setup(&["Ada Lovelace"]);

        send(&mut app, Message::PrevStage);
        assert!(app.selected_investor().unwrap().owner_progress.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Антон has no stage here"));

        send(&mut app, Message::ToggleOwner);
        for _ in 0..10 {
            send(&mut app, Message::NextStage);
        }
        assert_eq!(
            app.selected_investor().unwrap().progress_for(Owner::Anton).unwrap().stage,
            Stage::NextSteps
        );
    }

    #[test]
    fn test_note_edit_save_and_cancel() {
        let (_dir, mut app) = setup(&["Ada Lovelace"]);

        send(&mut app, Message::EditNote);
        for c in " hi! ".chars() {
            send(&mut app, Message::NoteInput(c));
        }
        send(&mut app, Message::NoteBackspace);
        send(&mut app, Message::SaveNote);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.selected_investor().unwrap().notes.as_deref(), Some("hi!"));

        send(&mut app, Message::EditNote);
        assert_eq!(
            app.mode,
            Mode::EditNote {
                investor_id: app.selected_investor().unwrap().id,
                buffer: "hi!".to_string(),
            }
        );
        send(&mut app, Message::NoteInput('?'));
        send(&mut app, Message::CancelEdit);
        assert_eq!(app.selected_investor().unwrap().notes.as_deref(), Some("hi!"));
    }

    #[test]
    fn test_owner_filter_keeps_mutated_row_until_refilter() {
        let (_dir, mut app) = setup(&["Ada Lovelace", "Grace Hopper"]);
        send(&mut app, Message::ToggleOwner);
        send(&mut app, Message::CycleOwnerFilter);
        assert_eq!(app.dashboard.filters().owner, OwnerFilter::Owner(Owner::Anton));
        assert_eq!(app.dashboard.filtered_len(), 1);

        send(&mut app, Message::ToggleOwner);
        assert_eq!(app.dashboard.filtered_len(), 1);

        send(&mut app, Message::Refresh);
        assert_eq!(app.dashboard.filtered_len(), 0);
        assert!(app.selected_investor().is_none());
    }

    /// Backend that is never reachable.
    struct Unreachable;

    impl FunnelClient for Unreachable {
        fn fetch_rows(&self) -> anyhow::Result<Vec<funnel_core::model::FlatRow>> {
            anyhow::bail!("connection refused")
        }

        fn save_progress(&self, _update: &funnel_core::api::ProgressUpdate) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }

        fn save_note(&self, _update: &funnel_core::api::NoteUpdate) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }

        fn log_action(&self, _entry: &funnel_core::api::NewLogEntry) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_failed_initial_load_shows_empty_table() {
        let mut app = App::new(Box::new(Unreachable));
        assert!(app
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Load failed"));
        assert!(app.selected_investor().is_none());
        assert_eq!(app.dashboard.page(), 1);

        // Every key path over the empty cache is a no-op
        for message in [
            Message::MoveSelection(1),
            Message::NextPage,
            Message::PrevPage,
            Message::ToggleOwner,
            Message::NextStage,
            Message::EditNote,
            Message::CycleOwnerFilter,
        ] {
            send(&mut app, message);
        }
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.selected_investor().is_none());

        send(&mut app, Message::Refresh);
        assert!(app
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Load failed"));
    }

    #[test]
    fn test_draws_before_any_successful_load() {
        use ratatui::{backend::TestBackend, Terminal};

        let app = App::new(Box::new(Unreachable));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| crate::ui::draw(frame, &app)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(screen.contains("Page 1/1"));
        assert!(screen.contains("Load failed"));
        assert!(screen.contains("No investors match"));
    }

    #[test]
    fn test_help_swallows_messages() {
        let (_dir, mut app) = setup(&["Ada Lovelace"]);
        send(&mut app, Message::ToggleHelp);
        send(&mut app, Message::Quit);
        assert!(!app.should_quit);
        send(&mut app, Message::ToggleHelp);
        send(&mut app, Message::Quit);
        assert!(app.should_quit);
    }
}
