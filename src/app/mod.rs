pub mod board_screen;
pub mod form;
pub mod request;

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::api::types::{
    login_error_message, register_error_message, Credentials, NewBoard, NewColumn, NewTask, ProfileUpdate,
    Registration,
};
use crate::api::{ApiClient, ApiError};
use crate::board::tree::{append_column, append_task, remove_task, replace_task};
use crate::board::{BoardSummary, UserProfile};
use crate::input::action::Action;
use crate::input::keymap::map_key;
use crate::session::{Route, Session, SessionStore};
use board_screen::BoardScreen;
use form::{FieldKey, FormKind, FormState, TextBuffer};
use request::{Completion, Request};

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Current interaction mode.
#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Space,
    Input {
        prompt: &'static str,
        buf: TextBuffer,
        target: InputTarget,
    },
    Confirm {
        prompt: &'static str,
        target: ConfirmTarget,
    },
    Picker {
        title: &'static str,
        items: Vec<String>,
        selected: usize,
        target: PickerTarget,
    },
    Form(Box<FormState>),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    NewColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmTarget {
    DeleteTask { column_id: u64, task_id: u64 },
    DeleteBoard(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerTarget {
    /// Column ids, parallel to the picker items.
    MoveToColumn { column_ids: Vec<u64> },
}

/// Notification severity for statusbar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub boards: Vec<BoardSummary>,
    pub selected: usize,
    pub loading: bool,
}

impl DashboardState {
    pub fn selected_board(&self) -> Option<&BoardSummary> {
        self.boards.get(self.selected)
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.boards.len().saturating_sub(1));
    }
}

/// Global application state. Owned by the UI thread; requests only ever
/// report back through `handle_completion`.
pub struct App {
    pub route: Route,
    pub mode: Mode,
    pub session: Option<Session>,
    session_store: SessionStore,
    /// The token could not be written; keep the in-memory session.
    session_unsaved: bool,
    pub api: ApiClient,
    undo_window: Duration,
    pub dashboard: DashboardState,
    pub board: Option<BoardScreen>,
    pub profile: Option<UserProfile>,
    pub profile_loading: bool,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
    pub should_quit: bool,
}

impl App {
    pub fn new(api: ApiClient, session_store: SessionStore, undo_window: Duration) -> Self {
        Self {
            route: Route::Login,
            mode: Mode::Normal,
            session: None,
            session_store,
            session_unsaved: false,
            api,
            undo_window,
            dashboard: DashboardState::default(),
            board: None,
            profile: None,
            profile_loading: false,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
            should_quit: false,
        }
    }

    /// First screen: the dashboard, or the login form without a token.
    pub fn start(&mut self) -> Vec<Request> {
        self.navigate(Route::Dashboard)
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + NOTIFICATION_TTL);
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + NOTIFICATION_TTL);
    }

    /// Expire notifications and undo windows, and pick up store changes.
    pub fn tick(&mut self, now: Instant) {
        if let Some(expires) = self.notification_expires {
            if now >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
        if let Some(screen) = self.board.as_mut() {
            screen.undo.tick(now);
            screen.sync_selection();
        }
    }

    fn refresh_session(&mut self) {
        if self.session_unsaved {
            return;
        }
        match self.session_store.load() {
            Ok(session) => self.session = session,
            Err(e) => warn!(error = %e, "could not read session token; keeping current session"),
        }
    }

    /// Switch screens. Protected routes re-read the token first and fall
    /// back to the login form without one.
    pub fn navigate(&mut self, route: Route) -> Vec<Request> {
        if route.is_protected() {
            self.refresh_session();
        }
        let route = route.guard(self.session.as_ref());
        if let Some(screen) = self.board.take() {
            screen.store.clear();
        }
        self.route = route;
        self.mode = Mode::Normal;
        match route {
            Route::Login => {
                self.mode = Mode::Form(Box::new(FormState::login()));
                Vec::new()
            }
            Route::Register => {
                self.mode = Mode::Form(Box::new(FormState::register()));
                Vec::new()
            }
            Route::Dashboard => {
                self.dashboard.loading = true;
                vec![Request::ListBoards]
            }
            Route::Board(board_id) => {
                self.board = Some(BoardScreen::new(board_id, self.undo_window));
                vec![Request::LoadBoard(board_id)]
            }
            Route::Profile => {
                self.profile = None;
                self.profile_loading = true;
                vec![Request::LoadProfile]
            }
        }
    }

    /// Drop the session everywhere and return to the login form.
    fn sign_out(&mut self) -> Vec<Request> {
        if let Err(e) = self.session_store.clear() {
            warn!(error = %e, "could not remove session token");
        }
        self.session = None;
        self.session_unsaved = false;
        self.dashboard = DashboardState::default();
        self.profile = None;
        self.navigate(Route::Login)
    }

    fn expire_session(&mut self) -> Vec<Request> {
        info!("server rejected session token; signing out");
        let requests = self.sign_out();
        self.notify_error("Session expired. Please log in again.");
        requests
    }

    fn form_mut(&mut self) -> Option<&mut FormState> {
        match &mut self.mode {
            Mode::Form(form) => Some(form.as_mut()),
            _ => None,
        }
    }

    /// The open form, if it is of the given kind.
    fn form_of(&mut self, wanted: impl Fn(FormKind) -> bool) -> Option<&mut FormState> {
        self.form_mut().filter(|f| wanted(f.kind))
    }

    fn close_form(&mut self, wanted: impl Fn(FormKind) -> bool) {
        if self.form_of(wanted).is_some() {
            self.mode = Mode::Normal;
        }
    }

    fn screen_for(&mut self, board_id: u64) -> Option<&mut BoardScreen> {
        self.board.as_mut().filter(|s| s.board_id == board_id)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub fn process_action(&mut self, action: Action, now: Instant) -> Vec<Request> {
        if matches!(self.mode, Mode::Space) {
            self.mode = Mode::Normal;
        }

        match action {
            Action::None => Vec::new(),
            Action::ForceQuit => {
                self.should_quit = true;
                Vec::new()
            }
            Action::Quit => {
                match self.mode {
                    Mode::Normal => self.should_quit = true,
                    _ => self.mode = Mode::Normal,
                }
                Vec::new()
            }
            Action::ShowHelp => {
                self.mode = Mode::Help;
                Vec::new()
            }
            Action::EnterSpaceMode => {
                if self.board.is_some() {
                    self.mode = Mode::Space;
                }
                Vec::new()
            }
            Action::Back => self.navigate(Route::Dashboard),
            Action::Reload => self.reload(),

            Action::FocusPrevColumn | Action::FocusNextColumn | Action::SelectPrev | Action::SelectNext => {
                self.handle_navigation(action);
                Vec::new()
            }

            Action::MoveTaskPrevColumn
            | Action::MoveTaskNextColumn
            | Action::MoveTaskUp
            | Action::MoveTaskDown
            | Action::MoveToColumn => self.handle_move(action),

            Action::NewTask | Action::EditTask | Action::DeleteTask | Action::NewColumn | Action::Undo => {
                self.handle_task_action(action, now)
            }

            Action::OpenBoard | Action::NewBoard | Action::DeleteBoard | Action::OpenProfile | Action::Logout => {
                self.handle_dashboard_action(action)
            }

            Action::EditProfile => {
                if let Some(profile) = &self.profile {
                    self.mode = Mode::Form(Box::new(FormState::profile(profile)));
                }
                Vec::new()
            }

            Action::FormNext | Action::FormPrev | Action::FormSubmit | Action::FormCancel | Action::SwitchAuthForm => {
                self.handle_form(action)
            }

            Action::InputChar(_)
            | Action::InputBackspace
            | Action::InputLeft
            | Action::InputRight
            | Action::InputHome
            | Action::InputEnd
            | Action::InputDeleteWord
            | Action::InputConfirm
            | Action::InputCancel => self.handle_input(action),

            Action::Confirm | Action::Deny => self.handle_confirm(action, now),
        }
    }

    fn reload(&mut self) -> Vec<Request> {
        match self.route {
            Route::Dashboard => {
                self.dashboard.loading = true;
                vec![Request::ListBoards]
            }
            Route::Board(board_id) => {
                if let Some(screen) = self.board.as_mut() {
                    screen.loading = true;
                }
                vec![Request::LoadBoard(board_id)]
            }
            Route::Profile => {
                self.profile_loading = true;
                vec![Request::LoadProfile]
            }
            Route::Login | Route::Register => Vec::new(),
        }
    }

    fn handle_navigation(&mut self, action: Action) {
        let forward = matches!(action, Action::FocusNextColumn | Action::SelectNext);
        if let Mode::Picker { selected, items, .. } = &mut self.mode {
            if forward {
                if *selected + 1 < items.len() {
                    *selected += 1;
                }
            } else {
                *selected = selected.saturating_sub(1);
            }
            return;
        }
        match self.route {
            Route::Dashboard if matches!(action, Action::SelectPrev | Action::SelectNext) => {
                let len = self.dashboard.boards.len();
                if forward {
                    if self.dashboard.selected + 1 < len {
                        self.dashboard.selected += 1;
                    }
                } else {
                    self.dashboard.selected = self.dashboard.selected.saturating_sub(1);
                }
            }
            Route::Board(_) => {
                let Some(screen) = self.board.as_mut() else {
                    return;
                };
                match action {
                    Action::FocusPrevColumn | Action::FocusNextColumn => screen.focus_column(forward),
                    _ => screen.select_task(forward),
                }
            }
            _ => {}
        }
    }

    fn handle_move(&mut self, action: Action) -> Vec<Request> {
        let Some(screen) = self.board.as_mut() else {
            return Vec::new();
        };
        let patch = match action {
            Action::MoveTaskPrevColumn => screen.move_selected_across(false),
            Action::MoveTaskNextColumn => screen.move_selected_across(true),
            Action::MoveTaskUp => screen.move_selected_within(false),
            Action::MoveTaskDown => screen.move_selected_within(true),
            Action::MoveToColumn => {
                let Some((source, _)) = screen.selected() else {
                    return Vec::new();
                };
                let (column_ids, items): (Vec<u64>, Vec<String>) = screen
                    .column_titles()
                    .into_iter()
                    .filter(|(id, _)| *id != source.column_id)
                    .unzip();
                if items.is_empty() {
                    self.notify_error("No other column to move to.");
                } else {
                    self.mode = Mode::Picker {
                        title: "Move to column",
                        items,
                        selected: 0,
                        target: PickerTarget::MoveToColumn { column_ids },
                    };
                }
                return Vec::new();
            }
            _ => None,
        };
        let board_id = screen.board_id;
        patch.map(|patch| Request::MoveTask { board_id, patch }).into_iter().collect()
    }

    fn handle_task_action(&mut self, action: Action, now: Instant) -> Vec<Request> {
        let Some(screen) = self.board.as_mut() else {
            return Vec::new();
        };
        if screen.loading && !screen.store.is_loaded() {
            return Vec::new();
        }
        match action {
            Action::NewTask => match screen.focused_column_id() {
                Some(column_id) => self.mode = Mode::Form(Box::new(FormState::new_task(column_id, &screen.users))),
                None => self.notify_error("Add a column first (Space c)."),
            },
            Action::EditTask => {
                if let Some((_, task)) = screen.selected() {
                    self.mode = Mode::Form(Box::new(FormState::edit_task(&task, &screen.users, &screen.tags)));
                }
            }
            Action::DeleteTask => {
                if let Some((source, task)) = screen.selected() {
                    self.mode = Mode::Confirm {
                        prompt: "Delete task?",
                        target: ConfirmTarget::DeleteTask { column_id: source.column_id, task_id: task.id },
                    };
                }
            }
            Action::NewColumn => {
                self.mode = Mode::Input {
                    prompt: "Column title",
                    buf: TextBuffer::empty(),
                    target: InputTarget::NewColumn,
                };
            }
            Action::Undo => {
                // The delete request has not come back yet.
                if let Some(task_id) = screen.undo.pending_task_id() {
                    if screen.column_of(task_id).is_some() {
                        return Vec::new();
                    }
                }
                if let Some(snapshot) = screen.undo.begin_restore(now) {
                    info!(task_id = snapshot.task_id, "restoring deleted task");
                    return vec![Request::RestoreTask { board_id: screen.board_id, task: NewTask::restore(&snapshot) }];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_dashboard_action(&mut self, action: Action) -> Vec<Request> {
        match action {
            Action::OpenBoard => match self.dashboard.selected_board() {
                Some(board) => {
                    let id = board.id;
                    self.navigate(Route::Board(id))
                }
                None => Vec::new(),
            },
            Action::NewBoard => {
                self.mode = Mode::Form(Box::new(FormState::new_board()));
                Vec::new()
            }
            Action::DeleteBoard => {
                if let Some(board) = self.dashboard.selected_board() {
                    self.mode = Mode::Confirm {
                        prompt: "Delete board? All tasks inside will be lost.",
                        target: ConfirmTarget::DeleteBoard(board.id),
                    };
                }
                Vec::new()
            }
            Action::OpenProfile => self.navigate(Route::Profile),
            Action::Logout => {
                info!("logged out");
                let requests = self.sign_out();
                self.notify("Logged out");
                requests
            }
            _ => Vec::new(),
        }
    }

    fn handle_form(&mut self, action: Action) -> Vec<Request> {
        let Some(form) = self.form_mut() else {
            return Vec::new();
        };
        match action {
            Action::FormNext => form.next_field(),
            Action::FormPrev => form.prev_field(),
            Action::FormSubmit => return self.submit_form(),
            Action::FormCancel => match form.kind {
                FormKind::Login => self.should_quit = true,
                FormKind::Register => return self.navigate(Route::Login),
                _ => self.mode = Mode::Normal,
            },
            Action::SwitchAuthForm if !form.pending => match form.kind {
                FormKind::Login => return self.navigate(Route::Register),
                FormKind::Register => return self.navigate(Route::Login),
                _ => {}
            },
            _ => {}
        }
        Vec::new()
    }

    fn submit_form(&mut self) -> Vec<Request> {
        let Mode::Form(form) = &mut self.mode else {
            return Vec::new();
        };
        if form.pending {
            return Vec::new();
        }
        form.error = None;

        let request = match form.kind {
            FormKind::Login => {
                let username = form.text(FieldKey::Username);
                let password = form.secret(FieldKey::Password);
                if username.is_empty() || password.is_empty() {
                    form.fail("Enter username and password.");
                    return Vec::new();
                }
                Request::Login(Credentials { username, password })
            }
            FormKind::Register => {
                let registration = Registration {
                    username: form.text(FieldKey::Username),
                    password: form.secret(FieldKey::Password),
                    email: form.text(FieldKey::Email),
                    first_name: form.text(FieldKey::FirstName),
                    last_name: form.text(FieldKey::LastName),
                };
                if registration.username.is_empty() || registration.email.is_empty() || registration.password.is_empty() {
                    form.fail("Username, email and password are required.");
                    return Vec::new();
                }
                Request::Register(registration)
            }
            FormKind::NewBoard => {
                let name = form.text(FieldKey::Name);
                if name.is_empty() {
                    form.fail("Name is required.");
                    return Vec::new();
                }
                Request::CreateBoard(NewBoard { name, description: form.text(FieldKey::Description) })
            }
            FormKind::NewTask { column_id } => {
                let draft = match form.task_draft() {
                    Ok(draft) => draft,
                    Err(msg) => {
                        form.fail(msg);
                        return Vec::new();
                    }
                };
                let Some(screen) = &self.board else {
                    return Vec::new();
                };
                let order = u32::try_from(screen.column_len(column_id)).unwrap_or(u32::MAX);
                Request::CreateTask { board_id: screen.board_id, task: NewTask { column: column_id, draft, order } }
            }
            FormKind::EditTask { task_id } => {
                let draft = match form.task_draft() {
                    Ok(draft) => draft,
                    Err(msg) => {
                        form.fail(msg);
                        return Vec::new();
                    }
                };
                let Some(screen) = &self.board else {
                    return Vec::new();
                };
                Request::EditTask { board_id: screen.board_id, task_id, draft }
            }
            FormKind::Profile => {
                let avatar = form.text(FieldKey::Avatar);
                Request::UpdateProfile(ProfileUpdate {
                    first_name: form.text(FieldKey::FirstName),
                    last_name: form.text(FieldKey::LastName),
                    email: form.text(FieldKey::Email),
                    position: form.text(FieldKey::Position),
                    avatar: (!avatar.is_empty()).then(|| PathBuf::from(avatar)),
                })
            }
        };
        form.pending = true;
        vec![request]
    }

    fn handle_input(&mut self, action: Action) -> Vec<Request> {
        if let Mode::Form(form) = &mut self.mode {
            match action {
                Action::InputChar(c) => form.insert(c),
                Action::InputBackspace => form.backspace(),
                Action::InputLeft => form.left(),
                Action::InputRight => form.right(),
                Action::InputHome => form.home(),
                Action::InputEnd => form.end(),
                Action::InputDeleteWord => form.delete_word(),
                _ => {}
            }
            return Vec::new();
        }

        match action {
            Action::InputConfirm => return self.handle_input_confirm(),
            Action::InputCancel => self.mode = Mode::Normal,
            _ => {
                if let Mode::Input { buf, .. } = &mut self.mode {
                    match action {
                        Action::InputChar(c) => buf.insert(c),
                        Action::InputBackspace => buf.backspace(),
                        Action::InputLeft => buf.move_left(),
                        Action::InputRight => buf.move_right(),
                        Action::InputHome => buf.home(),
                        Action::InputEnd => buf.end(),
                        Action::InputDeleteWord => buf.delete_word(),
                        _ => {}
                    }
                }
            }
        }
        Vec::new()
    }

    fn handle_input_confirm(&mut self) -> Vec<Request> {
        let old_mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Some(screen) = self.board.as_mut() else {
            return Vec::new();
        };
        let board_id = screen.board_id;
        match old_mode {
            Mode::Input { buf, target: InputTarget::NewColumn, .. } => {
                let title = buf.input.trim().to_string();
                if title.is_empty() {
                    return Vec::new();
                }
                let order = u32::try_from(screen.column_count()).unwrap_or(u32::MAX);
                vec![Request::CreateColumn { board_id, column: NewColumn { board: board_id, title, order } }]
            }
            Mode::Picker { selected, target: PickerTarget::MoveToColumn { column_ids }, .. } => column_ids
                .get(selected)
                .and_then(|&column_id| screen.move_selected_to(column_id))
                .map(|patch| Request::MoveTask { board_id, patch })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn handle_confirm(&mut self, action: Action, now: Instant) -> Vec<Request> {
        let old_mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Mode::Confirm { target, .. } = old_mode else {
            self.mode = old_mode;
            return Vec::new();
        };
        if action == Action::Deny {
            return Vec::new();
        }
        match target {
            ConfirmTarget::DeleteTask { column_id, task_id } => {
                let Some(screen) = self.board.as_mut() else {
                    return Vec::new();
                };
                if !screen.record_delete(column_id, task_id, now) {
                    return Vec::new();
                }
                vec![Request::DeleteTask { board_id: screen.board_id, task_id }]
            }
            ConfirmTarget::DeleteBoard(board_id) => vec![Request::DeleteBoard(board_id)],
        }
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    pub fn handle_completion(&mut self, completion: Completion) -> Vec<Request> {
        if completion.is_unauthorized() {
            return self.expire_session();
        }
        match completion {
            Completion::SignedOut => {
                self.session = None;
                self.navigate(Route::Login)
            }
            Completion::LoggedIn(result) => self.on_logged_in(result),
            Completion::Registered(result) => self.on_registered(result),
            Completion::Boards(result) => {
                self.dashboard.loading = false;
                match result {
                    Ok(boards) => {
                        self.dashboard.boards = boards;
                        self.dashboard.clamp();
                    }
                    Err(e) => {
                        warn!(error = %e, "listing boards failed");
                        self.notify_error("Could not load boards.");
                    }
                }
                Vec::new()
            }
            Completion::BoardCreated(result) => {
                match result {
                    Ok(board) => {
                        self.close_form(|k| k == FormKind::NewBoard);
                        self.dashboard.boards.push(BoardSummary {
                            id: board.id,
                            name: board.name,
                            description: board.description,
                            owner_username: None,
                            created_at: None,
                        });
                        self.dashboard.selected = self.dashboard.boards.len() - 1;
                        self.notify("Board created");
                    }
                    Err(e) => {
                        warn!(error = %e, "creating board failed");
                        self.fail_form_or_notify(|k| k == FormKind::NewBoard, "Could not create board.");
                    }
                }
                Vec::new()
            }
            Completion::BoardDeleted { board_id, result } => {
                match result {
                    Ok(()) => {
                        self.dashboard.boards.retain(|b| b.id != board_id);
                        self.dashboard.clamp();
                        self.notify("Board deleted");
                    }
                    Err(e) => {
                        warn!(board_id, error = %e, "deleting board failed");
                        self.notify_error("Could not delete board.");
                    }
                }
                Vec::new()
            }
            Completion::BoardLoaded { board_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return Vec::new();
                };
                match result {
                    Ok(view) => {
                        screen.install(view);
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(board_id, error = %e, "loading board failed");
                        let requests = self.navigate(Route::Dashboard);
                        self.notify_error("Could not load board.");
                        requests
                    }
                }
            }
            Completion::Profile(result) => {
                self.profile_loading = false;
                match result {
                    Ok(profile) => self.profile = Some(profile),
                    Err(e) => {
                        warn!(error = %e, "loading profile failed");
                        self.notify_error("Could not load profile.");
                    }
                }
                Vec::new()
            }
            Completion::ProfileUpdated(result) => {
                match result {
                    Ok(profile) => {
                        self.close_form(|k| k == FormKind::Profile);
                        self.profile = Some(profile);
                        self.notify("Profile updated");
                    }
                    Err(e) => {
                        warn!(error = %e, "updating profile failed");
                        let msg = match &e {
                            ApiError::File { .. } => e.to_string(),
                            _ => "Could not update profile.".to_string(),
                        };
                        self.fail_form_or_notify(|k| k == FormKind::Profile, msg);
                    }
                }
                Vec::new()
            }
            other => {
                self.on_board_completion(other);
                Vec::new()
            }
        }
    }

    fn fail_form_or_notify(&mut self, wanted: impl Fn(FormKind) -> bool, msg: impl Into<String>) {
        let msg = msg.into();
        match self.form_of(wanted) {
            Some(form) => form.fail(msg),
            None => self.notify_error(msg),
        }
    }

    fn on_logged_in(&mut self, result: Result<Session, ApiError>) -> Vec<Request> {
        if self.route != Route::Login {
            return Vec::new();
        }
        match result {
            Ok(session) => {
                info!("logged in");
                self.session_unsaved = match self.session_store.save(&session) {
                    Ok(()) => false,
                    Err(e) => {
                        warn!(error = %e, "could not save session token; keeping it for this run");
                        true
                    }
                };
                self.session = Some(session);
                self.navigate(Route::Dashboard)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                if let Some(form) = self.form_of(|k| k == FormKind::Login) {
                    form.fail(login_error_message(e.body()));
                }
                Vec::new()
            }
        }
    }

    fn on_registered(&mut self, result: Result<String, ApiError>) -> Vec<Request> {
        if self.route != Route::Register {
            return Vec::new();
        }
        match result {
            Ok(_) => {
                info!("account registered");
                let requests = self.navigate(Route::Login);
                self.notify("Account created. Wait for admin approval.");
                requests
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                if let Some(form) = self.form_of(|k| k == FormKind::Register) {
                    form.fail(register_error_message(e.body()));
                }
                Vec::new()
            }
        }
    }

    fn on_board_completion(&mut self, completion: Completion) {
        match completion {
            Completion::ColumnCreated { board_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return;
                };
                match result {
                    Ok(column) => {
                        screen.store.apply(|b| append_column(b, column));
                        self.notify("Column added");
                    }
                    Err(e) => {
                        warn!(board_id, error = %e, "creating column failed");
                        self.notify_error("Could not add column.");
                    }
                }
            }
            Completion::TaskCreated { board_id, column_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return;
                };
                match result {
                    Ok(task) => {
                        screen.store.apply(|b| append_task(b, column_id, task));
                        self.close_form(|k| matches!(k, FormKind::NewTask { .. }));
                        self.notify("Task created");
                    }
                    Err(e) => {
                        warn!(board_id, column_id, error = %e, "creating task failed");
                        self.fail_form_or_notify(|k| matches!(k, FormKind::NewTask { .. }), "Could not create task.");
                    }
                }
            }
            Completion::TaskEdited { board_id, task_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return;
                };
                match result {
                    Ok(task) => {
                        if let Some(column_id) = screen.column_of(task_id) {
                            screen.store.apply(|b| replace_task(b, column_id, task_id, task));
                        }
                        self.close_form(|k| k == FormKind::EditTask { task_id });
                        self.notify("Task saved");
                    }
                    Err(e) => {
                        warn!(board_id, task_id, error = %e, "editing task failed");
                        self.fail_form_or_notify(|k| k == FormKind::EditTask { task_id }, "Could not save task.");
                    }
                }
            }
            Completion::TaskMoved { board_id, task_id, result } => {
                if self.screen_for(board_id).is_none() {
                    return;
                }
                match result {
                    Ok(_) => debug!(board_id, task_id, "move persisted"),
                    Err(e) => {
                        warn!(board_id, task_id, error = %e, "moving task failed; keeping local order");
                        self.notify_error("Could not move task.");
                    }
                }
            }
            Completion::TaskDeleted { board_id, task_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return;
                };
                match result {
                    Ok(()) => {
                        if let Some(column_id) = screen.column_of(task_id) {
                            screen.store.apply(|b| remove_task(b, column_id, task_id));
                        }
                        let secs = screen.undo.window().as_secs();
                        self.notify(format!("Task deleted. Press u within {secs}s to undo."));
                    }
                    Err(e) => {
                        screen.undo.discard(task_id);
                        warn!(board_id, task_id, error = %e, "deleting task failed");
                        self.notify_error("Could not delete task.");
                    }
                }
            }
            Completion::TaskRestored { board_id, column_id, result } => {
                let Some(screen) = self.screen_for(board_id) else {
                    return;
                };
                screen.undo.finish_restore();
                match result {
                    Ok(task) => {
                        screen.store.apply(|b| append_task(b, column_id, task));
                        self.notify("Task restored");
                    }
                    Err(e) => {
                        warn!(board_id, column_id, error = %e, "restoring task failed");
                        self.notify_error("Could not restore task.");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Hand requests to the runtime. Each one reports back on `tx`.
fn dispatch(runtime: &Runtime, app: &App, tx: &mpsc::Sender<Completion>, requests: Vec<Request>) {
    for request in requests {
        debug!(request = request.name(), "dispatching");
        let api = app.api.clone();
        let session = app.session.clone();
        let tx = tx.clone();
        runtime.spawn(async move {
            let completion = request::execute(&api, session, request).await;
            // The receiver is gone only once the UI has exited.
            let _ = tx.send(completion);
        });
    }
}

/// Main TUI application loop.
pub fn run(terminal: &mut DefaultTerminal, runtime: &Runtime, app: &mut App) -> color_eyre::Result<()> {
    let (tx, rx) = mpsc::channel();
    let requests = app.start();
    dispatch(runtime, app, &tx, requests);

    loop {
        let now = Instant::now();
        app.tick(now);

        while let Ok(completion) = rx.try_recv() {
            let requests = app.handle_completion(completion);
            dispatch(runtime, app, &tx, requests);
        }

        terminal.draw(|f| crate::ui::render(f, app, Utc::now(), now))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let action = map_key(key, app.route, &app.mode);
                    let requests = app.process_action(action, Instant::now());
                    dispatch(runtime, app, &tx, requests);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
