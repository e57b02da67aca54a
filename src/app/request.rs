//! Work handed to the async runtime, and what comes back.

use crate::api::types::{BoardView, Credentials, NewBoard, NewColumn, NewTask, ProfileUpdate, Registration};
use crate::api::{ApiClient, ApiError};
use crate::board::reorder::MovePatch;
use crate::board::{Board, BoardSummary, Column, Task, TaskDraft, UserProfile};
use crate::session::Session;

/// A remote call the UI wants made. Requests carry the ids needed to route
/// their completion back to the right screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Login(Credentials),
    Register(Registration),
    ListBoards,
    CreateBoard(NewBoard),
    DeleteBoard(u64),
    LoadBoard(u64),
    CreateColumn { board_id: u64, column: NewColumn },
    CreateTask { board_id: u64, task: NewTask },
    EditTask { board_id: u64, task_id: u64, draft: TaskDraft },
    MoveTask { board_id: u64, patch: MovePatch },
    DeleteTask { board_id: u64, task_id: u64 },
    RestoreTask { board_id: u64, task: NewTask },
    LoadProfile,
    UpdateProfile(ProfileUpdate),
}

impl Request {
    /// Short name for logs. Never includes field values.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::ListBoards => "list_boards",
            Self::CreateBoard(_) => "create_board",
            Self::DeleteBoard(_) => "delete_board",
            Self::LoadBoard(_) => "load_board",
            Self::CreateColumn { .. } => "create_column",
            Self::CreateTask { .. } => "create_task",
            Self::EditTask { .. } => "edit_task",
            Self::MoveTask { .. } => "move_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::RestoreTask { .. } => "restore_task",
            Self::LoadProfile => "load_profile",
            Self::UpdateProfile(_) => "update_profile",
        }
    }
}

/// The outcome of a `Request`, delivered back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    LoggedIn(Result<Session, ApiError>),
    Registered(Result<String, ApiError>),
    Boards(Result<Vec<BoardSummary>, ApiError>),
    BoardCreated(Result<Board, ApiError>),
    BoardDeleted { board_id: u64, result: Result<(), ApiError> },
    BoardLoaded { board_id: u64, result: Result<BoardView, ApiError> },
    ColumnCreated { board_id: u64, result: Result<Column, ApiError> },
    TaskCreated { board_id: u64, column_id: u64, result: Result<Task, ApiError> },
    TaskEdited { board_id: u64, task_id: u64, result: Result<Task, ApiError> },
    TaskMoved { board_id: u64, task_id: u64, result: Result<Task, ApiError> },
    TaskDeleted { board_id: u64, task_id: u64, result: Result<(), ApiError> },
    TaskRestored { board_id: u64, column_id: u64, result: Result<Task, ApiError> },
    Profile(Result<UserProfile, ApiError>),
    ProfileUpdated(Result<UserProfile, ApiError>),
    /// A protected request was issued without a session.
    SignedOut,
}

impl Completion {
    /// The server rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        fn rejected<T>(result: &Result<T, ApiError>) -> bool {
            matches!(result, Err(e) if e.is_unauthorized())
        }
        match self {
            Self::LoggedIn(_) | Self::Registered(_) | Self::SignedOut => false,
            Self::Boards(r) => rejected(r),
            Self::BoardCreated(r) => rejected(r),
            Self::Profile(r) | Self::ProfileUpdated(r) => rejected(r),
            Self::BoardDeleted { result, .. } | Self::TaskDeleted { result, .. } => rejected(result),
            Self::BoardLoaded { result, .. } => rejected(result),
            Self::ColumnCreated { result, .. } => rejected(result),
            Self::TaskCreated { result, .. }
            | Self::TaskEdited { result, .. }
            | Self::TaskMoved { result, .. }
            | Self::TaskRestored { result, .. } => rejected(result),
        }
    }
}

/// Run one request to completion.
pub async fn execute(api: &ApiClient, session: Option<Session>, request: Request) -> Completion {
    let session = match request {
        Request::Login(credentials) => return Completion::LoggedIn(api.login(&credentials).await),
        Request::Register(registration) => {
            return Completion::Registered(api.register(&registration).await)
        }
        _ => match session {
            Some(session) => session,
            None => return Completion::SignedOut,
        },
    };
    let s = &session;

    match request {
        Request::ListBoards => Completion::Boards(api.list_boards(s).await),
        Request::CreateBoard(board) => Completion::BoardCreated(api.create_board(s, &board).await),
        Request::DeleteBoard(board_id) => Completion::BoardDeleted {
            board_id,
            result: api.delete_board(s, board_id).await,
        },
        Request::LoadBoard(board_id) => Completion::BoardLoaded {
            board_id,
            result: api.load_board_view(s, board_id).await,
        },
        Request::CreateColumn { board_id, column } => Completion::ColumnCreated {
            board_id,
            result: api.create_column(s, &column).await,
        },
        Request::CreateTask { board_id, task } => Completion::TaskCreated {
            board_id,
            column_id: task.column,
            result: api.create_task(s, &task).await,
        },
        Request::EditTask { board_id, task_id, draft } => Completion::TaskEdited {
            board_id,
            task_id,
            result: api.edit_task(s, task_id, &draft).await,
        },
        Request::MoveTask { board_id, patch } => Completion::TaskMoved {
            board_id,
            task_id: patch.task_id,
            result: api.move_task(s, &patch).await,
        },
        Request::DeleteTask { board_id, task_id } => Completion::TaskDeleted {
            board_id,
            task_id,
            result: api.delete_task(s, task_id).await,
        },
        Request::RestoreTask { board_id, task } => Completion::TaskRestored {
            board_id,
            column_id: task.column,
            result: api.create_task(s, &task).await,
        },
        Request::LoadProfile => Completion::Profile(api.get_profile(s).await),
        Request::UpdateProfile(update) => Completion::ProfileUpdated(api.update_profile(s, &update).await),
        Request::Login(_) | Request::Register(_) => Completion::SignedOut,
    }
}
