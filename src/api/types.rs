//! Request and response bodies that only exist on the wire.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::undo::{DeletedTaskSnapshot, RESTORE_ORDER};
use crate::board::{Board, Tag, TaskDraft, UserLite};

const LOGIN_FAILED: &str = "Invalid username or password.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBoard {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewColumn {
    pub board: u64,
    pub title: String,
    pub order: u32,
}

/// Body of `POST tasks/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub column: u64,
    #[serde(flatten)]
    pub draft: TaskDraft,
    pub order: u32,
}

impl NewTask {
    /// Recreate a deleted task at the end of its old column.
    pub fn restore(snapshot: &DeletedTaskSnapshot) -> Self {
        Self {
            column: snapshot.column_id,
            draft: snapshot.data.clone(),
            order: RESTORE_ORDER,
        }
    }
}

/// Profile fields sent as multipart form data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub avatar: Option<PathBuf>,
}

/// Everything the board screen needs, fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    pub board: Board,
    pub tags: Vec<Tag>,
    pub users: Vec<UserLite>,
}

/// Message to show for a failed login, given the error response body.
pub fn login_error_message(body: Option<&str>) -> String {
    body.and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| {
            v.get("non_field_errors")?
                .as_array()?
                .first()?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| LOGIN_FAILED.to_string())
}

/// Message to show for a failed registration: every field error, joined.
pub fn register_error_message(body: Option<&str>) -> String {
    let Some(Value::Object(fields)) = body.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
        return REGISTER_FAILED.to_string();
    };
    let messages: Vec<String> = fields
        .values()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect(),
            Value::String(s) => vec![s.clone()],
            _ => Vec::new(),
        })
        .collect();
    if messages.is_empty() {
        REGISTER_FAILED.to_string()
    } else {
        messages.join(", ")
    }
}
