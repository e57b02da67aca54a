pub mod age;
pub mod reorder;
pub mod store;
pub mod tree;
pub mod undo;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The board currently on screen, with its columns and their tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// A board as returned by the board list (columns are not needed there).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A named lane within a board. Task order is the order of `tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Priority levels for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}': use low, medium, high")),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named tag colors. Anything the server sends that we don't know renders gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Yellow,
    #[default]
    #[serde(other)]
    Gray,
}

/// A global label shared across boards. Read-only from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: TagColor,
}

/// Reference data for assignment and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLite {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl UserLite {
    /// "First Last" when both names are set, otherwise the username.
    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.username.clone()
        }
    }

    /// Two-letter avatar initials, upper-cased.
    pub fn initials(&self) -> String {
        let first = self
            .first_name
            .chars()
            .next()
            .or_else(|| self.username.chars().next());
        let last = self.last_name.chars().next();
        first.into_iter().chain(last).collect::<String>().to_uppercase()
    }
}

/// The signed-in user's own profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A single unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: Option<u64>,
    #[serde(default)]
    pub assigned_to_user: Option<UserLite>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by_user: Option<UserLite>,
}

impl Task {
    /// The user-editable fields of this task, enough to recreate it.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            tag_ids: self.tags.iter().map(|t| t.id).collect(),
            due_date: self.due_date,
            assigned_to: self.assigned_to,
        }
    }
}

/// Editable task fields as sent to the server on create and edit.
///
/// `due_date` and `assigned_to` always serialize, as `null` when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub tag_ids: Vec<u64>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<u64>,
}

impl Board {
    /// Find which column a task is in and its index.
    pub fn find_task(&self, task_id: u64) -> Option<(usize, usize)> {
        for (col_idx, col) in self.columns.iter().enumerate() {
            for (task_idx, task) in col.tasks.iter().enumerate() {
                if task.id == task_id {
                    return Some((col_idx, task_idx));
                }
            }
        }
        None
    }

    /// Index of the column with the given id.
    pub fn column_index(&self, column_id: u64) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    pub fn column(&self, column_id: u64) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, first: &str, last: &str) -> UserLite {
        UserLite {
            id: 1,
            username: username.into(),
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(user("aliv", "Ali", "Veli").display_name(), "Ali Veli");
        assert_eq!(user("aliv", "Ali", "").display_name(), "aliv");
        assert_eq!(user("aliv", "", "").display_name(), "aliv");
    }

    #[test]
    fn test_initials() {
        assert_eq!(user("aliv", "ali", "veli").initials(), "AV");
        assert_eq!(user("aliv", "Ali", "").initials(), "A");
        assert_eq!(user("zed", "", "").initials(), "Z");
        assert_eq!(user("zed", "", "Smith").initials(), "ZS");
    }

    #[test]
    fn test_priority_parse_and_cycle() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::High.next(), Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_task_deserializes_with_sparse_fields() {
        let json = r#"{"id": 4, "title": "Write docs", "tags": [{"id": 1, "name": "bug", "color": "teal"}]}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);
        assert_eq!(task.assigned_to, None);
        assert_eq!(task.tags[0].color, TagColor::Gray);
    }

    #[test]
    fn test_task_deserializes_full_payload() {
        let json = r#"{
            "id": 9, "title": "Ship", "description": "v1", "priority": "high", "order": 2,
            "tags": [{"id": 3, "name": "release", "color": "green"}],
            "due_date": "2025-01-01", "assigned_to": 7,
            "assigned_to_user": {"id": 7, "username": "mia", "first_name": "Mia", "last_name": "Lee"},
            "created_at": "2024-12-01T09:30:00.123456Z", "created_by_user": null, "column": 5
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(task.assigned_to_user.as_ref().map(|u| u.initials()), Some("ML".into()));
        assert_eq!(task.draft().tag_ids, vec![3]);
    }

    #[test]
    fn test_draft_serializes_empty_fields_as_null() {
        let draft = TaskDraft {
            title: "t".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value["assigned_to"].is_null());
        assert!(value["due_date"].is_null());
        assert_eq!(value["priority"], "medium");
    }
}
