use crate::board::{Priority, Tag, Task, TaskDraft, UserLite, UserProfile};

/// Reusable text editing buffer with cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(input: String) -> Self {
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    pub fn empty() -> Self {
        Self { input: String::new(), cursor: 0 }
    }

    /// Convert a char index to a byte index.
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn delete_word(&mut self) {
        let byte_pos = self.byte_offset(self.cursor);
        let before = &self.input[..byte_pos];
        let trimmed = before.trim_end();
        let start_byte = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let start_char = self.input[..start_byte].chars().count();
        self.input.drain(start_byte..byte_pos);
        self.cursor = start_char;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

/// What a form submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    NewBoard,
    NewTask { column_id: u64 },
    EditTask { task_id: u64 },
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Username,
    Password,
    Email,
    FirstName,
    LastName,
    Name,
    Description,
    Title,
    Priority,
    DueDate,
    Assignee,
    Tags,
    Position,
    Avatar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(TextBuffer),
    /// Rendered masked.
    Secret(TextBuffer),
    Priority(Priority),
    /// Single choice among `(id, label)`; `None` ids mean "nothing".
    Choice {
        items: Vec<(Option<u64>, String)>,
        selected: usize,
    },
    /// Multi-select among `(id, label, on)`.
    Toggles {
        items: Vec<(u64, String, bool)>,
        cursor: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: FieldKey,
    pub label: &'static str,
    pub value: FieldValue,
}

impl Field {
    fn text(key: FieldKey, label: &'static str, initial: &str) -> Self {
        Self { key, label, value: FieldValue::Text(TextBuffer::new(initial.to_string())) }
    }

    fn secret(key: FieldKey, label: &'static str) -> Self {
        Self { key, label, value: FieldValue::Secret(TextBuffer::empty()) }
    }
}

/// A multi-field modal form. While `pending`, a request is in flight and
/// edits are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub kind: FormKind,
    pub title: &'static str,
    pub fields: Vec<Field>,
    pub focused: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl FormState {
    fn new(kind: FormKind, title: &'static str, fields: Vec<Field>) -> Self {
        Self { kind, title, fields, focused: 0, error: None, pending: false }
    }

    pub fn login() -> Self {
        Self::new(
            FormKind::Login,
            "Log in",
            vec![
                Field::text(FieldKey::Username, "Username", ""),
                Field::secret(FieldKey::Password, "Password"),
            ],
        )
    }

    pub fn register() -> Self {
        Self::new(
            FormKind::Register,
            "Create account",
            vec![
                Field::text(FieldKey::Username, "Username", ""),
                Field::text(FieldKey::Email, "Email", ""),
                Field::text(FieldKey::FirstName, "First name", ""),
                Field::text(FieldKey::LastName, "Last name", ""),
                Field::secret(FieldKey::Password, "Password"),
            ],
        )
    }

    pub fn new_board() -> Self {
        Self::new(
            FormKind::NewBoard,
            "New board",
            vec![
                Field::text(FieldKey::Name, "Name", ""),
                Field::text(FieldKey::Description, "Description", ""),
            ],
        )
    }

    pub fn new_task(column_id: u64, users: &[UserLite]) -> Self {
        Self::new(
            FormKind::NewTask { column_id },
            "New task",
            vec![
                Field::text(FieldKey::Title, "Title", ""),
                Field::text(FieldKey::Description, "Description", ""),
                Field { key: FieldKey::Priority, label: "Priority", value: FieldValue::Priority(Priority::default()) },
                Field::text(FieldKey::DueDate, "Due (YYYY-MM-DD)", ""),
                assignee_field(users, None),
            ],
        )
    }

    pub fn edit_task(task: &Task, users: &[UserLite], tags: &[Tag]) -> Self {
        let due = task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let tag_items = tags
            .iter()
            .map(|t| (t.id, t.name.clone(), task.tags.iter().any(|own| own.id == t.id)))
            .collect();
        Self::new(
            FormKind::EditTask { task_id: task.id },
            "Edit task",
            vec![
                Field::text(FieldKey::Title, "Title", &task.title),
                Field::text(FieldKey::Description, "Description", &task.description),
                Field { key: FieldKey::Priority, label: "Priority", value: FieldValue::Priority(task.priority) },
                Field::text(FieldKey::DueDate, "Due (YYYY-MM-DD)", &due),
                assignee_field(users, task.assigned_to),
                Field { key: FieldKey::Tags, label: "Tags", value: FieldValue::Toggles { items: tag_items, cursor: 0 } },
            ],
        )
    }

    pub fn profile(profile: &UserProfile) -> Self {
        Self::new(
            FormKind::Profile,
            "Edit profile",
            vec![
                Field::text(FieldKey::FirstName, "First name", &profile.first_name),
                Field::text(FieldKey::LastName, "Last name", &profile.last_name),
                Field::text(FieldKey::Email, "Email", &profile.email),
                Field::text(FieldKey::Position, "Position", &profile.position),
                Field::text(FieldKey::Avatar, "Avatar file", ""),
            ],
        )
    }

    pub fn focused_field(&self) -> Option<&Field> {
        self.fields.get(self.focused)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    fn focused_value(&mut self) -> Option<&mut FieldValue> {
        if self.pending {
            return None;
        }
        self.fields.get_mut(self.focused).map(|f| &mut f.value)
    }

    /// Typed character. On non-text fields space toggles or cycles.
    pub fn insert(&mut self, c: char) {
        match self.focused_value() {
            Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) => buf.insert(c),
            Some(FieldValue::Priority(p)) if c == ' ' => *p = p.next(),
            Some(FieldValue::Choice { items, selected }) if c == ' ' => {
                *selected = (*selected + 1) % items.len().max(1);
            }
            Some(FieldValue::Toggles { items, cursor }) if c == ' ' => {
                if let Some(item) = items.get_mut(*cursor) {
                    item.2 = !item.2;
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) = self.focused_value() {
            buf.backspace();
        }
    }

    pub fn delete_word(&mut self) {
        if let Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) = self.focused_value() {
            buf.delete_word();
        }
    }

    pub fn left(&mut self) {
        match self.focused_value() {
            Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) => buf.move_left(),
            Some(FieldValue::Priority(p)) => *p = p.next().next(),
            Some(FieldValue::Choice { items, selected }) => {
                let len = items.len().max(1);
                *selected = (*selected + len - 1) % len;
            }
            Some(FieldValue::Toggles { cursor, .. }) => *cursor = cursor.saturating_sub(1),
            None => {}
        }
    }

    pub fn right(&mut self) {
        match self.focused_value() {
            Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) => buf.move_right(),
            Some(FieldValue::Priority(p)) => *p = p.next(),
            Some(FieldValue::Choice { items, selected }) => {
                *selected = (*selected + 1) % items.len().max(1);
            }
            Some(FieldValue::Toggles { items, cursor }) => {
                if *cursor + 1 < items.len() {
                    *cursor += 1;
                }
            }
            None => {}
        }
    }

    pub fn home(&mut self) {
        if let Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) = self.focused_value() {
            buf.home();
        }
    }

    pub fn end(&mut self) {
        if let Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) = self.focused_value() {
            buf.end();
        }
    }

    fn field(&self, key: FieldKey) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Trimmed contents of a text field; empty if absent.
    pub fn text(&self, key: FieldKey) -> String {
        match self.field(key) {
            Some(FieldValue::Text(buf) | FieldValue::Secret(buf)) => buf.input.trim().to_string(),
            _ => String::new(),
        }
    }

    /// Secrets are taken verbatim.
    pub fn secret(&self, key: FieldKey) -> String {
        match self.field(key) {
            Some(FieldValue::Secret(buf)) => buf.input.clone(),
            _ => String::new(),
        }
    }

    pub fn priority(&self, key: FieldKey) -> Priority {
        match self.field(key) {
            Some(FieldValue::Priority(p)) => *p,
            _ => Priority::default(),
        }
    }

    pub fn choice(&self, key: FieldKey) -> Option<u64> {
        match self.field(key) {
            Some(FieldValue::Choice { items, selected }) => items.get(*selected).and_then(|(id, _)| *id),
            _ => None,
        }
    }

    pub fn toggled(&self, key: FieldKey) -> Vec<u64> {
        match self.field(key) {
            Some(FieldValue::Toggles { items, .. }) => {
                items.iter().filter(|(_, _, on)| *on).map(|(id, _, _)| *id).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Build a task draft from a task form, or the message to show.
    pub fn task_draft(&self) -> Result<TaskDraft, String> {
        let title = self.text(FieldKey::Title);
        if title.is_empty() {
            return Err("Title is required.".to_string());
        }
        let due_date = crate::board::age::parse_due_input(&self.text(FieldKey::DueDate))?;
        Ok(TaskDraft {
            title,
            description: self.text(FieldKey::Description),
            priority: self.priority(FieldKey::Priority),
            tag_ids: self.toggled(FieldKey::Tags),
            due_date,
            assigned_to: self.choice(FieldKey::Assignee),
        })
    }

    /// Mark the form as failed and editable again.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.pending = false;
        self.error = Some(message.into());
    }
}

fn assignee_field(users: &[UserLite], current: Option<u64>) -> Field {
    let mut items = vec![(None, "(none)".to_string())];
    items.extend(users.iter().map(|u| (Some(u.id), u.display_name())));
    let selected = current
        .and_then(|id| items.iter().position(|(item, _)| *item == Some(id)))
        .unwrap_or(0);
    Field { key: FieldKey::Assignee, label: "Assignee", value: FieldValue::Choice { items, selected } }
}
