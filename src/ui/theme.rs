use ratatui::style::{Color, Style};

use crate::board::age::DueStatus;
use crate::board::{Priority, TagColor};

/// Color theme.
///
/// Text and chrome use the terminal's default foreground (Color::Reset).
/// Only functional glyphs (priority, due date) and tags get color.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;

    // Column
    pub const COLUMN_HEADER: Color = Color::Reset;
    pub const COLUMN_BORDER: Color = Color::Reset;
    pub const COLUMN_FOCUSED_BORDER: Color = Color::Reset;

    // Task card
    pub const CARD_BORDER: Color = Color::Reset;
    pub const CARD_TITLE: Color = Color::Reset;
    pub const NEW_CARD_TITLE: Color = Color::Green;
    pub const ASSIGNEE: Color = Color::Cyan;

    pub const PRIORITY_LOW: Color = Color::Green;
    pub const PRIORITY_MEDIUM: Color = Color::Yellow;
    pub const PRIORITY_HIGH: Color = Color::Red;

    pub const DUE_OVERDUE: Color = Color::Red;
    pub const DUE_SOON: Color = Color::Yellow;

    // Status bar
    pub const STATUS_ERROR: Color = Color::Red;
    pub const UNDO: Color = Color::Yellow;

    // Hint popup
    pub const HINT_KEY: Color = Color::Reset;
    pub const HINT_DESC: Color = Color::Reset;

    pub fn dim_style() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn status_style() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn priority_color(priority: Priority) -> Color {
        match priority {
            Priority::Low => Self::PRIORITY_LOW,
            Priority::Medium => Self::PRIORITY_MEDIUM,
            Priority::High => Self::PRIORITY_HIGH,
        }
    }

    /// Glyph drawn in the corner of a card.
    pub fn priority_glyph(priority: Priority) -> &'static str {
        match priority {
            Priority::Low => "↓",
            Priority::Medium => "•",
            Priority::High => "!",
        }
    }

    pub fn tag_color(color: TagColor) -> Color {
        match color {
            TagColor::Red => Color::Red,
            TagColor::Blue => Color::Blue,
            TagColor::Green => Color::Green,
            TagColor::Purple => Color::Magenta,
            TagColor::Orange => Color::LightRed,
            TagColor::Yellow => Color::Yellow,
            TagColor::Gray => Color::Gray,
        }
    }

    pub fn due_color(status: DueStatus) -> Color {
        match status {
            DueStatus::Overdue => Self::DUE_OVERDUE,
            DueStatus::Today | DueStatus::Tomorrow => Self::DUE_SOON,
            DueStatus::Upcoming => Self::DIM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_color_is_gray() {
        let tag: TagColor = serde_json::from_str("\"teal\"").unwrap();
        assert_eq!(Theme::tag_color(tag), Color::Gray);
    }

    #[test]
    fn test_due_colors() {
        assert_eq!(Theme::due_color(DueStatus::Overdue), Theme::DUE_OVERDUE);
        assert_eq!(Theme::due_color(DueStatus::Tomorrow), Theme::DUE_SOON);
        assert_eq!(Theme::due_color(DueStatus::Upcoming), Theme::DIM);
    }
}
