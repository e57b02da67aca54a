use chrono::{DateTime, NaiveDate, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::board_screen::BoardScreen;
use crate::board::age::{due_status, format_age, DueStatus};
use crate::board::{Column, Task};

/// Total display width of an icon list, including one-space separators between items.
pub(crate) fn total_icon_width(icons: &[(String, Style)]) -> usize {
    icons.iter().map(|(t, _)| t.width()).sum::<usize>() + icons.len().saturating_sub(1)
}

/// Return the subset of `candidates` that fits within `avail_width`.
///
/// Items are dropped from the left (least important first) until the rest
/// fits. Input order is preserved in the output.
pub(crate) fn fit_icons(candidates: &[(String, Style)], avail_width: usize) -> Vec<(String, Style)> {
    let mut start = 0;
    while start + 1 < candidates.len() && total_icon_width(&candidates[start..]) > avail_width {
        start += 1;
    }
    let remaining = &candidates[start..];
    if total_icon_width(remaining) > avail_width {
        return Vec::new();
    }
    remaining.to_vec()
}

/// Border color for a card. Overdue tasks stay red even in unfocused
/// columns; fresh cards in unfocused columns are dimmed.
///
/// Selection is expressed via `BorderType::Thick + Modifier::BOLD`, not color.
pub(crate) fn card_border_color(due: Option<DueStatus>, is_col_focused: bool) -> Color {
    match due {
        Some(DueStatus::Overdue) => Theme::DUE_OVERDUE,
        _ if is_col_focused => Theme::CARD_BORDER,
        _ => Theme::DIM,
    }
}

/// Title color: green for tasks created on the same UTC day as `now`.
pub(crate) fn title_color(created: DateTime<Utc>, now: DateTime<Utc>) -> Color {
    if created.date_naive() == now.date_naive() {
        Theme::NEW_CARD_TITLE
    } else {
        Theme::CARD_TITLE
    }
}

/// Truncate `text` to `max_width` display columns on grapheme boundaries,
/// ending with `…` when anything was cut.
pub(crate) fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let avail = max_width.saturating_sub(1);
    let cut: String = text
        .graphemes(true)
        .scan(0, |w, g| {
            let gw = g.width();
            (*w + gw <= avail).then(|| {
                *w += gw;
                g
            })
        })
        .collect();
    format!("{cut}…")
}

pub fn render_board(f: &mut Frame, area: Rect, screen: &BoardScreen, now: DateTime<Utc>) {
    let rendered = screen.store.with(|board| {
        if board.columns.is_empty() {
            let msg = Paragraph::new("No columns yet. Press Space c to add one.").style(Theme::dim_style());
            f.render_widget(msg, area);
            return;
        }

        let constraints: Vec<Constraint> = board
            .columns
            .iter()
            .map(|_| Constraint::Ratio(1, board.columns.len() as u32))
            .collect();
        let col_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (idx, col) in board.columns.iter().enumerate() {
            let selected = (screen.focused_column == idx).then_some(screen.selected_task);
            render_column(f, col_areas[idx], col, selected, now);
        }
    });

    if rendered.is_none() {
        let msg = if screen.loading { "Loading board…" } else { "Board not loaded. Press r to retry." };
        f.render_widget(Paragraph::new(msg).style(Theme::dim_style()), area);
    }
}

/// `selected` is the selected task index when this column has focus.
fn render_column(f: &mut Frame, area: Rect, col: &Column, selected: Option<usize>, now: DateTime<Utc>) {
    let is_focused = selected.is_some();
    let focused_mod = if is_focused { Modifier::BOLD } else { Modifier::empty() };

    let header_line = Line::from(vec![
        Span::styled(
            format!(" {} ", col.title),
            Style::default().fg(Theme::COLUMN_HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("({})", col.tasks.len()), Theme::dim_style()),
    ]);

    let border_color = if is_focused { Theme::COLUMN_FOCUSED_BORDER } else { Theme::COLUMN_BORDER };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).add_modifier(focused_mod))
        .border_type(BorderType::Rounded)
        .title(header_line)
        .padding(Padding::new(1, 1, 0, 0));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let card_height: u16 = 5; // 3 inner lines + 2 border lines
    let max_visible = (inner.height / card_height) as usize;

    let selected_idx = selected.unwrap_or(0);
    let scroll_offset = if col.tasks.len() > max_visible && selected_idx >= max_visible {
        selected_idx + 1 - max_visible
    } else {
        0
    };

    let today = now.date_naive();
    for (idx, task) in col.tasks.iter().enumerate().skip(scroll_offset).take(max_visible) {
        let y = inner.y + ((idx - scroll_offset) as u16 * card_height);
        let card_area = Rect::new(inner.x, y, inner.width, card_height);
        let is_selected = selected == Some(idx);
        render_card(f, card_area, task, is_selected, is_focused, now, today);
    }

    if col.tasks.len() > max_visible {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        let mut scrollbar_state = ScrollbarState::new(col.tasks.len()).position(scroll_offset);
        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    task: &Task,
    is_selected: bool,
    is_col_focused: bool,
    now: DateTime<Utc>,
    today: NaiveDate,
) {
    if area.width < 4 || area.height < 3 {
        return;
    }

    let due = task.due_date.map(|d| due_status(d, today));
    let border_color = card_border_color(due.as_ref().map(|(s, _)| *s), is_col_focused);
    let selected_mod = if is_selected { Modifier::BOLD } else { Modifier::empty() };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).add_modifier(selected_mod))
        .border_type(if is_selected { BorderType::Thick } else { BorderType::Rounded });

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 || inner.width < 2 {
        return;
    }

    let marker = if is_selected { "› " } else { "  " };
    let id = format!("#{}", task.id);
    let age = format_age(task.created_at, now);
    let left_width = marker.width() + id.width() + 1 + age.width();

    // Due label is dropped before the priority glyph when space runs out.
    let mut candidates: Vec<(String, Style)> = Vec::new();
    if let Some((status, label)) = &due {
        candidates.push((label.clone(), Style::default().fg(Theme::due_color(*status))));
    }
    candidates.push((
        Theme::priority_glyph(task.priority).to_string(),
        Style::default().fg(Theme::priority_color(task.priority)),
    ));
    let avail = (inner.width as usize).saturating_sub(left_width + 1);
    let icons = fit_icons(&candidates, avail);
    let icons_width = total_icon_width(&icons);

    let mut line1 = vec![
        Span::styled(marker, Style::default().fg(Theme::FG).add_modifier(selected_mod)),
        Span::styled(id, Style::default().fg(Theme::DIM).add_modifier(selected_mod)),
        Span::raw(" "),
        Span::styled(age, Style::default().fg(Theme::DIM).add_modifier(selected_mod)),
        Span::raw(" ".repeat((inner.width as usize).saturating_sub(left_width + icons_width))),
    ];
    for (i, (text, style)) in icons.into_iter().enumerate() {
        if i > 0 {
            line1.push(Span::raw(" "));
        }
        line1.push(Span::styled(text, style));
    }

    let title = format!("  {}", truncate(&task.title, (inner.width as usize).saturating_sub(2)));
    let title_line = Line::from(Span::styled(
        title,
        Style::default().fg(title_color(task.created_at, now)).add_modifier(selected_mod),
    ));

    f.render_widget(Paragraph::new(Line::from(line1)), Rect::new(inner.x, inner.y, inner.width, 1));
    if inner.height >= 2 {
        f.render_widget(Paragraph::new(title_line), Rect::new(inner.x, inner.y + 1, inner.width, 1));
    }

    // Line 3: assignee initials + tags
    let has_metadata = task.assigned_to_user.is_some() || !task.tags.is_empty();
    if inner.height >= 3 && has_metadata {
        let mut spans = vec![Span::raw("  ")];
        let mut need_sep = false;
        if let Some(user) = &task.assigned_to_user {
            spans.push(Span::styled(
                format!("@{}", user.initials()),
                Style::default().fg(Theme::ASSIGNEE).add_modifier(selected_mod),
            ));
            need_sep = true;
        }
        for tag in &task.tags {
            if need_sep {
                spans.push(Span::styled(" · ", Theme::dim_style()));
            }
            spans.push(Span::styled(
                tag.name.as_str(),
                Style::default().fg(Theme::tag_color(tag.color)).add_modifier(selected_mod),
            ));
            need_sep = true;
        }
        f.render_widget(
            Paragraph::new(Line::from(spans)),
            Rect::new(inner.x, inner.y + 2, inner.width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    use crate::api::types::BoardView;
    use crate::board::tree::tests::test_board;

    fn icon(t: &str) -> (String, Style) {
        (t.to_string(), Style::default())
    }

    fn names(icons: &[(String, Style)]) -> Vec<&str> {
        icons.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn total_icon_width_counts_separators() {
        assert_eq!(total_icon_width(&[]), 0);
        assert_eq!(total_icon_width(&[icon("!")]), 1);
        assert_eq!(total_icon_width(&[icon("Today"), icon("!")]), 7);
    }

    #[test]
    fn fit_icons_all_fit_returns_all() {
        assert_eq!(names(&fit_icons(&[icon("Today"), icon("!")], 10)), vec!["Today", "!"]);
    }

    #[test]
    fn fit_icons_drops_due_label_before_priority() {
        assert_eq!(names(&fit_icons(&[icon("Today"), icon("!")], 6)), vec!["!"]);
    }

    #[test]
    fn fit_icons_clears_all_when_nothing_fits() {
        assert!(fit_icons(&[icon("!")], 0).is_empty());
    }

    #[test]
    fn border_color_overdue_wins_over_focus() {
        assert_eq!(card_border_color(Some(DueStatus::Overdue), false), Theme::DUE_OVERDUE);
        assert_eq!(card_border_color(Some(DueStatus::Overdue), true), Theme::DUE_OVERDUE);
    }

    #[test]
    fn border_color_follows_focus_otherwise() {
        assert_eq!(card_border_color(None, true), Theme::CARD_BORDER);
        assert_eq!(card_border_color(Some(DueStatus::Today), false), Theme::DIM);
    }

    #[test]
    fn title_color_created_today_is_green() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = day.and_hms_opt(23, 59, 59).unwrap().and_utc();
        assert_eq!(title_color(start, end), Theme::NEW_CARD_TITLE);
        let next = day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(title_color(end, next), Theme::CARD_TITLE);
    }

    #[test]
    fn truncate_respects_wide_graphemes() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 4), "abc…");
        // Each CJK char is two columns wide.
        assert_eq!(truncate("日本語です", 6), "日本…");
    }

    fn draw(screen: &BoardScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc();
        terminal.draw(|f| render_board(f, f.area(), screen, now)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_columns_and_tasks() {
        let mut screen = BoardScreen::new(1, Duration::from_secs(5));
        screen.install(BoardView { board: test_board(&[&[1], &[2, 3]]), tags: Vec::new(), users: Vec::new() });
        let text = draw(&screen);
        assert!(text.contains("C0"));
        assert!(text.contains("C1"));
        assert!(text.contains("#3"));
    }

    #[test]
    fn renders_loading_placeholder() {
        let screen = BoardScreen::new(1, Duration::from_secs(5));
        assert!(draw(&screen).contains("Loading board"));
    }
}
