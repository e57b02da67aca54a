use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{App, Mode, NotificationLevel};
use crate::board::undo::UndoBuffer;
use crate::session::Route;

const UNDO_TITLE_WIDTH: usize = 16;

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App, now: Instant) {
    // Input and confirm prompts take over the entire bar
    if let Some(line) = render_full_line_mode(&app.mode) {
        f.render_widget(Paragraph::new(line).style(Theme::status_style()), area);
        return;
    }

    let left = build_left_zone(app);
    let right = build_right_zone(app, now);

    let left_width: usize = left.iter().map(|s| s.content.width()).sum();
    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let center_avail = (area.width as usize).saturating_sub(left_width + right_width);
    let center = build_center_zone(app, center_avail);

    let mut spans = left;
    spans.extend(center);
    spans.extend(right);

    f.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_style()), area);
}

fn mode_badge(app: &App) -> &'static str {
    match &app.mode {
        Mode::Space => "SPACE",
        Mode::Help => "HELP",
        Mode::Picker { .. } => "PICKER",
        Mode::Form(_) => "FORM",
        Mode::Normal | Mode::Input { .. } | Mode::Confirm { .. } => match app.route {
            Route::Login => "LOGIN",
            Route::Register => "REGISTER",
            Route::Dashboard => "BOARDS",
            Route::Board(_) => "BOARD",
            Route::Profile => "PROFILE",
        },
    }
}

/// Mode badge + where we are.
fn build_left_zone(app: &App) -> Vec<Span<'static>> {
    let location = match app.route {
        Route::Board(_) => app
            .board
            .as_ref()
            .and_then(|s| s.store.with(|b| b.name.clone()))
            .unwrap_or_default(),
        Route::Dashboard => format!("{} boards", app.dashboard.boards.len()),
        _ => String::new(),
    };

    vec![
        Span::styled(
            format!(" {} ", mode_badge(app)),
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD | Modifier::REVERSED),
        ),
        Span::raw(" "),
        Span::styled(format!("{location} "), Style::default().fg(Theme::DIM)),
    ]
}

/// Undo countdown, then column position on the board screen.
fn build_right_zone(app: &App, now: Instant) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let Some(screen) = app.board.as_ref() else {
        return spans;
    };

    if screen.undo.is_restoring() {
        spans.push(Span::styled("Restoring… ", Style::default().fg(Theme::UNDO)));
    } else if let Some(label) = undo_label(&screen.undo, now) {
        spans.push(Span::styled(label, Style::default().fg(Theme::UNDO).add_modifier(Modifier::BOLD)));
    }

    let position = screen.store.with(|b| {
        b.columns.get(screen.focused_column).map(|col| {
            let pos = if col.tasks.is_empty() {
                " 0".to_string()
            } else {
                format!(" {}/{}", screen.selected_task + 1, col.tasks.len())
            };
            (format!("{}[{}]", col.title, col.tasks.len()), pos)
        })
    });
    if let Some(Some((column, pos))) = position {
        spans.push(Span::styled(column, Style::default().fg(Theme::DIM)));
        spans.push(Span::styled(pos, Style::default().fg(Theme::FG)));
    }

    spans.push(Span::raw(" "));
    spans
}

/// `Undo "title" (u) Ns` while a deletion can still be restored.
fn undo_label(undo: &UndoBuffer, now: Instant) -> Option<String> {
    let left = undo.remaining(now)?;
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    let title = super::board_view::truncate(undo.pending_title().unwrap_or_default(), UNDO_TITLE_WIDTH);
    Some(format!("Undo \"{title}\" (u) {secs}s "))
}

/// Notification text centered in the available width.
fn build_center_zone(app: &App, avail_width: usize) -> Vec<Span<'static>> {
    let Some(notif) = app.notification.as_ref() else {
        return vec![Span::raw(" ".repeat(avail_width))];
    };
    let color = match app.notification_level {
        NotificationLevel::Info => Theme::FG,
        NotificationLevel::Error => Theme::STATUS_ERROR,
    };

    let notif_width = notif.width();
    if notif_width >= avail_width {
        let truncated = super::board_view::truncate(notif, avail_width);
        return vec![Span::styled(truncated, Style::default().fg(color))];
    }

    let pad_total = avail_width - notif_width;
    let pad_left = pad_total / 2;
    vec![
        Span::raw(" ".repeat(pad_left)),
        Span::styled(notif.clone(), Style::default().fg(color)),
        Span::raw(" ".repeat(pad_total - pad_left)),
    ]
}

fn render_full_line_mode(mode: &Mode) -> Option<Line<'static>> {
    let badge = Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD | Modifier::REVERSED);
    match mode {
        Mode::Input { prompt, buf, .. } => Some(Line::from(vec![
            Span::styled(format!(" {prompt} "), badge),
            Span::raw(format!(" {}", buf.input)),
            Span::raw("_"),
        ])),
        Mode::Confirm { prompt, .. } => Some(Line::from(Span::styled(format!(" {prompt} (y/n) "), badge))),
        _ => None,
    }
}
