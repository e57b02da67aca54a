//! Modal form panel: login, registration, board/task editors, profile.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use crate::app::form::{Field, FieldValue, FormState, TextBuffer};

/// Split a buffer at its cursor so the cursor cell can be drawn reversed.
fn text_spans(buf: &TextBuffer, masked: bool, focused: bool) -> Vec<Span<'static>> {
    let shown: String = if masked { "•".repeat(buf.input.chars().count()) } else { buf.input.clone() };
    if !focused {
        return vec![Span::raw(shown)];
    }
    let before: String = shown.chars().take(buf.cursor).collect();
    let at: String = shown.chars().nth(buf.cursor).map(String::from).unwrap_or_else(|| " ".into());
    let after: String = shown.chars().skip(buf.cursor + 1).collect();
    vec![
        Span::raw(before),
        Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ]
}

/// Lines for one field: the label line, then the value (toggles take one line each).
fn field_lines(field: &Field, focused: bool) -> Vec<Line<'static>> {
    let label_style = if focused {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    } else {
        Theme::dim_style()
    };
    let marker = if focused { "› " } else { "  " };
    let mut lines = vec![Line::from(Span::styled(format!("{marker}{}", field.label), label_style))];

    let mut value = vec![Span::raw("    ")];
    match &field.value {
        FieldValue::Text(buf) => value.extend(text_spans(buf, false, focused)),
        FieldValue::Secret(buf) => value.extend(text_spans(buf, true, focused)),
        FieldValue::Priority(priority) => {
            value.push(Span::styled(
                format!("< {priority} >"),
                Style::default().fg(Theme::priority_color(*priority)),
            ));
        }
        FieldValue::Choice { items, selected } => {
            let label = items.get(*selected).map(|(_, l)| l.as_str()).unwrap_or("");
            value.push(Span::raw(format!("< {label} >")));
        }
        FieldValue::Toggles { items, cursor } => {
            if items.is_empty() {
                value.push(Span::styled("(none available)", Theme::dim_style()));
            }
            for (i, (_, name, on)) in items.iter().enumerate() {
                let mark = if *on { "[x] " } else { "[ ] " };
                let style = if focused && i == *cursor {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                if i > 0 {
                    lines.push(Line::from(std::mem::replace(&mut value, vec![Span::raw("    ")])));
                }
                value.push(Span::styled(format!("{mark}{name}"), style));
            }
        }
    }
    lines.push(Line::from(value));
    lines
}

pub(crate) fn form_lines(form: &FormState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        lines.extend(field_lines(field, i == form.focused));
    }
    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Theme::STATUS_ERROR))));
    }
    let footer = if form.pending { "Sending…" } else { "Enter submit · Tab next · Esc cancel" };
    lines.push(Line::from(Span::styled(footer, Theme::dim_style())));
    lines
}

pub fn render_form(f: &mut Frame, area: Rect, form: &FormState) {
    let lines = form_lines(form);
    let height = (lines.len() as u16 + 4).min(area.height);
    let width = 56.min(area.width);
    let panel = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Theme::FG))
        .title(Span::styled(
            format!(" {} ", form.title),
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::new(1, 1, 1, 0));
    let inner = block.inner(panel);
    f.render_widget(block, panel);
    f.render_widget(Paragraph::new(lines), inner);
}
