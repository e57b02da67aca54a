use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;

use super::theme::Theme;
use crate::input::keymap::{BindingGroup, HELP_GROUPS};

/// Help lines for the given binding groups, one heading per group.
fn help_lines(groups: &[BindingGroup]) -> Vec<Line<'static>> {
    let key = Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD);
    let dim = Theme::dim_style();
    let heading = Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut lines = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(group.name, heading)));
        for binding in group.bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", binding.key), key),
                Span::styled(binding.description, dim),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Esc to close",
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
    )));
    lines
}

pub fn render_help(f: &mut Frame, area: Rect) {
    let panel_area = super::centered_rect(area, 70, 85, 60, 24);

    f.render_widget(Clear, panel_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(Theme::FG))
        .title(Span::styled(" Taskboard Help ", Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)))
        .padding(Padding::new(2, 2, 1, 1));

    let inner = block.inner(panel_area);
    f.render_widget(block, panel_area);

    if inner.height == 0 {
        return;
    }

    let paragraph = Paragraph::new(help_lines(HELP_GROUPS)).wrap(Wrap { trim: false });
    f.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_group_has_a_heading() {
        let lines = help_lines(HELP_GROUPS);
        for group in HELP_GROUPS {
            assert!(lines.iter().any(|l| l.spans.len() == 1 && l.spans[0].content == group.name));
        }
        let bindings: usize = HELP_GROUPS.iter().map(|g| g.bindings.len()).sum();
        // Bindings + headings + separators + footer.
        assert_eq!(lines.len(), bindings + HELP_GROUPS.len() * 2 + 1);
    }
}
