use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};
use ratatui::Frame;

use super::board_view::truncate;
use super::theme::Theme;
use crate::app::DashboardState;
use crate::board::BoardSummary;

fn board_line(board: &BoardSummary, selected: bool, width: usize) -> Line<'static> {
    let sel = if selected { Modifier::BOLD | Modifier::REVERSED } else { Modifier::empty() };
    let mut meta = Vec::new();
    if let Some(owner) = &board.owner_username {
        meta.push(format!("@{owner}"));
    }
    if let Some(created) = board.created_at {
        meta.push(created.format("%d.%m.%Y").to_string());
    }
    let meta = meta.join(" · ");

    let name = truncate(&board.name, width.saturating_sub(meta.len() + 6).max(8));
    let mut spans = vec![
        Span::raw(if selected { "› " } else { "  " }),
        Span::styled(name, Style::default().fg(Theme::FG).add_modifier(sel)),
    ];
    if !board.description.is_empty() {
        spans.push(Span::styled(format!("  {}", board.description.lines().next().unwrap_or("")), Theme::dim_style()));
    }
    if !meta.is_empty() {
        spans.push(Span::styled(format!("  {meta}"), Theme::dim_style()));
    }
    Line::from(spans)
}

pub(crate) fn dashboard_lines(state: &DashboardState, width: usize) -> Vec<Line<'static>> {
    if state.boards.is_empty() {
        let msg = if state.loading { "Loading boards…" } else { "No boards yet. Press n to create one." };
        return vec![Line::from(Span::styled(msg, Theme::dim_style()))];
    }
    state
        .boards
        .iter()
        .enumerate()
        .map(|(i, board)| board_line(board, i == state.selected, width))
        .collect()
}

pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Span::styled(" Boards ", Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)))
        .padding(Padding::new(1, 1, 1, 0));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let lines = dashboard_lines(state, inner.width as usize);
    // Keep the selected board on screen.
    let scroll = state.selected.saturating_sub(inner.height.saturating_sub(1) as usize);
    f.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
}
