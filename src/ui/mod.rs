pub mod board_view;
pub mod dashboard;
pub mod form;
pub mod help;
pub mod input_modal;
pub mod profile;
pub mod status_bar;
pub mod theme;

use std::time::Instant;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Mode};
use crate::session::Route;
use theme::Theme;

/// Create a centered rect within `area` using percentage-based sizing with minimums.
pub fn centered_rect(area: Rect, w_pct: u16, h_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * w_pct / 100).max(min_w).min(area.width);
    let height = (area.height * h_pct / 100).max(min_h).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn render_banner(f: &mut Frame, area: Rect, api_url: &str) {
    let lines = vec![
        Line::from(Span::styled("taskboard", Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(api_url.to_string(), Theme::dim_style())),
    ];
    let top = Rect::new(area.x, area.y + 1, area.width, 2.min(area.height));
    f.render_widget(Paragraph::new(lines).centered(), top);
}

/// Draw one frame. `now` drives task ages and due labels, `instant` the
/// undo countdown.
pub fn render(f: &mut Frame, app: &App, now: DateTime<Utc>, instant: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());
    let main = chunks[0];

    match app.route {
        Route::Login | Route::Register => render_banner(f, main, app.api.base_url().as_str()),
        Route::Dashboard => dashboard::render_dashboard(f, main, &app.dashboard),
        Route::Board(_) => {
            if let Some(screen) = app.board.as_ref() {
                board_view::render_board(f, main, screen, now);
            }
        }
        Route::Profile => profile::render_profile(f, main, app.profile.as_ref(), app.profile_loading, &app.api),
    }

    status_bar::render_status_bar(f, chunks[1], app, instant);

    // Overlays
    match &app.mode {
        Mode::Space => input_modal::render_hint_popup(f, main, &app.mode),
        Mode::Picker { title, items, selected, .. } => input_modal::render_picker(f, main, title, items, *selected),
        Mode::Form(state) => form::render_form(f, main, state),
        Mode::Help => help::render_help(f, f.area()),
        Mode::Normal | Mode::Input { .. } | Mode::Confirm { .. } => {}
    }
}
