use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use crate::api::ApiClient;
use crate::board::UserProfile;

fn row(label: &'static str, value: String) -> Line<'static> {
    let value = if value.is_empty() {
        Span::styled("-", Theme::dim_style())
    } else {
        Span::raw(value)
    };
    Line::from(vec![Span::styled(format!("{label:<12}"), Theme::dim_style()), value])
}

pub(crate) fn profile_lines(profile: &UserProfile, api: &ApiClient) -> Vec<Line<'static>> {
    let name = format!("{} {}", profile.first_name, profile.last_name);
    vec![
        Line::from(Span::styled(
            format!("@{}", profile.username),
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("Name", name.trim().to_string()),
        row("Email", profile.email.clone()),
        row("Position", profile.position.clone()),
        row("Avatar", profile.avatar.as_deref().map(|a| api.avatar_url(a)).unwrap_or_default()),
    ]
}

pub fn render_profile(f: &mut Frame, area: Rect, profile: Option<&UserProfile>, loading: bool, api: &ApiClient) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Span::styled(" Profile ", Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)))
        .padding(Padding::new(2, 2, 1, 0));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = match profile {
        Some(profile) => profile_lines(profile, api),
        None if loading => vec![Line::from(Span::styled("Loading profile…", Theme::dim_style()))],
        None => vec![Line::from(Span::styled("Profile not loaded. Press r to retry.", Theme::dim_style()))],
    };
    f.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_shows_absolute_avatar() {
        let api = ApiClient::new("http://localhost:8000/api/").unwrap();
        let profile = UserProfile {
            id: 1,
            username: "ana".into(),
            first_name: "Ana".into(),
            last_name: String::new(),
            email: "ana@example.com".into(),
            position: String::new(),
            avatar: Some("/media/avatars/ana.png".into()),
        };
        let text: Vec<String> = profile_lines(&profile, &api)
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[0], "@ana");
        assert_eq!(text[2], "Name        Ana");
        assert_eq!(text[4], "Position    -");
        assert_eq!(text[5], "Avatar      http://localhost:8000/media/avatars/ana.png");
    }
}
