//! Frame composition for the two-tab interface.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use crate::core::app::{App, TabKind, TabSession};
use crate::core::message::Sender;

pub fn ui(f: &mut Frame, app: &App, textarea: &TextArea) {
    let input_height = input_area_height(textarea);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_height + 2),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_tab_bar(f, app, chunks[0]);
    render_messages(f, app, chunks[1]);
    render_input(f, app, textarea, chunks[2]);
    render_status_bar(f, app, chunks[3]);
}

fn input_area_height(textarea: &TextArea) -> u16 {
    (textarea.lines().len() as u16).clamp(1, 6)
}

fn render_tab_bar(f: &mut Frame, app: &App, area: Rect) {
    let titles = [TabKind::Chat, TabKind::Vision].map(|kind| {
        let tab = app.tab(kind);
        let model = tab.model.as_deref().unwrap_or("no model");
        let busy = if tab.is_busy() { " ⋯" } else { "" };
        Line::from(format!(" {} [{model}]{busy} ", kind.title()))
    });
    let selected = match app.active {
        TabKind::Chat => 0,
        TabKind::Vision => 1,
    };
    let tabs = Tabs::new(titles.to_vec())
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

/// Turn a tab's conversation (plus any in-progress response) into styled lines.
pub fn build_display_lines(tab: &TabSession) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    for msg in &tab.messages {
        match msg.sender {
            Sender::User => {
                let mut first = true;
                for content_line in msg.content.lines() {
                    if first {
                        lines.push(Line::from(vec![
                            Span::styled(
                                "You: ",
                                Style::default()
                                    .fg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(content_line.to_string(), Style::default().fg(Color::Cyan)),
                        ]));
                        first = false;
                    } else {
                        lines.push(Line::from(Span::styled(
                            content_line.to_string(),
                            Style::default().fg(Color::Cyan),
                        )));
                    }
                }
                lines.push(Line::from(""));
            }
            Sender::Assistant => {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(content_line.to_string()));
                }
                lines.push(Line::from(""));
            }
            Sender::App => {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::from(""));
            }
        }
    }

    // Response still streaming in.
    if tab.is_busy() {
        for content_line in tab.response.lines() {
            lines.push(Line::from(content_line.to_string()));
        }
        lines.push(Line::from(Span::styled(
            "…",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let tab = app.active_tab();
    let lines = build_display_lines(tab);

    let available_height = area.height.saturating_sub(2);
    let total_lines = lines.len() as u16;
    let max_offset = total_lines.saturating_sub(available_height);
    let scroll_offset = if tab.auto_scroll {
        max_offset
    } else {
        tab.scroll_offset.min(max_offset)
    };

    let title = format!(
        " ocular v{} — {} • transcript: {} ",
        env!("CARGO_PKG_VERSION"),
        app.base_url,
        app.transcript.status_string()
    );

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset, 0));
    f.render_widget(paragraph, area);
}

fn render_input(f: &mut Frame, app: &App, textarea: &TextArea, area: Rect) {
    let title = match app.active {
        TabKind::Chat => " Prompt (Enter to send, /help for commands) ".to_string(),
        TabKind::Vision => {
            let attachment = app
                .vision_tab
                .attachment
                .as_ref()
                .map(|p| {
                    p.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned()
                })
                .unwrap_or_else(|| "none — /image <path>".to_string());
            format!(" Prompt (image: {attachment}) ")
        }
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(textarea, inner);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(status) = &app.status {
        (status.clone(), Style::default().fg(Color::Yellow))
    } else if !app.daemon_online {
        (
            format!("Ollama daemon not detected at {} — is it running?", app.base_url),
            Style::default().fg(Color::Red),
        )
    } else {
        (
            format!("{} models available", app.catalog.len()),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;

    fn tab_with(messages: Vec<Message>) -> TabSession {
        let mut tab = empty_tab();
        tab.messages = messages;
        tab
    }

    fn empty_tab() -> TabSession {
        // TabSession has no public constructor outside App; build one through
        // App to keep the invariants in one place.
        use crate::core::app::{App, AppInit};
        use std::time::Duration;
        let app = App::new(AppInit {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(30),
            system_prompt: None,
            transcript_path: None,
            chat_model: None,
            vision_model: None,
            vision_patterns: Vec::new(),
        });
        app.chat_tab
    }

    #[test]
    fn user_lines_carry_prefix_only_on_first_line() {
        let tab = tab_with(vec![Message::user("line one\nline two")]);
        let lines = build_display_lines(&tab);
        assert_eq!(lines[0].spans[0].content, "You: ");
        assert_eq!(lines[1].spans[0].content, "line two");
    }

    #[test]
    fn streaming_tab_shows_partial_response_and_indicator() {
        let mut tab = empty_tab();
        tab.response = "partial".to_string();
        tab.in_flight = Some(crate::core::app::InFlight {
            stream_id: 1,
            cancel_token: tokio_util::sync::CancellationToken::new(),
            prompt: "p".to_string(),
        });
        let lines = build_display_lines(&tab);
        assert!(lines.iter().any(|l| l
            .spans
            .iter()
            .any(|s| s.content.contains("partial"))));
        assert_eq!(lines.last().unwrap().spans[0].content, "…");
    }

    #[test]
    fn idle_empty_tab_renders_no_lines() {
        let tab = empty_tab();
        assert!(build_display_lines(&tab).is_empty());
    }
}
