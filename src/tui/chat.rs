//! Chat pane: history of the open conversation, oldest at the top.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::models::{short_time, Direction, Message};
use crate::sync::{AssignmentState, ConversationView};

/// Scroll position, counted in lines up from the newest message.
#[derive(Default)]
pub struct ChatState {
    pub scroll_back: usize,
}

impl ChatState {
    pub fn scroll_up(&mut self) {
        self.scroll_back += 1;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.scroll_back = 0;
    }
}

pub fn render(area: Rect, buf: &mut Buffer, view: &ConversationView, state: &ChatState, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_type = if focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let Some(open) = view.current() else {
        let line = Line::from(Span::styled(
            " Select a conversation and press Enter",
            Style::default().fg(Color::DarkGray),
        ));
        Paragraph::new(line).render(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        return;
    };

    let header_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_header(header_area, buf, view);

    let body_area = Rect::new(
        inner.x,
        inner.y + 1,
        inner.width,
        inner.height.saturating_sub(1),
    );
    if body_area.height == 0 {
        return;
    }

    let contact = view
        .open_conversation()
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| open.key.contact_number.clone());
    let lines = build_lines(&open.messages, &contact, body_area.width as usize);
    let visible = body_area.height as usize;
    let max_back = lines.len().saturating_sub(visible);
    let back = state.scroll_back.min(max_back);
    let start = lines.len().saturating_sub(visible + back);

    for (row, line) in lines.iter().skip(start).take(visible).enumerate() {
        let line_area = Rect::new(body_area.x, body_area.y + row as u16, body_area.width, 1);
        Paragraph::new(line.clone()).render(line_area, buf);
    }

    if back > 0 {
        let x = body_area.x + body_area.width.saturating_sub(1);
        let y = body_area.y + body_area.height.saturating_sub(1);
        let cell = &mut buf[(x, y)];
        cell.set_char('v');
        cell.set_style(Style::default().fg(Color::DarkGray));
    }
}

/// Contact, assignment and chatbot state of the open conversation.
fn render_header(area: Rect, buf: &mut Buffer, view: &ConversationView) {
    let name = view
        .open_conversation()
        .map(|c| format!("{} ({})", c.display_name(), c.contact_number))
        .or_else(|| view.key().map(|k| k.contact_number))
        .unwrap_or_default();
    let state = view.assignment_state();
    let state_color = match state {
        AssignmentState::AssignedToMe => Color::Green,
        AssignmentState::AssignedToOther { .. } => Color::Magenta,
        AssignmentState::Unassigned => Color::Gray,
    };
    let mut spans = vec![
        Span::styled(
            format!(" {} ", name),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", state.describe()), Style::default().fg(state_color)),
    ];
    if state == AssignmentState::AssignedToMe {
        spans.push(Span::styled(
            format!(" [c] {} ", view.chatbot_toggle_label()),
            Style::default().fg(Color::Cyan),
        ));
    }
    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn sender(m: &Message, contact: &str) -> String {
    match m.direction {
        Direction::Inbound => contact.to_string(),
        Direction::Outbound if m.is_automated_response => "Chatbot".to_string(),
        Direction::Outbound => "Agent".to_string(),
    }
}

/// Flatten messages into display lines, oldest first.
fn build_lines(messages: &[Message], contact: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if messages.is_empty() {
        lines.push(Line::from(Span::styled(
            " (no messages)",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    let content_width = width.saturating_sub(3).max(1);
    for m in messages {
        let name_color = match m.direction {
            Direction::Inbound => Color::Cyan,
            Direction::Outbound => Color::Green,
        };
        let mut header = vec![
            Span::styled(
                format!(" {}", sender(m, contact)),
                Style::default().fg(name_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", short_time(&m.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Some(status) = &m.status {
            header.push(Span::styled(
                format!("  {}", status.to_lowercase()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(header));

        for text in wrap_text(&m.body, content_width) {
            lines.push(Line::from(Span::raw(format!("   {}", text))));
        }
        if let Some(url) = &m.media_url {
            lines.push(Line::from(Span::styled(
                format!("   [media] {}", url),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
            )));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Split on newlines, then word-wrap by display width.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();
    for line in text.lines() {
        if line.width() <= max_width {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.width() + 1 + word.width() <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(direction: Direction, body: &str) -> Message {
        Message {
            id: None,
            direction,
            body: body.into(),
            media_url: None,
            timestamp: "2024-01-01T10:00:00Z".into(),
            is_automated_response: false,
            status: None,
        }
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn test_lines_keep_order_and_sender() {
        let messages = vec![msg(Direction::Inbound, "first"), msg(Direction::Outbound, "second")];
        let lines = build_lines(&messages, "Ada", 40);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        let first = text.iter().position(|l| l.contains("first")).unwrap();
        let second = text.iter().position(|l| l.contains("second")).unwrap();
        assert!(first < second);
        assert!(text[0].contains("Ada"));
        assert!(text.iter().any(|l| l.contains("Agent")));
    }

    #[test]
    fn test_automated_reply_sender() {
        let mut m = msg(Direction::Outbound, "We open at 9");
        m.is_automated_response = true;
        assert_eq!(sender(&m, "Ada"), "Chatbot");
    }
}
