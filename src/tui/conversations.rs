//! Conversation list pane: one row per conversation with unread badge and
//! assignment marker.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::models::{Conversation, CurrentUser};
use crate::sync::ConversationView;

/// Selection within the loaded page.
#[derive(Default)]
pub struct ListState {
    pub selected: usize,
}

impl ListState {
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, count: usize) {
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    /// Clamp after the list was replaced.
    pub fn clamp(&mut self, count: usize) {
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }

    pub fn selected_contact<'a>(&self, conversations: &'a [Conversation]) -> Option<&'a str> {
        conversations
            .get(self.selected)
            .map(|c| c.contact_number.as_str())
    }
}

/// Single-character owner marker: `@` mine, `#` someone else's, blank otherwise.
fn owner_marker(c: &Conversation, me: &CurrentUser) -> (&'static str, Color) {
    match c.assigned_agent_id.as_deref() {
        Some(id) if c.is_assigned && id == me.id => ("@", Color::Green),
        Some(_) if c.is_assigned => ("#", Color::Magenta),
        _ => (" ", Color::Gray),
    }
}

fn item_style(selected: bool, open: bool, has_unread: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else if open {
        Style::default().fg(Color::Yellow)
    } else if has_unread {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

pub fn render(
    area: Rect,
    buf: &mut Buffer,
    view: &ConversationView,
    list: &ListState,
    focused: bool,
) {
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

    let title = if view.total_pages > 1 {
        format!(" Conversations {}/{} ", view.current_page, view.total_pages)
    } else {
        " Conversations ".to_string()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if view.conversations.is_empty() {
        let text = if view.loaded {
            " No conversations"
        } else {
            " Loading..."
        };
        let line = Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));
        Paragraph::new(line).render(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        return;
    }

    let open_contact = view.key().map(|k| k.contact_number);
    let height = inner.height as usize;
    let offset = compute_scroll_offset(list.selected, height, view.conversations.len());

    for (row, (idx, conv)) in view
        .conversations
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .enumerate()
    {
        let selected = idx == list.selected;
        let is_open = open_contact.as_deref() == Some(conv.contact_number.as_str());
        let style = item_style(selected, is_open, conv.unread_count > 0);
        let (marker, marker_color) = owner_marker(conv, view.me());
        let cursor = if selected { "\u{25BA}" } else { " " };
        let label = format!("{} {}", cursor, conv.display_name());
        let badge = if conv.unread_count > 0 {
            conv.unread_count.to_string()
        } else {
            String::new()
        };
        let marker_style = if selected {
            style.fg(marker_color)
        } else {
            Style::default().fg(marker_color)
        };
        render_row(
            buf,
            Rect::new(inner.x, inner.y + row as u16, inner.width, 1),
            (&label, style),
            (&badge, style.fg(Color::Yellow)),
            (marker, marker_style),
        );
    }
}

/// Keep the selected row visible.
fn compute_scroll_offset(selected: usize, height: usize, total: usize) -> usize {
    if total <= height || selected < height {
        return 0;
    }
    selected
        .saturating_sub(height - 1)
        .min(total.saturating_sub(height))
}

/// Left-aligned label, right-aligned badge, then the owner marker.
fn render_row(
    buf: &mut Buffer,
    area: Rect,
    (left, text_style): (&str, Style),
    (badge, badge_style): (&str, Style),
    (marker, marker_style): (&str, Style),
) {
    let width = area.width as usize;
    if width < 2 {
        return;
    }
    let right_len = badge.len() + 2;
    let max_left = width.saturating_sub(right_len);
    let left_truncated: String = left.chars().take(max_left).collect();
    let pad = width.saturating_sub(left_truncated.chars().count() + right_len);

    let line = Line::from(vec![
        Span::styled(left_truncated, text_style),
        Span::styled(" ".repeat(pad), text_style),
        Span::styled(badge.to_string(), badge_style),
        Span::styled(" ", text_style),
        Span::styled(marker.to_string(), marker_style),
    ]);
    Paragraph::new(line).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let mut list = ListState::default();
        list.move_up();
        assert_eq!(list.selected, 0);
        list.move_down(3);
        list.move_down(3);
        list.move_down(3);
        assert_eq!(list.selected, 2);
        list.clamp(1);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_scroll_offset_keeps_selection_visible() {
        assert_eq!(compute_scroll_offset(3, 10, 5), 0);
        assert_eq!(compute_scroll_offset(12, 10, 30), 3);
        assert_eq!(compute_scroll_offset(29, 10, 30), 20);
    }

    #[test]
    fn test_owner_marker() {
        let me = CurrentUser {
            id: "7".into(),
            ..Default::default()
        };
        let mut c = Conversation {
            contact_number: "+1".into(),
            ..Default::default()
        };
        assert_eq!(owner_marker(&c, &me).0, " ");
        c.is_assigned = true;
        c.assigned_agent_id = Some("7".into());
        assert_eq!(owner_marker(&c, &me).0, "@");
        c.assigned_agent_id = Some("8".into());
        assert_eq!(owner_marker(&c, &me).0, "#");
    }
}
