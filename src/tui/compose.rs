//! Compose box rendering: attachment line plus the single-line text input.
//!
//! Editing state lives in [`crate::sync::ComposeState`]; this module only draws it.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};

use crate::sync::ComposeState;

/// 1 border + 1 attachment line + 1 input line + 1 border.
pub const COMPOSE_HEIGHT: u16 = 4;

/// What the compose box can currently do.
pub struct ComposeMode<'a> {
    pub focused: bool,
    /// Assigned to the signed-in agent.
    pub enabled: bool,
    pub sending: bool,
    pub disabled_reason: &'a str,
}

pub fn render(area: Rect, frame: &mut Frame, state: Option<&ComposeState>, mode: &ComposeMode) {
    let border_style = if mode.focused && mode.enabled {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_type = if mode.focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };
    let title = if mode.sending { " Sending... " } else { " Reply " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let Some(state) = state.filter(|_| mode.enabled) else {
        let line = Line::from(Span::styled(
            format!(" {}", mode.disabled_reason),
            Style::default().fg(Color::DarkGray),
        ));
        Paragraph::new(line).render(Rect::new(inner.x, inner.y, inner.width, 1), frame.buffer_mut());
        return;
    };

    let attach_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_attachment(attach_area, frame.buffer_mut(), state);

    if inner.height >= 2 {
        let input_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);
        let width = input_area.width as usize;
        let display = compose_display_text(&state.input, state.cursor_pos, width);

        let line = if state.input.is_empty() {
            Line::from(Span::styled(
                " Type a reply, /attach <path> or /detach",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(Span::styled(
                format!(" {}", display.visible),
                Style::default().fg(Color::White),
            ))
        };
        Paragraph::new(line).render(input_area, frame.buffer_mut());

        if mode.focused {
            let x = input_area.x + 1 + display.cursor_offset as u16;
            frame.set_cursor_position((x, input_area.y));
        }
    }
}

fn render_attachment(area: Rect, buf: &mut Buffer, state: &ComposeState) {
    let line = match &state.attachment {
        Some(file) => Line::from(vec![
            Span::styled(" [file] ", Style::default().fg(Color::Cyan)),
            Span::raw(file.file_name.clone()),
            Span::styled(
                format!("  {}", file.content_type()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        None => Line::from(Span::styled(
            " Enter: send  Tab: back  Esc: close",
            Style::default().fg(Color::DarkGray),
        )),
    };
    Paragraph::new(line).render(area, buf);
}

/// Visible text and the cursor column within it.
struct DisplayText {
    visible: String,
    cursor_offset: usize,
}

/// Flatten newlines to " | " and scroll horizontally to keep the cursor visible.
fn compose_display_text(input: &str, cursor_pos: usize, width: usize) -> DisplayText {
    let flat: Vec<char> = input.replace('\n', " | ").chars().collect();
    let flat_cursor: usize = input
        .chars()
        .take(cursor_pos)
        .map(|c| if c == '\n' { 3 } else { 1 })
        .sum();

    let avail = width.saturating_sub(2);
    if avail == 0 {
        return DisplayText {
            visible: String::new(),
            cursor_offset: 0,
        };
    }
    let start = flat_cursor.saturating_sub(avail);
    let end = (start + avail).min(flat.len());
    DisplayText {
        visible: flat[start.min(end)..end].iter().collect(),
        cursor_offset: flat_cursor - start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_fits() {
        let d = compose_display_text("hello", 5, 20);
        assert_eq!(d.visible, "hello");
        assert_eq!(d.cursor_offset, 5);
    }

    #[test]
    fn test_newline_expands() {
        let d = compose_display_text("a\nb", 3, 20);
        assert_eq!(d.visible, "a | b");
        assert_eq!(d.cursor_offset, 5);
    }

    #[test]
    fn test_scrolls_to_cursor() {
        let d = compose_display_text("abcdefghij", 10, 6);
        assert_eq!(d.visible, "ghij");
        assert_eq!(d.cursor_offset, 4);
    }
}
