//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{App, Pane};
use super::chat;
use super::compose::{self, ComposeMode};
use super::conversations;
use crate::sync::{AssignmentState, NoticeLevel};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    // Layout: header (1 line) + main content + status bar (1 line)
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(header_area, frame.buffer_mut(), app);

    let [list_area, content_area] =
        Layout::horizontal([Constraint::Length(32), Constraint::Fill(1)]).areas(main_area);

    conversations::render(
        list_area,
        frame.buffer_mut(),
        &app.view,
        &app.list,
        app.active_pane == Pane::List,
    );

    let [chat_area, compose_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(compose::COMPOSE_HEIGHT),
    ])
    .areas(content_area);

    chat::render(
        chat_area,
        frame.buffer_mut(),
        &app.view,
        &app.chat,
        app.active_pane == Pane::Chat,
    );

    let open = app.view.current();
    let mode = ComposeMode {
        focused: app.active_pane == Pane::Compose,
        enabled: app.view.can_compose(),
        sending: open.is_some_and(|o| o.sending),
        disabled_reason: compose_disabled_reason(app),
    };
    compose::render(compose_area, frame, open.map(|o| &o.compose), &mode);

    render_status(status_area, frame.buffer_mut(), app);
}

fn compose_disabled_reason(app: &App) -> &'static str {
    if app.view.current().is_none() {
        return "No conversation open";
    }
    match app.view.assignment_state() {
        AssignmentState::Unassigned => "Press [a] to assign this conversation to yourself",
        AssignmentState::AssignedToOther { .. } => "Assigned to another agent",
        AssignmentState::AssignedToMe => "",
    }
}

fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title = " wacon";
    let me = app.view.me();
    let right = format!("{} ({})  {} ", me.email, me.role, app.backend_url);
    let pad = (area.width as usize).saturating_sub(title.width() + right.width());

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(pad)),
        Span::styled(right, Style::default().fg(Color::Cyan)),
    ]);
    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Key hints for the focused pane.
fn hints(pane: Pane) -> &'static str {
    match pane {
        Pane::List => "Enter: open  g: reload  PgUp/PgDn: page  q: quit",
        Pane::Chat => "a: assign  r: release  c: chatbot  Tab: reply  Esc: close",
        Pane::Compose => "Enter: send  Alt-Enter: newline  /attach <path>  Esc: back",
    }
}

fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    let busy = if app.busy() {
        let frame = (chrono::Utc::now().timestamp_subsec_millis() / 250) as usize;
        format!(" {} ", SPINNER[frame % SPINNER.len()])
    } else {
        "   ".to_string()
    };

    let mut spans = vec![Span::styled(busy, Style::default().fg(Color::Yellow))];
    match (&app.status, &app.last_warning) {
        (Some(notice), _) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            spans.push(Span::styled(
                notice.text.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
        (None, Some(warning)) if app.active_pane != Pane::Compose => {
            spans.push(Span::styled(warning.clone(), Style::default().fg(Color::Yellow)));
        }
        _ => {
            spans.push(Span::styled(
                format!("[{}] ", app.active_pane.as_str()),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::styled(
                hints(app.active_pane),
                Style::default().fg(Color::Gray),
            ));
        }
    }

    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Page;
    use crate::models::{Conversation, CurrentUser};
    use crate::sync::{Notice, SyncEvent};
    use crate::tui::backend::BackendResponse;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn app() -> App {
        let me = CurrentUser {
            id: "7".into(),
            email: "agent@example.com".into(),
            role: "Agent".into(),
            branch: None,
        };
        let mut app = App::new(me, 20, "http://localhost:5000/api/".into());
        app.in_flight = 1;
        app.apply(BackendResponse {
            events: vec![SyncEvent::Conversations(Ok(Page::single(vec![Conversation {
                contact_number: "+15551230000".into(),
                contact_name: Some("Ada".into()),
                unread_count: 3,
                ..Default::default()
            }])))],
        });
        app
    }

    #[test]
    fn test_render_list_and_disabled_compose() {
        let app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Ada"));
        assert!(text.contains("No conversation open"));
        assert!(text.contains("agent@example.com"));
    }

    #[test]
    fn test_status_shows_notice() {
        let mut app = app();
        app.status = Some(Notice::error("Failed to send message: provider down"));
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        render_status(area, &mut buf, &app);
        assert!(buffer_text(&buf).contains("provider down"));
    }

    #[test]
    fn test_compose_disabled_reason_for_unassigned() {
        let mut app = app();
        app.view.open("+15551230000");
        assert!(compose_disabled_reason(&app).contains("[a]"));
    }
}
