//! TUI application state and main event loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::time::{interval_at, Interval, MissedTickBehavior};

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::chat::ChatState;
use super::conversations::ListState;
use super::log_capture::{is_warning, LogBuffer};
use super::ui;
use crate::commands::Console;
use crate::models::CurrentUser;
use crate::sync::{ComposeCommand, ConversationApi, ConversationView, Notice, NoticeLevel, ViewKey};

/// How long a notice stays in the status bar.
const NOTICE_TTL: Duration = Duration::from_secs(6);

/// Housekeeping tick: notice expiry and log draining.
const TICK: Duration = Duration::from_millis(250);

/// Active pane in the TUI
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    #[default]
    List,
    Chat,
    Compose,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::List => "list",
            Pane::Chat => "chat",
            Pane::Compose => "compose",
        }
    }
}

pub struct App {
    pub should_exit: bool,
    /// Set when the backend rejected the session.
    pub exit_error: Option<String>,
    pub view: ConversationView,
    pub list: ListState,
    pub chat: ChatState,
    pub active_pane: Pane,
    pub status: Option<Notice>,
    status_since: Option<Instant>,
    pub last_warning: Option<String>,
    /// Commands sent to the backend and not yet answered.
    pub in_flight: usize,
    pub backend_url: String,
    page_size: u32,
}

impl App {
    pub fn new(me: CurrentUser, page_size: u32, backend_url: String) -> Self {
        Self {
            should_exit: false,
            exit_error: None,
            view: ConversationView::new(me),
            list: ListState::default(),
            chat: ChatState::default(),
            active_pane: Pane::default(),
            status: None,
            status_since: None,
            last_warning: None,
            in_flight: 0,
            backend_url,
            page_size,
        }
    }

    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }

    fn set_status(&mut self, notice: Notice) {
        self.status = Some(notice);
        self.status_since = Some(Instant::now());
    }

    /// Move the view's notices to the status bar; an error outranks info.
    fn collect_notices(&mut self) {
        let notices = self.view.drain_notices();
        let pick = notices
            .iter()
            .rev()
            .find(|n| n.level == NoticeLevel::Error)
            .or_else(|| notices.last())
            .cloned();
        if let Some(notice) = pick {
            self.set_status(notice);
        }
        if self.view.signed_out() && self.exit_error.is_none() {
            self.exit_error = Some("Session expired; run `wacon login` again".to_string());
            self.should_exit = true;
        }
    }

    pub fn load_page(&self, page: u32) -> BackendCommand {
        BackendCommand::LoadConversations {
            page: page.max(1),
            page_size: self.page_size,
        }
    }

    /// Apply one completed backend command.
    pub fn apply(&mut self, resp: BackendResponse) {
        self.in_flight = self.in_flight.saturating_sub(1);
        for event in resp.events {
            self.view.apply(event);
        }
        self.list.clamp(self.view.conversations.len());
        if self.active_pane == Pane::Compose && !self.view.can_compose() {
            self.active_pane = Pane::Chat;
        }
        self.collect_notices();
    }

    /// Expire the status notice and pick up the latest captured warning.
    pub fn tick(&mut self, logs: &LogBuffer) {
        if self
            .status_since
            .is_some_and(|since| since.elapsed() >= NOTICE_TTL)
        {
            self.status = None;
            self.status_since = None;
        }
        if let Some(line) = logs.drain().into_iter().rev().find(|l| is_warning(l)) {
            self.last_warning = Some(line.trim().to_string());
        }
    }

    fn open_key(&mut self) -> Option<ViewKey> {
        let key = self.view.key();
        if key.is_none() {
            self.set_status(Notice::error("Open a conversation first"));
        }
        key
    }

    /// Handle a key press, returning the backend request it triggers.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return None;
        }
        let cmd = match self.active_pane {
            Pane::Compose => self.handle_compose_key(key),
            Pane::List | Pane::Chat => self.handle_nav_key(key),
        };
        self.collect_notices();
        cmd
    }

    fn handle_nav_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        let in_list = self.active_pane == Pane::List;
        match key.code {
            KeyCode::Char('q') => {
                self.should_exit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if in_list {
                    self.list.move_up();
                } else {
                    self.chat.scroll_up();
                }
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if in_list {
                    self.list.move_down(self.view.conversations.len());
                } else {
                    self.chat.scroll_down();
                }
                None
            }
            KeyCode::Enter if in_list => {
                let contact = self
                    .list
                    .selected_contact(&self.view.conversations)?
                    .to_string();
                let key = self.view.open(&contact);
                self.chat.reset();
                self.active_pane = Pane::Chat;
                Some(BackendCommand::Open { key })
            }
            KeyCode::Esc if !in_list => {
                self.view.close();
                self.active_pane = Pane::List;
                None
            }
            KeyCode::Tab => {
                if in_list {
                    if self.view.key().is_some() {
                        self.active_pane = Pane::Chat;
                    }
                } else {
                    self.focus_compose();
                }
                None
            }
            KeyCode::BackTab if !in_list => {
                self.active_pane = Pane::List;
                None
            }
            KeyCode::Char('a') => {
                let key = self.open_key()?;
                let agent_id = self.view.me().id.clone();
                Some(BackendCommand::Assign { key, agent_id })
            }
            KeyCode::Char('r') => {
                let key = self.open_key()?;
                Some(BackendCommand::Release { key })
            }
            KeyCode::Char('c') => {
                let key = self.open_key()?;
                let disable = !self.view.chatbot_disabled();
                Some(BackendCommand::ToggleChatbot { key, disable })
            }
            KeyCode::Char('g') => Some(self.load_page(self.view.current_page)),
            KeyCode::PageDown if self.view.current_page < self.view.total_pages => {
                Some(self.load_page(self.view.current_page + 1))
            }
            KeyCode::PageUp if self.view.current_page > 1 => {
                Some(self.load_page(self.view.current_page - 1))
            }
            _ => None,
        }
    }

    fn focus_compose(&mut self) {
        if self.view.can_compose() {
            self.active_pane = Pane::Compose;
        } else {
            self.set_status(Notice::error(
                "Assign this conversation to yourself before replying",
            ));
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => {
                self.active_pane = Pane::Chat;
                return None;
            }
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::ALT) => {
                return self.submit_compose();
            }
            _ => {}
        }

        let compose = &mut self.view.current_mut()?.compose;
        match key.code {
            KeyCode::Enter => compose.insert_newline(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                compose.set_text("")
            }
            KeyCode::Char(c) => compose.insert_char(c),
            KeyCode::Backspace => compose.backspace(),
            KeyCode::Delete => compose.delete(),
            KeyCode::Left => compose.move_left(),
            KeyCode::Right => compose.move_right(),
            KeyCode::Home => compose.move_home(),
            KeyCode::End => compose.move_end(),
            _ => {}
        }
        None
    }

    /// Run a `/command` or send the compose box.
    fn submit_compose(&mut self) -> Option<BackendCommand> {
        let open = self.view.current_mut()?;
        if let Some(result) = open.compose.apply_command() {
            match result {
                Ok(ComposeCommand::Attached(name)) => {
                    self.set_status(Notice::info(format!("Attached {}", name)))
                }
                Ok(ComposeCommand::Detached) => self.set_status(Notice::info("Attachment removed")),
                Err(e) => self.set_status(Notice::error(e.to_string())),
            }
            return None;
        }
        let (key, outgoing) = self.view.prepare_send().ok()?;
        Some(BackendCommand::Send { key, outgoing })
    }
}

/// Fixed-interval refresh of the open conversation.
struct PollTimer {
    key: Option<ViewKey>,
    interval: Option<Interval>,
    period: Duration,
}

impl PollTimer {
    fn new(period: Duration) -> Self {
        Self {
            key: None,
            interval: None,
            period,
        }
    }

    /// Restart the timer when a different conversation (or none) is open.
    fn follow(&mut self, key: Option<ViewKey>) {
        if self.key == key {
            return;
        }
        self.interval = key.as_ref().map(|_| {
            let mut interval = interval_at(tokio::time::Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        self.key = key;
    }

    async fn tick(&mut self) -> Option<ViewKey> {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.key.clone()
            }
            None => std::future::pending().await,
        }
    }
}

fn dispatch(app: &mut App, backend: &Backend, cmd: BackendCommand) {
    app.in_flight += 1;
    backend.send(cmd);
}

/// Run the TUI until the user quits or the session is rejected.
pub async fn run(logs: LogBuffer) -> Result<()> {
    let console = Console::open()?;
    let me = console.user()?;

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &console, me, &logs).await;
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    console: &Console,
    me: CurrentUser,
    logs: &LogBuffer,
) -> Result<()> {
    let api: Arc<dyn ConversationApi> = console.client.clone();
    let mut backend = Backend::start(api, console.config.history_page_size);
    let mut app = App::new(
        me,
        console.config.page_size,
        console.client.base_url().to_string(),
    );

    let first_page = app.load_page(1);
    dispatch(&mut app, &backend, first_page);

    let mut events = EventStream::new();
    let mut poll = PollTimer::new(console.config.poll_interval());
    let mut housekeeping = tokio::time::interval(TICK);

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &app))?;
        poll.follow(app.view.key());

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(cmd) = app.handle_key(key) {
                        dispatch(&mut app, &backend, cmd);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(resp) = backend.recv() => app.apply(resp),
            Some(key) = poll.tick() => dispatch(&mut app, &backend, BackendCommand::Poll { key }),
            _ = housekeeping.tick() => app.tick(logs),
        }
    }

    if let Some(message) = app.exit_error {
        bail!(message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Page;
    use crate::models::{Assignment, Conversation};
    use crate::sync::view::Action;
    use crate::sync::{AssignmentState, SyncEvent};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(convs: Vec<Conversation>) -> App {
        let me = CurrentUser {
            id: "7".into(),
            email: "agent@example.com".into(),
            ..Default::default()
        };
        let mut app = App::new(me, 20, "http://localhost:5000/api/".into());
        app.in_flight = 1;
        app.apply(BackendResponse {
            events: vec![SyncEvent::Conversations(Ok(Page::single(convs)))],
        });
        app
    }

    fn conv(number: &str) -> Conversation {
        Conversation {
            contact_number: number.into(),
            ..Default::default()
        }
    }

    fn mine(number: &str) -> Assignment {
        Assignment {
            contact_number: number.into(),
            agent_id: "7".into(),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_enter_opens_selected_conversation() {
        let mut app = app_with(vec![conv("+1"), conv("+2")]);
        app.handle_key(press(KeyCode::Down));
        let cmd = app.handle_key(press(KeyCode::Enter));
        match cmd {
            Some(BackendCommand::Open { key }) => assert_eq!(key.contact_number, "+2"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(app.active_pane, Pane::Chat);
    }

    #[test]
    fn test_compose_refused_until_assigned() {
        let mut app = app_with(vec![conv("+1")]);
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.active_pane, Pane::Chat);
        assert_eq!(app.status.as_ref().unwrap().level, NoticeLevel::Error);

        let cmd = app.handle_key(press(KeyCode::Char('a')));
        assert!(matches!(cmd, Some(BackendCommand::Assign { ref agent_id, .. }) if agent_id == "7"));
    }

    #[test]
    fn test_empty_enter_sends_nothing() {
        let mut app = app_with(vec![conv("+1")]);
        app.handle_key(press(KeyCode::Enter));
        let key = app.view.key().unwrap();
        app.apply(BackendResponse {
            events: vec![SyncEvent::Assignment {
                key,
                result: Ok(Some(mine("+1"))),
            }],
        });
        assert_eq!(app.view.assignment_state(), AssignmentState::AssignedToMe);

        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.active_pane, Pane::Compose);
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());

        for c in "hi".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        let cmd = app.handle_key(press(KeyCode::Enter));
        assert!(matches!(cmd, Some(BackendCommand::Send { ref outgoing, .. }) if outgoing.body == "hi"));
    }

    #[test]
    fn test_toggle_chatbot_uses_current_state() {
        let mut app = app_with(vec![conv("+1")]);
        app.handle_key(press(KeyCode::Enter));
        let key = app.view.key().unwrap();
        let mut a = mine("+1");
        a.disable_chatbot = true;
        app.apply(BackendResponse {
            events: vec![SyncEvent::Assignment {
                key,
                result: Ok(Some(a)),
            }],
        });
        let cmd = app.handle_key(press(KeyCode::Char('c')));
        assert!(matches!(
            cmd,
            Some(BackendCommand::ToggleChatbot { disable: false, .. })
        ));
    }

    #[test]
    fn test_toggle_chatbot_alternates_without_assignment() {
        let mut app = app_with(vec![conv("+1")]);
        app.handle_key(press(KeyCode::Enter));
        let first = app.handle_key(press(KeyCode::Char('c')));
        let key = match first {
            Some(BackendCommand::ToggleChatbot { key, disable: true }) => key,
            other => panic!("unexpected command: {:?}", other),
        };
        app.in_flight = 1;
        app.apply(BackendResponse {
            events: vec![
                SyncEvent::ActionDone {
                    key: key.clone(),
                    action: Action::ToggleChatbot { disable: true },
                    result: Ok(()),
                },
                SyncEvent::Assignment {
                    key,
                    result: Ok(None),
                },
            ],
        });
        let second = app.handle_key(press(KeyCode::Char('c')));
        assert!(matches!(
            second,
            Some(BackendCommand::ToggleChatbot { disable: false, .. })
        ));
    }

    #[test]
    fn test_escape_closes_conversation() {
        let mut app = app_with(vec![conv("+1")]);
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Esc));
        assert!(app.view.key().is_none());
        assert_eq!(app.active_pane, Pane::List);
        assert!(app.handle_key(press(KeyCode::Char('r'))).is_none());
    }

    #[test]
    fn test_unauthorized_response_exits() {
        let mut app = app_with(vec![]);
        app.apply(BackendResponse {
            events: vec![SyncEvent::Conversations(Err(crate::api::ApiError::Unauthorized))],
        });
        assert!(app.should_exit);
        assert!(app.exit_error.is_some());
    }

    #[tokio::test]
    async fn test_poll_timer_follows_open_conversation() {
        let mut timer = PollTimer::new(Duration::from_millis(10));
        assert!(timer.interval.is_none());
        timer.follow(Some(ViewKey::detached("+1")));
        let key = timer.tick().await.unwrap();
        assert_eq!(key.contact_number, "+1");
        timer.follow(None);
        assert!(timer.interval.is_none());
    }
}
