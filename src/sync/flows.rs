//! Request flows of the live-chat screen.
//!
//! Each flow issues its calls in order and returns the resulting events.
//! Mutations are confirmed by a re-fetch; nothing is retried.

use super::compose::OutgoingMessage;
use super::view::{Action, SyncEvent, ViewKey};
use super::ConversationApi;
use crate::models::AssignRequest;

pub async fn load_conversations<A: ConversationApi + ?Sized>(
    api: &A,
    page: u32,
    page_size: u32,
) -> SyncEvent {
    SyncEvent::Conversations(api.conversations(page, page_size).await)
}

pub async fn refresh_history<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    page_size: u32,
    silent: bool,
) -> SyncEvent {
    let result = api.history(&key.contact_number, page_size).await;
    SyncEvent::History {
        key,
        silent,
        result,
    }
}

pub async fn refresh_assignment<A: ConversationApi + ?Sized>(api: &A, key: ViewKey) -> SyncEvent {
    let result = api.assignment(&key.contact_number).await;
    SyncEvent::Assignment { key, result }
}

/// First load after opening a conversation. History failures are reported.
pub async fn open<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    page_size: u32,
) -> Vec<SyncEvent> {
    vec![
        refresh_history(api, key.clone(), page_size, false).await,
        refresh_assignment(api, key).await,
    ]
}

/// Timer tick while a conversation is open. Failures stay silent.
pub async fn poll<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    page_size: u32,
) -> Vec<SyncEvent> {
    vec![
        refresh_history(api, key.clone(), page_size, true).await,
        refresh_assignment(api, key).await,
    ]
}

async fn confirm<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    action: Action,
    result: crate::api::error::ApiResult<()>,
) -> Vec<SyncEvent> {
    let ok = result.is_ok();
    let mut events = vec![SyncEvent::ActionDone {
        key: key.clone(),
        action,
        result,
    }];
    if ok {
        events.push(refresh_assignment(api, key).await);
    }
    events
}

pub async fn assign_to_self<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    agent_id: &str,
) -> Vec<SyncEvent> {
    let req = AssignRequest {
        contact_number: key.contact_number.clone(),
        agent_id: agent_id.to_string(),
        disable_chatbot: true,
        mark_as_read: true,
    };
    let result = api.assign(&req).await;
    confirm(api, key, Action::Assign, result).await
}

pub async fn release<A: ConversationApi + ?Sized>(api: &A, key: ViewKey) -> Vec<SyncEvent> {
    let result = api.release(&key.contact_number).await;
    confirm(api, key, Action::Release, result).await
}

pub async fn toggle_chatbot<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    disable: bool,
) -> Vec<SyncEvent> {
    let result = api.toggle_chatbot(&key.contact_number, disable).await;
    confirm(api, key, Action::ToggleChatbot { disable }, result).await
}

/// Send, then re-fetch history once the backend has accepted the message.
pub async fn send<A: ConversationApi + ?Sized>(
    api: &A,
    key: ViewKey,
    outgoing: OutgoingMessage,
    page_size: u32,
) -> Vec<SyncEvent> {
    let to = key.contact_number.as_str();
    let result = match &outgoing.file {
        Some(file) => api.send_media(to, &outgoing.body, file).await,
        None => api.send_text(to, &outgoing.body).await,
    };
    let ok = result.is_ok();
    let mut events = vec![SyncEvent::Sent {
        key: key.clone(),
        result,
    }];
    if ok {
        events.push(refresh_history(api, key, page_size, true).await);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::FakeApi;
    use tokio_test::block_on;

    #[test]
    fn test_failed_mutation_skips_refetch() {
        let api = FakeApi::default();
        *api.fail_mutations.lock().unwrap() = true;
        let events = block_on(release(&api, ViewKey::detached("+1")));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SyncEvent::ActionDone {
                action: Action::Release,
                result: Err(_),
                ..
            }
        ));
        assert_eq!(api.calls(), vec!["release +1"]);
    }

    #[test]
    fn test_assign_then_confirms_assignment() {
        let api = FakeApi::default();
        let events = block_on(assign_to_self(&api, ViewKey::detached("+1"), "7"));
        assert_eq!(
            api.calls(),
            vec!["assign +1 7 disable=true read=true", "assignment +1"]
        );
        match &events[1] {
            SyncEvent::Assignment { result: Ok(Some(a)), .. } => assert_eq!(a.agent_id, "7"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_send_refetches_history_silently() {
        let api = FakeApi::default();
        let outgoing = OutgoingMessage::new("  hello ", None).unwrap();
        let events = block_on(send(&api, ViewKey::detached("+1"), outgoing, 50));
        assert_eq!(api.calls(), vec!["send +1 hello", "history +1"]);
        assert!(matches!(
            &events[1],
            SyncEvent::History { silent: true, result: Ok(m), .. } if m.len() == 1
        ));
    }

    #[test]
    fn test_poll_reads_history_then_assignment() {
        let api = FakeApi::default();
        let events = block_on(poll(&api, ViewKey::detached("+1"), 50));
        assert_eq!(api.calls(), vec!["history +1", "assignment +1"]);
        assert!(matches!(&events[0], SyncEvent::History { silent: true, .. }));
    }
}
