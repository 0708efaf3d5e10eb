//! Sending, history and the conversation list

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};

use super::{page_footer, print_rows, report, Console};
use crate::api::{whatsapp, MediaFile};
use crate::models::{parse_variables, short_time, Conversation, Direction, Message, TemplateSend};
use crate::sync::Synchronizer;

/// `[time] >> body` for outbound, `[time] << body` for inbound.
pub fn message_line(m: &Message) -> String {
    let arrow = match m.direction {
        Direction::Inbound => "<<",
        Direction::Outbound => ">>",
    };
    let mut line = format!("[{}] {} {}", short_time(&m.timestamp), arrow, m.body);
    if let Some(url) = &m.media_url {
        line.push_str(&format!(" ({})", url));
    }
    if m.is_automated_response {
        line.push_str(" [bot]");
    }
    line
}

pub fn conversation_row(c: &Conversation) -> String {
    let unread = if c.unread_count > 0 {
        format!("({}) ", c.unread_count)
    } else {
        String::new()
    };
    let owner = match (&c.assigned_agent_name, &c.assigned_agent_id) {
        _ if !c.is_assigned => "unassigned".to_string(),
        (Some(name), _) => format!("agent {}", name),
        (None, Some(id)) => format!("agent {}", id),
        (None, None) => "assigned".to_string(),
    };
    let when = c
        .last_message_time
        .as_deref()
        .map(short_time)
        .unwrap_or_default();
    format!(
        "{}{:<24} {:<18} {:<16} {}\n    {}",
        unread,
        c.display_name(),
        c.contact_number,
        owner,
        when,
        c.last_message.trim()
    )
}

fn message_key(m: &Message) -> String {
    match &m.id {
        Some(id) => id.clone(),
        None => format!("{}|{}", m.timestamp, m.body),
    }
}

pub async fn send(to: String, message: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let console = Console::open()?;
    let me = console.user()?;
    let file = file.map(MediaFile::new).transpose()?;
    let body = message.unwrap_or_default();

    let mut sync = Synchronizer::new(console.client.clone(), me, console.config.history_page_size);
    sync.send_message(&to, &body, file).await?;
    report(sync.view_mut())
}

pub async fn send_template(to: String, content_sid: String, vars: Vec<String>) -> Result<()> {
    let console = Console::open()?;
    let send = TemplateSend {
        to,
        content_sid,
        content_variables: parse_variables(&vars)?,
    };
    whatsapp::send_template(&console.client, &send).await?;
    println!("Template sent to {}", send.to);
    Ok(())
}

pub async fn conversations(page: u32, page_size: Option<u32>) -> Result<()> {
    let console = Console::open()?;
    let result =
        whatsapp::conversations(&console.client, page, console.page_size(page_size)).await?;
    let rows: Vec<String> = result.data.iter().map(conversation_row).collect();
    print_rows("Conversations", &rows);
    println!("{}", page_footer(&result));
    Ok(())
}

pub async fn history(contact: String, limit: Option<u32>, follow: bool) -> Result<()> {
    let console = Console::open()?;
    let limit = limit.unwrap_or(console.config.history_page_size).max(1);

    if !follow {
        let mut messages = whatsapp::history(&console.client, &contact, 1, limit).await?;
        messages.reverse();
        if messages.is_empty() {
            println!("(no messages)");
        }
        for m in &messages {
            println!("{}", message_line(m));
        }
        return Ok(());
    }

    let me = console.user()?;
    let mut sync = Synchronizer::new(console.client.clone(), me, limit);
    sync.open(&contact).await;
    report(sync.view_mut())?;

    let mut seen = HashSet::new();
    let mut interval = tokio::time::interval(console.config.poll_interval());
    interval.tick().await;
    tracing::info!(
        "Following {} every {}s (Ctrl-C to stop)",
        contact,
        console.config.poll_interval_secs
    );

    loop {
        if let Some(open) = sync.view().current() {
            for m in &open.messages {
                if seen.insert(message_key(m)) {
                    println!("{}", message_line(m));
                }
            }
        }
        tokio::select! {
            _ = interval.tick() => {
                sync.poll_refresh().await;
                if sync.view().signed_out() {
                    bail!("Session expired; run `wacon login` again");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                sync.close();
                return Ok(());
            }
        }
    }
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
            timestamp: "2024-03-01T09:15:00Z".into(),
            is_automated_response: false,
            status: None,
        }
    }

    #[test]
    fn test_message_line_direction() {
        assert_eq!(
            message_line(&msg(Direction::Inbound, "hi")),
            "[2024-03-01 09:15] << hi"
        );
        let mut out = msg(Direction::Outbound, "hello");
        out.is_automated_response = true;
        assert!(message_line(&out).ends_with(">> hello [bot]"));
    }

    #[test]
    fn test_conversation_row_owner() {
        let mut c = Conversation {
            contact_number: "+1555".into(),
            contact_name: Some("Ada".into()),
            unread_count: 2,
            last_message: "Is it open?".into(),
            ..Default::default()
        };
        let row = conversation_row(&c);
        assert!(row.starts_with("(2) Ada"));
        assert!(row.contains("unassigned"));

        c.is_assigned = true;
        c.assigned_agent_id = Some("7".into());
        assert!(conversation_row(&c).contains("agent 7"));
    }

    #[test]
    fn test_message_key_prefers_id() {
        let mut m = msg(Direction::Inbound, "x");
        assert_eq!(message_key(&m), "2024-03-01T09:15:00Z|x");
        m.id = Some("42".into());
        assert_eq!(message_key(&m), "42");
    }
}
