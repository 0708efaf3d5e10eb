//! `wacon assignments ...`

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use super::{print_rows, report, Console};
use crate::api::assignment;
use crate::models::{short_time, Assignment};
use crate::sync::Synchronizer;

#[derive(Clone, Copy, ValueEnum)]
pub enum ChatbotSwitch {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum AssignmentCommand {
    /// Every active assignment
    Active,

    /// Conversations assigned to you
    Mine,

    /// Current assignment of one conversation
    Show { contact: String },

    /// Assign a conversation to yourself (disables the chatbot)
    Take { contact: String },

    /// Release a conversation you hold
    Release { contact: String },

    /// Turn automated replies on or off for a conversation
    Chatbot {
        contact: String,

        #[arg(value_enum)]
        state: ChatbotSwitch,
    },

    /// Record activity on a conversation you hold
    Touch { contact: String },
}

pub fn assignment_row(a: &Assignment) -> String {
    let agent = a.agent_name.as_deref().unwrap_or(a.agent_id.as_str());
    let bot = if a.disable_chatbot { "bot off" } else { "bot on" };
    let since = a
        .assigned_at
        .as_deref()
        .map(short_time)
        .unwrap_or_default();
    format!("{:<18} {:<20} {:<8} {}", a.contact_number, agent, bot, since)
}

pub async fn run(cmd: AssignmentCommand) -> Result<()> {
    let console = Console::open()?;
    let client = &console.client;

    match cmd {
        AssignmentCommand::Active => {
            let rows: Vec<String> = assignment::active(client)
                .await?
                .iter()
                .map(assignment_row)
                .collect();
            print_rows("Active assignments", &rows);
        }
        AssignmentCommand::Mine => {
            let rows: Vec<String> = assignment::my_assignments(client)
                .await?
                .iter()
                .map(assignment_row)
                .collect();
            print_rows("My assignments", &rows);
        }
        AssignmentCommand::Show { contact } => match assignment::get(client, &contact).await? {
            Some(a) if a.is_active => println!("{}", assignment_row(&a)),
            _ => println!("{} is unassigned", contact),
        },
        AssignmentCommand::Take { contact } => {
            let mut sync = Synchronizer::new(
                client.clone(),
                console.user()?,
                console.config.history_page_size,
            );
            sync.assign_to_self(&contact).await;
            report(sync.view_mut())?;
            println!("{}: {}", contact, sync.view().assignment_state().describe());
        }
        AssignmentCommand::Release { contact } => {
            let mut sync = Synchronizer::new(
                client.clone(),
                console.user()?,
                console.config.history_page_size,
            );
            sync.release(&contact).await;
            report(sync.view_mut())?;
        }
        AssignmentCommand::Chatbot { contact, state } => {
            let mut sync = Synchronizer::new(
                client.clone(),
                console.user()?,
                console.config.history_page_size,
            );
            let disable = matches!(state, ChatbotSwitch::Off);
            sync.toggle_chatbot(&contact, disable).await;
            report(sync.view_mut())?;
        }
        AssignmentCommand::Touch { contact } => {
            assignment::update_activity(client, &contact).await?;
            println!("Activity recorded for {}", contact);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_row_prefers_agent_name() {
        let mut a = Assignment {
            contact_number: "+1555".into(),
            agent_id: "7".into(),
            disable_chatbot: true,
            is_active: true,
            ..Default::default()
        };
        assert!(assignment_row(&a).contains(" 7 "));
        a.agent_name = Some("Grace".into());
        let row = assignment_row(&a);
        assert!(row.contains("Grace"));
        assert!(row.contains("bot off"));
    }
}
