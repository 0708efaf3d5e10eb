//! `wacon chatbot ...`

use anyhow::Result;
use clap::Subcommand;

use super::{non_empty, page_footer, print_rows, Console};
use crate::api::chatbot;
use crate::models::{ChatbotRule, ChatbotRuleForm, ChatbotTest};

#[derive(Subcommand)]
pub enum ChatbotCommand {
    /// List auto-reply rules
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one rule
    Show { id: u64 },

    /// Create a rule
    Add {
        name: String,

        /// Trigger keyword
        #[arg(short, long)]
        keyword: String,

        /// Reply text
        #[arg(short, long)]
        response: String,

        /// Contains, Exact, StartsWith or Regex
        #[arg(short, long, default_value = "Contains")]
        match_type: String,

        /// Higher priority rules are evaluated first
        #[arg(short, long, default_value = "0")]
        priority: i32,

        /// Create the rule disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Update a rule; omitted fields keep their current value
    Update {
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        keyword: Option<String>,

        #[arg(short, long)]
        response: Option<String>,

        #[arg(short, long)]
        match_type: Option<String>,

        #[arg(short, long)]
        priority: Option<i32>,
    },

    /// Delete a rule
    Delete { id: u64 },

    /// Enable or disable a rule
    Toggle { id: u64 },

    /// Show which rule (if any) would answer a message
    Test {
        message: String,

        #[arg(long)]
        phone: Option<String>,
    },
}

pub fn rule_row(r: &ChatbotRule) -> String {
    let state = if r.is_active { "active" } else { "inactive" };
    format!(
        "{:>6}  {:<24} {:<10} \"{}\" (priority {}, {})",
        r.id, r.name, r.match_type, r.keyword, r.priority, state
    )
}

pub async fn run(cmd: ChatbotCommand) -> Result<()> {
    let console = Console::open()?;
    let client = &console.client;

    match cmd {
        ChatbotCommand::List { page, page_size } => {
            let result = chatbot::list(client, page, console.page_size(page_size)).await?;
            let rows: Vec<String> = result.data.iter().map(rule_row).collect();
            print_rows("Chatbot rules", &rows);
            println!("{}", page_footer(&result));
        }
        ChatbotCommand::Show { id } => {
            let rule = chatbot::get(client, id).await?;
            println!("{}", rule_row(&rule));
            println!("\n{}", rule.response);
        }
        ChatbotCommand::Add {
            name,
            keyword,
            response,
            match_type,
            priority,
            inactive,
        } => {
            let form = ChatbotRuleForm {
                name,
                keyword,
                match_type,
                response,
                priority,
                is_active: !inactive,
            };
            chatbot::create(client, &form).await?;
            println!("Created rule {}", form.name);
        }
        ChatbotCommand::Update {
            id,
            name,
            keyword,
            response,
            match_type,
            priority,
        } => {
            let current = chatbot::get(client, id).await?;
            let form = ChatbotRuleForm {
                name: name.unwrap_or(current.name),
                keyword: keyword.unwrap_or(current.keyword),
                match_type: match_type.unwrap_or(current.match_type),
                response: response.unwrap_or(current.response),
                priority: priority.unwrap_or(current.priority),
                is_active: current.is_active,
            };
            chatbot::update(client, id, &form).await?;
            println!("Updated rule {}", id);
        }
        ChatbotCommand::Delete { id } => {
            chatbot::delete(client, id).await?;
            println!("Deleted rule {}", id);
        }
        ChatbotCommand::Toggle { id } => {
            chatbot::toggle_status(client, id).await?;
            let rule = chatbot::get(client, id).await?;
            println!("{}", rule_row(&rule));
        }
        ChatbotCommand::Test { message, phone } => {
            let test = ChatbotTest {
                message,
                phone_number: non_empty(phone),
            };
            let result = chatbot::test(client, &test).await?;
            if result.matched {
                println!(
                    "Matched rule: {}",
                    result.rule_name.as_deref().unwrap_or("(unnamed)")
                );
                if let Some(reply) = &result.response {
                    println!("Reply: {}", reply);
                }
            } else {
                println!("No rule matched");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_row() {
        let r = ChatbotRule {
            id: 9,
            name: "Hours".into(),
            keyword: "open".into(),
            match_type: "Contains".into(),
            is_active: false,
            ..Default::default()
        };
        let row = rule_row(&r);
        assert!(row.contains("\"open\""));
        assert!(row.ends_with("inactive)"));
    }
}
