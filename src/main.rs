//! wacon - terminal console for a WhatsApp business-messaging backend
//!
//! Agents sign in, work the shared conversation inbox, and manage contacts,
//! templates, campaigns and chatbot rules from the command line or a TUI.

mod api;
mod auth;
mod commands;
mod config;
mod forms;
mod models;
mod sync;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::assignments::AssignmentCommand;
use commands::campaigns::CampaignCommand;
use commands::chatbot::ChatbotCommand;
use commands::contacts::ContactCommand;
use commands::session::{AccountArgs, ConfigArgs, LoginArgs};
use commands::templates::TemplateCommand;

#[derive(Parser)]
#[command(name = "wacon")]
#[command(about = "Terminal console for WhatsApp business messaging", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login(LoginArgs),

    /// Create a user account (admin only)
    Register {
        #[command(flatten)]
        account: AccountArgs,

        /// Role for the new account
        #[arg(long)]
        role: Option<String>,
    },

    /// Create the first administrator on a fresh backend
    Init(AccountArgs),

    /// Clear the stored session
    Logout,

    /// Show current session status
    Status,

    /// Show the signed-in user as seen by the backend
    Whoami,

    /// Check that the backend is reachable
    Health,

    /// Show or update local settings
    Config(ConfigArgs),

    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommand,
    },

    /// Manage message templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Manage broadcast campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommand,
    },

    /// Manage chatbot auto-reply rules
    Chatbot {
        #[command(subcommand)]
        command: ChatbotCommand,
    },

    /// Send a text or media message to a contact you are assigned to
    Send {
        /// Recipient phone number
        #[arg(short, long)]
        to: String,

        /// Message text (optional when attaching a file)
        message: Option<String>,

        /// Attach a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Send an approved template message
    SendTemplate {
        /// Recipient phone number
        #[arg(short, long)]
        to: String,

        /// Provider content SID of the template
        content_sid: String,

        /// Template variable as key=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// List conversations in the shared inbox
    Conversations {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show the message history of a conversation
    History {
        /// Contact phone number
        contact: String,

        /// Maximum number of messages to show
        #[arg(short, long)]
        limit: Option<u32>,

        /// Keep polling and print new messages
        #[arg(short, long)]
        follow: bool,
    },

    /// Conversation assignments and chatbot control
    Assignments {
        #[command(subcommand)]
        command: AssignmentCommand,
    },

    /// Launch the terminal user interface
    Tui,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        || tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Commands::Tui = cli.command {
        // The alternate screen owns the terminal; capture log lines instead.
        let logs = tui::log_capture::LogBuffer::new();
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(logs.clone()),
            )
            .init();
        return tui::run(logs).await;
    }

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    run(cli.command).await
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => commands::session::login(args).await?,
        Commands::Register { account, role } => commands::session::register(account, role).await?,
        Commands::Init(args) => commands::session::initialize(args).await?,
        Commands::Logout => commands::session::logout().await?,
        Commands::Status => commands::session::status().await?,
        Commands::Whoami => commands::session::whoami().await?,
        Commands::Health => commands::session::health().await?,
        Commands::Config(args) => commands::session::configure(args)?,
        Commands::Contacts { command } => commands::contacts::run(command).await?,
        Commands::Templates { command } => commands::templates::run(command).await?,
        Commands::Campaigns { command } => commands::campaigns::run(command).await?,
        Commands::Chatbot { command } => commands::chatbot::run(command).await?,
        Commands::Send { to, message, file } => {
            tracing::debug!("Sending message to {}", to);
            commands::messaging::send(to, message, file).await?;
        }
        Commands::SendTemplate {
            to,
            content_sid,
            vars,
        } => commands::messaging::send_template(to, content_sid, vars).await?,
        Commands::Conversations { page, page_size } => {
            commands::messaging::conversations(page, page_size).await?
        }
        Commands::History {
            contact,
            limit,
            follow,
        } => commands::messaging::history(contact, limit, follow).await?,
        Commands::Assignments { command } => commands::assignments::run(command).await?,
        Commands::Tui => tui::run(tui::log_capture::LogBuffer::new()).await?,
    }

    Ok(())
}
