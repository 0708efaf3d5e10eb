//! Sign-in, account bootstrap and connectivity commands

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use super::{non_empty, Console};
use crate::api::{self, ApiClient};
use crate::config::Config;
use crate::models::{CurrentUser, LoginRequest, RegisterRequest};

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(short, long, env = "WACON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct AccountArgs {
    #[arg(short, long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(short, long, env = "WACON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Branch the account belongs to
    #[arg(long)]
    pub branch: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Set the backend base URL (including the /api prefix)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Set the polling interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Set the default list page size
    #[arg(long)]
    pub page_size: Option<u32>,
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(p) = given {
        return Ok(p);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn describe_user(user: &CurrentUser) -> String {
    match &user.branch {
        Some(branch) => format!("{} ({}, {})", user.email, user.role, branch),
        None => format!("{} ({})", user.email, user.role),
    }
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let console = Console::open()?;
    let req = LoginRequest {
        email: args.email,
        password: read_password(args.password)?,
    };
    let user = api::auth::login(&console.client, &req).await?;
    println!("Signed in as {}", describe_user(&user));
    Ok(())
}

fn account_request(args: AccountArgs, role: Option<String>) -> Result<RegisterRequest> {
    Ok(RegisterRequest {
        email: args.email,
        password: read_password(args.password)?,
        first_name: non_empty(args.first_name),
        last_name: non_empty(args.last_name),
        role,
        branch: non_empty(args.branch),
    })
}

pub async fn register(args: AccountArgs, role: Option<String>) -> Result<()> {
    let console = Console::open()?;
    let req = account_request(args, non_empty(role))?;
    let message = api::auth::register(&console.client, &req).await?;
    println!("{}", message.unwrap_or_else(|| format!("Registered {}", req.email)));
    Ok(())
}

pub async fn initialize(args: AccountArgs) -> Result<()> {
    let console = Console::open()?;
    let req = account_request(args, Some("Admin".to_string()))?;
    let message = api::auth::initialize(&console.client, &req).await?;
    println!(
        "{}",
        message.unwrap_or_else(|| format!("Created administrator {}", req.email))
    );
    Ok(())
}

pub async fn logout() -> Result<()> {
    let console = Console::open()?;
    console.client.session().logout()?;
    println!("Signed out");
    Ok(())
}

pub async fn status() -> Result<()> {
    let console = Console::open()?;
    let session = console.client.session();
    println!("Backend: {}", console.client.base_url());
    match (session.stored_token(), session.current_user()) {
        (Some(token), Some(user)) => {
            println!("User: {}", describe_user(&user));
            let expiry = token
                .expires_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "no expiry".to_string());
            if token.is_expired() {
                println!("Token: expired ({})", expiry);
            } else {
                println!("Token: valid until {}", expiry);
            }
        }
        _ => println!("Not signed in"),
    }
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let console = Console::open()?;
    let user = console.user()?;
    println!("ID: {}", user.id);
    println!("Email: {}", user.email);
    println!("Role: {}", user.role);
    if let Some(branch) = &user.branch {
        println!("Branch: {}", branch);
    }
    if user.is_admin() {
        println!("Administrator: yes");
    }
    Ok(())
}

pub async fn health() -> Result<()> {
    let client = ApiClient::from_env()?;
    let body = api::whatsapp::health(&client).await?;
    match body {
        serde_json::Value::String(s) => println!("{}", s),
        serde_json::Value::Null => println!("OK"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}

/// Show or update `config.toml`.
pub fn configure(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load()?;
    let changed = args.api_url.is_some() || args.poll_interval.is_some() || args.page_size.is_some();
    if let Some(url) = args.api_url {
        config.api_base_url = url;
        config.api_base()?;
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs.max(1);
    }
    if let Some(size) = args.page_size {
        config.page_size = size.max(1);
    }
    if changed {
        config.save()?;
        println!("Configuration saved");
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_user() {
        let mut user = CurrentUser {
            id: "1".into(),
            email: "a@b.c".into(),
            role: "Admin".into(),
            branch: None,
        };
        assert_eq!(describe_user(&user), "a@b.c (Admin)");
        user.branch = Some("Lagos".into());
        assert_eq!(describe_user(&user), "a@b.c (Admin, Lagos)");
    }

    #[test]
    fn test_given_password_is_used_verbatim() {
        assert_eq!(read_password(Some(" p ".into())).unwrap(), " p ");
    }
}
