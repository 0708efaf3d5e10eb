//! CLI command handlers
//!
//! Each submodule owns one command group: its clap subcommand enum, the
//! handler that calls the facade, and the plain-text rendering of results.

pub mod assignments;
pub mod campaigns;
pub mod chatbot;
pub mod contacts;
pub mod messaging;
pub mod session;
pub mod templates;

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::api::{ApiClient, ApiError, Page};
use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::CurrentUser;
use crate::sync::{ConversationView, NoticeLevel};

/// Loaded configuration plus a client bound to the stored session.
pub struct Console {
    pub config: Config,
    pub client: Arc<ApiClient>,
}

impl Console {
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let session = Arc::new(SessionStore::open_default()?);
        let client = Arc::new(ApiClient::new(&config, session)?);
        Ok(Self { config, client })
    }

    /// Signed-in user, or an error telling the operator to log in.
    pub fn user(&self) -> Result<CurrentUser> {
        match self.client.session().current_user() {
            Some(user) if self.client.session().is_signed_in() => Ok(user),
            _ => Err(ApiError::NotSignedIn.into()),
        }
    }

    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.page_size).max(1)
    }
}

/// Print the view's pending notices; fail if any of them is an error.
pub fn report(view: &mut ConversationView) -> Result<()> {
    let mut failure = None;
    for notice in view.drain_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.text),
            NoticeLevel::Error => {
                eprintln!("error: {}", notice.text);
                failure.get_or_insert(notice.text);
            }
        }
    }
    if view.signed_out() {
        bail!("Session expired; run `wacon login` again");
    }
    match failure {
        Some(text) => bail!(text),
        None => Ok(()),
    }
}

/// One-line paging summary printed under list output.
pub fn page_footer<T>(page: &Page<T>) -> String {
    let total_pages = page.total_pages.max(1);
    format!(
        "Page {} of {} ({} total)",
        page.current_page.max(1),
        total_pages,
        page.total_count
    )
}

pub(crate) fn print_rows(title: &str, rows: &[String]) {
    println!("\n{}:", title);
    println!("{:-<60}", "");
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    for row in rows {
        println!("{}", row);
    }
}

/// Treat empty strings from optional flags as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrentUser;
    use crate::sync::Notice;

    #[test]
    fn test_page_footer() {
        let page = Page {
            data: vec![1, 2],
            current_page: 2,
            page_size: 2,
            total_pages: 5,
            total_count: 10,
        };
        assert_eq!(page_footer(&page), "Page 2 of 5 (10 total)");
        assert_eq!(page_footer(&Page::<u8>::single(vec![])), "Page 1 of 1 (0 total)");
    }

    #[test]
    fn test_report_fails_on_error_notice() {
        let mut view = ConversationView::new(CurrentUser::default());
        view.notify(Notice::info("ok"));
        assert!(report(&mut view).is_ok());
        view.notify(Notice::error("Failed to assign conversation: rejected"));
        let err = report(&mut view).unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("x".into())).as_deref(), Some("x"));
    }
}
