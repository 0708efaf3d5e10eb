//! `wacon templates ...`

use anyhow::Result;
use clap::Subcommand;

use super::{non_empty, page_footer, print_rows, Console};
use crate::api::templates;
use crate::models::{parse_variables, Template, TemplateForm, TemplateTest};

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List message templates
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one template
    Show { id: u64 },

    /// Register a provider template
    Add {
        name: String,

        /// Provider content SID (HX...)
        #[arg(long)]
        content_sid: String,

        /// Body text with {{1}} style placeholders
        #[arg(short, long)]
        body: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Update a template; omitted fields keep their current value
    Update {
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        content_sid: Option<String>,

        #[arg(short, long)]
        body: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Delete a template
    Delete { id: u64 },

    /// Mark a template approved
    Approve { id: u64 },

    /// Withdraw approval
    Reject { id: u64 },

    /// Send a template to a test number
    Test {
        #[arg(long)]
        content_sid: String,

        /// Recipient phone number
        #[arg(long)]
        to: String,

        /// Template variable as key=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },
}

pub fn template_row(t: &Template) -> String {
    let approval = if t.is_approved { "approved" } else { "pending" };
    format!(
        "{:>6}  {:<28} {:<36} {}",
        t.id, t.name, t.content_sid, approval
    )
}

fn print_template(t: &Template) {
    println!("ID: {}", t.id);
    println!("Name: {}", t.name);
    println!("Content SID: {}", t.content_sid);
    if let Some(category) = &t.category {
        println!("Category: {}", category);
    }
    if let Some(language) = &t.language {
        println!("Language: {}", language);
    }
    println!("Approved: {}", if t.is_approved { "yes" } else { "no" });
    if let Some(body) = &t.body {
        println!("\n{}", body);
    }
}

pub async fn run(cmd: TemplateCommand) -> Result<()> {
    let console = Console::open()?;
    let client = &console.client;

    match cmd {
        TemplateCommand::List {
            page,
            page_size,
            search,
        } => {
            let search = non_empty(search);
            let result =
                templates::list(client, page, console.page_size(page_size), search.as_deref())
                    .await?;
            let rows: Vec<String> = result.data.iter().map(template_row).collect();
            print_rows("Templates", &rows);
            println!("{}", page_footer(&result));
        }
        TemplateCommand::Show { id } => {
            print_template(&templates::get(client, id).await?);
        }
        TemplateCommand::Add {
            name,
            content_sid,
            body,
            category,
            language,
        } => {
            let form = TemplateForm {
                name,
                content_sid,
                body: non_empty(body),
                category: non_empty(category),
                language: non_empty(language),
            };
            templates::create(client, &form).await?;
            println!("Created template {}", form.name);
        }
        TemplateCommand::Update {
            id,
            name,
            content_sid,
            body,
            category,
            language,
        } => {
            let current = templates::get(client, id).await?;
            let form = TemplateForm {
                name: name.unwrap_or(current.name),
                content_sid: content_sid.unwrap_or(current.content_sid),
                body: non_empty(body).or(current.body),
                category: non_empty(category).or(current.category),
                language: non_empty(language).or(current.language),
            };
            templates::update(client, id, &form).await?;
            println!("Updated template {}", id);
        }
        TemplateCommand::Delete { id } => {
            templates::delete(client, id).await?;
            println!("Deleted template {}", id);
        }
        TemplateCommand::Approve { id } => {
            templates::set_approval(client, id, true).await?;
            println!("Template {} approved", id);
        }
        TemplateCommand::Reject { id } => {
            templates::set_approval(client, id, false).await?;
            println!("Template {} marked pending", id);
        }
        TemplateCommand::Test {
            content_sid,
            to,
            vars,
        } => {
            let test = TemplateTest {
                content_sid,
                phone_number: to,
                content_variables: parse_variables(&vars)?,
            };
            templates::send_test(client, &test).await?;
            println!("Test message sent to {}", test.phone_number);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_row_shows_approval() {
        let t = Template {
            id: 3,
            name: "order_update".into(),
            content_sid: "HX123".into(),
            is_approved: true,
            ..Default::default()
        };
        let row = template_row(&t);
        assert!(row.contains("order_update"));
        assert!(row.contains("HX123"));
        assert!(row.ends_with("approved"));
    }
}
