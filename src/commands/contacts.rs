//! `wacon contacts ...`

use anyhow::Result;
use clap::Subcommand;

use super::{non_empty, page_footer, print_rows, Console};
use crate::api::contacts;
use crate::models::{Contact, ContactForm, ContactQuery};

#[derive(Subcommand)]
pub enum ContactCommand {
    /// List contacts
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,

        /// Match name or phone number
        #[arg(short, long)]
        search: Option<String>,

        /// Only contacts carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Filter by opt-in status (true/false)
        #[arg(long)]
        opted_in: Option<bool>,
    },

    /// Show one contact
    Show { id: u64 },

    /// Create a contact
    Add {
        /// Phone number in international format
        phone: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Record that the contact has opted in
        #[arg(long)]
        opted_in: bool,
    },

    /// Update a contact; omitted fields keep their current value
    Update {
        id: u64,

        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Replace tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        opted_in: Option<bool>,
    },

    /// Delete a contact
    Delete { id: u64 },

    /// List every tag in use
    Tags,

    /// Create contacts from invoice records
    Import,
}

/// One list row: id, phone, name, tags and the opt-in badge.
pub fn contact_row(c: &Contact) -> String {
    let mut row = format!(
        "{:>6}  {:<18} {:<24} [{}]",
        c.id,
        c.phone_number,
        c.name.as_deref().unwrap_or("-"),
        c.opt_in_badge()
    );
    if !c.tags.is_empty() {
        row.push_str("  #");
        row.push_str(&c.tags.join(" #"));
    }
    row
}

fn print_contact(c: &Contact) {
    println!("ID: {}", c.id);
    println!("Phone: {}", c.phone_number);
    if let Some(name) = &c.name {
        println!("Name: {}", name);
    }
    if let Some(email) = &c.email {
        println!("Email: {}", email);
    }
    if !c.tags.is_empty() {
        println!("Tags: {}", c.tags.join(", "));
    }
    println!("Status: {}", c.opt_in_badge());
    if let Some(created) = &c.created_at {
        println!("Created: {}", crate::models::short_time(created));
    }
}

pub async fn run(cmd: ContactCommand) -> Result<()> {
    let console = Console::open()?;
    let client = &console.client;

    match cmd {
        ContactCommand::List {
            page,
            page_size,
            search,
            tag,
            opted_in,
        } => {
            let query = ContactQuery {
                search: non_empty(search),
                tag: non_empty(tag),
                opted_in,
            };
            let result = contacts::list(client, page, console.page_size(page_size), &query).await?;
            let rows: Vec<String> = result.data.iter().map(contact_row).collect();
            print_rows("Contacts", &rows);
            println!("{}", page_footer(&result));
        }
        ContactCommand::Show { id } => {
            print_contact(&contacts::get(client, id).await?);
        }
        ContactCommand::Add {
            phone,
            name,
            email,
            tags,
            opted_in,
        } => {
            let form = ContactForm {
                phone_number: phone,
                name: non_empty(name),
                email: non_empty(email),
                tags,
                has_opted_in: opted_in,
            };
            match contacts::create(client, &form).await? {
                Some(c) => println!("Created contact {}", contact_row(&c)),
                None => println!("Created contact {}", form.phone_number),
            }
        }
        ContactCommand::Update {
            id,
            phone,
            name,
            email,
            tags,
            opted_in,
        } => {
            let current = contacts::get(client, id).await?;
            let form = ContactForm {
                phone_number: phone.unwrap_or(current.phone_number),
                name: non_empty(name).or(current.name),
                email: non_empty(email).or(current.email),
                tags: if tags.is_empty() { current.tags } else { tags },
                has_opted_in: opted_in.unwrap_or(current.has_opted_in),
            };
            contacts::update(client, id, &form).await?;
            println!("Updated contact {}", id);
        }
        ContactCommand::Delete { id } => {
            contacts::delete(client, id).await?;
            println!("Deleted contact {}", id);
        }
        ContactCommand::Tags => {
            let tags = contacts::tags(client).await?;
            print_rows("Tags", &tags);
        }
        ContactCommand::Import => {
            let summary = contacts::import_from_invoices(client).await?;
            match summary.message {
                Some(msg) => println!("{}", msg),
                None => println!(
                    "Imported {} contacts ({} skipped)",
                    summary.imported, summary.skipped
                ),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::decode_page;
    use serde_json::json;

    #[test]
    fn test_opted_in_contact_renders_one_row() {
        let body = json!({
            "Data": [{
                "Id": 12,
                "PhoneNumber": "+15551230000",
                "Name": "Ada",
                "HasOptedIn": true,
                "Tags": ["vip"]
            }],
            "TotalCount": 1,
            "TotalPages": 1,
            "CurrentPage": 1
        });
        let page = decode_page::<Contact>(body).unwrap();
        let rows: Vec<String> = page.data.iter().map(contact_row).collect();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("+15551230000"));
        assert!(rows[0].contains("[Opted In]"));
        assert!(rows[0].ends_with("#vip"));
    }

    #[test]
    fn test_opted_out_badge() {
        let c = Contact {
            id: 1,
            phone_number: "+2".into(),
            ..Default::default()
        };
        assert!(contact_row(&c).contains("[Opted Out]"));
        assert!(contact_row(&c).contains(" - "));
    }
}
