//! `wacon campaigns ...`

use anyhow::Result;
use clap::Subcommand;

use super::{non_empty, page_footer, print_rows, Console};
use crate::api::campaigns;
use crate::models::{short_time, Campaign, CampaignForm};

#[derive(Subcommand)]
pub enum CampaignCommand {
    /// List broadcast campaigns
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one campaign with delivery counters
    Show { id: u64 },

    /// Create a draft campaign
    Create {
        name: String,

        /// Template content SID to broadcast
        #[arg(long)]
        content_sid: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Audience tag (repeatable); no tags targets every opted-in contact
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// ISO-8601 start time
        #[arg(long)]
        scheduled_at: Option<String>,
    },

    /// Update a campaign; omitted fields keep their current value
    Update {
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        content_sid: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Replace audience tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        scheduled_at: Option<String>,
    },

    /// Delete a campaign
    Delete { id: u64 },

    /// Start sending
    Launch { id: u64 },

    /// Stop a running or scheduled campaign
    Cancel { id: u64 },

    /// Show audience size and the rendered message
    Preview { id: u64 },
}

pub fn campaign_row(c: &Campaign) -> String {
    format!(
        "{:>6}  {:<28} {:<12} {}/{} sent, {} failed",
        c.id, c.name, c.status, c.sent_count, c.total_recipients, c.failed_count
    )
}

fn print_campaign(c: &Campaign) {
    println!("ID: {}", c.id);
    println!("Name: {}", c.name);
    println!("Status: {}", c.status);
    println!("Content SID: {}", c.content_sid);
    if let Some(desc) = &c.description {
        println!("Description: {}", desc);
    }
    if !c.target_tags.is_empty() {
        println!("Tags: {}", c.target_tags.join(", "));
    }
    if let Some(at) = &c.scheduled_at {
        println!("Scheduled: {}", short_time(at));
    }
    println!(
        "Recipients: {}  Sent: {}  Delivered: {}  Failed: {}",
        c.total_recipients, c.sent_count, c.delivered_count, c.failed_count
    );
}

pub async fn run(cmd: CampaignCommand) -> Result<()> {
    let console = Console::open()?;
    let client = &console.client;

    match cmd {
        CampaignCommand::List { page, page_size } => {
            let result = campaigns::list(client, page, console.page_size(page_size)).await?;
            let rows: Vec<String> = result.data.iter().map(campaign_row).collect();
            print_rows("Campaigns", &rows);
            println!("{}", page_footer(&result));
        }
        CampaignCommand::Show { id } => {
            print_campaign(&campaigns::get(client, id).await?);
        }
        CampaignCommand::Create {
            name,
            content_sid,
            description,
            tags,
            scheduled_at,
        } => {
            let form = CampaignForm {
                name,
                description: non_empty(description),
                content_sid,
                target_tags: tags,
                scheduled_at: non_empty(scheduled_at),
            };
            match campaigns::create(client, &form).await? {
                Some(c) => println!("Created campaign {} ({})", c.id, c.name),
                None => println!("Created campaign {}", form.name),
            }
        }
        CampaignCommand::Update {
            id,
            name,
            content_sid,
            description,
            tags,
            scheduled_at,
        } => {
            let current = campaigns::get(client, id).await?;
            let form = CampaignForm {
                name: name.unwrap_or(current.name),
                description: non_empty(description).or(current.description),
                content_sid: content_sid.unwrap_or(current.content_sid),
                target_tags: if tags.is_empty() {
                    current.target_tags
                } else {
                    tags
                },
                scheduled_at: non_empty(scheduled_at).or(current.scheduled_at),
            };
            campaigns::update(client, id, &form).await?;
            println!("Updated campaign {}", id);
        }
        CampaignCommand::Delete { id } => {
            campaigns::delete(client, id).await?;
            println!("Deleted campaign {}", id);
        }
        CampaignCommand::Launch { id } => {
            campaigns::launch(client, id).await?;
            println!("Campaign {} launched", id);
        }
        CampaignCommand::Cancel { id } => {
            campaigns::cancel(client, id).await?;
            println!("Campaign {} cancelled", id);
        }
        CampaignCommand::Preview { id } => {
            let preview = campaigns::preview(client, id).await?;
            println!("Recipients: {}", preview.recipients);
            if !preview.sample_numbers.is_empty() {
                println!("Sample: {}", preview.sample_numbers.join(", "));
            }
            if let Some(body) = &preview.rendered_body {
                println!("\n{}", body);
            }
        }
    }
    Ok(())
}
