//! # Inyeon Client
//!
//! Terminal walkthrough of the client layer. Runs in demo mode by default;
//! `--remote` uses the API at `INYEON_API_URL` with the saved session.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p inyeon-client
//! INYEON_API_URL=http://localhost:8080 cargo run -p inyeon-client -- --remote
//! ```

use chrono::Utc;
use inyeon_client::{config::ClientConfig, InyeonClient};
use inyeon_shared::validation::contact::ContactForm;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inyeon_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Inyeon Client v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env()?;
    let remote = std::env::args().any(|arg| arg == "--remote");
    let mut client = if remote {
        InyeonClient::connect(config).await?
    } else {
        InyeonClient::demo(config).await?
    };

    match client.user().await {
        Some(user) => println!("{} ({})", user.nickname, user.email),
        None => {
            println!("Not signed in");
            return Ok(());
        }
    }

    let book = client.contacts();
    let pinned = book.pinned().await?;
    println!("\n고정된 사람 {}", pinned.len());
    for contact in &pinned {
        println!("  * {} [{}]", contact.name, contact.relationship_level);
    }

    let regular = book.regular_page(0).await?;
    println!("내 사람 {}", regular.contacts.len());
    for contact in &regular.contacts {
        println!("  - {} [{}]", contact.name, contact.relationship_level);
    }

    if client.is_demo() {
        if let Some(first) = regular.contacts.first() {
            book.set_pinned(first.contacts_id, true).await?;
            println!("\nPinned {}; pinned now {}", first.name, book.pinned().await?.len());
        }

        let form = ContactForm {
            name: "새 친구".to_string(),
            relationship_level: "친구".to_string(),
            ..Default::default()
        };
        if let Err(e) = book.add(&form).await {
            tracing::debug!("Insert refused: {}", e);
        }
    }

    let today = Utc::now().with_timezone(&client.config().calendar_offset()).date_naive();
    let mut calendar = client.calendar(today);
    calendar.load().await?;
    println!("\n{}", calendar.month());
    for event in calendar.events() {
        let marker = if event.is_holiday { "holiday" } else { "plan" };
        println!("  {} {} ({})", event.start.format("%m-%d"), event.title, marker);
    }

    for notice in client.notices().drain() {
        println!("[{:?}] {}", notice.level, notice.message);
    }

    client.shutdown();
    Ok(())
}
