//! Tutorbook server — application entry point.

use std::env;

use tracing_subscriber::EnvFilter;
use tutorbook_booking::config::BookingConfig;
use tutorbook_booking::service::BookingService;
use tutorbook_db::DbSettings;
use tutorbook_db::repository::{SurrealParticipantRepository, SurrealSlotRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tutorbook=info".parse()?),
        )
        .json()
        .init();

    tracing::info!("Starting tutorbook server...");

    let mut settings = DbSettings::default();
    if let Ok(address) = env::var("SURREAL_ADDRESS") {
        settings.address = address;
    }
    if let Ok(username) = env::var("SURREAL_USER") {
        settings.username = username;
    }
    if let Ok(password) = env::var("SURREAL_PASS") {
        settings.password = password;
    }

    let db = tutorbook_db::connect(&settings).await?;
    tutorbook_db::run_migrations(&db).await?;

    let authority_id: i64 = env::var("AUTHORITY_CHAT_ID")?.parse()?;
    let config = BookingConfig {
        authority_id,
        ..Default::default()
    };

    let _service = BookingService::new(
        SurrealSlotRepository::new(db.clone()),
        SurrealParticipantRepository::new(db),
        config,
    );

    tracing::info!(authority_id, "Booking engine ready");

    // TODO: attach the chat dispatch layer (long-polling transport).

    Ok(())
}
