//! Healing In Writing maintenance entry point
//!
//! Loads configuration, prepares the database and reports the registration
//! state of upcoming events.

use std::sync::Arc;
use anyhow::Context;
use futures::future::try_join_all;
use tracing::{info, warn};

use healing_in_writing::{
    config::Settings,
    database::{connection::{create_pool, run_migrations, PoolConfig}, DatabaseService},
    services::{ServiceFactory, SystemClock},
    utils::{helpers::format_timestamp, logging},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", healing_in_writing::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&PoolConfig::from(&settings.database)).await?;

    // Run database migrations
    run_migrations(&db_pool).await?;

    let services = ServiceFactory::new(&settings, DatabaseService::new(db_pool), Arc::new(SystemClock))?;

    let health = services.health_check().await;
    if !health.is_healthy() {
        for issue in health.get_issues() {
            warn!(issue = %issue, "Health check issue");
        }
        anyhow::bail!("storage is not healthy");
    }

    let total = services.event_service.count_events().await?;
    let upcoming = services.event_service.list_upcoming(None).await?;
    info!(total_events = total, upcoming_events = upcoming.len(), "Event overview");

    let registration_service = &services.registration_service;
    let capacities = try_join_all(
        upcoming
            .iter()
            .map(|event| registration_service.get_capacity_info(event.id)),
    )
    .await?;

    for (event, capacity) in upcoming.iter().zip(capacities) {
        info!(
            event_id = event.id,
            title = %event.title,
            starts = %format_timestamp(event.start_date_time),
            registered = capacity.registered_count,
            capacity = capacity.capacity,
            status = %capacity.status_message,
            "Upcoming event"
        );
    }

    info!("Healing In Writing maintenance run complete.");
    Ok(())
}
