//! PawHaven data core
//!
//! Opens the configured store, seeds it and logs the dashboard summary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pawhaven_core::config::Config;
use pawhaven_core::Platform;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PawHaven data core");
    tracing::info!("Store backend: {:?}", config.store);
    tracing::info!("Demo user: {}", config.demo_user_id);

    let seed = config.seed_on_start;
    let platform = Platform::from_config(config).await?;

    if seed {
        platform.seed_all().await?;
    }

    let dashboard = platform.dashboard().await?;
    tracing::info!(
        "{} pets, {} applications, {} adoptions at revision {}",
        dashboard.pets.total,
        dashboard.applications.total,
        dashboard.adoptions.total_adoptions,
        dashboard.revision
    );
    tracing::info!("Dashboard: {}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}
