use std::sync::Arc;

use staff_onboard::config::{OnboardConfig, PlatformBackend, ServerConfig};
use staff_onboard::onboarding::model::EMPLOYEE_ID_ATTRIBUTE;
use staff_onboard::onboarding::{Onboarder, onboard_routes};
use staff_onboard::platform::{AppwriteClient, InMemoryPlatform, Platform};

fn create_platform(backend: PlatformBackend, config: &OnboardConfig) -> Arc<dyn Platform> {
    match backend {
        PlatformBackend::Appwrite => {
            tracing::info!(endpoint = %config.endpoint, "Using Appwrite platform");
            Arc::new(AppwriteClient::from_config(config))
        }
        PlatformBackend::Memory => {
            tracing::warn!("Using in-memory platform; nothing is persisted and no email is sent");
            Arc::new(InMemoryPlatform::new().with_unique_attribute(
                &config.database_id,
                &config.staff_collection_id,
                EMPLOYEE_ID_ATTRIBUTE,
            ))
        }
    }
}

#[tokio::main]
async fn main() -> staff_onboard::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server = ServerConfig::from_env()?;
    let config = OnboardConfig::from_env();

    // Missing platform settings are not fatal: the affected calls fail and
    // each request reports a server error.
    for key in config.missing_vars() {
        tracing::warn!(key, "Environment variable not set");
    }

    let platform = create_platform(server.backend, &config);
    let onboarder = Arc::new(Onboarder::new(platform, Arc::new(config)));
    let app = onboard_routes(onboarder);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port)).await?;
    tracing::info!(
        port = server.port,
        version = env!("CARGO_PKG_VERSION"),
        "Staff onboarding service started"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
