use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use trip_planner::config::AppConfig;
use trip_planner::error::AppError;
use trip_planner::routes::create_router;
use trip_planner::services::{
    countries::CountryService, http_client, identity::IdentityService, trips::TripService,
};
use trip_planner::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let client = http_client(config.http_timeout)?;

    let trips = TripService::new(client.clone(), config.api_base_url.clone());
    let identity = IdentityService::new(client.clone(), config.api_base_url.clone());
    let countries = CountryService::new(client, config.countries_url.clone());
    info!("trip backend at {}", config.api_base_url);

    let state = AppState::new(config.clone(), Arc::new(trips), identity, countries);

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trip_planner=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
