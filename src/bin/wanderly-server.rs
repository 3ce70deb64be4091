use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wanderly_booking::{
    http, BookingEngine, Clock, Config, InMemoryBookingStore, InMemoryDestinationStore,
    SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let destinations = if config.server.seed_destinations {
        InMemoryDestinationStore::with_seed_data()
    } else {
        InMemoryDestinationStore::new()
    };
    tracing::info!(count = destinations.len(), "destination catalog ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = BookingEngine::new(
        Arc::new(InMemoryBookingStore::new(clock.clone())),
        Arc::new(destinations),
        clock,
        config.engine.clone(),
    );

    let app = http::router(Arc::new(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("{} listening on http://{}", http::SERVICE_NAME, listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
