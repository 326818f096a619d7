use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use openlocalmap_server::cache::{CacheConfig, CachedExecutor};
use openlocalmap_server::domain::NamePreferences;
use openlocalmap_server::overpass::{DEFAULT_ENDPOINT, OverpassClient, OverpassConfig};
use openlocalmap_server::routes::{RouteSearch, SearchConfig};
use openlocalmap_server::web::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // Overpass endpoint, public instance unless overridden
    let endpoint = std::env::var("OVERPASS_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let overpass_config = OverpassConfig::new().with_endpoint(&endpoint);
    let client = OverpassClient::new(overpass_config).expect("Failed to create Overpass client");

    // Cached executor
    let cache_config = CacheConfig::default();
    let executor = CachedExecutor::new(client, &cache_config);

    // Name locales, most preferred first
    let names = match std::env::var("OPENLOCALMAP_LOCALES") {
        Ok(locales) => NamePreferences::new(locales.split(',').map(str::trim)),
        Err(_) => NamePreferences::default(),
    };
    let search_config = SearchConfig::default().with_names(names);

    let state = AppState::new(RouteSearch::new(executor, search_config));
    let app = create_router(state);

    let addr: SocketAddr = match std::env::var("OPENLOCALMAP_ADDR") {
        Ok(addr) => addr.parse().expect("OPENLOCALMAP_ADDR must be host:port"),
        Err(_) => DEFAULT_ADDR.parse().expect("default address is valid"),
    };
    info!(%addr, %endpoint, "OpenLocalMap route server listening");
    info!("GET /health                                 - Health check");
    info!("GET /api/routes?south&west&north&east       - Routes in an area");
    info!("GET /api/routes/relation/:id/stops          - Ordered stops");
    info!("GET /api/routes/relation/:id/geometry       - Relation geometry");
    info!("GET /api/routes/way/:id/geometry            - Way geometry");
    info!("GET /api/routes/synthetic/:mode/geometry    - Untagged paths in an area");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
