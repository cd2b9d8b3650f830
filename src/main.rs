// Rain Radar API v0.1
use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod routes;
mod services;

use config::AppConfig;
use routes::nowcast::AppState;
use services::radar::RadarClient;

/// Rain Radar API — OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rain Radar API",
        version = "0.1.0",
        description = "Minute-scale precipitation nowcast. Samples the DWD radar \
            WMS product at a point for the next hour in 5-minute steps and \
            translates each pixel color into mm/h using the radar color legend.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Nowcast", description = "Radar-based precipitation nowcast"),
    ),
    paths(
        routes::health::health_check,
        routes::legend::get_legend,
        routes::nowcast::get_rain_radar,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::legend::LegendResponse,
            routes::legend::LegendEntryResponse,
            routes::nowcast::RainRadarResponse,
            routes::nowcast::RadarEntry,
            routes::nowcast::LocationResponse,
            services::classifier::SampleStatus,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rain_radar_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!(
        "Radar source {} (layer {}), timezone {}, timeout {:?}, concurrency {}",
        config.wms_url,
        config.radar_layer,
        config.timezone,
        config.request_timeout,
        config.max_concurrent_fetches
    );
    if !config.strict_coordinates {
        tracing::info!("Lenient coordinates: lat/lng use their leading number, else 0");
    }

    let radar_client = RadarClient::new(&config.user_agent, config.request_timeout)
        .expect("Failed to create radar client");

    let port = config.port;
    let app_state = AppState {
        radar_client,
        config: Arc::new(config),
    };

    // CORS — read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!("Swagger UI available at http://localhost:{}/swagger-ui/", port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
