use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use dotenv::dotenv;
use log::{error, info};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use gharelu_chat::config::Config;
use gharelu_chat::state::AppState;
use gharelu_chat::{chat, event, message, user};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let config = Config::env();

    TermLogger::init(
        config.log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    let state = match AppState::init(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {e}");
            std::process::exit(1);
        }
    };

    let app = Router::new()
        .route("/health", get(health))
        .merge(chat::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(user::api(state.clone()))
        .merge(event::endpoints(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {e}", config.addr);
            std::process::exit(1);
        }
    };

    info!("gharelu chat listening on {}", config.addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped with error: {e}");
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}
