//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Wires the Google Ads connector into the router
//! - Starts the HTTP server with graceful shutdown support

use dotenvy::dotenv;
use std::env;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ads_gateway::ads::GoogleAdsConnector;
use ads_gateway::config::Settings;
use ads_gateway::route::create_app;
use ads_gateway::state::AppState;

/// Application entry point
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `RUST_LOG` - Log filter (default: `ads_gateway=debug,tower_http=debug`)
/// - see [`Settings`] for credentials and OAuth variables
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ads_gateway=debug,tower_http=debug".into()),
        )
        .init();

    let port_str = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let port: u16 = port_str.parse().unwrap_or(8080);

    let settings = Settings::from_env();
    if let Err(err) = settings.oauth_client_config() {
        tracing::warn!(error = %err, "OAuth routes are disabled until this is fixed");
    }

    let connector = GoogleAdsConnector::new(&settings.ads_endpoint, &settings.oauth.token_url);
    let credentials_path = settings.credentials_path.display().to_string();
    let state = AppState::new(settings, connector);

    let app = create_app(state).layer(TraceLayer::new_for_http());

    // Bind to all network interfaces on the specified port
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("🚀 Server running at http://localhost:{}", port);
    tracing::info!("📂 Using credentials: {}", credentials_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Handles graceful shutdown signals
///
/// Returns when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received so that
/// in-flight requests can finish before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("🛑 Shutdown signal received, stopping server.");
}
