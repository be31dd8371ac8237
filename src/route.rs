//! Route definitions for the ads gateway
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::ads::AdsConnector;
use crate::handler::{ads_campaigns, ads_health, debug_config, oauth_callback, oauth_start, root};
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /` - Service banner
/// - `GET /ads/health` - Lists accessible accounts
/// - `GET /ads/campaigns` - Campaign metrics for a date range
/// - `GET /ads/debug-config` - Masked view of the credentials file
/// - `GET /oauth2/start` - Redirects to the consent screen
/// - `GET /oauth2/callback` - Exchanges the authorization code for tokens
///
/// The `/ads` routes sit behind [`auth_middleware`]; the OAuth routes stay open
/// because the identity provider redirects the browser to the callback.
pub fn create_app<C: AdsConnector>(state: AppState<C>) -> Router {
    let ads_routes = Router::new()
        .route("/health", get(ads_health::<C>))
        .route("/campaigns", get(ads_campaigns::<C>))
        .route("/debug-config", get(debug_config::<C>))
        .layer(middleware::from_fn_with_state(
            state.settings.clone(),
            auth_middleware,
        ));

    let oauth_routes = Router::new()
        .route("/start", get(oauth_start::<C>))
        .route("/callback", get(oauth_callback::<C>));

    Router::new()
        .route("/", get(root))
        .nest("/ads", ads_routes)
        .nest("/oauth2", oauth_routes)
        .with_state(state)
}
