//! Application state shared across all request handlers

use std::sync::Arc;

use crate::ads::AdsConnector;
use crate::config::Settings;
use crate::oauth::OAuthClient;

/// Everything a handler needs, built once at start-up
///
/// Generic over the advertising connector so tests can run the real router
/// against a fake upstream.
pub struct AppState<C> {
    pub settings: Arc<Settings>,
    pub ads: Arc<C>,
    pub oauth: OAuthClient,
}

impl<C: AdsConnector> AppState<C> {
    pub fn new(settings: Settings, ads: C) -> Self {
        Self {
            settings: Arc::new(settings),
            ads: Arc::new(ads),
            oauth: OAuthClient::new(),
        }
    }
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            ads: Arc::clone(&self.ads),
            oauth: self.oauth.clone(),
        }
    }
}
