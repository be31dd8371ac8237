//! OAuth route tests
//!
//! The identity provider's token endpoint is replaced by a small axum server
//! bound to a random local port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Form, Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use ads_gateway::ads::{AdsApi, AdsConnector};
use ads_gateway::config::{CredentialsRecord, Settings};
use ads_gateway::error::AppError;
use ads_gateway::model::SearchRow;
use ads_gateway::oauth::OAuthClient;
use ads_gateway::route::create_app;
use ads_gateway::state::AppState;

const REDIRECT_URI: &str = "https://gw.example.com/oauth2/callback";

type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// The OAuth routes never touch the advertising API
struct NoAds;

impl AdsConnector for NoAds {
    type Client = NoAds;

    fn connect(&self, _credentials: &CredentialsRecord) -> Result<NoAds, AppError> {
        Err(AppError::Unknown("advertising API is not used here".into()))
    }
}

impl AdsApi for NoAds {
    async fn list_accessible_customers(&self) -> Result<Vec<String>, AppError> {
        Ok(Vec::new())
    }

    async fn search(&self, _customer_id: &str, _query: &str) -> Result<Vec<SearchRow>, AppError> {
        Ok(Vec::new())
    }
}

/// Starts a fake token endpoint answering every request with `status` and `reply`
async fn spawn_token_endpoint(status: StatusCode, reply: Value) -> (String, Captured) {
    let captured: Captured = Arc::default();
    let sink = captured.clone();

    let app = Router::new().route(
        "/token",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                sink.lock().unwrap().push(form);
                (status, Json(reply))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/token"), captured)
}

fn oauth_settings(token_url: &str) -> Settings {
    let token_url = token_url.to_string();
    Settings::from_lookup(move |key| {
        let value = match key {
            "GOOGLE_OAUTH_CLIENT_ID" => "client-123.apps.googleusercontent.com",
            "GOOGLE_OAUTH_CLIENT_SECRET" => "client-secret",
            "GOOGLE_OAUTH_REDIRECT_URI" => REDIRECT_URI,
            "GOOGLE_OAUTH_TOKEN_URL" => token_url.as_str(),
            _ => return None,
        };
        Some(value.to_string())
    })
}

fn setup_test_app(settings: Settings) -> Router {
    let mut state = AppState::new(settings, NoAds);
    // The fake token endpoint is local; keep any ambient HTTP proxy out of the way.
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    state.oauth = OAuthClient::new().with_http_client(http);
    create_app(state)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_start_redirects_to_consent_screen() {
    let app = setup_test_app(oauth_settings("https://oauth2.googleapis.com/token"));

    let response = get(app, "/oauth2/start").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    let url = Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("accounts.google.com"));

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "client-123.apps.googleusercontent.com");
    assert_eq!(params["redirect_uri"], REDIRECT_URI);
    assert_eq!(params["access_type"], "offline");
    assert_eq!(params["prompt"], "consent");
    assert_eq!(params["include_granted_scopes"], "true");
    assert_eq!(params["response_type"], "code");
    assert!(!location.contains("client-secret"));
}

#[tokio::test]
async fn test_start_without_oauth_config() {
    let app = setup_test_app(Settings::from_lookup(|_| None));

    let response = get(app, "/oauth2/start").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("GOOGLE_OAUTH_CLIENT_ID"));
}

#[tokio::test]
async fn test_callback_without_code_is_400_and_skips_exchange() {
    let (token_url, captured) = spawn_token_endpoint(StatusCode::OK, json!({})).await;
    let app = setup_test_app(oauth_settings(&token_url));

    for uri in ["/oauth2/callback", "/oauth2/callback?code="] {
        let response = get(app.clone(), uri).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = response_json(response.into_body()).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], AppError::MissingAuthCode.to_string());
    }

    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_exchanges_code() {
    let (token_url, captured) = spawn_token_endpoint(
        StatusCode::OK,
        json!({
            "access_token": "ya29.access",
            "refresh_token": "1//0grefresh",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/adwords",
            "token_type": "Bearer"
        }),
    )
    .await;
    let app = setup_test_app(oauth_settings(&token_url));

    let response = get(app, "/oauth2/callback?code=4%2F0Acode&scope=adwords").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["access_token"], "ya29.access");
    assert_eq!(body["refresh_token"], "1//0grefresh");
    assert!(body["expiry"].is_string());
    assert!(!body["note"].as_str().unwrap().is_empty());

    let forms = captured.lock().unwrap();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "4/0Acode");
    assert_eq!(form["client_id"], "client-123.apps.googleusercontent.com");
    assert_eq!(form["client_secret"], "client-secret");
    assert_eq!(form["redirect_uri"], REDIRECT_URI);
}

#[tokio::test]
async fn test_callback_without_refresh_token_in_reply() {
    let (token_url, _captured) = spawn_token_endpoint(
        StatusCode::OK,
        json!({ "access_token": "ya29.only", "token_type": "Bearer" }),
    )
    .await;
    let app = setup_test_app(oauth_settings(&token_url));

    let response = get(app, "/oauth2/callback?code=abc").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["access_token"], "ya29.only");
    assert!(body["refresh_token"].is_null());
    assert!(body["expiry"].is_null());
}

#[tokio::test]
async fn test_callback_with_unrepresentable_lifetime() {
    let (token_url, _captured) = spawn_token_endpoint(
        StatusCode::OK,
        json!({ "access_token": "ya29.forever", "expires_in": i64::MAX }),
    )
    .await;
    let app = setup_test_app(oauth_settings(&token_url));

    let response = get(app, "/oauth2/callback?code=abc").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["access_token"], "ya29.forever");
    assert!(body["expiry"].is_null());
}

#[tokio::test]
async fn test_callback_surfaces_provider_error() {
    let (token_url, _captured) = spawn_token_endpoint(
        StatusCode::BAD_REQUEST,
        json!({ "error": "invalid_grant", "error_description": "Bad Request" }),
    )
    .await;
    let app = setup_test_app(oauth_settings(&token_url));

    let response = get(app, "/oauth2/callback?code=expired").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "invalid_grant: Bad Request");
}

#[tokio::test]
async fn test_callback_with_unreachable_token_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let token_url = format!("http://{}/token", listener.local_addr().unwrap());
    drop(listener);
    let app = setup_test_app(oauth_settings(&token_url));

    let response = get(app, "/oauth2/callback?code=abc").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("token request failed"));
}

#[tokio::test]
async fn test_oauth_routes_ignore_gateway_authorization() {
    let mut settings = oauth_settings("https://oauth2.googleapis.com/token");
    settings.authorization = Some("secret_token".into());
    let app = setup_test_app(settings);

    let response = get(app, "/oauth2/start").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}
