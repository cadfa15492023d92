use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use meli_core::{AppConfig, SourceKind};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn config(base: &str) -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().expect("socket address"),
        log_level: "debug".to_owned(),
        site_id: "MLA".to_owned(),
        api_base_url: base.to_owned(),
        listing_base_url: base.to_owned(),
        auth_base_url: base.to_owned(),
        client_id: Some("client-1".to_owned()),
        client_secret: Some("secret-1".to_owned()),
        refresh_token: Some("refresh-1".to_owned()),
        redirect_uri: Some("http://localhost:3000/api/auth/callback".to_owned()),
        default_source: SourceKind::HtmlScrape,
        request_timeout_secs: 5,
        user_agent: "meli-test/0.1".to_owned(),
        inter_page_delay_ms: 0,
        cache_ttl_secs: 60,
    }
}

fn app(config: AppConfig) -> Router {
    let state = AppState::from_config(Arc::new(config)).expect("state");
    build_app(state, default_rate_limit_state())
}

fn listing(count: u32) -> String {
    let cards: String = (1..=count)
        .map(|id| {
            format!(
                r#"<li class="ui-search-layout__item"><div class="poly-card">
                     <h3 class="poly-component__title"><a href="https://articulo.mercadolibre.com.ar/MLA-{id}">Mouse {id}</a></h3>
                     <span class="andes-money-amount__fraction">{price}</span>
                     <span class="poly-reviews__total">+{id} vendidos</span>
                   </div></li>"#,
                price = 1_000 + id
            )
        })
        .collect();
    format!(r#"<html><body><ol class="ui-search-layout">{cards}</ol></body></html>"#)
}

async fn mount_listing(server: &MockServer, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path("/mouse"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_products() {
    let server = MockServer::start().await;
    mount_listing(&server, 200, listing(3)).await;

    let (status, json) = get(app(config(&server.uri())), "/api/v1/search?q=mouse").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["q"], "mouse");
    assert_eq!(json["source"], "html-scrape");
    assert_eq!(json["appliedLimit"], 20);
    assert_eq!(json["total"], 3);
    assert_eq!(json["products"][0]["title"], "Mouse 3");
    assert_eq!(json["products"][0]["rank"], 1);
    assert_eq!(json["products"][0]["soldQty"], 3);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn unparsable_limit_falls_back_to_default() {
    let server = MockServer::start().await;
    mount_listing(&server, 200, listing(2)).await;

    let (status, json) = get(
        app(config(&server.uri())),
        "/api/v1/search?q=mouse&limit=abc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appliedLimit"], 20);
}

#[tokio::test]
async fn limit_all_reports_zero() {
    let server = MockServer::start().await;
    mount_listing(&server, 200, listing(2)).await;

    let (_, json) = get(
        app(config(&server.uri())),
        "/api/v1/search?q=mouse&limit=all",
    )
    .await;

    assert_eq!(json["appliedLimit"], 0);
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mouse"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(2)))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (first, _) = get(app.clone(), "/api/v1/search?q=mouse").await;
    let (second, json) = get(app, "/api/v1/search?q=MOUSE").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(json["total"], 2);
}

#[tokio::test]
async fn captcha_page_maps_to_service_unavailable() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        200,
        "<html><body>Confirmá que no sos un robot <div class=\"captcha\"></div></body></html>"
            .to_owned(),
    )
    .await;

    let (status, json) = get(app(config(&server.uri())), "/api/v1/search?q=mouse").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "upstream_blocked");
    assert_eq!(json["status"], 200);
    assert!(json["url"].as_str().is_some_and(|u| u.ends_with("/mouse")));
}

#[tokio::test]
async fn empty_listing_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        200,
        r#"<html><body><ol class="ui-search-layout"></ol></body></html>"#.to_owned(),
    )
    .await;

    let (status, json) = get(app(config(&server.uri())), "/api/v1/search?q=mouse").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "no_data");
}

#[tokio::test]
async fn upstream_server_error_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    mount_listing(&server, 502, "bad gateway".to_owned()).await;

    let (status, json) = get(app(config(&server.uri())), "/api/v1/search?q=mouse").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "upstream_error");
    assert_eq!(json["status"], 502);
}

#[tokio::test]
async fn blank_query_is_bad_request() {
    let server = MockServer::start().await;
    let (status, json) = get(app(config(&server.uri())), "/api/v1/search?q=%20%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_input");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn unknown_source_is_bad_request() {
    let server = MockServer::start().await;
    let (status, json) = get(
        app(config(&server.uri())),
        "/api/v1/search?q=mouse&source=rss",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_input");
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, json) = get(app(config("http://127.0.0.1:9")), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn auth_start_redirects_to_authorization_page() {
    let response = app(config("https://auth.example.com"))
        .oneshot(
            Request::builder()
                .uri("/api/auth/start")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .expect("ascii location");
    assert!(location.starts_with(
        "https://auth.example.com/authorization?response_type=code&client_id=client-1"
    ));
    assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000"));
    assert!(location.contains("&state="));
}

#[tokio::test]
async fn auth_start_without_client_id_is_configuration_error() {
    let mut cfg = config("https://auth.example.com");
    cfg.client_id = None;

    let (status, json) = get(app(cfg), "/api/auth/start").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "configuration_error");
    assert!(json["error"]
        .as_str()
        .is_some_and(|e| e.contains("MELI_CLIENT_ID")));
}

#[tokio::test]
async fn auth_callback_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=TG-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access",
            "refresh_token": "TG-refresh",
            "user_id": 42,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = get(
        app(config(&server.uri())),
        "/api/auth/callback?code=TG-123&state=xyz",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["refreshToken"], "TG-refresh");
    assert_eq!(json["userId"], 42);
    assert_eq!(json["state"], "xyz");
}

#[tokio::test]
async fn auth_callback_without_code_is_bad_request() {
    let server = MockServer::start().await;
    let (status, json) = get(app(config(&server.uri())), "/api/auth/callback").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_input");
}

#[tokio::test]
async fn rejected_code_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let (status, json) = get(
        app(config(&server.uri())),
        "/api/auth/callback?code=TG-bad",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "upstream_error");
}

#[test]
fn local_failure_carries_kind_code() {
    let failure = local_failure(ErrorKind::BadInput, "nope");
    assert_eq!(failure.code, "bad_input");
    assert_eq!(failure.error, "nope");
    assert!(failure.status.is_none());
}
