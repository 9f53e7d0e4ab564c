use std::sync::Arc;

use axum::{Extension, Json, Router, routing::any};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use pmgate_api::{app, config::GatewayConfig, context::CallerContext};
use pmgate_infra::{InMemoryIdentityStore, SeedFile};

const JWT_SECRET: &str = "test-secret";

const SEED: &str = r#"{
    "roles": [
        { "name": "guest", "permissions": [ { "path": "/products/{id}", "action": "GET" } ] },
        { "name": "user", "permissions": [ { "path": "/cart/{id}", "action": "GET" } ] },
        { "name": "vendor", "permissions": [ { "path": "/daily/*", "action": "get" } ] },
        { "name": "admin", "permissions": [ { "path": "*", "action": "any" } ] }
    ],
    "employees": [ { "id": 7, "role": "admin" } ]
}"#;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(seed: &str, public_paths: &[&str]) -> Self {
        let config = GatewayConfig {
            jwt_secret: JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            seed_file: None,
            unknown_callers: Default::default(),
            public_paths: public_paths.iter().map(|p| p.to_string()).collect(),
        };
        let store = InMemoryIdentityStore::from_seed(SeedFile::from_json(seed).unwrap()).unwrap();
        let authorizer = Arc::new(app::build_authorizer(&config, Arc::new(store)));

        // Same router as prod, with an upstream that echoes what it received.
        let app = app::build_app(authorizer, echo_upstream());
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn echo_upstream() -> Router {
    async fn echo(caller: Option<Extension<CallerContext>>) -> Json<Value> {
        Json(json!({ "forwarded": true, "caller": caller.map(|Extension(c)| c) }))
    }
    Router::new().route("/*path", any(echo))
}

fn mint_jwt(secret: &str, claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token(caller_type: &str, id: i64) -> String {
    let now = Utc::now();
    mint_jwt(
        JWT_SECRET,
        json!({
            "id": id,
            "type": caller_type,
            "sub": format!("{caller_type}-{id}@example.com"),
            "iat": now.timestamp(),
            "exp": (now + ChronoDuration::hours(10)).timestamp(),
        }),
    )
}

async fn assert_not_authorized(res: reqwest::Response) {
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/plain;charset=UTF-8"
    );
    assert_eq!(res.text().await.unwrap(), "Not authorized");
}

#[tokio::test]
async fn health_is_not_authorized() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_can_read_but_not_delete_cart() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let client = reqwest::Client::new();
    let bearer = token("user", 42);

    let res = client
        .get(srv.url("/pm-shopping-cart/cart/42"))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["caller"]["caller_id"], 42);
    assert_eq!(body["caller"]["role"], "user");
    assert_eq!(body["caller"]["service"], "pm-shopping-cart");

    let res = client
        .delete(srv.url("/pm-shopping-cart/cart/42"))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn raw_token_without_bearer_scheme_is_accepted() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::Client::new()
        .get(srv.url("/pm-shopping-cart/cart/1"))
        .header("Authorization", token("user", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_caller_gets_guest_rules() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/pm-search/products/9")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["caller"]["effective_type"], "guest");
    assert_eq!(body["caller"]["caller_id"], 0);

    let res = client.post(srv.url("/pm-search/products/9")).send().await.unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn anonymous_caller_is_stopped_at_reports_service() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::get(srv.url("/pm-reports/daily/1")).await.unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn user_inherits_guest_rules() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::Client::new()
        .get(srv.url("/pm-search/products/3"))
        .bearer_auth(token("user", 5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn vendor_reaches_reports() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::Client::new()
        .get(srv.url("/pm-reports/daily/2024-01-01"))
        .bearer_auth(token("VENDOR", 3))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn employees_resolve_by_record_or_downgrade() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let client = reqwest::Client::new();

    let res = client
        .delete(srv.url("/pm-inventory/stock/1"))
        .bearer_auth(token("employee", 7))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // No employee record: guest rules, still on the employee service table.
    let res = client
        .get(srv.url("/pm-inventory/products/1"))
        .bearer_auth(token("employee", 8))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["caller"]["token_type"], "employee");
    assert_eq!(body["caller"]["effective_type"], "guest");

    let res = client
        .delete(srv.url("/pm-inventory/stock/1"))
        .bearer_auth(token("employee", 8))
        .send()
        .await
        .unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn bad_credentials_are_never_treated_as_guest() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let client = reqwest::Client::new();
    let now = Utc::now();

    let expired = mint_jwt(
        JWT_SECRET,
        json!({
            "id": 1, "type": "user",
            "iat": (now - ChronoDuration::hours(12)).timestamp(),
            "exp": (now - ChronoDuration::hours(2)).timestamp(),
        }),
    );
    let forged = mint_jwt(
        "some-other-secret",
        json!({ "id": 1, "type": "user", "exp": (now + ChronoDuration::hours(1)).timestamp() }),
    );
    let untyped = mint_jwt(
        JWT_SECRET,
        json!({ "id": 1, "exp": (now + ChronoDuration::hours(1)).timestamp() }),
    );

    // The guest role would allow this read for an anonymous caller.
    for credential in [expired, forged, untyped, "not-a-token".to_string()] {
        let res = client
            .get(srv.url("/pm-search/products/1"))
            .bearer_auth(credential)
            .send()
            .await
            .unwrap();
        assert_not_authorized(res).await;
    }
}

#[tokio::test]
async fn options_passes_on_a_matching_path() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, srv.url("/pm-shopping-cart/cart/42"))
        .bearer_auth(token("user", 42))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn guest_wildcard_opens_every_reachable_service() {
    let seed = r#"{ "roles": [ { "name": "guest", "permissions": [ { "path": "*", "action": "any" } ] } ] }"#;
    let srv = TestServer::spawn(seed, &[]).await;
    let client = reqwest::Client::new();

    let res = client.put(srv.url("/pm-orders/orders/1/lines/2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url("/pm-shopping-cart/cart/1"))
        .bearer_auth(token("user", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The gate still applies before any permission.
    let res = client.get(srv.url("/pm-reports/daily/1")).send().await.unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn public_paths_skip_authorization() {
    let srv = TestServer::spawn(SEED, &["/pm-accounts/login"]).await;
    let client = reqwest::Client::new();

    let res = client.post(srv.url("/pm-accounts/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["caller"].is_null());

    let res = client.post(srv.url("/pm-accounts/login/reset")).send().await.unwrap();
    assert_not_authorized(res).await;
}

#[tokio::test]
async fn path_without_relative_part_is_denied() {
    let srv = TestServer::spawn(SEED, &[]).await;
    let res = reqwest::get(srv.url("/pm-search")).await.unwrap();
    assert_not_authorized(res).await;
}

/// Send a request line verbatim; HTTP clients normalize dot segments away.
async fn send_raw(srv: &TestServer, method: &str, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let addr = srv.base_url.trim_start_matches("http://");
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn dot_segments_do_not_reach_another_service() {
    let seed = r#"{ "roles": [ { "name": "guest", "permissions": [ { "path": "*", "action": "any" } ] } ] }"#;
    let srv = TestServer::spawn(seed, &[]).await;

    let response = send_raw(&srv, "GET", "/pm-search/items/1").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    for path in [
        "/pm-search/../pm-reports/daily/1",
        "/pm-search/%2e%2e/pm-reports/daily/1",
        "/pm-search//pm-reports/daily/1",
    ] {
        let response = send_raw(&srv, "GET", path).await;
        assert!(response.starts_with("HTTP/1.1 401"), "{path}: {response}");
        assert!(response.ends_with("Not authorized"), "{path}: {response}");
    }
}

#[tokio::test]
async fn paths_without_an_upstream_route_are_still_authorized() {
    let srv = TestServer::spawn(SEED, &[]).await;

    let res = reqwest::get(srv.url("/")).await.unwrap();
    assert_not_authorized(res).await;
}
