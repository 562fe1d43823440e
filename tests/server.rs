//! End-to-end tests against a running server.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use path_router::config::{parse_config, RouterConfig};
use path_router::{HttpServer, Shutdown};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const CONFIG: &str = r#"
[listener]
bind_address = "127.0.0.1:0"

[auth]
header = "x-api-key"
value = "secret"
exempt_routes = ["home"]

[[routes]]
name = "home"
pattern = "/"
methods = ["GET"]
response = { body = "welcome" }

[[routes]]
name = "items"
pattern = '/items/\d+'
methods = ["GET", "DELETE"]
response = { body = "item", content_type = "application/json" }
"#;

struct TestServer {
    addr: SocketAddr,
    updates: mpsc::UnboundedSender<RouterConfig>,
    shutdown: Shutdown,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(config: RouterConfig) -> Self {
        let server = HttpServer::new(config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (updates, rx) = mpsc::unbounded_channel();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(server.run(listener, rx, shutdown.subscribe()));
        common::wait_for_listener(addr).await;

        Self {
            addr,
            updates,
            shutdown,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop");
        result.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_serves_configured_routes() {
    let server = TestServer::start(parse_config(CONFIG).unwrap()).await;
    let client = reqwest::Client::new();

    let home = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    assert_eq!(home.headers()["access-control-allow-origin"], "*");
    assert!(home.headers().contains_key("x-request-id"));
    assert_eq!(home.text().await.unwrap(), "welcome");

    let missing = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(missing.text().await.unwrap().contains("/missing"));

    let wrong_method = client.post(server.url("/")).send().await.unwrap();
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong_method.headers()["allow"], "GET");

    server.stop().await;
}

#[tokio::test]
async fn test_auth_middleware() {
    let server = TestServer::start(parse_config(CONFIG).unwrap()).await;
    let client = reqwest::Client::new();

    let anonymous = client.get(server.url("/items/1")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.headers()["access-control-allow-origin"], "*");

    let wrong_key = client
        .get(server.url("/items/1"))
        .header("x-api-key", "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::FORBIDDEN);

    let authorized = client
        .get(server.url("/items/1"))
        .header("x-api-key", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
    assert_eq!(authorized.headers()["content-type"], "application/json");
    assert_eq!(authorized.text().await.unwrap(), "item");

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = TestServer::start(parse_config(CONFIG).unwrap()).await;

    let response = reqwest::Client::new()
        .get(server.url("/"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    server.stop().await;
}

#[tokio::test]
async fn test_route_update_applies_while_serving() {
    let config = parse_config(CONFIG).unwrap();
    let server = TestServer::start(config.clone()).await;
    let client = reqwest::Client::new();

    let mut next = config;
    next.routes[0].response.body = "welcome back".into();
    next.routes.remove(1);
    next.routes.push(
        parse_config(
            r#"
            [[routes]]
            name = "health"
            pattern = "/health"
            response = { body = "ok" }
            "#,
        )
        .unwrap()
        .routes
        .remove(0),
    );
    server.updates.send(next).unwrap();

    let mut body = String::new();
    for _ in 0..50 {
        body = client.get(server.url("/")).send().await.unwrap().text().await.unwrap();
        if body == "welcome back" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body, "welcome back");

    // Middlewares are fixed at startup, so the new route is guarded too.
    let health = client
        .get(server.url("/health"))
        .header("x-api-key", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    // Removed under the default policy.
    let items = client
        .get(server.url("/items/1"))
        .header("x-api-key", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(items.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_update_keeps_routes() {
    let config = parse_config(CONFIG).unwrap();
    let server = TestServer::start(config.clone()).await;

    let mut broken = config;
    broken.routes[0].pattern = "/(".into();
    server.updates.send(broken).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let home = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    assert_eq!(home.text().await.unwrap(), "welcome");

    server.stop().await;
}
