//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use path_router::handler::{BoxHandler, Handler};
use path_router::routing::RouteInfo;
use path_router::Decorator;

/// A handler answering 200 with a fixed body.
pub fn text(body: &'static str) -> impl Handler {
    move |_req: Request<Body>| async move { body.into_response() }
}

pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    request(Method::GET, path)
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A decorator that counts how many handlers it has wrapped.
pub fn counting_decorator() -> (impl Decorator, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let decorator = move |inner: BoxHandler, _route: &RouteInfo| {
        counter.fetch_add(1, Ordering::SeqCst);
        inner
    };
    (decorator, count)
}

/// Poll `addr` until it accepts connections.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} never came up", addr);
}
