//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_gateway::config::GatewayConfig;
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::Shutdown;
use axum::{
    body::Bytes,
    extract::Request,
    http::{HeaderMap, Method, Uri},
    response::Response,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that answers every request with a JSON description of
/// what it received.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let app = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        Json(json!({
            "backend": name,
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "body": String::from_utf8_lossy(&body),
            "headers": headers,
        }))
    });
    serve(app).await
}

/// Start a backend whose responses are produced by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let f = Arc::new(f);
    let app = Router::new().fallback(move |req: Request| {
        let f = f.clone();
        async move { f(req).await }
    });
    serve(app).await
}

/// Start a backend that accepts connections and closes them without
/// answering. The counter tracks accepted connections.
pub async fn start_dropping_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (addr, accepted)
}

/// Gateway config pointing the default route table at the given upstreams.
pub fn gateway_config(users: &[SocketAddr], sales: &[SocketAddr], frontend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.frontend.uri = format!("http://{}", frontend);
    config.services[0].instances = users.iter().map(|a| format!("http://{}", a)).collect();
    config.services[1].instances = sales.iter().map(|a| format!("http://{}", a)).collect();
    config.health_check.enabled = false;
    config.observability.metrics_enabled = false;
    config
}

/// A running gateway under test.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let server = HttpServer::new(config).unwrap();
    start_server(server).await
}

pub async fn start_server(server: HttpServer) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway {
        addr,
        shutdown,
        updates,
    }
}

/// Non-pooled client that ignores proxy environment variables.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// GET `url` and parse the echo body.
pub async fn get_echo(client: &reqwest::Client, url: &str) -> Value {
    let res = client.get(url).send().await.expect("Gateway unreachable");
    assert!(res.status().is_success(), "unexpected status {}", res.status());
    res.json().await.unwrap()
}
