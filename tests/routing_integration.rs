//! End-to-end routing and rewrite tests against mock upstreams.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use api_gateway::config::schema::RewriteConfig;
use api_gateway::config::RouteConfig;
use api_gateway::http::HttpServer;
use api_gateway::load_balancer::backend::{Backend, BackendConnectionGuard};
use api_gateway::load_balancer::{DiscoveryError, ServiceResolver};

mod common;

async fn default_gateway() -> common::TestGateway {
    let users = common::start_echo_backend("users").await;
    let sales = common::start_echo_backend("sales").await;
    let frontend = common::start_echo_backend("frontend").await;
    common::start_gateway(common::gateway_config(&[users], &[sales], frontend)).await
}

#[tokio::test]
async fn test_api_users_rewritten_to_users_service() {
    let gateway = default_gateway().await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/api/users/123")).await;
    assert_eq!(echo["backend"], "users");
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/users/123");
}

#[tokio::test]
async fn test_users_path_forwarded_unchanged() {
    let gateway = default_gateway().await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/users/7/orders")).await;
    assert_eq!(echo["backend"], "users");
    assert_eq!(echo["path"], "/users/7/orders");
}

#[tokio::test]
async fn test_sales_prefix_stripped_and_body_preserved() {
    let gateway = default_gateway().await;
    let client = common::client();

    let res = client
        .post(gateway.url("/sales/456"))
        .header("content-type", "application/json")
        .body(r#"{"amount":42}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let echo: serde_json::Value = res.json().await.unwrap();
    assert_eq!(echo["backend"], "sales");
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["path"], "/456");
    assert_eq!(echo["body"], r#"{"amount":42}"#);
    assert_eq!(echo["headers"]["content-type"], "application/json");
    assert_eq!(echo["headers"]["x-forwarded-prefix"], "/sales");
}

#[tokio::test]
async fn test_api_sales_root_becomes_slash() {
    let gateway = default_gateway().await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/api/sales")).await;
    assert_eq!(echo["backend"], "sales");
    assert_eq!(echo["path"], "/");
    assert_eq!(echo["headers"]["x-forwarded-prefix"], "/api/sales");

    let echo = common::get_echo(&client, &gateway.url("/sales")).await;
    assert_eq!(echo["path"], "/");
    assert_eq!(echo["headers"]["x-forwarded-prefix"], "/sales");
}

#[tokio::test]
async fn test_other_paths_go_to_frontend_unmodified() {
    let gateway = default_gateway().await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/dashboard")).await;
    assert_eq!(echo["backend"], "frontend");
    assert_eq!(echo["path"], "/dashboard");

    let echo = common::get_echo(&client, &gateway.url("/")).await;
    assert_eq!(echo["backend"], "frontend");
    assert_eq!(echo["path"], "/");

    // Not a users route: the segment boundary matters.
    let echo = common::get_echo(&client, &gateway.url("/usersettings")).await;
    assert_eq!(echo["backend"], "frontend");
}

#[tokio::test]
async fn test_query_string_preserved() {
    let gateway = default_gateway().await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/api/users/1?expand=orders&page=2")).await;
    assert_eq!(echo["path"], "/users/1");
    assert_eq!(echo["query"], "expand=orders&page=2");
}

#[tokio::test]
async fn test_forwarding_headers() {
    let gateway = default_gateway().await;
    let client = common::client();

    let res = client
        .get(gateway.url("/api/users/1"))
        .header("x-request-id", "test-request-1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "test-request-1");

    let echo: serde_json::Value = res.json().await.unwrap();
    let headers = &echo["headers"];
    assert_eq!(headers["x-request-id"], "test-request-1");
    assert_eq!(headers["x-forwarded-for"], "127.0.0.1");
    assert_eq!(headers["x-forwarded-proto"], "http");
    assert_eq!(headers["x-forwarded-host"], gateway.addr.to_string());
    assert_eq!(headers["x-forwarded-prefix"], "/api");
    assert_ne!(headers["host"], gateway.addr.to_string());
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let gateway = default_gateway().await;
    let client = common::client();

    let res = client.get(gateway.url("/dashboard")).send().await.unwrap();
    let id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(id.len(), 36);

    let echo: serde_json::Value = res.json().await.unwrap();
    assert_eq!(echo["headers"]["x-request-id"], id.as_str());
}

#[tokio::test]
async fn test_upstream_error_status_passed_through() {
    let users = common::start_programmable_backend(|_req| async {
        let response: Response = (StatusCode::NOT_FOUND, "user 999 not found").into_response();
        response
    })
    .await;
    let sales = common::start_echo_backend("sales").await;
    let frontend = common::start_echo_backend("frontend").await;
    let gateway = common::start_gateway(common::gateway_config(&[users], &[sales], frontend)).await;

    let res = common::client().get(gateway.url("/api/users/999")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "user 999 not found");
}

#[tokio::test]
async fn test_round_robin_alternates_instances() {
    let u1 = common::start_echo_backend("u1").await;
    let u2 = common::start_echo_backend("u2").await;
    let sales = common::start_echo_backend("sales").await;
    let frontend = common::start_echo_backend("frontend").await;
    let gateway = common::start_gateway(common::gateway_config(&[u1, u2], &[sales], frontend)).await;
    let client = common::client();

    let mut seen = Vec::new();
    for _ in 0..4 {
        let echo = common::get_echo(&client, &gateway.url("/users/1")).await;
        seen.push(echo["backend"].as_str().unwrap().to_string());
    }
    assert_ne!(seen[0], seen[1]);
    assert_eq!(seen[0], seen[2]);
    assert_eq!(seen[1], seen[3]);
}

#[tokio::test]
async fn test_no_matching_route_is_404_json() {
    let users = common::start_echo_backend("users").await;
    let sales = common::start_echo_backend("sales").await;
    let frontend = common::start_echo_backend("frontend").await;

    let mut config = common::gateway_config(&[users], &[sales], frontend);
    config.routes = vec![RouteConfig {
        name: "users".into(),
        paths: vec!["/api/users/**".into()],
        methods: vec!["GET".into()],
        rewrites: vec![RewriteConfig {
            pattern: "^/api/users(?<segment>/?.*)$".into(),
            replacement: "/users${segment}".into(),
        }],
        uri: "lb://users-service".into(),
    }];
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let res = client.get(gateway.url("/reports/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/reports/1");
    assert_eq!(body["requestId"], request_id.as_str());

    // Method predicate: DELETE is not accepted by the only route.
    let res = client.delete(gateway.url("/api/users/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[derive(Debug)]
struct FixedResolver(Arc<Backend>);

impl ServiceResolver for FixedResolver {
    fn resolve(&self, service: &str) -> Result<BackendConnectionGuard, DiscoveryError> {
        self.0
            .try_create_guard()
            .ok_or_else(|| DiscoveryError::NoAvailableInstance(service.to_string()))
    }
}

#[tokio::test]
async fn test_custom_resolver_replaces_static_registry() {
    let registry_users = common::start_echo_backend("registry").await;
    let discovered = common::start_echo_backend("discovered").await;
    let frontend = common::start_echo_backend("frontend").await;

    let config = common::gateway_config(&[registry_users], &[registry_users], frontend);
    let backend = Backend::new("any", &format!("http://{}", discovered), 10).unwrap();
    let server = HttpServer::with_resolver(config, Arc::new(FixedResolver(Arc::new(backend)))).unwrap();
    let gateway = common::start_server(server).await;
    let client = common::client();

    let echo = common::get_echo(&client, &gateway.url("/api/users/3")).await;
    assert_eq!(echo["backend"], "discovered");
    assert_eq!(echo["path"], "/users/3");

    let echo = common::get_echo(&client, &gateway.url("/sales/4")).await;
    assert_eq!(echo["backend"], "discovered");
    assert_eq!(echo["path"], "/4");

    let echo = common::get_echo(&client, &gateway.url("/home")).await;
    assert_eq!(echo["backend"], "frontend");
}
