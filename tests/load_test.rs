//! Load testing for the gateway.

use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_load_performance() {
    // 1. Setup mock upstreams
    let users = common::start_echo_backend("users").await;
    let sales = common::start_echo_backend("sales").await;
    let frontend = common::start_echo_backend("frontend").await;

    // 2. Start gateway
    let mut config = common::gateway_config(&[users], &[sales], frontend);
    config.services[0].max_connections = 1000;
    config.services[1].max_connections = 1000;
    let gateway = common::start_gateway(config).await;

    // 3. Run load test across all three routes
    let concurrency = 20;
    let requests_per_task = 30;
    let total_requests = concurrency * requests_per_task;
    let paths = ["/api/users/1", "/sales/2", "/dashboard"];

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let base = gateway.url("");
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                let url = format!("{}{}", base, paths[(task + i) % paths.len()]);
                let req_start = Instant::now();
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies: Vec<Duration> = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    assert_eq!(all_latencies.len(), total_requests, "Every request should succeed");

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p95 = all_latencies[(all_latencies.len() as f64 * 0.95) as usize];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P95 Latency:    {:?}", p95);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");
}
