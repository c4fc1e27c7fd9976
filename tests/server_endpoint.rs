//! End-to-end tests for the query endpoint
//!
//! The router runs on a real listener with a stub fetcher behind it, and is
//! driven over HTTP with reqwest.

#[cfg(test)]
mod server_endpoint_tests {
    use async_trait::async_trait;
    use ipfusion::config::ServerConfig;
    use ipfusion::fetcher::SourceFetcher;
    use ipfusion::server::{router, AppState};
    use ipfusion::sources::RequestSpec;
    use ipfusion::types::QueryOutcome;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct StubFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceFetcher for StubFetcher {
        async fn fetch(&self, spec: &RequestSpec, _timeout: Duration) -> QueryOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            QueryOutcome {
                source_id: spec.source.to_string(),
                raw_data: Some(json!({
                    "ip": "8.8.8.8",
                    "country": "US",
                    "city": "Mountain View",
                    "org": "AS15169 Google LLC",
                })),
                standardized: None,
                elapsed_millis: 3,
                http_status: 200,
                error: None,
            }
        }
    }

    async fn spawn_server() -> (String, Arc<StubFetcher>) {
        let fetcher = Arc::new(StubFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = AppState::new(&ServerConfig::default(), fetcher.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        (format!("http://{}", addr), fetcher)
    }

    #[tokio::test]
    async fn test_single_source_query() {
        let (base, _fetcher) = spawn_server().await;

        let response = reqwest::get(format!("{}/?ip=8.8.8.8&api=ipinfo", base))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
        assert!(response.headers().get("content-encoding").is_none());

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["ip"], "8.8.8.8");
        let ipinfo = &body["results"]["ipinfo"];
        assert_eq!(ipinfo["status"], 200);
        assert_eq!(ipinfo["error"], Value::Null);
        assert_eq!(ipinfo["standardized"]["country"], "US");
        assert_eq!(ipinfo["standardized"]["asn"], "AS15169");
        assert_eq!(body["results"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_ip_rejected() {
        let (base, fetcher) = spawn_server().await;

        for query in ["ip=not-an-ip", "ip=1.2.3.256", "ip=", "api=ipinfo"] {
            let response = reqwest::get(format!("{}/?{}", base, query)).await.unwrap();
            assert_eq!(response.status(), 400, "query {}", query);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body, json!({"error": "Invalid IP"}));
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_twenty_first_request_rate_limited() {
        let (base, _fetcher) = spawn_server().await;
        let client = reqwest::Client::new();
        let url = format!("{}/?ip=1.1.1.1&api=ipinfo", base);

        for i in 0..20 {
            let response = client
                .get(&url)
                .header("CF-Connecting-IP", "198.51.100.7")
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200, "request {}", i + 1);
        }

        let response = client
            .get(&url)
            .header("CF-Connecting-IP", "198.51.100.7")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 429);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": "Rate limit exceeded"}));

        // Another client is unaffected
        let response = client
            .get(&url)
            .header("CF-Connecting-IP", "198.51.100.8")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_keyed_source_without_key() {
        let (base, fetcher) = spawn_server().await;

        let body: Value = reqwest::get(format!("{}/?ip=::1&api=IPQS&order=sequential", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["results"]["ipqs"]["error"], "missing_config_or_key");
        assert_eq!(body["results"]["ipqs"]["status"], 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_sources_with_one_key() {
        let (base, fetcher) = spawn_server().await;

        let body: Value = reqwest::get(format!("{}/?ip=8.8.8.8&ipqs_key=abc&debug=1", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let results = body["results"].as_object().unwrap();
        assert_eq!(results.len(), 15);
        assert_eq!(results["ipqs"]["error"], Value::Null);
        assert_eq!(results["vpnapi"]["error"], "missing_config_or_key");
        // 10 keyless sources plus ipqs
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_non_get_method_rejected_without_fan_out() {
        let (base, fetcher) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/?ip=8.8.8.8&api=ipinfo", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 405);

        let response = client
            .delete(format!("{}/?ip=8.8.8.8", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 405);

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let (base, fetcher) = spawn_server().await;

        let response = reqwest::get(format!("{}/favicon.ico?ip=8.8.8.8", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    /// Rejected methods do not spend the caller's admission budget
    #[tokio::test]
    async fn test_rejected_method_does_not_consume_rate_limit() {
        let (base, _fetcher) = spawn_server().await;
        let client = reqwest::Client::new();

        for _ in 0..25 {
            client
                .post(format!("{}/?ip=8.8.8.8&api=ipinfo", base))
                .header("CF-Connecting-IP", "198.51.100.7")
                .send()
                .await
                .unwrap();
        }

        let response = client
            .get(format!("{}/?ip=8.8.8.8&api=ipinfo", base))
            .header("CF-Connecting-IP", "198.51.100.7")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn test_state_reflects_config() {
        let config = ServerConfig {
            max_concurrent: 5,
            rate_limit: 40,
            rate_window_ms: 30_000,
            ..ServerConfig::default()
        };
        let fetcher = Arc::new(StubFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = AppState::new(&config, fetcher);

        assert_eq!(state.aggregator.max_concurrent(), 5);
        assert_eq!(state.limiter.limit(), 40);
        assert_eq!(state.limiter.window(), Duration::from_millis(30_000));
        assert_eq!(&*state.client_ip_header, "CF-Connecting-IP");
    }

    #[tokio::test]
    async fn test_healthz() {
        let (base, _fetcher) = spawn_server().await;
        let text = reqwest::get(format!("{}/healthz", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }
}
