//! Integration tests for the Bounded Fetcher against a local vendor stub
//!
//! Every test spins up its own axum server on an ephemeral port so no real
//! vendor is contacted.

#[cfg(test)]
mod fetcher_http_tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use ipfusion::fetcher::{HttpFetcher, SourceFetcher};
    use ipfusion::sources::{RequestSpec, SourceId};
    use ipfusion::types::SourceError;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn spawn_vendor() -> String {
        let app = Router::new()
            .route("/json", get(|| async { r#"{"country":"US","city":"Ashburn"}"# }))
            .route(
                "/nul",
                get(|| async {
                    "\u{0000}{\"country\":\"US\",\"org\":\"AS15169 Goo\u{0000}gle\"}\u{0000}"
                }),
            )
            .route(
                "/html",
                get(|| async { format!("<html>{}</html>", "blocked ".repeat(60)) }),
            )
            .route(
                "/forbidden",
                get(|| async { (StatusCode::FORBIDDEN, r#"{"message":"bad key"}"#) }),
            )
            .route(
                "/throttled",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, r#"{"message":"slow down"}"#) }),
            )
            .route(
                "/overloaded",
                get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            )
            .route(
                "/not-found",
                get(|| async { (StatusCode::NOT_FOUND, r#"{"error":true}"#) }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "{}"
                }),
            )
            .route(
                "/echo-key",
                get(|headers: HeaderMap| async move {
                    let key = headers
                        .get("key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    format!(r#"{{"key":"{}"}}"#, key)
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn spec(base: &str, path: &str) -> RequestSpec {
        RequestSpec::get(SourceId::Ipinfo, format!("{}{}", base, path))
    }

    #[tokio::test]
    async fn test_clean_json() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();

        let outcome = fetcher.fetch(&spec(&base, "/json"), Duration::from_secs(2)).await;

        assert_eq!(outcome.http_status, 200);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.raw_data.unwrap()["city"], "Ashburn");
        assert_eq!(outcome.source_id, "ipinfo");
    }

    #[tokio::test]
    async fn test_nul_bytes_around_json_recovered() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();

        let outcome = fetcher.fetch(&spec(&base, "/nul"), Duration::from_secs(2)).await;

        assert!(outcome.error.is_none());
        let data = outcome.raw_data.unwrap();
        assert_eq!(data["country"], "US");
        assert_eq!(data["org"], "AS15169 Google");
    }

    #[tokio::test]
    async fn test_non_json_body_sampled() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();

        let outcome = fetcher.fetch(&spec(&base, "/html"), Duration::from_secs(2)).await;

        assert_eq!(outcome.http_status, 200);
        assert_eq!(outcome.error, Some(SourceError::InvalidJson));
        let data = outcome.raw_data.unwrap();
        assert_eq!(data["error"], "Invalid JSON");
        let sample = data["rawText"].as_str().unwrap();
        assert!(sample.starts_with("<html>blocked"));
        assert!(sample.ends_with("..."));
        assert!(sample.chars().count() <= 203);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();
        let timeout = Duration::from_secs(2);

        let forbidden = fetcher.fetch(&spec(&base, "/forbidden"), timeout).await;
        assert_eq!(forbidden.http_status, 403);
        assert_eq!(forbidden.error, Some(SourceError::Forbidden));
        assert_eq!(forbidden.raw_data.unwrap()["message"], "bad key");

        let throttled = fetcher.fetch(&spec(&base, "/throttled"), timeout).await;
        assert_eq!(throttled.error, Some(SourceError::RateLimited));

        // 5xx label wins over the decode failure
        let overloaded = fetcher.fetch(&spec(&base, "/overloaded"), timeout).await;
        assert_eq!(overloaded.http_status, 502);
        assert_eq!(overloaded.error, Some(SourceError::ServerError));

        let missing = fetcher.fetch(&spec(&base, "/not-found"), timeout).await;
        assert_eq!(missing.http_status, 404);
        assert!(missing.error.is_none());
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_vendor() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();
        let request = spec(&base, "/slow");

        let outcome = fetcher.fetch(&request, Duration::from_millis(100)).await;

        assert_eq!(outcome.http_status, 0);
        assert!(outcome.raw_data.is_none());
        assert!(outcome.elapsed_millis >= 100);
        assert!(outcome.elapsed_millis < 2_000);
        match &outcome.error {
            Some(SourceError::Timeout { timeout_ms, url }) => {
                assert_eq!(*timeout_ms, 100);
                assert_eq!(url, &request.url);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(outcome.error.unwrap().to_string().contains("/slow"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new().unwrap();
        let request = RequestSpec::get(SourceId::Ipsb, format!("http://{}/geoip", addr));
        let outcome = fetcher.fetch(&request, Duration::from_secs(2)).await;

        assert_eq!(outcome.http_status, 0);
        match &outcome.error {
            Some(SourceError::Transport { url, .. }) => assert_eq!(url, &request.url),
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_credential_sent() {
        let base = spawn_vendor().await;
        let fetcher = HttpFetcher::new().unwrap();
        let request = RequestSpec {
            source: SourceId::Abuseipdb,
            url: format!("{}/echo-key", base),
            headers: vec![("Key".to_string(), "SECRET".to_string())],
        };

        let outcome = fetcher.fetch(&request, Duration::from_secs(2)).await;

        assert_eq!(outcome.raw_data.unwrap()["key"], "SECRET");
    }
}
