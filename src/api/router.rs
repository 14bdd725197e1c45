use super::handlers;
use crate::report::Reporter;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the dashboard router with all routes and shared state.
pub fn build(reporter: Arc<Reporter>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/rates", get(handlers::get_rates))
        .route("/api/history", get(handlers::get_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::mock::MockExchange;
    use crate::models::MarketId;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let exchange = MockExchange::new("alpha")
            .with_market("ETHUSDT", 0.0001, &[0.0001, 0.0002])
            .with_failing_market("FOO/BAR");
        let reporter = Reporter::new(
            vec![Box::new(exchange)],
            vec![MarketId::new("alpha", "ETHUSDT"), MarketId::new("alpha", "FOO/BAR")],
            3,
            Duration::from_secs(5),
        );
        build(Arc::new(reporter))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(get("/health").await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn rates_include_placeholder_rows() {
        let (status, body) = get("/api/rates").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["rows"][0]["funding_rate"], 0.0001);
        assert_eq!(json["rows"][0]["samples"], 2);
        assert!(json["rows"][1]["apy"].is_null());
        assert_eq!(json["rows"][1]["error"], "alpha rejected FOO/BAR");
    }

    #[tokio::test]
    async fn history_has_one_series_per_fetched_market() {
        let (_, body) = get("/api/history").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["chart"]["datasets"].as_array().unwrap().len(), 1);
        assert_eq!(json["chart"]["labels"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn index_renders_table_errors_and_refresh() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Perpetual Futures Funding APY</h1>"));
        assert!(body.contains("Refresh</button>"));
        assert!(body.contains("<td>FOO/BAR</td>"));
        assert!(body.contains(r#"<p class="error">Error: alpha:FOO/BAR: alpha rejected FOO/BAR</p>"#));
        assert!(body.contains(r#"<td class="num">11.57</td>"#));
        assert!(body.contains(r#""label":"alpha:ETHUSDT""#));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _) = get("/scores").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
