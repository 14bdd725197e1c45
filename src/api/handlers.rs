use super::models::{ChartData, HistoryResponse, RatesResponse};
use super::page;
use crate::report::Reporter;
use axum::{extract::State, response::Html, response::Json};
use std::sync::Arc;

/// GET /health — simple liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// GET / — dashboard page. Every load runs a fresh fetch pass.
pub async fn index(State(reporter): State<Arc<Reporter>>) -> Html<String> {
    let report = reporter.collect().await;
    Html(page::render(&report))
}

/// GET /api/rates — current and 7-day figures for every configured market
pub async fn get_rates(State(reporter): State<Arc<Reporter>>) -> Json<RatesResponse> {
    Json(reporter.collect().await.into())
}

/// GET /api/history — 7-day funding rate series for charting
pub async fn get_history(State(reporter): State<Arc<Reporter>>) -> Json<HistoryResponse> {
    let report = reporter.collect().await;
    Json(HistoryResponse {
        generated_at: report.generated_at,
        chart: ChartData::from_report(&report),
    })
}
