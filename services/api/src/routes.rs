use crate::infra::{deserialize_optional_date, ranking_params, AlmOptions, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use draw_order::error::AppError;
use draw_order::workflows::draw::report::views::DrawOrderView;
use draw_order::workflows::draw::{DrawOrderEngine, DrawOrderReport, ExportView};
use draw_order::workflows::intake::{RawTable, TableImporter, TableIntakeError, TableSelection};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DrawOrderRequest {
    /// Delimited export with a header row.
    #[serde(default)]
    pub(crate) csv: Option<String>,
    /// Grids returned by a table-extraction service.
    #[serde(default)]
    pub(crate) tables: Option<Vec<Vec<Vec<String>>>>,
    /// 1-based pick among `tables`.
    #[serde(default)]
    pub(crate) table: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) near_window_days: Option<u32>,
    #[serde(default)]
    pub(crate) target_amount: Option<f64>,
    #[serde(default)]
    pub(crate) alm: Option<AlmOptions>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrawOrderExportRequest {
    #[serde(flatten)]
    pub(crate) request: DrawOrderRequest,
    #[serde(default)]
    pub(crate) view: ExportView,
}

impl DrawOrderRequest {
    fn load_table(&mut self) -> Result<RawTable, TableIntakeError> {
        let selection = self.table.map(TableSelection).unwrap_or_default();
        if let Some(csv) = self.csv.take() {
            TableImporter::from_reader(Cursor::new(csv.into_bytes()))
        } else if let Some(grids) = self.tables.take() {
            TableImporter::from_grids(grids, selection)
        } else {
            Err(TableIntakeError::NoInput)
        }
    }

    fn rank(mut self, state: &AppState) -> Result<DrawOrderReport, AppError> {
        let table = self.load_table()?;
        let params = ranking_params(
            &state.ranking,
            self.near_window_days,
            self.target_amount,
            self.alm.take(),
        )?;
        let today = self.today.unwrap_or_else(|| state.ranking.today());

        let report = DrawOrderEngine::new(params)?.run(&table, today)?;
        Ok(report)
    }
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/draw-order",
            axum::routing::post(draw_order_endpoint),
        )
        .route(
            "/api/v1/draw-order/export",
            axum::routing::post(draw_order_export_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn draw_order_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<DrawOrderRequest>,
) -> Result<Json<DrawOrderView>, AppError> {
    let report = payload.rank(&state)?;
    Ok(Json(report.view()))
}

pub(crate) async fn draw_order_export_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<DrawOrderExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let DrawOrderExportRequest { request, view } = payload;
    let report = request.rank(&state)?;
    let body = report.to_csv(view)?;
    info!(?view, bytes = body.len(), "rendered draw order export");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use draw_order::config::RankingDefaults;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SAMPLE_CSV: &str = "Date of availability,ROI,Amount to be drawn,Tenor,Type\n\
2025-10-06,8,100,90,ST\n\
2025-10-09,7,100,90,ST\n\
2025-10-16,5,100,120,LT\n\
2025-09-30,1,100,30,ST\n";

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            ranking: RankingDefaults::default(),
        }
    }

    fn app(ready: bool) -> axum::Router {
        router().layer(Extension(state(ready)))
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn draw_order_endpoint_ranks_csv() {
        let request = DrawOrderRequest {
            csv: Some(SAMPLE_CSV.to_string()),
            today: NaiveDate::from_ymd_opt(2025, 10, 1),
            target_amount: Some(150.0),
            ..DrawOrderRequest::default()
        };

        let Json(view) = draw_order_endpoint(Extension(state(true)), Json(request))
            .await
            .expect("ranking succeeds");

        let sources: Vec<usize> = view.order.iter().map(|line| line.source_row).collect();
        assert_eq!(sources, vec![2, 1, 3, 4]);
        assert_eq!(view.summary.within_window, 2);
        let plan = view.plan.expect("plan requested");
        assert_eq!(plan.total_picked, 150.0);
        assert!(plan.fully_covered);
    }

    #[tokio::test]
    async fn draw_order_route_accepts_extracted_tables() {
        let body = json!({
            "tables": [
                [["Lender", "Limit"], ["A", "10"]],
                [["Availability", "Rate", "Amt"], ["2025-10-03", "6.5", "40"], ["2025-10-02", "6.5", "40"]]
            ],
            "table": 2,
            "today": "2025-10-01",
            "alm": { "weight": 2.0, "mismatch": { "Over 2 Months & upto 6 Months": 5.0 } }
        });

        let response = app(true)
            .oneshot(post("/api/v1/draw-order", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["order"][0]["source_row"], 2);
        assert_eq!(payload["order"][0]["alm"]["priority_score"], -10.0);
        assert_eq!(payload["summary"]["alm_enabled"], true);
    }

    #[tokio::test]
    async fn missing_columns_return_detected_headers() {
        let body = json!({ "csv": "Lender,Tenor\nA,90\n", "today": "2025-10-01" });
        let response = app(true)
            .oneshot(post("/api/v1/draw-order", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let payload = json_body(response).await;
        assert_eq!(payload["detected_columns"], json!(["Lender", "Tenor"]));
    }

    #[tokio::test]
    async fn request_without_table_is_rejected() {
        let response = app(true)
            .oneshot(post("/api/v1/draw-order", json!({ "today": "2025-10-01" })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn export_route_returns_plan_csv() {
        let body = json!({
            "csv": SAMPLE_CSV,
            "today": "2025-10-01",
            "target_amount": 150.0,
            "view": "plan"
        });
        let response = app(true)
            .oneshot(post("/api/v1/draw-order/export", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Amount Available,Picked Amount,Remaining After Pick"));
        assert_eq!(lines[2], "2025-10-06,8,100,90,ST,100,50,0");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
