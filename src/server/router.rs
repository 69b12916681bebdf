//! Route table and middleware stack.
//!
//! Collection routes answer with and without a trailing slash.

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Build the read-only query router.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    with_layers(routes(), request_timeout).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/", get(handlers::list_patients))
        .route("/patients/:id", get(handlers::get_patient))
        .route("/stats", get(handlers::stats))
        .route("/stats/", get(handlers::stats))
        .route("/stats/breakdown", get(handlers::stroke_breakdown))
        .route("/stats/breakdown/", get(handlers::stroke_breakdown))
}

/// Layers, outermost first: request tracing, then the per-request timeout
/// (answers 408 when exceeded).
fn with_layers(router: Router<AppState>, request_timeout: Duration) -> Router<AppState> {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::data_types::{Gender, PatientRecord, SmokingStatus};
    use crate::dataset::PatientDataset;

    fn state() -> AppState {
        let dataset = PatientDataset::from_records(vec![PatientRecord {
            id: 7,
            gender: Gender::Female,
            age: 0.0,
            hypertension: 0,
            heart_disease: 0,
            avg_glucose_level: 80.0,
            bmi: None,
            smoking_status: SmokingStatus::Unknown,
            stroke: 0,
        }])
        .unwrap();
        AppState::new(Arc::new(dataset))
    }

    fn app() -> Router {
        build_router(state(), Duration::from_secs(5))
    }

    async fn get_status(uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn trailing_slash_variants_are_routed() {
        for uri in ["/patients", "/patients/", "/stats", "/stats/", "/stats/breakdown/"] {
            let (status, _) = get_status(uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn non_integer_id_is_bad_request() {
        let (status, json) = get_status("/patients/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = get_status("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn slow_request_times_out_with_408() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "done"
        }

        let router = routes().route("/slow", get(slow));
        let app = with_layers(router, Duration::from_millis(20)).with_state(state());

        let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        // fast routes behind the same layers are unaffected
        let req = Request::builder().uri("/stats/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
