//! Request handlers. Each one delegates to `PatientService` and turns the
//! result into JSON.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::analytics::{PatientFilter, StatisticsSummary, StrokeBreakdown};
use crate::constants::WELCOME_MESSAGE;
use crate::data_types::PatientRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// `GET /patients/?gender=&stroke=&max_age=`
pub async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<PatientFilter>, QueryRejection>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    let Query(filter) = query?;
    // Filtering runs on the blocking pool; with `parallel` it fans out on rayon.
    let service = state.service.clone();
    let patients = tokio::task::spawn_blocking(move || service.filter_patients(&filter))
        .await
        .map_err(|e| ApiError::Internal(format!("filter task failed: {e}")))??;
    Ok(Json(patients))
}

/// `GET /patients/:id`
pub async fn get_patient(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PatientRecord>, ApiError> {
    let Path(id) = id?;
    let patient = state.service.get_by_id(id)?;
    Ok(Json(patient))
}

/// `GET /stats/`
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatisticsSummary>, ApiError> {
    Ok(Json(state.service.compute_statistics()?))
}

/// `GET /stats/breakdown/`
pub async fn stroke_breakdown(
    State(state): State<AppState>,
) -> Result<Json<StrokeBreakdown>, ApiError> {
    Ok(Json(state.service.stroke_breakdown()?))
}
