// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradesQuery {
    pub country_id: Option<Uuid>,
}

// GET /api/catalog/countries
pub async fn list_countries(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let countries = app_state.catalog_repo.list_countries().await?;
    Ok((StatusCode::OK, Json(countries)))
}

// GET /api/catalog/grades?countryId=...
pub async fn list_grades(
    State(app_state): State<AppState>,
    Query(query): Query<GradesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let grades = app_state.catalog_repo.list_grades(query.country_id).await?;
    Ok((StatusCode::OK, Json(grades)))
}

// GET /api/catalog/tracks
pub async fn list_tracks(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let tracks = app_state.catalog_repo.list_tracks().await?;
    Ok((StatusCode::OK, Json(tracks)))
}

// GET /api/catalog/majors
pub async fn list_majors(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let majors = app_state.catalog_repo.list_majors().await?;
    Ok((StatusCode::OK, Json(majors)))
}

// GET /api/catalog/majors/{id}/subjects
pub async fn list_major_subjects(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = app_state.catalog_repo.subjects_for_major(id).await?;
    Ok((StatusCode::OK, Json(subjects)))
}

// GET /api/catalog/subjects
pub async fn list_subjects(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = app_state.catalog_repo.list_subjects().await?;
    Ok((StatusCode::OK, Json(subjects)))
}
