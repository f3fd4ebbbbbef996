// src/handlers/matching.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::UserType,
    services::matching_service::FilterRequest,
};

// ---
// Payload: busca de professores compatíveis com o perfil do aluno
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterTeachersPayload {
    pub student_type: UserType,
    pub country_id: Uuid,

    // Caminho escolar
    pub grade_id: Option<Uuid>,
    pub track_id: Option<Uuid>,

    // Caminho universitário (se ausente, usa o curso do perfil)
    pub major_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterTeachersResponse {
    pub teacher_ids: Vec<Uuid>,
}

// POST /api/teachers/filter
pub async fn filter_teachers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<FilterTeachersPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = FilterRequest {
        student_type: payload.student_type,
        country_id: payload.country_id,
        grade_id: payload.grade_id,
        track_id: payload.track_id,
        major_id: payload.major_id,
    };

    let teacher_ids = app_state
        .matching_service
        .find_matching_teachers(&request, Some(&user.0), Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(FilterTeachersResponse { teacher_ids })))
}
