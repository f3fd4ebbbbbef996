// src/handlers/availabilities.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, RequireRole, TeacherRole},
    models::availability::AvailabilityWithTags,
    services::availability_service::{
        BulkCreateResult, BulkDeleteResult, HourPick, SlotInput,
    },
};

// ---
// Payload: bloco de horário
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,

    pub color: Option<String>,

    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub date: NaiveDate,

    #[validate(range(min = 0, max = 23, message = "As horas precisam estar entre 0 e 23."))]
    pub start_hour: i32,

    #[validate(range(min = 0, max = 23, message = "As horas precisam estar entre 0 e 23."))]
    pub end_hour: i32,

    #[serde(default)]
    pub for_school_students: bool,

    #[serde(default)]
    pub for_university_students: bool,

    #[serde(default)]
    pub grade_ids: Vec<Uuid>,

    #[serde(default)]
    pub track_ids: Vec<Uuid>,

    #[serde(default)]
    pub subject_ids: Vec<Uuid>,
}

impl AvailabilityPayload {
    fn into_input(self) -> SlotInput {
        SlotInput {
            title: self.title,
            color: self.color,
            date: self.date,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            for_school_students: self.for_school_students,
            for_university_students: self.for_university_students,
            grade_ids: self.grade_ids,
            track_ids: self.track_ids,
            subject_ids: self.subject_ids,
        }
    }
}

// POST /api/availabilities
#[utoipa::path(
    post,
    path = "/api/availabilities",
    tag = "Availabilities",
    request_body = AvailabilityPayload,
    responses(
        (status = 201, description = "Horário publicado", body = AvailabilityWithTags),
        (status = 400, description = "Campos inválidos ou sobreposição de horário"),
        (status = 403, description = "Apenas professores publicam horários")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_availability(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Json(payload): Json<AvailabilityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state
        .availability_service
        .create(user.0.id, &payload.into_input(), Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/availabilities/{id}
#[utoipa::path(
    put,
    path = "/api/availabilities/{id}",
    tag = "Availabilities",
    request_body = AvailabilityPayload,
    params(("id" = Uuid, Path, description = "ID do horário")),
    responses(
        (status = 200, description = "Horário atualizado", body = AvailabilityWithTags),
        (status = 403, description = "O horário pertence a outro professor"),
        (status = 404, description = "Horário não encontrado"),
        (status = 409, description = "Horário já reservado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_availability(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let updated = app_state
        .availability_service
        .update(user.0.id, id, &payload.into_input(), Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/availabilities/{id}
#[utoipa::path(
    delete,
    path = "/api/availabilities/{id}",
    tag = "Availabilities",
    params(("id" = Uuid, Path, description = "ID do horário")),
    responses(
        (status = 204, description = "Horário excluído"),
        (status = 403, description = "O horário pertence a outro professor"),
        (status = 404, description = "Horário não encontrado"),
        (status = 423, description = "Reserva começa em menos de 8 horas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_availability(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .availability_service
        .delete(user.0.id, id, Utc::now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/availabilities/mine
#[utoipa::path(
    get,
    path = "/api/availabilities/mine",
    tag = "Availabilities",
    responses(
        (status = 200, description = "Horários do professor autenticado", body = Vec<AvailabilityWithTags>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_availabilities(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
) -> Result<impl IntoResponse, AppError> {
    let blocks = app_state.availability_service.list_mine(user.0.id).await?;
    Ok((StatusCode::OK, Json(blocks)))
}

// ---
// Payload: criação em massa a partir de horas avulsas do calendário
// ---
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourPickPayload {
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub date: NaiveDate,
    pub hour: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreatePayload {
    #[validate(length(min = 1, message = "Selecione pelo menos uma hora."))]
    pub slots: Vec<HourPickPayload>,

    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,

    pub color: Option<String>,

    #[serde(default)]
    pub for_school_students: bool,

    #[serde(default)]
    pub for_university_students: bool,

    #[serde(default)]
    pub grade_ids: Vec<Uuid>,

    #[serde(default)]
    pub track_ids: Vec<Uuid>,

    #[serde(default)]
    pub subject_ids: Vec<Uuid>,
}

// POST /api/availabilities/bulk
#[utoipa::path(
    post,
    path = "/api/availabilities/bulk",
    tag = "Availabilities",
    request_body = BulkCreatePayload,
    responses(
        (status = 200, description = "Resultado particionado: blocos criados e erros por data", body = BulkCreateResult)
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_create_availabilities(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Json(payload): Json<BulkCreatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let picks: Vec<HourPick> = payload
        .slots
        .iter()
        .map(|s| HourPick { date: s.date, hour: s.hour })
        .collect();

    // As datas e horas de cada bloco vêm do agrupamento; o restante é o
    // modelo comum a todos.
    let template = SlotInput {
        title: payload.title,
        color: payload.color,
        date: NaiveDate::default(),
        start_hour: 0,
        end_hour: 0,
        for_school_students: payload.for_school_students,
        for_university_students: payload.for_university_students,
        grade_ids: payload.grade_ids,
        track_ids: payload.track_ids,
        subject_ids: payload.subject_ids,
    };

    let result = app_state
        .availability_service
        .bulk_create(user.0.id, &picks, &template, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

// ---
// Payload: exclusão em massa
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeletePayload {
    #[validate(length(min = 1, message = "Informe pelo menos um horário."))]
    pub ids: Vec<Uuid>,
}

// POST /api/availabilities/bulk-delete
#[utoipa::path(
    post,
    path = "/api/availabilities/bulk-delete",
    tag = "Availabilities",
    request_body = BulkDeletePayload,
    responses(
        (status = 200, description = "Contagem de excluídos e bloqueados com motivo", body = BulkDeleteResult)
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete_availabilities(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .availability_service
        .bulk_delete(user.0.id, &payload.ids, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(result)))
}
