// src/handlers/prices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, RequireRole, TeacherRole},
    models::auth::UserType,
};

// ---
// Payload: preço por hora do professor
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePricePayload {
    pub student_type: UserType,
    pub subject_id: Uuid,

    // Obrigatória para aluno escolar, proibida para universitário.
    pub grade_id: Option<Uuid>,

    #[schema(example = "40.00")]
    pub price_per_hour: Decimal,
}

// POST /api/prices
pub async fn create_price(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Json(payload): Json<CreatePricePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let price = app_state
        .pricing_service
        .create_price(
            user.0.id,
            payload.student_type,
            payload.subject_id,
            payload.grade_id,
            payload.price_per_hour,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(price)))
}

// GET /api/prices/mine
pub async fn list_my_prices(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
) -> Result<impl IntoResponse, AppError> {
    let prices = app_state.pricing_service.list_my_prices(user.0.id).await?;
    Ok((StatusCode::OK, Json(prices)))
}

// DELETE /api/prices/{id}
pub async fn delete_price(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.pricing_service.delete_price(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
