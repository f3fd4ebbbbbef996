// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminRole, RequireRole},
    models::settings::UpdateSettingsRequest,
};

// GET /api/admin/settings
pub async fn get_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state
        .settings_repo
        .get_platform_settings(&app_state.db_pool)
        .await?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/admin/settings
// Vale apenas para pagamentos futuros: a divisão de comissão de cada
// pagamento é congelada na criação.
pub async fn update_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.commission_percentage < Decimal::ZERO
        || payload.commission_percentage > Decimal::ONE_HUNDRED
    {
        return Err(AppError::field_validation(
            "commissionPercentage",
            "O percentual de comissão precisa estar entre 0 e 100.",
        ));
    }

    let updated = app_state.settings_repo.update_settings(payload).await?;

    Ok((StatusCode::OK, Json(updated)))
}
