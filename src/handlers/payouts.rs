// src/handlers/payouts.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminRole, AuthenticatedUser, RequireRole},
    models::{auth::UserType, payment::Payout},
};

// GET /api/payouts — professores veem os próprios; administração, todos
#[utoipa::path(
    get,
    path = "/api/payouts",
    tag = "Payouts",
    responses(
        (status = 200, description = "Repasses visíveis ao usuário", body = Vec<Payout>),
        (status = 403, description = "Alunos não têm repasses")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payouts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let payouts = if user.0.is_staff {
        app_state.payout_service.list_all().await?
    } else if user.0.user_type == UserType::Teacher {
        app_state.payout_service.list_for_teacher(user.0.id).await?
    } else {
        return Err(AppError::PermissionDenied(
            "Alunos não têm repasses a consultar.".into(),
        ));
    };

    Ok((StatusCode::OK, Json(payouts)))
}

// ---
// Payload: marcar repasse como pago (após a transferência manual)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidPayload {
    pub transfer_reference: Option<String>,
    pub admin_notes: Option<String>,
}

// POST /api/payouts/{id}/mark-paid
#[utoipa::path(
    post,
    path = "/api/payouts/{id}/mark-paid",
    tag = "Payouts",
    request_body = MarkPaidPayload,
    params(("id" = Uuid, Path, description = "ID do repasse")),
    responses(
        (status = 200, description = "Repasse marcado como pago", body = Payout),
        (status = 404, description = "Repasse não encontrado"),
        (status = 409, description = "Repasse já pago")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_payout_paid(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkPaidPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payout = app_state
        .payout_service
        .mark_paid(
            &user.0,
            id,
            payload.transfer_reference.as_deref(),
            payload.admin_notes.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::OK, Json(payout)))
}
