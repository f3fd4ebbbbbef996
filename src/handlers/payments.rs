// src/handlers/payments.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{AdminRole, AuthenticatedUser, RequireRole, StudentRole, TeacherRole},
        i18n::Locale,
    },
    models::{
        auth::UserType,
        payment::{AdminPaymentsSummary, EarningsSummary, Payment, PaymentMethod, TeacherPayoutSummary},
        pricing::PriceQuote,
    },
};

// ---
// Payload: reserva de aula (aluno)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPayload {
    pub availability_id: Uuid,

    // Sem valor explícito, o preço vem da tarifa do professor.
    #[schema(example = "80.00")]
    pub amount: Option<Decimal>,

    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::BankTransfer
}

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Reserva liquidada; pagamento criado e verificado", body = Payment),
        (status = 400, description = "Valor inválido ou sem preço definido"),
        (status = 403, description = "Aula destinada a outro público"),
        (status = 404, description = "Horário não encontrado"),
        (status = 409, description = "Horário já reservado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<StudentRole>,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // O percentual de comissão vigente é resolvido AQUI e entra na
    // liquidação como argumento: a liquidação é função pura das entradas.
    let settings = app_state
        .settings_repo
        .get_platform_settings(&app_state.db_pool)
        .await?;

    let payment = app_state
        .booking_service
        .settle(
            &user.0,
            payload.availability_id,
            payload.amount,
            payload.payment_method,
            settings.commission_percentage,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/payments — lista conforme o papel do usuário
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "Alunos veem os próprios pagamentos; professores, os recebidos; administração, todos", body = Vec<Payment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let payments = if user.0.is_staff {
        app_state.payment_repo.list_all().await?
    } else {
        match user.0.user_type {
            UserType::Teacher => app_state.payment_repo.list_for_teacher(user.0.id).await?,
            _ => app_state.payment_repo.list_for_student(user.0.id).await?,
        }
    };

    Ok((StatusCode::OK, Json(payments)))
}

// ---
// Orçamento (pré-visualização, sem efeito colateral)
// ---
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub availability_id: Uuid,
}

// GET /api/payments/quote?availabilityId=...
#[utoipa::path(
    get,
    path = "/api/payments/quote",
    tag = "Payments",
    params(("availabilityId" = Uuid, Query, description = "ID do horário")),
    responses(
        (status = 200, description = "Orçamento calculado", body = PriceQuote),
        (status = 400, description = "Sem preço definido para a combinação"),
        (status = 404, description = "Horário não encontrado"),
        (status = 409, description = "Horário já reservado")
    ),
    security(("api_jwt" = []))
)]
pub async fn quote_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<StudentRole>,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let quote = app_state
        .pricing_service
        .quote(query.availability_id, &user.0, &locale.0)
        .await?;

    Ok((StatusCode::OK, Json(quote)))
}

// GET /api/payments/my-earnings
#[utoipa::path(
    get,
    path = "/api/payments/my-earnings",
    tag = "Payments",
    responses(
        (status = 200, description = "Resumo de ganhos do professor", body = EarningsSummary),
        (status = 403, description = "Apenas professores têm ganhos")
    ),
    security(("api_jwt" = []))
)]
pub async fn my_earnings(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<TeacherRole>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.payout_service.my_earnings(user.0.id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/payments/{id}/receipt — recibo em PDF (administração)
#[utoipa::path(
    get,
    path = "/api/payments/{id}/receipt",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "ID do pagamento")),
    responses(
        (status = 200, description = "Recibo em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Pagamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn payment_receipt(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = app_state.document_service.generate_receipt_pdf(id).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        pdf,
    ))
}

// GET /api/admin/payments/summary
#[utoipa::path(
    get,
    path = "/api/admin/payments/summary",
    tag = "Payments",
    responses(
        (status = 200, description = "Totais da plataforma e repasses pendentes por professor", body = AdminPaymentsSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn admin_summary(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.payout_service.admin_summary().await?;
    Ok((StatusCode::OK, Json(summary)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByTeacherQuery {
    pub teacher_id: Option<Uuid>,
}

// GET /api/admin/payments/by-teacher?teacherId=...
#[utoipa::path(
    get,
    path = "/api/admin/payments/by-teacher",
    tag = "Payments",
    params(("teacherId" = Option<Uuid>, Query, description = "Filtra um professor específico")),
    responses(
        (status = 200, description = "Resumo de repasses por professor", body = Vec<TeacherPayoutSummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn admin_payouts_by_teacher(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Query(query): Query<ByTeacherQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.payout_service.payout_report(query.teacher_id).await?;
    Ok((StatusCode::OK, Json(report)))
}
