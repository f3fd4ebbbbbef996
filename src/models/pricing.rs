// src/models/pricing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::auth::UserType;

// Pré-visualização do preço de um horário: somente leitura, nada é
// reservado nem gravado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub availability_id: Uuid,
    pub teacher_name: String,
    pub teacher_email: String,
    pub date: chrono::NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub duration_hours: i32,
    pub subject_name: String,
    #[schema(example = "40.00")]
    pub price_per_hour: Decimal,
    #[schema(example = "80.00")]
    pub total_amount: Decimal,
}

// Preço por hora de um professor para (tipo de aluno, matéria, série).
// Invariante: `grade_id` é obrigatório para aluno escolar e proibido para
// universitário — a série só existe no contexto escolar.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonPrice {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_type: UserType,
    pub subject_id: Uuid,
    pub grade_id: Option<Uuid>,

    #[schema(example = "40.00")]
    pub price_per_hour: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
