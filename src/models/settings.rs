// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Configuração global da plataforma: linha única de chave fixa (id = 1),
// criada no primeiro acesso. O percentual vigente é lido pelo handler de
// reserva e passado explicitamente para a liquidação — a liquidação nunca
// lê estado ambiente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    #[schema(ignore)]
    pub id: i32,

    #[schema(example = "20.00")]
    pub commission_percentage: Decimal,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "20.00")]
    pub commission_percentage: Decimal,
}
