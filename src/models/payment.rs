// src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,    // Aguardando confirmação
    Processing, // Em processamento no gateway
    Completed,  // Confirmado
    Failed,     // Recusado
    Cancelled,  // Cancelado
    Refunded,   // Estornado
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    CreditCard,
    Wallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,   // Aguardando transferência manual
    Paid,      // Transferido (estado terminal)
    Cancelled, // Reservado para correção administrativa; nenhum fluxo chega aqui
}

// --- Structs ---

// Registro imutável de auditoria de uma reserva liquidada. A divisão da
// comissão é calculada uma única vez na criação e congelada: mudanças
// futuras na comissão da plataforma nunca alteram pagamentos existentes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub availability_id: Option<Uuid>,

    #[schema(example = "80.00")]
    pub amount: Decimal,
    #[schema(example = "20.00")]
    pub commission_percentage: Decimal,
    #[schema(example = "16.00")]
    pub commission_amount: Decimal,
    #[schema(example = "64.00")]
    pub teacher_payout_amount: Decimal,

    pub payment_method: PaymentMethod,
    pub gateway_transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub idempotency_key: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_method: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Obrigação de repasse ao professor, um-para-um com o pagamento liquidado.
// Só muda de estado pela ação administrativa de "marcar como pago".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub teacher_id: Uuid,

    #[schema(example = "64.00")]
    pub amount: Decimal,
    pub status: PayoutStatus,

    pub paid_by: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub transfer_reference: Option<String>,
    pub admin_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Projeções de leitura (dashboards) ---
// Sempre calculadas a partir do razão de pagamentos/repasses, nunca de
// estado acumulado em cache.

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    #[schema(example = "640.00")]
    pub total_earnings: Decimal,
    pub pending_payouts: Decimal,
    pub paid_payouts: Decimal,
    pub available_for_payout: Decimal,
    pub total_payments: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayoutByTeacher {
    pub teacher_id: Uuid,
    pub teacher_email: String,
    pub teacher_name: String,
    pub total_amount: Decimal,
    pub payout_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPaymentsSummary {
    pub total_revenue: Decimal,
    pub total_commission: Decimal,
    pub total_pending_payouts: Decimal,
    pub pending_count: i64,
    pub teacher_summary: Vec<PendingPayoutByTeacher>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPayoutSummary {
    pub teacher_id: Uuid,
    pub teacher_email: String,
    pub teacher_name: String,
    pub total_amount: Decimal,
    pub total_commission: Decimal,
    pub total_payout: Decimal,
    pub payment_count: i64,
    pub pending_payout_amount: Decimal,
    pub paid_payout_amount: Decimal,
    // Quanto ainda é devido ao professor: total gerado menos o já pago.
    pub net_payout_due: Decimal,
}

/// Divide o valor pago entre plataforma e professor:
/// `comissão = valor × percentual / 100`, repasse = resto, ambos
/// arredondados para 2 casas decimais (arredondamento bancário).
pub fn commission_split(amount: Decimal, commission_percentage: Decimal) -> (Decimal, Decimal) {
    let commission = (amount * commission_percentage / Decimal::ONE_HUNDRED).round_dp(2);
    let teacher_payout = (amount - commission).round_dp(2);
    (commission, teacher_payout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn splits_eighty_at_twenty_percent() {
        let (commission, payout) = commission_split(dec("80.00"), dec("20.00"));
        assert_eq!(commission, dec("16.00"));
        assert_eq!(payout, dec("64.00"));
    }

    #[test]
    fn split_conserves_the_total() {
        for (amount, pct) in [
            ("80.00", "20.00"),
            ("99.99", "17.50"),
            ("0.01", "20.00"),
            ("123.45", "33.33"),
            ("1000.00", "0.00"),
        ] {
            let amount = dec(amount);
            let (commission, payout) = commission_split(amount, dec(pct));
            assert_eq!(commission + payout, amount, "amount={} pct={}", amount, pct);
            assert!(commission >= Decimal::ZERO);
            assert!(payout >= Decimal::ZERO);
        }
    }

    #[test]
    fn split_rounds_to_two_decimal_places() {
        // 10.00 × 33.33% = 3.333 → 3.33
        let (commission, payout) = commission_split(dec("10.00"), dec("33.33"));
        assert_eq!(commission, dec("3.33"));
        assert_eq!(payout, dec("6.67"));
    }
}
