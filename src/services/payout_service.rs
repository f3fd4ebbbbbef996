// src/services/payout_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PaymentRepository,
    models::{
        auth::User,
        payment::{
            AdminPaymentsSummary, EarningsSummary, Payout, PayoutStatus, TeacherPayoutSummary,
        },
    },
};

#[derive(Clone)]
pub struct PayoutService {
    payment_repo: PaymentRepository,
    pool: PgPool,
}

impl PayoutService {
    pub fn new(payment_repo: PaymentRepository, pool: PgPool) -> Self {
        Self { payment_repo, pool }
    }

    /// Transição administrativa de mão única: pendente → pago. Repasse já
    /// pago é rejeitado com conflito; `cancelled` é reservado para correção
    /// manual e também não transiciona.
    pub async fn mark_paid(
        &self,
        admin: &User,
        payout_id: Uuid,
        transfer_reference: Option<&str>,
        admin_notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Payout, AppError> {
        let mut tx = self.pool.begin().await?;

        let payout = self
            .payment_repo
            .find_payout_for_update(&mut *tx, payout_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Repasse não encontrado.".into()))?;

        match payout.status {
            PayoutStatus::Paid => {
                return Err(AppError::Conflict("Este repasse já foi marcado como pago.".into()))
            }
            PayoutStatus::Cancelled => {
                return Err(AppError::Conflict("Este repasse foi cancelado.".into()))
            }
            PayoutStatus::Pending => {}
        }

        let updated = self
            .payment_repo
            .mark_payout_paid(&mut *tx, payout_id, admin.id, now, transfer_reference, admin_notes)
            .await?
            .ok_or_else(|| AppError::Conflict("Este repasse já foi marcado como pago.".into()))?;

        tx.commit().await?;

        tracing::info!(
            "✅ Repasse {} marcado como pago por {} (valor {})",
            updated.id,
            admin.email,
            updated.amount
        );

        Ok(updated)
    }

    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Payout>, AppError> {
        self.payment_repo.list_payouts_for_teacher(teacher_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Payout>, AppError> {
        self.payment_repo.list_all_payouts().await
    }

    /// Resumo de ganhos do professor, sempre recalculado do razão.
    pub async fn my_earnings(&self, teacher_id: Uuid) -> Result<EarningsSummary, AppError> {
        let (total_earnings, total_payments) =
            self.payment_repo.teacher_earnings(&self.pool, teacher_id).await?;

        let pending_payouts = self
            .payment_repo
            .payout_total_for_teacher(&self.pool, teacher_id, PayoutStatus::Pending)
            .await?;

        let paid_payouts = self
            .payment_repo
            .payout_total_for_teacher(&self.pool, teacher_id, PayoutStatus::Paid)
            .await?;

        Ok(EarningsSummary {
            total_earnings,
            pending_payouts,
            paid_payouts,
            available_for_payout: total_earnings - paid_payouts,
            total_payments,
        })
    }

    /// Painel administrativo: totais da plataforma e repasses pendentes
    /// agrupados por professor.
    pub async fn admin_summary(&self) -> Result<AdminPaymentsSummary, AppError> {
        let (total_revenue, total_commission, total_pending_payouts, pending_count) =
            self.payment_repo.platform_totals(&self.pool).await?;

        let teacher_summary = self.payment_repo.pending_payouts_by_teacher(&self.pool).await?;

        Ok(AdminPaymentsSummary {
            total_revenue,
            total_commission,
            total_pending_payouts,
            pending_count,
            teacher_summary,
        })
    }

    pub async fn payout_report(
        &self,
        teacher_id: Option<Uuid>,
    ) -> Result<Vec<TeacherPayoutSummary>, AppError> {
        self.payment_repo.teacher_payout_summaries(&self.pool, teacher_id).await
    }
}
