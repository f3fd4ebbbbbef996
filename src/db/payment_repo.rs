// src/db/payment_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::payment::{
        Payment, PaymentMethod, PendingPayoutByTeacher, Payout, PayoutStatus,
        TeacherPayoutSummary,
    },
};

const PAYMENT_COLUMNS: &str = r#"
    id, student_id, teacher_id, availability_id,
    amount, commission_percentage, commission_amount, teacher_payout_amount,
    payment_method, gateway_transaction_id, status, idempotency_key,
    verified_at, verification_method, created_at, updated_at
"#;

const PAYOUT_COLUMNS: &str = r#"
    id, payment_id, teacher_id, amount, status,
    paid_by, paid_at, transfer_reference, admin_notes, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        student_id: Uuid,
        teacher_id: Uuid,
        availability_id: Uuid,
        amount: Decimal,
        commission_percentage: Decimal,
        commission_amount: Decimal,
        teacher_payout_amount: Decimal,
        payment_method: PaymentMethod,
        gateway_transaction_id: &str,
        idempotency_key: &str,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO payments (
                student_id, teacher_id, availability_id,
                amount, commission_percentage, commission_amount, teacher_payout_amount,
                payment_method, gateway_transaction_id, idempotency_key, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(student_id)
            .bind(teacher_id)
            .bind(availability_id)
            .bind(amount)
            .bind(commission_percentage)
            .bind(commission_amount)
            .bind(teacher_payout_amount)
            .bind(payment_method)
            .bind(gateway_transaction_id)
            .bind(idempotency_key)
            .fetch_one(executor)
            .await?;

        Ok(payment)
    }

    /// Transição para `completed` com o carimbo de verificação. Só avança
    /// pagamentos pendentes (nunca regride um estado).
    pub async fn mark_completed<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
        verified_at: DateTime<Utc>,
        verification_method: &str,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE payments
            SET status = 'completed', verified_at = $2, verification_method = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .bind(verified_at)
            .bind(verification_method)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("O pagamento não está mais pendente.".into())
            })?;

        Ok(payment)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(payment)
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE student_id = $1 ORDER BY created_at DESC"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE teacher_id = $1 ORDER BY created_at DESC"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn list_all(&self) -> Result<Vec<Payment>, AppError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC");
        let payments = sqlx::query_as::<_, Payment>(&sql).fetch_all(&self.pool).await?;
        Ok(payments)
    }

    // =========================================================================
    //  REPASSES
    // =========================================================================

    pub async fn insert_payout<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
        teacher_id: Uuid,
        amount: Decimal,
    ) -> Result<Payout, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO payouts (payment_id, teacher_id, amount, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {PAYOUT_COLUMNS}
            "#
        );

        let payout = sqlx::query_as::<_, Payout>(&sql)
            .bind(payment_id)
            .bind(teacher_id)
            .bind(amount)
            .fetch_one(executor)
            .await?;

        Ok(payout)
    }

    /// Carrega e tranca o repasse para a transição administrativa.
    pub async fn find_payout_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Payout>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PAYOUT_COLUMNS} FROM payouts WHERE id = $1 FOR UPDATE");
        let payout = sqlx::query_as::<_, Payout>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(payout)
    }

    /// Marca o repasse como pago. A cláusula `status = 'pending'` garante a
    /// transição de mão única mesmo sob concorrência.
    pub async fn mark_payout_paid<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        admin_id: Uuid,
        paid_at: DateTime<Utc>,
        transfer_reference: Option<&str>,
        admin_notes: Option<&str>,
    ) -> Result<Option<Payout>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE payouts
            SET status = 'paid', paid_by = $2, paid_at = $3,
                transfer_reference = $4, admin_notes = $5, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYOUT_COLUMNS}
            "#
        );

        let payout = sqlx::query_as::<_, Payout>(&sql)
            .bind(id)
            .bind(admin_id)
            .bind(paid_at)
            .bind(transfer_reference)
            .bind(admin_notes)
            .fetch_optional(executor)
            .await?;

        Ok(payout)
    }

    pub async fn list_payouts_for_teacher(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<Payout>, AppError> {
        let sql = format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE teacher_id = $1 ORDER BY created_at DESC"
        );
        let payouts = sqlx::query_as::<_, Payout>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payouts)
    }

    pub async fn list_all_payouts(&self) -> Result<Vec<Payout>, AppError> {
        let sql = format!("SELECT {PAYOUT_COLUMNS} FROM payouts ORDER BY created_at DESC");
        let payouts = sqlx::query_as::<_, Payout>(&sql).fetch_all(&self.pool).await?;
        Ok(payouts)
    }

    // =========================================================================
    //  AGREGADOS (projeções de leitura)
    // =========================================================================

    /// Soma dos repasses de pagamentos concluídos do professor e a
    /// quantidade de pagamentos.
    pub async fn teacher_earnings<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
    ) -> Result<(Decimal, i64), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(teacher_payout_amount), 0), COUNT(*)
            FROM payments
            WHERE teacher_id = $1 AND status = 'completed'
            "#,
        )
        .bind(teacher_id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn payout_total_for_teacher<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        status: PayoutStatus,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM payouts WHERE teacher_id = $1 AND status = $2",
        )
        .bind(teacher_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Totais da plataforma: (receita, comissão) dos pagamentos concluídos
    /// e (soma, quantidade) dos repasses pendentes.
    pub async fn platform_totals<'e, E>(
        &self,
        executor: E,
    ) -> Result<(Decimal, Decimal, Decimal, i64), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (Decimal, Decimal, Decimal, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'completed'),
                (SELECT COALESCE(SUM(commission_amount), 0) FROM payments WHERE status = 'completed'),
                (SELECT COALESCE(SUM(amount), 0) FROM payouts WHERE status = 'pending'),
                (SELECT COUNT(*) FROM payouts WHERE status = 'pending')
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Repasses pendentes agrupados por professor (painel administrativo).
    pub async fn pending_payouts_by_teacher<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<PendingPayoutByTeacher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PendingPayoutByTeacher>(
            r#"
            SELECT p.teacher_id,
                   t.email AS teacher_email,
                   COALESCE(NULLIF(TRIM(t.first_name || ' ' || t.last_name), ''), t.email) AS teacher_name,
                   COALESCE(SUM(p.amount), 0) AS total_amount,
                   COUNT(*) AS payout_count
            FROM payouts p
            JOIN users t ON t.id = p.teacher_id
            WHERE p.status = 'pending'
            GROUP BY p.teacher_id, t.email, t.first_name, t.last_name
            ORDER BY total_amount DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Resumo de repasses por professor: totais dos pagamentos concluídos e
    /// a posição (pendente/pago) do razão de repasses. O devido líquido é
    /// o total gerado menos o já pago.
    pub async fn teacher_payout_summaries<'e, E>(
        &self,
        executor: E,
        teacher_id: Option<Uuid>,
    ) -> Result<Vec<TeacherPayoutSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, TeacherPayoutSummary>(
            r#"
            SELECT pay.teacher_id,
                   t.email AS teacher_email,
                   COALESCE(NULLIF(TRIM(t.first_name || ' ' || t.last_name), ''), t.email) AS teacher_name,
                   COALESCE(SUM(pay.amount), 0) AS total_amount,
                   COALESCE(SUM(pay.commission_amount), 0) AS total_commission,
                   COALESCE(SUM(pay.teacher_payout_amount), 0) AS total_payout,
                   COUNT(*) AS payment_count,
                   COALESCE((SELECT SUM(po.amount) FROM payouts po
                             WHERE po.teacher_id = pay.teacher_id AND po.status = 'pending'), 0)
                       AS pending_payout_amount,
                   COALESCE((SELECT SUM(po.amount) FROM payouts po
                             WHERE po.teacher_id = pay.teacher_id AND po.status = 'paid'), 0)
                       AS paid_payout_amount,
                   COALESCE(SUM(pay.teacher_payout_amount), 0)
                     - COALESCE((SELECT SUM(po.amount) FROM payouts po
                                 WHERE po.teacher_id = pay.teacher_id AND po.status = 'paid'), 0)
                       AS net_payout_due
            FROM payments pay
            JOIN users t ON t.id = pay.teacher_id
            WHERE pay.status = 'completed'
              AND ($1::uuid IS NULL OR pay.teacher_id = $1)
            GROUP BY pay.teacher_id, t.email, t.first_name, t.last_name
            ORDER BY net_payout_due DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
