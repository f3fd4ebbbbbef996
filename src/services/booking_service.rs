// src/services/booking_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, PaymentRepository},
    models::{
        auth::{User, UserType},
        payment::{commission_split, Payment, PaymentMethod},
    },
    services::pricing_service::{compute_total, PricingService},
};

// Método de verificação gravado no pagamento em modo de teste. Em produção
// a confirmação viria de webhook/chamada do gateway, como um passo
// assíncrono entre o `pending` e o `completed` — os estados expostos não
// mudariam.
const TEST_VERIFICATION: &str = "test";

#[derive(Clone)]
pub struct BookingService {
    availability_repo: AvailabilityRepository,
    payment_repo: PaymentRepository,
    pricing: PricingService,
    pool: PgPool,
}

impl BookingService {
    pub fn new(
        availability_repo: AvailabilityRepository,
        payment_repo: PaymentRepository,
        pricing: PricingService,
        pool: PgPool,
    ) -> Self {
        Self { availability_repo, payment_repo, pricing, pool }
    }

    /// Converte um horário livre em reserva liquidada, tudo em uma única
    /// transação: pagamento criado e verificado, horário marcado como
    /// reservado e repasse pendente gerado — ou nada. O percentual de
    /// comissão vigente é resolvido pelo chamador e entra como argumento.
    pub async fn settle(
        &self,
        student: &User,
        availability_id: Uuid,
        explicit_amount: Option<Decimal>,
        payment_method: PaymentMethod,
        commission_percentage: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Payment, AppError> {
        if let Some(amount) = explicit_amount {
            if amount <= Decimal::ZERO {
                return Err(AppError::field_validation(
                    "amount",
                    "O valor precisa ser maior que zero.",
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        // Tranca a linha do horário: é o ponto único de exclusão mútua da
        // reserva. Requisições concorrentes serializam aqui e a perdedora
        // enxerga is_booked = true.
        let availability = self
            .availability_repo
            .find_by_id_for_update(&mut *tx, availability_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horário não encontrado.".into()))?;

        if availability.is_booked {
            return Err(AppError::Conflict("Este horário já foi reservado.".into()));
        }

        let audience_ok = (availability.for_school_students
            && student.user_type == UserType::SchoolStudent)
            || (availability.for_university_students
                && student.user_type == UserType::UniversityStudent);
        if !audience_ok {
            let msg = match student.user_type {
                UserType::SchoolStudent => "Esta aula não é destinada a alunos escolares.",
                UserType::UniversityStudent => "Esta aula não é destinada a alunos universitários.",
                UserType::Teacher => "Somente alunos reservam aulas.",
            };
            return Err(AppError::PermissionDenied(msg.into()));
        }

        // Preço: valor explícito ou resolvido pela tarifa do professor
        // (a primeira matéria do bloco é a autoritativa).
        let amount = match explicit_amount {
            Some(amount) => amount,
            None => {
                let subject_id = self
                    .availability_repo
                    .first_subject_id(&mut *tx, availability_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::field_validation(
                            "subjects",
                            "O horário não tem matéria associada para calcular o preço.",
                        )
                    })?;

                let rate = self
                    .pricing
                    .resolve_rate(&mut tx, availability.teacher_id, student, subject_id)
                    .await?;

                compute_total(rate.price_per_hour, availability.start_hour, availability.end_hour)
            }
        };

        let (commission_amount, teacher_payout_amount) =
            commission_split(amount, commission_percentage);

        let idempotency_key = Uuid::new_v4().to_string();
        let gateway_transaction_id = format!("TEST-{}", Uuid::new_v4());

        let payment = self
            .payment_repo
            .insert_payment(
                &mut *tx,
                student.id,
                availability.teacher_id,
                availability_id,
                amount,
                commission_percentage,
                commission_amount,
                teacher_payout_amount,
                payment_method,
                &gateway_transaction_id,
                &idempotency_key,
            )
            .await?;

        // MODO DE TESTE: confirma imediatamente. Com gateway real, este
        // passo seria disparado pela confirmação assíncrona.
        let payment = self
            .payment_repo
            .mark_completed(&mut *tx, payment.id, now, TEST_VERIFICATION)
            .await?;

        // Check-and-set da reserva, ainda sob o FOR UPDATE.
        self.availability_repo
            .mark_booked(&mut *tx, availability_id, student.id, now)
            .await?
            .ok_or_else(|| AppError::Conflict("Este horário já foi reservado.".into()))?;

        self.payment_repo
            .insert_payout(
                &mut *tx,
                payment.id,
                availability.teacher_id,
                payment.teacher_payout_amount,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "💳 Reserva liquidada: pagamento {} (aluno {}, professor {}, valor {})",
            payment.id,
            student.id,
            payment.teacher_id,
            payment.amount
        );

        Ok(payment)
    }
}
