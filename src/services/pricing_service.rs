// src/services/pricing_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, CatalogRepository, PricingRepository, UserRepository},
    models::{
        auth::{User, UserType},
        availability::block_duration_hours,
        pricing::{LessonPrice, PriceQuote},
    },
};

#[derive(Clone)]
pub struct PricingService {
    repo: PricingRepository,
    availability_repo: AvailabilityRepository,
    catalog_repo: CatalogRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl PricingService {
    pub fn new(
        repo: PricingRepository,
        availability_repo: AvailabilityRepository,
        catalog_repo: CatalogRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, availability_repo, catalog_repo, user_repo, pool }
    }

    /// Cadastro de preço pelo professor. Invariante: série obrigatória para
    /// aluno escolar, proibida para universitário.
    pub async fn create_price(
        &self,
        teacher_id: Uuid,
        student_type: UserType,
        subject_id: Uuid,
        grade_id: Option<Uuid>,
        price_per_hour: Decimal,
    ) -> Result<LessonPrice, AppError> {
        if price_per_hour <= Decimal::ZERO {
            return Err(AppError::field_validation(
                "pricePerHour",
                "O preço por hora precisa ser maior que zero.",
            ));
        }

        match student_type {
            UserType::SchoolStudent => {
                if grade_id.is_none() {
                    return Err(AppError::field_validation(
                        "grade",
                        "A série é obrigatória para alunos escolares.",
                    ));
                }
            }
            UserType::UniversityStudent => {
                if grade_id.is_some() {
                    return Err(AppError::field_validation(
                        "grade",
                        "A série não se aplica a alunos universitários.",
                    ));
                }
            }
            UserType::Teacher => {
                return Err(AppError::field_validation(
                    "studentType",
                    "O preço é definido por tipo de aluno.",
                ));
            }
        }

        self.repo
            .insert(&self.pool, teacher_id, student_type, subject_id, grade_id, price_per_hour)
            .await
    }

    pub async fn list_my_prices(&self, teacher_id: Uuid) -> Result<Vec<LessonPrice>, AppError> {
        self.repo.list_by_teacher(teacher_id).await
    }

    pub async fn delete_price(&self, teacher_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let price = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Preço não encontrado.".into()))?;

        if price.teacher_id != teacher_id {
            return Err(AppError::PermissionDenied(
                "Você só pode excluir os seus próprios preços.".into(),
            ));
        }

        self.repo.delete(&self.pool, id).await
    }

    /// Resolve a tarifa horária de (professor, aluno, matéria). Aluno
    /// escolar sem série no perfil não tem como casar tarifa; para
    /// universitário a linha de preço precisa ter série nula.
    pub async fn resolve_rate(
        &self,
        conn: &mut sqlx::PgConnection,
        teacher_id: Uuid,
        student: &User,
        subject_id: Uuid,
    ) -> Result<LessonPrice, AppError> {
        let grade_id = match student.user_type {
            UserType::SchoolStudent => Some(student.grade_id.ok_or_else(|| {
                AppError::field_validation(
                    "grade",
                    "Defina a série no seu perfil para calcular o preço.",
                )
            })?),
            UserType::UniversityStudent => None,
            UserType::Teacher => {
                return Err(AppError::PermissionDenied("Somente alunos reservam aulas.".into()))
            }
        };

        self.repo
            .find_rate(&mut *conn, teacher_id, student.user_type, subject_id, grade_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "O professor não definiu preço para esta matéria e tipo de aluno.".into(),
                )
            })
    }

    /// Orçamento sem efeito colateral: preço por hora × duração do bloco.
    pub async fn quote(
        &self,
        availability_id: Uuid,
        student: &User,
        lang: &str,
    ) -> Result<PriceQuote, AppError> {
        let mut conn = self.pool.acquire().await?;

        let availability = self
            .availability_repo
            .find_by_id(&mut *conn, availability_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horário não encontrado.".into()))?;

        if availability.is_booked {
            return Err(AppError::Conflict("Este horário já foi reservado.".into()));
        }

        let subject_id = self
            .availability_repo
            .first_subject_id(&mut *conn, availability_id)
            .await?
            .ok_or_else(|| {
                AppError::field_validation(
                    "subjects",
                    "O horário não tem matéria associada para calcular o preço.",
                )
            })?;

        let subject = self
            .catalog_repo
            .get_subject(&mut *conn, subject_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Matéria não encontrada.".into()))?;

        let rate = self
            .resolve_rate(&mut conn, availability.teacher_id, student, subject_id)
            .await?;

        let teacher = self
            .user_repo
            .find_by_id(availability.teacher_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let duration = availability.duration_hours();
        let total = compute_total(rate.price_per_hour, availability.start_hour, availability.end_hour);

        Ok(PriceQuote {
            availability_id,
            teacher_name: teacher.display_name(),
            teacher_email: teacher.email,
            date: availability.date,
            start_hour: availability.start_hour,
            end_hour: availability.end_hour,
            duration_hours: duration,
            subject_name: subject.localized_name(lang).to_string(),
            price_per_hour: rate.price_per_hour,
            total_amount: total,
        })
    }
}

/// Total da aula: tarifa horária × duração, em aritmética decimal exata.
/// A duração é a subtração simples com a borda final normalizada (0 → 24);
/// blocos reserváveis nunca atravessam a meia-noite.
pub fn compute_total(price_per_hour: Decimal, start_hour: i32, end_hour: i32) -> Decimal {
    price_per_hour * Decimal::from(block_duration_hours(start_hour, end_hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn total_is_rate_times_duration() {
        // $40/h por um bloco de 2 horas
        assert_eq!(compute_total(dec("40.00"), 9, 11), dec("80.00"));
    }

    #[test]
    fn total_keeps_decimal_precision() {
        assert_eq!(compute_total(dec("33.33"), 14, 17), dec("99.99"));
    }

    #[test]
    fn midnight_end_counts_full_hours() {
        // [22, 24): 2 horas
        assert_eq!(compute_total(dec("10.00"), 22, 0), dec("20.00"));
    }

    #[test]
    fn one_hour_block() {
        assert_eq!(compute_total(dec("55.50"), 8, 9), dec("55.50"));
    }
}
