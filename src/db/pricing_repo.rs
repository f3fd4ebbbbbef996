// src/db/pricing_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::UserType, pricing::LessonPrice},
};

const PRICE_COLUMNS: &str = r#"
    id, teacher_id, student_type, subject_id, grade_id,
    price_per_hour, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PricingRepository {
    pool: PgPool,
}

impl PricingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        student_type: UserType,
        subject_id: Uuid,
        grade_id: Option<Uuid>,
        price_per_hour: Decimal,
    ) -> Result<LessonPrice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO lesson_prices (
                teacher_id, student_type, subject_id, grade_id, price_per_hour
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRICE_COLUMNS}
            "#
        );

        let price = sqlx::query_as::<_, LessonPrice>(&sql)
            .bind(teacher_id)
            .bind(student_type)
            .bind(subject_id)
            .bind(grade_id)
            .bind(price_per_hour)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::Conflict(
                            "Já existe um preço cadastrado para esta combinação de \
                             tipo de aluno, matéria e série."
                                .into(),
                        );
                    }
                }
                e.into()
            })?;

        Ok(price)
    }

    pub async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<LessonPrice>, AppError> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM lesson_prices WHERE teacher_id = $1 ORDER BY created_at DESC"
        );
        let prices = sqlx::query_as::<_, LessonPrice>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(prices)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<LessonPrice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRICE_COLUMNS} FROM lesson_prices WHERE id = $1");
        let price = sqlx::query_as::<_, LessonPrice>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(price)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM lesson_prices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Busca a tarifa de (professor, tipo de aluno, matéria). Para aluno
    /// escolar o filtro de série é exato; para universitário a linha
    /// precisa ter série nula.
    pub async fn find_rate<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        student_type: UserType,
        subject_id: Uuid,
        grade_id: Option<Uuid>,
    ) -> Result<Option<LessonPrice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PRICE_COLUMNS}
            FROM lesson_prices
            WHERE teacher_id = $1
              AND student_type = $2
              AND subject_id = $3
              AND grade_id IS NOT DISTINCT FROM $4
            "#
        );
        let rate = sqlx::query_as::<_, LessonPrice>(&sql)
            .bind(teacher_id)
            .bind(student_type)
            .bind(subject_id)
            .bind(grade_id)
            .fetch_optional(executor)
            .await?;
        Ok(rate)
    }
}
