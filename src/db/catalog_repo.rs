// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Country, Grade, Major, Subject, Track},
};

// Tabelas de consulta: somente leitura para a aplicação (a carga é feita
// por seed/administração direta no banco).
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>, AppError> {
        let countries = sqlx::query_as::<_, Country>(
            "SELECT id, name_en, name_ar, code FROM countries ORDER BY name_en ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(countries)
    }

    pub async fn list_grades(&self, country_id: Option<Uuid>) -> Result<Vec<Grade>, AppError> {
        let grades = match country_id {
            Some(country_id) => {
                sqlx::query_as::<_, Grade>(
                    r#"
                    SELECT id, country_id, grade_number, name_en, name_ar, sort_order
                    FROM grades
                    WHERE country_id = $1
                    ORDER BY sort_order ASC
                    "#,
                )
                .bind(country_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Grade>(
                    r#"
                    SELECT id, country_id, grade_number, name_en, name_ar, sort_order
                    FROM grades
                    ORDER BY country_id, sort_order ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(grades)
    }

    pub async fn get_grade<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Grade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grade = sqlx::query_as::<_, Grade>(
            r#"
            SELECT id, country_id, grade_number, name_en, name_ar, sort_order
            FROM grades
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(grade)
    }

    /// Carrega as séries selecionadas em uma publicação de horário (para a
    /// regra "séries 11/12 exigem trilha").
    pub async fn get_grades_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<Grade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grades = sqlx::query_as::<_, Grade>(
            r#"
            SELECT id, country_id, grade_number, name_en, name_ar, sort_order
            FROM grades
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(grades)
    }

    pub async fn list_tracks(&self) -> Result<Vec<Track>, AppError> {
        let tracks = sqlx::query_as::<_, Track>(
            "SELECT id, name_en, name_ar, code FROM tracks ORDER BY name_en ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tracks)
    }

    pub async fn list_majors(&self) -> Result<Vec<Major>, AppError> {
        let majors = sqlx::query_as::<_, Major>(
            "SELECT id, name_en, name_ar, code FROM majors ORDER BY name_en ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(majors)
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, name_en, name_ar, code FROM subjects ORDER BY name_en ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    pub async fn get_subject<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Subject>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name_en, name_ar, code FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(subject)
    }

    /// Matérias associadas a um curso universitário. Curso sem matérias
    /// associadas devolve lista vazia (política explícita de conjunto
    /// vazio, não erro).
    pub async fn subject_ids_for_major<'e, E>(
        &self,
        executor: E,
        major_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT subject_id FROM major_subjects WHERE major_id = $1")
                .bind(major_id)
                .fetch_all(executor)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn subjects_for_major(&self, major_id: Uuid) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            r#"
            SELECT s.id, s.name_en, s.name_ar, s.code
            FROM subjects s
            JOIN major_subjects ms ON ms.subject_id = s.id
            WHERE ms.major_id = $1
            ORDER BY s.name_en ASC
            "#,
        )
        .bind(major_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }
}
