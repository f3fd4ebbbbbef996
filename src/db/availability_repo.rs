// src/db/availability_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::availability::{Availability, SchoolCandidate, UniversityCandidate},
};

const AVAILABILITY_COLUMNS: &str = r#"
    id, teacher_id, title, color, date, start_hour, end_hour,
    for_school_students, for_university_students,
    is_booked, booked_by, booked_at, created_at, updated_at
"#;

// Filtro SQL de "bloco futuro": o instante de início (data + hora) ainda
// não passou, no fuso de referência do serviço (UTC).
const FUTURE_SLOT: &str =
    "(a.date::timestamp + make_interval(hours => a.start_hour)) AT TIME ZONE 'UTC' > ";

#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: PgPool,
}

impl AvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serializa criação/edição por (professor, data) dentro da transação
    /// corrente: dois creates concorrentes com faixas sobrepostas nunca
    /// passam os dois pela varredura de sobreposição.
    pub async fn lock_teacher_date<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("availability:{}:{}", teacher_id, date))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        title: &str,
        color: Option<&str>,
        date: NaiveDate,
        start_hour: i32,
        end_hour: i32,
        for_school_students: bool,
        for_university_students: bool,
    ) -> Result<Availability, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO availabilities (
                teacher_id, title, color, date, start_hour, end_hour,
                for_school_students, for_university_students
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {AVAILABILITY_COLUMNS}
            "#
        );

        let availability = sqlx::query_as::<_, Availability>(&sql)
            .bind(teacher_id)
            .bind(title)
            .bind(color)
            .bind(date)
            .bind(start_hour)
            .bind(end_hour)
            .bind(for_school_students)
            .bind(for_university_students)
            .fetch_one(executor)
            .await?;

        Ok(availability)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        title: &str,
        color: Option<&str>,
        date: NaiveDate,
        start_hour: i32,
        end_hour: i32,
        for_school_students: bool,
        for_university_students: bool,
    ) -> Result<Availability, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE availabilities
            SET title = $2, color = $3, date = $4, start_hour = $5, end_hour = $6,
                for_school_students = $7, for_university_students = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {AVAILABILITY_COLUMNS}
            "#
        );

        let availability = sqlx::query_as::<_, Availability>(&sql)
            .bind(id)
            .bind(title)
            .bind(color)
            .bind(date)
            .bind(start_hour)
            .bind(end_hour)
            .bind(for_school_students)
            .bind(for_university_students)
            .fetch_one(executor)
            .await?;

        Ok(availability)
    }

    /// Substitui as associações de elegibilidade do bloco. Recebe a conexão
    /// da transação aberta (são vários comandos encadeados).
    pub async fn set_tags(
        &self,
        conn: &mut sqlx::PgConnection,
        availability_id: Uuid,
        grade_ids: &[Uuid],
        track_ids: &[Uuid],
        subject_ids: &[Uuid],
    ) -> Result<(), AppError> {
        for table in ["availability_grades", "availability_tracks", "availability_subjects"] {
            let sql = format!("DELETE FROM {table} WHERE availability_id = $1");
            sqlx::query(&sql).bind(availability_id).execute(&mut *conn).await?;
        }

        for (table, column, ids) in [
            ("availability_grades", "grade_id", grade_ids),
            ("availability_tracks", "track_id", track_ids),
            ("availability_subjects", "subject_id", subject_ids),
        ] {
            if ids.is_empty() {
                continue;
            }
            let sql = format!(
                "INSERT INTO {table} (availability_id, {column}) SELECT $1, unnest($2::uuid[])"
            );
            sqlx::query(&sql)
                .bind(availability_id)
                .bind(ids)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Availability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {AVAILABILITY_COLUMNS} FROM availabilities WHERE id = $1");
        let availability = sqlx::query_as::<_, Availability>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(availability)
    }

    /// Carrega e tranca a linha do bloco: é o ponto único de exclusão mútua
    /// da reserva. Quem perder a corrida enxerga `is_booked = true`.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Availability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql =
            format!("SELECT {AVAILABILITY_COLUMNS} FROM availabilities WHERE id = $1 FOR UPDATE");
        let availability = sqlx::query_as::<_, Availability>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(availability)
    }

    /// Todos os blocos do professor naquela data (reservados ou não) para a
    /// varredura de sobreposição, opcionalmente excluindo o próprio bloco
    /// (caso de edição).
    pub async fn list_for_teacher_on_date<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Availability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {AVAILABILITY_COLUMNS}
            FROM availabilities
            WHERE teacher_id = $1 AND date = $2 AND ($3::uuid IS NULL OR id <> $3)
            ORDER BY start_hour ASC
            "#
        );
        let blocks = sqlx::query_as::<_, Availability>(&sql)
            .bind(teacher_id)
            .bind(date)
            .bind(exclude_id)
            .fetch_all(executor)
            .await?;
        Ok(blocks)
    }

    pub async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<Availability>, AppError> {
        let sql = format!(
            r#"
            SELECT {AVAILABILITY_COLUMNS}
            FROM availabilities
            WHERE teacher_id = $1
            ORDER BY date ASC, start_hour ASC
            "#
        );
        let blocks = sqlx::query_as::<_, Availability>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(blocks)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM availabilities WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Check-and-set da reserva: só marca se ainda estiver livre.
    /// Devolve `None` se outra transação reservou antes.
    pub async fn mark_booked<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        student_id: Uuid,
        booked_at: DateTime<Utc>,
    ) -> Result<Option<Availability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE availabilities
            SET is_booked = TRUE, booked_by = $2, booked_at = $3, updated_at = NOW()
            WHERE id = $1 AND is_booked = FALSE
            RETURNING {AVAILABILITY_COLUMNS}
            "#
        );
        let availability = sqlx::query_as::<_, Availability>(&sql)
            .bind(id)
            .bind(student_id)
            .bind(booked_at)
            .fetch_optional(executor)
            .await?;
        Ok(availability)
    }

    /// IDs das tags de elegibilidade do bloco: (séries, trilhas, matérias).
    pub async fn tag_ids(
        &self,
        conn: &mut sqlx::PgConnection,
        availability_id: Uuid,
    ) -> Result<(Vec<Uuid>, Vec<Uuid>, Vec<Uuid>), AppError> {
        let mut result: Vec<Vec<Uuid>> = Vec::with_capacity(3);
        for (table, column) in [
            ("availability_grades", "grade_id"),
            ("availability_tracks", "track_id"),
            ("availability_subjects", "subject_id"),
        ] {
            let sql = format!("SELECT {column} FROM {table} WHERE availability_id = $1");
            let rows: Vec<(Uuid,)> = sqlx::query_as(&sql)
                .bind(availability_id)
                .fetch_all(&mut *conn)
                .await?;
            result.push(rows.into_iter().map(|(id,)| id).collect());
        }

        let subjects = result.pop().unwrap_or_default();
        let tracks = result.pop().unwrap_or_default();
        let grades = result.pop().unwrap_or_default();
        Ok((grades, tracks, subjects))
    }

    /// A primeira matéria associada ao bloco é a autoritativa para o
    /// cálculo de preço quando há mais de uma.
    pub async fn first_subject_id<'e, E>(
        &self,
        executor: E,
        availability_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT s.subject_id
            FROM availability_subjects s
            JOIN subjects sub ON sub.id = s.subject_id
            WHERE s.availability_id = $1
            ORDER BY sub.name_en ASC
            LIMIT 1
            "#,
        )
        .bind(availability_id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Candidatos do caminho escolar: blocos futuros e livres, de
    /// professores aprovados do país, marcados para alunos escolares e
    /// associados à série pedida. As trilhas de cada bloco vêm juntas para
    /// a regra 11/12 ser aplicada em memória.
    pub async fn school_candidates<'e, E>(
        &self,
        executor: E,
        country_id: Uuid,
        grade_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<SchoolCandidate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT a.teacher_id,
                   array_remove(array_agg(DISTINCT avt.track_id), NULL) AS track_ids
            FROM availabilities a
            JOIN users t ON t.id = a.teacher_id
            JOIN availability_grades ag ON ag.availability_id = a.id
            LEFT JOIN availability_tracks avt ON avt.availability_id = a.id
            WHERE a.for_school_students
              AND a.is_booked = FALSE
              AND t.user_type = 'teacher'
              AND t.is_approved
              AND t.country_id = $1
              AND ag.grade_id = $2
              AND {FUTURE_SLOT}$3
            GROUP BY a.id, a.teacher_id
            "#
        );
        let candidates = sqlx::query_as::<_, SchoolCandidate>(&sql)
            .bind(country_id)
            .bind(grade_id)
            .bind(now)
            .fetch_all(executor)
            .await?;
        Ok(candidates)
    }

    /// Candidatos do caminho universitário; as matérias de cada bloco vêm
    /// juntas para a interseção com o conjunto do curso.
    pub async fn university_candidates<'e, E>(
        &self,
        executor: E,
        country_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<UniversityCandidate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT a.teacher_id,
                   array_remove(array_agg(DISTINCT avs.subject_id), NULL) AS subject_ids
            FROM availabilities a
            JOIN users t ON t.id = a.teacher_id
            LEFT JOIN availability_subjects avs ON avs.availability_id = a.id
            WHERE a.for_university_students
              AND a.is_booked = FALSE
              AND t.user_type = 'teacher'
              AND t.is_approved
              AND t.country_id = $1
              AND {FUTURE_SLOT}$2
            GROUP BY a.id, a.teacher_id
            "#
        );
        let candidates = sqlx::query_as::<_, UniversityCandidate>(&sql)
            .bind(country_id)
            .bind(now)
            .fetch_all(executor)
            .await?;
        Ok(candidates)
    }
}
