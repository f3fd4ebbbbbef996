// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{RegisterUserPayload, User},
};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, user_type, first_name, last_name, birth_date,
    country_id, grade_id, track_id, major_id, years_of_experience,
    is_approved, is_staff, created_at, updated_at
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Cria um novo usuário no banco de dados,
    // com tratamento de erro específico para e-mails duplicados.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        payload: &RegisterUserPayload,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (
                email, password_hash, user_type, first_name, last_name,
                birth_date, country_id, grade_id, track_id, major_id,
                years_of_experience
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&payload.email)
            .bind(password_hash)
            .bind(payload.user_type)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(payload.birth_date)
            .bind(payload.country_id)
            .bind(payload.grade_id)
            .bind(payload.track_id)
            .bind(payload.major_id)
            .bind(payload.years_of_experience)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        // O nome padrão que o Postgres cria para "UNIQUE" na coluna email
                        if db_err.constraint() == Some("users_email_key") {
                            return AppError::EmailAlreadyExists;
                        }
                    }
                }
                e.into()
            })?;

        Ok(user)
    }

    /// Carrega o display name de um usuário (para respostas de resumo).
    pub async fn display_name<'e, E>(&self, executor: E, id: Uuid) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT first_name, last_name, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        let (first, last, email) =
            row.ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;
        let full = format!("{} {}", first, last);
        let full = full.trim();
        Ok(if full.is_empty() { email } else { full.to_string() })
    }
}
