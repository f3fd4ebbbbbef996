// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::settings::{PlatformSettings, UpdateSettingsRequest},
};

const SETTINGS_COLUMNS: &str = "id, commission_percentage, updated_at";

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Linha única de chave fixa (id = 1), criada no primeiro acesso.
    /// O ON CONFLICT deixa o valor existente intacto.
    pub async fn get_platform_settings<'e, E>(
        &self,
        executor: E,
    ) -> Result<PlatformSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO platform_settings (id)
            VALUES (1)
            ON CONFLICT (id) DO UPDATE SET id = platform_settings.id
            RETURNING {SETTINGS_COLUMNS}
            "#
        );
        let settings = sqlx::query_as::<_, PlatformSettings>(&sql)
            .fetch_one(executor)
            .await?;
        Ok(settings)
    }

    pub async fn update_settings(
        &self,
        input: UpdateSettingsRequest,
    ) -> Result<PlatformSettings, AppError> {
        let sql = format!(
            r#"
            INSERT INTO platform_settings (id, commission_percentage)
            VALUES (1, $1)
            ON CONFLICT (id)
            DO UPDATE SET
                commission_percentage = EXCLUDED.commission_percentage,
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        );
        let settings = sqlx::query_as::<_, PlatformSettings>(&sql)
            .bind(input.commission_percentage)
            .fetch_one(&self.pool)
            .await?;
        Ok(settings)
    }
}
