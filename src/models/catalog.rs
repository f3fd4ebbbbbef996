// src/models/catalog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Tabelas de consulta do catálogo: países, séries escolares, trilhas
// (científica/literária...), cursos universitários e matérias. Todos os
// nomes são bilíngues; a projeção para o idioma do cliente é feita por
// função explícita recebendo o locale, nunca por callback implícito.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: Uuid,
    pub country_id: Uuid,
    // Número da série (1 a 12). Nas séries 11 e 12 o aluno escolhe uma
    // trilha, e isso muda as regras de elegibilidade.
    pub grade_number: i32,
    pub name_en: String,
    pub name_ar: String,
    pub sort_order: i32,
}

impl Grade {
    /// Séries 11 e 12 exigem trilha (tanto na publicação do horário
    /// quanto na busca do aluno).
    pub fn requires_track(&self) -> bool {
        self.grade_number == 11 || self.grade_number == 12
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Major {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub code: String,
}

/// Projeção explícita do par (name_en, name_ar) para o idioma pedido.
pub fn localized_name<'a>(name_en: &'a str, name_ar: &'a str, lang: &str) -> &'a str {
    if lang == "ar" { name_ar } else { name_en }
}

impl Subject {
    pub fn localized_name(&self, lang: &str) -> &str {
        localized_name(&self.name_en, &self.name_ar, lang)
    }
}

impl Grade {
    pub fn localized_name(&self, lang: &str) -> &str {
        localized_name(&self.name_en, &self.name_ar, lang)
    }
}
