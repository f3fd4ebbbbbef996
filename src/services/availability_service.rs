// src/services/availability_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, CatalogRepository},
    models::availability::{self, AvailabilityWithTags, ranges_overlap},
};

// Dados de um bloco vindos do handler, já desserializados. A mesma
// estrutura serve para criação, edição e para cada bloco gerado pela
// criação em massa.
#[derive(Debug, Clone)]
pub struct SlotInput {
    pub title: String,
    pub color: Option<String>,
    pub date: NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub for_school_students: bool,
    pub for_university_students: bool,
    pub grade_ids: Vec<Uuid>,
    pub track_ids: Vec<Uuid>,
    pub subject_ids: Vec<Uuid>,
}

/// Uma hora cheia escolhida no calendário (criação em massa).
#[derive(Debug, Clone, Copy)]
pub struct HourPick {
    pub date: NaiveDate,
    pub hour: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkSlotError {
    pub date: NaiveDate,
    pub error: String,
}

// Sucesso parcial é esperado e reportado, nunca tudo-ou-nada.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResult {
    pub created: Vec<AvailabilityWithTags>,
    pub errors: Vec<BulkSlotError>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDeletion {
    pub id: Uuid,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub deleted_count: usize,
    pub blocked: Vec<BlockedDeletion>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    repo: AvailabilityRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl AvailabilityService {
    pub fn new(repo: AvailabilityRepository, catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { repo, catalog_repo, pool }
    }

    pub async fn create(
        &self,
        teacher_id: Uuid,
        input: &SlotInput,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityWithTags, AppError> {
        validate_slot_input(input, now)?;

        let mut tx = self.pool.begin().await?;

        // Serializa com outros creates/updates do mesmo professor na mesma
        // data: a varredura de sobreposição fica livre de corrida.
        self.repo.lock_teacher_date(&mut *tx, teacher_id, input.date).await?;

        self.check_tag_rules(&mut tx, input).await?;
        self.check_overlap(&mut tx, teacher_id, input, None).await?;

        let availability = self
            .repo
            .insert(
                &mut *tx,
                teacher_id,
                input.title.trim(),
                input.color.as_deref(),
                input.date,
                input.start_hour,
                input.end_hour,
                input.for_school_students,
                input.for_university_students,
            )
            .await?;

        self.repo
            .set_tags(
                &mut tx,
                availability.id,
                &input.grade_ids,
                &input.track_ids,
                &input.subject_ids,
            )
            .await?;

        tx.commit().await?;

        Ok(AvailabilityWithTags {
            availability,
            grade_ids: input.grade_ids.clone(),
            track_ids: input.track_ids.clone(),
            subject_ids: input.subject_ids.clone(),
        })
    }

    pub async fn update(
        &self,
        teacher_id: Uuid,
        id: Uuid,
        input: &SlotInput,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityWithTags, AppError> {
        validate_slot_input(input, now)?;

        let mut tx = self.pool.begin().await?;

        let existing = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horário não encontrado.".into()))?;

        if existing.teacher_id != teacher_id {
            return Err(AppError::PermissionDenied(
                "Você só pode editar os seus próprios horários.".into(),
            ));
        }
        if existing.is_booked {
            return Err(AppError::Conflict(
                "Este horário já foi reservado e não pode mais ser editado.".into(),
            ));
        }

        self.repo.lock_teacher_date(&mut *tx, teacher_id, input.date).await?;

        self.check_tag_rules(&mut tx, input).await?;
        // A varredura exclui o próprio bloco.
        self.check_overlap(&mut tx, teacher_id, input, Some(id)).await?;

        let availability = self
            .repo
            .update(
                &mut *tx,
                id,
                input.title.trim(),
                input.color.as_deref(),
                input.date,
                input.start_hour,
                input.end_hour,
                input.for_school_students,
                input.for_university_students,
            )
            .await?;

        self.repo
            .set_tags(
                &mut tx,
                availability.id,
                &input.grade_ids,
                &input.track_ids,
                &input.subject_ids,
            )
            .await?;

        tx.commit().await?;

        Ok(AvailabilityWithTags {
            availability,
            grade_ids: input.grade_ids.clone(),
            track_ids: input.track_ids.clone(),
            subject_ids: input.subject_ids.clone(),
        })
    }

    pub async fn delete(
        &self,
        teacher_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let availability = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horário não encontrado.".into()))?;

        if availability.teacher_id != teacher_id {
            return Err(AppError::PermissionDenied(
                "Você só pode excluir os seus próprios horários.".into(),
            ));
        }

        let (allowed, reason) = availability.can_be_deleted(now);
        if !allowed {
            return Err(AppError::PolicyViolation(reason.unwrap_or_default()));
        }

        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Criação em massa a partir de horas avulsas escolhidas no calendário:
    /// agrupa por data, colapsa cada data em um bloco contíguo e passa cada
    /// bloco pelo `create` normal. Erros são por data; o lote nunca aborta.
    pub async fn bulk_create(
        &self,
        teacher_id: Uuid,
        picks: &[HourPick],
        template: &SlotInput,
        now: DateTime<Utc>,
    ) -> Result<BulkCreateResult, AppError> {
        if picks.iter().any(|p| !(0..=23).contains(&p.hour)) {
            return Err(AppError::field_validation(
                "slots",
                "As horas precisam estar entre 0 e 23.",
            ));
        }

        let mut created = Vec::new();
        let mut errors = Vec::new();

        for (date, (start_hour, end_hour)) in group_hour_selections(picks) {
            let input = SlotInput { date, start_hour, end_hour, ..template.clone() };

            match self.create(teacher_id, &input, now).await {
                Ok(block) => created.push(block),
                Err(err) => errors.push(BulkSlotError { date, error: describe_error(&err) }),
            }
        }

        Ok(BulkCreateResult { created, errors })
    }

    /// Exclusão em massa: aplica a política de exclusão individualmente por
    /// id e reporta os bloqueados com o motivo.
    pub async fn bulk_delete(
        &self,
        teacher_id: Uuid,
        ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<BulkDeleteResult, AppError> {
        let mut deleted_count = 0;
        let mut blocked = Vec::new();

        for &id in ids {
            match self.delete(teacher_id, id, now).await {
                Ok(()) => deleted_count += 1,
                Err(err) => blocked.push(BlockedDeletion { id, reason: describe_error(&err) }),
            }
        }

        Ok(BulkDeleteResult { deleted_count, blocked })
    }

    pub async fn list_mine(&self, teacher_id: Uuid) -> Result<Vec<AvailabilityWithTags>, AppError> {
        let blocks = self.repo.list_by_teacher(teacher_id).await?;

        let mut conn = self.pool.acquire().await?;
        let mut result = Vec::with_capacity(blocks.len());
        for availability in blocks {
            let (grade_ids, track_ids, subject_ids) =
                self.repo.tag_ids(&mut conn, availability.id).await?;
            result.push(AvailabilityWithTags { availability, grade_ids, track_ids, subject_ids });
        }
        Ok(result)
    }

    // ---
    // Regras internas
    // ---

    /// Regra de trilha: se alguma das séries selecionadas é 11 ou 12, pelo
    /// menos uma trilha precisa acompanhar.
    async fn check_tag_rules(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &SlotInput,
    ) -> Result<(), AppError> {
        if input.for_school_students && !input.grade_ids.is_empty() {
            let grades = self.catalog_repo.get_grades_by_ids(&mut **tx, &input.grade_ids).await?;
            if grades.len() != input.grade_ids.len() {
                return Err(AppError::field_validation(
                    "grades",
                    "Uma ou mais séries selecionadas não existem.",
                ));
            }
            if grades.iter().any(|g| g.requires_track()) && input.track_ids.is_empty() {
                return Err(AppError::field_validation(
                    "tracks",
                    "Selecione pelo menos uma trilha para as séries 11 e 12.",
                ));
            }
        }
        Ok(())
    }

    /// Varredura de sobreposição contra TODOS os blocos do professor na
    /// data (reservados inclusive).
    async fn check_overlap(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        teacher_id: Uuid,
        input: &SlotInput,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let existing = self
            .repo
            .list_for_teacher_on_date(&mut **tx, teacher_id, input.date, exclude_id)
            .await?;

        for block in &existing {
            if ranges_overlap(input.start_hour, input.end_hour, block.start_hour, block.end_hour) {
                return Err(AppError::field_validation(
                    "startHour",
                    &format!(
                        "O horário conflita com um já existente ({:02}:00–{:02}:00) em {}. \
                         Escolha outro horário.",
                        block.start_hour, block.end_hour, input.date
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Validações puras do bloco, na ordem: título, faixa de horas, instante no
/// passado, público-alvo e tags de elegibilidade.
pub(crate) fn validate_slot_input(input: &SlotInput, now: DateTime<Utc>) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::field_validation("title", "O título é obrigatório."));
    }

    if !(0..=23).contains(&input.start_hour) || !(0..=23).contains(&input.end_hour) {
        return Err(AppError::field_validation(
            "startHour",
            "As horas precisam estar entre 0 e 23.",
        ));
    }

    if input.start_hour == input.end_hour {
        // "Dia inteiro ou vazio" é ambíguo; rejeitado na entrada.
        return Err(AppError::field_validation(
            "endHour",
            "A hora final precisa ser diferente da inicial.",
        ));
    }

    // Blocos não atravessam a meia-noite: fim 0 significa meia-noite em
    // ponto; qualquer outro fim menor que o início é uma volta de dia.
    if input.end_hour != 0 && input.end_hour < input.start_hour {
        return Err(AppError::field_validation(
            "endHour",
            "O horário não pode atravessar a meia-noite. \
             Use 0 como hora final para terminar à meia-noite.",
        ));
    }

    if availability::slot_start(input.date, input.start_hour) < now {
        return Err(AppError::field_validation(
            "date",
            "Não é possível criar um horário no passado.",
        ));
    }

    if !input.for_school_students && !input.for_university_students {
        return Err(AppError::field_validation(
            "forSchoolStudents",
            "Selecione pelo menos um tipo de aluno.",
        ));
    }

    if input.for_school_students && input.grade_ids.is_empty() {
        return Err(AppError::field_validation(
            "grades",
            "Selecione pelo menos uma série para alunos escolares.",
        ));
    }

    if input.for_university_students && input.subject_ids.is_empty() {
        return Err(AppError::field_validation(
            "subjects",
            "Selecione pelo menos uma matéria para alunos universitários.",
        ));
    }

    Ok(())
}

/// Agrupa as horas escolhidas por data e colapsa cada data em um único
/// bloco contíguo `[min, max + 1)`. A escolha conjunta de 23h e 0h é lida
/// como uma sequência virando a meia-noite: o 0 é elevado para 24 antes do
/// min/máx e o resultado volta para 0–23 por módulo.
pub(crate) fn group_hour_selections(picks: &[HourPick]) -> BTreeMap<NaiveDate, (i32, i32)> {
    let mut by_date: BTreeMap<NaiveDate, Vec<i32>> = BTreeMap::new();
    for pick in picks {
        by_date.entry(pick.date).or_default().push(pick.hour);
    }

    by_date
        .into_iter()
        .map(|(date, hours)| {
            let lift_midnight = hours.contains(&0) && hours.contains(&23);
            let normalized: Vec<i32> = hours
                .iter()
                .map(|&h| if h == 0 && lift_midnight { 24 } else { h })
                .collect();

            // Os vetores nunca estão vazios: cada entrada nasce de um pick.
            let min = normalized.iter().copied().min().unwrap_or(0);
            let max = normalized.iter().copied().max().unwrap_or(0);

            (date, (min % 24, (max + 1) % 24))
        })
        .collect()
}

/// Mensagem por item dos lotes: achata os detalhes de validação em texto.
fn describe_error(err: &AppError) -> String {
    match err {
        AppError::ValidationError(errors) => {
            let mut messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|field_errors| {
                    field_errors.iter().filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                })
                .collect();
            messages.sort();
            if messages.is_empty() {
                "Um ou mais campos são inválidos.".to_string()
            } else {
                messages.join(" ")
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn pick(d: u32, hour: i32) -> HourPick {
        HourPick { date: day(d), hour }
    }

    fn input(date: NaiveDate, start: i32, end: i32) -> SlotInput {
        SlotInput {
            title: "Plantão de dúvidas".to_string(),
            color: None,
            date,
            start_hour: start,
            end_hour: end,
            for_school_students: true,
            for_university_students: false,
            grade_ids: vec![Uuid::new_v4()],
            track_ids: vec![],
            subject_ids: vec![],
        }
    }

    fn past() -> DateTime<Utc> {
        // Bem antes de qualquer data dos testes
        availability::slot_start(day(1), 0) - chrono::Duration::days(30)
    }

    // --- group_hour_selections ---

    #[test]
    fn groups_hours_per_date_into_contiguous_blocks() {
        let picks = vec![pick(10, 9), pick(10, 10), pick(11, 14)];
        let grouped = group_hour_selections(&picks);

        assert_eq!(grouped[&day(10)], (9, 11));
        assert_eq!(grouped[&day(11)], (14, 15));
    }

    #[test]
    fn gap_in_selection_still_spans_min_to_max() {
        let picks = vec![pick(10, 9), pick(10, 13)];
        let grouped = group_hour_selections(&picks);
        assert_eq!(grouped[&day(10)], (9, 14));
    }

    #[test]
    fn late_night_with_midnight_is_lifted_to_24_space() {
        // 22h, 23h e 0h: o 0 vira 24, o bloco resultante [22, 1) atravessa
        // a meia-noite e será rejeitado pela validação do create.
        let picks = vec![pick(10, 22), pick(10, 23), pick(10, 0)];
        let grouped = group_hour_selections(&picks);
        assert_eq!(grouped[&day(10)], (22, 1));
    }

    #[test]
    fn selection_ending_at_midnight_reduces_to_zero() {
        let picks = vec![pick(10, 22), pick(10, 23)];
        let grouped = group_hour_selections(&picks);
        // [22, 24) é armazenado como fim 0 (meia-noite)
        assert_eq!(grouped[&day(10)], (22, 0));
    }

    #[test]
    fn early_morning_zero_is_not_lifted() {
        let picks = vec![pick(10, 0), pick(10, 1), pick(10, 2)];
        let grouped = group_hour_selections(&picks);
        assert_eq!(grouped[&day(10)], (0, 3));
    }

    // --- validate_slot_input ---

    #[test]
    fn rejects_blank_title() {
        let mut i = input(day(10), 9, 11);
        i.title = "   ".to_string();
        assert!(validate_slot_input(&i, past()).is_err());
    }

    #[test]
    fn rejects_equal_start_and_end() {
        let i = input(day(10), 9, 9);
        assert!(validate_slot_input(&i, past()).is_err());
    }

    #[test]
    fn rejects_block_crossing_midnight() {
        let i = input(day(10), 22, 2);
        assert!(validate_slot_input(&i, past()).is_err());
    }

    #[test]
    fn accepts_block_ending_at_midnight() {
        let i = input(day(10), 22, 0);
        assert!(validate_slot_input(&i, past()).is_ok());
    }

    #[test]
    fn rejects_slot_in_the_past() {
        let i = input(day(10), 9, 11);
        let now = availability::slot_start(day(10), 9) + chrono::Duration::hours(1);
        assert!(validate_slot_input(&i, now).is_err());
    }

    #[test]
    fn rejects_missing_audience() {
        let mut i = input(day(10), 9, 11);
        i.for_school_students = false;
        i.for_university_students = false;
        assert!(validate_slot_input(&i, past()).is_err());
    }

    #[test]
    fn school_audience_requires_grades() {
        let mut i = input(day(10), 9, 11);
        i.grade_ids.clear();
        assert!(validate_slot_input(&i, past()).is_err());
    }

    #[test]
    fn university_audience_requires_subjects() {
        let mut i = input(day(10), 9, 11);
        i.for_school_students = false;
        i.grade_ids.clear();
        i.for_university_students = true;
        assert!(validate_slot_input(&i, past()).is_err());

        i.subject_ids.push(Uuid::new_v4());
        assert!(validate_slot_input(&i, past()).is_ok());
    }
}
