// src/services/matching_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, CatalogRepository},
    models::{
        auth::{User, UserType},
        availability::{SchoolCandidate, UniversityCandidate},
    },
};

// Pedido de busca: o aluno informa país e, conforme o tipo, série (+ trilha
// nas séries 11/12) ou curso universitário.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub student_type: UserType,
    pub country_id: Uuid,
    pub grade_id: Option<Uuid>,
    pub track_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct MatchingService {
    availability_repo: AvailabilityRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl MatchingService {
    pub fn new(
        availability_repo: AvailabilityRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { availability_repo, catalog_repo, pool }
    }

    /// Professores com pelo menos um horário futuro e livre compatível com
    /// o perfil pedido. Determinístico: o mesmo pedido contra o mesmo
    /// conjunto de horários devolve sempre o mesmo conjunto (ordenado).
    pub async fn find_matching_teachers(
        &self,
        request: &FilterRequest,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, AppError> {
        match request.student_type {
            UserType::SchoolStudent => self.match_school(request, now).await,
            UserType::UniversityStudent => self.match_university(request, viewer, now).await,
            UserType::Teacher => Err(AppError::field_validation(
                "studentType",
                "A busca de professores é feita por alunos.",
            )),
        }
    }

    async fn match_school(
        &self,
        request: &FilterRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, AppError> {
        let grade_id = request.grade_id.ok_or_else(|| {
            AppError::field_validation("grade", "Informe a série para buscar professores.")
        })?;

        let grade = self
            .catalog_repo
            .get_grade(&self.pool, grade_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Série não encontrada.".into()))?;

        let track_required = grade.requires_track();
        if track_required && request.track_id.is_none() {
            return Err(AppError::field_validation(
                "track",
                "Informe a trilha para as séries 11 e 12.",
            ));
        }

        let candidates = self
            .availability_repo
            .school_candidates(&self.pool, request.country_id, grade_id, now)
            .await?;

        Ok(filter_school(&candidates, track_required, request.track_id))
    }

    async fn match_university(
        &self,
        request: &FilterRequest,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, AppError> {
        // O curso pode vir explícito no pedido ou do perfil do aluno
        // autenticado.
        let major_id = request
            .major_id
            .or_else(|| viewer.and_then(|u| u.major_id))
            .ok_or_else(|| {
                AppError::field_validation("major", "Informe o curso para buscar professores.")
            })?;

        let major_subjects: HashSet<Uuid> = self
            .catalog_repo
            .subject_ids_for_major(&self.pool, major_id)
            .await?
            .into_iter()
            .collect();

        // Curso sem matérias associadas: conjunto vazio por política, não erro.
        if major_subjects.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self
            .availability_repo
            .university_candidates(&self.pool, request.country_id, now)
            .await?;

        Ok(filter_university(&candidates, &major_subjects))
    }
}

/// Caminho escolar: o candidato já vem filtrado por país/série/futuro/livre
/// no banco; aqui entra só a regra de trilha das séries 11/12 — o bloco
/// precisa ter a trilha pedida ou não ter trilha nenhuma (aberto a todas).
pub(crate) fn filter_school(
    candidates: &[SchoolCandidate],
    track_required: bool,
    track_id: Option<Uuid>,
) -> Vec<Uuid> {
    let mut teachers = BTreeSet::new();
    for candidate in candidates {
        let track_ok = !track_required
            || candidate.track_ids.is_empty()
            || track_id.map(|t| candidate.track_ids.contains(&t)).unwrap_or(false);
        if track_ok {
            teachers.insert(candidate.teacher_id);
        }
    }
    teachers.into_iter().collect()
}

/// Caminho universitário: o bloco precisa ter pelo menos uma matéria do
/// conjunto associado ao curso.
pub(crate) fn filter_university(
    candidates: &[UniversityCandidate],
    major_subjects: &HashSet<Uuid>,
) -> Vec<Uuid> {
    let mut teachers = BTreeSet::new();
    for candidate in candidates {
        if candidate.subject_ids.iter().any(|s| major_subjects.contains(s)) {
            teachers.insert(candidate.teacher_id);
        }
    }
    teachers.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(teacher: Uuid, tracks: Vec<Uuid>) -> SchoolCandidate {
        SchoolCandidate { teacher_id: teacher, track_ids: tracks }
    }

    fn university(teacher: Uuid, subjects: Vec<Uuid>) -> UniversityCandidate {
        UniversityCandidate { teacher_id: teacher, subject_ids: subjects }
    }

    #[test]
    fn school_without_track_requirement_accepts_everyone() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let candidates = vec![school(t1, vec![Uuid::new_v4()]), school(t2, vec![])];

        let result = filter_school(&candidates, false, None);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn school_track_rule_matches_tagged_or_untagged_blocks() {
        let requested = Uuid::new_v4();
        let other = Uuid::new_v4();
        let tagged_match = Uuid::new_v4();
        let tagged_other = Uuid::new_v4();
        let untagged = Uuid::new_v4();

        let candidates = vec![
            school(tagged_match, vec![requested]),
            school(tagged_other, vec![other]),
            // Sem trilha: aberto a todas as trilhas
            school(untagged, vec![]),
        ];

        let result = filter_school(&candidates, true, Some(requested));
        assert!(result.contains(&tagged_match));
        assert!(result.contains(&untagged));
        assert!(!result.contains(&tagged_other));
    }

    #[test]
    fn university_requires_subject_intersection() {
        let wanted = Uuid::new_v4();
        let unwanted = Uuid::new_v4();
        let matching = Uuid::new_v4();
        let not_matching = Uuid::new_v4();

        let candidates = vec![
            university(matching, vec![unwanted, wanted]),
            university(not_matching, vec![unwanted]),
        ];

        let subjects: HashSet<Uuid> = [wanted].into_iter().collect();
        let result = filter_university(&candidates, &subjects);
        assert_eq!(result, vec![matching]);
    }

    #[test]
    fn empty_major_subject_set_matches_nobody() {
        // Curso sem matérias associadas: zero professores, não erro.
        let candidates = vec![university(Uuid::new_v4(), vec![Uuid::new_v4()])];
        let subjects: HashSet<Uuid> = HashSet::new();
        assert!(filter_university(&candidates, &subjects).is_empty());
    }

    #[test]
    fn duplicate_candidates_yield_distinct_teachers() {
        let teacher = Uuid::new_v4();
        let subject = Uuid::new_v4();
        let candidates = vec![
            university(teacher, vec![subject]),
            university(teacher, vec![subject]),
        ];

        let subjects: HashSet<Uuid> = [subject].into_iter().collect();
        assert_eq!(filter_university(&candidates, &subjects).len(), 1);
    }

    #[test]
    fn filters_are_deterministic() {
        let teachers: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let subject = Uuid::new_v4();
        let candidates: Vec<UniversityCandidate> =
            teachers.iter().map(|&t| university(t, vec![subject])).collect();
        let subjects: HashSet<Uuid> = [subject].into_iter().collect();

        let a = filter_university(&candidates, &subjects);
        let mut reversed: Vec<UniversityCandidate> = candidates.clone();
        reversed.reverse();
        let b = filter_university(&reversed, &subjects);
        assert_eq!(a, b);
    }
}
