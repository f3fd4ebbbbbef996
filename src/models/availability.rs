// src/models/availability.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Aulas reservadas só podem ser canceladas com esta antecedência mínima.
pub const DELETION_LOCK_HOURS: i64 = 8;

// Um horário publicado por um professor: um bloco contíguo de horas cheias
// em um dia. `end_hour` é exclusivo; o valor 0 significa meia-noite (fim do
// dia, normalizado para 24 em toda comparação). Blocos não atravessam a
// meia-noite: `end_hour` precisa ser 0 ou maior que `start_hour`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub color: Option<String>,
    pub date: NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub for_school_students: bool,
    pub for_university_students: bool,
    pub is_booked: bool,
    pub booked_by: Option<Uuid>,
    pub booked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O bloco com suas associações de elegibilidade, como exposto na API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWithTags {
    pub availability: Availability,
    pub grade_ids: Vec<Uuid>,
    pub track_ids: Vec<Uuid>,
    pub subject_ids: Vec<Uuid>,
}

// Linhas candidatas da busca de elegibilidade: um bloco livre e futuro com
// as tags que a regra em memória precisa examinar.

#[derive(Debug, Clone, FromRow)]
pub struct SchoolCandidate {
    pub teacher_id: Uuid,
    pub track_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UniversityCandidate {
    pub teacher_id: Uuid,
    pub subject_ids: Vec<Uuid>,
}

/// Normaliza a borda final da faixa: 0 vale 24 (bloco termina à meia-noite).
pub fn normalize_end(hour: i32) -> i32 {
    if hour == 0 { 24 } else { hour }
}

/// Duas faixas semiabertas `[s1, e1)` e `[s2, e2)` se intersectam?
/// Só faz sentido para blocos do mesmo professor na mesma data; a checagem
/// de contexto fica em `Availability::overlaps_with`.
pub fn ranges_overlap(start_a: i32, end_a: i32, start_b: i32, end_b: i32) -> bool {
    let e_a = normalize_end(end_a);
    let e_b = normalize_end(end_b);
    !(e_a <= start_b || e_b <= start_a)
}

/// Duração em horas do bloco, com a borda final normalizada.
/// Válido apenas para blocos que não atravessam a meia-noite (invariante
/// garantida na criação).
pub fn block_duration_hours(start_hour: i32, end_hour: i32) -> i32 {
    normalize_end(end_hour) - start_hour
}

/// Instante de início do bloco no fuso de referência do serviço (UTC).
pub fn slot_start(date: NaiveDate, start_hour: i32) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(start_hour as i64)
}

/// Iterador sobre as horas cheias cobertas pelo bloco: parte de
/// `start_hour` e avança `(h + 1) % 24` até alcançar `end_hour`.
/// Termina para qualquer par de horas distintas, inclusive no caso em que
/// `end_hour < start_hour` (volta pela meia-noite); para `start == end`
/// produz uma sequência vazia.
pub struct HourIter {
    current: i32,
    end: i32,
}

impl Iterator for HourIter {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.current == self.end {
            return None;
        }
        let hour = self.current;
        self.current = (self.current + 1) % 24;
        Some(hour)
    }
}

pub fn hours_covered(start_hour: i32, end_hour: i32) -> HourIter {
    HourIter { current: start_hour % 24, end: end_hour % 24 }
}

impl Availability {
    /// Dois blocos se sobrepõem somente se forem do mesmo professor, na
    /// mesma data, e as faixas de hora se intersectarem.
    pub fn overlaps_with(&self, other: &Availability) -> bool {
        if self.teacher_id != other.teacher_id || self.date != other.date {
            return false;
        }
        ranges_overlap(self.start_hour, self.end_hour, other.start_hour, other.end_hour)
    }

    pub fn hours(&self) -> HourIter {
        hours_covered(self.start_hour, self.end_hour)
    }

    pub fn slot_start(&self) -> DateTime<Utc> {
        slot_start(self.date, self.start_hour)
    }

    pub fn duration_hours(&self) -> i32 {
        block_duration_hours(self.start_hour, self.end_hour)
    }

    /// Política de exclusão: bloco livre pode sempre ser excluído. Bloco
    /// reservado só pode ser excluído com mais de 8 horas de antecedência;
    /// a recusa informa quantas horas faltam para o início da aula.
    pub fn can_be_deleted(&self, now: DateTime<Utc>) -> (bool, Option<String>) {
        if !self.is_booked {
            return (true, None);
        }

        let remaining = self.slot_start() - now;
        if remaining < Duration::hours(DELETION_LOCK_HOURS) {
            let remaining_hours = (remaining.num_minutes() as f64 / 60.0).max(0.0);
            return (
                false,
                Some(format!(
                    "Esta aula já foi reservada e começa em {:.1} hora(s). \
                     Reservas só podem ser canceladas com mais de {} horas de antecedência.",
                    remaining_hours, DELETION_LOCK_HOURS
                )),
            );
        }

        (true, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(teacher: Uuid, date: NaiveDate, start: i32, end: i32) -> Availability {
        Availability {
            id: Uuid::new_v4(),
            teacher_id: teacher,
            title: "Aula de reforço".to_string(),
            color: None,
            date,
            start_hour: start,
            end_hour: end,
            for_school_students: true,
            for_university_students: false,
            is_booked: false,
            booked_by: None,
            booked_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn adjacent_blocks_do_not_overlap() {
        let teacher = Uuid::new_v4();
        let a = block(teacher, day(), 9, 11);
        let b = block(teacher, day(), 11, 13);
        assert!(!a.overlaps_with(&b));
        assert!(!b.overlaps_with(&a));
    }

    #[test]
    fn intersecting_blocks_overlap_symmetrically() {
        let teacher = Uuid::new_v4();
        let a = block(teacher, day(), 9, 11);
        let b = block(teacher, day(), 10, 12);
        assert!(a.overlaps_with(&b));
        assert!(b.overlaps_with(&a));
    }

    #[test]
    fn block_overlaps_itself() {
        let teacher = Uuid::new_v4();
        let a = block(teacher, day(), 9, 10);
        assert!(a.overlaps_with(&a));
    }

    #[test]
    fn different_teacher_or_date_never_overlaps() {
        let a = block(Uuid::new_v4(), day(), 9, 11);
        let b = block(Uuid::new_v4(), day(), 9, 11);
        assert!(!a.overlaps_with(&b));

        let teacher = Uuid::new_v4();
        let c = block(teacher, day(), 9, 11);
        let d = block(teacher, day().succ_opt().unwrap(), 9, 11);
        assert!(!c.overlaps_with(&d));
    }

    #[test]
    fn midnight_end_is_treated_as_24() {
        let teacher = Uuid::new_v4();
        // [22, 24) e [23, 24): intersectam
        let a = block(teacher, day(), 22, 0);
        let b = block(teacher, day(), 23, 0);
        assert!(a.overlaps_with(&b));

        // [21, 22) é adjacente a [22, 24): não intersecta
        let c = block(teacher, day(), 21, 22);
        assert!(!a.overlaps_with(&c));

        assert_eq!(block_duration_hours(22, 0), 2);
    }

    #[test]
    fn hours_iterator_simple_range() {
        let hours: Vec<i32> = hours_covered(9, 12).collect();
        assert_eq!(hours, vec![9, 10, 11]);
    }

    #[test]
    fn hours_iterator_wraps_past_midnight() {
        // Mesmo sem blocos armazenados atravessarem a meia-noite, o
        // iterador precisa terminar no caso de volta.
        let hours: Vec<i32> = hours_covered(22, 2).collect();
        assert_eq!(hours, vec![22, 23, 0, 1]);
    }

    #[test]
    fn hours_iterator_until_midnight() {
        let hours: Vec<i32> = hours_covered(22, 0).collect();
        assert_eq!(hours, vec![22, 23]);
    }

    #[test]
    fn hours_iterator_empty_when_bounds_equal() {
        assert_eq!(hours_covered(5, 5).count(), 0);
    }

    #[test]
    fn hours_iterator_is_restartable() {
        let iter = || hours_covered(23, 1);
        assert_eq!(iter().collect::<Vec<_>>(), iter().collect::<Vec<_>>());
    }

    #[test]
    fn unbooked_block_is_always_deletable() {
        let a = block(Uuid::new_v4(), day(), 9, 11);
        // Mesmo "agora" sendo depois do início do bloco
        let late = slot_start(day(), 9) + Duration::hours(5);
        assert_eq!(a.can_be_deleted(late), (true, None));
    }

    #[test]
    fn booked_block_is_locked_inside_eight_hours() {
        let mut a = block(Uuid::new_v4(), day(), 12, 14);
        a.is_booked = true;

        // Começa em 3 horas: bloqueado, mensagem cita 3.0
        let now = a.slot_start() - Duration::hours(3);
        let (allowed, reason) = a.can_be_deleted(now);
        assert!(!allowed);
        assert!(reason.unwrap().contains("3.0"));
    }

    #[test]
    fn booked_block_is_deletable_outside_eight_hours() {
        let mut a = block(Uuid::new_v4(), day(), 12, 14);
        a.is_booked = true;

        let now = a.slot_start() - Duration::hours(9);
        assert_eq!(a.can_be_deleted(now), (true, None));
    }

    #[test]
    fn slot_start_combines_date_and_hour() {
        let start = slot_start(day(), 14);
        assert_eq!(start.to_rfc3339(), "2025-03-01T14:00:00+00:00");
    }
}
