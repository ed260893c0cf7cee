use std::collections::BTreeMap;

use crate::records::Mark;

/// Sentinel exam id for a consolidated record that is not tied to one exam.
pub const CONSOLIDATED_EXAM_ID: i64 = 0;

/// Each subject's consolidated record is scored out of 100 marks.
pub const SUBJECT_MAX: f64 = 100.0;

/// Collapses per-exam mark records into one cumulative record per subject.
///
/// Additive fold over each of the eight numeric fields independently: a field
/// present on the incoming record is added onto the accumulator, a field
/// never present in any input stays absent so the renderer can tell "no data"
/// from a scored zero. Input order does not matter.
pub fn consolidate_marks(raw: &[Mark]) -> BTreeMap<String, Mark> {
    let mut by_subject: BTreeMap<String, Mark> = BTreeMap::new();
    for m in raw {
        let acc = by_subject.entry(m.subject.clone()).or_insert_with(|| Mark {
            student_id: m.student_id.clone(),
            exam_id: CONSOLIDATED_EXAM_ID,
            subject: m.subject.clone(),
            ..Default::default()
        });
        acc.merge_add(m);
    }
    by_subject
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    APlus,
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        }
    }
}

/// Render-time letter grade for a grand total out of `max` marks. Every
/// boundary is a strict greater-than except the D floor, which is inclusive:
/// exactly 85% is an A, exactly 33% is a D.
pub fn letter_grade(total: f64, max: f64) -> Grade {
    let percent = if max > 0.0 { 100.0 * total / max } else { 0.0 };
    if percent > 85.0 {
        Grade::APlus
    } else if percent > 70.0 {
        Grade::A
    } else if percent > 55.0 {
        Grade::B
    } else if percent > 40.0 {
        Grade::C
    } else if percent >= 33.0 {
        Grade::D
    } else {
        Grade::E
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(subject: &str, exam_id: i64, fa1: Option<f64>, summative: Option<f64>) -> Mark {
        Mark {
            student_id: "s1".into(),
            exam_id,
            subject: subject.into(),
            fa1,
            summative,
            ..Default::default()
        }
    }

    #[test]
    fn consolidation_adds_fields_across_exams() {
        let raw = vec![
            mark("Maths", 1, Some(4.0), None),
            mark("Maths", 2, Some(3.0), Some(40.0)),
            mark("English", 1, Some(5.0), None),
        ];
        let merged = consolidate_marks(&raw);
        assert_eq!(merged.len(), 2);

        let maths = &merged["Maths"];
        assert_eq!(maths.exam_id, CONSOLIDATED_EXAM_ID);
        assert_eq!(maths.fa1, Some(7.0));
        assert_eq!(maths.summative, Some(40.0));
        // Never present in any input, so it must stay absent.
        assert_eq!(maths.fa2, None);

        assert_eq!(merged["English"].fa1, Some(5.0));
    }

    #[test]
    fn consolidation_is_order_independent() {
        let mut raw = vec![
            mark("Maths", 1, Some(4.0), Some(10.0)),
            mark("Maths", 2, Some(3.0), None),
            mark("Hindi", 1, Some(2.0), Some(30.0)),
            mark("Hindi", 3, None, Some(5.0)),
        ];
        let forward = consolidate_marks(&raw);
        raw.reverse();
        assert_eq!(consolidate_marks(&raw), forward);
    }

    #[test]
    fn repeated_entries_for_same_exam_accumulate() {
        let raw = vec![
            mark("Maths", 1, Some(2.0), None),
            mark("Maths", 1, Some(1.5), None),
        ];
        assert_eq!(consolidate_marks(&raw)["Maths"].fa1, Some(3.5));
    }

    #[test]
    fn zero_score_stays_distinct_from_absent() {
        let raw = vec![mark("Maths", 1, Some(0.0), None)];
        let maths = &consolidate_marks(&raw)["Maths"];
        assert_eq!(maths.fa1, Some(0.0));
        assert_eq!(maths.fa2, None);
    }

    #[test]
    fn grade_boundaries_are_strict_except_d_floor() {
        assert_eq!(letter_grade(85.0, 100.0), Grade::A);
        assert_eq!(letter_grade(85.1, 100.0), Grade::APlus);
        assert_eq!(letter_grade(70.0, 100.0), Grade::B);
        assert_eq!(letter_grade(55.0, 100.0), Grade::C);
        assert_eq!(letter_grade(40.0, 100.0), Grade::D);
        assert_eq!(letter_grade(33.0, 100.0), Grade::D);
        assert_eq!(letter_grade(32.9, 100.0), Grade::E);
    }

    #[test]
    fn grade_handles_multi_subject_totals() {
        // 170 / 200 = 85% exactly: still an A.
        assert_eq!(letter_grade(170.0, 2.0 * SUBJECT_MAX), Grade::A);
        assert_eq!(letter_grade(0.0, 0.0), Grade::E);
    }
}
