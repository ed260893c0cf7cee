use std::collections::BTreeSet;

use crate::records::Mark;

/// Six formative components per subject, each out of 5 marks.
pub const FORMATIVE_MAX_PER_SUBJECT: f64 = 30.0;

/// Fixed four-bucket vocabulary for single-valued qualitative ratings.
///
/// The mapping is a lookup table, not a continuous scale: report output
/// depends on these exact bucket values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalLevel {
    High,
    Medium,
    Low,
    Unset,
}

impl OrdinalLevel {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("High") | Some("Talented") | Some("Highly Talented")
            | Some("Normal and Healthy") => OrdinalLevel::High,
            Some("Medium") => OrdinalLevel::Medium,
            Some("Low") | Some("No talent") | Some("Needs Attention") => OrdinalLevel::Low,
            _ => OrdinalLevel::Unset,
        }
    }

    pub fn percent(self) -> f64 {
        match self {
            OrdinalLevel::High => 90.0,
            OrdinalLevel::Medium => 60.0,
            OrdinalLevel::Low => 30.0,
            OrdinalLevel::Unset => 0.0,
        }
    }
}

/// Shorthand used by the aggregation engine for rating columns.
pub fn ordinal_percent(label: Option<&str>) -> f64 {
    OrdinalLevel::from_label(label).percent()
}

/// Co-curricular proficiency tiers, scored against a category-specific
/// maximum (4 for activity/participation/culture, 2 for the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proficiency {
    Sky,
    Mountain,
    Stream,
    NotSatisfied,
}

impl Proficiency {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("Sky") => Proficiency::Sky,
            Some("Mountain") => Proficiency::Mountain,
            Some("Stream") => Proficiency::Stream,
            _ => Proficiency::NotSatisfied,
        }
    }

    /// Mapped score for a category with maximum `max`. Mid tiers round half
    /// up, so for `max = 4` Mountain scores 3 and Stream scores 1.
    pub fn score(self, max: u32) -> u32 {
        match self {
            Proficiency::Sky => max,
            Proficiency::Mountain => round_half_up(0.66 * max as f64),
            Proficiency::Stream => round_half_up(0.33 * max as f64),
            Proficiency::NotSatisfied => 0,
        }
    }
}

fn round_half_up(x: f64) -> u32 {
    (x + 0.5).floor() as u32
}

/// Overall academic percentage for one student: all present formative marks
/// summed across subjects, out of 30 per distinct subject. A student with no
/// mark records scores 0, never NaN, so downstream comparisons stay total.
pub fn academic_percent(marks: &[Mark]) -> f64 {
    let subjects: BTreeSet<&str> = marks.iter().map(|m| m.subject.as_str()).collect();
    if subjects.is_empty() {
        return 0.0;
    }
    let earned: f64 = marks.iter().map(Mark::formative_total).sum();
    let max = subjects.len() as f64 * FORMATIVE_MAX_PER_SUBJECT;
    (100.0 * earned / max).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_percent_stays_in_four_buckets() {
        let labels = [
            Some("High"),
            Some("Talented"),
            Some("Highly Talented"),
            Some("Normal and Healthy"),
            Some("Medium"),
            Some("Low"),
            Some("No talent"),
            Some("Needs Attention"),
            Some("garbage"),
            Some(""),
            None,
        ];
        for label in labels {
            let p = ordinal_percent(label);
            assert!(
                [0.0, 30.0, 60.0, 90.0].contains(&p),
                "unexpected percent {} for {:?}",
                p,
                label
            );
        }
        assert_eq!(ordinal_percent(Some("High")), 90.0);
        assert_eq!(ordinal_percent(Some("Normal and Healthy")), 90.0);
        assert_eq!(ordinal_percent(Some("Medium")), 60.0);
        assert_eq!(ordinal_percent(Some("Needs Attention")), 30.0);
        assert_eq!(ordinal_percent(None), 0.0);
    }

    #[test]
    fn proficiency_scores_are_monotonic_for_both_maxima() {
        for max in [2_u32, 4] {
            let ns = Proficiency::NotSatisfied.score(max);
            let stream = Proficiency::Stream.score(max);
            let mountain = Proficiency::Mountain.score(max);
            let sky = Proficiency::Sky.score(max);
            assert!(ns <= stream && stream <= mountain && mountain <= sky);
            assert_eq!(ns, 0);
            assert_eq!(sky, max);
        }
        // Half-up rounding at max 4: 2.64 -> 3, 1.32 -> 1.
        assert_eq!(Proficiency::Mountain.score(4), 3);
        assert_eq!(Proficiency::Stream.score(4), 1);
        assert_eq!(Proficiency::Mountain.score(2), 1);
        assert_eq!(Proficiency::Stream.score(2), 1);
    }

    #[test]
    fn unrecognized_proficiency_label_scores_zero() {
        assert_eq!(Proficiency::from_label(Some("Ocean")).score(4), 0);
        assert_eq!(Proficiency::from_label(None).score(2), 0);
    }

    #[test]
    fn academic_percent_with_no_marks_is_zero() {
        assert_eq!(academic_percent(&[]), 0.0);
    }

    #[test]
    fn academic_percent_sums_sparse_formatives_across_subjects() {
        let marks = vec![
            Mark {
                student_id: "s1".into(),
                exam_id: 1,
                subject: "English".into(),
                fa1: Some(4.0),
                fa2: Some(5.0),
                ..Default::default()
            },
            Mark {
                student_id: "s1".into(),
                exam_id: 2,
                subject: "English".into(),
                fa3: Some(3.0),
                ..Default::default()
            },
            Mark {
                student_id: "s1".into(),
                exam_id: 1,
                subject: "Maths".into(),
                fa1: Some(3.0),
                ..Default::default()
            },
        ];
        // 15 marks earned over two subjects (max 60).
        assert!((academic_percent(&marks) - 25.0).abs() < 1e-9);
    }
}
