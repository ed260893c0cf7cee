use serde::Serialize;

use crate::normalize::{academic_percent, ordinal_percent, Proficiency};
use crate::records::{AssessmentDetail, BehavioralRating, CoCurricularRating, Mark};

pub const DIMENSION_COUNT: usize = 9;

/// Report dimension labels in their fixed display order.
const DIMENSION_LABELS: [&str; DIMENSION_COUNT] = [
    "Health",
    "21st-Century Skills",
    "Participation",
    "Attitude & Values",
    "Presentation Skill",
    "Writing Skill",
    "Comprehension Skill",
    "Academic Performance",
    "Co-Curricular Activity",
];

/// One advisory sentence per dimension, appended when that dimension falls
/// strictly below the advisory threshold. Wording is a content contract with
/// the printed report card.
const DIMENSION_ADVISORIES: [&str; DIMENSION_COUNT] = [
    "Needs to pay closer attention to physical and mental wellbeing.",
    "Should be supported in building creativity, critical thinking, communication, problem solving and collaboration.",
    "Should be encouraged to take part in classroom and school activities.",
    "Needs guidance in developing a positive attitude and sound values.",
    "Needs regular practice to improve presentation skills.",
    "Needs regular practice to improve writing skills.",
    "Needs support to strengthen reading comprehension.",
    "Requires focused academic support to improve subject performance.",
    "Should be motivated to participate in co-curricular activities.",
];

const TALENT_COMMENDATION: &str =
    "Shows an exceptional level of talent and should be given opportunities to nurture it further.";

const HIGHLY_TALENTED_LABEL: &str = "Highly Talented";

const ADVISORY_THRESHOLD: f64 = 50.0;

/// Everything the engine needs about one student in one session. Fetched by
/// the caller; aggregation itself never touches storage.
#[derive(Debug, Clone, Default)]
pub struct RecordBundle {
    pub marks: Vec<Mark>,
    pub behavioral: Option<BehavioralRating>,
    pub details: Vec<AssessmentDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolisticProfile {
    pub dimensions: Vec<Dimension>,
    pub impressions: Vec<String>,
}

/// Picks the detailed-assessment record whose name sorts last under plain
/// string comparison. Lexicographic on purpose: "F10" sorts before "F2",
/// matching the report output the school already relies on.
pub fn latest_detail(details: &[AssessmentDetail]) -> Option<&AssessmentDetail> {
    details
        .iter()
        .max_by(|a, b| a.assessment_name.cmp(&b.assessment_name))
}

/// Weighted co-curricular percentage: mapped scores over all seven rated
/// categories divided by the sum of their maxima. No record means 0.
pub fn co_curricular_percent(rating: Option<&CoCurricularRating>) -> f64 {
    let Some(rating) = rating else {
        return 0.0;
    };
    let mut earned = 0_u32;
    let mut max = 0_u32;
    for (label, category_max) in rating.weighted() {
        earned += Proficiency::from_label(label).score(category_max);
        max += category_max;
    }
    if max == 0 {
        return 0.0;
    }
    100.0 * f64::from(earned) / f64::from(max)
}

/// Builds the nine-dimension holistic profile plus its impressions for one
/// student. Pure over the bundle: calling it twice yields identical output.
pub fn aggregate_profile(bundle: &RecordBundle) -> HolisticProfile {
    let b = bundle.behavioral.clone().unwrap_or_default();

    let health = (ordinal_percent(b.physical_wellbeing.as_deref())
        + ordinal_percent(b.mental_wellbeing.as_deref()))
        / 2.0;

    // Always divided by five: an unset skill contributes 0 to the numerator
    // but still counts in the denominator.
    let skill_labels = [
        b.creativity.as_deref(),
        b.critical_thinking.as_deref(),
        b.communication.as_deref(),
        b.problem_solving.as_deref(),
        b.collaboration.as_deref(),
    ];
    let skills =
        skill_labels.iter().map(|l| ordinal_percent(*l)).sum::<f64>() / skill_labels.len() as f64;

    let detail = latest_detail(&bundle.details);
    let values = [
        health,
        skills,
        ordinal_percent(b.participation_in_activities.as_deref()),
        ordinal_percent(b.attitude_and_values.as_deref()),
        ordinal_percent(b.presentation_skill.as_deref()),
        ordinal_percent(b.writing_skill.as_deref()),
        ordinal_percent(b.comprehension_skill.as_deref()),
        academic_percent(&bundle.marks),
        co_curricular_percent(detail.map(|d| &d.co_curricular)),
    ];

    let dimensions: Vec<Dimension> = DIMENSION_LABELS
        .iter()
        .zip(values)
        .map(|(label, value)| Dimension {
            label: (*label).to_string(),
            value,
        })
        .collect();

    let mut impressions: Vec<String> = Vec::new();
    for (i, d) in dimensions.iter().enumerate() {
        if d.value < ADVISORY_THRESHOLD {
            impressions.push(DIMENSION_ADVISORIES[i].to_string());
        }
    }
    if b.talent_level.as_deref().map(str::trim) == Some(HIGHLY_TALENTED_LABEL) {
        impressions.push(TALENT_COMMENDATION.to_string());
    }

    HolisticProfile {
        dimensions,
        impressions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AnecdotalRecord;

    fn full_behavioral() -> BehavioralRating {
        BehavioralRating {
            physical_wellbeing: Some("High".into()),
            mental_wellbeing: Some("Medium".into()),
            creativity: Some("High".into()),
            critical_thinking: Some("High".into()),
            communication: Some("Medium".into()),
            problem_solving: Some("Medium".into()),
            collaboration: Some("Low".into()),
            participation_in_activities: Some("High".into()),
            attitude_and_values: Some("Medium".into()),
            presentation_skill: Some("Low".into()),
            writing_skill: Some("High".into()),
            comprehension_skill: Some("Medium".into()),
            talent_level: Some("Highly Talented".into()),
        }
    }

    fn detail(name: &str, physical: &str) -> AssessmentDetail {
        AssessmentDetail {
            assessment_name: name.to_string(),
            anecdotal: Some(AnecdotalRecord {
                date: "2024-11-02".into(),
                observation: format!("noted during {}", name),
            }),
            co_curricular: CoCurricularRating {
                physical_activity: Some(physical.to_string()),
                participation: Some("Mountain".into()),
                culture: Some("Stream".into()),
                hygiene: Some("Sky".into()),
                awareness: Some("Sky".into()),
                discipline: Some("Mountain".into()),
                attendance: Some("Sky".into()),
            },
        }
    }

    #[test]
    fn profile_has_nine_dimensions_in_fixed_order() {
        let profile = aggregate_profile(&RecordBundle::default());
        let labels: Vec<&str> = profile.dimensions.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, DIMENSION_LABELS);
    }

    #[test]
    fn empty_bundle_degrades_to_zero_dimensions() {
        let profile = aggregate_profile(&RecordBundle::default());
        assert!(profile.dimensions.iter().all(|d| d.value == 0.0));
        // Every dimension sits below the advisory threshold.
        assert_eq!(profile.impressions.len(), DIMENSION_COUNT);
    }

    #[test]
    fn aggregate_profile_is_idempotent() {
        let bundle = RecordBundle {
            marks: vec![Mark {
                student_id: "s1".into(),
                exam_id: 1,
                subject: "Hindi".into(),
                fa1: Some(4.0),
                fa4: Some(5.0),
                ..Default::default()
            }],
            behavioral: Some(full_behavioral()),
            details: vec![detail("FA1", "Sky")],
        };
        assert_eq!(aggregate_profile(&bundle), aggregate_profile(&bundle));
    }

    #[test]
    fn health_is_mean_of_physical_and_mental() {
        let bundle = RecordBundle {
            behavioral: Some(BehavioralRating {
                physical_wellbeing: Some("High".into()),
                mental_wellbeing: Some("Medium".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let profile = aggregate_profile(&bundle);
        assert_eq!(profile.dimensions[0].value, 75.0);
    }

    #[test]
    fn skills_mean_keeps_fixed_denominator_of_five() {
        let bundle = RecordBundle {
            behavioral: Some(BehavioralRating {
                creativity: Some("High".into()),
                critical_thinking: Some("High".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let profile = aggregate_profile(&bundle);
        // (90 + 90 + 0 + 0 + 0) / 5, unset skills are not excluded.
        assert_eq!(profile.dimensions[1].value, 36.0);
    }

    #[test]
    fn co_curricular_percent_uses_category_maxima() {
        let rating = CoCurricularRating {
            physical_activity: Some("Sky".into()),
            participation: Some("Sky".into()),
            culture: Some("Sky".into()),
            hygiene: Some("Sky".into()),
            awareness: Some("Sky".into()),
            discipline: Some("Sky".into()),
            attendance: Some("Sky".into()),
        };
        assert_eq!(co_curricular_percent(Some(&rating)), 100.0);
        assert_eq!(co_curricular_percent(None), 0.0);
    }

    #[test]
    fn advisories_trigger_strictly_below_threshold() {
        let bundle = RecordBundle {
            behavioral: Some(BehavioralRating {
                participation_in_activities: Some("Medium".into()),
                presentation_skill: Some("Low".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let profile = aggregate_profile(&bundle);
        // Participation = 60 stays clear; Presentation = 30 triggers.
        assert!(!profile
            .impressions
            .iter()
            .any(|s| s.contains("classroom and school activities")));
        assert!(profile
            .impressions
            .iter()
            .any(|s| s.contains("presentation skills")));
    }

    #[test]
    fn highly_talented_commendation_comes_last() {
        let bundle = RecordBundle {
            behavioral: Some(full_behavioral()),
            ..Default::default()
        };
        let profile = aggregate_profile(&bundle);
        assert_eq!(
            profile.impressions.last().map(String::as_str),
            Some(TALENT_COMMENDATION)
        );
    }

    #[test]
    fn latest_detail_uses_plain_string_ordering() {
        let details = vec![detail("F10", "Sky"), detail("F2", "Stream")];
        // "F2" > "F10" lexicographically, so F2 wins even though 10 > 2.
        assert_eq!(
            latest_detail(&details).map(|d| d.assessment_name.as_str()),
            Some("F2")
        );
    }
}
