use serde::{Deserialize, Serialize};

/// One per-exam mark entry for a single subject. All eight numeric fields are
/// optional: forms submit sparse updates and an absent field means "no data",
/// which downstream tabulation must keep distinct from a recorded zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub student_id: String,
    pub exam_id: i64,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa4: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fa6: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_curricular: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summative: Option<f64>,
}

impl Mark {
    pub fn formative_fields(&self) -> [Option<f64>; 6] {
        [self.fa1, self.fa2, self.fa3, self.fa4, self.fa5, self.fa6]
    }

    /// Sum of the formative components that are present.
    pub fn formative_total(&self) -> f64 {
        self.formative_fields().iter().flatten().sum()
    }

    /// Sum of every numeric field that is present.
    pub fn total(&self) -> f64 {
        self.formative_total()
            + self.co_curricular.unwrap_or(0.0)
            + self.summative.unwrap_or(0.0)
    }

    /// Additive merge: each field present on `other` is added onto this
    /// record's field (absent accumulator counts as 0). Fields absent on both
    /// sides stay absent.
    pub fn merge_add(&mut self, other: &Mark) {
        fn add(acc: &mut Option<f64>, v: Option<f64>) {
            if let Some(v) = v {
                *acc = Some(acc.unwrap_or(0.0) + v);
            }
        }
        add(&mut self.fa1, other.fa1);
        add(&mut self.fa2, other.fa2);
        add(&mut self.fa3, other.fa3);
        add(&mut self.fa4, other.fa4);
        add(&mut self.fa5, other.fa5);
        add(&mut self.fa6, other.fa6);
        add(&mut self.co_curricular, other.co_curricular);
        add(&mut self.summative, other.summative);
    }
}

/// Per-session qualitative ratings captured by the SBA form. One record per
/// (student, session); every category holds a label from the fixed ordinal
/// vocabulary or is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralRating {
    pub physical_wellbeing: Option<String>,
    pub mental_wellbeing: Option<String>,
    pub creativity: Option<String>,
    pub critical_thinking: Option<String>,
    pub communication: Option<String>,
    pub problem_solving: Option<String>,
    pub collaboration: Option<String>,
    pub participation_in_activities: Option<String>,
    pub attitude_and_values: Option<String>,
    pub presentation_skill: Option<String>,
    pub writing_skill: Option<String>,
    pub comprehension_skill: Option<String>,
    pub talent_level: Option<String>,
}

/// Co-curricular proficiency labels. The first three categories are rated out
/// of 4, the rest out of 2; `weighted()` pairs each label with its maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoCurricularRating {
    pub physical_activity: Option<String>,
    pub participation: Option<String>,
    pub culture: Option<String>,
    pub hygiene: Option<String>,
    pub awareness: Option<String>,
    pub discipline: Option<String>,
    pub attendance: Option<String>,
}

impl CoCurricularRating {
    pub fn weighted(&self) -> [(Option<&str>, u32); 7] {
        [
            (self.physical_activity.as_deref(), 4),
            (self.participation.as_deref(), 4),
            (self.culture.as_deref(), 4),
            (self.hygiene.as_deref(), 2),
            (self.awareness.as_deref(), 2),
            (self.discipline.as_deref(), 2),
            (self.attendance.as_deref(), 2),
        ]
    }
}

/// Free-text observation attached to a detailed assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnecdotalRecord {
    pub date: String,
    pub observation: String,
}

/// One detailed-assessment record: co-curricular proficiency labels plus an
/// optional anecdotal note, keyed by the assessment's display name within a
/// session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    pub assessment_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anecdotal: Option<AnecdotalRecord>,
    #[serde(flatten)]
    pub co_curricular: CoCurricularRating,
}

/// One student's class placement inside a session. Placements are append-only
/// across sessions: promotion writes new rows into the target session and
/// never rewrites the source session's rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub student_id: String,
    pub session: String,
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<i64>,
}
