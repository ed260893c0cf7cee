use rusqlite::{Connection, OptionalExtension, Row};

use crate::aggregate::RecordBundle;
use crate::records::{AnecdotalRecord, AssessmentDetail, BehavioralRating, CoCurricularRating, Mark};

/// Conversion failures mean a stored record no longer matches the expected
/// shape. Callers degrade that student instead of failing the whole request.
pub fn is_integrity_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::InvalidColumnType(_, _, _)
            | rusqlite::Error::FromSqlConversionFailure(_, _, _)
            | rusqlite::Error::IntegralValueOutOfRange(_, _)
    )
}

pub const MARK_COLUMNS: &str =
    "student_id, exam_id, subject, fa1, fa2, fa3, fa4, fa5, fa6, co_curricular, summative";

pub fn mark_from_row(row: &Row<'_>) -> rusqlite::Result<Mark> {
    Ok(Mark {
        student_id: row.get(0)?,
        exam_id: row.get(1)?,
        subject: row.get(2)?,
        fa1: row.get(3)?,
        fa2: row.get(4)?,
        fa3: row.get(5)?,
        fa4: row.get(6)?,
        fa5: row.get(7)?,
        fa6: row.get(8)?,
        co_curricular: row.get(9)?,
        summative: row.get(10)?,
    })
}

pub fn load_marks(
    conn: &Connection,
    student_id: &str,
    session: &str,
) -> rusqlite::Result<Vec<Mark>> {
    let sql = format!(
        "SELECT {} FROM marks WHERE student_id = ? AND session = ? ORDER BY exam_id, subject",
        MARK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map((student_id, session), mark_from_row)?;
    rows.collect()
}

pub fn load_behavioral(
    conn: &Connection,
    student_id: &str,
    session: &str,
) -> rusqlite::Result<Option<BehavioralRating>> {
    conn.query_row(
        "SELECT physical_wellbeing, mental_wellbeing, creativity, critical_thinking,
                communication, problem_solving, collaboration, participation_in_activities,
                attitude_and_values, presentation_skill, writing_skill, comprehension_skill,
                talent_level
         FROM behavioral_ratings
         WHERE student_id = ? AND session = ?",
        (student_id, session),
        |r| {
            Ok(BehavioralRating {
                physical_wellbeing: r.get(0)?,
                mental_wellbeing: r.get(1)?,
                creativity: r.get(2)?,
                critical_thinking: r.get(3)?,
                communication: r.get(4)?,
                problem_solving: r.get(5)?,
                collaboration: r.get(6)?,
                participation_in_activities: r.get(7)?,
                attitude_and_values: r.get(8)?,
                presentation_skill: r.get(9)?,
                writing_skill: r.get(10)?,
                comprehension_skill: r.get(11)?,
                talent_level: r.get(12)?,
            })
        },
    )
    .optional()
}

pub fn load_details(
    conn: &Connection,
    student_id: &str,
    session: &str,
) -> rusqlite::Result<Vec<AssessmentDetail>> {
    let mut stmt = conn.prepare(
        "SELECT assessment_name, anecdotal_date, anecdotal_observation,
                physical_activity, participation, culture, hygiene,
                awareness, discipline, attendance
         FROM assessment_details
         WHERE student_id = ? AND session = ?
         ORDER BY assessment_name",
    )?;
    let rows = stmt.query_map((student_id, session), |r| {
        let date: Option<String> = r.get(1)?;
        let observation: Option<String> = r.get(2)?;
        let anecdotal = observation.map(|observation| AnecdotalRecord {
            date: date.unwrap_or_default(),
            observation,
        });
        Ok(AssessmentDetail {
            assessment_name: r.get(0)?,
            anecdotal,
            co_curricular: CoCurricularRating {
                physical_activity: r.get(3)?,
                participation: r.get(4)?,
                culture: r.get(5)?,
                hygiene: r.get(6)?,
                awareness: r.get(7)?,
                discipline: r.get(8)?,
                attendance: r.get(9)?,
            },
        })
    })?;
    rows.collect()
}

/// Everything the aggregation engine needs for one student in one session.
pub fn load_bundle(
    conn: &Connection,
    student_id: &str,
    session: &str,
) -> rusqlite::Result<RecordBundle> {
    Ok(RecordBundle {
        marks: load_marks(conn, student_id, session)?,
        behavioral: load_behavioral(conn, student_id, session)?,
        details: load_details(conn, student_id, session)?,
    })
}

pub fn student_exists(conn: &Connection, student_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn session_exists(conn: &Connection, session: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM sessions WHERE name = ?", [session], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}
