use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

fn label(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn require_student_session<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<(&'a rusqlite::Connection, String, String), serde_json::Value> {
    let Some(conn) = state.db.as_ref() else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing studentId", None));
    };
    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing session", None));
    };
    match helpers::student_exists(conn, student_id) {
        Ok(true) => {}
        Ok(false) => return Err(err(&req.id, "not_found", "student not found", None)),
        Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
    }
    match helpers::session_exists(conn, session) {
        Ok(true) => {}
        Ok(false) => return Err(err(&req.id, "not_found", "session not found", None)),
        Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
    }
    Ok((conn, student_id.to_string(), session.to_string()))
}

fn handle_behavioral_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, student_id, session) = match require_student_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match helpers::load_behavioral(conn, &student_id, &session) {
        Ok(Some(rating)) => match serde_json::to_value(&rating) {
            Ok(v) => ok(&req.id, json!({ "rating": v })),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Ok(None) => ok(&req.id, json!({ "rating": null })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_behavioral_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, student_id, session) = match require_student_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let p = &req.params;
    let updated_at = chrono::Utc::now().to_rfc3339();
    // The SBA form saves the whole record each time; a full replace keeps
    // cleared categories cleared.
    let result = conn.execute(
        "INSERT OR REPLACE INTO behavioral_ratings(
            student_id, session,
            physical_wellbeing, mental_wellbeing, creativity, critical_thinking,
            communication, problem_solving, collaboration, participation_in_activities,
            attitude_and_values, presentation_skill, writing_skill, comprehension_skill,
            talent_level, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &student_id,
            &session,
            label(p, "physicalWellbeing"),
            label(p, "mentalWellbeing"),
            label(p, "creativity"),
            label(p, "criticalThinking"),
            label(p, "communication"),
            label(p, "problemSolving"),
            label(p, "collaboration"),
            label(p, "participationInActivities"),
            label(p, "attitudeAndValues"),
            label(p, "presentationSkill"),
            label(p, "writingSkill"),
            label(p, "comprehensionSkill"),
            label(p, "talentLevel"),
            &updated_at,
        ],
    );
    if let Err(e) = result {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "behavioral_ratings" })),
        );
    }

    ok(&req.id, json!({ "studentId": student_id, "session": session }))
}

fn handle_details_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, student_id, session) = match require_student_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match helpers::load_details(conn, &student_id, &session) {
        Ok(details) => match serde_json::to_value(&details) {
            Ok(v) => ok(&req.id, json!({ "details": v })),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_details_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, student_id, session) = match require_student_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let assessment_name = match req.params.get("assessmentName").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "assessmentName must not be empty",
                None,
            )
        }
    };

    let anecdotal = req.params.get("anecdotal").and_then(|v| v.as_object());
    let anecdotal_date = anecdotal
        .and_then(|o| o.get("date"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let anecdotal_observation = anecdotal
        .and_then(|o| o.get("observation"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let existing: Option<String> = match conn
        .query_row(
            "SELECT id FROM assessment_details
             WHERE student_id = ? AND session = ? AND assessment_name = ?",
            (&student_id, &session, &assessment_name),
            |r| r.get(0),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let p = &req.params;
    let row_id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());
    let result = conn.execute(
        "INSERT OR REPLACE INTO assessment_details(
            id, student_id, session, assessment_name,
            anecdotal_date, anecdotal_observation,
            physical_activity, participation, culture, hygiene,
            awareness, discipline, attendance)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &row_id,
            &student_id,
            &session,
            &assessment_name,
            &anecdotal_date,
            &anecdotal_observation,
            label(p, "physicalActivity"),
            label(p, "participation"),
            label(p, "culture"),
            label(p, "hygiene"),
            label(p, "awareness"),
            label(p, "discipline"),
            label(p, "attendance"),
        ],
    );
    if let Err(e) = result {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "assessment_details" })),
        );
    }

    ok(
        &req.id,
        json!({ "detailId": row_id, "assessmentName": assessment_name }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ratings.behavioral.get" => Some(handle_behavioral_get(state, req)),
        "ratings.behavioral.save" => Some(handle_behavioral_save(state, req)),
        "ratings.details.list" => Some(handle_details_list(state, req)),
        "ratings.details.save" => Some(handle_details_save(state, req)),
        _ => None,
    }
}
