use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::records::Mark;
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

const NUMERIC_KEYS: [&str; 8] = [
    "fa1",
    "fa2",
    "fa3",
    "fa4",
    "fa5",
    "fa6",
    "coCurricular",
    "summative",
];

/// Sparse-update semantics for one numeric field: absent keys keep the stored
/// value, explicit null clears it, a number replaces it.
enum FieldPatch {
    Keep,
    Clear,
    Set(f64),
}

impl FieldPatch {
    fn apply(&self, current: Option<f64>) -> Option<f64> {
        match self {
            FieldPatch::Keep => current,
            FieldPatch::Clear => None,
            FieldPatch::Set(v) => Some(*v),
        }
    }
}

fn parse_patch(params: &serde_json::Value, key: &str) -> Result<FieldPatch, String> {
    match params.get(key) {
        None => Ok(FieldPatch::Keep),
        Some(v) if v.is_null() => Ok(FieldPatch::Clear),
        Some(v) => {
            let Some(n) = v.as_f64() else {
                return Err(format!("{} must be a number or null", key));
            };
            if n < 0.0 {
                return Err(format!("{} must not be negative", key));
            }
            Ok(FieldPatch::Set(n))
        }
    }
}

fn handle_marks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "marks": [] }));
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };

    let marks = match helpers::load_marks(conn, student_id, session) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match serde_json::to_value(&marks) {
        Ok(v) => ok(&req.id, json!({ "marks": v })),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

fn handle_marks_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };
    let Some(exam_id) = req.params.get("examId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing examId", None);
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "subject must not be empty", None),
    };

    let mut patches = Vec::with_capacity(NUMERIC_KEYS.len());
    for key in NUMERIC_KEYS {
        match parse_patch(&req.params, key) {
            Ok(p) => patches.push(p),
            Err(msg) => return err(&req.id, "bad_params", msg, None),
        }
    }

    match helpers::student_exists(conn, student_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }
    match helpers::session_exists(conn, session) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "session not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    // A markId updates that row in place; without one a fresh entry is
    // inserted, so repeated grading passes for the same exam accumulate at
    // consolidation time instead of overwriting each other.
    let mark_id = req
        .params
        .get("markId")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let existing: Option<(String, Mark)> = match &mark_id {
        Some(id) => {
            let sql = format!(
                "SELECT {} FROM marks WHERE id = ? AND student_id = ? AND session = ?",
                helpers::MARK_COLUMNS
            );
            match conn
                .query_row(&sql, (id, student_id, session), helpers::mark_from_row)
                .optional()
            {
                Ok(Some(m)) => Some((id.clone(), m)),
                Ok(None) => return err(&req.id, "not_found", "mark record not found", None),
                Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
            }
        }
        None => None,
    };

    let (row_id, base) = match existing {
        Some((id, m)) => (id, m),
        None => (
            Uuid::new_v4().to_string(),
            Mark {
                student_id: student_id.to_string(),
                exam_id,
                subject: subject.clone(),
                ..Default::default()
            },
        ),
    };

    let fields: Vec<Option<f64>> = [
        base.fa1,
        base.fa2,
        base.fa3,
        base.fa4,
        base.fa5,
        base.fa6,
        base.co_curricular,
        base.summative,
    ]
    .iter()
    .zip(&patches)
    .map(|(current, patch)| patch.apply(*current))
    .collect();

    let result = if mark_id.is_some() {
        conn.execute(
            "UPDATE marks
             SET exam_id = ?, subject = ?, fa1 = ?, fa2 = ?, fa3 = ?, fa4 = ?, fa5 = ?, fa6 = ?,
                 co_curricular = ?, summative = ?
             WHERE id = ?",
            (
                exam_id, &subject, fields[0], fields[1], fields[2], fields[3], fields[4],
                fields[5], fields[6], fields[7], &row_id,
            ),
        )
    } else {
        conn.execute(
            "INSERT INTO marks(id, student_id, session, exam_id, subject,
                               fa1, fa2, fa3, fa4, fa5, fa6, co_curricular, summative)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &row_id, student_id, session, exam_id, &subject, fields[0], fields[1],
                fields[2], fields[3], fields[4], fields[5], fields[6], fields[7],
            ),
        )
    };
    if let Err(e) = result {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "marks" })),
        );
    }

    ok(
        &req.id,
        json!({ "markId": row_id, "examId": exam_id, "subject": subject }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.list" => Some(handle_marks_list(state, req)),
        "marks.upsert" => Some(handle_marks_upsert(state, req)),
        _ => None,
    }
}
