use crate::consolidate::{consolidate_marks, letter_grade, SUBJECT_MAX};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Class-wide cumulative tabulation: per-exam marks collapsed to one record
/// per subject for every student in the class, with grand total and a
/// render-time letter grade.
fn handle_reports_consolidated(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };
    let Some(class_name) = req.params.get("className").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing className", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT p.student_id, s.name, p.roll_no
         FROM placements p
         JOIN students s ON s.id = p.student_id
         WHERE p.session = ? AND p.class_name = ?
         ORDER BY p.roll_no, s.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let roster: Result<Vec<(String, String, Option<i64>)>, _> = stmt
        .query_map((session, class_name), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .and_then(|it| it.collect());
    let roster = match roster {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut students = Vec::with_capacity(roster.len());
    for (student_id, name, roll_no) in roster {
        // One student's malformed marks never block the rest of the class:
        // that row degrades to an empty tabulation.
        let (raw_marks, degraded) = match helpers::load_marks(conn, &student_id, session) {
            Ok(v) => (v, false),
            Err(e) if helpers::is_integrity_error(&e) => (Vec::new(), true),
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };

        let consolidated = consolidate_marks(&raw_marks);
        let mut subjects = Vec::with_capacity(consolidated.len());
        let mut grand_total = 0.0_f64;
        for mark in consolidated.values() {
            let total = mark.total();
            grand_total += total;
            let mut row = match serde_json::to_value(mark) {
                Ok(v) => v,
                Err(e) => return err(&req.id, "internal", e.to_string(), None),
            };
            row["total"] = json!(total);
            subjects.push(row);
        }

        let max_marks = consolidated.len() as f64 * SUBJECT_MAX;
        let percent = if max_marks > 0.0 {
            100.0 * grand_total / max_marks
        } else {
            0.0
        };
        let grade = letter_grade(grand_total, max_marks);

        students.push(json!({
            "studentId": student_id,
            "name": name,
            "rollNo": roll_no,
            "subjects": subjects,
            "grandTotal": grand_total,
            "maxMarks": max_marks,
            "percent": percent,
            "grade": grade.as_str(),
            "degraded": degraded,
        }));
    }

    ok(
        &req.id,
        json!({
            "session": session,
            "className": class_name,
            "students": students,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.consolidated" => Some(handle_reports_consolidated(state, req)),
        _ => None,
    }
}
