use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_placements_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "placements": [] }));
    };

    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };
    let class_filter = req
        .params
        .get("className")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let mut sql = String::from(
        "SELECT p.student_id, s.name, p.class_name, p.section, p.roll_no
         FROM placements p
         JOIN students s ON s.id = p.student_id
         WHERE p.session = ?",
    );
    if class_filter.is_some() {
        sql.push_str(" AND p.class_name = ?");
    }
    sql.push_str(" ORDER BY p.class_name, p.roll_no, s.name");

    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<serde_json::Value> {
        Ok(json!({
            "studentId": row.get::<_, String>(0)?,
            "name": row.get::<_, String>(1)?,
            "className": row.get::<_, String>(2)?,
            "section": row.get::<_, Option<String>>(3)?,
            "rollNo": row.get::<_, Option<i64>>(4)?,
        }))
    };
    let rows = match &class_filter {
        Some(class_name) => stmt
            .query_map((session, class_name), map_row)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>()),
        None => stmt
            .query_map([session], map_row)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>()),
    };

    match rows {
        Ok(placements) => ok(&req.id, json!({ "placements": placements })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_placements_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };
    let class_name = match req.params.get("className").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "className must not be empty", None),
    };
    let section = req
        .params
        .get("section")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let roll_no = req.params.get("rollNo").and_then(|v| v.as_i64());

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

    if let Err(e) = conn.execute(
        "INSERT INTO placements(student_id, session, class_name, section, roll_no)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(student_id, session)
         DO UPDATE SET class_name = excluded.class_name,
                       section = excluded.section,
                       roll_no = excluded.roll_no",
        (student_id, session, &class_name, &section, &roll_no),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "placements" })),
        );
    }

    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "session": session,
            "className": class_name,
            "section": section,
            "rollNo": roll_no,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "placements.list" => Some(handle_placements_list(state, req)),
        "placements.save" => Some(handle_placements_save(state, req)),
        _ => None,
    }
}
