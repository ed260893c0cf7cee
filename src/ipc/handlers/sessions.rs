use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::promote::{apply_promotion, plan_promotion, PromotionOutcome};
use crate::records::Placement;
use serde_json::json;

fn handle_sessions_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "sessions": [] }));
    };

    let mut stmt = match conn.prepare(
        "SELECT
           s.name,
           (SELECT COUNT(*) FROM placements p WHERE p.session = s.name) AS student_count
         FROM sessions s
         ORDER BY s.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt
        .query_map([], |row| {
            Ok(json!({
                "name": row.get::<_, String>(0)?,
                "studentCount": row.get::<_, i64>(1)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(sessions) => ok(&req.id, json!({ "sessions": sessions })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_sessions_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    let known = match db::session_names(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if known.iter().any(|s| *s == name) {
        return err(
            &req.id,
            "validation_failed",
            format!("session '{}' already exists", name),
            None,
        );
    }

    if let Err(e) = conn.execute(
        "INSERT INTO sessions(name, created_at) VALUES(?, ?)",
        (&name, chrono::Utc::now().to_rfc3339()),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "sessions" })),
        );
    }

    ok(&req.id, json!({ "name": name }))
}

fn handle_sessions_promote(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(source) = req.params.get("sourceSession").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing sourceSession", None);
    };
    let Some(target) = req.params.get("targetSession").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing targetSession", None);
    };

    let known = match db::session_names(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut stmt = match conn.prepare(
        "SELECT student_id, session, class_name, section, roll_no
         FROM placements
         WHERE session = ?
         ORDER BY student_id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let source_placements = stmt
        .query_map([source], |row| {
            Ok(Placement {
                student_id: row.get(0)?,
                session: row.get(1)?,
                class_name: row.get(2)?,
                section: row.get(3)?,
                roll_no: row.get(4)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());
    let source_placements = match source_placements {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    // All rows are staged before any write; the transaction below is the
    // only point that touches storage.
    let plan = match plan_promotion(source, target, &known, &source_placements) {
        Ok(p) => p,
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };
    if let Err(e) = apply_promotion(conn, &plan) {
        return err(&req.id, e.code(), e.to_string(), None);
    }

    let outcome = PromotionOutcome {
        promoted_count: plan.promoted_count(),
        graduated_count: plan.graduated_count,
    };
    match serde_json::to_value(outcome) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sessions.list" => Some(handle_sessions_list(state, req)),
        "sessions.create" => Some(handle_sessions_create(state, req)),
        "sessions.promote" => Some(handle_sessions_promote(state, req)),
        _ => None,
    }
}
