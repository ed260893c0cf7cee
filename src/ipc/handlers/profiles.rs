use crate::aggregate::{aggregate_profile, RecordBundle};
use crate::error::CoreError;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_profiles_aggregate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(session) = req.params.get("session").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing session", None);
    };

    match helpers::student_exists(conn, student_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    // A malformed record degrades this one student to zero-valued dimensions
    // instead of failing the request; the fault is reported alongside the
    // profile so the caller can surface it.
    let (bundle, integrity_fault) = match helpers::load_bundle(conn, student_id, session) {
        Ok(b) => (b, None),
        Err(e) if helpers::is_integrity_error(&e) => {
            let fault = CoreError::DataIntegrity(format!(
                "malformed records for student {}: {}",
                student_id, e
            ));
            (RecordBundle::default(), Some(fault))
        }
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let profile = aggregate_profile(&bundle);
    let payload = match serde_json::to_value(&profile) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };

    let mut result = json!({
        "studentId": student_id,
        "session": session,
        "profile": payload,
    });
    if let Some(fault) = integrity_fault {
        result["degraded"] = json!({
            "code": fault.code(),
            "message": fault.to_string(),
        });
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profiles.aggregate" => Some(handle_profiles_aggregate(state, req)),
        _ => None,
    }
}
