use serde_json::json;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoolrecd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoolrecd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn result_of(value: &serde_json::Value, method: &str) -> serde_json::Value {
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().expect("result")
}

fn error_code(value: &serde_json::Value) -> String {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
        .to_string()
}

struct Harness {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Harness {
    fn start(prefix: &str) -> Self {
        let workspace = temp_dir(prefix);
        let (child, stdin, reader) = spawn_sidecar();
        let mut h = Harness {
            child,
            stdin,
            reader,
            next_id: 0,
        };
        let v = h.call(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        result_of(&v, "workspace.select");
        h
    }

    fn call(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        request(&mut self.stdin, &mut self.reader, &id, method, params)
    }

    fn ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let v = self.call(method, params);
        result_of(&v, method)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn placements_by_student(h: &mut Harness, session: &str) -> BTreeMap<String, String> {
    let listed = h.ok("placements.list", json!({ "session": session }));
    listed
        .get("placements")
        .and_then(|v| v.as_array())
        .expect("placements array")
        .iter()
        .map(|p| {
            (
                p.get("studentId").and_then(|v| v.as_str()).unwrap().to_string(),
                p.get("className").and_then(|v| v.as_str()).unwrap().to_string(),
            )
        })
        .collect()
}

fn seed_cohort(h: &mut Harness, session: &str, classes: &[&str]) -> Vec<String> {
    h.ok("sessions.create", json!({ "name": session }));
    let mut ids = Vec::new();
    for (i, class_name) in classes.iter().enumerate() {
        let created = h.ok(
            "students.create",
            json!({ "name": format!("Student {}", i + 1) }),
        );
        let student_id = created
            .get("studentId")
            .and_then(|v| v.as_str())
            .expect("studentId")
            .to_string();
        h.ok(
            "placements.save",
            json!({
                "studentId": student_id,
                "session": session,
                "className": class_name,
                "section": "A",
                "rollNo": (i + 1) as i64
            }),
        );
        ids.push(student_id);
    }
    ids
}

#[test]
fn promotion_advances_cohort_and_graduates_terminal_class() {
    let mut h = Harness::start("schoolrec-promotion");
    let ids = seed_cohort(&mut h, "2024-25", &["Balvatika", "PP2", "PP1", "3rd", "8th"]);

    let outcome = h.ok(
        "sessions.promote",
        json!({ "sourceSession": "2024-25", "targetSession": "2025-26" }),
    );
    assert_eq!(outcome.get("promotedCount").and_then(|v| v.as_i64()), Some(4));
    assert_eq!(outcome.get("graduatedCount").and_then(|v| v.as_i64()), Some(1));

    let target = placements_by_student(&mut h, "2025-26");
    assert_eq!(target.len(), 4);
    assert_eq!(target.get(&ids[0]).map(String::as_str), Some("1st"));
    assert_eq!(target.get(&ids[1]).map(String::as_str), Some("Balvatika"));
    assert_eq!(target.get(&ids[2]).map(String::as_str), Some("PP2"));
    assert_eq!(target.get(&ids[3]).map(String::as_str), Some("4th"));
    // The terminal-class student graduated out of the new session.
    assert!(!target.contains_key(&ids[4]));

    // The source session is untouched: same five rows, same classes.
    let source = placements_by_student(&mut h, "2024-25");
    assert_eq!(source.len(), 5);
    assert_eq!(source.get(&ids[0]).map(String::as_str), Some("Balvatika"));
    assert_eq!(source.get(&ids[4]).map(String::as_str), Some("8th"));
}

#[test]
fn duplicate_target_session_is_rejected_without_side_effects() {
    let mut h = Harness::start("schoolrec-promotion-dup");
    seed_cohort(&mut h, "2024-25", &["3rd", "5th"]);

    h.ok(
        "sessions.promote",
        json!({ "sourceSession": "2024-25", "targetSession": "2025-26" }),
    );

    let second = h.call(
        "sessions.promote",
        json!({ "sourceSession": "2024-25", "targetSession": "2025-26" }),
    );
    assert_eq!(error_code(&second), "validation_failed");

    // Session list and target placements are unchanged after the rejection.
    let sessions = h.ok("sessions.list", json!({}));
    let names: Vec<&str> = sessions
        .get("sessions")
        .and_then(|v| v.as_array())
        .expect("sessions array")
        .iter()
        .map(|s| s.get("name").and_then(|v| v.as_str()).unwrap())
        .collect();
    assert_eq!(names, vec!["2024-25", "2025-26"]);

    let target = placements_by_student(&mut h, "2025-26");
    assert_eq!(target.len(), 2);
}

#[test]
fn blank_target_and_empty_source_are_validation_errors() {
    let mut h = Harness::start("schoolrec-promotion-invalid");
    seed_cohort(&mut h, "2024-25", &["3rd"]);

    let blank = h.call(
        "sessions.promote",
        json!({ "sourceSession": "2024-25", "targetSession": "   " }),
    );
    assert_eq!(error_code(&blank), "validation_failed");

    let empty_source = h.call(
        "sessions.promote",
        json!({ "sourceSession": "1999-00", "targetSession": "2025-26" }),
    );
    assert_eq!(error_code(&empty_source), "validation_failed");

    // Neither attempt created a session.
    let sessions = h.ok("sessions.list", json!({}));
    assert_eq!(
        sessions
            .get("sessions")
            .and_then(|v| v.as_array())
            .map(Vec::len),
        Some(1)
    );
}
