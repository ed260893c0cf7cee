use rusqlite::Connection;
use serde::Serialize;

use crate::error::CoreError;
use crate::records::Placement;

/// Students finishing this class graduate instead of being promoted.
pub const TERMINAL_CLASS: &str = "8th";

/// Next class label for a promoted student, or `None` for a graduate.
///
/// Pre-primary classes move through a fixed chain ending at the first
/// numbered class; numbered classes advance by one with the ordinal suffix
/// recomputed. Labels the school has never used for a promotable class pass
/// through unchanged rather than failing the whole cohort.
pub fn promote_class(class_name: &str) -> Option<String> {
    let name = class_name.trim();
    if name == TERMINAL_CLASS {
        return None;
    }
    match name {
        "PP1" => return Some("PP2".to_string()),
        "PP2" => return Some("Balvatika".to_string()),
        "Balvatika" => return Some("1st".to_string()),
        _ => {}
    }

    let digits: String = name.chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<u32>() {
        Ok(n) => Some(ordinal(n + 1)),
        Err(_) => Some(name.to_string()),
    }
}

/// Standard English ordinal: 1st, 2nd, 3rd, 4th, with the x11/x12/x13
/// exception band taking "th" in every decade.
fn ordinal(n: u32) -> String {
    let suffix = match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{}{}", n, suffix)
}

/// Fully staged unit of work for one promotion: the session marker plus every
/// placement row to insert, computed before any I/O happens.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionPlan {
    pub source_session: String,
    pub target_session: String,
    pub placements: Vec<Placement>,
    pub graduated_count: usize,
}

impl PromotionPlan {
    pub fn promoted_count(&self) -> usize {
        self.placements.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionOutcome {
    pub promoted_count: usize,
    pub graduated_count: usize,
}

/// Computes the promotion unit of work. Pure: validates the target name
/// against the known session list, requires a non-empty source cohort, and
/// maps every placement row, without touching storage.
pub fn plan_promotion(
    source_session: &str,
    target_session: &str,
    known_sessions: &[String],
    source_placements: &[Placement],
) -> Result<PromotionPlan, CoreError> {
    let target = target_session.trim();
    if target.is_empty() {
        return Err(CoreError::Validation(
            "target session name must not be blank".to_string(),
        ));
    }
    if known_sessions.iter().any(|s| s == target) {
        return Err(CoreError::Validation(format!(
            "session '{}' already exists",
            target
        )));
    }
    if source_placements.is_empty() {
        return Err(CoreError::Validation(format!(
            "session '{}' has no placement records",
            source_session
        )));
    }

    let mut placements: Vec<Placement> = Vec::with_capacity(source_placements.len());
    let mut graduated_count = 0_usize;
    for p in source_placements {
        match promote_class(&p.class_name) {
            Some(next_class) => placements.push(Placement {
                student_id: p.student_id.clone(),
                session: target.to_string(),
                class_name: next_class,
                section: p.section.clone(),
                roll_no: p.roll_no,
            }),
            None => graduated_count += 1,
        }
    }

    Ok(PromotionPlan {
        source_session: source_session.to_string(),
        target_session: target.to_string(),
        placements,
        graduated_count,
    })
}

/// Writes a staged plan in one transaction: the session marker row plus the
/// bulk insert of every new placement commit together or not at all. Source
/// session rows are never touched, so a failed apply leaves the cohort fully
/// intact. The sessions primary key backstops the duplicate-name check made
/// at planning time.
pub fn apply_promotion(conn: &Connection, plan: &PromotionPlan) -> Result<(), CoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO sessions(name, created_at) VALUES(?, ?)",
        (&plan.target_session, chrono::Utc::now().to_rfc3339()),
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO placements(student_id, session, class_name, section, roll_no)
             VALUES(?, ?, ?, ?, ?)",
        )?;
        for p in &plan.placements {
            stmt.execute((
                &p.student_id,
                &p.session,
                &p.class_name,
                &p.section,
                &p.roll_no,
            ))?;
        }
    }
    tx.commit()?;
    Ok(())
}
