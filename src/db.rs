use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("schoolrec.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            father_name TEXT,
            mother_name TEXT,
            category TEXT,
            admission_no TEXT,
            contact TEXT,
            created_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            name TEXT PRIMARY KEY,
            created_at TEXT
        )",
        [],
    )?;

    // Placement rows are append-only across sessions: promotion inserts into
    // the target session and never rewrites the source session's rows.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS placements(
            student_id TEXT NOT NULL,
            session TEXT NOT NULL,
            class_name TEXT NOT NULL,
            section TEXT,
            roll_no INTEGER,
            PRIMARY KEY(student_id, session),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(session) REFERENCES sessions(name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_placements_session ON placements(session)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_placements_session_class ON placements(session, class_name)",
        [],
    )?;

    // All eight numeric columns are nullable on purpose: NULL means "no
    // data", which tabulation keeps distinct from a recorded zero.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS marks(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            session TEXT NOT NULL,
            exam_id INTEGER NOT NULL,
            subject TEXT NOT NULL,
            fa1 REAL,
            fa2 REAL,
            fa3 REAL,
            fa4 REAL,
            fa5 REAL,
            fa6 REAL,
            co_curricular REAL,
            summative REAL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(session) REFERENCES sessions(name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_student_session ON marks(student_id, session)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_session ON marks(session)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS behavioral_ratings(
            student_id TEXT NOT NULL,
            session TEXT NOT NULL,
            physical_wellbeing TEXT,
            mental_wellbeing TEXT,
            creativity TEXT,
            critical_thinking TEXT,
            communication TEXT,
            problem_solving TEXT,
            collaboration TEXT,
            participation_in_activities TEXT,
            attitude_and_values TEXT,
            presentation_skill TEXT,
            writing_skill TEXT,
            comprehension_skill TEXT,
            talent_level TEXT,
            updated_at TEXT,
            PRIMARY KEY(student_id, session),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(session) REFERENCES sessions(name)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assessment_details(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            session TEXT NOT NULL,
            assessment_name TEXT NOT NULL,
            anecdotal_date TEXT,
            anecdotal_observation TEXT,
            physical_activity TEXT,
            participation TEXT,
            culture TEXT,
            hygiene TEXT,
            awareness TEXT,
            discipline TEXT,
            attendance TEXT,
            UNIQUE(student_id, session, assessment_name),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(session) REFERENCES sessions(name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assessment_details_student_session
         ON assessment_details(student_id, session)",
        [],
    )?;

    Ok(conn)
}

pub fn session_names(conn: &Connection) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sessions ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
