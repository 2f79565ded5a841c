use crate::auth;
use crate::model::Role;
use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

pub const DB_FILE_NAME: &str = "school.sqlite3";

/// Ordered schema steps. `PRAGMA user_version` holds how many have been
/// applied; new steps are appended, never edited.
const MIGRATIONS: &[&str] = &[
    // v1: base tables
    "CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS students(
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL DEFAULT '',
        dob TEXT NOT NULL DEFAULT '',
        admission_no TEXT NOT NULL UNIQUE,
        class_name TEXT NOT NULL DEFAULT '',
        section TEXT NOT NULL DEFAULT '',
        guardian_name TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS attendance(
        id INTEGER PRIMARY KEY,
        student_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        status TEXT NOT NULL,
        marked_by INTEGER,
        FOREIGN KEY(student_id) REFERENCES students(id)
    );
    CREATE TABLE IF NOT EXISTS fees(
        id INTEGER PRIMARY KEY,
        student_id INTEGER NOT NULL,
        description TEXT NOT NULL,
        amount REAL NOT NULL,
        due_date TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(student_id) REFERENCES students(id)
    );
    CREATE TABLE IF NOT EXISTS payments(
        id INTEGER PRIMARY KEY,
        fee_id INTEGER,
        student_id INTEGER NOT NULL,
        amount REAL NOT NULL,
        method TEXT NOT NULL,
        tx_ref TEXT NOT NULL DEFAULT '',
        paid_at TEXT NOT NULL,
        FOREIGN KEY(fee_id) REFERENCES fees(id),
        FOREIGN KEY(student_id) REFERENCES students(id)
    );
    CREATE TABLE IF NOT EXISTS exam_schedule(
        id INTEGER PRIMARY KEY,
        exam_title TEXT NOT NULL,
        class_name TEXT NOT NULL,
        subject TEXT NOT NULL,
        exam_date TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        room TEXT NOT NULL DEFAULT ''
    );",
    // v2: lookup indexes
    "CREATE INDEX IF NOT EXISTS idx_attendance_student_date ON attendance(student_id, date);
    CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
    CREATE INDEX IF NOT EXISTS idx_fees_student ON fees(student_id, status);
    CREATE INDEX IF NOT EXISTS idx_payments_student ON payments(student_id);
    CREATE INDEX IF NOT EXISTS idx_payments_fee ON payments(fee_id);
    CREATE INDEX IF NOT EXISTS idx_exam_schedule_date ON exam_schedule(exam_date, start_time);",
];

pub fn schema_version() -> i64 {
    MIGRATIONS.len() as i64
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    pub seed_sample_students: bool,
}

pub fn open_db(workspace: &Path, opts: InitOptions) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    initialize(&conn, opts)?;
    info!(path = %db_path.display(), "workspace database ready");
    Ok(conn)
}

/// Bring a connection up to the current schema and seed defaults. Safe to
/// call any number of times.
pub fn initialize(conn: &Connection, opts: InitOptions) -> anyhow::Result<()> {
    migrate(conn)?;
    seed_default_admin(conn)?;
    if opts.seed_sample_students {
        seed_sample_students(conn)?;
    }
    Ok(())
}

pub fn user_version(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    let current = user_version(conn)?;
    if current > schema_version() {
        anyhow::bail!(
            "database schema v{} is newer than this build supports (v{})",
            current,
            schema_version()
        );
    }
    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = idx as i64 + 1;
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("schema migration v{} failed", version))?;
        // PRAGMA does not accept bound parameters.
        tx.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        tx.commit()?;
        info!(version, "applied schema migration");
    }
    Ok(())
}

fn seed_default_admin(conn: &Connection) -> anyhow::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let hash = auth::hash_password("admin").context("failed to hash default password")?;
    conn.execute(
        "INSERT INTO users(username, password_hash, role) VALUES(?, ?, ?)",
        ("admin", hash, Role::Admin.as_str()),
    )?;
    info!("seeded default admin user");
    Ok(())
}

fn seed_sample_students(conn: &Connection) -> anyhow::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let now = crate::clock::now_timestamp();
    let sample = [
        ("Aisha", "Khan", "2012-05-11", "ADM001", "Grade 1", "A", "Mrs Khan", "9999999999"),
        ("Ravi", "Patel", "2011-09-20", "ADM002", "Grade 2", "B", "Mr Patel", "8888888888"),
        ("Maya", "Singh", "2010-03-05", "ADM003", "Grade 3", "A", "Mrs Singh", "7777777777"),
    ];
    let tx = conn.unchecked_transaction()?;
    for (first, last, dob, adm, class_name, section, guardian, phone) in sample {
        tx.execute(
            "INSERT INTO students(
               first_name, last_name, dob, admission_no, class_name,
               section, guardian_name, phone, created_at
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (first, last, dob, adm, class_name, section, guardian, phone, &now),
        )?;
    }
    tx.commit()?;
    debug!(count = sample.len(), "seeded sample students");
    Ok(())
}
