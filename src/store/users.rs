use crate::model::{Role, User};
use rusqlite::{Connection, OptionalExtension, Row};

fn from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = r.get(2)?;
    Ok(User {
        id: r.get(0)?,
        username: r.get(1)?,
        role: Role::parse(&role).unwrap_or(Role::Teacher),
    })
}

pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users(username, password_hash, role) VALUES(?, ?, ?)",
        (username, password_hash, role.as_str()),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, role FROM users WHERE id = ?",
        [id],
        from_row,
    )
    .optional()
}

/// The user together with their stored password hash.
pub fn find_credentials(conn: &Connection, username: &str) -> rusqlite::Result<Option<(User, String)>> {
    conn.query_row(
        "SELECT id, username, role, password_hash FROM users WHERE username = ?",
        [username],
        |r| Ok((from_row(r)?, r.get(3)?)),
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, username, role FROM users ORDER BY id")?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn set_password_hash(conn: &Connection, id: i64, password_hash: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE users SET password_hash = ? WHERE id = ?",
        (password_hash, id),
    )
}

pub fn delete_user(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM users WHERE id = ?", [id])
}

pub fn count_admins(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?",
        [Role::Admin.as_str()],
        |r| r.get(0),
    )
}
