use crate::auth;
use crate::error::{map_unique, RecordError, RecordResult};
use crate::model::{Role, Session, User};
use crate::records::required;
use crate::store;
use rusqlite::Connection;
use tracing::{info, warn};
use uuid::Uuid;

fn hash(password: &str) -> RecordResult<String> {
    auth::hash_password(password)
        .map_err(|e| RecordError::validation(format!("password could not be hashed: {}", e)))
}

pub fn login(conn: &Connection, username: &str, password: &str) -> RecordResult<Session> {
    let username = username.trim();
    let found = store::users::find_credentials(conn, username)?;
    match found {
        Some((user, stored)) if auth::verify_password(password, &stored) => {
            info!(user_id = user.id, username = %user.username, "login");
            Ok(Session {
                id: Uuid::new_v4(),
                user_id: user.id,
                username: user.username,
                role: user.role,
            })
        }
        _ => {
            warn!(username, "login rejected");
            Err(RecordError::Unauthorized(
                "invalid username or password".to_string(),
            ))
        }
    }
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    role: Option<&str>,
) -> RecordResult<User> {
    let username = required(username, "username")?;
    if password.is_empty() {
        return Err(RecordError::validation("password is required"));
    }
    let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => Role::parse(r)
            .ok_or_else(|| RecordError::validation("role must be admin, teacher or accountant"))?,
        None => Role::Teacher,
    };
    let id = store::users::insert_user(conn, &username, &hash(password)?, role)
        .map_err(|e| map_unique(e, "username already exists"))?;
    info!(user_id = id, username = %username, role = role.as_str(), "user created");
    store::users::get_user(conn, id)?.ok_or_else(|| RecordError::not_found("user not found"))
}

pub fn list_users(conn: &Connection) -> RecordResult<Vec<User>> {
    Ok(store::users::list_users(conn)?)
}

/// Users may not delete themselves, and the last admin always stays.
pub fn delete_user(conn: &Connection, session: &Session, id: i64) -> RecordResult<()> {
    if id == session.user_id {
        return Err(RecordError::validation("cannot delete the logged-in user"));
    }
    let tx = conn.unchecked_transaction()?;
    let user = store::users::get_user(&tx, id)?
        .ok_or_else(|| RecordError::not_found("user not found"))?;
    if user.role == Role::Admin && store::users::count_admins(&tx)? <= 1 {
        return Err(RecordError::validation("cannot delete the last admin"));
    }
    store::users::delete_user(&tx, id)?;
    tx.commit()?;
    info!(user_id = id, "user deleted");
    Ok(())
}

pub fn change_password(conn: &Connection, session: &Session, new_password: &str) -> RecordResult<()> {
    if new_password.is_empty() {
        return Err(RecordError::validation("password is required"));
    }
    if store::users::set_password_hash(conn, session.user_id, &hash(new_password)?)? == 0 {
        return Err(RecordError::not_found("user not found"));
    }
    info!(user_id = session.user_id, "password changed");
    Ok(())
}
