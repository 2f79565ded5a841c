use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::with_session;
use crate::ipc::params::{get_opt_str, get_required_i64, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Session;
use crate::records::users;
use rusqlite::Connection;
use serde_json::{json, Value};

fn handle_login(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = get_required_str(&req.params, "username").and_then(|username| {
        let password = get_required_str(&req.params, "password")?;
        users::login(conn, &username, &password).map_err(HandlerErr::from)
    });
    match result {
        Ok(session) => {
            let body = json!({ "session": session });
            state.session = Some(session);
            ok(&req.id, body)
        }
        Err(e) => e.response(&req.id),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> Value {
    let was = state.session.take();
    ok(&req.id, json!({ "loggedOut": was.is_some() }))
}

fn whoami(_conn: &Connection, session: &Session, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "session": session }))
}

fn users_list(conn: &Connection, _session: &Session, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "users": users::list_users(conn)? }))
}

fn users_create(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let username = get_required_str(params, "username")?;
    let password = get_required_str(params, "password")?;
    let role = get_opt_str(params, "role")?;
    let user = users::create_user(conn, &username, &password, role.as_deref())?;
    Ok(json!({ "user": user }))
}

fn users_delete(conn: &Connection, session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "userId")?;
    users::delete_user(conn, session, id)?;
    Ok(json!({ "ok": true }))
}

fn users_change_password(conn: &Connection, session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let password = get_required_str(params, "newPassword")?;
    users::change_password(conn, session, &password)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.whoami" => Some(with_session(state, req, whoami)),
        "users.list" => Some(with_session(state, req, users_list)),
        "users.create" => Some(with_session(state, req, users_create)),
        "users.delete" => Some(with_session(state, req, users_delete)),
        "users.changePassword" => Some(with_session(state, req, users_change_password)),
        _ => None,
    }
}
