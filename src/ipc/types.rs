use std::path::PathBuf;

use crate::db::InitOptions;
use crate::model::Session;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    /// Logged-in user, if any. Handed explicitly to operations that
    /// attribute who did something.
    pub session: Option<Session>,
    pub init: InitOptions,
}

impl AppState {
    pub fn new(init: InitOptions) -> Self {
        AppState {
            workspace: None,
            db: None,
            session: None,
            init,
        }
    }
}
