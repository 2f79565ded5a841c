mod auth;
mod backup;
mod clock;
mod config;
mod db;
mod error;
mod ipc;
mod model;
mod records;
mod stats;
mod store;

use std::io::{self, BufRead, Write};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr; stdout carries the JSON-lines protocol only.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cfg = config::Config::load();
    init_tracing(&cfg.log);

    let mut state = ipc::AppState::new(cfg.init_options());
    if let Some(path) = cfg.workspace.clone() {
        match ipc::open_workspace(&mut state, path.clone()) {
            Ok(()) => info!(path = %path.display(), "workspace opened at startup"),
            Err(e) => error!(path = %path.display(), error = ?e, "startup workspace open failed"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed, shutting down");
}
