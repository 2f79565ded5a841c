//! Command-line and environment configuration.
//!
//! Values come from flags first, then `SCHOOLD_*` environment variables
//! (a `.env` file in the working directory is loaded beforehand).

use crate::db::InitOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "schoold", version, about = "School records sidecar (JSON lines on stdin/stdout)")]
pub struct Config {
    /// Workspace directory to open at startup. Without it the front end
    /// must send `workspace.select` first.
    #[arg(long, env = "SCHOOLD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Insert three sample students into an empty workspace.
    #[arg(long, env = "SCHOOLD_SEED_SAMPLE")]
    pub seed_sample: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "SCHOOLD_LOG", default_value = "info")]
    pub log: String,
}

impl Config {
    pub fn load() -> Self {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Config::parse()
    }

    pub fn init_options(&self) -> InitOptions {
        InitOptions {
            seed_sample_students: self.seed_sample,
        }
    }
}
