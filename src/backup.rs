use crate::db::DB_FILE_NAME;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use rusqlite::{Connection, OpenFlags};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/school.sqlite3";
pub const BUNDLE_FORMAT_V1: &str = "schoold-workspace-v1";
pub const LEGACY_SQLITE_FORMAT: &str = "legacy-sqlite3";
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";
const REQUIRED_COLUMNS: [(&str, &str); 2] = [("students", "class_name"), ("users", "password_hash")];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE_NAME);
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        ));
    }
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    let digest = sha256_hex(&db_bytes);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": crate::clock::now_timestamp(),
        "dbSha256": digest,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    zip.write_all(&db_bytes)
        .context("failed to write database entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    info!(out = %out_path.display(), sha256 = %digest, "workspace exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        db_sha256: digest,
    })
}

/// Replace the workspace database with the one in `in_path`. Accepts a
/// bundle written by [`export_workspace_bundle`] or a bare SQLite file.
/// The candidate is staged next to the live database and checked before it
/// is renamed over it; on any error the live database is left untouched.
/// The caller must have closed any open connection to the workspace.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    let dst = workspace_path.join(DB_FILE_NAME);
    let tmp_dst = workspace_path.join(format!("{}.importing", DB_FILE_NAME));
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let staged = if is_zip_file(in_path)? {
        stage_bundle(in_path, &tmp_dst).map(|()| BUNDLE_FORMAT_V1)
    } else {
        std::fs::copy(in_path, &tmp_dst)
            .map(|_| LEGACY_SQLITE_FORMAT)
            .with_context(|| {
                format!(
                    "failed to copy sqlite backup from {}",
                    in_path.to_string_lossy()
                )
            })
    };
    let detected = match staged.and_then(|f| validate_school_db(&tmp_dst).map(|()| f)) {
        Ok(f) => f,
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_dst);
            return Err(e);
        }
    };

    if dst.exists() {
        std::fs::remove_file(&dst).with_context(|| {
            format!(
                "failed to remove existing database {}",
                dst.to_string_lossy()
            )
        })?;
    }
    std::fs::rename(&tmp_dst, &dst).with_context(|| {
        format!(
            "failed to move imported database to {}",
            dst.to_string_lossy()
        )
    })?;
    info!(from = %in_path.display(), format = detected, "imported workspace backup");

    Ok(ImportSummary {
        bundle_format_detected: detected.to_string(),
    })
}

/// Extract the database entry of a bundle into `tmp_dst` after checking the
/// manifest format and checksum.
fn stage_bundle(in_path: &Path, tmp_dst: &Path) -> anyhow::Result<()> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .context("bundle missing db/school.sqlite3")?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;
    if let Some(expected) = manifest.get("dbSha256").and_then(|v| v.as_str()) {
        let actual = sha256_hex(&db_bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(anyhow!(
                "database checksum mismatch: manifest {}, bundle {}",
                expected,
                actual
            ));
        }
    }

    let mut db_out = File::create(tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    db_out
        .write_all(&db_bytes)
        .context("failed to write extracted database")?;
    db_out
        .flush()
        .context("failed to flush extracted database")?;
    Ok(())
}

/// The staged file must be an SQLite database carrying the school tables.
fn validate_school_db(path: &Path) -> anyhow::Result<()> {
    let mut header = [0u8; 16];
    let read = File::open(path)
        .and_then(|mut f| f.read(&mut header))
        .context("failed to read staged database")?;
    if read < header.len() || &header != SQLITE_HEADER {
        return Err(anyhow!("backup is not an SQLite database"));
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .context("failed to open staged database")?;
    for (table, column) in REQUIRED_COLUMNS {
        conn.prepare(&format!("SELECT {} FROM {} LIMIT 0", column, table))
            .with_context(|| format!("backup has no {}.{} column", table, column))?;
    }
    Ok(())
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
