//! Persisted sign-in state for the command line front end.
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::store::Identity;

const SESSION_FILE: &str = "session.json";

pub fn session_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(SESSION_FILE)
}

pub fn save(data_dir: &str, identity: &Identity) -> Result<()> {
    let path = session_path(data_dir);
    let raw = serde_json::to_string_pretty(identity).context("failed to encode session")?;
    fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))
}

/// The stored identity, or `None` when nobody is signed in or the session expired.
pub fn load(data_dir: &str) -> Result<Option<Identity>> {
    let path = session_path(data_dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let identity: Identity = serde_json::from_str(&raw)
        .with_context(|| format!("invalid session file {}", path.display()))?;
    if identity.is_expired(Utc::now()) {
        info!(user_id=%identity.user_id, "stored session expired");
        return Ok(None);
    }
    Ok(Some(identity))
}

pub fn clear(data_dir: &str) -> Result<()> {
    let path = session_path(data_dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}
