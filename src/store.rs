//! Generated reports on disk, stored as `{file_id}_{filename}`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;

const FILE_ID_LEN: usize = 36;

#[derive(Clone, Debug, Serialize)]
pub struct StoredReport {
    pub file_id: Option<String>,
    /// Name without the id prefix.
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a fresh id. Creates the directory if needed.
    pub fn save(&self, bytes: &[u8], filename: &str) -> Result<StoredReport, Error> {
        fs::create_dir_all(&self.dir)?;
        let file_id = Uuid::new_v4().to_string();
        let path = self.dir.join(format!("{}_{}", file_id, filename));
        fs::write(&path, bytes)?;
        log::info!("Saved {} ({} bytes) as {}", filename, bytes.len(), file_id);
        Ok(StoredReport {
            file_id: Some(file_id),
            filename: filename.to_string(),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
            path,
        })
    }

    /// The stored file for `file_id`, if any. Ids shorter than a UUID are
    /// rejected without touching the filesystem.
    pub fn find(&self, file_id: &str) -> Result<Option<StoredReport>, Error> {
        if file_id.len() < FILE_ID_LEN {
            log::warn!("Rejecting malformed file id {:?}", file_id);
            return Ok(None);
        }
        if !self.dir.is_dir() {
            return Ok(None);
        }
        let prefix = format!("{}_", file_id);
        let mut matches: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        matches.sort();
        match matches.into_iter().next() {
            Some(path) => describe(&path).map(Some),
            None => {
                log::warn!("No file found for id {}", file_id);
                Ok(None)
            }
        }
    }

    /// Stored `.docx` files, newest first.
    pub fn list(&self) -> Result<Vec<StoredReport>, Error> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if is_docx(&path) {
                reports.push(describe(&path)?);
            }
        }
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Remove `.docx` files last modified more than `hours` ago. Returns how
    /// many were removed; files that can't be removed are logged and kept.
    pub fn cleanup_older_than(&self, hours: u64) -> Result<usize, Error> {
        if !self.dir.is_dir() {
            return Ok(0);
        }
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(hours.saturating_mul(3600)))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !is_docx(&path) {
                continue;
            }
            let modified = fs::metadata(&path)?.modified()?;
            if modified >= cutoff {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("Removed old output {}", path.display());
                    removed += 1;
                }
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        if removed > 0 {
            log::info!("Cleaned up {} file(s) older than {}h", removed, hours);
        }
        Ok(removed)
    }
}

fn is_docx(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "docx")
}

fn describe(path: &Path) -> Result<StoredReport, Error> {
    let meta = fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (file_id, filename) = match name.split_once('_') {
        Some((id, rest)) => (Some(id.to_string()), rest.to_string()),
        None => (None, name),
    };
    let created_at = meta.created().or_else(|_| meta.modified())?;
    Ok(StoredReport {
        file_id,
        filename,
        path: path.to_path_buf(),
        size_bytes: meta.len(),
        created_at: created_at.into(),
    })
}
