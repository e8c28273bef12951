//! bursary-storage-json
//!
//! Durable [`FeeStore`] keeping the whole fee book in one JSON file, with a rotating set
//! of backups taken before every overwrite.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use bursary_core::{storage::book_warnings, CoreError, FeeStore};
use bursary_domain::FeeBook;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

const FILE_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "feebook";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// File-backed fee book. Writes go through [`FeeStore::transact`]; the file is replaced
/// atomically and the in-memory book only advances once the write has landed.
#[derive(Debug)]
pub struct JsonFeeStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    book: Mutex<FeeBook>,
}

impl JsonFeeStore {
    pub fn open(path: PathBuf, backups_dir: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    /// Opens `path`, starting an empty book when the file does not exist yet.
    pub fn with_retention(
        path: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&backups_dir)?;
        let book = if path.exists() {
            let book = load_book_from_path(&path)?;
            for warning in book_warnings(&book) {
                warn!(path = %path.display(), "{warning}");
            }
            book
        } else {
            FeeBook::new(Utc::now())
        };
        info!(path = %path.display(), students = book.students.len(), "fee book opened");
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
            book: Mutex::new(book),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Writes a labelled snapshot of the current book without touching the live file.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let guard = self.lock()?;
        let mut name = backup_stem();
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push('.');
        name.push_str(FILE_EXTENSION);
        let path = self.backups_dir.join(&name);
        write_atomic(&path, &serialize_book(&guard)?)?;
        self.prune_backups()?;
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&name),
            name,
            path,
        })
    }

    /// Backups newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    name: name.to_string(),
                    created_at: parse_backup_timestamp(name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse(info.created_at));
        Ok(entries)
    }

    /// Replaces the live book with the named backup. The current file is itself backed up
    /// first, so a restore can be undone.
    pub fn restore(&self, backup_name: &str) -> Result<FeeBook, CoreError> {
        let source = self.backups_dir.join(backup_name);
        if !source.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{backup_name}` not found"
            )));
        }
        let restored = load_book_from_path(&source)?;
        let mut guard = self.lock()?;
        self.persist(&restored)?;
        *guard = restored.clone();
        info!(backup = backup_name, "fee book restored from backup");
        Ok(restored)
    }

    fn lock(&self) -> Result<MutexGuard<'_, FeeBook>, CoreError> {
        self.book
            .lock()
            .map_err(|_| CoreError::Storage("fee book lock poisoned".into()))
    }

    fn persist(&self, book: &FeeBook) -> Result<(), CoreError> {
        if self.path.exists() {
            let backup = self
                .backups_dir
                .join(format!("{}.{FILE_EXTENSION}", backup_stem()));
            fs::copy(&self.path, &backup)?;
        }
        let tmp = tmp_path(&self.path);
        let written = write_atomic(&tmp, &serialize_book(book)?)
            .and_then(|_| fs::rename(&tmp, &self.path).map_err(CoreError::from));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.name, %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl FeeStore for JsonFeeStore {
    fn load(&self) -> Result<FeeBook, CoreError> {
        Ok(self.lock()?.clone())
    }

    fn transact(
        &self,
        work: &mut dyn FnMut(&mut FeeBook) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut guard = self.lock()?;
        let mut draft = guard.clone();
        work(&mut draft)?;
        self.persist(&draft)?;
        *guard = draft;
        debug!(path = %self.path.display(), "fee book committed");
        Ok(())
    }
}

/// Reads a fee book from an arbitrary path.
pub fn load_book_from_path(path: &Path) -> Result<FeeBook, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn serialize_book(book: &FeeBook) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}

fn backup_stem() -> String {
    format!(
        "{BACKUP_PREFIX}_{}",
        Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
    )
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if !sanitized.is_empty() && !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// `feebook_<date>_<time+millis>[_note].json`
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name
        .strip_suffix(&format!(".{FILE_EXTENSION}"))?
        .strip_prefix(&format!("{BACKUP_PREFIX}_"))?;
    let mut segments = stem.split('_');
    let date = segments.next()?;
    let time = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 9) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
