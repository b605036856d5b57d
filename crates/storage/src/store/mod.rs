#![forbid(unsafe_code)]

mod assign;
mod error;
mod jobs;
mod notes;
mod requests;

pub use error::StoreError;
pub use requests::*;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;
const DB_FILE: &str = "groundwork.db";

pub const DEFAULT_MAX_PHOTOS_PER_JOB: usize = 25;

const MAX_SITE_NAME_LEN: usize = 200;
const MAX_STATIC_FIELD_LEN: usize = 500;
const MAX_PHOTO_PATH_LEN: usize = 512;
const MAX_NOTE_LEN: usize = 4_000;
const MAX_LIST_LIMIT: usize = 200;

const JOB_COLUMNS: &str = "id, site_name, quote, address, order_no, order_period, area, \
     summer_schedule, winter_schedule, contact, gate_code, map_link, priority, \
     assigned_to, status, scheduled_date, start_time_ms, finish_time_ms, photos_json";

#[derive(Clone, Copy, Debug)]
pub struct StoreConfig {
    pub max_photos_per_job: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_photos_per_job: DEFAULT_MAX_PHOTOS_PER_JOB,
        }
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(storage_dir, StoreConfig::default())
    }

    pub fn open_with_config(
        storage_dir: impl AsRef<Path>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        if config.max_photos_per_job == 0 {
            return Err(StoreError::InvalidInput(
                "max_photos_per_job must be at least 1",
            ));
        }

        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;",
        )?;

        install_schema(&conn)?;

        Ok(Self {
            conn,
            storage_dir,
            config,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn max_photos_per_job(&self) -> usize {
        self.config.max_photos_per_job
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS jobs (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          site_name TEXT NOT NULL UNIQUE,
          quote TEXT,
          address TEXT,
          order_no TEXT,
          order_period TEXT,
          area TEXT,
          summer_schedule TEXT,
          winter_schedule TEXT,
          contact TEXT,
          gate_code TEXT,
          map_link TEXT,
          priority TEXT NOT NULL DEFAULT 'normal',
          assigned_to INTEGER,
          status TEXT NOT NULL DEFAULT 'pending',
          scheduled_date TEXT,
          start_time_ms INTEGER,
          finish_time_ms INTEGER,
          photos_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_assigned_to ON jobs(assigned_to);
        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
        CREATE INDEX IF NOT EXISTS idx_jobs_scheduled_date ON jobs(scheduled_date);

        CREATE TABLE IF NOT EXISTS job_notes (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          job_id INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
          author_id INTEGER NOT NULL,
          author_name TEXT NOT NULL,
          author_role TEXT NOT NULL,
          note TEXT NOT NULL,
          photo_path TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_job_notes_job_created
          ON job_notes(job_id, created_at_ms);
        "#,
    )?;

    conn.execute(
        "INSERT INTO meta(key, value) VALUES ('schema_version', ?1) \
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

type RawJobRow = (JobRow, Option<String>);

fn read_job_row(row: &rusqlite::Row<'_>) -> Result<RawJobRow, rusqlite::Error> {
    let photos_json: Option<String> = row.get(18)?;
    let job = JobRow {
        id: row.get(0)?,
        site_name: row.get(1)?,
        quote: row.get(2)?,
        address: row.get(3)?,
        order_no: row.get(4)?,
        order_period: row.get(5)?,
        area: row.get(6)?,
        summer_schedule: row.get(7)?,
        winter_schedule: row.get(8)?,
        contact: row.get(9)?,
        gate_code: row.get(10)?,
        map_link: row.get(11)?,
        priority: row.get(12)?,
        assigned_to: row.get(13)?,
        status: row.get(14)?,
        scheduled_date: row.get(15)?,
        start_time_ms: row.get(16)?,
        finish_time_ms: row.get(17)?,
        photos: Vec::new(),
    };
    Ok((job, photos_json))
}

fn finish_job_row(raw: RawJobRow) -> Result<JobRow, StoreError> {
    let (mut job, photos_json) = raw;
    job.photos = decode_photo_list(photos_json)?;
    Ok(job)
}

fn job_by_id_tx(tx: &Transaction<'_>, job_id: i64) -> Result<Option<JobRow>, StoreError> {
    let raw = tx
        .query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id=?1"),
            params![job_id],
            read_job_row,
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(finish_job_row(raw)?)),
        None => Ok(None),
    }
}

fn ensure_job_exists_tx(tx: &Transaction<'_>, job_id: i64) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM jobs WHERE id=?1",
            params![job_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownJob { job_id })
    }
}

fn encode_photo_list(items: &[String]) -> String {
    // Deterministic encoding; ordering is append order.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn decode_photo_list(raw: Option<String>) -> Result<Vec<String>, StoreError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(trimmed)
        .map_err(|_| StoreError::InvalidInput("stored photo list is invalid json"))
}

fn normalize_site_name(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("site_name must not be empty"));
    }
    Ok(raw.chars().take(MAX_SITE_NAME_LEN).collect())
}

fn normalize_static_field(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_STATIC_FIELD_LEN).collect())
}

fn normalize_priority(raw: Option<String>) -> Result<String, StoreError> {
    let Some(raw) = raw else {
        return Ok("normal".to_string());
    };
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Ok("normal".to_string());
    }
    if !matches!(lowered.as_str(), "low" | "normal" | "high") {
        return Err(StoreError::InvalidInput(
            "priority must be low|normal|high",
        ));
    }
    Ok(lowered)
}

fn normalize_photo_path(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("photo path must not be empty"));
    }
    if raw.len() > MAX_PHOTO_PATH_LEN {
        return Err(StoreError::InvalidInput("photo path is too long"));
    }
    Ok(raw.to_string())
}

fn normalize_note_text(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("note must not be empty"));
    }
    Ok(raw.chars().take(MAX_NOTE_LEN).collect())
}

/// Dates travel as `YYYY-MM-DD` strings; NULL means "today/unscheduled".
fn normalize_date(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    if !shape_ok {
        return Err(StoreError::InvalidInput("date must be YYYY-MM-DD"));
    }
    Ok(raw.to_string())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed"))
        }
        _ => false,
    }
}
