#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownJob {
        job_id: i64,
    },
    SiteNameTaken {
        site_name: String,
    },
    JobAlreadyCompleted {
        job_id: i64,
    },
    JobNotStarted {
        job_id: i64,
        status: String,
    },
    PhotoLimitReached {
        limit: usize,
    },
    EmptySelection,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownJob { job_id } => write!(f, "unknown job (id={job_id})"),
            Self::SiteNameTaken { site_name } => {
                write!(f, "site name already exists (site_name={site_name})")
            }
            Self::JobAlreadyCompleted { job_id } => {
                write!(f, "job already completed (id={job_id})")
            }
            Self::JobNotStarted { job_id, status } => {
                write!(f, "job not started (id={job_id}, status={status})")
            }
            Self::PhotoLimitReached { limit } => {
                write!(f, "photo limit reached (limit={limit})")
            }
            Self::EmptySelection => write!(f, "selection is empty"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
