#![forbid(unsafe_code)]

/// One row of the jobs table. Static site fields are carried through
/// unchanged; only the lifecycle fields (`status`, `assigned_to`,
/// `scheduled_date`, timestamps, photos) are ever mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRow {
    pub id: i64,
    pub site_name: String,
    pub quote: Option<String>,
    pub address: Option<String>,
    pub order_no: Option<String>,
    pub order_period: Option<String>,
    pub area: Option<String>,
    pub summer_schedule: Option<String>,
    pub winter_schedule: Option<String>,
    pub contact: Option<String>,
    pub gate_code: Option<String>,
    pub map_link: Option<String>,
    pub priority: String,
    pub assigned_to: Option<i64>,
    pub status: String,
    pub scheduled_date: Option<String>,
    pub start_time_ms: Option<i64>,
    pub finish_time_ms: Option<i64>,
    pub photos: Vec<String>,
}

impl JobRow {
    /// Elapsed working time in milliseconds, present once both lifecycle
    /// timestamps are set.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time_ms, self.finish_time_ms) {
            (Some(start), Some(finish)) => Some(finish.saturating_sub(start)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteRow {
    pub id: i64,
    pub job_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_role: String,
    pub note: String,
    pub photo_path: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobCreateRequest {
    pub site_name: String,
    pub quote: Option<String>,
    pub address: Option<String>,
    pub order_no: Option<String>,
    pub order_period: Option<String>,
    pub area: Option<String>,
    pub summer_schedule: Option<String>,
    pub winter_schedule: Option<String>,
    pub contact: Option<String>,
    pub gate_code: Option<String>,
    pub map_link: Option<String>,
    pub priority: Option<String>,
}

#[derive(Clone, Debug)]
pub struct JobStartResult {
    pub job: JobRow,
    pub already_in_progress: bool,
}

#[derive(Clone, Debug)]
pub struct JobFinishResult {
    pub job: JobRow,
    pub already_completed: bool,
}

#[derive(Clone, Debug)]
pub struct JobAddPhotoResult {
    pub job: JobRow,
    pub photo_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteAddRequest {
    pub job_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_role: String,
    pub note: String,
    pub photo_path: Option<String>,
}

#[derive(Clone, Debug)]
pub struct JobsPage {
    pub jobs: Vec<JobRow>,
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobsAssignRequest {
    pub job_ids: Vec<i64>,
    pub worker_id: i64,
    pub scheduled_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobsAssignResult {
    pub assigned: Vec<i64>,
    pub missing: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobsForWorkerRequest {
    pub worker_id: i64,
    pub scheduled_date: Option<String>,
    pub include_completed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobsStatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}
