#![forbid(unsafe_code)]

//! Request facade between the chat front end and the job store.
//!
//! Every public method resolves the caller through the role gate once,
//! then answers with plain reply values. Business-rule violations become
//! user-visible messages; storage faults are logged to stderr and reported
//! as a generic retry message. Nothing here panics across the boundary.

use gw_core::roles::{Actor, Operation, Role};
use gw_core::selection::SelectionSet;
use gw_storage::{
    JobRow, JobsAssignRequest, JobsForWorkerRequest, JobsPage, NoteAddRequest, SqliteStore,
    StoreError,
};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::macros::format_description;

const MSG_DENIED: &str = "You don't have permission to do that.";
const MSG_FAULT: &str = "Storage error, please try again.";

/// Static roster mapping user ids to names and roles. Anyone not on the
/// roster resolves to `Generic`, which the permission table denies
/// everything.
#[derive(Clone, Debug, Default)]
pub struct RoleGate {
    roster: BTreeMap<i64, (String, Role)>,
}

impl RoleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, user_id: i64, name: impl Into<String>, role: Role) {
        self.roster.insert(user_id, (name.into(), role));
    }

    pub fn with(mut self, user_id: i64, name: impl Into<String>, role: Role) -> Self {
        self.add(user_id, name, role);
        self
    }

    pub fn resolve(&self, user_id: i64) -> Actor {
        match self.roster.get(&user_id) {
            Some((name, role)) => Actor {
                id: user_id,
                name: name.clone(),
                role: *role,
            },
            None => Actor {
                id: user_id,
                name: format!("user {user_id}"),
                role: Role::Generic,
            },
        }
    }
}

/// Per-chat-session state. The selection set lives here, not in storage,
/// so it evaporates with the session exactly as a chat draft would.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub selection: SelectionSet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub ok: bool,
    pub message: String,
}

impl Reply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoReply {
    pub ok: bool,
    pub message: String,
    pub photo_count: usize,
}

#[derive(Clone, Debug)]
pub struct JobsReply {
    pub ok: bool,
    pub message: String,
    pub jobs: Vec<JobRow>,
    pub has_more: bool,
}

pub struct Engine {
    store: SqliteStore,
    gate: RoleGate,
}

impl Engine {
    pub fn new(store: SqliteStore, gate: RoleGate) -> Self {
        Self { store, gate }
    }

    /// Direct store access for hosts that seed or inspect data out of band.
    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    pub fn resolve(&self, user_id: i64) -> Actor {
        self.gate.resolve(user_id)
    }

    pub fn start_job(&mut self, user_id: i64, job_id: i64) -> Reply {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::StartJob) {
            return Reply::fail(MSG_DENIED);
        }
        match self.store.job_start(job_id) {
            Ok(result) if result.already_in_progress => {
                Reply::ok("Job is already in progress.")
            }
            Ok(_) => Reply::ok("Job started."),
            Err(err) => Reply::fail(fault_message(&err)),
        }
    }

    pub fn finish_job(&mut self, user_id: i64, job_id: i64) -> Reply {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::FinishJob) {
            return Reply::fail(MSG_DENIED);
        }
        match self.store.job_finish(job_id) {
            Ok(result) if result.already_completed => {
                Reply::ok("Job is already finished.")
            }
            Ok(_) => Reply::ok("Job finished."),
            Err(err) => Reply::fail(fault_message(&err)),
        }
    }

    pub fn add_photo(&mut self, user_id: i64, job_id: i64, path: &str) -> PhotoReply {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::AddPhoto) {
            return PhotoReply {
                ok: false,
                message: MSG_DENIED.to_string(),
                photo_count: 0,
            };
        }
        let cap = self.store.max_photos_per_job();
        match self.store.job_add_photo(job_id, path) {
            Ok(result) => PhotoReply {
                ok: true,
                message: format!("Photo added ({}/{cap}).", result.photo_count),
                photo_count: result.photo_count,
            },
            Err(err) => PhotoReply {
                ok: false,
                message: fault_message(&err),
                photo_count: 0,
            },
        }
    }

    /// Appends a note authored by the caller. Returns whether the note was
    /// stored; failures are logged, the front end only shows a yes/no.
    pub fn add_note(
        &mut self,
        user_id: i64,
        job_id: i64,
        text: &str,
        photo_path: Option<&str>,
    ) -> bool {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::AddNote) {
            return false;
        }
        let request = NoteAddRequest {
            job_id,
            author_id: actor.id,
            author_name: actor.name,
            author_role: actor.role.as_str().to_string(),
            note: text.to_string(),
            photo_path: photo_path.map(str::to_string),
        };
        match self.store.note_add(request) {
            Ok(_) => true,
            Err(err) => {
                log_fault("note_add", &err);
                false
            }
        }
    }

    pub fn get_job(&mut self, user_id: i64, job_id: i64) -> Option<JobRow> {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::ViewJob) {
            return None;
        }
        match self.store.job_get(job_id) {
            Ok(job) => job,
            Err(err) => {
                log_fault("job_get", &err);
                None
            }
        }
    }

    pub fn list_unassigned(&mut self, user_id: i64, page: usize, page_size: usize) -> JobsReply {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::ListUnassigned) {
            return JobsReply {
                ok: false,
                message: MSG_DENIED.to_string(),
                jobs: Vec::new(),
                has_more: false,
            };
        }
        match self.store.jobs_list_unassigned(page, page_size) {
            Ok(JobsPage { jobs, has_more }) => JobsReply {
                ok: true,
                message: String::new(),
                jobs,
                has_more,
            },
            Err(err) => JobsReply {
                ok: false,
                message: fault_message(&err),
                jobs: Vec::new(),
                has_more: false,
            },
        }
    }

    /// Pure set toggle; nothing touches storage until `assign_selected`.
    /// Returns whether the job is selected after the toggle.
    pub fn toggle_selection(&self, session: &mut Session, job_id: i64) -> bool {
        session.selection.toggle(job_id)
    }

    /// Binds the session's selection to one worker. The selection is cleared
    /// only when at least one job was assigned, so a dispatcher who hit a
    /// stale page keeps their picks and can retry.
    pub fn assign_selected(
        &mut self,
        user_id: i64,
        session: &mut Session,
        worker_id: i64,
        scheduled_date: Option<&str>,
    ) -> Reply {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::AssignJobs) {
            return Reply::fail(MSG_DENIED);
        }
        if session.selection.is_empty() {
            return Reply::fail("No jobs are selected.");
        }
        let request = JobsAssignRequest {
            job_ids: session.selection.ids().collect(),
            worker_id,
            scheduled_date: scheduled_date.map(str::to_string),
        };
        match self.store.jobs_assign(request) {
            Ok(result) if result.assigned.is_empty() => {
                Reply::fail("The selected jobs no longer exist.")
            }
            Ok(result) => {
                session.selection.clear();
                let mut message = format!("Assigned {} job(s).", result.assigned.len());
                if !result.missing.is_empty() {
                    message.push_str(&format!(" {} no longer exist.", result.missing.len()));
                }
                Reply::ok(message)
            }
            Err(err) => Reply::fail(fault_message(&err)),
        }
    }

    /// The caller's open jobs, optionally narrowed to one date. Completed
    /// jobs are hidden; this is the employee dashboard view.
    pub fn my_jobs(&mut self, user_id: i64, date: Option<&str>) -> Vec<JobRow> {
        let actor = self.gate.resolve(user_id);
        if !actor.role.permits(Operation::ViewJob) {
            return Vec::new();
        }
        let request = JobsForWorkerRequest {
            worker_id: actor.id,
            scheduled_date: date.map(str::to_string),
            include_completed: false,
        };
        match self.store.jobs_for_worker(request) {
            Ok(jobs) => jobs,
            Err(err) => {
                log_fault("jobs_for_worker", &err);
                Vec::new()
            }
        }
    }

    /// Daily reclaim of completed jobs for today's local date. Faults are
    /// logged and swallowed; the next scheduled run picks the rows up again.
    pub fn reset_completed_jobs(&mut self) -> usize {
        let today = local_today();
        match self.store.jobs_reset_completed(&today) {
            Ok(affected) => affected,
            Err(err) => {
                log_fault("jobs_reset_completed", &err);
                0
            }
        }
    }
}

fn log_fault(op: &str, err: &StoreError) {
    eprintln!("gw_engine: {op} failed: {err}");
}

fn fault_message(err: &StoreError) -> String {
    match err {
        StoreError::UnknownJob { .. } => "Job not found.".to_string(),
        StoreError::JobAlreadyCompleted { .. } => "Job is already completed.".to_string(),
        StoreError::JobNotStarted { .. } => "Job hasn't been started yet.".to_string(),
        StoreError::PhotoLimitReached { limit } => {
            format!("Photo limit reached ({limit}).")
        }
        StoreError::EmptySelection => "No jobs are selected.".to_string(),
        StoreError::SiteNameTaken { site_name } => {
            format!("A site named \"{site_name}\" already exists.")
        }
        StoreError::InvalidInput(message) => (*message).to_string(),
        StoreError::Io(_) | StoreError::Sql(_) => {
            log_fault("storage", err);
            MSG_FAULT.to_string()
        }
    }
}

/// Local calendar date as `YYYY-MM-DD`. Falls back to UTC when the host
/// refuses to disclose its offset (multi-threaded Unix processes).
pub fn local_today() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!("[year]-[month]-[day]");
    now.date()
        .format(&format)
        .unwrap_or_else(|_| now.date().to_string())
}
