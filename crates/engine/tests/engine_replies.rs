#![forbid(unsafe_code)]

use gw_core::roles::Role;
use gw_engine::{Engine, RoleGate, Session};
use gw_storage::{JobCreateRequest, SqliteStore};
use std::path::PathBuf;

const DEV: i64 = 1;
const DIRECTOR: i64 = 2;
const EMPLOYEE: i64 = 3;
const STRANGER: i64 = 404;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("gw_engine_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn setup(test_name: &str) -> Engine {
    let store = SqliteStore::open(temp_dir(test_name)).expect("open store");
    let gate = RoleGate::new()
        .with(DEV, "root", Role::Dev)
        .with(DIRECTOR, "Dana", Role::Director)
        .with(EMPLOYEE, "Pat", Role::Employee);
    Engine::new(store, gate)
}

fn seed(engine: &mut Engine, site_name: &str) -> i64 {
    engine
        .store_mut()
        .job_create(JobCreateRequest {
            site_name: site_name.to_string(),
            ..JobCreateRequest::default()
        })
        .expect("create job")
        .id
}

#[test]
fn employee_runs_the_lifecycle_with_friendly_replies() {
    let mut engine = setup("lifecycle_replies");
    let id = seed(&mut engine, "Riverside Park");

    let started = engine.start_job(EMPLOYEE, id);
    assert!(started.ok);
    assert_eq!(started.message, "Job started.");

    let again = engine.start_job(EMPLOYEE, id);
    assert!(again.ok);
    assert_eq!(again.message, "Job is already in progress.");

    let finished = engine.finish_job(EMPLOYEE, id);
    assert!(finished.ok);
    assert_eq!(finished.message, "Job finished.");

    let again = engine.finish_job(EMPLOYEE, id);
    assert!(again.ok);
    assert_eq!(again.message, "Job is already finished.");
}

#[test]
fn business_rule_violations_become_messages_not_errors() {
    let mut engine = setup("violation_messages");
    let id = seed(&mut engine, "Oak Grove");

    let unstarted = engine.finish_job(EMPLOYEE, id);
    assert!(!unstarted.ok);
    assert_eq!(unstarted.message, "Job hasn't been started yet.");

    let missing = engine.start_job(EMPLOYEE, 999);
    assert!(!missing.ok);
    assert_eq!(missing.message, "Job not found.");

    engine.start_job(EMPLOYEE, id);
    engine.finish_job(EMPLOYEE, id);
    let completed = engine.start_job(EMPLOYEE, id);
    assert!(!completed.ok);
    assert_eq!(completed.message, "Job is already completed.");
}

#[test]
fn roles_gate_every_operation() {
    let mut engine = setup("role_gating");
    let id = seed(&mut engine, "Elm Court");

    assert!(!engine.start_job(DIRECTOR, id).ok);
    assert!(!engine.start_job(STRANGER, id).ok);
    assert!(!engine.finish_job(DIRECTOR, id).ok);
    assert!(!engine.add_photo(DIRECTOR, id, "x.jpg").ok);
    assert!(!engine.add_note(STRANGER, id, "hello", None));
    assert!(engine.get_job(STRANGER, id).is_none());
    assert!(!engine.list_unassigned(EMPLOYEE, 1, 10).ok);

    let mut session = Session::default();
    engine.toggle_selection(&mut session, id);
    assert!(!engine.assign_selected(EMPLOYEE, &mut session, 9, None).ok);
    assert!(session.selection.contains(id));

    // Dev bypasses every gate.
    assert!(engine.start_job(DEV, id).ok);
    assert!(engine.list_unassigned(DEV, 1, 10).ok);
}

#[test]
fn photo_replies_carry_the_running_count() {
    let mut engine = setup("photo_count");
    let id = seed(&mut engine, "Mill Lane");

    let first = engine.add_photo(EMPLOYEE, id, "a.jpg");
    assert!(first.ok);
    assert_eq!(first.photo_count, 1);
    assert_eq!(first.message, "Photo added (1/25).");

    let second = engine.add_photo(EMPLOYEE, id, "b.jpg");
    assert_eq!(second.photo_count, 2);
}

#[test]
fn notes_record_the_resolved_author() {
    let mut engine = setup("note_author");
    let id = seed(&mut engine, "Harbor View");

    assert!(engine.add_note(EMPLOYEE, id, "gate code changed", None));
    assert!(engine.add_note(DIRECTOR, id, "confirmed with client", None));
    assert!(!engine.add_note(EMPLOYEE, 999, "lost", None));

    let notes = engine
        .store_mut()
        .notes_for_job(id, 10)
        .expect("list notes");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].author_name, "Dana");
    assert_eq!(notes[0].author_role, "Director");
    assert_eq!(notes[1].author_name, "Pat");
    assert_eq!(notes[1].author_role, "Employee");
}

#[test]
fn selection_drives_assignment_and_clears_on_success() {
    let mut engine = setup("assign_flow");
    let a = seed(&mut engine, "Aspen Way");
    let b = seed(&mut engine, "Birch Road");
    seed(&mut engine, "Chestnut Hill");

    let mut session = Session::default();
    let empty = engine.assign_selected(DIRECTOR, &mut session, 9, None);
    assert!(!empty.ok);
    assert_eq!(empty.message, "No jobs are selected.");

    assert!(engine.toggle_selection(&mut session, a));
    assert!(engine.toggle_selection(&mut session, b));
    assert!(!engine.toggle_selection(&mut session, b));
    assert_eq!(session.selection.len(), 1);
    engine.toggle_selection(&mut session, b);

    let assigned = engine.assign_selected(DIRECTOR, &mut session, 9, Some("2026-08-24"));
    assert!(assigned.ok);
    assert_eq!(assigned.message, "Assigned 2 job(s).");
    assert!(session.selection.is_empty());

    let listing = engine.list_unassigned(DIRECTOR, 1, 10);
    assert!(listing.ok);
    assert_eq!(listing.jobs.len(), 1);
    assert!(!listing.has_more);
}

#[test]
fn stale_selection_is_kept_for_retry() {
    let mut engine = setup("stale_selection");
    seed(&mut engine, "Long Acre");

    let mut session = Session::default();
    engine.toggle_selection(&mut session, 777);

    let reply = engine.assign_selected(DIRECTOR, &mut session, 9, None);
    assert!(!reply.ok);
    assert_eq!(reply.message, "The selected jobs no longer exist.");
    assert!(session.selection.contains(777));
}

#[test]
fn partial_batches_report_the_missing_jobs() {
    let mut engine = setup("partial_batch");
    let id = seed(&mut engine, "Dock Edge");

    let mut session = Session::default();
    engine.toggle_selection(&mut session, id);
    engine.toggle_selection(&mut session, 888);

    let reply = engine.assign_selected(DIRECTOR, &mut session, 9, None);
    assert!(reply.ok);
    assert_eq!(reply.message, "Assigned 1 job(s). 1 no longer exist.");
    assert!(session.selection.is_empty());
}

#[test]
fn my_jobs_shows_only_open_work() {
    let mut engine = setup("my_jobs");
    let a = seed(&mut engine, "View A");
    let b = seed(&mut engine, "View B");

    let mut session = Session::default();
    engine.toggle_selection(&mut session, a);
    engine.toggle_selection(&mut session, b);
    engine.assign_selected(DIRECTOR, &mut session, EMPLOYEE, None);

    engine.start_job(EMPLOYEE, b);
    engine.finish_job(EMPLOYEE, b);

    let open = engine.my_jobs(EMPLOYEE, None);
    assert_eq!(open.iter().map(|j| j.id).collect::<Vec<_>>(), vec![a]);
    assert!(engine.my_jobs(STRANGER, None).is_empty());
}

#[test]
fn daily_reset_reclaims_and_reports_zero_on_repeat() {
    let mut engine = setup("daily_reset");
    let id = seed(&mut engine, "Quarry Field");

    engine.start_job(EMPLOYEE, id);
    engine.finish_job(EMPLOYEE, id);

    assert_eq!(engine.reset_completed_jobs(), 1);
    assert_eq!(engine.reset_completed_jobs(), 0);

    let job = engine.get_job(EMPLOYEE, id).expect("job exists");
    assert_eq!(job.status, "pending");
    assert_eq!(job.assigned_to, None);
}
