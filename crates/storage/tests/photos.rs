#![forbid(unsafe_code)]

use gw_storage::{
    DEFAULT_MAX_PHOTOS_PER_JOB, JobCreateRequest, SqliteStore, StoreConfig, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("gw_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn setup_with_limit(test_name: &str, max_photos_per_job: usize) -> SqliteStore {
    SqliteStore::open_with_config(temp_dir(test_name), StoreConfig { max_photos_per_job })
        .expect("open store")
}

fn seed(store: &mut SqliteStore, site_name: &str) -> i64 {
    store
        .job_create(JobCreateRequest {
            site_name: site_name.to_string(),
            ..JobCreateRequest::default()
        })
        .expect("create job")
        .id
}

#[test]
fn photos_accumulate_in_append_order_up_to_the_cap() {
    let mut store = setup_with_limit("append_order", 3);
    let id = seed(&mut store, "Sunnybank");

    for n in 1..=3 {
        let result = store
            .job_add_photo(id, &format!("photos/{n}.jpg"))
            .expect("add photo");
        assert_eq!(result.photo_count, n);
    }

    let job = store.job_get(id).expect("get").expect("exists");
    assert_eq!(
        job.photos,
        vec!["photos/1.jpg", "photos/2.jpg", "photos/3.jpg"]
    );
}

#[test]
fn photo_over_the_cap_is_rejected_without_mutation() {
    let mut store = setup_with_limit("over_cap", 2);
    let id = seed(&mut store, "Dale View");

    store.job_add_photo(id, "a.jpg").expect("first");
    store.job_add_photo(id, "b.jpg").expect("second");

    let err = store.job_add_photo(id, "c.jpg").expect_err("cap must hold");
    assert!(matches!(err, StoreError::PhotoLimitReached { limit: 2 }));

    let job = store.job_get(id).expect("get").expect("exists");
    assert_eq!(job.photos, vec!["a.jpg", "b.jpg"]);
}

#[test]
fn default_cap_is_twenty_five() {
    let mut store = SqliteStore::open(temp_dir("default_cap")).expect("open store");
    assert_eq!(store.max_photos_per_job(), DEFAULT_MAX_PHOTOS_PER_JOB);

    let id = seed(&mut store, "Broad Oak");
    for n in 1..=DEFAULT_MAX_PHOTOS_PER_JOB {
        store
            .job_add_photo(id, &format!("p{n}.jpg"))
            .expect("add photo");
    }
    assert!(matches!(
        store.job_add_photo(id, "p26.jpg"),
        Err(StoreError::PhotoLimitReached { limit: 25 })
    ));
}

#[test]
fn zero_photo_cap_is_rejected_at_open() {
    let err = SqliteStore::open_with_config(
        temp_dir("zero_cap"),
        StoreConfig {
            max_photos_per_job: 0,
        },
    )
    .err()
    .expect("open must fail");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn blank_photo_path_is_rejected() {
    let mut store = setup_with_limit("blank_path", 5);
    let id = seed(&mut store, "Fox Covert");

    assert!(matches!(
        store.job_add_photo(id, "   "),
        Err(StoreError::InvalidInput(_))
    ));
    assert!(store.job_get(id).expect("get").expect("exists").photos.is_empty());
}

#[test]
fn photos_attach_regardless_of_job_status() {
    let mut store = setup_with_limit("any_status", 5);
    let id = seed(&mut store, "Mere Side");

    store.job_add_photo(id, "pending.jpg").expect("on pending");
    store.job_start(id).expect("start");
    store.job_add_photo(id, "running.jpg").expect("on in_progress");
    store.job_finish(id).expect("finish");
    store.job_add_photo(id, "done.jpg").expect("on completed");

    let job = store.job_get(id).expect("get").expect("exists");
    assert_eq!(job.photos, vec!["pending.jpg", "running.jpg", "done.jpg"]);
}

#[test]
fn photo_on_unknown_job_is_reported() {
    let mut store = setup_with_limit("unknown_job", 5);
    assert!(matches!(
        store.job_add_photo(404, "x.jpg"),
        Err(StoreError::UnknownJob { job_id: 404 })
    ));
}
