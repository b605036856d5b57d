#![forbid(unsafe_code)]

//! Binary host for the job store: seeds sites from a JSON file and runs the
//! daily reclaim of completed jobs at a configured local wall-clock time.

use gw_engine::{Engine, RoleGate};
use gw_storage::{JobCreateRequest, SqliteStore, StoreConfig, StoreError};
use serde::Deserialize;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;
use time::{OffsetDateTime, Time};

fn usage() -> &'static str {
    "gw_runner — Groundwork job store host (seeding + daily reset)\n\n\
USAGE:\n\
  gw_runner [--storage-dir DIR] [--reset-hour H] [--reset-minute M]\n\
            [--max-photos N] [--seed FILE] [--once]\n\n\
NOTES:\n\
  - The reset runs at H:M local time every day (default 0:00) and returns\n\
    completed jobs scheduled for today (or unscheduled) to pending.\n\
  - --once runs one reset immediately and exits; use it from cron.\n\
  - --seed FILE reads a JSON array of site records and creates one pending\n\
    job per record, skipping site names that already exist.\n\n\
ENVIRONMENT:\n\
  GROUNDWORK_STORAGE_DIR, GROUNDWORK_RESET_HOUR, GROUNDWORK_RESET_MINUTE,\n\
  GROUNDWORK_MAX_PHOTOS, GROUNDWORK_SEED\n"
}

#[derive(Debug)]
struct RunnerConfig {
    storage_dir: PathBuf,
    reset_hour: u8,
    reset_minute: u8,
    max_photos: usize,
    seed: Option<PathBuf>,
    once: bool,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_args() -> Result<RunnerConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }

    let mut storage_dir: Option<PathBuf> = env_var("GROUNDWORK_STORAGE_DIR").map(PathBuf::from);
    let mut reset_hour: u8 = env_var("GROUNDWORK_RESET_HOUR")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut reset_minute: u8 = env_var("GROUNDWORK_RESET_MINUTE")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut max_photos: usize = env_var("GROUNDWORK_MAX_PHOTOS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(gw_storage::DEFAULT_MAX_PHOTOS_PER_JOB);
    let mut seed: Option<PathBuf> = env_var("GROUNDWORK_SEED").map(PathBuf::from);
    let mut once = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--reset-hour" => {
                i += 1;
                let v = args.get(i).ok_or("--reset-hour requires H")?;
                reset_hour = v.parse().map_err(|_| "--reset-hour must be 0..=23")?;
            }
            "--reset-minute" => {
                i += 1;
                let v = args.get(i).ok_or("--reset-minute requires M")?;
                reset_minute = v.parse().map_err(|_| "--reset-minute must be 0..=59")?;
            }
            "--max-photos" => {
                i += 1;
                let v = args.get(i).ok_or("--max-photos requires N")?;
                max_photos = v.parse().map_err(|_| "--max-photos must be a number")?;
            }
            "--seed" => {
                i += 1;
                let v = args.get(i).ok_or("--seed requires FILE")?;
                seed = Some(PathBuf::from(v));
            }
            "--once" => once = true,
            other => return Err(format!("unknown argument: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    if reset_hour > 23 {
        return Err("--reset-hour must be 0..=23".to_string());
    }
    if reset_minute > 59 {
        return Err("--reset-minute must be 0..=59".to_string());
    }

    Ok(RunnerConfig {
        storage_dir: storage_dir.unwrap_or_else(|| PathBuf::from(".groundwork")),
        reset_hour,
        reset_minute,
        max_photos,
        seed,
        once,
    })
}

/// One record of the seed file. Only `site_name` is required; everything
/// else is the static site card.
#[derive(Debug, Deserialize)]
struct SeedSite {
    site_name: String,
    #[serde(default)]
    quote: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    order_no: Option<String>,
    #[serde(default)]
    order_period: Option<String>,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    summer_schedule: Option<String>,
    #[serde(default)]
    winter_schedule: Option<String>,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    gate_code: Option<String>,
    #[serde(default)]
    map_link: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

fn decode_seed(raw: &str) -> Result<Vec<SeedSite>, String> {
    serde_json::from_str::<Vec<SeedSite>>(raw).map_err(|e| format!("seed file is invalid: {e}"))
}

/// Creates one pending job per seed record. Site names that already exist
/// are skipped so re-running the same seed file is harmless.
fn seed_jobs(store: &mut SqliteStore, sites: Vec<SeedSite>) -> (usize, usize) {
    let mut created = 0usize;
    let mut skipped = 0usize;
    for site in sites {
        let request = JobCreateRequest {
            site_name: site.site_name,
            quote: site.quote,
            address: site.address,
            order_no: site.order_no,
            order_period: site.order_period,
            area: site.area,
            summer_schedule: site.summer_schedule,
            winter_schedule: site.winter_schedule,
            contact: site.contact,
            gate_code: site.gate_code,
            map_link: site.map_link,
            priority: site.priority,
        };
        match store.job_create(request) {
            Ok(_) => created += 1,
            Err(StoreError::SiteNameTaken { site_name }) => {
                eprintln!("gw_runner: seed: \"{site_name}\" already exists, skipping");
                skipped += 1;
            }
            Err(err) => {
                eprintln!("gw_runner: seed: {err}");
                skipped += 1;
            }
        }
    }
    (created, skipped)
}

/// Time until the next local `hour:minute`. If that instant already passed
/// today, the next one is tomorrow's.
fn next_reset_delay(now: OffsetDateTime, hour: u8, minute: u8) -> Duration {
    let Ok(at) = Time::from_hms(hour, minute, 0) else {
        return Duration::from_secs(24 * 60 * 60);
    };
    let mut target = now.replace_time(at);
    if target <= now {
        target += time::Duration::days(1);
    }
    let delta = target - now;
    Duration::from_secs(delta.whole_seconds().max(1) as u64)
}

fn run(cfg: RunnerConfig) -> Result<(), String> {
    let store = SqliteStore::open_with_config(
        &cfg.storage_dir,
        StoreConfig {
            max_photos_per_job: cfg.max_photos,
        },
    )
    .map_err(|e| e.to_string())?;
    let mut engine = Engine::new(store, RoleGate::new());

    if let Some(path) = &cfg.seed {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let sites = decode_seed(&raw)?;
        let (created, skipped) = seed_jobs(engine.store_mut(), sites);
        eprintln!("gw_runner: seeded {created} job(s), skipped {skipped}");
    }

    if cfg.once {
        let affected = engine.reset_completed_jobs();
        eprintln!("gw_runner: reset returned {affected} job(s) to pending");
        return Ok(());
    }

    loop {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let delay = next_reset_delay(now, cfg.reset_hour, cfg.reset_minute);
        eprintln!(
            "gw_runner: next reset in {}s (at {:02}:{:02} local)",
            delay.as_secs(),
            cfg.reset_hour,
            cfg.reset_minute
        );
        sleep(delay);
        let affected = engine.reset_completed_jobs();
        eprintln!("gw_runner: reset returned {affected} job(s) to pending");
    }
}

fn main() {
    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = run(cfg) {
        eprintln!("{e}");
        std::process::exit(2);
    }
}
