#![forbid(unsafe_code)]

use super::*;
use gw_core::status::JobStatus;

fn parse_stored_status(raw: &str) -> Result<JobStatus, StoreError> {
    JobStatus::parse(raw).map_err(|_| StoreError::InvalidInput("stored job status is invalid"))
}

impl SqliteStore {
    /// Seeds one site row. Jobs are created once and never deleted; they
    /// cycle through statuses for the rest of their life.
    pub fn job_create(&mut self, request: JobCreateRequest) -> Result<JobRow, StoreError> {
        let site_name = normalize_site_name(&request.site_name)?;
        let priority = normalize_priority(request.priority)?;

        let tx = self.conn.transaction()?;

        let insert = tx.execute(
            r#"
            INSERT INTO jobs(
              site_name, quote, address, order_no, order_period, area,
              summer_schedule, winter_schedule, contact, gate_code, map_link,
              priority, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'pending')
            "#,
            params![
                site_name,
                normalize_static_field(request.quote),
                normalize_static_field(request.address),
                normalize_static_field(request.order_no),
                normalize_static_field(request.order_period),
                normalize_static_field(request.area),
                normalize_static_field(request.summer_schedule),
                normalize_static_field(request.winter_schedule),
                normalize_static_field(request.contact),
                normalize_static_field(request.gate_code),
                normalize_static_field(request.map_link),
                priority,
            ],
        );

        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::SiteNameTaken { site_name });
            }
            return Err(StoreError::Sql(err));
        }

        let job_id = tx.last_insert_rowid();
        let job = job_by_id_tx(&tx, job_id)?.ok_or(StoreError::UnknownJob { job_id })?;

        tx.commit()?;
        Ok(job)
    }

    pub fn job_get(&mut self, job_id: i64) -> Result<Option<JobRow>, StoreError> {
        let tx = self.conn.transaction()?;
        let job = job_by_id_tx(&tx, job_id)?;
        tx.commit()?;
        Ok(job)
    }

    /// `pending -> in_progress`. Starting an already-running job is an
    /// idempotent no-op (duplicate taps must not move `start_time_ms`);
    /// starting a completed job is rejected without mutation.
    pub fn job_start(&mut self, job_id: i64) -> Result<JobStartResult, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(job) = job_by_id_tx(&tx, job_id)? else {
            return Err(StoreError::UnknownJob { job_id });
        };
        let status = parse_stored_status(&job.status)?;

        if status.is_terminal() {
            return Err(StoreError::JobAlreadyCompleted { job_id });
        }
        if !status.can_start() {
            tx.commit()?;
            return Ok(JobStartResult {
                job,
                already_in_progress: true,
            });
        }

        // Status-guarded write: the transition only applies to the state the
        // guard names, so a racing duplicate cannot double-charge start_time.
        let changed = tx.execute(
            "UPDATE jobs SET status='in_progress', start_time_ms=?2, finish_time_ms=NULL \
             WHERE id=?1 AND status='pending'",
            params![job_id, now_ms],
        )?;
        if changed != 1 {
            return Err(StoreError::InvalidInput("job changed concurrently"));
        }

        let job = job_by_id_tx(&tx, job_id)?.ok_or(StoreError::UnknownJob { job_id })?;
        tx.commit()?;
        Ok(JobStartResult {
            job,
            already_in_progress: false,
        })
    }

    /// `in_progress -> completed`. Finishing a completed job is an idempotent
    /// no-op; finishing a job that was never started is rejected.
    pub fn job_finish(&mut self, job_id: i64) -> Result<JobFinishResult, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(job) = job_by_id_tx(&tx, job_id)? else {
            return Err(StoreError::UnknownJob { job_id });
        };
        let status = parse_stored_status(&job.status)?;

        if status.is_terminal() {
            tx.commit()?;
            return Ok(JobFinishResult {
                job,
                already_completed: true,
            });
        }
        if !status.can_finish() {
            return Err(StoreError::JobNotStarted {
                job_id,
                status: job.status,
            });
        }

        // finish_time must never precede start_time, even when the wall
        // clock steps backwards between the two transitions.
        let finish_ms = job.start_time_ms.map_or(now_ms, |start| now_ms.max(start));
        let changed = tx.execute(
            "UPDATE jobs SET status='completed', finish_time_ms=?2 \
             WHERE id=?1 AND status='in_progress'",
            params![job_id, finish_ms],
        )?;
        if changed != 1 {
            return Err(StoreError::InvalidInput("job changed concurrently"));
        }

        let job = job_by_id_tx(&tx, job_id)?.ok_or(StoreError::UnknownJob { job_id })?;
        tx.commit()?;
        Ok(JobFinishResult {
            job,
            already_completed: false,
        })
    }

    /// Appends one photo path, rejecting (without mutation) once the
    /// configured cap is reached.
    pub fn job_add_photo(
        &mut self,
        job_id: i64,
        path: &str,
    ) -> Result<JobAddPhotoResult, StoreError> {
        let path = normalize_photo_path(path)?;
        let limit = self.config.max_photos_per_job;

        let tx = self.conn.transaction()?;

        let Some(job) = job_by_id_tx(&tx, job_id)? else {
            return Err(StoreError::UnknownJob { job_id });
        };

        if job.photos.len() >= limit {
            return Err(StoreError::PhotoLimitReached { limit });
        }

        let mut photos = job.photos;
        photos.push(path);
        let photos_json = encode_photo_list(&photos);

        tx.execute(
            "UPDATE jobs SET photos_json=?2 WHERE id=?1",
            params![job_id, photos_json],
        )?;

        let job = job_by_id_tx(&tx, job_id)?.ok_or(StoreError::UnknownJob { job_id })?;
        let photo_count = job.photos.len();

        tx.commit()?;
        Ok(JobAddPhotoResult { job, photo_count })
    }

    pub fn jobs_status_counts(&self) -> Result<JobsStatusCounts, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
              COALESCE(SUM(CASE WHEN status='pending' THEN 1 ELSE 0 END), 0) AS pending,
              COALESCE(SUM(CASE WHEN status='in_progress' THEN 1 ELSE 0 END), 0) AS in_progress,
              COALESCE(SUM(CASE WHEN status='completed' THEN 1 ELSE 0 END), 0) AS completed
            FROM jobs
            "#,
        )?;
        let (pending, in_progress, completed) = stmt.query_row([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        Ok(JobsStatusCounts {
            pending: pending.max(0) as u64,
            in_progress: in_progress.max(0) as u64,
            completed: completed.max(0) as u64,
        })
    }

    /// The daily reclaim: completed jobs scheduled for `today` (or not
    /// scheduled at all) go back to pending with every lifecycle field
    /// cleared, so the site becomes assignable again. Returns rows affected;
    /// running it twice in a row is a no-op the second time.
    pub fn jobs_reset_completed(&mut self, today: &str) -> Result<usize, StoreError> {
        let today = normalize_date(today)?;

        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            r#"
            UPDATE jobs
            SET status='pending', assigned_to=NULL, start_time_ms=NULL, finish_time_ms=NULL
            WHERE status='completed'
              AND (scheduled_date IS NULL OR scheduled_date=?1)
            "#,
            params![today],
        )?;
        tx.commit()?;
        Ok(changed)
    }
}
