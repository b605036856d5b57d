#![forbid(unsafe_code)]

use super::*;

impl SqliteStore {
    /// Page (1-based) of jobs with no assignee, ordered by id so repeated
    /// paging neither skips nor duplicates rows while no assignment runs.
    pub fn jobs_list_unassigned(
        &mut self,
        page: usize,
        page_size: usize,
    ) -> Result<JobsPage, StoreError> {
        if page == 0 {
            return Err(StoreError::InvalidInput("page starts at 1"));
        }
        let page_size = page_size.clamp(1, MAX_LIST_LIMIT);
        let offset = (page - 1).saturating_mul(page_size);

        let tx = self.conn.transaction()?;

        let mut jobs = Vec::<JobRow>::new();
        {
            let mut stmt = tx.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs \
                 WHERE assigned_to IS NULL \
                 ORDER BY id ASC \
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let mut rows = stmt.query(params![(page_size + 1) as i64, offset as i64])?;
            while let Some(row) = rows.next()? {
                jobs.push(finish_job_row(read_job_row(row)?)?);
            }
        }

        let has_more = jobs.len() > page_size;
        if has_more {
            jobs.truncate(page_size);
        }

        tx.commit()?;
        Ok(JobsPage { jobs, has_more })
    }

    /// Bulk-binds the selected jobs to one worker. Each job's multi-field
    /// update is applied in its own transaction (all of it or none of it);
    /// jobs succeed or fail independently, and ids that no longer exist are
    /// reported back rather than failing the batch.
    ///
    /// Already-assigned jobs are silently reassigned: `assigned_to` is not
    /// re-checked here, only at listing time, so two dispatchers racing over
    /// the same selection both succeed and the last write wins.
    pub fn jobs_assign(
        &mut self,
        request: JobsAssignRequest,
    ) -> Result<JobsAssignResult, StoreError> {
        if request.job_ids.is_empty() {
            return Err(StoreError::EmptySelection);
        }
        let scheduled_date = request
            .scheduled_date
            .as_deref()
            .map(normalize_date)
            .transpose()?;

        let mut assigned = Vec::<i64>::new();
        let mut missing = Vec::<i64>::new();

        for job_id in request.job_ids {
            let tx = self.conn.transaction()?;

            // Forcing status back to pending also clears the lifecycle
            // timestamps, so a reassigned completed job satisfies the
            // pending-means-no-finish-time invariant.
            let changed = if let Some(date) = scheduled_date.as_deref() {
                tx.execute(
                    "UPDATE jobs \
                     SET assigned_to=?2, status='pending', scheduled_date=?3, \
                         start_time_ms=NULL, finish_time_ms=NULL \
                     WHERE id=?1",
                    params![job_id, request.worker_id, date],
                )?
            } else {
                tx.execute(
                    "UPDATE jobs \
                     SET assigned_to=?2, status='pending', \
                         start_time_ms=NULL, finish_time_ms=NULL \
                     WHERE id=?1",
                    params![job_id, request.worker_id],
                )?
            };

            tx.commit()?;

            if changed == 1 {
                assigned.push(job_id);
            } else {
                missing.push(job_id);
            }
        }

        Ok(JobsAssignResult { assigned, missing })
    }

    /// Jobs on a worker's plate, optionally narrowed to one scheduled date.
    /// The employee dashboard hides completed jobs; the director view keeps
    /// them.
    pub fn jobs_for_worker(
        &mut self,
        request: JobsForWorkerRequest,
    ) -> Result<Vec<JobRow>, StoreError> {
        let scheduled_date = request
            .scheduled_date
            .as_deref()
            .map(normalize_date)
            .transpose()?;

        let tx = self.conn.transaction()?;

        let mut jobs = Vec::<JobRow>::new();
        {
            let mut stmt = tx.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs \
                 WHERE assigned_to=?1 \
                   AND (?2 IS NULL OR scheduled_date=?2) \
                   AND (?3 OR status<>'completed') \
                 ORDER BY id ASC"
            ))?;
            let mut rows = stmt.query(params![
                request.worker_id,
                scheduled_date.as_deref(),
                request.include_completed,
            ])?;
            while let Some(row) = rows.next()? {
                jobs.push(finish_job_row(read_job_row(row)?)?);
            }
        }

        tx.commit()?;
        Ok(jobs)
    }
}
