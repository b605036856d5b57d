#![forbid(unsafe_code)]

use super::*;

fn read_note_row(row: &rusqlite::Row<'_>) -> Result<NoteRow, rusqlite::Error> {
    Ok(NoteRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        author_role: row.get(4)?,
        note: row.get(5)?,
        photo_path: row.get(6)?,
        created_at_ms: row.get(7)?,
    })
}

impl SqliteStore {
    /// Appends one note. Notes are append-only: nothing ever updates or
    /// deletes a row, so the history of a job is the full notes trail.
    pub fn note_add(&mut self, request: NoteAddRequest) -> Result<NoteRow, StoreError> {
        let note = normalize_note_text(&request.note)?;
        let photo_path = request
            .photo_path
            .as_deref()
            .map(normalize_photo_path)
            .transpose()?;
        let author_name = request.author_name.trim();
        if author_name.is_empty() {
            return Err(StoreError::InvalidInput("author_name must not be empty"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_job_exists_tx(&tx, request.job_id)?;

        tx.execute(
            r#"
            INSERT INTO job_notes(job_id, author_id, author_name, author_role, note, photo_path, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                request.job_id,
                request.author_id,
                author_name,
                request.author_role,
                note,
                photo_path,
                now_ms,
            ],
        )?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(NoteRow {
            id,
            job_id: request.job_id,
            author_id: request.author_id,
            author_name: author_name.to_string(),
            author_role: request.author_role,
            note,
            photo_path,
            created_at_ms: now_ms,
        })
    }

    /// Newest-first notes trail for one job.
    pub fn notes_for_job(&mut self, job_id: i64, limit: usize) -> Result<Vec<NoteRow>, StoreError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);

        let tx = self.conn.transaction()?;
        ensure_job_exists_tx(&tx, job_id)?;

        let mut notes = Vec::<NoteRow>::new();
        {
            let mut stmt = tx.prepare(
                r#"
                SELECT id, job_id, author_id, author_name, author_role, note, photo_path, created_at_ms
                FROM job_notes
                WHERE job_id=?1
                ORDER BY created_at_ms DESC, id DESC
                LIMIT ?2
                "#,
            )?;
            let mut rows = stmt.query(params![job_id, limit as i64])?;
            while let Some(row) = rows.next()? {
                notes.push(read_note_row(row)?);
            }
        }

        tx.commit()?;
        Ok(notes)
    }
}
