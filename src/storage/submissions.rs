//! Submission storage, with the server-side rules the REST API enforces.

use std::collections::BTreeMap;

use jiff::Timestamp;
use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;

use crate::model::{
    AnswerValue, FieldId, FormDescriptor, FormId, FormVersion, SubmissionPayload, SubmissionRecord,
};
use crate::validate::validate_form;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Stores a submission by the acting user.
    ///
    /// The form's current fields are snapshotted alongside the answers so the
    /// submission can be replayed after the form changes.
    pub fn save_submission(&self, payload: &SubmissionPayload) -> Result<SubmissionRecord> {
        let user = self.user()?;
        let form = self.load_form(payload.form)?;
        let answers = payload.answers_json();
        check_answers(&form, &answers)?;

        let conn = self.open_db()?;
        if payload.is_completed && has_completed(&conn, payload.form, user)? {
            return Err(StorageError::AlreadySubmitted);
        }

        let version = form.version();
        let now = Timestamp::now();
        conn.execute(
            "INSERT INTO submission
                 (form_id, user, answers, form_version, is_completed, submitted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![
                payload.form.0,
                user,
                serde_json::to_string(&answers)?,
                serde_json::to_string(&version)?,
                payload.is_completed,
                now.to_string(),
            ],
        )?;
        let id = u64::try_from(conn.last_insert_rowid())
            .map_err(|e| StorageError::Corrupt(format!("submission id: {e}")))?;
        debug!(form = %payload.form, %user, id, "submission stored");

        Ok(SubmissionRecord {
            id: Some(id),
            form: payload.form,
            answers,
            is_completed: payload.is_completed,
            submitted_at: Some(now),
            updated_at: Some(now),
            form_version: version,
        })
    }

    /// Lists the acting user's submissions for a form, oldest first.
    pub fn submissions_for(&self, form: FormId) -> Result<Vec<SubmissionRecord>> {
        let user = self.user()?;
        let conn = self.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, answers, form_version, is_completed, submitted_at, updated_at
             FROM submission WHERE form_id = ?1 AND user = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(rusqlite::params![form.0, user], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, answers, version, is_completed, submitted_at, updated_at) = row?;
            records.push(SubmissionRecord {
                id: Some(id),
                form,
                answers: serde_json::from_str(&answers)
                    .map_err(|e| StorageError::Corrupt(format!("submission {id} answers: {e}")))?,
                is_completed,
                submitted_at: Some(parse_timestamp(&submitted_at)?),
                updated_at: Some(parse_timestamp(&updated_at)?),
                form_version: serde_json::from_str::<FormVersion>(&version)
                    .map_err(|e| StorageError::Corrupt(format!("submission {id} version: {e}")))?,
            });
        }
        Ok(records)
    }
}

fn has_completed(conn: &Connection, form: FormId, user: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM submission WHERE form_id = ?1 AND user = ?2 AND is_completed = 1",
        rusqlite::params![form.0, user],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Re-check the answers the way the API does: typed against the form's
/// current fields, first failure wins.
fn check_answers(form: &FormDescriptor, answers: &BTreeMap<String, Value>) -> Result<()> {
    let typed: BTreeMap<FieldId, AnswerValue> = form
        .fields
        .iter()
        .filter_map(|f| {
            let raw = answers.get(f.id.as_str())?;
            Some((f.id.clone(), AnswerValue::hydrate(&f.kind, raw)))
        })
        .collect();

    let errors = validate_form(&form.fields, &typed);
    let first = form.fields.iter().find_map(|f| errors.get(&f.id));
    match first {
        Some(error) => Err(StorageError::Rejected(error.message.clone())),
        None => Ok(()),
    }
}

fn parse_timestamp(s: &str) -> Result<Timestamp> {
    s.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
}
