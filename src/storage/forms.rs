//! Form storage: import, load, and list form descriptors.

use jiff::Timestamp;
use rusqlite::OptionalExtension;

use crate::model::{FormDescriptor, FormId};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Imports a form descriptor, replacing any earlier import with the same id.
    pub fn import_form(&self, form: &FormDescriptor) -> Result<()> {
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO form (id, title, descriptor, imported_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE
             SET title = excluded.title, descriptor = excluded.descriptor,
                 imported_at = excluded.imported_at",
            rusqlite::params![
                form.id.0,
                &form.title,
                serde_json::to_string(form)?,
                Timestamp::now().to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads a single form descriptor.
    pub fn load_form(&self, id: FormId) -> Result<FormDescriptor> {
        let conn = self.open_db()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT descriptor FROM form WHERE id = ?1",
                [id.0],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or(StorageError::FormNotFound(id))?;
        serde_json::from_str(&json)
            .map_err(|e| StorageError::Corrupt(format!("form {id} descriptor: {e}")))
    }

    /// Lists all imported forms, ordered by id.
    pub fn list_forms(&self) -> Result<Vec<FormDescriptor>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare("SELECT id, descriptor FROM form ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut forms = Vec::new();
        for row in rows {
            let (id, json) = row?;
            let form = serde_json::from_str(&json)
                .map_err(|e| StorageError::Corrupt(format!("form {id} descriptor: {e}")))?;
            forms.push(form);
        }
        Ok(forms)
    }
}
