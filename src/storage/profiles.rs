//! Faculty pool, candidate profiles, users, and headshot files.

use std::fs;

use jiff::Timestamp;
use rusqlite::OptionalExtension;
use tracing::debug;
use uuid::Uuid;

use crate::backend::HeadshotFile;
use crate::model::{CurrentUser, FacultyMember, ProfilePayload};

use super::{Result, Storage, StorageError};

/// Largest headshot the server keeps.
const MAX_STORED_HEADSHOT: usize = 5 * 1024 * 1024;

impl Storage {
    // ── Faculty ──

    /// Imports faculty members, replacing any with the same id.
    /// Returns how many were imported.
    pub fn import_faculty(&self, members: &[FacultyMember]) -> Result<usize> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        for m in members {
            tx.execute(
                "INSERT INTO faculty (id, first_name, last_name, email, room_number)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (id) DO UPDATE
                 SET first_name = excluded.first_name, last_name = excluded.last_name,
                     email = excluded.email, room_number = excluded.room_number",
                rusqlite::params![m.id, &m.first_name, &m.last_name, &m.email, &m.room_number],
            )?;
        }
        tx.commit()?;
        Ok(members.len())
    }

    /// Lists faculty available for meetings, ordered by last name.
    pub fn list_faculty(&self) -> Result<Vec<FacultyMember>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, email, room_number FROM faculty
             WHERE available = 1 ORDER BY last_name, first_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FacultyMember {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                room_number: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── Users ──

    /// The acting user, registered on first sight.
    pub fn current_user(&self) -> Result<CurrentUser> {
        let email = self.user()?;
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO user (email) VALUES (?1) ON CONFLICT (email) DO NOTHING",
            [email],
        )?;
        let (id, first_name, last_name, has_completed_setup) = conn.query_row(
            "SELECT id, first_name, last_name, has_completed_setup FROM user WHERE email = ?1",
            [email],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            },
        )?;
        Ok(CurrentUser {
            id,
            email: email.to_string(),
            first_name,
            last_name,
            has_completed_setup,
        })
    }

    /// Flags the acting user's setup as complete.
    pub fn mark_setup_complete(&self) -> Result<()> {
        let email = self.user()?;
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO user (email, has_completed_setup) VALUES (?1, 1)
             ON CONFLICT (email) DO UPDATE SET has_completed_setup = 1",
            [email],
        )?;
        Ok(())
    }

    // ── Profiles ──

    /// Stores the acting user's completed profile and updates their name.
    pub fn save_profile(&self, profile: &ProfilePayload) -> Result<()> {
        let email = self.user()?;
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO profile (user, payload, completed_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user) DO UPDATE
             SET payload = excluded.payload, completed_at = excluded.completed_at",
            rusqlite::params![
                email,
                serde_json::to_string(profile)?,
                Timestamp::now().to_string()
            ],
        )?;
        conn.execute(
            "INSERT INTO user (email, first_name, last_name, has_completed_setup)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT (email) DO UPDATE
             SET first_name = excluded.first_name, last_name = excluded.last_name,
                 has_completed_setup = 1",
            rusqlite::params![email, &profile.first_name, &profile.last_name],
        )?;
        debug!(user = %email, "profile stored");
        Ok(())
    }

    /// Loads the acting user's stored profile, if any.
    pub fn load_profile(&self) -> Result<Option<ProfilePayload>> {
        let email = self.user()?;
        let conn = self.open_db()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT payload FROM profile WHERE user = ?1",
                [email],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| {
            serde_json::from_str(&j)
                .map_err(|e| StorageError::Corrupt(format!("profile for {email}: {e}")))
        })
        .transpose()
    }

    // ── Headshots ──

    /// Copies a headshot under the storage root and returns its `file://` URL.
    pub fn save_headshot(&self, file: &HeadshotFile) -> Result<String> {
        self.user()?;
        if file.bytes.is_empty() {
            return Err(StorageError::Rejected("No headshot file provided".into()));
        }
        if !file.content_type.starts_with("image/") {
            return Err(StorageError::Rejected("File must be an image".into()));
        }
        if file.size() > MAX_STORED_HEADSHOT {
            return Err(StorageError::Rejected(
                "File size must be less than 5MB".into(),
            ));
        }

        let dir = self.headshot_dir();
        fs::create_dir_all(&dir)?;
        let ext = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "img".into());
        let path = dir.join(format!("{}.{ext}", Uuid::new_v4()));
        fs::write(&path, &file.bytes)?;
        let path = fs::canonicalize(&path)?;
        Ok(format!("file://{}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{ExtraTours, Permission};
    use crate::storage::test_support::test_storage;

    fn member(id: u64, first: &str, last: &str) -> FacultyMember {
        FacultyMember {
            id,
            first_name: first.into(),
            last_name: last.into(),
            email: format!("{}@example.edu", first.to_lowercase()),
            room_number: Some("B12".into()),
        }
    }

    fn profile() -> ProfilePayload {
        ProfilePayload {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            current_title: "Postdoc".into(),
            current_department: "Math".into(),
            current_institution: "Analytical U".into(),
            research_interests: "Engines".into(),
            cell_number: "555".into(),
            travel_assistance: None,
            passport_name: "Ada Lovelace".into(),
            date_of_birth: Some("1990-04-01".into()),
            country_of_residence: "UK".into(),
            gender: None,
            gender_custom: None,
            preferred_airport: "LHR".into(),
            frequent_flyer_info: String::new(),
            known_traveler_number: String::new(),
            talk_title: "Notes".into(),
            talk_abstract: "On engines.".into(),
            biography: "Bio".into(),
            headshot_url: None,
            videotape_permission: Permission::Yes,
            advertisement_permission: Permission::No,
            extra_tours: ExtraTours::CampusTour,
            food_preferences: vec![],
            dietary_restrictions: vec![],
            preferred_faculty: vec![2],
            preferred_visit_dates: vec![],
        }
    }

    #[test]
    fn import_and_list_faculty_sorted_by_last_name() {
        let (_dir, storage) = test_storage();
        let count = storage
            .import_faculty(&[member(1, "Grace", "Hopper"), member(2, "Alan", "Babbage")])
            .unwrap();
        assert_eq!(count, 2);

        let names: Vec<_> = storage
            .list_faculty()
            .unwrap()
            .iter()
            .map(FacultyMember::display_name)
            .collect();
        assert_eq!(names, vec!["Alan Babbage", "Grace Hopper"]);
    }

    #[test]
    fn unknown_user_is_registered_without_setup() {
        let (_dir, storage) = test_storage();
        let user = storage.current_user().unwrap();
        assert_eq!(user.email, "ada@example.edu");
        assert!(!user.has_completed_setup);

        storage.mark_setup_complete().unwrap();
        assert!(storage.current_user().unwrap().has_completed_setup);
    }

    #[test]
    fn saved_profile_updates_user() {
        let (_dir, storage) = test_storage();
        storage.save_profile(&profile()).unwrap();

        let user = storage.current_user().unwrap();
        assert_eq!(user.first_name, "Ada");
        assert!(user.has_completed_setup);
        assert_eq!(storage.load_profile().unwrap(), Some(profile()));
    }

    #[test]
    fn headshot_is_copied_under_root() {
        let (_dir, storage) = test_storage();
        let url = storage
            .save_headshot(&HeadshotFile {
                file_name: "me.PNG".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
                source_path: None,
            })
            .unwrap();

        let path = url.strip_prefix("file://").unwrap();
        assert!(path.ends_with(".png"));
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn non_image_headshot_is_rejected() {
        let (_dir, storage) = test_storage();
        let err = storage
            .save_headshot(&HeadshotFile {
                file_name: "cv.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: vec![1],
                source_path: None,
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "File must be an image");
    }
}
