//! # Birthday storage
//!
//! Saved birthdays and the theme preference live under two keys of a small
//! key-value store:
//!
//! ```text
//! <data dir>/
//! ├── nakshatraPathBirthdays   ← JSON array of SavedBirthday
//! └── nakshatraPathTheme       ← "light" | "dark" | "starry" | "glitter"
//! ```
//!
//! ## JSON Format
//!
//! ```json
//! [{"id":"5b0c…","name":"Ada","date":"1815-12-10","reminderEnabled":true,"reminderDays":7}]
//! ```
//!
//! Reads never fail: corrupt or unreadable values are logged and replaced by
//! an empty list / the default theme.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::age::simple_age;
use crate::countdown::{countdown_days, is_birthday_today};
use crate::error::StorageError;
use crate::svg::Theme;

pub const BIRTHDAY_STORAGE_KEY: &str = "nakshatraPathBirthdays";
pub const THEME_STORAGE_KEY: &str = "nakshatraPathTheme";

/// Reminder lead times offered to the user, in days.
pub const REMINDER_DAY_OPTIONS: [u32; 4] = [1, 3, 7, 14];
pub const DEFAULT_REMINDER_DAYS: u32 = 7;

/// Raw string storage behind the persistence gateway
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_directory: PathBuf,
}

impl FileStore {
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_directory.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No stored value at {:?}", path);
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_directory)?;

        // Atomic replace via temp file
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        debug!("Stored {} bytes at {:?}", value.len(), path);
        Ok(())
    }
}

/// In-process store
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBirthday {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub reminder_enabled: bool,
    pub reminder_days: u32,
}

impl SavedBirthday {
    pub fn age(&self, now: DateTime<Utc>) -> i32 {
        simple_age(self.date, now)
    }

    pub fn days_until(&self, now: DateTime<Utc>) -> i64 {
        countdown_days(self.date, now)
    }

    /// Days until the birthday is celebrated; 0 on the day itself.
    pub fn days_away(&self, now: DateTime<Utc>) -> i64 {
        if is_birthday_today(self.date, now) {
            0
        } else {
            self.days_until(now)
        }
    }

    /// "today", "in 1 day" or "in N days"
    pub fn days_away_label(&self, now: DateTime<Utc>) -> String {
        match self.days_away(now) {
            0 => "today".to_string(),
            1 => "in 1 day".to_string(),
            n => format!("in {n} days"),
        }
    }

    /// Reminder switched on and the birthday is today or within the lead time.
    pub fn is_reminder_active(&self, now: DateTime<Utc>) -> bool {
        self.reminder_enabled && self.days_away(now) <= i64::from(self.reminder_days)
    }
}

/// Partial update of a saved birthday; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct BirthdayUpdate {
    pub name: Option<String>,
    pub reminder_enabled: Option<bool>,
    pub reminder_days: Option<u32>,
}

/// Saved birthdays and theme preference on top of a key-value store
pub struct PersistenceGateway<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn saved_birthdays(&self) -> Vec<SavedBirthday> {
        let raw = match self.store.get(BIRTHDAY_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read saved birthdays: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to parse saved birthdays, starting empty: {e}");
                Vec::new()
            }
        }
    }

    pub fn save_birthdays(&self, birthdays: &[SavedBirthday]) -> Result<(), StorageError> {
        let result = serde_json::to_string(birthdays)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(BIRTHDAY_STORAGE_KEY, &json));

        if let Err(e) = &result {
            error!("Failed to save birthdays: {e}");
        }
        result
    }

    pub fn theme(&self) -> Theme {
        match self.store.get(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Unknown stored theme {:?}, using default", raw.trim());
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to read theme: {e}");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.store.set(THEME_STORAGE_KEY, theme.as_str())
    }

    pub fn add_birthday(
        &self,
        name: &str,
        date: NaiveDate,
        reminder_days: u32,
    ) -> Result<SavedBirthday, StorageError> {
        let birthday = SavedBirthday {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            date,
            reminder_enabled: true,
            reminder_days,
        };

        let mut birthdays = self.saved_birthdays();
        birthdays.push(birthday.clone());
        self.save_birthdays(&birthdays)?;

        info!("Saved birthday {} ({}) for {}", birthday.id, birthday.date, birthday.name);
        Ok(birthday)
    }

    pub fn update_birthday(&self, id: &str, update: BirthdayUpdate) -> Result<SavedBirthday, StorageError> {
        let mut birthdays = self.saved_birthdays();
        let entry = birthdays
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            entry.name = name;
        }
        if let Some(enabled) = update.reminder_enabled {
            entry.reminder_enabled = enabled;
        }
        if let Some(days) = update.reminder_days {
            entry.reminder_days = days;
        }
        let updated = entry.clone();

        self.save_birthdays(&birthdays)?;
        Ok(updated)
    }

    /// Returns whether anything was removed.
    pub fn delete_birthday(&self, id: &str) -> Result<bool, StorageError> {
        let mut birthdays = self.saved_birthdays();
        let before = birthdays.len();
        birthdays.retain(|b| b.id != id);

        if birthdays.len() == before {
            return Ok(false);
        }
        self.save_birthdays(&birthdays)?;
        info!("Deleted birthday {id}");
        Ok(true)
    }

    /// Saved birthdays whose reminder should fire at `now`, soonest first.
    pub fn reminders_due(&self, now: DateTime<Utc>) -> Vec<SavedBirthday> {
        let mut due: Vec<SavedBirthday> = self
            .saved_birthdays()
            .into_iter()
            .filter(|b| b.is_reminder_active(now))
            .collect();
        due.sort_by_key(|b| b.days_away(now));
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::new(MemoryStore::default())
    }

    #[test]
    fn test_empty_store_has_no_birthdays() {
        assert!(gateway().saved_birthdays().is_empty());
    }

    #[test]
    fn test_corrupt_json_degrades_to_empty() {
        let gateway = gateway();
        gateway.store.set(BIRTHDAY_STORAGE_KEY, "[{\"id\": oops").unwrap();
        assert!(gateway.saved_birthdays().is_empty());

        // A record with an impossible date is corruption too
        gateway
            .store
            .set(
                BIRTHDAY_STORAGE_KEY,
                r#"[{"id":"1","name":"A","date":"2023-02-30","reminderEnabled":true,"reminderDays":7}]"#,
            )
            .unwrap();
        assert!(gateway.saved_birthdays().is_empty());
    }

    #[test]
    fn test_reads_camel_case_records() {
        let gateway = gateway();
        gateway
            .store
            .set(
                BIRTHDAY_STORAGE_KEY,
                r#"[{"id":"abc","name":"Ada","date":"1815-12-10","reminderEnabled":false,"reminderDays":3}]"#,
            )
            .unwrap();

        let list = gateway.saved_birthdays();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].date, date(1815, 12, 10));
        assert!(!list[0].reminder_enabled);
        assert_eq!(list[0].reminder_days, 3);
    }

    #[test]
    fn test_add_update_delete() {
        let gateway = gateway();
        let ada = gateway.add_birthday(" Ada ", date(1815, 12, 10), 7).unwrap();
        let alan = gateway.add_birthday("Alan", date(1912, 6, 23), 3).unwrap();
        assert_ne!(ada.id, alan.id);
        assert_eq!(ada.name, "Ada");
        assert!(ada.reminder_enabled);

        let updated = gateway
            .update_birthday(
                &alan.id,
                BirthdayUpdate {
                    reminder_enabled: Some(false),
                    reminder_days: Some(14),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.reminder_enabled);
        assert_eq!(updated.reminder_days, 14);
        assert_eq!(updated.name, "Alan");
        assert_eq!(gateway.saved_birthdays()[1], updated);

        assert!(gateway.delete_birthday(&ada.id).unwrap());
        assert!(!gateway.delete_birthday(&ada.id).unwrap());
        assert_eq!(gateway.saved_birthdays(), vec![updated]);
    }

    #[test]
    fn test_update_unknown_id() {
        let err = gateway()
            .update_birthday("missing", BirthdayUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_theme_defaults_and_round_trips() {
        let gateway = gateway();
        assert_eq!(gateway.theme(), Theme::Glitter);

        gateway.save_theme(Theme::Starry).unwrap();
        assert_eq!(gateway.theme(), Theme::Starry);

        gateway.store.set(THEME_STORAGE_KEY, "neon").unwrap();
        assert_eq!(gateway.theme(), Theme::Glitter);
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let temp_dir = TempDir::new().unwrap();
        let first = PersistenceGateway::new(FileStore::new(temp_dir.path().join("data")));
        let saved = first.add_birthday("Grace", date(1906, 12, 9), 1).unwrap();
        first.save_theme(Theme::Dark).unwrap();

        let second = PersistenceGateway::new(FileStore::new(temp_dir.path().join("data")));
        assert_eq!(second.saved_birthdays(), vec![saved]);
        assert_eq!(second.theme(), Theme::Dark);
        assert!(!temp_dir.path().join("data").join("nakshatraPathBirthdays.tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(BIRTHDAY_STORAGE_KEY), "{{{").unwrap();
        let gateway = PersistenceGateway::new(FileStore::new(temp_dir.path()));
        assert!(gateway.saved_birthdays().is_empty());
    }

    #[test]
    fn test_reminders() {
        let gateway = gateway();
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();

        let soon = gateway.add_birthday("Soon", date(1990, 6, 13), 3).unwrap();
        let far = gateway.add_birthday("Far", date(1990, 6, 30), 7).unwrap();
        let today = gateway.add_birthday("Today", date(1990, 6, 10), 1).unwrap();
        let muted = gateway.add_birthday("Muted", date(1990, 6, 11), 7).unwrap();
        gateway
            .update_birthday(
                &muted.id,
                BirthdayUpdate {
                    reminder_enabled: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(soon.is_reminder_active(now));
        assert!(!far.is_reminder_active(now));
        assert!(today.is_reminder_active(now));
        assert_eq!(today.days_until(now), 365);
        assert_eq!(today.days_away(now), 0);
        assert_eq!(today.days_away_label(now), "today");
        assert_eq!(soon.days_away(now), 3);
        assert_eq!(soon.days_away_label(now), "in 3 days");
        assert_eq!(soon.age(now), 33);

        let due: Vec<String> = gateway.reminders_due(now).into_iter().map(|b| b.name).collect();
        assert_eq!(due, ["Today", "Soon"]);
    }

    #[test]
    fn test_birthday_today_sorts_before_upcoming() {
        let gateway = gateway();
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        gateway.add_birthday("InTwoWeeks", date(1990, 6, 24), 14).unwrap();
        gateway.add_birthday("Today", date(1990, 6, 10), 14).unwrap();

        let due: Vec<(String, i64)> = gateway
            .reminders_due(now)
            .into_iter()
            .map(|b| {
                let days = b.days_away(now);
                (b.name, days)
            })
            .collect();
        assert_eq!(due, [("Today".to_string(), 0), ("InTwoWeeks".to_string(), 14)]);
    }
}
