//! Persistence collaborator
//!
//! Everything that belongs to one user is kept as a single `UserSnapshot`
//! keyed by user id. Implementations only need whole-snapshot `load` and
//! `save`; the per-item accessors are provided on top of them.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, CoreResult};
use crate::types::{LearningEvent, TestResult, UserAchievement, UserProgress, UserSettings};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub progress: UserProgress,
    pub settings: UserSettings,
    #[serde(default)]
    pub events: Vec<LearningEvent>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub achievements: Vec<UserAchievement>,
}

impl UserSnapshot {
    pub fn new(user_id: &str) -> Self {
        Self {
            progress: UserProgress::new(user_id),
            settings: UserSettings::new(user_id),
            events: Vec::new(),
            test_results: Vec::new(),
            achievements: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.progress.user_id
    }
}

pub trait ProgressStore {
    fn load(&self, user_id: &str) -> CoreResult<Option<UserSnapshot>>;

    fn save(&mut self, snapshot: &UserSnapshot) -> CoreResult<()>;

    fn load_progress(&self, user_id: &str) -> CoreResult<Option<UserProgress>> {
        Ok(self.load(user_id)?.map(|s| s.progress))
    }

    fn load_settings(&self, user_id: &str) -> CoreResult<Option<UserSettings>> {
        Ok(self.load(user_id)?.map(|s| s.settings))
    }

    fn load_events(&self, user_id: &str) -> CoreResult<Vec<LearningEvent>> {
        Ok(self.load(user_id)?.map(|s| s.events).unwrap_or_default())
    }

    fn load_achievements(&self, user_id: &str) -> CoreResult<Vec<UserAchievement>> {
        Ok(self.load(user_id)?.map(|s| s.achievements).unwrap_or_default())
    }

    fn save_progress(&mut self, progress: &UserProgress) -> CoreResult<()> {
        let mut snapshot = self.load_or_new(&progress.user_id)?;
        snapshot.progress = progress.clone();
        self.save(&snapshot)
    }

    fn save_settings(&mut self, settings: &UserSettings) -> CoreResult<()> {
        let mut snapshot = self.load_or_new(&settings.user_id)?;
        snapshot.settings = settings.clone();
        self.save(&snapshot)
    }

    fn save_events(&mut self, user_id: &str, events: &[LearningEvent]) -> CoreResult<()> {
        let mut snapshot = self.load_or_new(user_id)?;
        snapshot.events = events.to_vec();
        self.save(&snapshot)
    }

    fn save_achievements(&mut self, user_id: &str, achievements: &[UserAchievement]) -> CoreResult<()> {
        let mut snapshot = self.load_or_new(user_id)?;
        snapshot.achievements = achievements.to_vec();
        self.save(&snapshot)
    }

    fn load_or_new(&self, user_id: &str) -> CoreResult<UserSnapshot> {
        Ok(self
            .load(user_id)?
            .unwrap_or_else(|| UserSnapshot::new(user_id)))
    }
}

// ==================== In-memory ====================

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: HashMap<String, UserSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, user_id: &str) -> CoreResult<Option<UserSnapshot>> {
        Ok(self.users.get(user_id).cloned())
    }

    fn save(&mut self, snapshot: &UserSnapshot) -> CoreResult<()> {
        self.users
            .insert(snapshot.user_id().to_string(), snapshot.clone());
        Ok(())
    }
}

// ==================== JSON files ====================

/// One `<user_id>.json` document per user under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &str) -> CoreResult<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CoreError::InvalidKey(user_id.to_string()));
        }
        Ok(self.dir.join(format!("{user_id}.json")))
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self, user_id: &str) -> CoreResult<Option<UserSnapshot>> {
        let path = self.path_for(user_id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(snapshot))
    }

    /// Write to a temp file in the same directory, then rename over the
    /// target so readers never see a partial document.
    fn save(&mut self, snapshot: &UserSnapshot) -> CoreResult<()> {
        let path = self.path_for(snapshot.user_id())?;
        let temp_file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
        }
        temp_file.persist(&path).map_err(|e| e.error)?;
        tracing::debug!(
            user_id = snapshot.user_id(),
            events = snapshot.events.len(),
            path = %path.display(),
            "snapshot saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LearningAction;
    use chrono::{TimeZone, Utc};

    fn snapshot_with_event(user: &str) -> UserSnapshot {
        let mut snapshot = UserSnapshot::new(user);
        snapshot.progress.learned_words.insert("2".into());
        snapshot.events.push(LearningEvent::new(
            "2",
            user,
            LearningAction::Learned,
            true,
            8,
            1,
            Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        ));
        snapshot
    }

    #[test]
    fn test_memory_store_per_item() {
        let mut store = MemoryStore::new();
        assert!(store.load_progress("u").unwrap().is_none());
        assert!(store.load_events("u").unwrap().is_empty());

        let mut settings = UserSettings::new("u");
        settings.daily_goal = 35;
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings("u").unwrap().unwrap().daily_goal, 35);
        assert_eq!(store.load_progress("u").unwrap().unwrap().current_level, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_with_event("alice");
        {
            let mut store = JsonFileStore::new(dir.path()).unwrap();
            store.save(&snapshot).unwrap();
        }
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(store.load("alice").unwrap(), Some(snapshot));
        assert!(store.load("bob").unwrap().is_none());
        assert!(dir.path().join("alice.json").exists());
    }

    #[test]
    fn test_json_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();
        store.save(&snapshot_with_event("u1")).unwrap();

        let mut progress = UserProgress::new("u1");
        progress.total_exp = 70;
        store.save_progress(&progress).unwrap();

        let loaded = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded.progress.total_exp, 70);
        assert_eq!(loaded.events.len(), 1);
    }

    #[test]
    fn test_json_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("../etc"), Err(CoreError::InvalidKey(_))));
        assert!(store.load("").is_err());
    }

    #[test]
    fn test_json_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("u.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("u"), Err(CoreError::Serialization(_))));
    }
}
