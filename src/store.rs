use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    GoalFile, LearningGoals, StudentResponse, GOAL_SLOTS, MAX_LEVEL, MAX_STUDENT_NUM, MIN_LEVEL,
    MIN_STUDENT_NUM,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored value exists but could not be read, e.g. it is not UTF-8.
    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored value exists but is not valid JSON for its shape.
    #[error("stored data for '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid response: {0}")]
    InvalidShape(String),
}

/// Whole-value storage keyed by string. Writes replace the previous value.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored file");
                Ok(None)
            }
            Err(source) => {
                warn!(path = %path.display(), error = %source, "stored file is unreadable");
                Err(StoreError::Read {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(self.path_for(key), value).map_err(io_err)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn responses_key(date: NaiveDate) -> String {
    format!("responses_{}.json", date.format("%Y-%m-%d"))
}

pub fn goals_key(date: NaiveDate) -> String {
    format!("goals_{}.json", date.format("%Y-%m-%d"))
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Per-date response lists. Every append rewrites the full list.
pub struct ResponseStore<S> {
    store: S,
}

impl<S: KeyValueStore> ResponseStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load_for_date(&self, date: NaiveDate) -> Result<Vec<StudentResponse>, StoreError> {
        let key = responses_key(date);
        match self.store.get(&key)? {
            Some(raw) => decode(&key, &raw),
            None => Ok(Vec::new()),
        }
    }

    pub fn append(&mut self, response: StudentResponse) -> Result<usize, StoreError> {
        check_shape(&response)?;

        let key = responses_key(response.date);
        let mut responses = self.load_for_date(response.date)?;
        responses.push(response);
        self.store.put(&key, &encode(&key, &responses)?)?;

        info!(key = %key, total = responses.len(), "response stored");
        Ok(responses.len())
    }
}

fn check_shape(response: &StudentResponse) -> Result<(), StoreError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&response.understanding_level) {
        return Err(StoreError::InvalidShape(format!(
            "understanding level {} is outside {MIN_LEVEL}..={MAX_LEVEL}",
            response.understanding_level
        )));
    }
    if !(MIN_STUDENT_NUM..=MAX_STUDENT_NUM).contains(&response.student_num) {
        return Err(StoreError::InvalidShape(format!(
            "student number {} is outside {MIN_STUDENT_NUM}..={MAX_STUDENT_NUM}",
            response.student_num
        )));
    }
    if response.goal_checks.len() > GOAL_SLOTS {
        return Err(StoreError::InvalidShape(format!(
            "{} goal checks exceed the {GOAL_SLOTS} goal slots",
            response.goal_checks.len()
        )));
    }
    Ok(())
}

pub struct GoalRegistry<S> {
    store: S,
}

impl<S: KeyValueStore> GoalRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Missing goals load as five empty slots.
    pub fn load_goals(&self, date: NaiveDate) -> Result<LearningGoals, StoreError> {
        let key = goals_key(date);
        match self.store.get(&key)? {
            Some(raw) => {
                let file: GoalFile = decode(&key, &raw)?;
                if file.date != date {
                    warn!(key = %key, stored = %file.date, "goal file date does not match its key");
                }
                Ok(LearningGoals::from_slots(file.goals))
            }
            None => Ok(LearningGoals::empty()),
        }
    }

    pub fn save_goals(&mut self, date: NaiveDate, goals: &LearningGoals) -> Result<(), StoreError> {
        let key = goals_key(date);
        let file = GoalFile {
            date,
            goals: goals.slots().to_vec(),
        };
        self.store.put(&key, &encode(&key, &file)?)?;
        info!(key = %key, active = goals.active_count(), "learning goals saved");
        Ok(())
    }

    pub fn reset_goals(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        self.save_goals(date, &LearningGoals::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassName, HelpTopic};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    fn sample_response(student_num: u8, level: u8) -> StudentResponse {
        StudentResponse {
            timestamp: date().and_hms_opt(10, 30, 0).unwrap(),
            date: date(),
            class: ClassName::Class3,
            student_num,
            goal_checks: vec![true, false],
            understanding_level: level,
            difficult_part: Some("비유 표현".to_string()),
            help_needed: HelpTopic::Concept,
        }
    }

    #[test]
    fn missing_date_loads_empty() {
        let responses = ResponseStore::new(MemoryStore::default());
        assert!(responses.load_for_date(date()).unwrap().is_empty());

        let goals = GoalRegistry::new(MemoryStore::default());
        assert_eq!(goals.load_goals(date()).unwrap(), LearningGoals::empty());
    }

    #[test]
    fn append_keeps_order_and_duplicates() {
        let mut responses = ResponseStore::new(MemoryStore::default());
        responses.append(sample_response(5, 3)).unwrap();
        responses.append(sample_response(5, 4)).unwrap();
        let total = responses.append(sample_response(2, 1)).unwrap();

        let loaded = responses.load_for_date(date()).unwrap();
        assert_eq!(total, 3);
        let levels: Vec<u8> = loaded.iter().map(|r| r.understanding_level).collect();
        assert_eq!(levels, vec![3, 4, 1]);
    }

    #[test]
    fn append_rejects_bad_shapes() {
        let mut responses = ResponseStore::new(MemoryStore::default());
        assert!(matches!(
            responses.append(sample_response(5, 0)),
            Err(StoreError::InvalidShape(_))
        ));
        assert!(matches!(
            responses.append(sample_response(41, 3)),
            Err(StoreError::InvalidShape(_))
        ));

        let mut too_many = sample_response(5, 3);
        too_many.goal_checks = vec![true; GOAL_SLOTS + 1];
        assert!(matches!(
            responses.append(too_many),
            Err(StoreError::InvalidShape(_))
        ));
        assert!(responses.load_for_date(date()).unwrap().is_empty());
    }

    #[test]
    fn corrupt_json_is_reported() {
        let mut kv = MemoryStore::default();
        kv.put(&responses_key(date()), "[{not json").unwrap();
        let responses = ResponseStore::new(kv);

        match responses.load_for_date(date()) {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, "responses_2025-03-04.json"),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn absent_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let responses = ResponseStore::new(FileStore::new(dir.path().join("not-created-yet")));
        assert!(responses.load_for_date(date()).unwrap().is_empty());
    }

    #[test]
    fn unreadable_file_is_reported_and_left_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responses_2025-03-04.json");
        let bytes: &[u8] = b"[{\"class\":\"\xff\xfe\"}]";
        std::fs::write(&path, bytes).unwrap();

        let mut responses = ResponseStore::new(FileStore::new(dir.path()));
        assert!(matches!(
            responses.load_for_date(date()),
            Err(StoreError::Read { .. })
        ));
        assert!(matches!(
            responses.append(sample_response(3, 4)),
            Err(StoreError::Read { .. })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn goals_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let mut registry = GoalRegistry::new(FileStore::new(dir.path()));
        let goals = LearningGoals::from_labels(["화자 파악", "정서 파악"]).unwrap();

        registry.save_goals(date(), &goals).unwrap();
        assert!(dir.path().join("goals_2025-03-04.json").exists());
        assert_eq!(registry.load_goals(date()).unwrap(), goals);

        registry.reset_goals(date()).unwrap();
        assert_eq!(registry.load_goals(date()).unwrap().active_count(), 0);
    }

    #[test]
    fn responses_persist_as_json_array() {
        let dir = TempDir::new().unwrap();
        let mut responses = ResponseStore::new(FileStore::new(dir.path()));
        responses.append(sample_response(12, 5)).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("responses_2025-03-04.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["student_num"], 12);
        assert_eq!(value[0]["class"], "3반");
        assert_eq!(value[0]["help_needed"], "개념 이해");

        let reopened = ResponseStore::new(FileStore::new(dir.path()));
        assert_eq!(reopened.load_for_date(date()).unwrap().len(), 1);
    }

    #[test]
    fn other_dates_are_kept_apart() {
        let mut responses = ResponseStore::new(MemoryStore::default());
        responses.append(sample_response(1, 3)).unwrap();
        let next_day = date().succ_opt().unwrap();
        assert!(responses.load_for_date(next_day).unwrap().is_empty());
    }
}
