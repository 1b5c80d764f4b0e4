//! Durable per-lesson progress and platform preference.
//!
//! Two entries live in a key/value backend: `progress`, a JSON object of
//! lesson id to status, and `platform`, the plain platform name. Both are
//! read once when the store opens and rewritten after every change.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PsychoError, Result};
use crate::platform::Platform;

/// Key of the progress map.
pub const PROGRESS_KEY: &str = "progress";

/// Key of the platform preference.
pub const PLATFORM_KEY: &str = "platform";

// ============================================================================
// LessonStatus
// ============================================================================

/// Feedback a student gave for a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonStatus {
    /// The student understood the lesson.
    #[serde(rename = "completed")]
    Completed,
    /// The student asked for a simpler explanation.
    #[serde(rename = "reinforcement")]
    NeedsReinforcement,
    /// The student wants to come back later.
    #[serde(rename = "review")]
    ReviewLater,
}

impl LessonStatus {
    /// Spanish badge shown next to a lesson.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Completed => "✓ Completada",
            Self::NeedsReinforcement => "⚠ Refuerzo",
            Self::ReviewLater => "↺ Repasar",
        }
    }

    /// Stored wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NeedsReinforcement => "reinforcement",
            Self::ReviewLater => "review",
        }
    }
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Backends
// ============================================================================

/// String key/value storage behind a [`ProgressStore`].
pub trait KeyValueBackend: Send + Sync {
    /// Reads a value; `Ok(None)` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces a value.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as a file inside a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Uses `dir` for state files; it is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, value))
            .map_err(|e| PsychoError::state_persist(&path, e.to_string()))
    }
}

/// In-memory backend; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the raw stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// ProgressStore
// ============================================================================

/// Lesson progress and platform preference with write-through persistence.
pub struct ProgressStore {
    backend: Box<dyn KeyValueBackend>,
    progress: BTreeMap<String, LessonStatus>,
    platform: Option<Platform>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("progress", &self.progress)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// Opens the store, loading both entries.
    ///
    /// Unreadable or corrupt entries are logged and treated as empty.
    pub fn open(backend: impl KeyValueBackend + 'static) -> Self {
        let progress = match backend.read(PROGRESS_KEY) {
            Ok(Some(raw)) => parse_progress(&raw),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read progress, starting empty");
                BTreeMap::new()
            }
        };

        let platform = match backend.read(PLATFORM_KEY) {
            Ok(Some(raw)) => raw
                .parse::<Platform>()
                .map_err(|_| warn!(value = %raw.trim(), "Ignoring unknown stored platform"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read platform preference");
                None
            }
        };

        debug!(lessons = progress.len(), ?platform, "Progress store opened");

        Self {
            backend: Box::new(backend),
            progress,
            platform,
        }
    }

    /// Status recorded for a lesson.
    #[must_use]
    pub fn status(&self, lesson_id: &str) -> Option<LessonStatus> {
        self.progress.get(lesson_id).copied()
    }

    /// All recorded statuses.
    #[must_use]
    pub const fn progress(&self) -> &BTreeMap<String, LessonStatus> {
        &self.progress
    }

    /// Number of lessons marked completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.progress
            .values()
            .filter(|status| **status == LessonStatus::Completed)
            .count()
    }

    /// Records a status and persists the whole map.
    ///
    /// The in-memory value is updated even if persisting fails.
    pub fn set_status(&mut self, lesson_id: &str, status: LessonStatus) -> Result<()> {
        self.progress.insert(lesson_id.to_string(), status);
        let json = serde_json::to_string(&self.progress)?;
        self.backend.write(PROGRESS_KEY, &json)
    }

    /// Selected platform, if any.
    #[must_use]
    pub const fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Records the platform and persists it.
    pub fn set_platform(&mut self, platform: Platform) -> Result<()> {
        self.platform = Some(platform);
        self.backend.write(PLATFORM_KEY, platform.name())
    }
}

/// Parses the stored map, skipping entries that are not a known status.
fn parse_progress(raw: &str) -> BTreeMap<String, LessonStatus> {
    let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Stored progress is corrupt, starting empty");
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(id, value)| {
            serde_json::from_value::<LessonStatus>(value)
                .ok()
                .map(|status| (id, status))
        })
        .collect()
}
