//! Most-recently-used `.wind` files
//!
//! Most recent first, unique by path, bounded, persisted as JSON.

use crate::config::Config;
use crate::error::SettingsResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default capacity of the list
pub const DEFAULT_MAX_RECENT: usize = 10;

/// Recent file entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFileEntry {
    pub path: PathBuf,
    /// File name for menus
    pub name: String,
    /// Last opened or saved, Unix seconds
    pub last_opened: u64,
}

impl RecentFileEntry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self {
            path,
            name,
            last_opened: now_secs(),
        }
    }

    /// Containing directory, for display next to the name
    pub fn directory(&self) -> String {
        self.path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Recent files list
#[derive(Debug, Clone)]
pub struct RecentFiles {
    /// Most recent first
    files: Vec<RecentFileEntry>,
    max_files: usize,
    persist_path: Option<PathBuf>,
}

impl RecentFiles {
    /// In-memory list holding at most `max_files` entries
    pub fn new(max_files: usize) -> Self {
        Self {
            files: Vec::new(),
            max_files: max_files.max(1),
            persist_path: None,
        }
    }

    /// List persisted at `path`, loaded immediately if the file exists
    pub fn open(path: impl Into<PathBuf>, max_files: usize) -> SettingsResult<Self> {
        let mut recent = Self::new(max_files);
        recent.persist_path = Some(path.into());
        recent.load()?;
        Ok(recent)
    }

    /// `<config dir>/fiberpath-studio/recent-files.json`
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(Config::config_dir()?.join("recent-files.json"))
    }

    /// Reload from the persist path; a missing file leaves the list as is
    pub fn load(&mut self) -> SettingsResult<()> {
        if let Some(path) = &self.persist_path {
            if path.exists() {
                let content = fs::read_to_string(path)?;
                self.files = serde_json::from_str(&content)?;
                self.dedup();
                self.files.truncate(self.max_files);
            }
        }
        Ok(())
    }

    /// Write to the persist path, if any
    pub fn save(&self) -> SettingsResult<()> {
        if let Some(path) = &self.persist_path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&self.files)?)?;
        }
        Ok(())
    }

    /// Put `path` at the front, dropping an older entry for it and the
    /// oldest entry past capacity
    pub fn add(&mut self, path: impl AsRef<Path>) -> SettingsResult<()> {
        let entry = RecentFileEntry::new(path);
        self.files.retain(|f| f.path != entry.path);
        self.files.insert(0, entry);
        self.files.truncate(self.max_files);
        tracing::debug!("Recent files: {}", self.files.len());
        self.save()
    }

    pub fn remove(&mut self, path: &Path) -> SettingsResult<()> {
        self.files.retain(|f| f.path != path);
        self.save()
    }

    pub fn clear(&mut self) -> SettingsResult<()> {
        self.files.clear();
        self.save()
    }

    pub fn list(&self) -> &[RecentFileEntry] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&RecentFileEntry> {
        self.files.get(index)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.files.retain(|f| seen.insert(f.path.clone()));
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECENT)
    }
}
