//! FiberPath Settings Crate
//!
//! Application configuration and the persisted recent-files list.

pub mod config;
pub mod error;
pub mod recent;

pub use config::{
    CliSettings, Config, FileSettings, ProjectSettings, RetrySettings, StreamSettings,
};
pub use error::{SettingsError, SettingsResult};
pub use recent::{RecentFileEntry, RecentFiles, DEFAULT_MAX_RECENT};
