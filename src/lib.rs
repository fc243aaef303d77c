//! tidywatch - keeps a folder tidy by sorting new files into category folders
//!
//! This library watches a single directory for newly created files, classifies
//! each by extension, and moves it into a category subfolder (Images,
//! Documents, ...) under the same directory, renaming on collision.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod watcher;

pub use config::{CompiledFilters, Settings};
pub use error::{ConfigError, OrganizeError, StartupError};
pub use file_category::{Category, CategoryTable, Classifier};
pub use file_organizer::{Organizer, Outcome, Placement, Skip};
pub use watcher::{DispatchStats, Dispatcher, DispatcherState};
