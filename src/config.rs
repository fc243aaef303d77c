//! Runtime settings and file exclusion rules.
//!
//! Settings are loaded from a TOML file. The category table itself is built in
//! and cannot be configured; this file only controls where to watch, where to
//! log, how long to wait for a file to settle, and which files to leave alone.
//!
//! # Configuration File Format
//!
//! ```toml
//! [watch]
//! root = "/home/me/Desktop"
//! settle_ms = 500
//! log_file = "/home/me/.local/share/tidywatch/tidywatch.log"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["~$*"]
//! extensions = ["crdownload", "part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::error::ConfigError;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".tidywatch.toml";

/// Top-level settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub watch: WatchSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// The `[watch]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Directory to watch. Defaults to the user's desktop.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Quiet period, in milliseconds, a new file must go without modification
    /// before it is organized. Zero organizes on arrival.
    #[serde(default)]
    pub settle_ms: u64,

    /// Log file path. Defaults to the local data directory.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl WatchSettings {
    /// The settle period as a [`Duration`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// The `[filters]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to organize hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "~$*").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot (e.g., "crdownload").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Default for ExcludeRules {
    // Files that are still being written or that the OS owns.
    fn default() -> Self {
        Self {
            filenames: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "desktop.ini".to_string(),
            ],
            patterns: vec!["~$*".to_string()],
            extensions: vec![
                "crdownload".to_string(),
                "part".to_string(),
                "partial".to_string(),
                "download".to_string(),
                "tmp".to_string(),
            ],
            regex: Vec::new(),
        }
    }
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tidywatch.toml` in the current directory
    /// 3. Look for `tidywatch/config.toml` in the user's config directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tidywatch").join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` if the text is not a valid settings file.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Compiled, optimized filter structures for file matching.
///
/// Patterns and regexes are validated once so a bad rule fails at startup,
/// not on the first matching file.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Compile filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Check if a file should be organized (not excluded).
    ///
    /// Only the file name is considered. Checks are performed in this order,
    /// with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches(&file_name)) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.exclude_patterns.iter().any(|p| p.matches(&file_name)) {
            return false;
        }

        if self.exclude_regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }

        true
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        // The default rules contain only literal, valid patterns.
        Self::new(&FilterRules::default()).unwrap_or_else(|_| Self::allow_all())
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with(exclude: ExcludeRules) -> FilterRules {
        FilterRules {
            enable_hidden_files: true,
            exclude,
            include: IncludeRules::default(),
        }
    }

    fn empty_exclude() -> ExcludeRules {
        ExcludeRules {
            filenames: Vec::new(),
            patterns: Vec::new(),
            extensions: Vec::new(),
            regex: Vec::new(),
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.watch.root.is_none());
        assert_eq!(settings.watch.settle(), Duration::ZERO);
        assert!(!settings.filters.enable_hidden_files);
    }

    #[test]
    fn test_parse_full_file() {
        let settings = Settings::from_toml(
            r#"
            [watch]
            root = "/tmp/desk"
            settle_ms = 750
            log_file = "/tmp/tw.log"

            [filters]
            enable_hidden_files = true

            [filters.exclude]
            extensions = ["bak"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.watch.root, Some(PathBuf::from("/tmp/desk")));
        assert_eq!(settings.watch.settle(), Duration::from_millis(750));
        assert_eq!(settings.watch.log_file, Some(PathBuf::from("/tmp/tw.log")));
        assert!(settings.filters.enable_hidden_files);
        assert_eq!(settings.filters.exclude.extensions, vec!["bak"]);
        assert!(settings.filters.exclude.filenames.is_empty());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.watch.settle_ms, 0);
        assert!(
            settings
                .filters
                .exclude
                .extensions
                .contains(&"crdownload".to_string())
        );
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Settings::from_toml("[watch\nroot = 1");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_missing_explicit_file_returns_error() {
        let result = Settings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_default_filters_skip_partial_downloads() {
        let compiled = CompiledFilters::default();

        assert!(!compiled.should_include(Path::new("/desk/movie.mp4.crdownload")));
        assert!(!compiled.should_include(Path::new("/desk/setup.exe.part")));
        assert!(!compiled.should_include(Path::new("/desk/~$report.docx")));
        assert!(!compiled.should_include(Path::new("/desk/Thumbs.db")));
        assert!(!compiled.should_include(Path::new("/desk/.DS_Store")));
        assert!(compiled.should_include(Path::new("/desk/report.docx")));
    }

    #[test]
    fn test_hidden_file_included_when_enabled() {
        let compiled = CompiledFilters::new(&rules_with(empty_exclude())).unwrap();
        assert!(compiled.should_include(Path::new(".bashrc")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            extensions: vec!["bak".to_string(), ".TMP".to_string()],
            ..empty_exclude()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_glob_matches_file_name_only() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            patterns: vec!["draft_*".to_string()],
            ..empty_exclude()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("/home/me/Desktop/draft_1.txt")));
        assert!(compiled.should_include(Path::new("/home/draft_dir/final.txt")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = CompiledFilters::new(&FilterRules {
            enable_hidden_files: false,
            exclude: empty_exclude(),
            include: IncludeRules {
                patterns: vec![".important".to_string()],
            },
        })
        .unwrap();

        assert!(compiled.should_include(Path::new(".important")));
        assert!(!compiled.should_include(Path::new(".other")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            regex: vec![r"^Screen Recording .*\.mov$".to_string()],
            ..empty_exclude()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("Screen Recording 2024-01-01.mov")));
        assert!(compiled.should_include(Path::new("holiday.mov")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = CompiledFilters::new(&rules_with(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..empty_exclude()
        }));
        assert!(matches!(
            bad_regex,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = CompiledFilters::new(&rules_with(ExcludeRules {
            patterns: vec!["[invalid".to_string()],
            ..empty_exclude()
        }));
        assert!(matches!(bad_glob, Err(ConfigError::InvalidGlobPattern(_))));
    }
}
