//! Population control configuration
//!
//! The file is TOML with kebab-case keys. Durations are written in seconds
//! and converted to ticks (20 per second). Every value is read on its own;
//! anything missing or invalid falls back to its documented default with a
//! warning, so loading never fails.

use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::core::types::{seconds_to_ticks, Tick, TICKS_PER_SECOND};
use crate::entity::category::EntityCategory;
use crate::notify::messages::MessageCatalog;
use crate::population::filter::FilterSet;

/// Default seconds between scheduled reductions
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
/// Default seconds before the first scheduled reduction
pub const DEFAULT_CLEANUP_DELAY_SECS: u64 = 60;
/// Default seconds between population samples
pub const DEFAULT_SAMPLING_INTERVAL_SECS: u64 = 30;
/// Default seconds before the first sample
pub const DEFAULT_SAMPLING_DELAY_SECS: u64 = 0;
/// Default filtered population above which a reduction runs immediately
pub const DEFAULT_POPULATION_CEILING: usize = 1000;

/// Immutable configuration snapshot
///
/// Replaced wholesale on reload; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Ticks between scheduled reductions (> 0)
    pub reduction_interval_ticks: Tick,

    /// Ticks before the first reduction after arming (>= 0)
    ///
    /// Also used when the reduction schedule is re-armed after a breach.
    pub reduction_delay_ticks: Tick,

    /// Ticks between population samples (> 0)
    ///
    /// This is the only rate limit on breach-triggered reductions.
    pub sampling_interval_ticks: Tick,

    /// Ticks before the first sample after arming (>= 0)
    pub sampling_delay_ticks: Tick,

    /// A sample strictly greater than this is a breach
    pub population_ceiling: usize,

    /// Categories eligible for sampling and removal
    pub filter: FilterSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reduction_interval_ticks: seconds_to_ticks(DEFAULT_CLEANUP_INTERVAL_SECS),
            reduction_delay_ticks: seconds_to_ticks(DEFAULT_CLEANUP_DELAY_SECS),
            sampling_interval_ticks: seconds_to_ticks(DEFAULT_SAMPLING_INTERVAL_SECS),
            sampling_delay_ticks: seconds_to_ticks(DEFAULT_SAMPLING_DELAY_SECS),
            population_ceiling: DEFAULT_POPULATION_CEILING,
            filter: EntityCategory::transient().iter().copied().collect(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line summary for startup and reload logs
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.filter.sorted().iter().map(|c| c.name()).collect();
        format!(
            "cleanup every {}s after {}s, sampling every {}s, ceiling {}, clearing [{}]",
            self.reduction_interval_ticks / TICKS_PER_SECOND,
            self.reduction_delay_ticks / TICKS_PER_SECOND,
            self.sampling_interval_ticks / TICKS_PER_SECOND,
            self.population_ceiling,
            names.join(", ")
        )
    }
}

/// Everything read from one configuration file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub messages: MessageCatalog,
}

/// Source of configuration snapshots, consulted only at start and reload
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> LoadedConfig;
}

/// Reads a TOML file on every load
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfig {
    fn load(&self) -> LoadedConfig {
        load_config(&self.path)
    }
}

/// Always returns the same snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub LoadedConfig);

impl ConfigProvider for StaticConfig {
    fn load(&self) -> LoadedConfig {
        self.0.clone()
    }
}

/// Load configuration from disk, falling back to defaults on any error
pub fn load_config(path: &Path) -> LoadedConfig {
    match read_config_table(path) {
        Ok(table) => config_from_table(&table),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not load config, using defaults");
            LoadedConfig::default()
        }
    }
}

/// Read and parse a config file without applying defaults
pub fn read_config_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.parse::<toml::Table>()?)
}

/// Parse configuration text, falling back to defaults field by field
pub fn parse_config(content: &str) -> LoadedConfig {
    match content.parse::<toml::Table>() {
        Ok(table) => config_from_table(&table),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid TOML in config, using defaults");
            LoadedConfig::default()
        }
    }
}

fn config_from_table(table: &toml::Table) -> LoadedConfig {
    let settings = Settings {
        reduction_interval_ticks: seconds_to_ticks(read_seconds(
            table,
            "cleanup-interval-seconds",
            DEFAULT_CLEANUP_INTERVAL_SECS,
            false,
        )),
        reduction_delay_ticks: seconds_to_ticks(read_seconds(
            table,
            "cleanup-delay-seconds",
            DEFAULT_CLEANUP_DELAY_SECS,
            true,
        )),
        sampling_interval_ticks: seconds_to_ticks(read_seconds(
            table,
            "sampling-interval-seconds",
            DEFAULT_SAMPLING_INTERVAL_SECS,
            false,
        )),
        sampling_delay_ticks: seconds_to_ticks(read_seconds(
            table,
            "sampling-delay-seconds",
            DEFAULT_SAMPLING_DELAY_SECS,
            true,
        )),
        population_ceiling: read_ceiling(table),
        filter: read_filter(table),
    };

    LoadedConfig {
        settings,
        messages: read_messages(table),
    }
}

fn read_seconds(table: &toml::Table, key: &str, default: u64, allow_zero: bool) -> u64 {
    let Some(value) = table.get(key) else {
        return default;
    };
    let min = if allow_zero { 0 } else { 1 };
    match value.as_integer() {
        Some(secs) if secs >= min => secs as u64,
        _ => {
            tracing::warn!(key, value = %value, default, "Invalid value in config, using default");
            default
        }
    }
}

fn read_ceiling(table: &toml::Table) -> usize {
    let key = "max-entities-before-cleanup";
    let Some(value) = table.get(key) else {
        return DEFAULT_POPULATION_CEILING;
    };
    match value.as_integer() {
        Some(ceiling) if ceiling >= 0 => ceiling as usize,
        _ => {
            tracing::warn!(
                key,
                value = %value,
                default = DEFAULT_POPULATION_CEILING,
                "Invalid value in config, using default"
            );
            DEFAULT_POPULATION_CEILING
        }
    }
}

fn read_filter(table: &toml::Table) -> FilterSet {
    let names: Vec<&str> = match table.get("entities-to-clear").and_then(|v| v.as_array()) {
        Some(list) => list
            .iter()
            .filter_map(|v| {
                let name = v.as_str();
                if name.is_none() {
                    tracing::warn!(value = %v, "Non-string entry in entities-to-clear, skipped");
                }
                name
            })
            .collect(),
        None => Vec::new(),
    };

    if names.is_empty() {
        tracing::warn!("entities-to-clear is missing or empty; no entities will be cleared");
        return FilterSet::empty();
    }

    let filter = FilterSet::from_names(names);
    let loaded: Vec<&str> = filter.sorted().iter().map(|c| c.name()).collect();
    tracing::info!(categories = %loaded.join(", "), "Loaded entity categories to clear");
    filter
}

fn read_messages(table: &toml::Table) -> MessageCatalog {
    let Some(messages) = table.get("messages").and_then(|v| v.as_table()) else {
        return MessageCatalog::default();
    };
    let overrides = messages.iter().filter_map(|(key, value)| match value.as_str() {
        Some(text) => Some((key.clone(), text.to_string())),
        None => {
            tracing::warn!(key = %key, "Non-string message template, using default");
            None
        }
    });
    MessageCatalog::with_overrides(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::messages::POST_CLEANUP;
    use crate::notify::Outcome;

    const FULL: &str = r#"
cleanup-interval-seconds = 120
cleanup-delay-seconds = 0
sampling-interval-seconds = 5
max-entities-before-cleanup = 250
entities-to-clear = ["DROPPED_ITEM", "arrow", "UNICORN"]

[messages]
post-cleanup = "gone: %count%"
"#;

    #[test]
    fn test_full_config() {
        let loaded = parse_config(FULL);
        let s = &loaded.settings;
        assert_eq!(s.reduction_interval_ticks, 2400);
        assert_eq!(s.reduction_delay_ticks, 0);
        assert_eq!(s.sampling_interval_ticks, 100);
        assert_eq!(s.sampling_delay_ticks, 0);
        assert_eq!(s.population_ceiling, 250);
        assert_eq!(
            s.filter.sorted(),
            vec![EntityCategory::DroppedItem, EntityCategory::Arrow]
        );
        assert_eq!(
            loaded.messages.render_outcome(&Outcome::CleanupDone { removed: 2, manual: false }),
            "gone: 2"
        );
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let loaded = parse_config(
            r#"
cleanup-interval-seconds = 0
cleanup-delay-seconds = -5
sampling-interval-seconds = "often"
max-entities-before-cleanup = -1
entities-to-clear = ["COW"]
"#,
        );
        assert_eq!(loaded.settings.reduction_interval_ticks, 6000);
        assert_eq!(loaded.settings.reduction_delay_ticks, 1200);
        assert_eq!(loaded.settings.sampling_interval_ticks, 600);
        assert_eq!(loaded.settings.population_ceiling, DEFAULT_POPULATION_CEILING);
        assert!(loaded.settings.filter.contains(EntityCategory::Cow));
    }

    #[test]
    fn test_missing_list_means_clear_nothing() {
        let loaded = parse_config("cleanup-interval-seconds = 10");
        assert!(loaded.settings.filter.is_empty());
        assert_eq!(loaded.settings.reduction_interval_ticks, 200);
    }

    #[test]
    fn test_garbage_file_uses_defaults() {
        let loaded = parse_config("this is = = not toml");
        assert_eq!(loaded, LoadedConfig::default());
        assert!(loaded.settings.filter.contains(EntityCategory::DroppedItem));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loaded = load_config(Path::new("/definitely/not/here/clearlag.toml"));
        assert_eq!(loaded.settings, Settings::default());
    }

    #[test]
    fn test_read_config_table_reports_errors() {
        use crate::core::error::ClearlagError;

        let missing = read_config_table(Path::new("/definitely/not/here/clearlag.toml"));
        assert!(matches!(missing, Err(ClearlagError::IoError(_))));

        let path = std::env::temp_dir().join(format!("clearlag-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "= nope").unwrap();
        let bad = read_config_table(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(bad, Err(ClearlagError::TomlError(_))));
    }

    #[test]
    fn test_message_overrides_keep_other_defaults() {
        let loaded = parse_config("[messages]\npost-cleanup = 3\n");
        assert_eq!(
            loaded.messages.template(POST_CLEANUP),
            MessageCatalog::default().template(POST_CLEANUP)
        );
    }

    #[test]
    fn test_describe_mentions_cadences() {
        let text = Settings::default().describe();
        assert!(text.contains("every 300s after 60s"));
        assert!(text.contains("DROPPED_ITEM"));
    }
}
