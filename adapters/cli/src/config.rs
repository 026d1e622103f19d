//! Optional TOML configuration file.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use maze_scout_system_targeting::TargetingConfig;
use maze_scout_world::{SearchOptions, StaleEntryPolicy};
use serde::Deserialize;

/// Contents of the configuration file. Every key is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    stale_entries: Option<StaleEntryPolicy>,
    dead_end_recency: Option<u32>,
}

impl ConfigFile {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml")
    }
}

/// Settings the session runs with after merging file and flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) search: SearchOptions,
    pub(crate) targeting: TargetingConfig,
}

impl Settings {
    /// Layers the file over the defaults and the flags over the file.
    pub(crate) fn resolve(file: ConfigFile, stale_entries: Option<StaleEntryPolicy>) -> Self {
        let mut settings = Self::default();
        if let Some(policy) = stale_entries.or(file.stale_entries) {
            settings.search.stale_entries = policy;
        }
        if let Some(recency) = file.dead_end_recency {
            settings.targeting.dead_end_recency = recency;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use maze_scout_system_targeting::DEAD_END_RECENCY;

    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let file = ConfigFile::parse("").expect("empty toml");
        let settings = Settings::resolve(file, None);

        assert_eq!(settings.search.stale_entries, StaleEntryPolicy::Skip);
        assert_eq!(settings.targeting.dead_end_recency, DEAD_END_RECENCY);
    }

    #[test]
    fn file_values_apply() {
        let file = ConfigFile::parse("stale_entries = \"abort\"\ndead_end_recency = 40\n")
            .expect("valid toml");
        let settings = Settings::resolve(file, None);

        assert_eq!(settings.search.stale_entries, StaleEntryPolicy::Abort);
        assert_eq!(settings.targeting.dead_end_recency, 40);
    }

    #[test]
    fn flag_overrides_file() {
        let file = ConfigFile::parse("stale_entries = \"abort\"").expect("valid toml");
        let settings = Settings::resolve(file, Some(StaleEntryPolicy::Skip));

        assert_eq!(settings.search.stale_entries, StaleEntryPolicy::Skip);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("dead_end = 3").is_err());
        assert!(ConfigFile::parse("stale_entries = \"retry\"").is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let error = ConfigFile::load(Path::new("does/not/exist.toml")).expect_err("missing");
        assert!(error.to_string().contains("does/not/exist.toml"), "{error}");
    }
}
