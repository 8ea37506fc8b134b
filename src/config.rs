//! Run configuration.
//!
//! [`TrialConfig`] is read from `trial.yaml` (or `--config <file>`) and holds
//! settings that belong to a project. [`RunOptions`] holds the per-run
//! choices that only come from the command line.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;
use tracing::debug;

use crate::errors::{Result, TrialError};
use crate::marks::BUILTIN_MARKS;

pub const DEFAULT_CONFIG_FILE: &str = "trial.yaml";
pub const DEFAULT_TEST_PREFIX: &str = "test_";
pub const DEFAULT_SLOW_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrialConfig {
    /// Modules and tests are collected only when their name has this prefix.
    pub test_prefix: String,
    /// Registered custom markers, name to description.
    pub markers: BTreeMap<String, String>,
    /// Reject custom marks that are not registered.
    pub strict_markers: bool,
    /// Default strictness of `xfail` marks.
    pub xfail_strict: bool,
    /// How long the demo `slow` test sleeps.
    pub slow_delay_ms: u64,
    pub color: ColorMode,
}

impl Default for TrialConfig {
    fn default() -> Self {
        let mut markers = BTreeMap::new();
        markers.insert(
            "slow".to_string(),
            "marks tests as slow (deselect with '-m \"not slow\"')".to_string(),
        );
        Self {
            test_prefix: DEFAULT_TEST_PREFIX.to_string(),
            markers,
            strict_markers: false,
            xfail_strict: false,
            slow_delay_ms: DEFAULT_SLOW_DELAY_MS,
            color: ColorMode::Auto,
        }
    }
}

impl TrialConfig {
    pub fn from_yaml_str(name: &str, content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| TrialError::ConfigParse {
            path: name.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| TrialError::ConfigIo {
            path: name.clone(),
            source,
        })?;
        debug!(config = %name, "loaded configuration");
        Self::from_yaml_str(&name, &content)
    }

    /// Loads `explicit` if given, else `trial.yaml` in `dir` if present,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
        Ok(Self::default())
    }

    pub fn is_known_marker(&self, name: &str) -> bool {
        BUILTIN_MARKS.contains(&name) || self.markers.contains_key(name)
    }
}

/// Per-run choices taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// `-m` expression over mark names.
    pub mark_expr: Option<String>,
    /// `-k` expression over test keywords.
    pub keyword_expr: Option<String>,
    /// Stop after the first failed invocation.
    pub exitfirst: bool,
    /// Report xfail-marked invocations as if they were not marked.
    pub runxfail: bool,
    pub collect_only: bool,
    pub json: bool,
    /// Negative is quiet, positive is verbose.
    pub verbosity: i8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_slow() {
        let config = TrialConfig::default();
        assert!(config.is_known_marker("slow"));
        assert!(config.is_known_marker("xfail"));
        assert!(!config.is_known_marker("django_db"));
        assert_eq!(config.test_prefix, "test_");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = TrialConfig::from_yaml_str(
            "inline",
            "strict_markers: true\nmarkers:\n  db: needs a database\n",
        )
        .unwrap();
        assert!(config.strict_markers);
        assert!(config.is_known_marker("db"));
        assert!(!config.is_known_marker("slow"));
        assert_eq!(config.slow_delay_ms, DEFAULT_SLOW_DELAY_MS);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = TrialConfig::from_yaml_str("inline", "colour: never\n").unwrap_err();
        assert!(matches!(err, TrialError::ConfigParse { .. }));
    }

    #[test]
    fn color_parses_lowercase() {
        let config = TrialConfig::from_yaml_str("inline", "color: never\n").unwrap();
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.color.choice(), ColorChoice::Never);
    }
}
