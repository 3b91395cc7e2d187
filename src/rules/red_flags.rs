//! Configurable red-flag list.
//!
//! Red flags map a literal pattern straight to a minimum triage level. The
//! list may come from a JSON file; any failure to use that file falls back to
//! the minimal built-in set so the classifier never runs without red flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tables::{BuiltinRedFlag, DEFAULT_RED_FLAGS, MINIMAL_RED_FLAGS};
use crate::config::ConfigError;
use crate::models::TriageLevel;

/// One red-flag rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub pattern: String,
    pub level: TriageLevel,
    pub reason: String,
}

impl From<&BuiltinRedFlag> for RedFlag {
    fn from(flag: &BuiltinRedFlag) -> Self {
        Self {
            pattern: flag.pattern.to_string(),
            level: flag.level,
            reason: flag.reason.to_string(),
        }
    }
}

/// Where the active red-flag list came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagSource {
    Default,
    File(PathBuf),
    /// Load failure: minimal safety-first substitute.
    Minimal,
}

#[derive(Debug, Clone)]
pub struct RedFlagSet {
    flags: Vec<RedFlag>,
    source: RedFlagSource,
}

impl RedFlagSet {
    pub fn builtin() -> Self {
        Self {
            flags: DEFAULT_RED_FLAGS.iter().map(RedFlag::from).collect(),
            source: RedFlagSource::Default,
        }
    }

    pub fn minimal() -> Self {
        Self {
            flags: MINIMAL_RED_FLAGS.iter().map(RedFlag::from).collect(),
            source: RedFlagSource::Minimal,
        }
    }

    /// Build from caller-supplied flags. Patterns are normalized to lower case.
    pub fn from_flags(flags: Vec<RedFlag>, source: RedFlagSource) -> Result<Self, ConfigError> {
        if flags.is_empty() {
            return Err(ConfigError::EmptyRedFlags);
        }
        let mut normalized = Vec::with_capacity(flags.len());
        for mut flag in flags {
            let pattern = flag.pattern.trim().to_lowercase();
            if pattern.is_empty() {
                return Err(ConfigError::InvalidRedFlag("empty pattern".into()));
            }
            if flag.level == TriageLevel::NonUrgent {
                return Err(ConfigError::InvalidRedFlag(format!(
                    "red flag '{pattern}' targets NON_URGENT"
                )));
            }
            flag.pattern = pattern;
            normalized.push(flag);
        }
        Ok(Self { flags: normalized, source })
    }

    /// Parse a JSON red-flag file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let flags: Vec<RedFlag> = serde_json::from_str(&raw)?;
        Self::from_flags(flags, RedFlagSource::File(path.to_path_buf()))
    }

    /// Load from `path`, substituting the minimal set on any failure.
    pub fn load_or_minimal(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(set) => {
                tracing::info!(count = set.len(), "Red-flag configuration loaded");
                set
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Red-flag configuration unusable, substituting minimal safety set"
                );
                Self::minimal()
            }
        }
    }

    /// Every flag whose pattern appears in `text` (already lower-cased), in
    /// list order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a RedFlag> + 'a {
        self.flags.iter().filter(move |f| text.contains(f.pattern.as_str()))
    }

    pub fn flags(&self) -> &[RedFlag] {
        &self.flags
    }

    pub fn source(&self) -> &RedFlagSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Default for RedFlagSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_set_is_not_empty() {
        let set = RedFlagSet::builtin();
        assert!(!set.is_empty());
        assert_eq!(set.source(), &RedFlagSource::Default);
    }

    #[test]
    fn matches_in_list_order() {
        let set = RedFlagSet::builtin();
        let hits: Vec<_> = set
            .matches("chest pain and difficulty breathing")
            .map(|f| f.pattern.as_str())
            .collect();
        assert_eq!(hits, vec!["chest pain", "difficulty breathing"]);
    }

    #[test]
    fn loads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"pattern": "Stiff Neck", "level": "URGENT", "reason": "meningitis risk"}}]"#
        )
        .unwrap();
        let set = RedFlagSet::from_file(file.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.flags()[0].pattern, "stiff neck");
        assert!(matches!(set.source(), RedFlagSource::File(_)));
    }

    #[test]
    fn missing_file_falls_back_to_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let set = RedFlagSet::load_or_minimal(&dir.path().join("absent.json"));
        assert_eq!(set.source(), &RedFlagSource::Minimal);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn malformed_file_falls_back_to_minimal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let set = RedFlagSet::load_or_minimal(file.path());
        assert_eq!(set.source(), &RedFlagSource::Minimal);
    }

    #[test]
    fn empty_list_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(
            RedFlagSet::from_file(file.path()),
            Err(ConfigError::EmptyRedFlags)
        ));
        assert_eq!(
            RedFlagSet::load_or_minimal(file.path()).source(),
            &RedFlagSource::Minimal
        );
    }

    #[test]
    fn non_urgent_target_is_rejected() {
        let flags = vec![RedFlag {
            pattern: "cough".into(),
            level: TriageLevel::NonUrgent,
            reason: "x".into(),
        }];
        assert!(matches!(
            RedFlagSet::from_flags(flags, RedFlagSource::Default),
            Err(ConfigError::InvalidRedFlag(_))
        ));
    }
}
