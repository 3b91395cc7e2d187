//! Rule Repository: the immutable knowledge base every pipeline stage reads.
//!
//! Static tables are embedded constants; the only runtime-loaded piece is the
//! red-flag list. A repository is built once and shared behind `Arc` across
//! concurrent evaluations.

pub mod contacts;
pub mod red_flags;
pub mod redact;
pub mod tables;

use std::path::Path;

pub use contacts::{resolve_contacts, EmergencyContacts};
pub use red_flags::{RedFlag, RedFlagSet, RedFlagSource};

use crate::config::SafetyConfig;

#[derive(Debug, Clone)]
pub struct RuleRepository {
    red_flags: RedFlagSet,
}

impl RuleRepository {
    /// Repository backed by the built-in red-flag table.
    pub fn builtin() -> Self {
        Self {
            red_flags: RedFlagSet::builtin(),
        }
    }

    pub fn with_red_flags(red_flags: RedFlagSet) -> Self {
        // The classifier never runs without red flags.
        let red_flags = if red_flags.is_empty() {
            RedFlagSet::minimal()
        } else {
            red_flags
        };
        Self { red_flags }
    }

    /// Build from configuration.
    ///
    /// An explicitly configured file that cannot be used yields the minimal
    /// set. The default location is only consulted when it exists.
    pub fn from_config(config: &SafetyConfig) -> Self {
        match &config.red_flag_path {
            Some(path) => Self::with_red_flags(RedFlagSet::load_or_minimal(path)),
            None => match crate::config::default_red_flag_path() {
                Some(path) if Path::new(&path).exists() => {
                    Self::with_red_flags(RedFlagSet::load_or_minimal(&path))
                }
                _ => Self::builtin(),
            },
        }
    }

    pub fn red_flags(&self) -> &RedFlagSet {
        &self.red_flags
    }

    pub fn version(&self) -> &'static str {
        tables::RULE_SET_VERSION
    }
}

impl Default for RuleRepository {
    fn default() -> Self {
        Self::builtin()
    }
}
