pub mod enums;
pub mod lenient;

pub use enums::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Age threshold (exclusive) for pediatric rules.
pub const PEDIATRIC_AGE_LIMIT: u32 = 18;
/// Age threshold (inclusive) for geriatric rules.
pub const GERIATRIC_AGE_FLOOR: u32 = 65;

/// Optional caller-supplied demographics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, deserialize_with = "lenient::lenient_age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::lenient")]
    pub sex: Option<String>,
}

impl Demographics {
    pub fn is_pediatric(&self) -> bool {
        self.age.is_some_and(|a| a < PEDIATRIC_AGE_LIMIT)
    }

    pub fn is_geriatric(&self) -> bool {
        self.age.is_some_and(|a| a >= GERIATRIC_AGE_FLOOR)
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.sex.is_none()
    }
}
