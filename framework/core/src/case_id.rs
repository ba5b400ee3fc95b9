use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifier of a test case, unique within its suite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for CaseId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}
