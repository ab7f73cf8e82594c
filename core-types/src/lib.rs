use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier assigned to a media record at creation.
/// Never reused, never changed once a record carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MediaFlags: u8 {
        /// Excluded from reports and exports.
        const PRIVATE  = 0b0000_0001;
        /// Kept for record history only.
        const ARCHIVED = 0b0000_0010;
    }
}
