//! Run identities.
//!
//! A [`RunId`] namespaces every artifact produced by one pipeline execution.
//! It is derived from the wall-clock time at run start (UTC, second
//! resolution) followed by a short random suffix:
//!
//! ```text
//! 20261019_143005_9f1c2ab4
//! ^^^^^^^^^^^^^^^ ^^^^^^^^
//! start time      8 hex chars
//! ```
//!
//! Only ASCII digits, lowercase hex and `_` are used, so the value is safe in
//! file names on every platform. Sorting ids lexicographically sorts them by
//! start time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// `strftime` layout of the timestamp prefix.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Length of the rendered timestamp prefix.
const TIMESTAMP_LEN: usize = 15;
/// Length of the random suffix.
const SUFFIX_LEN: usize = 8;

/// Identity of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Create an identity for a run starting now.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create an identity for a run that started at `started`.
    #[must_use]
    pub fn at(started: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}_{}",
            started.format(TIMESTAMP_FORMAT),
            &suffix[..SUFFIX_LEN]
        ))
    }

    /// The rendered identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp prefix (`YYYYMMDD_HHMMSS`).
    pub fn timestamp(&self) -> &str {
        &self.0[..TIMESTAMP_LEN]
    }

    /// Start time encoded in the identity, at one-second resolution.
    pub fn started_at(&self) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(self.timestamp(), TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or_default()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("invalid run id: {s:?}"));

        if s.len() != TIMESTAMP_LEN + 1 + SUFFIX_LEN || !s.is_ascii() {
            return Err(invalid());
        }
        let (timestamp, rest) = s.split_at(TIMESTAMP_LEN);
        let suffix = rest.strip_prefix('_').ok_or_else(invalid)?;

        NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
        if !suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for RunId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}
