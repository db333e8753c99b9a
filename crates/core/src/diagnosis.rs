//! Diagnosis request keys.
//!
//! A [`DiagnosisKey`] identifies one cache partition: a normalized target
//! handle, a [`Mode`], and an optional normalized competitor handle. A key
//! without a competitor and a key with one are always distinct partitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Longest handle Instagram accepts.
const MAX_HANDLE_LEN: usize = 30;

/// Tone of the generated critique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Mild,
    #[default]
    Medium,
    Spicy,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Mild => "mild",
            Mode::Medium => "medium",
            Mode::Spicy => "spicy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mild" => Ok(Mode::Mild),
            "medium" => Ok(Mode::Medium),
            "spicy" => Ok(Mode::Spicy),
            other => Err(Error::InvalidInput(format!(
                "invalid mode: {other} (expected mild, medium or spicy)"
            ))),
        }
    }
}

/// Normalize a user-supplied handle.
///
/// Trims whitespace, strips one leading `@` and lowercases. Returns `None`
/// when nothing is left.
pub fn normalize_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if handle.is_empty() { None } else { Some(handle.to_lowercase()) }
}

/// Check a normalized handle against Instagram's username rules.
fn validate_handle(field: &str, handle: &str) -> Result<(), Error> {
    if handle.chars().count() > MAX_HANDLE_LEN {
        return Err(Error::InvalidInput(format!(
            "{field} too long: {} chars (max {MAX_HANDLE_LEN})",
            handle.chars().count()
        )));
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    {
        return Err(Error::InvalidInput(format!(
            "{field} may only contain letters, digits, '.' and '_'"
        )));
    }
    Ok(())
}

/// Cache partition key for a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagnosisKey {
    pub username: String,
    pub mode: Mode,
    pub competitor: Option<String>,
}

impl DiagnosisKey {
    /// Build a key from raw request input.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the username is empty after
    /// normalization, or either handle contains characters Instagram does
    /// not allow. A competitor that normalizes to nothing is dropped.
    pub fn new(username: &str, mode: Mode, competitor: Option<&str>) -> Result<Self, Error> {
        let username = normalize_handle(username).ok_or_else(|| Error::InvalidInput("Invalid username".into()))?;
        validate_handle("username", &username)?;

        let competitor = competitor.and_then(normalize_handle);
        if let Some(c) = &competitor {
            validate_handle("competitorId", c)?;
        }

        Ok(Self { username, mode, competitor })
    }

    /// Handles to scrape, target first.
    pub fn usernames(&self) -> Vec<String> {
        let mut names = vec![self.username.clone()];
        if let Some(c) = &self.competitor {
            names.push(c.clone());
        }
        names
    }
}

impl fmt::Display for DiagnosisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.username,
            self.mode,
            self.competitor.as_deref().unwrap_or("NULL")
        )
    }
}
