use itertools::Itertools;
use std::fmt::{Debug, Display};
use std::ops::Deref;

/// Sql text that compares equal to other sql text regardless of the amount of whitespace,
/// letter case and trailing semicolons, while still storing the original text.
///
/// Whitespace between tokens still counts, a run of it compares equal to a single space.
#[repr(transparent)]
#[derive(Default, Eq, Clone)]
pub struct NormalizedSql(String);

impl NormalizedSql {
    fn normalized(&self) -> String {
        self.0
            .trim()
            .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
            .split_whitespace()
            .join(" ")
            .to_lowercase()
    }
}

impl Deref for NormalizedSql {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for NormalizedSql {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NormalizedSql {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Debug for NormalizedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for NormalizedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl PartialEq<Self> for NormalizedSql {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}
