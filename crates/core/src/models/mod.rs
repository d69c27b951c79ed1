//! Shared domain models.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name carried by the placeholder card drawn from an empty category.
pub const NO_LEGEND: &str = "No Legend";

/// A legend card tagged with the category it is played in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Legend {
    /// Name shown on the card.
    pub name: String,
    /// Category the card belongs to. Matching is exact.
    pub category: String,
}

impl Legend {
    /// Build a legend from anything string-like.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Display name of a team. The order of teams in a session is the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(String);

impl Team {
    /// Wrap a display name without validating it.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the display name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// `true` when nothing but whitespace is left of the name.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn trimmed(&self) -> Self {
        Self(self.0.trim().to_string())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Team {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Team {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Verdict recorded by the moderator when a turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The team's legend was guessed.
    Correct,
    /// Time ran out without a correct guess.
    Incorrect,
}

impl Outcome {
    /// Map the moderator's yes/no answer onto an outcome.
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    /// Points awarded to the playing team.
    pub fn points(self) -> u32 {
        match self {
            Outcome::Correct => 1,
            Outcome::Incorrect => 0,
        }
    }
}

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("failed to compile whitespace regex"));

/// Trim a user-entered label and collapse inner whitespace runs to one space.
pub fn normalize_label(input: &str) -> String {
    WHITESPACE_RE.replace_all(input.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_label("  Freddie \t  Mercury "), "Freddie Mercury");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn blank_team_detection() {
        assert!(Team::from("   ").is_blank());
        assert!(!Team::from(" Red ").is_blank());
        assert_eq!(Team::from(" Red ").trimmed().name(), "Red");
    }
}
