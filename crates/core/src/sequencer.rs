#![allow(missing_docs)]

//! Category choices offered before each turn.

use serde::{Deserialize, Serialize};

use crate::catalog::LegendCatalog;

/// Whether a category may be picked again within one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Every category stays selectable for every turn.
    #[default]
    Allow,
    /// A played category is withheld until every category has been played.
    ForbidWithinSession,
}

/// Tracks the categories played in the current game.
#[derive(Debug, Clone, Default)]
pub struct CategorySequencer {
    policy: RepeatPolicy,
    played: Vec<String>,
}

impl CategorySequencer {
    pub fn new(policy: RepeatPolicy) -> Self {
        Self {
            policy,
            played: Vec::new(),
        }
    }

    pub fn policy(&self) -> RepeatPolicy {
        self.policy
    }

    /// Categories the next team may choose from, in catalog order.
    pub fn available(&self, catalog: &LegendCatalog) -> Vec<String> {
        let categories = catalog.categories();
        match self.policy {
            RepeatPolicy::Allow => categories,
            RepeatPolicy::ForbidWithinSession => {
                let fresh: Vec<String> = categories
                    .iter()
                    .filter(|category| !self.played.contains(category))
                    .cloned()
                    .collect();
                if fresh.is_empty() {
                    categories
                } else {
                    fresh
                }
            }
        }
    }

    pub fn record(&mut self, category: &str) {
        self.played.push(category.to_string());
    }

    /// Played categories in play order, repeats included.
    pub fn played(&self) -> &[String] {
        &self.played
    }

    pub fn reset(&mut self) {
        self.played.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Legend;

    fn catalog() -> LegendCatalog {
        LegendCatalog::new(
            vec![
                Legend::new("Pele", "Sports"),
                Legend::new("Mozart", "Music"),
                Legend::new("Cleopatra", "History"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn allow_policy_keeps_everything() {
        let catalog = catalog();
        let mut sequencer = CategorySequencer::new(RepeatPolicy::Allow);
        sequencer.record("Sports");
        sequencer.record("Sports");
        assert_eq!(sequencer.available(&catalog), vec!["Sports", "Music", "History"]);
        assert_eq!(sequencer.played().len(), 2);
    }

    #[test]
    fn forbid_policy_withholds_until_exhausted() {
        let catalog = catalog();
        let mut sequencer = CategorySequencer::new(RepeatPolicy::ForbidWithinSession);
        sequencer.record("Music");
        assert_eq!(sequencer.available(&catalog), vec!["Sports", "History"]);

        sequencer.record("Sports");
        sequencer.record("History");
        assert_eq!(sequencer.available(&catalog).len(), 3);

        sequencer.reset();
        assert!(sequencer.played().is_empty());
    }
}
