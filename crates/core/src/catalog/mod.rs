//! Legend catalog: built-in cards merged with user-authored ones.

/// Cards shipped with the game.
pub mod builtin;
/// Persistence for user-authored cards.
pub mod custom;
/// File watcher that reports edits to the custom card file.
pub mod watch;

use std::sync::Arc;

use parking_lot::RwLock;
use rand::{seq::IndexedRandom, Rng};
use tracing::info;

use crate::models::{Legend, NO_LEGEND};

pub use custom::{CustomLegend, CustomLegendStore};
pub use watch::{CustomLegendWatcher, LegendFileEvent};

/// Result of drawing a card for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegendDraw {
    /// A card from the category.
    Legend(Legend),
    /// Placeholder returned when the category has no cards.
    NoLegend,
}

impl LegendDraw {
    /// Name to show on the card.
    pub fn name(&self) -> &str {
        match self {
            LegendDraw::Legend(legend) => &legend.name,
            LegendDraw::NoLegend => NO_LEGEND,
        }
    }

    /// The drawn legend, unless the placeholder was drawn.
    pub fn legend(&self) -> Option<&Legend> {
        match self {
            LegendDraw::Legend(legend) => Some(legend),
            LegendDraw::NoLegend => None,
        }
    }

    /// `true` for the placeholder card.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, LegendDraw::NoLegend)
    }
}

/// Thread-safe catalog of every playable legend.
///
/// Cloning is cheap and every clone observes [`LegendCatalog::refresh`].
#[derive(Clone)]
pub struct LegendCatalog {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    builtin: Vec<Legend>,
    custom: Vec<Legend>,
}

impl Inner {
    fn merged(&self) -> impl Iterator<Item = &Legend> {
        self.builtin.iter().chain(self.custom.iter())
    }
}

impl LegendCatalog {
    /// Build a catalog from explicit built-in and user-authored lists.
    pub fn new(builtin: Vec<Legend>, custom: Vec<Legend>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { builtin, custom })),
        }
    }

    /// Catalog seeded with the shipped cards.
    pub fn with_builtin(custom: Vec<Legend>) -> Self {
        Self::new(builtin::legends(), custom)
    }

    /// Replace the user-authored cards.
    pub fn refresh(&self, custom: Vec<Legend>) {
        let mut inner = self.inner.write();
        inner.custom = custom;
        info!(
            builtin = inner.builtin.len(),
            custom = inner.custom.len(),
            "Legend catalog refreshed"
        );
    }

    /// Every legend, built-ins first.
    pub fn legends(&self) -> Vec<Legend> {
        self.inner.read().merged().cloned().collect()
    }

    /// Legends of one category in catalog order.
    pub fn legends_by_category(&self, category: &str) -> Vec<Legend> {
        self.inner
            .read()
            .merged()
            .filter(|legend| legend.category == category)
            .cloned()
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut categories: Vec<String> = Vec::new();
        for legend in inner.merged() {
            if !categories.iter().any(|known| *known == legend.category) {
                categories.push(legend.category.clone());
            }
        }
        categories
    }

    /// Pick a legend of `category` uniformly at random, with replacement.
    pub fn draw_legend<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> LegendDraw {
        let inner = self.inner.read();
        let eligible: Vec<&Legend> = inner
            .merged()
            .filter(|legend| legend.category == category)
            .collect();
        eligible
            .choose(rng)
            .map(|legend| LegendDraw::Legend((*legend).clone()))
            .unwrap_or(LegendDraw::NoLegend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample_catalog() -> LegendCatalog {
        LegendCatalog::new(
            vec![
                Legend::new("Pele", "Sports"),
                Legend::new("Mozart", "Music"),
                Legend::new("Serena Williams", "Sports"),
            ],
            vec![Legend::new("Grandma Rose", "Family")],
        )
    }

    #[test]
    fn merges_builtin_and_custom() {
        let catalog = sample_catalog();
        assert_eq!(catalog.legends().len(), 4);
        assert_eq!(catalog.categories(), vec!["Sports", "Music", "Family"]);

        let sports = catalog.legends_by_category("Sports");
        assert_eq!(sports.len(), 2);
        assert_eq!(sports[0].name, "Pele");
        assert_eq!(sports[1].name, "Serena Williams");
    }

    #[test]
    fn empty_category_draws_sentinel() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let draw = catalog.draw_legend("Cooking", &mut rng);
            assert!(draw.is_sentinel());
            assert_eq!(draw.name(), NO_LEGEND);
        }
        assert!(catalog.draw_legend("sports", &mut rng).is_sentinel());
    }

    #[test]
    fn draws_are_roughly_uniform() {
        let catalog = LegendCatalog::new(
            vec![
                Legend::new("A", "Letters"),
                Legend::new("B", "Letters"),
                Legend::new("C", "Letters"),
            ],
            Vec::new(),
        );
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            match catalog.draw_legend("Letters", &mut rng).name() {
                "A" => counts[0] += 1,
                "B" => counts[1] += 1,
                "C" => counts[2] += 1,
                other => panic!("unexpected legend {other}"),
            }
        }
        for count in counts {
            assert!((850..=1150).contains(&count), "skewed counts {counts:?}");
        }
    }

    #[test]
    fn refresh_is_visible_through_clones() {
        let catalog = sample_catalog();
        let shared = catalog.clone();
        catalog.refresh(vec![Legend::new("Uncle Bob", "Family")]);

        let family = shared.legends_by_category("Family");
        assert_eq!(family, vec![Legend::new("Uncle Bob", "Family")]);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(shared.draw_legend("Family", &mut rng).name(), "Uncle Bob");
    }
}
