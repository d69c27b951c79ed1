use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{normalize_label, Legend};

/// File name of the user-authored legend list inside the data directory.
pub const CUSTOM_LEGENDS_FILE: &str = "custom_legends.json";

/// Legend added by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLegend {
    /// Name shown on the card.
    pub name: String,
    /// Category the card is played in.
    pub category: String,
    /// When the card was added.
    pub created_at: DateTime<Utc>,
}

impl CustomLegend {
    /// Catalog view of the entry.
    pub fn to_legend(&self) -> Legend {
        Legend::new(self.name.clone(), self.category.clone())
    }

    fn matches(&self, name: &str, category: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
            && self.category.to_lowercase() == category.to_lowercase()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CustomLegendFile {
    #[serde(default)]
    legends: Vec<CustomLegend>,
}

/// Loads, edits and writes the user-authored legend list.
#[derive(Debug)]
pub struct CustomLegendStore {
    path: PathBuf,
    entries: Vec<CustomLegend>,
}

impl CustomLegendStore {
    /// Open the store at `path`; a missing file yields an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        Ok(Self { path, entries })
    }

    /// Empty store that will write to `path` on first change.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Default location inside `data_dir`.
    pub fn default_path(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(CUSTOM_LEGENDS_FILE)
    }

    /// File backing the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[CustomLegend] {
        &self.entries
    }

    /// Entries as catalog legends.
    pub fn legends(&self) -> Vec<Legend> {
        self.entries.iter().map(CustomLegend::to_legend).collect()
    }

    /// Re-read the file, e.g. after another process edited it.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = read_entries(&self.path)?;
        Ok(())
    }

    /// Validate, append and persist a new legend.
    pub fn add(&mut self, name: &str, category: &str) -> Result<&CustomLegend> {
        let name = normalize_label(name);
        let category = normalize_label(category);
        if name.is_empty() {
            bail!("legend name must not be empty");
        }
        if category.is_empty() {
            bail!("legend category must not be empty");
        }
        if self
            .entries
            .iter()
            .any(|entry| entry.matches(&name, &category))
        {
            bail!("{name} already exists in {category}");
        }

        self.entries.push(CustomLegend {
            name,
            category,
            created_at: Utc::now(),
        });
        if let Err(err) = self.persist() {
            self.entries.pop();
            return Err(err);
        }

        let entry = self
            .entries
            .last()
            .ok_or_else(|| anyhow!("custom legend list unexpectedly empty"))?;
        info!(name = %entry.name, category = %entry.category, "Custom legend added");
        Ok(entry)
    }

    /// Remove and persist the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Result<CustomLegend> {
        if index >= self.entries.len() {
            bail!("custom legend index {index} out of range");
        }
        let removed = self.entries.remove(index);
        if let Err(err) = self.persist() {
            self.entries.insert(index, removed);
            return Err(err);
        }
        info!(name = %removed.name, category = %removed.category, "Custom legend removed");
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = CustomLegendFile {
            legends: self.entries.clone(),
        };
        let serialised = serde_json::to_vec_pretty(&file)?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn read_entries(path: &Path) -> Result<Vec<CustomLegend>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: CustomLegendFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(file.legends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_remove_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = CustomLegendStore::default_path(dir.path().join("data"));
        let mut store = CustomLegendStore::open(&path)?;
        assert!(store.entries().is_empty());

        store.add("  Grandma   Rose ", " Family ")?;
        store.add("Coach Carter", "Sports")?;
        assert!(path.exists());

        let reopened = CustomLegendStore::open(&path)?;
        assert_eq!(reopened.entries().len(), 2);
        assert_eq!(reopened.entries()[0].name, "Grandma Rose");
        assert_eq!(reopened.entries()[0].category, "Family");
        assert_eq!(
            reopened.legends()[1],
            Legend::new("Coach Carter", "Sports")
        );

        let removed = store.remove(0)?;
        assert_eq!(removed.name, "Grandma Rose");
        let reopened = CustomLegendStore::open(&path)?;
        assert_eq!(reopened.entries().len(), 1);
        Ok(())
    }

    #[test]
    fn rejects_blank_and_duplicate_entries() -> Result<()> {
        let dir = tempdir()?;
        let mut store = CustomLegendStore::empty(dir.path().join(CUSTOM_LEGENDS_FILE));

        assert!(store.add("   ", "Family").is_err());
        assert!(store.add("Grandma Rose", "").is_err());
        store.add("Grandma Rose", "Family")?;
        assert!(store.add("grandma rose", "FAMILY").is_err());
        store.add("Grandma Rose", "Cooking")?;
        assert_eq!(store.entries().len(), 2);
        assert!(store.remove(5).is_err());
        Ok(())
    }

    #[test]
    fn reload_picks_up_external_edits() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CUSTOM_LEGENDS_FILE);
        let mut store = CustomLegendStore::open(&path)?;

        let mut other = CustomLegendStore::open(&path)?;
        other.add("Aunt May", "Family")?;

        assert!(store.entries().is_empty());
        store.reload()?;
        assert_eq!(store.entries().len(), 1);
        Ok(())
    }

    #[test]
    fn corrupt_file_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CUSTOM_LEGENDS_FILE);
        fs::write(&path, "{ not json")?;
        let err = CustomLegendStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
        Ok(())
    }
}
