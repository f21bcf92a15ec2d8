use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Static mapping from category to the items that belong to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category<I, S>(mut self, category: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .entry(category.into())
            .or_default()
            .extend(items.into_iter().map(Into::into));
        self
    }

    /// Lanes used by the speed event when no catalog file is supplied.
    pub fn speed_lanes() -> Self {
        Self::new()
            .with_category("Novice", ["Lane A", "Lane B"])
            .with_category("Intermediate", ["Lane C", "Lane D"])
            .with_category("Open", ["Lane E", "Lane F"])
            .with_category("Team", ["Lane G", "Lane H"])
            .with_category("Enduro", ["Lane I", "Lane J"])
    }

    /// Reads a `{ "category": ["item", ...] }` JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            StorageError::Config(format!("catalog {} is not valid: {}", path.display(), e))
        })
    }

    pub fn items(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_lanes_have_two_lanes_per_category() {
        let catalog = Catalog::speed_lanes();
        assert_eq!(catalog.categories().count(), 5);
        let open = catalog.items("Open").unwrap();
        assert!(open.contains("Lane E"));
        assert!(open.contains("Lane F"));
        assert!(!open.contains("Lane A"));
    }

    #[test]
    fn test_catalog_file_format() {
        let catalog: Catalog =
            serde_json::from_str(r#"{"routes":["Route 1","Route 2"],"Assembly":["11"]}"#).unwrap();
        assert_eq!(catalog.items("routes").map(BTreeSet::len), Some(2));
        assert!(catalog.items("Assembly").unwrap().contains("11"));
        assert!(catalog.items("Packing").is_none());
    }
}
