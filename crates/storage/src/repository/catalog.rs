use std::collections::BTreeSet;

use crate::models::Catalog;

/// Source of the items that are valid for a category.
pub trait CatalogProvider: Send + Sync {
    fn valid_items_for(&self, category_id: &str) -> BTreeSet<String>;

    fn contains(&self, category_id: &str, item_id: &str) -> bool {
        self.valid_items_for(category_id).contains(item_id)
    }
}

impl CatalogProvider for Catalog {
    fn valid_items_for(&self, category_id: &str) -> BTreeSet<String> {
        self.items(category_id).cloned().unwrap_or_default()
    }

    fn contains(&self, category_id: &str, item_id: &str) -> bool {
        self.items(category_id)
            .is_some_and(|items| items.contains(item_id))
    }
}
