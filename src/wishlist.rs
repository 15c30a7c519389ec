//! Wishlist

use tracing::debug;

use crate::products::ProductId;

/// Set of saved product ids, kept in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    entries: Vec<ProductId>,
}

impl Wishlist {
    /// Create an empty wishlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a product. Returns `false` if it was already saved.
    pub fn add(&mut self, product_id: ProductId) -> bool {
        if self.contains(product_id.as_str()) {
            return false;
        }

        debug!(product = %product_id, "added to wishlist");

        self.entries.push(product_id);

        true
    }

    /// Unsave a product. Returns `false` if it was not saved.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.entries.len();

        self.entries.retain(|entry| entry.as_str() != product_id);

        let removed = self.entries.len() != before;

        if removed {
            debug!(product = product_id, "removed from wishlist");
        }

        removed
    }

    /// Flip membership, returning whether the product is now saved.
    pub fn toggle(&mut self, product_id: ProductId) -> bool {
        if self.remove(product_id.as_str()) {
            false
        } else {
            self.add(product_id)
        }
    }

    /// Whether the product is saved.
    pub fn contains(&self, product_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.as_str() == product_id)
    }

    /// Saved ids.
    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.entries.iter()
    }

    /// Number of saved products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
