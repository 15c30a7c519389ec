//! Catalog
//!
//! Read-only product reference data, keyed both by slot key and by the
//! product's public id.

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    fixtures::{self, FixtureError},
    products::{Product, ProductId, ProductKey},
};

/// Errors raised while building a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A product with the same id was already inserted.
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),

    /// Product currency differs from the catalog currency (catalog, product).
    #[error("product {product} is priced in {found}, catalog uses {expected}")]
    CurrencyMismatch {
        /// Offending product
        product: ProductId,
        /// Catalog currency code
        expected: &'static str,
        /// Product currency code
        found: &'static str,
    },
}

/// Catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    keys: FxHashMap<ProductId, ProductKey>,
    currency: &'static Currency,
}

impl Catalog {
    /// Create an empty catalog priced in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            products: SlotMap::with_key(),
            keys: FxHashMap::default(),
            currency,
        }
    }

    /// The bundled sample catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled fixture fails to parse.
    pub fn sample() -> Result<Self, FixtureError> {
        fixtures::catalog_from_str(fixtures::SAMPLE_CATALOG)
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the id is taken or the product is priced
    /// in another currency.
    pub fn insert(&mut self, product: Product) -> Result<ProductKey, CatalogError> {
        if self.keys.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }

        let found = product.price.currency();

        if found != self.currency {
            return Err(CatalogError::CurrencyMismatch {
                product: product.id,
                expected: self.currency.iso_alpha_code,
                found: found.iso_alpha_code,
            });
        }

        let id = product.id.clone();
        let key = self.products.insert(product);

        self.keys.insert(id, key);

        Ok(key)
    }

    /// Look up a product by its public id.
    ///
    /// `None` is the "Product Not Found" case.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.keys
            .get(id)
            .and_then(|key| self.products.get(*key))
    }

    /// Look up a product by slot key.
    pub fn get_by_key(&self, key: ProductKey) -> Option<&Product> {
        self.products.get(key)
    }

    /// Slot key for a public id.
    pub fn key(&self, id: &str) -> Option<ProductKey> {
        self.keys.get(id).copied()
    }

    /// All products, in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Products in a category.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.iter()
            .filter(move |product| product.category.eq_ignore_ascii_case(category))
    }

    /// Distinct category slugs, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .iter()
            .map(|product| product.category.as_str())
            .collect();

        categories.sort_unstable();
        categories.dedup();

        categories
    }

    /// Case-insensitive search over names, localized names, categories and
    /// descriptions. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();

        if needle.is_empty() {
            return Vec::new();
        }

        self.iter()
            .filter(|product| {
                [
                    Some(product.name.as_str()),
                    product.localized_name.as_deref(),
                    Some(product.category.as_str()),
                    Some(product.description.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Catalog currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
