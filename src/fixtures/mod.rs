//! Fixtures
//!
//! YAML-backed sample data: the product catalog the storefront starts with.

use std::{fs, path::Path};

use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError},
    products::Product,
};

pub mod products;

/// Bundled sample catalog.
pub const SAMPLE_CATALOG: &str = include_str!("../../fixtures/catalog.yml");

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// The catalog has no products, so its currency is unknown
    #[error("Catalog fixture has no products")]
    NoProducts,
}

impl From<CatalogError> for FixtureError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::DuplicateProduct(id) => Self::DuplicateProduct(id.to_string()),
            CatalogError::CurrencyMismatch {
                expected, found, ..
            } => Self::CurrencyMismatch(expected.to_string(), found.to_string()),
        }
    }
}

/// Parse a catalog from YAML.
///
/// The catalog currency is taken from the first product; every other product
/// must use the same currency.
///
/// # Errors
///
/// Returns an error if the YAML is malformed, a price is invalid, currencies
/// are mixed, or a product id is repeated.
pub fn catalog_from_str(yaml: &str) -> Result<Catalog, FixtureError> {
    let fixture: products::CatalogFixture = serde_norway::from_str(yaml)?;

    let products = fixture
        .products
        .into_iter()
        .map(Product::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let currency = products
        .first()
        .map(|product| product.price.currency())
        .ok_or(FixtureError::NoProducts)?;

    let mut catalog = Catalog::new(currency);

    for product in products {
        catalog.insert(product)?;
    }

    Ok(catalog)
}

/// Load a catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, FixtureError> {
    let contents = fs::read_to_string(path)?;

    catalog_from_str(&contents)
}
