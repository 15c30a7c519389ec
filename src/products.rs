//! Products

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;
use thiserror::Error;

use crate::prices::Amount;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Errors raised when resolving a product's purchasable options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    /// The requested variant label is not offered by the product.
    #[error("product {product} has no variant named {variant:?}")]
    UnknownVariant {
        /// Product id
        product: ProductId,
        /// Requested variant label
        variant: String,
    },
}

/// Stable, externally visible product identifier (as used in `/products/:id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A purchasable variant of a product (cut, pack size, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Variant id
    pub id: String,

    /// Display label, also used as the cart line's variant label
    pub name: String,

    /// Variant price
    pub price: Amount,

    /// Whether the variant can currently be bought
    pub in_stock: bool,
}

/// Product
///
/// Reference data loaded with the catalog. The cart never mutates products;
/// it snapshots the price and name it needs at the time a line is added.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Name in the shopper's local language, when the catalog has one
    pub localized_name: Option<String>,

    /// Product price
    pub price: Amount,

    /// Price before markdown, shown struck through
    pub original_price: Option<Amount>,

    /// Image URL
    pub image: String,

    /// Category slug
    pub category: String,

    /// Average review rating out of five
    pub rating: f32,

    /// Number of reviews
    pub review_count: u32,

    /// Net weight label, e.g. `"500g"`
    pub weight: String,

    /// Piece count label, e.g. `"8-10 pieces"`
    pub pieces: Option<String>,

    /// Serving label, e.g. `"Serves 2-3"`
    pub serves: Option<String>,

    /// Long description
    pub description: String,

    /// Whether the product can currently be bought
    pub in_stock: bool,

    /// Variants; empty when the product is sold in a single form
    pub variants: SmallVec<[Variant; 4]>,
}

impl Product {
    /// Look up a variant by its label or id.
    pub fn variant(&self, label: &str) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|variant| variant.name == label || variant.id == label)
    }

    /// Whether the product offers variants.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// The unit price for the given variant label, or the product price when
    /// no label is given.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::UnknownVariant`] if the label names no variant.
    pub fn price_for(&self, variant: Option<&str>) -> Result<Amount, ProductError> {
        match variant {
            None => Ok(self.price),
            Some(label) => self
                .variant(label)
                .map(|variant| variant.price)
                .ok_or_else(|| ProductError::UnknownVariant {
                    product: self.id.clone(),
                    variant: label.to_string(),
                }),
        }
    }

    /// Markdown against the original price, if the product is on offer.
    pub fn savings(&self) -> Option<Amount> {
        let original = self.original_price?;
        let saved = original.to_minor_units() - self.price.to_minor_units();

        (saved > 0).then(|| rusty_money::Money::from_minor(saved, self.price.currency()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rusty_money::{Money, iso::INR};
    use smallvec::smallvec;

    use super::*;

    pub(crate) fn test_product(id: &str, rupees: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            localized_name: None,
            price: Money::from_minor(rupees * 100, INR),
            original_price: None,
            image: String::new(),
            category: "fish".to_string(),
            rating: 4.5,
            review_count: 10,
            weight: "500g".to_string(),
            pieces: None,
            serves: None,
            description: String::new(),
            in_stock: true,
            variants: SmallVec::new(),
        }
    }

    pub(crate) fn test_product_with_variants(id: &str) -> Product {
        Product {
            variants: smallvec![
                Variant {
                    id: format!("{id}-whole"),
                    name: "Whole".to_string(),
                    price: Money::from_minor(60_000, INR),
                    in_stock: true,
                },
                Variant {
                    id: format!("{id}-curry"),
                    name: "Curry Cut".to_string(),
                    price: Money::from_minor(69_900, INR),
                    in_stock: true,
                },
            ],
            ..test_product(id, 600)
        }
    }

    #[test]
    fn price_for_without_variant_uses_product_price() {
        let product = test_product_with_variants("7");

        assert_eq!(product.price_for(None), Ok(Money::from_minor(60_000, INR)));
    }

    #[test]
    fn price_for_variant_matches_label_or_id() {
        let product = test_product_with_variants("7");

        assert_eq!(
            product.price_for(Some("Curry Cut")),
            Ok(Money::from_minor(69_900, INR))
        );
        assert_eq!(
            product.price_for(Some("7-curry")),
            Ok(Money::from_minor(69_900, INR))
        );
    }

    #[test]
    fn price_for_unknown_variant_errors() {
        let product = test_product_with_variants("7");

        assert_eq!(
            product.price_for(Some("Fillet")),
            Err(ProductError::UnknownVariant {
                product: ProductId::new("7"),
                variant: "Fillet".to_string(),
            })
        );
    }

    #[test]
    fn savings_only_reported_for_markdowns() {
        let mut product = test_product("1", 500);

        assert_eq!(product.savings(), None);

        product.original_price = Some(Money::from_minor(65_000, INR));

        assert_eq!(product.savings(), Some(Money::from_minor(15_000, INR)));

        product.original_price = Some(Money::from_minor(40_000, INR));

        assert_eq!(product.savings(), None);
    }
}
