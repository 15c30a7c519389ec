//! Cart
//!
//! Cart lines are keyed by `(product id, variant label)`: the same product in
//! a different variant is a separate line. Quantities are always at least
//! one; setting a quantity of zero removes the line.

use std::{fmt, num::NonZeroU32};

use thiserror::Error;
use tracing::debug;

use crate::{
    prices::{self, Amount},
    products::{Product, ProductError, ProductId},
};

/// Errors raised by cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The requested variant does not exist.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// No product in the catalog has the id.
    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    /// The product (or chosen variant) cannot currently be bought.
    #[error("{0} is out of stock")]
    OutOfStock(LineKey),

    /// No line in the cart matches the product.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// No line in the cart matches the exact key.
    #[error("{0} is not in the cart")]
    LineNotFound(LineKey),

    /// Incrementing would overflow the quantity counter.
    #[error("quantity overflow for {0}")]
    QuantityOverflow(LineKey),
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// Product id
    pub product_id: ProductId,

    /// Selected variant label, if the product has variants
    pub variant: Option<String>,
}

impl LineKey {
    /// Create a line key.
    pub fn new(product_id: impl Into<ProductId>, variant: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            variant: variant.map(ToString::to_string),
        }
    }
}

impl From<&str> for LineKey {
    fn from(product_id: &str) -> Self {
        Self::new(product_id, None)
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{} ({variant})", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// A product/variant pairing with a quantity.
///
/// Name and unit price are captured when the line is created so that an
/// order snapshot does not depend on the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    key: LineKey,
    name: String,
    unit_price: Amount,
    quantity: NonZeroU32,
}

impl CartLine {
    /// Create a line with an explicit price and quantity.
    pub fn new(key: LineKey, name: impl Into<String>, unit_price: Amount, quantity: NonZeroU32) -> Self {
        Self {
            key,
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Line key.
    pub fn key(&self) -> &LineKey {
        &self.key
    }

    /// Product id.
    pub fn product_id(&self) -> &ProductId {
        &self.key.product_id
    }

    /// Variant label.
    pub fn variant(&self) -> Option<&str> {
        self.key.variant.as_deref()
    }

    /// Product name at the time the line was added.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price at the time the line was added.
    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    /// Quantity, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Unit price times quantity; `None` on overflow.
    pub fn line_total(&self) -> Option<Amount> {
        prices::times(&self.unit_price, self.quantity())
    }
}

/// Cart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product.
    ///
    /// If the product has variants and none is chosen, the first variant is
    /// used. An existing line with the same key has its quantity incremented;
    /// otherwise a new line with quantity one is appended.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the variant is unknown, the product or
    /// variant is out of stock, or the quantity would overflow.
    pub fn add(&mut self, product: &Product, variant: Option<&str>) -> Result<&CartLine, CartError> {
        let (key, unit_price, in_stock) = match variant.or_else(|| {
            product
                .variants
                .first()
                .map(|variant| variant.name.as_str())
        }) {
            Some(label) => {
                let variant = product.variant(label).ok_or_else(|| ProductError::UnknownVariant {
                    product: product.id.clone(),
                    variant: label.to_string(),
                })?;

                (
                    LineKey::new(product.id.clone(), Some(variant.name.as_str())),
                    variant.price,
                    product.in_stock && variant.in_stock,
                )
            }
            None => (
                LineKey::new(product.id.clone(), None),
                product.price,
                product.in_stock,
            ),
        };

        if !in_stock {
            return Err(CartError::OutOfStock(key));
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity = line
                .quantity
                .checked_add(1)
                .ok_or_else(|| CartError::QuantityOverflow(key.clone()))?;

            debug!(line = %key, quantity = line.quantity.get(), "incremented cart line");
        } else {
            debug!(line = %key, "added cart line");

            self.lines.push(CartLine::new(
                key.clone(),
                product.name.clone(),
                unit_price,
                NonZeroU32::MIN,
            ));
        }

        self.line(&key).ok_or(CartError::LineNotFound(key))
    }

    /// Set the quantity of every line of a product. Zero removes them.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if no line matches the product.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if !self.contains(product_id) {
            return Err(CartError::NotInCart(ProductId::new(product_id)));
        }

        match NonZeroU32::new(quantity) {
            Some(quantity) => {
                for line in self
                    .lines
                    .iter_mut()
                    .filter(|line| line.key.product_id.as_str() == product_id)
                {
                    line.quantity = quantity;
                }

                debug!(product = product_id, quantity = quantity.get(), "updated cart quantity");
            }
            None => {
                self.remove(product_id);
            }
        }

        Ok(())
    }

    /// Set the quantity of one exact line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has the key.
    pub fn update_line_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<(), CartError> {
        let idx = self
            .position(key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;

        match NonZeroU32::new(quantity) {
            Some(quantity) => {
                if let Some(line) = self.lines.get_mut(idx) {
                    line.quantity = quantity;
                }

                debug!(line = %key, quantity = quantity.get(), "updated cart line quantity");
            }
            None => {
                self.lines.remove(idx);

                debug!(line = %key, "removed cart line");
            }
        }

        Ok(())
    }

    /// Remove every line of a product, returning how many were removed.
    pub fn remove(&mut self, product_id: &str) -> usize {
        let before = self.lines.len();

        self.lines
            .retain(|line| line.key.product_id.as_str() != product_id);

        let removed = before - self.lines.len();

        debug!(product = product_id, removed, "removed product from cart");

        removed
    }

    /// Remove one exact line, returning whether it existed.
    pub fn remove_line(&mut self, key: &LineKey) -> bool {
        match self.position(key) {
            Some(idx) => {
                self.lines.remove(idx);

                debug!(line = %key, "removed cart line");

                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();

        debug!("cleared cart");
    }

    /// Cart lines, in the order they were added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find a line by key.
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    /// Whether any line is for the product.
    pub fn contains(&self, product_id: &str) -> bool {
        self.lines
            .iter()
            .any(|line| line.key.product_id.as_str() == product_id)
    }

    /// Total number of units across all lines (the cart badge count).
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines.iter().position(|line| &line.key == key)
    }
}
