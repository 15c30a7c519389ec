//! Product Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, INR, JPY, USD},
};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    fixtures::FixtureError,
    prices::Amount,
    products::{Product, ProductId, Variant},
};

/// Wrapper for the catalog in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Products in display order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Localized product name
    #[serde(default)]
    pub localized_name: Option<String>,

    /// Product price (e.g., "699 INR")
    pub price: String,

    /// Price before markdown (e.g., "850 INR")
    #[serde(default)]
    pub original_price: Option<String>,

    /// Image URL
    #[serde(default)]
    pub image: String,

    /// Category slug
    pub category: String,

    /// Average rating
    #[serde(default)]
    pub rating: f32,

    /// Number of reviews
    #[serde(default)]
    pub review_count: u32,

    /// Net weight label
    pub weight: String,

    /// Piece count label
    #[serde(default)]
    pub pieces: Option<String>,

    /// Serving label
    #[serde(default)]
    pub serves: Option<String>,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Whether the product is in stock
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,

    /// Variants
    #[serde(default)]
    pub variants: Vec<VariantFixture>,
}

/// Variant Fixture
#[derive(Debug, Deserialize)]
pub struct VariantFixture {
    /// Variant id
    pub id: String,

    /// Variant label
    pub name: String,

    /// Variant price (e.g., "749 INR")
    pub price: String,

    /// Whether the variant is in stock
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

fn in_stock_default() -> bool {
    true
}

impl TryFrom<ProductFixture> for Product {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_amount(&fixture.price)?;

        let original_price = fixture
            .original_price
            .as_deref()
            .map(parse_amount)
            .transpose()?;

        let variants = fixture
            .variants
            .into_iter()
            .map(Variant::try_from)
            .collect::<Result<SmallVec<[Variant; 4]>, _>>()?;

        let currency = price.currency();

        let mismatched = original_price
            .iter()
            .map(Money::currency)
            .chain(variants.iter().map(|variant| variant.price.currency()))
            .find(|other| *other != currency);

        if let Some(other) = mismatched {
            return Err(FixtureError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                other.iso_alpha_code.to_string(),
            ));
        }

        Ok(Product {
            id: ProductId::new(fixture.id),
            name: fixture.name,
            localized_name: fixture.localized_name,
            price,
            original_price,
            image: fixture.image,
            category: fixture.category,
            rating: fixture.rating,
            review_count: fixture.review_count,
            weight: fixture.weight,
            pieces: fixture.pieces,
            serves: fixture.serves,
            description: fixture.description,
            in_stock: fixture.in_stock,
            variants,
        })
    }
}

impl TryFrom<VariantFixture> for Variant {
    type Error = FixtureError;

    fn try_from(fixture: VariantFixture) -> Result<Self, Self::Error> {
        Ok(Variant {
            id: fixture.id,
            name: fixture.name,
            price: parse_amount(&fixture.price)?,
            in_stock: fixture.in_stock,
        })
    }
}

/// Parse a price string (e.g., "699 INR") into an [`Amount`].
///
/// # Errors
///
/// See [`parse_price`].
pub fn parse_amount(s: &str) -> Result<Amount, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(currency_code)?;

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Resolve one of the supported ISO currency codes.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for any other code.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "INR" => Ok(INR),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "JPY" => Ok(JPY),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or if the value is invalid.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}
