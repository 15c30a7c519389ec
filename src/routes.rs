//! Routes
//!
//! The storefront's client-side route table. [`Route::parse`] and the
//! [`Display`](fmt::Display) impl round-trip, including query parameters.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Route errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// No route matches the path.
    #[error("no route for {0:?}")]
    NotFound(String),
}

/// Section of the account area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountSection {
    /// `/account`
    #[default]
    Overview,
    /// `/account/orders`
    Orders,
    /// `/account/favorites`
    Favorites,
    /// `/account/addresses`
    Addresses,
    /// `/account/settings`
    Settings,
    /// `/account/membership`
    Membership,
    /// `/account/refer`
    Refer,
    /// `/account/frequent-orders`
    FrequentOrders,
    /// `/account/wallet`
    Wallet,
    /// `/account/rewards`
    Rewards,
}

impl AccountSection {
    const SUBSECTIONS: [AccountSection; 9] = [
        AccountSection::Orders,
        AccountSection::Favorites,
        AccountSection::Addresses,
        AccountSection::Settings,
        AccountSection::Membership,
        AccountSection::Refer,
        AccountSection::FrequentOrders,
        AccountSection::Wallet,
        AccountSection::Rewards,
    ];

    fn segment(self) -> Option<&'static str> {
        match self {
            AccountSection::Overview => None,
            AccountSection::Orders => Some("orders"),
            AccountSection::Favorites => Some("favorites"),
            AccountSection::Addresses => Some("addresses"),
            AccountSection::Settings => Some("settings"),
            AccountSection::Membership => Some("membership"),
            AccountSection::Refer => Some("refer"),
            AccountSection::FrequentOrders => Some("frequent-orders"),
            AccountSection::Wallet => Some("wallet"),
            AccountSection::Rewards => Some("rewards"),
        }
    }
}

/// Help page topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    /// `/help/payments`
    Payments,
    /// `/help/returns`
    Returns,
    /// `/help/shipping`
    Shipping,
}

impl HelpTopic {
    fn segment(self) -> &'static str {
        match self {
            HelpTopic::Payments => "payments",
            HelpTopic::Returns => "returns",
            HelpTopic::Shipping => "shipping",
        }
    }
}

/// A storefront location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/products`
    Products,
    /// `/products/:id`
    Product {
        /// Product id
        id: String,
    },
    /// `/cart`
    Cart,
    /// `/checkout`, `/checkout?direct=true` for Buy Now
    Checkout {
        /// Buy Now checkout
        direct: bool,
    },
    /// `/login`
    Login,
    /// `/forgot-password`
    ForgotPassword,
    /// `/account` and its sections
    Account(AccountSection),
    /// `/about`
    About,
    /// `/contact`
    Contact,
    /// `/recipes`
    Recipes,
    /// `/search?q=`
    Search {
        /// Search text
        query: String,
    },
    /// `/careers`
    Careers,
    /// `/stories`
    Stories,
    /// `/track-order?id=`
    TrackOrder {
        /// Order to track
        id: Option<String>,
    },
    /// `/order-success?orderId=`
    OrderSuccess {
        /// Order just placed
        order_id: Option<String>,
    },
    /// `/help/:topic`
    Help(HelpTopic),
    /// `/membership`
    Membership,
    /// `/flash-sale`
    FlashSale,
}

impl Route {
    /// Parse a path with an optional query string.
    ///
    /// Trailing slashes are ignored and unknown query parameters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] if no route matches the path.
    pub fn parse(location: &str) -> Result<Self, RouteError> {
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        let not_found = || RouteError::NotFound(path.to_string());

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["products"] => Route::Products,
            ["products", id] => Route::Product { id: decode(id) },
            ["cart"] => Route::Cart,
            ["checkout"] => Route::Checkout {
                direct: query_param(query, "direct").as_deref() == Some("true"),
            },
            ["login"] => Route::Login,
            ["forgot-password"] => Route::ForgotPassword,
            ["account"] => Route::Account(AccountSection::Overview),
            ["account", section] => AccountSection::SUBSECTIONS
                .into_iter()
                .find(|s| s.segment() == Some(*section))
                .map(Route::Account)
                .ok_or_else(not_found)?,
            ["about"] => Route::About,
            ["contact"] => Route::Contact,
            ["recipes"] => Route::Recipes,
            ["search"] => Route::Search {
                query: query_param(query, "q").unwrap_or_default(),
            },
            ["careers"] => Route::Careers,
            ["stories"] => Route::Stories,
            ["track-order"] => Route::TrackOrder {
                id: query_param(query, "id").filter(|id| !id.is_empty()),
            },
            ["order-success"] => Route::OrderSuccess {
                order_id: query_param(query, "orderId").filter(|id| !id.is_empty()),
            },
            ["help", "payments"] => Route::Help(HelpTopic::Payments),
            ["help", "returns"] => Route::Help(HelpTopic::Returns),
            ["help", "shipping"] => Route::Help(HelpTopic::Shipping),
            ["membership"] => Route::Membership,
            ["flash-sale"] => Route::FlashSale,
            _ => return Err(not_found()),
        };

        Ok(route)
    }

    /// Whether the page requires a signed-in user.
    pub fn requires_login(&self) -> bool {
        matches!(self, Route::Account(_) | Route::Checkout { .. })
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Products => f.write_str("/products"),
            Route::Product { id } => write!(f, "/products/{}", encode(id)),
            Route::Cart => f.write_str("/cart"),
            Route::Checkout { direct: false } => f.write_str("/checkout"),
            Route::Checkout { direct: true } => f.write_str("/checkout?direct=true"),
            Route::Login => f.write_str("/login"),
            Route::ForgotPassword => f.write_str("/forgot-password"),
            Route::Account(section) => match section.segment() {
                Some(segment) => write!(f, "/account/{segment}"),
                None => f.write_str("/account"),
            },
            Route::About => f.write_str("/about"),
            Route::Contact => f.write_str("/contact"),
            Route::Recipes => f.write_str("/recipes"),
            Route::Search { query } if query.is_empty() => f.write_str("/search"),
            Route::Search { query } => write!(f, "/search?q={}", encode(query)),
            Route::Careers => f.write_str("/careers"),
            Route::Stories => f.write_str("/stories"),
            Route::TrackOrder { id: None } => f.write_str("/track-order"),
            Route::TrackOrder { id: Some(id) } => write!(f, "/track-order?id={}", encode(id)),
            Route::OrderSuccess { order_id: None } => f.write_str("/order-success"),
            Route::OrderSuccess { order_id: Some(id) } => {
                write!(f, "/order-success?orderId={}", encode(id))
            }
            Route::Help(topic) => write!(f, "/help/{}", topic.segment()),
            Route::Membership => f.write_str("/membership"),
            Route::FlashSale => f.write_str("/flash-sale"),
        }
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| decode(value))
}

fn encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());

    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    encoded
}

/// Percent-decode, treating `+` as a space. Malformed escapes are kept as
/// written.
fn decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut rest = bytes;

    while let Some((&byte, tail)) = rest.split_first() {
        rest = tail;

        match byte {
            b'+' => decoded.push(b' '),
            b'%' => {
                let escaped = tail
                    .get(..2)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());

                match escaped {
                    Some(escaped) => {
                        decoded.push(escaped);
                        rest = tail.get(2..).unwrap_or_default();
                    }
                    None => decoded.push(b'%'),
                }
            }
            _ => decoded.push(byte),
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
