//! Harbour
//!
//! Harbour is the cart, pricing and order-lifecycle engine behind a seafood
//! storefront: product catalog, cart and wishlist, session wallet, saved
//! addresses, checkout, order history with a cancellation window, and the
//! storefront's route table.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod countdown;
pub mod coupons;
pub mod fixtures;
pub mod orders;
pub mod preferences;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod routes;
pub mod session;
pub mod store;
pub mod wishlist;
