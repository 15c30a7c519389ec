//! Harbour prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    addresses::{Address, AddressBook, AddressError, AddressKey, AddressLabel, GeolocationError},
    cart::{Cart, CartError, CartLine, LineKey},
    catalog::{Catalog, CatalogError},
    checkout::{
        Checkout, CheckoutError, CheckoutStage, DeliveryMode, PendingPlacement, PlacedOrder,
        delivery::{DeliveryPlan, DeliverySlot},
        payment::PaymentMethod,
    },
    config::{ConfigError, PricingRules, StorefrontConfig},
    countdown::Countdown,
    coupons::{AppliedCoupon, CouponError, apply_coupon},
    fixtures::FixtureError,
    orders::{Order, OrderError, OrderHistory, OrderId, OrderStatus, TrackingStage},
    preferences::{FlagStorage, MemoryStorage, Preferences},
    prices::Amount,
    pricing::{PriceBreakdown, PricingError, quote},
    products::{Product, ProductId, ProductKey, Variant},
    receipt::{Receipt, ReceiptError},
    routes::{Route, RouteError},
    session::{Session, User, Wallet, WalletError},
    store::Store,
    wishlist::Wishlist,
};
