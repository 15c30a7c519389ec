//! Store
//!
//! The single application-state service. Pages read through accessors and
//! change state only through the named methods here.

use jiff::Timestamp;

use crate::{
    addresses::{Address, AddressBook, AddressError, AddressKey},
    cart::{Cart, CartError, CartLine, LineKey},
    catalog::Catalog,
    config::StorefrontConfig,
    coupons::{self, AppliedCoupon, CouponError},
    fixtures::FixtureError,
    orders::{Order, OrderError, OrderHistory},
    prices::Amount,
    pricing::{self, PriceBreakdown, PricingError},
    products::{Product, ProductId},
    session::{Session, User, WalletError},
    wishlist::Wishlist,
};

/// Storefront state.
#[derive(Debug, Clone)]
pub struct Store {
    config: StorefrontConfig,
    catalog: Catalog,
    cart: Cart,
    wishlist: Wishlist,
    session: Session,
    addresses: AddressBook,
    orders: OrderHistory,
}

impl Store {
    /// Create a store over a catalog.
    pub fn new(catalog: Catalog, config: StorefrontConfig) -> Self {
        let session = Session::anonymous(config.pricing.currency);

        Self {
            config,
            catalog,
            cart: Cart::new(),
            wishlist: Wishlist::new(),
            session,
            addresses: AddressBook::new(),
            orders: OrderHistory::new(),
        }
    }

    /// Store over the bundled sample catalog with default configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the bundled catalog fails to load.
    pub fn sample() -> Result<Self, FixtureError> {
        Ok(Self::new(Catalog::sample()?, StorefrontConfig::default()))
    }

    /// Configuration.
    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Product catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Look up a product. `None` renders the "Product Not Found" page.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.catalog.get(id)
    }

    /// Cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] for an unknown product or variant, or an
    /// out-of-stock selection.
    pub fn add_to_cart(&mut self, product_id: &str, variant: Option<&str>) -> Result<&CartLine, CartError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CartError::UnknownProduct(ProductId::new(product_id)))?;

        self.cart.add(product, variant)
    }

    /// Set the quantity of every line of a product; zero removes them.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        self.cart.update_quantity(product_id, quantity)
    }

    /// Set the quantity of one line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has the key.
    pub fn update_line_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<(), CartError> {
        self.cart.update_line_quantity(key, quantity)
    }

    /// Remove every line of a product.
    pub fn remove_from_cart(&mut self, product_id: &str) -> usize {
        self.cart.remove(product_id)
    }

    /// Remove one line.
    pub fn remove_line(&mut self, key: &LineKey) -> bool {
        self.cart.remove_line(key)
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Buy Now: replace the cart with a single unit of one product.
    ///
    /// The cart is left untouched if the product cannot be added.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] for an unknown product or variant, or an
    /// out-of-stock selection.
    pub fn buy_now(&mut self, product_id: &str, variant: Option<&str>) -> Result<&CartLine, CartError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CartError::UnknownProduct(ProductId::new(product_id)))?;

        let mut cart = Cart::new();
        cart.add(product, variant)?;

        self.cart = cart;

        self.cart
            .lines()
            .first()
            .ok_or_else(|| CartError::NotInCart(ProductId::new(product_id)))
    }

    /// Wishlist.
    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// Add a product to the wishlist. Returns `false` if it was already there.
    pub fn add_to_wishlist(&mut self, product_id: &str) -> bool {
        self.wishlist.add(ProductId::new(product_id))
    }

    /// Remove a product from the wishlist. Returns `false` if it was absent.
    pub fn remove_from_wishlist(&mut self, product_id: &str) -> bool {
        self.wishlist.remove(product_id)
    }

    /// Whether a product is in the wishlist.
    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.wishlist.contains(product_id)
    }

    /// Flip wishlist membership, returning the new state.
    pub fn toggle_wishlist(&mut self, product_id: &str) -> bool {
        self.wishlist.toggle(ProductId::new(product_id))
    }

    /// Session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sign in, or sign out with `None`. The cart survives either way.
    pub fn set_user(&mut self, user: Option<User>) {
        self.session.set_user(user, self.config.wallet_balance);
    }

    pub(crate) fn debit_wallet(&mut self, amount: Amount) -> Result<Amount, WalletError> {
        self.session.wallet_mut().debit(amount)
    }

    pub(crate) fn credit_wallet(&mut self, amount: Amount) -> Result<Amount, WalletError> {
        self.session.wallet_mut().credit(amount)
    }

    /// Saved addresses.
    pub fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    /// Save an address.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] if the address fails validation.
    pub fn add_address(&mut self, address: Address, make_default: bool) -> Result<AddressKey, AddressError> {
        self.addresses.add(address, make_default)
    }

    /// Delete a saved address.
    pub fn remove_address(&mut self, key: AddressKey) -> Option<Address> {
        self.addresses.remove(key)
    }

    /// Mark a saved address as the default.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown key.
    pub fn set_default_address(&mut self, key: AddressKey) -> Result<(), AddressError> {
        self.addresses.set_default(key)
    }

    /// Order history.
    pub fn orders(&self) -> &OrderHistory {
        &self.orders
    }

    /// Look up an order.
    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Record a placed order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::DuplicateId`] if the id is taken.
    pub fn add_order(&mut self, order: Order) -> Result<&Order, OrderError> {
        self.orders.add(order)
    }

    /// Cancel an order inside the configured cancellation window, returning
    /// its wallet deduction to the wallet.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if the order is unknown, already cancelled,
    /// past its window, or the refund is rejected by the wallet.
    pub fn cancel_order(&mut self, id: &str, now: Timestamp) -> Result<&Order, OrderError> {
        let order = self.orders.cancel(id, now, self.config.cancellation_window)?;
        let refund = order.pricing().wallet_deduction();

        if refund.to_minor_units() > 0 {
            self.session.wallet_mut().credit(refund)?;
        }

        Ok(order)
    }

    /// Validate a coupon code against the configured coupon.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] for a blank or unknown code.
    pub fn apply_coupon(&self, code: &str) -> Result<AppliedCoupon<'_>, CouponError> {
        coupons::apply_coupon(code, &self.config.pricing.coupon)
    }

    /// Price the current cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on currency mismatch or overflow.
    pub fn quote_cart(
        &self,
        coupon: Option<&AppliedCoupon<'_>>,
        use_wallet: bool,
    ) -> Result<PriceBreakdown, PricingError> {
        let wallet = use_wallet.then(|| self.session.wallet().balance());

        pricing::quote(self.cart.lines(), &self.config.pricing, coupon, wallet)
    }
}
