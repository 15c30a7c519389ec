//! Checkout
//!
//! Collects delivery, address, payment, coupon and wallet choices, then
//! places the order in two steps: [`Checkout::begin_placement`] locks the
//! choices and [`Checkout::complete`] turns the cart into an order.
//!
//! Moving between stages is not gated; a shopper may reach payment without
//! picking an address.

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    addresses::{AddressError, AddressKey},
    cart::LineKey,
    coupons::{self, CouponError},
    orders::{Order, OrderDetails, OrderError, OrderId},
    prices::Amount,
    pricing::{PriceBreakdown, PricingError},
    routes::Route,
    session::WalletError,
    store::Store,
};

pub mod delivery;
pub mod payment;

use delivery::{DeliveryPlan, DeliverySlot};
use payment::PaymentMethod;

/// Checkout errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// The shopper must be sent elsewhere: the cart when it is empty, the
    /// login page when nobody is signed in.
    #[error("redirect to {0}")]
    Redirect(Route),

    /// A line has no delivery slot in per-item mode.
    #[error("choose a delivery slot for {0}")]
    MissingSlot(LineKey),

    /// A slot was chosen for a line that is not in the cart.
    #[error("{0} is not in the cart")]
    UnknownLine(LineKey),

    /// Placement was not started.
    #[error("order placement has not started")]
    NotPlacing,

    /// Coupon was rejected.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Pricing failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wallet could not be debited.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Order could not be recorded.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Address selection failed.
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Where the shopper is in checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutStage {
    /// Choosing delivery slots
    #[default]
    SelectingDelivery,
    /// Choosing an address
    SelectingAddress,
    /// Choosing how to pay
    SelectingPayment,
    /// Order is being placed
    PlacingOrder,
    /// Order placed
    OrderPlaced,
}

impl CheckoutStage {
    /// Stage after this one, if the shopper can move on by themselves.
    pub fn next(self) -> Option<Self> {
        match self {
            CheckoutStage::SelectingDelivery => Some(CheckoutStage::SelectingAddress),
            CheckoutStage::SelectingAddress => Some(CheckoutStage::SelectingPayment),
            CheckoutStage::SelectingPayment
            | CheckoutStage::PlacingOrder
            | CheckoutStage::OrderPlaced => None,
        }
    }
}

/// Whether the order ships in one slot or one slot per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Everything in one slot
    #[default]
    Single,
    /// A slot per line
    PerItem,
}

/// Locked choices for an order being placed.
///
/// Placement cannot be cancelled once begun; pass this to
/// [`Checkout::complete`].
#[derive(Debug)]
#[must_use]
pub struct PendingPlacement {
    mode: DeliveryMode,
    single_slot: DeliverySlot,
    item_slots: FxHashMap<LineKey, DeliverySlot>,
    address: Option<AddressKey>,
    payment: PaymentMethod,
    coupon_code: Option<String>,
    use_wallet: bool,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// New order id
    pub order_id: OrderId,
    /// Where to send the shopper
    pub redirect: Route,
}

/// Checkout state for one visit to the checkout page.
#[derive(Debug, Clone)]
pub struct Checkout {
    direct: bool,
    stage: CheckoutStage,
    mode: DeliveryMode,
    single_slot: DeliverySlot,
    item_slots: FxHashMap<LineKey, DeliverySlot>,
    address: Option<AddressKey>,
    payment: PaymentMethod,
    coupon_code: Option<String>,
    use_wallet: bool,
}

impl Checkout {
    /// Enter checkout. `direct` marks a Buy Now checkout.
    ///
    /// The default saved address is preselected.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Redirect`] to the cart when it is empty, or to
    /// the login page when nobody is signed in.
    pub fn start(store: &Store, direct: bool) -> Result<Self, CheckoutError> {
        ensure_can_place(store)?;

        Ok(Self {
            direct,
            stage: CheckoutStage::SelectingDelivery,
            mode: DeliveryMode::Single,
            single_slot: DeliverySlot::default(),
            item_slots: FxHashMap::default(),
            address: store.addresses().default_address().map(|(key, _)| key),
            payment: PaymentMethod::default(),
            coupon_code: None,
            use_wallet: false,
        })
    }

    /// Whether this is a Buy Now checkout.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Route of this checkout page.
    pub fn route(&self) -> Route {
        Route::Checkout {
            direct: self.direct,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    /// Move to the next selection stage, if there is one.
    pub fn advance(&mut self) -> CheckoutStage {
        if let Some(next) = self.stage.next() {
            self.stage = next;
        }

        self.stage
    }

    /// Jump to a selection stage. Placement stages are only reached by
    /// placing the order.
    pub fn go_to(&mut self, stage: CheckoutStage) {
        if matches!(
            stage,
            CheckoutStage::SelectingDelivery
                | CheckoutStage::SelectingAddress
                | CheckoutStage::SelectingPayment
        ) {
            self.stage = stage;
        }
    }

    /// Delivery mode.
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Switch between one slot for the order and a slot per line.
    pub fn set_delivery_mode(&mut self, mode: DeliveryMode) {
        self.mode = mode;
    }

    /// Slot for the whole order in single mode.
    pub fn set_slot(&mut self, slot: DeliverySlot) {
        self.single_slot = slot;
    }

    /// Slot for one line in per-item mode.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownLine`] if the line is not in the cart.
    pub fn set_item_slot(
        &mut self,
        store: &Store,
        key: &LineKey,
        slot: DeliverySlot,
    ) -> Result<(), CheckoutError> {
        if store.cart().line(key).is_none() {
            return Err(CheckoutError::UnknownLine(key.clone()));
        }

        self.item_slots.insert(key.clone(), slot);

        Ok(())
    }

    /// Resolve the delivery plan against the current cart, in cart order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingSlot`] for the first line without a
    /// slot in per-item mode.
    pub fn delivery_plan(&self, store: &Store) -> Result<DeliveryPlan, CheckoutError> {
        resolve_plan(self.mode, self.single_slot, &self.item_slots, store)
    }

    /// Selected address.
    pub fn address(&self) -> Option<AddressKey> {
        self.address
    }

    /// Select a saved address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown key.
    pub fn select_address(&mut self, store: &Store, key: AddressKey) -> Result<(), CheckoutError> {
        if store.addresses().get(key).is_none() {
            return Err(AddressError::NotFound.into());
        }

        self.address = Some(key);

        Ok(())
    }

    /// Selected payment method.
    pub fn payment(&self) -> PaymentMethod {
        self.payment
    }

    /// Choose how to pay.
    pub fn set_payment(&mut self, payment: PaymentMethod) {
        self.payment = payment;
    }

    /// Applied coupon code, canonicalised.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Apply a coupon code. A rejected code leaves any earlier coupon off.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] for a blank or unknown code.
    pub fn apply_coupon(&mut self, store: &Store, code: &str) -> Result<(), CheckoutError> {
        match store.apply_coupon(code) {
            Ok(coupon) => {
                debug!(code = coupon.code(), "applied coupon");

                self.coupon_code = Some(coupon.code().to_string());

                Ok(())
            }
            Err(err) => {
                self.coupon_code = None;

                Err(err.into())
            }
        }
    }

    /// Drop the applied coupon.
    pub fn remove_coupon(&mut self) {
        self.coupon_code = None;
    }

    /// Whether the wallet is used.
    pub fn uses_wallet(&self) -> bool {
        self.use_wallet
    }

    /// Opt in or out of paying from the wallet.
    pub fn set_use_wallet(&mut self, use_wallet: bool) {
        self.use_wallet = use_wallet;
    }

    /// Price the cart with the current choices.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the stored coupon no longer applies or
    /// pricing fails.
    pub fn quote(&self, store: &Store) -> Result<PriceBreakdown, CheckoutError> {
        quote_with(store, self.coupon_code.as_deref(), self.use_wallet)
    }

    /// Lock the choices and start placing the order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Redirect`] for an empty cart or signed-out
    /// session, or [`CheckoutError::MissingSlot`] if a line has no slot.
    pub fn begin_placement(&mut self, store: &Store) -> Result<PendingPlacement, CheckoutError> {
        ensure_can_place(store)?;
        self.delivery_plan(store)?;

        self.stage = CheckoutStage::PlacingOrder;

        debug!(payment = %self.payment, "placing order");

        Ok(PendingPlacement {
            mode: self.mode,
            single_slot: self.single_slot,
            item_slots: self.item_slots.clone(),
            address: self.address,
            payment: self.payment,
            coupon_code: self.coupon_code.clone(),
            use_wallet: self.use_wallet,
        })
    }

    /// Finish placing the order: snapshot the cart, debit the wallet, record
    /// the order and clear the cart.
    ///
    /// On failure no order is recorded and the cart and wallet are left as
    /// they were.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Redirect`] to the cart if it was emptied in
    /// the meantime, or to login if the session ended, plus any pricing,
    /// wallet or order error.
    pub fn complete(
        &mut self,
        pending: PendingPlacement,
        store: &mut Store,
        now: Timestamp,
    ) -> Result<PlacedOrder, CheckoutError> {
        if self.stage != CheckoutStage::PlacingOrder {
            return Err(CheckoutError::NotPlacing);
        }

        let placed = place(pending, store, now);

        self.stage = match placed {
            Ok(_) => CheckoutStage::OrderPlaced,
            Err(_) => CheckoutStage::SelectingPayment,
        };

        placed
    }
}

fn ensure_can_place(store: &Store) -> Result<(), CheckoutError> {
    if store.cart().is_empty() {
        return Err(CheckoutError::Redirect(Route::Cart));
    }

    if !store.session().is_logged_in() {
        return Err(CheckoutError::Redirect(Route::Login));
    }

    Ok(())
}

fn resolve_plan(
    mode: DeliveryMode,
    single_slot: DeliverySlot,
    item_slots: &FxHashMap<LineKey, DeliverySlot>,
    store: &Store,
) -> Result<DeliveryPlan, CheckoutError> {
    match mode {
        DeliveryMode::Single => Ok(DeliveryPlan::Single(single_slot)),
        DeliveryMode::PerItem => store
            .cart()
            .lines()
            .iter()
            .map(|line| {
                item_slots
                    .get(line.key())
                    .map(|slot| (line.key().clone(), *slot))
                    .ok_or_else(|| CheckoutError::MissingSlot(line.key().clone()))
            })
            .collect::<Result<SmallVec<_>, _>>()
            .map(DeliveryPlan::PerItem),
    }
}

fn quote_with(
    store: &Store,
    coupon_code: Option<&str>,
    use_wallet: bool,
) -> Result<PriceBreakdown, CheckoutError> {
    let coupon = coupon_code
        .map(|code| coupons::apply_coupon(code, &store.config().pricing.coupon))
        .transpose()?;

    Ok(store.quote_cart(coupon.as_ref(), use_wallet)?)
}

fn place(pending: PendingPlacement, store: &mut Store, now: Timestamp) -> Result<PlacedOrder, CheckoutError> {
    ensure_can_place(store)?;

    let delivery = resolve_plan(pending.mode, pending.single_slot, &pending.item_slots, store)?;
    let pricing = quote_with(store, pending.coupon_code.as_deref(), pending.use_wallet)?;

    let address = pending
        .address
        .and_then(|key| store.addresses().get(key))
        .cloned();

    let order_id = store.orders().next_id(now);
    let order = Order::new(
        order_id.clone(),
        store.cart().lines(),
        OrderDetails {
            pricing,
            created_at: now,
            delivery,
            payment: pending.payment,
            address,
            coupon_code: pending.coupon_code,
        },
    );

    record(store, order, pricing.wallet_deduction())?;
    store.clear_cart();

    info!(order_id = %order_id, "checkout complete");

    Ok(PlacedOrder {
        redirect: Route::OrderSuccess {
            order_id: Some(order_id.to_string()),
        },
        order_id,
    })
}

/// Debit the wallet and record the order; a rejected order hands the debit
/// back.
fn record(store: &mut Store, order: Order, deduction: Amount) -> Result<(), CheckoutError> {
    let debited = deduction.to_minor_units() > 0;

    if debited {
        store.debit_wallet(deduction)?;
    }

    let recorded = store.add_order(order).map(|_| ());

    if let Err(err) = recorded {
        if debited {
            store.credit_wallet(deduction)?;
        }

        return Err(err.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::INR};
    use testresult::TestResult;

    use crate::{addresses::tests::test_address, session::User};

    use super::*;

    fn signed_in_store() -> TestResult<Store> {
        let mut store = Store::sample()?;
        store.set_user(Some(User::new("asha@example.com", "Asha")));

        Ok(store)
    }

    fn now() -> TestResult<Timestamp> {
        Ok("2026-03-01T10:00:00Z".parse()?)
    }

    #[test]
    fn empty_cart_redirects_to_cart() -> TestResult {
        let store = signed_in_store()?;

        assert_eq!(
            Checkout::start(&store, false).err(),
            Some(CheckoutError::Redirect(Route::Cart))
        );

        Ok(())
    }

    #[test]
    fn signed_out_redirects_to_login() -> TestResult {
        let mut store = Store::sample()?;
        store.add_to_cart("2", None)?;

        assert_eq!(
            Checkout::start(&store, false).err(),
            Some(CheckoutError::Redirect(Route::Login))
        );

        Ok(())
    }

    #[test]
    fn stages_are_not_gated() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;

        let mut checkout = Checkout::start(&store, false)?;

        assert_eq!(checkout.advance(), CheckoutStage::SelectingAddress);
        assert_eq!(checkout.advance(), CheckoutStage::SelectingPayment);
        assert_eq!(checkout.advance(), CheckoutStage::SelectingPayment);
        assert!(checkout.address().is_none());

        checkout.go_to(CheckoutStage::OrderPlaced);
        assert_eq!(checkout.stage(), CheckoutStage::SelectingPayment);

        checkout.go_to(CheckoutStage::SelectingDelivery);
        assert_eq!(checkout.stage(), CheckoutStage::SelectingDelivery);

        Ok(())
    }

    #[test]
    fn default_address_is_preselected() -> TestResult {
        let mut store = signed_in_store()?;
        let key = store.add_address(test_address(), true)?;
        store.add_to_cart("2", None)?;

        let checkout = Checkout::start(&store, false)?;

        assert_eq!(checkout.address(), Some(key));

        Ok(())
    }

    #[test]
    fn per_item_mode_needs_every_slot() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;
        store.add_to_cart("6", None)?;

        let mut checkout = Checkout::start(&store, false)?;
        checkout.set_delivery_mode(DeliveryMode::PerItem);
        checkout.set_item_slot(&store, &LineKey::from("2"), DeliverySlot::Morning)?;

        assert_eq!(
            checkout.begin_placement(&store).err(),
            Some(CheckoutError::MissingSlot(LineKey::from("6")))
        );
        assert_eq!(checkout.stage(), CheckoutStage::SelectingDelivery);

        checkout.set_item_slot(&store, &LineKey::from("6"), DeliverySlot::Evening)?;

        assert_eq!(checkout.delivery_plan(&store)?.shipment_count(), 2);
        assert_eq!(
            checkout.set_item_slot(&store, &LineKey::from("8"), DeliverySlot::Morning),
            Err(CheckoutError::UnknownLine(LineKey::from("8")))
        );

        Ok(())
    }

    #[test]
    fn rejected_coupon_is_not_kept() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;

        let mut checkout = Checkout::start(&store, false)?;

        checkout.apply_coupon(&store, "fresh20")?;
        assert_eq!(checkout.coupon_code(), Some("FRESH20"));

        assert!(matches!(
            checkout.apply_coupon(&store, "FRESH25"),
            Err(CheckoutError::Coupon(CouponError::Invalid(_)))
        ));
        assert_eq!(checkout.coupon_code(), None);
        assert_eq!(
            checkout.quote(&store)?.coupon_discount(),
            Money::from_minor(0, INR)
        );

        Ok(())
    }

    #[test]
    fn complete_places_order_and_clears_cart() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;

        let mut checkout = Checkout::start(&store, false)?;
        checkout.set_use_wallet(true);
        checkout.set_payment(PaymentMethod::CashOnDelivery);

        let pending = checkout.begin_placement(&store)?;
        assert_eq!(checkout.stage(), CheckoutStage::PlacingOrder);

        let placed = checkout.complete(pending, &mut store, now()?)?;

        assert_eq!(checkout.stage(), CheckoutStage::OrderPlaced);
        assert_eq!(
            placed.redirect.to_string(),
            format!("/order-success?orderId={}", placed.order_id)
        );
        assert!(store.cart().is_empty());

        let order = store.order(placed.order_id.as_str()).ok_or("order missing")?;

        assert_eq!(order.payment(), PaymentMethod::CashOnDelivery);
        assert_eq!(order.pricing().wallet_deduction(), Money::from_minor(6_000, INR));
        assert_eq!(order.pricing().total(), Money::from_minor(54_000, INR));
        assert_eq!(
            store.session().wallet().balance(),
            Money::from_minor(19_000, INR)
        );

        Ok(())
    }

    #[test]
    fn cart_emptied_during_placement_redirects_without_order() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;

        let mut checkout = Checkout::start(&store, false)?;
        let pending = checkout.begin_placement(&store)?;

        store.clear_cart();

        assert_eq!(
            checkout.complete(pending, &mut store, now()?),
            Err(CheckoutError::Redirect(Route::Cart))
        );
        assert!(store.orders().is_empty());
        assert_eq!(checkout.stage(), CheckoutStage::SelectingPayment);

        Ok(())
    }

    #[test]
    fn rejected_order_hands_back_the_wallet_debit() -> TestResult {
        let mut store = signed_in_store()?;
        store.add_to_cart("2", None)?;

        let mut checkout = Checkout::start(&store, false)?;
        let pending = checkout.begin_placement(&store)?;
        let placed = checkout.complete(pending, &mut store, now()?)?;

        let duplicate = store
            .order(placed.order_id.as_str())
            .cloned()
            .ok_or("order should exist")?;
        let before = store.session().wallet().balance();

        assert_eq!(
            record(&mut store, duplicate, Money::from_minor(6_000, INR)),
            Err(CheckoutError::Order(OrderError::DuplicateId(placed.order_id)))
        );
        assert_eq!(store.session().wallet().balance(), before);
        assert_eq!(store.orders().len(), 1);

        Ok(())
    }
}
