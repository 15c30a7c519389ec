//! Orders
//!
//! A placed order is a snapshot: its lines and totals are fixed at placement.
//! Only its status moves, and only through [`OrderHistory::cancel`].

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use tracing::info;

use crate::{
    addresses::Address,
    cart::CartLine,
    checkout::{delivery::DeliveryPlan, payment::PaymentMethod},
    countdown::Countdown,
    pricing::PriceBreakdown,
    session::WalletError,
};

/// Order errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An order with this id is already in the history.
    #[error("duplicate order id {0}")]
    DuplicateId(OrderId),

    /// No order has this id.
    #[error("order {0} not found")]
    NotFound(String),

    /// The cancellation window has run out.
    #[error("order {0} can no longer be cancelled")]
    CancellationWindowClosed(OrderId),

    /// The order was cancelled before.
    #[error("order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    /// The wallet deduction could not be refunded.
    #[error(transparent)]
    Refund(#[from] WalletError),
}

/// Order identifier, derived from the placement time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(String);

impl OrderId {
    /// Id for an order placed at `at`: `ORD` followed by Unix milliseconds.
    pub fn from_timestamp(at: Timestamp) -> Self {
        Self(format!("ORD{}", at.as_millisecond()))
    }

    /// Wrap an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an order stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStatus {
    /// Placed and being prepared
    #[default]
    Processing,

    /// Cancelled by the shopper inside the window
    Cancelled {
        /// When it was cancelled
        at: Timestamp,
    },
}

impl OrderStatus {
    /// Whether the order was cancelled.
    pub fn is_cancelled(self) -> bool {
        matches!(self, OrderStatus::Cancelled { .. })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Cancelled { .. } => "Cancelled",
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    lines: Vec<CartLine>,
    pricing: PriceBreakdown,
    created_at: Timestamp,
    delivery: DeliveryPlan,
    payment: PaymentMethod,
    address: Option<Address>,
    coupon_code: Option<String>,
    status: OrderStatus,
}

/// Everything an order is built from besides its id and lines.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    /// Price breakdown at placement
    pub pricing: PriceBreakdown,
    /// Placement time
    pub created_at: Timestamp,
    /// Delivery plan
    pub delivery: DeliveryPlan,
    /// Payment method
    pub payment: PaymentMethod,
    /// Delivery address, if one was chosen
    pub address: Option<Address>,
    /// Applied coupon code
    pub coupon_code: Option<String>,
}

impl Order {
    /// Snapshot cart lines into a new order.
    pub fn new(id: OrderId, lines: &[CartLine], details: OrderDetails) -> Self {
        Self {
            id,
            lines: lines.to_vec(),
            pricing: details.pricing,
            created_at: details.created_at,
            delivery: details.delivery,
            payment: details.payment,
            address: details.address,
            coupon_code: details.coupon_code,
            status: OrderStatus::Processing,
        }
    }

    /// Order id.
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Lines as they were at placement.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Price breakdown as it was at placement.
    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    /// Placement time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Delivery plan.
    pub fn delivery(&self) -> &DeliveryPlan {
        &self.delivery
    }

    /// Payment method.
    pub fn payment(&self) -> PaymentMethod {
        self.payment
    }

    /// Delivery address.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Applied coupon code.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Total number of units across lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// The cancellation countdown, started at placement.
    pub fn cancellation_window(&self, window: SignedDuration) -> Countdown {
        Countdown::new(self.created_at, window)
    }

    /// Whether the order may still be cancelled at `now`.
    pub fn can_cancel(&self, now: Timestamp, window: SignedDuration) -> bool {
        !self.status.is_cancelled() && !self.cancellation_window(window).is_expired(now)
    }

    /// Delivery timeline as of `now`.
    pub fn tracking(&self, now: Timestamp) -> SmallVec<[TrackingStep; 4]> {
        if let OrderStatus::Cancelled { at } = self.status {
            return smallvec![TrackingStep {
                stage: TrackingStage::Cancelled,
                at,
                reached: true,
            }];
        }

        TrackingStage::TIMELINE
            .into_iter()
            .map(|stage| {
                let at = self.created_at + stage.offset();

                TrackingStep {
                    stage,
                    at,
                    reached: at <= now,
                }
            })
            .collect()
    }
}

/// A stage of the delivery timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStage {
    /// Order placed
    Placed,
    /// Packed at the store
    Packed,
    /// With the delivery partner
    OutForDelivery,
    /// Handed over
    Delivered,
    /// Cancelled
    Cancelled,
}

impl TrackingStage {
    /// Stages of an order that was not cancelled.
    pub const TIMELINE: [TrackingStage; 4] = [
        TrackingStage::Placed,
        TrackingStage::Packed,
        TrackingStage::OutForDelivery,
        TrackingStage::Delivered,
    ];

    /// Time after placement the stage is reached.
    pub fn offset(self) -> SignedDuration {
        match self {
            TrackingStage::Placed | TrackingStage::Cancelled => SignedDuration::ZERO,
            TrackingStage::Packed => SignedDuration::from_mins(30),
            TrackingStage::OutForDelivery => SignedDuration::from_mins(60),
            TrackingStage::Delivered => SignedDuration::from_mins(120),
        }
    }

    /// Label shown on the tracking page.
    pub fn label(self) -> &'static str {
        match self {
            TrackingStage::Placed => "Order placed",
            TrackingStage::Packed => "Packed",
            TrackingStage::OutForDelivery => "Out for delivery",
            TrackingStage::Delivered => "Delivered",
            TrackingStage::Cancelled => "Cancelled",
        }
    }
}

/// One row of the tracking timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStep {
    /// Stage
    pub stage: TrackingStage,
    /// When the stage is (or was) reached
    pub at: Timestamp,
    /// Whether it has been reached
    pub reached: bool,
}

/// Every order placed in this session, oldest first.
#[derive(Debug, Clone, Default)]
pub struct OrderHistory {
    orders: Vec<Order>,
}

impl OrderHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placed order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::DuplicateId`] if the id is taken.
    pub fn add(&mut self, order: Order) -> Result<&Order, OrderError> {
        if self.contains(order.id.as_str()) {
            return Err(OrderError::DuplicateId(order.id));
        }

        info!(order_id = %order.id, total = %order.pricing.total(), "order placed");

        let id = order.id.clone();
        self.orders.push(order);

        self.get(id.as_str())
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Look up an order.
    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id.as_str() == id)
    }

    /// Whether an order has this id.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// An id for an order placed at `at` that is not yet taken.
    pub fn next_id(&self, at: Timestamp) -> OrderId {
        let mut millis = at.as_millisecond();

        loop {
            let id = OrderId(format!("ORD{millis}"));

            if !self.contains(id.as_str()) {
                return id;
            }

            millis = millis.saturating_add(1);
        }
    }

    /// Orders, most recent first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().rev()
    }

    /// Cancel an order inside its cancellation window.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`], [`OrderError::AlreadyCancelled`] or
    /// [`OrderError::CancellationWindowClosed`].
    pub fn cancel(
        &mut self,
        id: &str,
        now: Timestamp,
        window: SignedDuration,
    ) -> Result<&Order, OrderError> {
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id.as_str() == id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if order.status.is_cancelled() {
            return Err(OrderError::AlreadyCancelled(order.id.clone()));
        }

        if order.cancellation_window(window).is_expired(now) {
            return Err(OrderError::CancellationWindowClosed(order.id.clone()));
        }

        order.status = OrderStatus::Cancelled { at: now };

        info!(order_id = %order.id, "order cancelled");

        Ok(order)
    }

    /// Number of orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether no order has been placed.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
