//! Delivery slots

use std::{fmt, str::FromStr};

use smallvec::SmallVec;
use thiserror::Error;

use crate::cart::LineKey;

/// Unrecognised slot name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown delivery slot {0:?}")]
pub struct UnknownSlot(pub String);

/// Delivery time window offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliverySlot {
    /// Within 90 minutes of ordering
    #[default]
    Express,

    /// 7 AM – 10 AM
    Morning,

    /// 12 PM – 3 PM
    Afternoon,

    /// 6 PM – 9 PM
    Evening,
}

impl DeliverySlot {
    /// Every slot, in display order.
    pub const ALL: [DeliverySlot; 4] = [
        DeliverySlot::Express,
        DeliverySlot::Morning,
        DeliverySlot::Afternoon,
        DeliverySlot::Evening,
    ];

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            DeliverySlot::Express => "express",
            DeliverySlot::Morning => "morning",
            DeliverySlot::Afternoon => "afternoon",
            DeliverySlot::Evening => "evening",
        }
    }

    /// Time window shown to the shopper.
    pub fn window(self) -> &'static str {
        match self {
            DeliverySlot::Express => "In 90 minutes",
            DeliverySlot::Morning => "7 AM - 10 AM",
            DeliverySlot::Afternoon => "12 PM - 3 PM",
            DeliverySlot::Evening => "6 PM - 9 PM",
        }
    }
}

impl fmt::Display for DeliverySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeliverySlot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliverySlot::ALL
            .into_iter()
            .find(|slot| slot.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// How an order is delivered: all at once or line by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Every line arrives in the same slot.
    Single(DeliverySlot),

    /// Each line has its own slot, in cart order.
    PerItem(SmallVec<[(LineKey, DeliverySlot); 4]>),
}

impl DeliveryPlan {
    /// Slot a line is delivered in.
    pub fn slot_for(&self, key: &LineKey) -> Option<DeliverySlot> {
        match self {
            DeliveryPlan::Single(slot) => Some(*slot),
            DeliveryPlan::PerItem(slots) => slots
                .iter()
                .find(|(line, _)| line == key)
                .map(|(_, slot)| *slot),
        }
    }

    /// Number of separate deliveries.
    pub fn shipment_count(&self) -> usize {
        match self {
            DeliveryPlan::Single(_) => 1,
            DeliveryPlan::PerItem(slots) => {
                let mut distinct: SmallVec<[DeliverySlot; 4]> = SmallVec::new();

                for (_, slot) in slots {
                    if !distinct.contains(slot) {
                        distinct.push(*slot);
                    }
                }

                distinct.len()
            }
        }
    }
}

impl Default for DeliveryPlan {
    fn default() -> Self {
        DeliveryPlan::Single(DeliverySlot::default())
    }
}
