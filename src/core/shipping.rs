//! Default delivery charges by shipping zone.
//!
//! The charge looked up here only pre-fills the delivery field of a draft order;
//! the user can still override it by hand.

use crate::{
    config::settings::ShippingZoneConfig,
    core::pricing::ValidationError,
    errors::Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Lookup table from zone name (case-insensitive) to delivery charge.
#[derive(Debug, Clone, Default)]
pub struct ShippingZones {
    charges: HashMap<String, Decimal>,
}

impl ShippingZones {
    /// Builds the table from configuration, rejecting negative charges.
    ///
    /// # Errors
    /// Returns `InvalidDeliveryCharge` for the first zone with a negative charge.
    pub fn from_config(zones: &[ShippingZoneConfig]) -> Result<Self> {
        let mut charges = HashMap::with_capacity(zones.len());
        for zone in zones {
            if zone.delivery_charge < Decimal::ZERO {
                return Err(ValidationError::InvalidDeliveryCharge {
                    amount: zone.delivery_charge,
                }
                .into());
            }
            charges.insert(normalize(&zone.name), zone.delivery_charge);
        }
        Ok(Self { charges })
    }

    /// Delivery charge configured for a zone, if the zone is known.
    #[must_use]
    pub fn delivery_charge_for(&self, zone: &str) -> Option<Decimal> {
        self.charges.get(&normalize(zone)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.charges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }
}

fn normalize(zone: &str) -> String {
    zone.trim().to_lowercase()
}
