//! Entrypoint Pricing

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{PaymentError, Result};

/// Entrypoint key to USD price per call
#[derive(Clone, Debug, Default)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a price; zero prices are stored as free
    pub fn set(&mut self, key: impl Into<String>, price: Decimal) -> Result<()> {
        if price.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!("negative price {price}")));
        }
        let key = key.into();
        if price.is_zero() {
            self.prices.remove(&key);
        } else {
            self.prices.insert(key, price);
        }
        Ok(())
    }

    /// Build from `(key, price string)` pairs, as manifests advertise them
    pub fn from_listing<'a>(listing: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Result<Self> {
        let mut table = Self::new();
        for (key, price) in listing {
            if let Some(price) = price {
                let parsed = Decimal::from_str(price)
                    .map_err(|e| PaymentError::Config(format!("price for {key}: {e}")))?;
                table.set(key, parsed)?;
            }
        }
        Ok(table)
    }

    /// Price of one call; unknown keys are free
    pub fn price(&self, key: &str) -> Decimal {
        self.prices.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn is_free(&self, key: &str) -> bool {
        self.price(key).is_zero()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
