use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;

use crate::clock::clock::{Clock, PktDateTime};
use crate::types::{price::Price, symbol::Symbol};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveQuote {
    pub price: Price,
    pub timestamp: PktDateTime,
    pub source: String,
}

/// Live price feed. `Ok(None)` means the source had nothing for the symbol; errors are transport
/// or parse failures. Neither is fatal to the scheduler.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn live_price(&self, symbol: &Symbol) -> Result<Option<LiveQuote>>;
}

/// Random jitter around a reference price, with occasional simulated outages.
pub struct SyntheticPriceSource {
    clock: Arc<dyn Clock>,
    reference: Price,
    max_jitter: f64,
    outage_probability: f64,
}

impl SyntheticPriceSource {
    pub fn new(
        clock: Arc<dyn Clock>,
        reference: Price,
        max_jitter: f64,
        outage_probability: f64,
    ) -> Self {
        Self {
            clock,
            reference,
            max_jitter: max_jitter.abs(),
            outage_probability: outage_probability.clamp(0.0, 1.0),
        }
    }

    pub fn around(clock: Arc<dyn Clock>, reference: Price) -> Self {
        Self::new(clock, reference, 0.002, 0.1)
    }
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn live_price(&self, symbol: &Symbol) -> Result<Option<LiveQuote>> {
        let (outage, jitter) = {
            let mut rng = rand::rng();
            let outage = rng.random_bool(self.outage_probability);
            let jitter = if self.max_jitter > 0.0 {
                rng.random_range(-self.max_jitter..=self.max_jitter)
            } else {
                0.0
            };
            (outage, jitter)
        };

        if outage {
            bail!("synthetic feed outage for {symbol}");
        }

        Ok(Some(LiveQuote {
            price: Price::try_from(self.reference * (1.0 + jitter))?,
            timestamp: self.clock.now(),
            source: self.name().to_string(),
        }))
    }
}

/// Always quotes the same price.
pub struct FixedPriceSource {
    clock: Arc<dyn Clock>,
    price: Price,
}

impl FixedPriceSource {
    pub fn new(clock: Arc<dyn Clock>, price: Price) -> Self {
        Self { clock, price }
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn live_price(&self, _symbol: &Symbol) -> Result<Option<LiveQuote>> {
        Ok(Some(LiveQuote {
            price: self.price,
            timestamp: self.clock.now(),
            source: self.name().to_string(),
        }))
    }
}

/// No live feed at all; callers resolve to the last known or fallback price.
pub struct OfflinePriceSource;

#[async_trait]
impl PriceSource for OfflinePriceSource {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn live_price(&self, _symbol: &Symbol) -> Result<Option<LiveQuote>> {
        Ok(None)
    }
}
