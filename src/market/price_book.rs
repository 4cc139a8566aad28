use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use chrono::Duration;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::clock::PktDateTime;
use crate::market::price_source::{LiveQuote, PriceSource};
use crate::types::{price::Price, symbol::Symbol};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum PriceOrigin {
    Live { source: String },
    LastKnown { source: String, age_seconds: i64 },
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPrice {
    pub price: Price,
    pub origin: PriceOrigin,
}

/// Last known quote per symbol. Resolves the base price for generation as live quote, then last
/// known quote, then the caller's fallback, so a missing feed never stops generation.
#[derive(Clone, Default)]
pub struct PriceBook {
    last_quotes: HashMap<Symbol, LiveQuote>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_quote(&mut self, symbol: &Symbol, quote: LiveQuote) {
        self.last_quotes.insert(symbol.clone(), quote);
    }

    pub fn last_quote(&self, symbol: &Symbol) -> Option<&LiveQuote> {
        self.last_quotes.get(symbol)
    }

    pub fn is_stale(&self, symbol: &Symbol, max_age: Duration, now: &PktDateTime) -> bool {
        match self.last_quote(symbol) {
            Some(quote) => *now - quote.timestamp > max_age,
            None => true,
        }
    }

    pub fn resolve(
        &mut self,
        symbol: &Symbol,
        live: Result<Option<LiveQuote>>,
        fallback: Price,
        now: &PktDateTime,
    ) -> ResolvedPrice {
        match live {
            Ok(Some(quote)) => {
                let resolved = ResolvedPrice {
                    price: quote.price,
                    origin: PriceOrigin::Live {
                        source: quote.source.clone(),
                    },
                };
                self.on_quote(symbol, quote);
                return resolved;
            }
            Ok(None) => debug!(%symbol, "no live price; using last known or fallback"),
            Err(error) => warn!(%symbol, "live price unavailable: {error:#}"),
        }

        match self.last_quote(symbol) {
            Some(quote) => ResolvedPrice {
                price: quote.price,
                origin: PriceOrigin::LastKnown {
                    source: quote.source.clone(),
                    age_seconds: (*now - quote.timestamp).num_seconds(),
                },
            },
            None => ResolvedPrice {
                price: fallback,
                origin: PriceOrigin::Fallback,
            },
        }
    }

    pub async fn refresh(
        &mut self,
        source: &dyn PriceSource,
        symbol: &Symbol,
        fallback: Price,
        now: &PktDateTime,
    ) -> ResolvedPrice {
        let live = source.live_price(symbol).await;

        self.resolve(symbol, live, fallback, now)
    }
}

impl fmt::Debug for PriceBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceBook")
            .field("symbols", &self.last_quotes.len())
            .field(
                "last_prices",
                &self
                    .last_quotes
                    .iter()
                    .map(|(symbol, quote)| (symbol.as_str(), quote.price.as_f64()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
