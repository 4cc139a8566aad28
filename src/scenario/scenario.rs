use std::sync::Arc;

use crate::{
    clock::clock::Clock,
    market::{
        history::{HistoricalDataSource, SyntheticHistory},
        price_source::{FixedPriceSource, OfflinePriceSource, PriceSource, SyntheticPriceSource},
    },
    scenario::sources::SourceKind,
    types::{market_calendar::TradingCalendar, price::Price},
};

pub struct Scenario;

type DynamicPriceSource = Box<dyn PriceSource>;
type DynamicHistory = Box<dyn HistoricalDataSource>;

impl Scenario {
    pub fn price_source(kind: SourceKind, clock: Arc<dyn Clock>, reference: Price) -> DynamicPriceSource {
        tracing::info!(source = %kind, %reference, "creating price source");

        match kind {
            SourceKind::Synthetic => Box::new(SyntheticPriceSource::around(clock, reference)),
            SourceKind::Fixed => Box::new(FixedPriceSource::new(clock, reference)),
            SourceKind::Offline => Box::new(OfflinePriceSource),
        }
    }

    pub fn history(
        clock: Arc<dyn Clock>,
        calendar: TradingCalendar,
        reference: Price,
    ) -> DynamicHistory {
        Box::new(SyntheticHistory::new(clock, calendar, reference))
    }
}
