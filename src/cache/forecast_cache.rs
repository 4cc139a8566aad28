use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::forecast::kind::ForecastKind;
use crate::forecast::series::ForecastSeries;
use crate::types::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DailyCacheKey {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub kind: ForecastKind,
}

impl DailyCacheKey {
    pub fn new(symbol: Symbol, date: NaiveDate, kind: ForecastKind) -> Self {
        Self { symbol, date, kind }
    }
}

/// Generated series for the current session. Entries for past dates are never looked up again and
/// are left in place until the next reset of their date.
#[derive(Debug, Default, Clone)]
pub struct ForecastCache {
    entries: HashMap<DailyCacheKey, ForecastSeries>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DailyCacheKey) -> Option<&ForecastSeries> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: DailyCacheKey, series: ForecastSeries) {
        self.entries.insert(key, series);
    }

    /// Drops every entry for `date`, returning how many were removed.
    pub fn clear_for_date(&mut self, date: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.date != date);
        before - self.entries.len()
    }

    pub fn series_for_date(&self, date: NaiveDate) -> Vec<&ForecastSeries> {
        let mut series: Vec<&ForecastSeries> = self
            .entries
            .iter()
            .filter(|(key, _)| key.date == date)
            .map(|(_, series)| series)
            .collect();
        series.sort_by(|a, b| (&a.symbol, a.kind).cmp(&(&b.symbol, b.kind)));
        series
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn series(symbol: &Symbol, day: u32, kind: ForecastKind) -> ForecastSeries {
        ForecastSeries {
            symbol: symbol.clone(),
            date: date(day),
            kind,
            points: Vec::new(),
        }
    }

    #[test]
    fn miss_is_none_and_hit_returns_stored_series() {
        let mut cache = ForecastCache::new();
        let kse = Symbol::kse_100();
        let key = DailyCacheKey::new(kse.clone(), date(3), ForecastKind::FullDay);

        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), series(&kse, 3, ForecastKind::FullDay));

        assert_eq!(cache.get(&key).map(|s| s.kind), Some(ForecastKind::FullDay));
        assert!(
            cache
                .get(&DailyCacheKey::new(kse, date(4), ForecastKind::FullDay))
                .is_none()
        );
    }

    #[test]
    fn clear_for_date_leaves_other_dates_alone() {
        let mut cache = ForecastCache::new();
        let kse = Symbol::kse_100();
        for (day, kind) in [
            (3, ForecastKind::Morning),
            (3, ForecastKind::FullDay),
            (4, ForecastKind::NextDay),
        ] {
            cache.put(
                DailyCacheKey::new(kse.clone(), date(day), kind),
                series(&kse, day, kind),
            );
        }

        assert_eq!(cache.clear_for_date(date(3)), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.series_for_date(date(3)).is_empty());
        assert_eq!(cache.series_for_date(date(4)).len(), 1);
        assert_eq!(cache.clear_for_date(date(3)), 0);
    }

    #[test]
    fn series_for_date_is_sorted_by_symbol_then_kind() {
        let mut cache = ForecastCache::new();
        let kse = Symbol::kse_100();
        let ogdc = Symbol::new("OGDC").unwrap();
        for (symbol, kind) in [
            (&ogdc, ForecastKind::Morning),
            (&kse, ForecastKind::Afternoon),
            (&kse, ForecastKind::Morning),
        ] {
            cache.put(
                DailyCacheKey::new(symbol.clone(), date(3), kind),
                series(symbol, 3, kind),
            );
        }

        let listed: Vec<(String, ForecastKind)> = cache
            .series_for_date(date(3))
            .iter()
            .map(|s| (s.symbol.to_string(), s.kind))
            .collect();

        assert_eq!(
            listed,
            vec![
                ("KSE-100".to_string(), ForecastKind::Morning),
                ("KSE-100".to_string(), ForecastKind::Afternoon),
                ("OGDC".to_string(), ForecastKind::Morning),
            ]
        );
    }
}
