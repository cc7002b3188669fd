use configuration::{ConfigError, WindowSpec};
use core_types::{AnalysisRow, RawDataset};
use std::collections::HashMap;
use tracing::debug;

/// Optional memoization of assembled analysis tables, keyed by window
/// specification, for callers that request the same window repeatedly
/// (a dashboard re-rendering, a report run over several metric families).
///
/// The cache remembers the raw-data version it was filled from; assembling
/// against a dataset with a different version empties it, since a reload
/// invalidates every assembled table. There is no partial invalidation —
/// assembly is always a full recompute from the raw sets.
#[derive(Debug, Default)]
pub struct AssemblyCache {
    data_version: Option<u64>,
    tables: HashMap<WindowSpec, Vec<AnalysisRow>>,
}

impl AssemblyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the assembled table for `spec`, computing and storing it on
    /// first request.
    pub fn get_or_assemble(
        &mut self,
        raw: &RawDataset,
        spec: &WindowSpec,
    ) -> Result<&[AnalysisRow], ConfigError> {
        if self.data_version != Some(raw.version()) {
            if self.data_version.is_some() {
                debug!(
                    old = ?self.data_version,
                    new = raw.version(),
                    "raw data version changed, dropping cached tables"
                );
            }
            self.tables.clear();
            self.data_version = Some(raw.version());
        }

        if !self.tables.contains_key(spec) {
            let window = spec.resolve()?;
            let rows = crate::assemble(raw, &window);
            self.tables.insert(*spec, rows);
        }
        Ok(self
            .tables
            .get(spec)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Number of cached tables, mostly useful for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{Customer, Order, OrderItem, OrderStatus, Product};
    use rust_decimal_macros::dec;

    fn dataset(price: rust_decimal::Decimal) -> RawDataset {
        let purchased = NaiveDate::from_ymd_opt(2018, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        RawDataset::new(
            vec![Order {
                order_id: "o1".into(),
                customer_id: "c1".into(),
                status: OrderStatus::Delivered,
                purchased_at: purchased,
                delivered_at: None,
            }],
            vec![OrderItem::new("o1", "p1", price, dec!(0)).unwrap()],
            vec![Product {
                product_id: "p1".into(),
                category: Some("toys".into()),
            }],
            vec![Customer {
                customer_id: "c1".into(),
                state: "SP".into(),
                city: "Sao Paulo".into(),
            }],
            vec![],
        )
    }

    fn march() -> WindowSpec {
        WindowSpec::Calendar {
            year: 2018,
            month: Some(3),
        }
    }

    #[test]
    fn repeated_requests_reuse_the_cached_table() {
        let raw = dataset(dec!(10));
        let mut cache = AssemblyCache::new();

        let first = cache.get_or_assemble(&raw, &march()).unwrap().to_vec();
        let second = cache.get_or_assemble(&raw, &march()).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn version_change_empties_the_cache() {
        let mut cache = AssemblyCache::new();

        let before = dataset(dec!(10));
        cache.get_or_assemble(&before, &march()).unwrap();
        let other_window = WindowSpec::Calendar {
            year: 2018,
            month: None,
        };
        cache.get_or_assemble(&before, &other_window).unwrap();
        assert_eq!(cache.len(), 2);

        // Same shape, different price: a different fingerprint.
        let after = dataset(dec!(99));
        let rows = cache.get_or_assemble(&after, &march()).unwrap();
        assert_eq!(rows[0].price, dec!(99));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalid_window_surfaces_before_any_assembly() {
        let mut cache = AssemblyCache::new();
        let bad = WindowSpec::Calendar {
            year: 2018,
            month: Some(13),
        };
        assert!(cache.get_or_assemble(&dataset(dec!(10)), &bad).is_err());
        assert!(cache.is_empty());
    }
}
