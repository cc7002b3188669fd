use crate::error::ConfigError;
use core_types::Review;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// A validated top-N cutoff for ranked tables. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopN(usize);

impl TopN {
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::ValidationError(
                "top-N cutoff must be greater than zero".to_string(),
            ));
        }
        Ok(TopN(n))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Caller-supplied delivery-time bucket boundaries, in whole days.
///
/// Boundaries `[3, 7]` produce the buckets `0-3`, `4-7` and `8+`. The
/// engine never hardcodes these thresholds; they arrive from settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSpec {
    boundaries: Vec<i64>,
}

impl BucketSpec {
    pub fn new(boundaries: Vec<i64>) -> Result<Self, ConfigError> {
        if boundaries.is_empty() {
            return Err(ConfigError::ValidationError(
                "delivery buckets need at least one boundary".to_string(),
            ));
        }
        if boundaries[0] < 0 {
            return Err(ConfigError::ValidationError(format!(
                "delivery bucket boundary {} is negative",
                boundaries[0]
            )));
        }
        if !boundaries.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::ValidationError(format!(
                "delivery bucket boundaries {boundaries:?} are not strictly increasing"
            )));
        }
        Ok(Self { boundaries })
    }

    /// Number of buckets, which is one more than the number of boundaries
    /// (the last bucket is open-ended).
    pub fn bucket_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Index of the bucket a delivery time falls into.
    pub fn index_for(&self, days: i64) -> usize {
        self.boundaries
            .iter()
            .position(|b| days <= *b)
            .unwrap_or(self.boundaries.len())
    }

    /// Display labels, one per bucket, e.g. `["0-3", "4-7", "8+"]`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.bucket_count());
        let mut lower = 0i64;
        for b in &self.boundaries {
            labels.push(format!("{lower}-{b}"));
            lower = b + 1;
        }
        labels.push(format!("{lower}+"));
        labels
    }
}

/// Which review scores count as promoters and which as detractors for the
/// NPS-style estimate. Both bands live on the 1-5 review scale and must not
/// overlap; their placement is entirely the caller's call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBands {
    promoter: RangeInclusive<u8>,
    detractor: RangeInclusive<u8>,
}

impl ScoreBands {
    pub fn new(
        promoter: RangeInclusive<u8>,
        detractor: RangeInclusive<u8>,
    ) -> Result<Self, ConfigError> {
        for (name, band) in [("promoter", &promoter), ("detractor", &detractor)] {
            if band.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} band {}-{} is empty",
                    band.start(),
                    band.end()
                )));
            }
            if *band.start() < Review::MIN_SCORE || *band.end() > Review::MAX_SCORE {
                return Err(ConfigError::ValidationError(format!(
                    "{name} band {}-{} leaves the {}-{} review scale",
                    band.start(),
                    band.end(),
                    Review::MIN_SCORE,
                    Review::MAX_SCORE
                )));
            }
        }
        if detractor.end() >= promoter.start() {
            return Err(ConfigError::ValidationError(format!(
                "detractor band {}-{} must sit strictly below the promoter band {}-{}",
                detractor.start(),
                detractor.end(),
                promoter.start(),
                promoter.end()
            )));
        }
        Ok(Self {
            promoter,
            detractor,
        })
    }

    pub fn is_promoter(&self, score: u8) -> bool {
        self.promoter.contains(&score)
    }

    pub fn is_detractor(&self, score: u8) -> bool {
        self.detractor.contains(&score)
    }
}

/// One component of the composite health score: which metric, its weight,
/// and the normalization bounds the raw value is scaled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub metric: String,
    pub weight: Decimal,
    pub floor: Decimal,
    pub ceiling: Decimal,
}

/// The caller's health-score composition. The engine defines only the
/// combination contract (weighted sum of normalized values); every weight
/// and bound comes from here, with no embedded business defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthWeights {
    components: Vec<HealthComponent>,
}

impl HealthWeights {
    /// Validates the composition: at least one component, positive weights
    /// summing exactly to `expected_total`, sane bounds, no metric twice.
    pub fn new(
        components: Vec<HealthComponent>,
        expected_total: Decimal,
    ) -> Result<Self, ConfigError> {
        if components.is_empty() {
            return Err(ConfigError::ValidationError(
                "health score needs at least one weighted component".to_string(),
            ));
        }
        for c in &components {
            if c.weight <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "weight {} for metric '{}' is not positive",
                    c.weight, c.metric
                )));
            }
            if c.floor >= c.ceiling {
                return Err(ConfigError::ValidationError(format!(
                    "normalization floor {} for metric '{}' is not below its ceiling {}",
                    c.floor, c.metric, c.ceiling
                )));
            }
        }
        for (i, c) in components.iter().enumerate() {
            if components[..i].iter().any(|prior| prior.metric == c.metric) {
                return Err(ConfigError::ValidationError(format!(
                    "metric '{}' appears more than once in the health weights",
                    c.metric
                )));
            }
        }
        let total: Decimal = components.iter().map(|c| c.weight).sum();
        if total != expected_total {
            return Err(ConfigError::ValidationError(format!(
                "health weights sum to {total}, expected {expected_total}"
            )));
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[HealthComponent] {
        &self.components
    }
}

// ==============================================================================
// File-backed settings
// ==============================================================================

/// Shape of the TOML settings file, before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    top_n: usize,
    delivery_buckets: Vec<i64>,
    score_bands: RawScoreBands,
    health: Option<RawHealth>,
}

#[derive(Debug, Deserialize)]
struct RawScoreBands {
    promoter_min: u8,
    promoter_max: u8,
    detractor_min: u8,
    detractor_max: u8,
}

#[derive(Debug, Deserialize)]
struct RawHealth {
    weight_total: Decimal,
    components: Vec<HealthComponent>,
}

/// The validated analysis settings: everything the engines need beyond the
/// window itself. Loaded from a TOML file named by the caller.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub top_n: TopN,
    pub delivery_buckets: BucketSpec,
    pub score_bands: ScoreBands,
    /// Absent when the caller does not want a composite health score.
    pub health: Option<HealthWeights>,
}

impl AnalysisSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawSettings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;

        let health = raw
            .health
            .map(|h| HealthWeights::new(h.components, h.weight_total))
            .transpose()?;

        Ok(Self {
            top_n: TopN::new(raw.top_n)?,
            delivery_buckets: BucketSpec::new(raw.delivery_buckets)?,
            score_bands: ScoreBands::new(
                raw.score_bands.promoter_min..=raw.score_bands.promoter_max,
                raw.score_bands.detractor_min..=raw.score_bands.detractor_max,
            )?,
            health,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn top_n_rejects_zero() {
        assert!(TopN::new(0).is_err());
        assert_eq!(TopN::new(10).unwrap().get(), 10);
    }

    #[test]
    fn bucket_boundaries_must_increase() {
        assert!(BucketSpec::new(vec![]).is_err());
        assert!(BucketSpec::new(vec![3, 3]).is_err());
        assert!(BucketSpec::new(vec![7, 3]).is_err());
        assert!(BucketSpec::new(vec![-1, 3]).is_err());
        assert!(BucketSpec::new(vec![3, 7]).is_ok());
    }

    #[test]
    fn bucket_labels_and_indexing_agree() {
        let spec = BucketSpec::new(vec![3, 7]).unwrap();
        assert_eq!(spec.labels(), vec!["0-3", "4-7", "8+"]);
        assert_eq!(spec.index_for(0), 0);
        assert_eq!(spec.index_for(3), 0);
        assert_eq!(spec.index_for(4), 1);
        assert_eq!(spec.index_for(7), 1);
        assert_eq!(spec.index_for(8), 2);
        assert_eq!(spec.index_for(365), 2);
    }

    #[test]
    fn score_bands_must_be_disjoint_and_on_scale() {
        assert!(ScoreBands::new(5..=5, 1..=2).is_ok());
        assert!(ScoreBands::new(4..=6, 1..=2).is_err());
        assert!(ScoreBands::new(3..=5, 1..=3).is_err());
        assert!(ScoreBands::new(1..=2, 4..=5).is_err());
    }

    #[test]
    fn band_membership() {
        let bands = ScoreBands::new(4..=5, 1..=2).unwrap();
        assert!(bands.is_promoter(5));
        assert!(!bands.is_promoter(3));
        assert!(bands.is_detractor(1));
        assert!(!bands.is_detractor(3));
    }

    #[test]
    fn health_weights_must_sum_to_declared_total() {
        let components = vec![
            HealthComponent {
                metric: "total_revenue".into(),
                weight: dec!(0.6),
                floor: dec!(0),
                ceiling: dec!(1000000),
            },
            HealthComponent {
                metric: "average_review_score".into(),
                weight: dec!(0.3),
                floor: dec!(1),
                ceiling: dec!(5),
            },
        ];
        assert!(HealthWeights::new(components.clone(), dec!(1.0)).is_err());
        assert!(HealthWeights::new(components, dec!(0.9)).is_ok());
    }

    #[test]
    fn health_weights_reject_bad_components() {
        let zero_weight = vec![HealthComponent {
            metric: "total_revenue".into(),
            weight: dec!(0),
            floor: dec!(0),
            ceiling: dec!(1),
        }];
        assert!(HealthWeights::new(zero_weight, dec!(0)).is_err());

        let inverted_bounds = vec![HealthComponent {
            metric: "total_revenue".into(),
            weight: dec!(1),
            floor: dec!(10),
            ceiling: dec!(5),
        }];
        assert!(HealthWeights::new(inverted_bounds, dec!(1)).is_err());

        let duplicated = vec![
            HealthComponent {
                metric: "nps_estimate".into(),
                weight: dec!(0.5),
                floor: dec!(-100),
                ceiling: dec!(100),
            },
            HealthComponent {
                metric: "nps_estimate".into(),
                weight: dec!(0.5),
                floor: dec!(-100),
                ceiling: dec!(100),
            },
        ];
        assert!(HealthWeights::new(duplicated, dec!(1)).is_err());
    }

    #[test]
    fn settings_load_from_toml() {
        use std::io::Write as _;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
top_n = 10
delivery_buckets = [3, 7]

[score_bands]
promoter_min = 5
promoter_max = 5
detractor_min = 1
detractor_max = 2

[health]
weight_total = 1.0

[[health.components]]
metric = "total_revenue"
weight = 0.7
floor = 0
ceiling = 1000000

[[health.components]]
metric = "average_review_score"
weight = 0.3
floor = 1
ceiling = 5
"#
        )
        .unwrap();

        let settings = AnalysisSettings::load(&path).unwrap();
        assert_eq!(settings.top_n.get(), 10);
        assert_eq!(settings.delivery_buckets.labels(), vec!["0-3", "4-7", "8+"]);
        assert!(settings.score_bands.is_promoter(5));
        assert_eq!(settings.health.unwrap().components().len(), 2);
    }
}
