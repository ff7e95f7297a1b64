use crate::region::RegionIndex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Names one number inside a metric record, e.g. `young[0]`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricRef {
    pub metric: String,
    #[serde(default)]
    pub component: usize,
}

impl MetricRef {
    pub fn new(metric: &str, component: usize) -> Self {
        Self {
            metric: metric.to_string(),
            component,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AggregateParams {
    pub numerator: MetricRef,
    pub denominator: MetricRef,
    /// Metric whose corpus maximum normalizes `pop_ratio`.
    pub max_metric: MetricRef,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            numerator: MetricRef::new("facil", 0),
            denominator: MetricRef::new("young", 0),
            max_metric: MetricRef::new("young", 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub ratio_mean: f64,
    pub numerator_mean: f64,
    pub max: f64,
    pub region_count: usize,
}

/// `numerator / denominator`, or exactly 0 when the denominator is 0 (or NaN).
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Sets `ratio` on every record. Must run after all merges.
pub fn derive_regions(index: &mut RegionIndex, params: &AggregateParams) {
    for record in index.records_mut() {
        let n = record.value(&params.numerator.metric, params.numerator.component);
        let d = record.value(&params.denominator.metric, params.denominator.component);
        record.ratio = ratio(n, d);
    }
}

impl CorpusStats {
    /// One pass over the regions in feature order, zero ratios included.
    pub fn compute(index: &RegionIndex, params: &AggregateParams) -> Self {
        let mut ratio_sum = 0.0;
        let mut numerator_sum = 0.0;
        let mut max = 0.0_f64;
        let mut count = 0;

        for region in index.regions() {
            let Some(record) = index.record(&region.key) else {
                continue;
            };
            ratio_sum += record.ratio;
            numerator_sum += record.value(&params.numerator.metric, params.numerator.component);
            let value = record.value(&params.max_metric.metric, params.max_metric.component);
            max = max.max(value);
            count += 1;
        }

        let mean = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };
        Self {
            ratio_mean: mean(ratio_sum),
            numerator_mean: mean(numerator_sum),
            max,
            region_count: count,
        }
    }
}

/// Computes corpus statistics, then each record's `pop_ratio` against the max.
pub fn derive_corpus(index: &mut RegionIndex, params: &AggregateParams) -> CorpusStats {
    let stats = CorpusStats::compute(index, params);
    for record in index.records_mut() {
        let value = record.value(&params.max_metric.metric, params.max_metric.component);
        record.pop_ratio = linear(value, stats.max);
    }
    info!(
        regions = stats.region_count,
        ratio_mean = stats.ratio_mean,
        numerator_mean = stats.numerator_mean,
        max = stats.max,
        "Corpus statistics"
    );
    stats
}

/// `value / mean * gain`, capped at `clamp` when given.
pub fn intensity(value: f64, mean: f64, gain: f64, clamp: Option<f64>) -> f64 {
    let x = ratio(value, mean) * gain;
    match clamp {
        Some(limit) if x > limit => limit,
        _ => x,
    }
}

pub fn linear(value: f64, max: f64) -> f64 {
    ratio(value, max)
}

/// Hue runs from red at 0 through green at 1 to blue at 2.
pub fn color(x: f64) -> [u8; 3] {
    hsv_to_rgb(x / 3.0, 1.0, 1.0)
}

pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let channel = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(r), channel(g), channel(b)]
}
