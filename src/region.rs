use crate::tabular::TabularRow;
use crate::types::{Metric, MetricRecord, MetricShape, Region};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Divides a merged value by `1 + record[metric][component]`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Adjustment {
    pub metric: String,
    #[serde(default)]
    pub component: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub discarded: usize,
}

/// Regions in feature order plus one metric record per canonical key.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: Vec<Region>,
    records: HashMap<String, MetricRecord>,
}

impl RegionIndex {
    /// Creates a zeroed record for every region. When two regions share a
    /// key the later one resets the record; both keep pointing at it.
    pub fn seed(regions: Vec<Region>, defaults: &[(String, MetricShape)]) -> Self {
        let mut records = HashMap::with_capacity(regions.len());
        for region in &regions {
            let record = MetricRecord {
                metrics: defaults
                    .iter()
                    .map(|(name, shape)| (name.clone(), shape.zero()))
                    .collect(),
                ..Default::default()
            };
            if records.insert(region.key.clone(), record).is_some() {
                debug!(key = %region.key, name = %region.name, "Duplicate region key, reseeding");
            }
        }
        Self { regions, records }
    }

    /// Writes `metric` from every row into the matching record, last row
    /// wins. Rows without a region are counted and dropped.
    pub fn merge(
        &mut self,
        rows: &[TabularRow],
        metric: &str,
        shape: MetricShape,
        adjust: Option<&Adjustment>,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for row in rows {
            let Some(record) = self.records.get_mut(&row.key) else {
                debug!(key = %row.key, metric, "No region for table row");
                report.discarded += 1;
                continue;
            };

            let divisor = adjust
                .map(|a| 1.0 + record.value(&a.metric, a.component))
                .unwrap_or(1.0);
            let value = |i: usize| row.values.get(i).copied().unwrap_or(0.0) / divisor;

            let merged = match shape {
                MetricShape::Scalar => Metric::Scalar(value(0)),
                MetricShape::Vector(n) => Metric::Vector((0..n).map(value).collect()),
            };
            record.metrics.insert(metric.to_string(), merged);
            report.applied += 1;
        }

        report
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn record(&self, key: &str) -> Option<&MetricRecord> {
        self.records.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &MetricRecord)> {
        self.records.iter()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut MetricRecord> {
        self.records.values_mut()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
