use crate::geometry::Ring;
use geo::Coord;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A single joined measure: either one number or a fixed-length vector
/// (e.g. young population as `[total, male, female]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metric {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Metric {
    /// Component `index` of a vector metric. Scalars ignore the index.
    pub fn component(&self, index: usize) -> f64 {
        match self {
            Metric::Scalar(v) => *v,
            Metric::Vector(values) => values.get(index).copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricShape {
    Scalar,
    Vector(usize),
}

impl MetricShape {
    pub fn from_columns(columns: Option<usize>) -> Self {
        match columns {
            Some(n) => MetricShape::Vector(n),
            None => MetricShape::Scalar,
        }
    }

    /// Number of numeric values a table row must carry for this shape.
    pub fn width(&self) -> usize {
        match self {
            MetricShape::Scalar => 1,
            MetricShape::Vector(n) => *n,
        }
    }

    pub fn zero(&self) -> Metric {
        match self {
            MetricShape::Scalar => Metric::Scalar(0.0),
            MetricShape::Vector(n) => Metric::Vector(vec![0.0; *n]),
        }
    }
}

/// Per-region metric bag plus the scalars derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricRecord {
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Metric>,
    pub ratio: f64,
    pub pop_ratio: f64,
}

impl MetricRecord {
    pub fn value(&self, metric: &str, component: usize) -> f64 {
        self.metrics
            .get(metric)
            .map(|m| m.component(component))
            .unwrap_or(0.0)
    }
}

/// One administrative boundary. The joined record is kept in the
/// `RegionIndex` under `key`, so regions sharing a key share a record.
#[derive(Debug, Clone)]
pub struct Region {
    pub key: String,
    pub name: String,
    pub ring: Ring,
    /// Source geometry, re-emitted untouched in the enriched collection.
    pub geometry: Option<geojson::Geometry>,
    /// Original feature properties, carried through to the output.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointObservation {
    #[serde(serialize_with = "serialize_coord")]
    pub position: Coord<f64>,
    pub category: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AugmentedPoint {
    #[serde(flatten)]
    pub point: PointObservation,
    pub region: String,
    pub data: MetricRecord,
}

fn serialize_coord<S: Serializer>(coord: &Coord<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    [coord.x, coord.y].serialize(serializer)
}
