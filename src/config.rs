use crate::aggregate::AggregateParams;
use crate::region::Adjustment;
use crate::render::RenderConfig;
use crate::tabular::{TableLayout, DEFAULT_EXCLUSIONS};
use crate::types::MetricShape;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub processing: AggregateParams,
    pub output: OutputConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Administrative boundary GeoJSON (path or http URL).
    pub boundaries: String,
    /// Only features whose `sidonm` equals this are kept.
    #[serde(default = "default_province")]
    pub province: String,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    /// Library location JSON, joined to regions by position.
    pub libraries: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    /// Name the values are stored under in each region's record.
    pub metric: String,
    pub source: String,
    /// Vector width; absent means a single scalar value.
    pub columns: Option<usize>,
    #[serde(default = "default_leading_columns")]
    pub leading_columns: usize,
    /// Defaults to the name column, i.e. `leading_columns`.
    pub kind_column: Option<usize>,
    pub exclusions: Option<Vec<String>>,
    pub adjust: Option<Adjustment>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

fn default_province() -> String {
    "서울특별시".to_string()
}

fn default_leading_columns() -> usize {
    2
}

impl TableConfig {
    pub fn shape(&self) -> MetricShape {
        MetricShape::from_columns(self.columns)
    }

    pub fn layout(&self) -> TableLayout {
        TableLayout {
            leading_columns: self.leading_columns,
            kind_column: self.kind_column.unwrap_or(self.leading_columns),
            values: self.shape().width(),
            exclusions: self
                .exclusions
                .clone()
                .unwrap_or_else(|| DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Metric names and shapes every region record starts with.
    pub fn metric_defaults(&self) -> Vec<(String, MetricShape)> {
        self.input
            .tables
            .iter()
            .map(|t| (t.metric.clone(), t.shape()))
            .collect()
    }
}
