//! The hand-off to the external map renderer.
//!
//! Nothing here draws. The renderer receives the enriched regions, the
//! augmented points and one immutable [`RenderConfig`] holding the camera,
//! lighting and scale settings that used to live in shared globals.

use crate::aggregate::{color, intensity, CorpusStats, MetricRef};
use crate::pipeline::Enriched;
use crate::types::{MetricRecord, Region};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

/// Overrides `access_token` when set to something non-trivial.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_TOKEN";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub map_style: String,
    pub access_token: Option<String>,
    pub opacity: f64,
    pub view: ViewState,
    pub lighting: Lighting,
    pub color: ColorScale,
    pub elevation: ElevationScale,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            map_style: "mapbox://styles/mapbox/light-v9".to_string(),
            access_token: None,
            opacity: 0.9,
            view: ViewState::default(),
            lighting: Lighting::default(),
            color: ColorScale::default(),
            elevation: ElevationScale::default(),
        }
    }
}

/// Initial camera, centred on Seoul City Hall.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            latitude: 37.5663,
            longitude: 126.9779,
            zoom: 11.0,
            max_zoom: 16.0,
            pitch: 45.0,
            bearing: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Lighting {
    pub ambient_color: [u8; 3],
    pub ambient_intensity: f64,
    pub sun_color: [u8; 3],
    pub sun_intensity: f64,
    /// Sun position as milliseconds since the Unix epoch.
    pub sun_timestamp_ms: i64,
    pub shadow_color: [f64; 4],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_color: [255, 255, 255],
            ambient_intensity: 1.0,
            sun_color: [255, 255, 255],
            sun_intensity: 1.0,
            // 2019-08-01T22:00:00Z
            sun_timestamp_ms: 1_564_696_800_000,
            shadow_color: [0.0, 0.0, 0.0, 0.5],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSource {
    /// Per-region ratio against the corpus mean ratio.
    #[default]
    Ratio,
    /// Raw numerator (e.g. adjusted facility count) against its corpus mean.
    Numerator,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ColorScale {
    pub source: ColorSource,
    pub gain: f64,
    pub clamp: Option<f64>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            source: ColorSource::Ratio,
            gain: 1.0,
            clamp: Some(2.0),
        }
    }
}

/// Extrusion height. With a `source` metric the height is
/// `value * multiplier` (e.g. `young[0] * 10`); without one it is
/// `pop_ratio * multiplier`. A zero multiplier keeps the map flat.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct ElevationScale {
    pub source: Option<MetricRef>,
    pub multiplier: f64,
}

impl RenderConfig {
    /// Applies the environment token override, ignoring blank values.
    pub fn with_env_token(mut self) -> Self {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if token.len() >= 2 {
                self.access_token = Some(token);
            }
        }
        self
    }
}

pub fn fill_color(
    record: &MetricRecord,
    numerator: f64,
    stats: &CorpusStats,
    scale: &ColorScale,
) -> [u8; 3] {
    let (value, mean) = match scale.source {
        ColorSource::Ratio => (record.ratio, stats.ratio_mean),
        ColorSource::Numerator => (numerator, stats.numerator_mean),
    };
    let x = intensity(value, mean, scale.gain, scale.clamp);
    color(x)
}

pub fn elevation(record: &MetricRecord, scale: &ElevationScale) -> f64 {
    let base = match &scale.source {
        Some(metric) => record.value(&metric.metric, metric.component),
        None => record.pop_ratio,
    };
    base * scale.multiplier
}

fn region_feature(region: &Region, enriched: &Enriched, config: &RenderConfig) -> Result<Feature> {
    let mut properties = region.properties.clone();

    if let Some(record) = enriched.index.record(&region.key) {
        let params = &enriched.params;
        let numerator = record.value(&params.numerator.metric, params.numerator.component);
        properties.insert("data".to_string(), serde_json::to_value(record)?);
        properties.insert(
            "fill_color".to_string(),
            json!(fill_color(record, numerator, &enriched.stats, &config.color)),
        );
        properties.insert("elevation".to_string(), json!(elevation(record, &config.elevation)));
    }

    let geometry = match &region.geometry {
        Some(g) => g.clone(),
        None => {
            let ring = region.ring.vertices().iter().map(|c| vec![c.x, c.y]).collect();
            Geometry::new(Value::Polygon(vec![ring]))
        }
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// The enriched boundary collection in feature order.
pub fn region_collection(enriched: &Enriched, config: &RenderConfig) -> Result<FeatureCollection> {
    let features = enriched
        .index
        .regions()
        .iter()
        .map(|region| region_feature(region, enriched, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Writes `regions.geojson`, `points.json` and `scene.json` into `dir`.
pub fn write_outputs(dir: &Path, enriched: &Enriched, config: &RenderConfig) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let regions = region_collection(enriched, config)?;
    let path = dir.join("regions.geojson");
    fs::write(&path, serde_json::to_string(&regions)?)
        .with_context(|| format!("Failed to write {:?}", path))?;

    let path = dir.join("points.json");
    let points = serde_json::to_string(&enriched.points)?;
    fs::write(&path, points).with_context(|| format!("Failed to write {:?}", path))?;

    let scene = json!({
        "stats": enriched.stats,
        "unmatched_points": enriched.unmatched,
        "render": config,
    });
    let path = dir.join("scene.json");
    fs::write(&path, serde_json::to_string_pretty(&scene)?)
        .with_context(|| format!("Failed to write {:?}", path))?;

    info!(
        dir = ?dir,
        regions = regions.features.len(),
        points = enriched.points.len(),
        "Wrote render payload"
    );
    Ok(())
}
