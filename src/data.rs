use crate::geometry::Ring;
use crate::normalize::canonical_key;
use crate::tabular::parse_number;
use crate::types::{PointObservation, Region};
use anyhow::{anyhow, Context, Result};
use geo::Coord;
use geojson::{GeoJson, Value};
use serde::Deserialize;
use tracing::{info, warn};

/// Decodes the boundary collection, keeping only features of `province`.
///
/// Each region's ring is the first outer ring of its geometry
/// (`coordinates[0][0]` for a MultiPolygon, `coordinates[0]` for a Polygon).
pub fn load_regions(content: &str, province: &str) -> Result<Vec<Region>> {
    let geojson: GeoJson = content.parse().context("Failed to parse boundary GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let total = collection.features.len();
    let mut regions = Vec::new();

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        let in_province = properties
            .get("sidonm")
            .and_then(|v| v.as_str())
            .map(|s| s == province)
            .unwrap_or(false);
        if !in_province {
            continue;
        }

        let name = properties.get("adm_nm").and_then(|v| v.as_str());
        let Some(name) = name.map(str::to_string) else {
            warn!("Boundary feature without adm_nm, skipping");
            continue;
        };

        let ring = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::MultiPolygon(polygons)) => polygons
                .first()
                .and_then(|rings| rings.first())
                .map(|ring| Ring::from_positions(ring)),
            Some(Value::Polygon(rings)) => rings.first().map(|ring| Ring::from_positions(ring)),
            _ => None,
        };
        let Some(ring) = ring else {
            warn!(name = %name, "Boundary feature has no polygon ring, skipping");
            continue;
        };

        regions.push(Region {
            key: canonical_key(&name),
            name,
            ring,
            geometry: feature.geometry,
            properties,
        });
    }

    info!(kept = regions.len(), total, province, "Loaded boundaries");
    Ok(regions)
}

#[derive(Deserialize)]
struct LibraryDocument {
    #[serde(rename = "DATA")]
    data: Vec<LibraryRecord>,
}

#[derive(Deserialize)]
struct LibraryRecord {
    /// Longitude.
    #[serde(default)]
    ydnts: serde_json::Value,
    /// Latitude.
    #[serde(default)]
    xcnts: serde_json::Value,
    #[serde(default)]
    lbrry_se_name: Option<String>,
    #[serde(default)]
    lbrry_name: Option<String>,
}

/// Decodes library locations. Coordinates may be numbers or numeric strings.
pub fn load_libraries(content: &str) -> Result<Vec<PointObservation>> {
    let doc: LibraryDocument =
        serde_json::from_str(content).context("Failed to parse library JSON")?;

    let points: Vec<PointObservation> = doc
        .data
        .into_iter()
        .map(|record| PointObservation {
            position: Coord {
                x: json_number(&record.ydnts),
                y: json_number(&record.xcnts),
            },
            category: record.lbrry_se_name,
            label: record.lbrry_name.unwrap_or_default(),
        })
        .collect();

    info!(count = points.len(), "Loaded libraries");
    Ok(points)
}

fn json_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => parse_number(s),
        serde_json::Value::Null => 0.0,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARIES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature",
         "properties": {"adm_nm": "서울특별시 종로구 청운·효자동", "sidonm": "서울특별시"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}},
        {"type": "Feature",
         "properties": {"adm_nm": "부산광역시 중구 중앙동", "sidonm": "부산광역시"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[5,5],[6,5],[6,6],[5,5]]]]}},
        {"type": "Feature",
         "properties": {"adm_nm": "서울특별시 종로구 사직동", "sidonm": "서울특별시"},
         "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}},
        {"type": "Feature",
         "properties": {"adm_nm": "서울특별시 종로구 삼청동", "sidonm": "서울특별시"},
         "geometry": {"type": "Point", "coordinates": [1,1]}}
      ]
    }"#;

    #[test]
    fn keeps_province_features_with_rings() {
        let regions = load_regions(BOUNDARIES, "서울특별시").unwrap();
        let keys: Vec<_> = regions.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["청운·효자동", "사직동"]);
        assert_eq!(regions[0].ring.len(), 5);
        assert_eq!(regions[1].ring.vertices()[1], Coord { x: 2.0, y: 0.0 });
        assert_eq!(regions[0].name, "서울특별시 종로구 청운·효자동");
    }

    #[test]
    fn non_collection_is_rejected() {
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        let err = load_regions(point, "서울특별시").unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }

    #[test]
    fn library_coordinates_accept_strings() {
        let json = r#"{"DATA": [
            {"ydnts": "126.97", "xcnts": 37.56,
             "lbrry_se_name": "공공도서관", "lbrry_name": "종로도서관"},
            {"ydnts": 127.01, "xcnts": "37.5", "lbrry_se_name": null, "lbrry_name": "무명"}
        ]}"#;
        let points = load_libraries(json).unwrap();
        assert_eq!(points[0].position.x, 126.97);
        assert_eq!(points[0].position.y, 37.56);
        assert_eq!(points[0].category.as_deref(), Some("공공도서관"));
        assert_eq!(points[1].category, None);
        assert_eq!(points[1].position.y, 37.5);
    }

    #[test]
    fn malformed_library_json_is_an_error() {
        assert!(load_libraries("{\"rows\": []}").is_err());
    }
}
