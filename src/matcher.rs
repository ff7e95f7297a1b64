use crate::region::RegionIndex;
use crate::types::{AugmentedPoint, PointObservation, Region};
use geo::Coord;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Matched {
        point: PointObservation,
        region: String,
    },
    Unmatched(PointObservation),
}

impl Match {
    pub fn is_matched(&self) -> bool {
        matches!(self, Match::Matched { .. })
    }
}

/// First region, in feature order, whose outer ring contains `point`.
pub fn locate(point: Coord<f64>, regions: &[Region]) -> Option<&Region> {
    regions.iter().find(|region| region.ring.contains(point))
}

/// Assigns every point to its enclosing region.
///
/// Brute force: each point is tested against every region's ring, so the
/// cost is O(points × regions × vertices). That is fine for a few hundred
/// dongs and a few thousand libraries but does not scale past that.
#[tracing::instrument(
    skip_all,
    fields(points = points.len(), regions = index.regions().len())
)]
pub fn spatial_join(points: Vec<PointObservation>, index: &RegionIndex) -> Vec<Match> {
    let matches: Vec<Match> = points
        .into_iter()
        .map(|point| match locate(point.position, index.regions()) {
            Some(region) => Match::Matched {
                point,
                region: region.key.clone(),
            },
            None => {
                warn!(
                    lon = point.position.x,
                    lat = point.position.y,
                    label = %point.label,
                    "Point is outside every region"
                );
                Match::Unmatched(point)
            }
        })
        .collect();

    let matched = matches.iter().filter(|m| m.is_matched()).count();
    debug!(matched, unmatched = matches.len() - matched, "Spatial join finished");
    matches
}

/// Attaches the matched region's record to each point. Unmatched points
/// are dropped, so the result is shorter than the input by their count.
pub fn augment(matches: Vec<Match>, index: &RegionIndex) -> Vec<AugmentedPoint> {
    matches
        .into_iter()
        .filter_map(|m| match m {
            Match::Matched { point, region } => {
                let data = index.record(&region)?.clone();
                Some(AugmentedPoint {
                    point,
                    region,
                    data,
                })
            }
            Match::Unmatched(_) => None,
        })
        .collect()
}
