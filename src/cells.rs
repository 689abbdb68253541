//! H3 cell geometry: identifiers, centers, resolutions and outlines.
//!
//! Thin adapter over [`h3o`]. Identifiers are carried around as opaque
//! strings ([`HexId`]) and only parsed when geometry is requested, so a
//! malformed id surfaces as a [`CellError`] at the lookup that needed it.

use std::cmp::Ordering;
use std::fmt;

use bevy::prelude::*;
use h3o::geom::SolventBuilder;
use h3o::{CellIndex, LatLng, Resolution};
use serde::Serialize;
use thiserror::Error;

/// Failures of the hex geometry and zoom lookups.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    /// The identifier is not a valid H3 cell index.
    #[error("invalid hex id `{id}`: {reason}")]
    InvalidHexId {
        /// The offending identifier.
        id: String,
        /// Parser message from h3o.
        reason: String,
    },
    /// Latitude/longitude outside the valid range (or not finite).
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },
    /// Resolution outside `0..=15`.
    #[error("invalid resolution {0}")]
    InvalidResolution(u8),
    /// Outline dissolution failed.
    #[error("cannot build outline: {0}")]
    Outline(String),
    /// No zoom level is configured for this resolution.
    #[error("no zoom level configured for resolution {0}")]
    MissingZoom(u8),
}

/// Opaque identifier of one H3 cell, as it appears in paths and feature
/// properties (e.g. `882830829bfffff`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect, Serialize)]
#[serde(transparent)]
pub struct HexId(String);

impl HexId {
    /// Wraps an identifier without validating it.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier into an h3o cell.
    pub fn cell(&self) -> Result<CellIndex, CellError> {
        self.0.parse::<CellIndex>().map_err(|e| CellError::InvalidHexId {
            id: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl From<CellIndex> for HexId {
    fn from(cell: CellIndex) -> Self {
        Self(cell.to_string())
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for GeoPoint {
    fn from(ll: LatLng) -> Self {
        Self::new(ll.lat(), ll.lng())
    }
}

/// One polygon of an [`Outline`]: an exterior ring and optional holes.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct OutlinePolygon {
    /// Closed exterior ring.
    pub exterior: Vec<GeoPoint>,
    /// Interior rings.
    pub holes: Vec<Vec<GeoPoint>>,
}

/// Multi-polygon outline of a set of cells, in degrees.
///
/// Always a multi-polygon, even for a single cell.
#[derive(Clone, Debug, Default, PartialEq, Reflect)]
pub struct Outline {
    /// Disjoint polygons making up the outline.
    pub polygons: Vec<OutlinePolygon>,
}

impl Outline {
    /// Iterates every ring (exteriors and holes).
    pub fn rings(&self) -> impl Iterator<Item = &[GeoPoint]> {
        self.polygons.iter().flat_map(|p| {
            std::iter::once(p.exterior.as_slice()).chain(p.holes.iter().map(Vec::as_slice))
        })
    }
}

/// Union of the given cells as a multi-polygon.
///
/// The result is canonical: every ring starts at its smallest `(lat, lng)`
/// vertex and is closed, and polygons and holes are sorted, so the same
/// cells always produce an equal [`Outline`].
pub fn outline(hexes: &[HexId]) -> Result<Outline, CellError> {
    let cells = hexes
        .iter()
        .map(HexId::cell)
        .collect::<Result<Vec<_>, _>>()?;
    let shape = SolventBuilder::new()
        .build()
        .dissolve(cells)
        .map_err(|e| CellError::Outline(e.to_string()))?;

    // geo coordinates are (x = lng, y = lat)
    let mut polygons: Vec<OutlinePolygon> = shape
        .0
        .iter()
        .map(|poly| {
            let mut holes: Vec<Vec<GeoPoint>> = poly
                .interiors()
                .iter()
                .map(|r| canonical_ring(r.0.iter().map(|c| GeoPoint::new(c.y, c.x)).collect()))
                .collect();
            holes.sort_by(|a, b| ring_order(a, b));
            OutlinePolygon {
                exterior: canonical_ring(
                    poly.exterior()
                        .0
                        .iter()
                        .map(|c| GeoPoint::new(c.y, c.x))
                        .collect(),
                ),
                holes,
            }
        })
        .collect();
    polygons.sort_by(|a, b| ring_order(&a.exterior, &b.exterior));
    Ok(Outline { polygons })
}

fn point_order(a: &GeoPoint, b: &GeoPoint) -> Ordering {
    a.lat.total_cmp(&b.lat).then(a.lng.total_cmp(&b.lng))
}

fn ring_order(a: &[GeoPoint], b: &[GeoPoint]) -> Ordering {
    match (a.first(), b.first()) {
        (Some(x), Some(y)) => point_order(x, y),
        _ => a.len().cmp(&b.len()),
    }
}

/// Rotates a ring to start at its smallest vertex and closes it.
fn canonical_ring(mut ring: Vec<GeoPoint>) -> Vec<GeoPoint> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    let Some(start) = ring
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| point_order(a, b))
        .map(|(i, _)| i)
    else {
        return ring;
    };
    ring.rotate_left(start);
    ring.push(ring[0]);
    ring
}

/// Center of the cell.
pub fn center(hex: &HexId) -> Result<GeoPoint, CellError> {
    Ok(LatLng::from(hex.cell()?).into())
}

/// Resolution level of the cell (`0` coarsest, `15` finest).
pub fn resolution(hex: &HexId) -> Result<u8, CellError> {
    Ok(u8::from(hex.cell()?.resolution()))
}

/// The cell containing `point` at resolution `res`.
pub fn cell_at(point: GeoPoint, res: u8) -> Result<CellIndex, CellError> {
    let res = Resolution::try_from(res).map_err(|_| CellError::InvalidResolution(res))?;
    let ll = LatLng::new(point.lat, point.lng).map_err(|_| CellError::InvalidCoordinate {
        lat: point.lat,
        lng: point.lng,
    })?;
    Ok(ll.to_cell(res))
}

/// Corner points of a single cell, unclosed.
pub fn boundary(cell: CellIndex) -> Vec<GeoPoint> {
    cell.boundary().iter().map(|&ll| GeoPoint::from(ll)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF_HEX: &str = "882830829bfffff";

    #[test]
    fn resolution_of_known_cell() {
        assert_eq!(resolution(&HexId::new(SF_HEX)), Ok(8));
    }

    #[test]
    fn center_maps_back_to_same_cell() {
        let hex = HexId::new(SF_HEX);
        let c = center(&hex).unwrap();
        let back = cell_at(c, 8).unwrap();
        assert_eq!(HexId::from(back), hex);
    }

    #[test]
    fn single_cell_outline_is_one_closed_hexagon() {
        let o = outline(&[HexId::new(SF_HEX)]).unwrap();
        assert_eq!(o.polygons.len(), 1);
        assert!(o.polygons[0].holes.is_empty());
        let ring = &o.polygons[0].exterior;
        assert_eq!(ring.len(), 7);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn outline_starts_at_smallest_vertex() {
        let o = outline(&[HexId::new(SF_HEX)]).unwrap();
        let ring = &o.polygons[0].exterior;
        assert!(ring.iter().all(|p| point_order(&ring[0], p) != Ordering::Greater));
    }

    #[test]
    fn outline_surrounds_center() {
        let hex = HexId::new(SF_HEX);
        let c = center(&hex).unwrap();
        let o = outline(std::slice::from_ref(&hex)).unwrap();
        let ring = &o.polygons[0].exterior;
        let (min_lat, max_lat) = ring
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.lat), hi.max(p.lat)));
        let (min_lng, max_lng) = ring
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.lng), hi.max(p.lng)));
        assert!(min_lat < c.lat && c.lat < max_lat);
        assert!(min_lng < c.lng && c.lng < max_lng);
    }

    #[test]
    fn outline_is_deterministic() {
        let first = outline(&[HexId::new(SF_HEX)]).unwrap();
        for _ in 0..20 {
            assert_eq!(outline(&[HexId::new(SF_HEX)]).unwrap(), first);
        }
    }

    #[test]
    fn multi_cell_outline_is_deterministic() {
        let hexes = [HexId::new(SF_HEX), HexId::new("8828308281fffff")];
        let first = outline(&hexes).unwrap();
        for _ in 0..20 {
            assert_eq!(outline(&hexes).unwrap(), first);
        }
    }

    #[test]
    fn canonical_ring_ignores_start_vertex() {
        let pts = [
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(2.0, 0.0),
        ];
        let mut closed: Vec<_> = pts.to_vec();
        closed.push(pts[0]);
        let mut rotated: Vec<_> = pts[2..].iter().chain(&pts[..2]).copied().collect();
        rotated.push(pts[2]);

        let a = canonical_ring(closed);
        assert_eq!(a, canonical_ring(rotated));
        assert_eq!(a[0], GeoPoint::new(0.0, 1.0));
        assert_eq!(a.first(), a.last());
    }

    #[test]
    fn malformed_id_is_an_error() {
        let bad = HexId::new("not-a-hex");
        assert!(matches!(center(&bad), Err(CellError::InvalidHexId { .. })));
        assert!(matches!(resolution(&bad), Err(CellError::InvalidHexId { .. })));
        assert!(matches!(outline(&[bad]), Err(CellError::InvalidHexId { .. })));
    }

    #[test]
    fn boundary_has_six_corners_for_hexagon() {
        let cell = HexId::new(SF_HEX).cell().unwrap();
        assert_eq!(boundary(cell).len(), 6);
    }

    #[test]
    fn cell_at_rejects_bad_input() {
        let p = GeoPoint::new(37.77, -122.42);
        assert_eq!(cell_at(p, 16), Err(CellError::InvalidResolution(16)));
        assert!(matches!(
            cell_at(GeoPoint::new(f64::NAN, 0.0), 8),
            Err(CellError::InvalidCoordinate { .. })
        ));
    }
}
