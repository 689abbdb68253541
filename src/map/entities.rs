use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::HexMapConfig;
use crate::cells::{self, CellError, GeoPoint, HexId, Outline};
use crate::markers::{CoverageCells, MarkersConfig, RADAR_LAYER_ID, RadarMarkers};
use crate::math;
use crate::navigation::Location;

/// Layer id of the selectable coverage hexes.
pub const HEX_LAYER_ID: &str = "hexes_layer";

// ── Selection ───────────────────────────────────────────────────────

/// The selected hex and its outline.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct Selection {
    /// Selected cell.
    pub hex: HexId,
    /// Multi-polygon outline of the cell, computed once per selection.
    pub outline: Outline,
}

/// Holds the current [`Selection`], if any.
///
/// Only [`SelectionHolder`] writes it; everything else reads.
#[derive(Resource, Default, Debug)]
pub struct SelectedHex(Option<Selection>);

impl SelectedHex {
    /// Current selection.
    pub fn get(&self) -> Option<&Selection> {
        self.0.as_ref()
    }

    /// Id of the selected hex.
    pub fn hex(&self) -> Option<&HexId> {
        self.0.as_ref().map(|s| &s.hex)
    }
}

/// Single-entry outline memo keyed by hex id.
#[derive(Resource, Default, Debug)]
pub struct OutlineCache {
    entry: Option<(HexId, Outline)>,
}

impl OutlineCache {
    /// Cached outline of `hex`, computing and replacing the entry on a miss.
    pub fn get_or_compute(&mut self, hex: &HexId) -> Result<Outline, CellError> {
        if let Some((cached, outline)) = &self.entry
            && cached == hex
        {
            return Ok(outline.clone());
        }
        let outline = cells::outline(std::slice::from_ref(hex))?;
        self.entry = Some((hex.clone(), outline.clone()));
        Ok(outline)
    }

    /// Hex id of the cached entry.
    pub fn cached(&self) -> Option<&HexId> {
        self.entry.as_ref().map(|(hex, _)| hex)
    }
}

/// Announces a new non-empty selection to the viewport director.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct HexSelected {
    /// Newly selected hex.
    pub hex: HexId,
}

/// Write access to the selection.
#[derive(SystemParam)]
pub struct SelectionHolder<'w> {
    selected: ResMut<'w, SelectedHex>,
    cache: ResMut<'w, OutlineCache>,
    cfg: Res<'w, HexMapConfig>,
    announce: MessageWriter<'w, HexSelected>,
}

impl SelectionHolder<'_> {
    /// Id of the selected hex.
    pub fn current(&self) -> Option<&HexId> {
        self.selected.hex()
    }

    /// Selects `hex`, or clears the selection for `None`.
    ///
    /// The hex is not validated up front: a malformed id fails in the outline
    /// or resolution lookup, and a resolution without a zoom entry is
    /// rejected. On error the selection is left unchanged.
    pub fn set(&mut self, hex: Option<HexId>) -> Result<(), CellError> {
        let Some(hex) = hex else {
            self.selected.0 = None;
            return Ok(());
        };
        self.cfg.zoom_table.zoom_for(cells::resolution(&hex)?)?;
        let outline = self.cache.get_or_compute(&hex)?;
        self.selected.0 = Some(Selection {
            hex: hex.clone(),
            outline,
        });
        self.announce.write(HexSelected { hex });
        Ok(())
    }
}

// ── Viewport ────────────────────────────────────────────────────────

/// Marker for the map camera entity.
#[derive(Component, Reflect)]
pub struct MapCamera;

/// Camera state of the rendering surface.
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
pub struct MapViewport {
    /// Geographic point at the screen center.
    pub center: GeoPoint,
    /// Web-Mercator zoom level.
    pub zoom: f32,
    /// Screen size in logical pixels.
    pub size: Vec2,
}

impl MapViewport {
    /// Screen center in world-units.
    pub fn center_world(&self) -> Vec2 {
        math::project(self.center.lat, self.center.lng)
    }

    /// Visible area. Longitudes are not wrapped, so `west` may be below -180
    /// and `east` above 180 near the antimeridian.
    pub fn bounds(&self) -> GeoBounds {
        let half = self.size / 2.0 * math::units_per_pixel(self.zoom);
        let c = self.center_world();
        let (south, west) = math::unproject(c - half);
        let (north, east) = math::unproject(c + half);
        GeoBounds {
            west,
            south,
            east,
            north,
        }
    }

    /// World position under a screen position (origin top-left, y down).
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let offset = Vec2::new(screen.x - self.size.x / 2.0, self.size.y / 2.0 - screen.y);
        self.center_world() + offset * math::units_per_pixel(self.zoom)
    }

    /// Geographic position under a screen position.
    pub fn screen_to_geo(&self, screen: Vec2) -> GeoPoint {
        let (lat, lng) = math::unproject(self.screen_to_world(screen));
        GeoPoint::new(lat, math::wrap_lng(lng))
    }

    /// Screen position of a world position.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let offset = (world - self.center_world()) / math::units_per_pixel(self.zoom);
        Vec2::new(self.size.x / 2.0 + offset.x, self.size.y / 2.0 - offset.y)
    }
}

/// Geographic bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    /// Western edge.
    pub west: f64,
    /// Southern edge.
    pub south: f64,
    /// Eastern edge.
    pub east: f64,
    /// Northern edge.
    pub north: f64,
}

impl GeoBounds {
    /// Whether `point` lies inside, including the edges.
    pub fn contains(&self, point: GeoPoint) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }
        if self.east - self.west >= 360.0 {
            return true;
        }
        [point.lng - 360.0, point.lng, point.lng + 360.0]
            .iter()
            .any(|&lng| lng >= self.west && lng <= self.east)
    }
}

/// Camera transition request: a single target, animated by the surface.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct FlyTo {
    /// Target screen center.
    pub center: GeoPoint,
    /// Target zoom.
    pub zoom: f32,
}

/// An in-progress camera transition on the [`MapCamera`].
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
pub struct CameraFlight {
    from: Vec2,
    from_zoom: f32,
    to: Vec2,
    to_zoom: f32,
    elapsed: f32,
    duration: f32,
}

impl CameraFlight {
    /// Flight from the current viewport to `target` over `duration` seconds.
    pub fn new(from: &MapViewport, target: FlyTo, duration: f32) -> Self {
        Self {
            from: from.center_world(),
            from_zoom: from.zoom,
            to: math::project(target.center.lat, target.center.lng),
            to_zoom: target.zoom,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    /// Advances by `dt` seconds and returns progress in `[0, 1]`.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        self.progress()
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }

    /// Eased camera center and zoom at progress `t`.
    pub fn sample(&self, t: f32) -> (GeoPoint, f32) {
        let eased = math::ease_out_cubic(t.clamp(0.0, 1.0));
        let (lat, lng) = math::unproject(self.from.lerp(self.to, eased));
        (
            GeoPoint::new(lat, math::wrap_lng(lng)),
            math::lerp(self.from_zoom, self.to_zoom, eased),
        )
    }
}

// ── Pointer ─────────────────────────────────────────────────────────

/// Interactive layers, topmost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum MapLayer {
    /// Drone radar circles.
    DroneRadars,
    /// Coverage hexes; the only selectable layer.
    Hexes,
}

impl MapLayer {
    /// Layer id as used in feature hits and styles.
    pub fn id(self) -> &'static str {
        match self {
            Self::DroneRadars => RADAR_LAYER_ID,
            Self::Hexes => HEX_LAYER_ID,
        }
    }
}

/// One feature under the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureHit {
    /// Layer the feature belongs to.
    pub layer: MapLayer,
    /// Feature properties.
    pub properties: serde_json::Value,
}

impl FeatureHit {
    /// The `id` property, if it is a string.
    pub fn id(&self) -> Option<&str> {
        self.properties.get("id").and_then(serde_json::Value::as_str)
    }
}

/// A click on the map with every interactive feature under it.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct MapClick {
    /// Hits, topmost layer first.
    pub features: Vec<FeatureHit>,
}

impl MapClick {
    /// Hits on `layer` only.
    pub fn hits_on(&self, layer: MapLayer) -> impl Iterator<Item = &FeatureHit> {
        self.features.iter().filter(move |f| f.layer == layer)
    }
}

/// Topmost interactive feature under the cursor.
#[derive(Resource, Default, Debug, PartialEq)]
pub struct HoveredFeature(pub Option<FeatureHit>);

/// Read access to the interactive layers.
#[derive(SystemParam)]
pub struct MapLayers<'w> {
    pub(super) radars: Res<'w, RadarMarkers>,
    pub(super) coverage: Res<'w, CoverageCells>,
    pub(super) markers_cfg: Res<'w, MarkersConfig>,
    pub(super) location: Res<'w, Location>,
    pub(super) cfg: Res<'w, HexMapConfig>,
}

impl MapLayers<'_> {
    /// The coverage layer, unless the current path hides it.
    pub fn visible_coverage(&self) -> Option<&CoverageCells> {
        let hidden = self.location.first_segment() == Some(self.cfg.hide_coverage_segment.as_str());
        (!hidden).then_some(&*self.coverage)
    }
}
