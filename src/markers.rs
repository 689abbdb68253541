//! Drone radar markers and the coverage hexes around them.
//!
//! Radars are mock data: positions, status and concentration are sampled
//! from seeded fractal noise around an anchor point, so every run (and every
//! test) sees the same markers.

use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use h3o::CellIndex;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::Serialize;
use serde_json::json;

use crate::cells::{self, CellError, GeoPoint, HexId};
use crate::math;

/// Layer id of the radar markers.
pub const RADAR_LAYER_ID: &str = "drone_radars";

/// Per-plugin configuration for the marker layer.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct MarkersConfig {
    /// Number of radars to generate.
    pub count: usize,
    /// Seed for the noise generators.
    pub seed: u32,
    /// Number of octaves for the position noise.
    pub octaves: usize,
    /// Point the radars are scattered around.
    pub anchor: GeoPoint,
    /// Maximum offset from the anchor, in degrees.
    pub spread_deg: f64,
    /// Noise sampling distance between consecutive radars.
    pub sample_step: f64,
    /// H3 resolution of the coverage hexes.
    pub coverage_resolution: u8,
    /// Rings of coverage hexes around each active radar.
    pub coverage_rings: u32,
    /// Marker radius at zero concentration (pixels).
    pub min_radius_px: f32,
    /// Marker radius at full concentration (pixels).
    pub max_radius_px: f32,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed: 7,
            octaves: 3,
            anchor: GeoPoint::new(37.7749, -122.4194),
            spread_deg: 4.0,
            sample_step: 0.37,
            coverage_resolution: 8,
            coverage_rings: 1,
            min_radius_px: 5.0,
            max_radius_px: 20.0,
        }
    }
}

impl MarkersConfig {
    /// Marker radius for a concentration in `[0, 1]`.
    pub fn radius_px(&self, concentration: f32) -> f32 {
        math::lerp(
            self.min_radius_px,
            self.max_radius_px,
            concentration.clamp(0.0, 1.0),
        )
    }
}

/// Whether a radar is currently reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarStatus {
    /// Reporting; contributes coverage.
    Active,
    /// Silent.
    Inactive,
}

impl RadarStatus {
    /// Marker fill color.
    pub fn color(self) -> Color {
        match self {
            Self::Active => Color::srgba(0.0, 1.0, 0.0, 0.8),
            Self::Inactive => Color::srgba(1.0, 0.0, 0.0, 0.8),
        }
    }
}

/// Where a radar sits.
#[derive(Clone, Debug, PartialEq, Reflect, Serialize)]
pub struct RadarLocation {
    /// H3 cell at the coverage resolution.
    pub hex: HexId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// One drone concentration radar.
#[derive(Clone, Debug, PartialEq, Reflect, Serialize)]
pub struct DroneRadar {
    /// Unique identifier (`drone-<n>`).
    pub id: String,
    /// Reporting status.
    pub status: RadarStatus,
    /// Drone concentration in `[0, 1]`, two decimals.
    pub concentration: f32,
    /// Position.
    pub location: RadarLocation,
}

impl DroneRadar {
    /// Feature properties exposed on click.
    pub fn properties(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "status": self.status,
            "concentration": self.concentration,
        })
    }

    /// Position as a point.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.location.lat, self.location.lng)
    }
}

/// Generates `cfg.count` radars deterministically from `cfg.seed`.
pub fn generate_radars(cfg: &MarkersConfig) -> Result<Vec<DroneRadar>, CellError> {
    let lat_fbm: Fbm<Perlin> = Fbm::new(cfg.seed).set_octaves(cfg.octaves);
    let lng_fbm: Fbm<Perlin> = Fbm::new(cfg.seed.wrapping_add(1)).set_octaves(cfg.octaves);
    let status_noise = Perlin::new(cfg.seed.wrapping_add(2));
    let concentration_noise = Perlin::new(cfg.seed.wrapping_add(3));

    (0..cfg.count)
        .map(|i| -> Result<DroneRadar, CellError> {
            // offset by half a step so samples never land on the lattice (always 0)
            let t = (i as f64 + 0.5) * cfg.sample_step;
            let lat = cfg.anchor.lat
                + math::map_noise_to_range(
                    lat_fbm.get([t, 0.25]).clamp(-1.0, 1.0),
                    -cfg.spread_deg,
                    cfg.spread_deg,
                );
            let lng = math::wrap_lng(
                cfg.anchor.lng
                    + math::map_noise_to_range(
                        lng_fbm.get([0.75, t]).clamp(-1.0, 1.0),
                        -cfg.spread_deg,
                        cfg.spread_deg,
                    ),
            );
            let status = if status_noise.get([t, 1.5]) >= 0.0 {
                RadarStatus::Active
            } else {
                RadarStatus::Inactive
            };
            let concentration = math::map_noise_to_range(
                concentration_noise.get([t, 2.5]).clamp(-1.0, 1.0),
                0.0,
                1.0,
            );
            let hex = cells::cell_at(GeoPoint::new(lat, lng), cfg.coverage_resolution)?;
            Ok(DroneRadar {
                id: format!("drone-{}", i + 1),
                status,
                concentration: ((concentration * 100.0).round() / 100.0) as f32,
                location: RadarLocation {
                    hex: hex.into(),
                    lat,
                    lng,
                },
            })
        })
        .collect()
}

/// All radars on the map.
#[derive(Resource, Default, Debug)]
pub struct RadarMarkers {
    /// Radars, in generation order.
    pub radars: Vec<DroneRadar>,
}

/// Coverage hexes: the selectable hex layer.
#[derive(Resource, Default, Debug)]
pub struct CoverageCells {
    /// Covered cells, all at the same resolution.
    pub cells: HashSet<CellIndex>,
    /// Resolution of [`Self::cells`].
    pub resolution: u8,
    /// Precomputed closed world-space ring per cell, for drawing.
    pub rings: Vec<(CellIndex, Vec<Vec2>)>,
}

impl CoverageCells {
    /// Cells within `k` rings of every active radar.
    pub fn around(radars: &[DroneRadar], resolution: u8, k: u32) -> Result<Self, CellError> {
        let mut covered = HashSet::new();
        for radar in radars.iter().filter(|r| r.status == RadarStatus::Active) {
            let origin = cells::cell_at(radar.point(), resolution)?;
            covered.extend(origin.grid_disk::<Vec<_>>(k));
        }
        let rings = covered
            .iter()
            .map(|&cell| {
                let mut ring: Vec<Vec2> = cells::boundary(cell)
                    .iter()
                    .map(|p| math::project(p.lat, p.lng))
                    .collect();
                if let Some(&first) = ring.first() {
                    ring.push(first);
                }
                (cell, ring)
            })
            .collect();
        Ok(Self {
            cells: covered,
            resolution,
            rings,
        })
    }

    /// The covered cell containing `point`, if any.
    pub fn hit(&self, point: GeoPoint) -> Option<CellIndex> {
        let cell = cells::cell_at(point, self.resolution).ok()?;
        self.cells.contains(&cell).then_some(cell)
    }
}

/// Generates radars and coverage at startup.
pub struct MarkersPlugin(pub MarkersConfig);

impl Plugin for MarkersPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MarkersConfig>()
            .insert_resource(self.0.clone())
            .init_resource::<RadarMarkers>()
            .init_resource::<CoverageCells>()
            .add_systems(Startup, spawn_markers);
    }
}

/// Fills [`RadarMarkers`] and [`CoverageCells`] from [`MarkersConfig`].
pub fn spawn_markers(
    cfg: Res<MarkersConfig>,
    mut markers: ResMut<RadarMarkers>,
    mut coverage: ResMut<CoverageCells>,
) {
    let generated = generate_radars(&cfg).and_then(|radars| {
        let cov = CoverageCells::around(&radars, cfg.coverage_resolution, cfg.coverage_rings)?;
        Ok((radars, cov))
    });
    match generated {
        Ok((radars, cov)) => {
            info!(
                "Generated {} drone radars, {} coverage hexes",
                radars.len(),
                cov.cells.len()
            );
            markers.radars = radars;
            *coverage = cov;
        }
        Err(e) => error!("Cannot generate drone radars: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> MarkersConfig {
        MarkersConfig {
            count: 20,
            ..default()
        }
    }

    #[test]
    fn generates_requested_count_with_unique_ids() {
        let radars = generate_radars(&small()).unwrap();
        assert_eq!(radars.len(), 20);
        let ids: HashSet<_> = radars.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(radars[0].id, "drone-1");
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate_radars(&small()), generate_radars(&small()));
    }

    #[test]
    fn radars_stay_near_anchor() {
        let cfg = small();
        for r in generate_radars(&cfg).unwrap() {
            assert!((r.location.lat - cfg.anchor.lat).abs() <= cfg.spread_deg + 1e-9);
            assert!((0.0..=1.0).contains(&r.concentration));
        }
    }

    #[test]
    fn radar_hex_contains_its_position() {
        let cfg = small();
        for r in generate_radars(&cfg).unwrap() {
            let cell = cells::cell_at(r.point(), cfg.coverage_resolution).unwrap();
            assert_eq!(HexId::from(cell), r.location.hex);
        }
    }

    #[test]
    fn radius_interpolates_with_concentration() {
        let cfg = MarkersConfig::default();
        assert_eq!(cfg.radius_px(0.0), 5.0);
        assert_eq!(cfg.radius_px(1.0), 20.0);
        assert_eq!(cfg.radius_px(0.5), 12.5);
        assert_eq!(cfg.radius_px(3.0), 20.0);
    }

    #[test]
    fn properties_carry_id_status_concentration() {
        let r = &generate_radars(&small()).unwrap()[0];
        let p = r.properties();
        assert_eq!(p["id"], "drone-1");
        assert!(p["status"] == "active" || p["status"] == "inactive");
        assert!(p["concentration"].is_number());
    }

    #[test]
    fn coverage_only_around_active_radars() {
        let cfg = small();
        let mut radars = generate_radars(&cfg).unwrap();
        for r in &mut radars {
            r.status = RadarStatus::Inactive;
        }
        let none = CoverageCells::around(&radars, 8, 1).unwrap();
        assert!(none.cells.is_empty());

        radars[0].status = RadarStatus::Active;
        let one = CoverageCells::around(&radars, 8, 1).unwrap();
        assert_eq!(one.cells.len(), 7);
        assert_eq!(one.rings.len(), 7);
        assert!(one.hit(radars[0].point()).is_some());
    }

    #[test]
    fn coverage_rings_are_closed() {
        let mut radars = generate_radars(&small()).unwrap();
        radars[0].status = RadarStatus::Active;
        let cov = CoverageCells::around(&radars[..1], 8, 0).unwrap();
        let (_, ring) = &cov.rings[0];
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 7);
    }
}
