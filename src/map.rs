//! Hex map: the selected hex kept in sync with the navigation path and the
//! camera.
//!
//! [`HexMapPlugin`] is the headless core (selection, location sync, viewport
//! director). [`MapSurfacePlugin`] adds the rendering surface it drives: the
//! 2D map camera, pointer input, camera flights and layer drawing.

mod entities;
mod startup_systems;
mod surface;
mod systems;

pub use entities::{
    CameraFlight, FeatureHit, FlyTo, GeoBounds, HEX_LAYER_ID, HexSelected, HoveredFeature,
    MapCamera, MapClick, MapLayer, MapViewport, OutlineCache, SelectedHex, Selection,
    SelectionHolder,
};
pub use surface::features_at;
pub use systems::plan_flight;

use bevy::prelude::*;

use crate::cells::{CellError, GeoPoint};
use crate::style::MapTheme;
use crate::{AppState, MapSet};

/// Target zoom per H3 resolution.
///
/// Resolutions without an entry cannot be selected.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct ZoomTable {
    entries: Vec<(u8, f32)>,
}

impl ZoomTable {
    /// Table from `(resolution, zoom)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (u8, f32)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Zoom for `resolution`.
    pub fn zoom_for(&self, resolution: u8) -> Result<f32, CellError> {
        self.entries
            .iter()
            .find(|(res, _)| *res == resolution)
            .map(|&(_, zoom)| zoom)
            .ok_or(CellError::MissingZoom(resolution))
    }
}

/// Every H3 resolution, four zoom levels deeper than the resolution and
/// capped at zoom 18.
impl Default for ZoomTable {
    fn default() -> Self {
        Self::new((0..=15).map(|res| (res, (res as f32 + 4.0).min(18.0))))
    }
}

/// Per-plugin configuration for the hex map.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct HexMapConfig {
    /// Target zoom per hex resolution.
    pub zoom_table: ZoomTable,
    /// The camera flies to a new selection when it is more than this many
    /// zoom levels shallower than the target zoom.
    pub fly_zoom_gap: f32,
    /// Duration of a camera flight (seconds).
    pub flight_duration: f32,
    /// Smallest user zoom.
    pub min_zoom: f32,
    /// Largest user zoom.
    pub max_zoom: f32,
    /// Screen center at startup.
    pub initial_center: GeoPoint,
    /// Zoom at startup.
    pub initial_zoom: f32,
    /// Base map theme.
    pub theme: MapTheme,
    /// Base URL of the vector tile archive.
    pub tiles_url: String,
    /// Maximum pointer travel (pixels) between press and release for a click.
    pub click_tolerance_px: f32,
    /// Zoom change per scroll line.
    pub scroll_zoom_step: f32,
    /// Zoom change per `+`/`-` key press.
    pub key_zoom_step: f32,
    /// First path segment on which the coverage layer is hidden.
    pub hide_coverage_segment: String,
}

impl Default for HexMapConfig {
    fn default() -> Self {
        Self {
            zoom_table: ZoomTable::default(),
            fly_zoom_gap: 3.0,
            flight_duration: 1.2,
            min_zoom: 0.0,
            max_zoom: 18.0,
            initial_center: GeoPoint::new(37.0, -100.0),
            initial_zoom: 2.0,
            theme: MapTheme::Dark,
            tiles_url: "http://localhost:8080/tiles".into(),
            click_tolerance_px: 4.0,
            scroll_zoom_step: 0.5,
            key_zoom_step: 1.0,
            hide_coverage_segment: "mobile".into(),
        }
    }
}

/// Headless selection core: location sync, click handling, viewport director.
pub struct HexMapPlugin(pub HexMapConfig);

impl Plugin for HexMapPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<HexMapConfig>()
            .register_type::<MapViewport>()
            .register_type::<MapCamera>()
            .insert_resource(self.0.clone())
            .init_resource::<SelectedHex>()
            .init_resource::<OutlineCache>()
            .add_message::<MapClick>()
            .add_message::<HexSelected>()
            .add_message::<FlyTo>()
            .configure_sets(
                Update,
                (
                    MapSet::Pointer,
                    MapSet::Input,
                    MapSet::Navigation,
                    MapSet::Selection,
                    MapSet::Viewport,
                    MapSet::Surface,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (systems::select_clicked_hex, systems::inspect_radar_clicks).in_set(MapSet::Input),
            )
            .add_systems(
                Update,
                systems::sync_selection_with_location.in_set(MapSet::Selection),
            )
            .add_systems(Update, systems::direct_viewport.in_set(MapSet::Viewport));
    }
}

/// Rendering surface: camera, pointer input, flights, and layer drawing.
///
/// Needs the window, input, and gizmo plugins from `DefaultPlugins`.
pub struct MapSurfacePlugin;

impl Plugin for MapSurfacePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraFlight>()
            .init_resource::<HoveredFeature>()
            .add_systems(
                Startup,
                (
                    startup_systems::spawn_map_camera,
                    startup_systems::register_tile_protocol,
                    startup_systems::load_style,
                ),
            )
            .add_systems(
                Update,
                (
                    surface::track_window_size,
                    (
                        surface::pan_and_zoom,
                        surface::toggle_theme,
                        surface::emit_clicks,
                        surface::track_hover,
                        surface::update_cursor_icon,
                    )
                        .run_if(in_state(AppState::Running)),
                )
                    .chain()
                    .in_set(MapSet::Pointer),
            )
            .add_systems(
                Update,
                (
                    surface::start_flight,
                    surface::advance_flight,
                    surface::sync_camera,
                    surface::apply_style,
                    surface::draw_coverage,
                    surface::draw_radars,
                    surface::draw_selection,
                )
                    .chain()
                    .in_set(MapSet::Surface),
            )
            .add_systems(Last, startup_systems::release_tile_protocol);
    }
}
