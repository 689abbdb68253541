use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use h3o::CellIndex;
use serde_json::json;

use super::HexMapConfig;
use super::entities::{
    CameraFlight, FeatureHit, FlyTo, HoveredFeature, MapCamera, MapClick, MapLayer, MapLayers,
    MapViewport, SelectedHex,
};
use crate::cells::{GeoPoint, HexId};
use crate::markers::{CoverageCells, DroneRadar, MarkersConfig};
use crate::math;
use crate::style::ActiveStyle;

/// Every interactive feature under `cursor`, topmost layer first.
///
/// Radars are hit within their drawn radius. The coverage hex is hit when
/// `coverage` is given and covers the point under the cursor.
pub fn features_at(
    viewport: &MapViewport,
    cursor: Vec2,
    radars: &[DroneRadar],
    markers_cfg: &MarkersConfig,
    coverage: Option<&CoverageCells>,
) -> Vec<FeatureHit> {
    let mut hits: Vec<FeatureHit> = radars
        .iter()
        .filter(|r| {
            let screen = viewport.world_to_screen(math::project(r.location.lat, r.location.lng));
            screen.distance(cursor) <= markers_cfg.radius_px(r.concentration)
        })
        .map(|r| FeatureHit {
            layer: MapLayer::DroneRadars,
            properties: r.properties(),
        })
        .collect();
    if let Some(coverage) = coverage
        && let Some(cell) = coverage.hit(viewport.screen_to_geo(cursor))
    {
        hits.push(FeatureHit {
            layer: MapLayer::Hexes,
            properties: json!({ "id": cell.to_string() }),
        });
    }
    hits
}

impl MapLayers<'_> {
    fn features_at(&self, viewport: &MapViewport, cursor: Vec2) -> Vec<FeatureHit> {
        features_at(
            viewport,
            cursor,
            &self.radars.radars,
            &self.markers_cfg,
            self.visible_coverage(),
        )
    }
}

// ── Pointer ─────────────────────────────────────────────────────────

/// Keeps the viewport size in step with the primary window.
pub fn track_window_size(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewports: Query<&mut MapViewport, With<MapCamera>>,
) {
    let (Ok(window), Ok(mut viewport)) = (windows.single(), viewports.single_mut()) else {
        return;
    };
    let size = window.size();
    if viewport.size != size {
        viewport.size = size;
    }
}

/// Left-drag pans, scroll and `+`/`-` zoom. Any user input cancels a flight.
pub fn pan_and_zoom(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut motion: MessageReader<MouseMotion>,
    mut scroll: MessageReader<MouseWheel>,
    cfg: Res<HexMapConfig>,
    mut cameras: Query<(Entity, &mut MapViewport), With<MapCamera>>,
) {
    let Ok((entity, mut viewport)) = cameras.single_mut() else {
        return;
    };

    let drag: Vec2 = if buttons.pressed(MouseButton::Left) {
        motion.read().map(|ev| ev.delta).sum()
    } else {
        motion.clear();
        Vec2::ZERO
    };

    let mut zoom_delta = 0.0;
    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / 40.0,
        };
        zoom_delta += lines * cfg.scroll_zoom_step;
    }
    if keys.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        zoom_delta += cfg.key_zoom_step;
    }
    if keys.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        zoom_delta -= cfg.key_zoom_step;
    }

    if drag == Vec2::ZERO && zoom_delta == 0.0 {
        return;
    }
    commands.entity(entity).remove::<CameraFlight>();

    if drag != Vec2::ZERO {
        // screen y grows downward, world y upward
        let world = viewport.center_world()
            + Vec2::new(-drag.x, drag.y) * math::units_per_pixel(viewport.zoom);
        let (lat, lng) = math::unproject(world);
        viewport.center = GeoPoint::new(lat, math::wrap_lng(lng));
    }
    if zoom_delta != 0.0 {
        viewport.zoom = (viewport.zoom + zoom_delta).clamp(cfg.min_zoom, cfg.max_zoom);
    }
}

/// `T` switches between the light and dark base map.
pub fn toggle_theme(keys: Res<ButtonInput<KeyCode>>, mut style: ResMut<ActiveStyle>) {
    if keys.just_pressed(KeyCode::KeyT) {
        let theme = style.0.theme.toggled();
        style.0 = style.0.with_theme(theme);
        info!("Map theme: {theme:?}");
    }
}

/// Turns a press and release within the click tolerance into a
/// [`MapClick`] carrying the features under the pointer.
pub fn emit_clicks(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    viewports: Query<&MapViewport, With<MapCamera>>,
    layers: MapLayers,
    mut pressed_at: Local<Option<Vec2>>,
    mut clicks: MessageWriter<MapClick>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let cursor = window.cursor_position();
    if buttons.just_pressed(MouseButton::Left) {
        *pressed_at = cursor;
    }
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    let (Some(start), Some(end)) = (pressed_at.take(), cursor) else {
        return;
    };
    if start.distance(end) >= layers.cfg.click_tolerance_px {
        return;
    }
    let Ok(viewport) = viewports.single() else {
        return;
    };
    let features = layers.features_at(viewport, end);
    if !features.is_empty() {
        clicks.write(MapClick { features });
    }
}

/// Records the topmost feature under the cursor.
pub fn track_hover(
    windows: Query<&Window, With<PrimaryWindow>>,
    viewports: Query<&MapViewport, With<MapCamera>>,
    layers: MapLayers,
    mut hovered: ResMut<HoveredFeature>,
) {
    let (Ok(window), Ok(viewport)) = (windows.single(), viewports.single()) else {
        return;
    };
    let top = window
        .cursor_position()
        .and_then(|cursor| layers.features_at(viewport, cursor).into_iter().next());
    hovered.set_if_neq(HoveredFeature(top));
}

/// Pointer cursor over interactive features, the default cursor elsewhere.
pub fn update_cursor_icon(
    mut commands: Commands,
    hovered: Res<HoveredFeature>,
    windows: Query<Entity, With<PrimaryWindow>>,
) {
    if !hovered.is_changed() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let icon = match &hovered.0 {
        Some(hit) => {
            debug!("Hovering {} {}", hit.layer.id(), hit.id().unwrap_or("-"));
            CursorIcon::from(SystemCursorIcon::Pointer)
        }
        None => CursorIcon::default(),
    };
    commands.entity(window).insert(icon);
}

// ── Camera ──────────────────────────────────────────────────────────

/// Starts a [`CameraFlight`] toward the latest [`FlyTo`] request.
pub fn start_flight(
    mut commands: Commands,
    mut requests: MessageReader<FlyTo>,
    cfg: Res<HexMapConfig>,
    cameras: Query<(Entity, &MapViewport), With<MapCamera>>,
) {
    let Some(&target) = requests.read().last() else {
        return;
    };
    let Ok((entity, viewport)) = cameras.single() else {
        return;
    };
    let target = FlyTo {
        zoom: target.zoom.clamp(cfg.min_zoom, cfg.max_zoom),
        ..target
    };
    commands
        .entity(entity)
        .insert(CameraFlight::new(viewport, target, cfg.flight_duration));
}

/// Moves the viewport along its flight, removing the flight on arrival.
pub fn advance_flight(
    mut commands: Commands,
    time: Res<Time>,
    mut flights: Query<(Entity, &mut MapViewport, &mut CameraFlight)>,
) {
    for (entity, mut viewport, mut flight) in &mut flights {
        let t = flight.advance(time.delta_secs());
        let (center, zoom) = flight.sample(t);
        viewport.center = center;
        viewport.zoom = zoom;
        if t >= 1.0 {
            commands.entity(entity).remove::<CameraFlight>();
        }
    }
}

/// Applies the viewport to the camera transform and projection.
pub fn sync_camera(
    mut cameras: Query<(&MapViewport, &mut Transform, &mut Projection), Changed<MapViewport>>,
) {
    for (viewport, mut transform, mut projection) in &mut cameras {
        let z = transform.translation.z;
        transform.translation = viewport.center_world().extend(z);
        if let Projection::Orthographic(ortho) = &mut *projection {
            ortho.scale = math::units_per_pixel(viewport.zoom);
        }
    }
}

// ── Layers ──────────────────────────────────────────────────────────

/// Sets the background from the active theme.
pub fn apply_style(mut commands: Commands, style: Res<ActiveStyle>) {
    if style.is_changed() {
        commands.insert_resource(ClearColor(style.0.theme.clear_color()));
    }
}

/// Draws the coverage hexes, the hovered one highlighted.
pub fn draw_coverage(
    mut gizmos: Gizmos,
    layers: MapLayers,
    style: Res<ActiveStyle>,
    hovered: Res<HoveredFeature>,
) {
    let Some(coverage) = layers.visible_coverage() else {
        return;
    };
    let hovered_cell: Option<CellIndex> = hovered
        .0
        .as_ref()
        .filter(|hit| hit.layer == MapLayer::Hexes)
        .and_then(FeatureHit::id)
        .and_then(|id| HexId::new(id).cell().ok());
    let theme = style.0.theme;
    for (cell, ring) in &coverage.rings {
        let color = if hovered_cell == Some(*cell) {
            theme.hover_color()
        } else {
            theme.coverage_color()
        };
        gizmos.linestrip_2d(ring.iter().copied(), color);
    }
}

/// Draws one circle per radar, sized by concentration in screen pixels.
pub fn draw_radars(
    mut gizmos: Gizmos,
    layers: MapLayers,
    viewports: Query<&MapViewport, With<MapCamera>>,
) {
    let Ok(viewport) = viewports.single() else {
        return;
    };
    let scale = math::units_per_pixel(viewport.zoom);
    for radar in &layers.radars.radars {
        gizmos.circle_2d(
            math::project(radar.location.lat, radar.location.lng),
            layers.markers_cfg.radius_px(radar.concentration) * scale,
            radar.status.color(),
        );
    }
}

/// Draws the outline of the selected hex.
pub fn draw_selection(mut gizmos: Gizmos, selected: Res<SelectedHex>, style: Res<ActiveStyle>) {
    let Some(selection) = selected.get() else {
        return;
    };
    let color = style.0.theme.outline_color();
    // outline rings are closed
    for ring in selection.outline.rings() {
        gizmos.linestrip_2d(ring.iter().map(|p| math::project(p.lat, p.lng)), color);
    }
}
