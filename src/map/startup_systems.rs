use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::HexMapConfig;
use super::entities::{MapCamera, MapViewport};
use crate::math;
use crate::protocol::{self, TileProtocol};
use crate::style::{ActiveStyle, MapStyle, TILES_URL_ENV};

const FALLBACK_SIZE: Vec2 = Vec2::new(1280.0, 720.0);

/// Spawns the 2D map camera with its [`MapViewport`].
pub fn spawn_map_camera(
    mut commands: Commands,
    cfg: Res<HexMapConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let size = windows
        .single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(FALLBACK_SIZE);
    let viewport = MapViewport {
        center: cfg.initial_center,
        zoom: cfg.initial_zoom,
        size,
    };
    commands.spawn((
        Name::new("MapCamera"),
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: math::units_per_pixel(viewport.zoom),
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_translation(viewport.center_world().extend(0.0)),
        MapCamera,
        viewport,
    ));
    debug!(
        "Map loaded at ({}, {}) zoom {}",
        cfg.initial_center.lat, cfg.initial_center.lng, cfg.initial_zoom
    );
}

/// Registers the `pmtiles` tile protocol for the lifetime of the app.
pub fn register_tile_protocol(mut commands: Commands) {
    match protocol::add_protocol(protocol::PMTILES) {
        Ok(guard) => commands.insert_resource(TileProtocol(guard)),
        Err(e) => warn!("{e}"),
    }
}

/// Builds the base map style. `PMTILES_URL` overrides the configured URL.
pub fn load_style(mut commands: Commands, cfg: Res<HexMapConfig>) {
    let tiles_url = std::env::var(TILES_URL_ENV).unwrap_or_else(|_| cfg.tiles_url.clone());
    let style = MapStyle::new(cfg.theme, &tiles_url);
    match serde_json::to_string(&style) {
        Ok(json) => debug!("Map style: {json}"),
        Err(e) => warn!("Cannot serialize map style: {e}"),
    }
    commands.insert_resource(ActiveStyle(style));
}

/// Drops the protocol registration on exit.
pub fn release_tile_protocol(
    mut exits: MessageReader<AppExit>,
    protocol: Option<Res<TileProtocol>>,
    mut commands: Commands,
) {
    if exits.read().next().is_none() {
        return;
    }
    if let Some(protocol) = protocol {
        info!("Releasing tile protocol {}", protocol.0.name());
        commands.remove_resource::<TileProtocol>();
    }
}
