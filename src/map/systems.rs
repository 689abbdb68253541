use bevy::prelude::*;

use super::HexMapConfig;
use super::entities::{
    FlyTo, HexSelected, MapClick, MapLayer, MapViewport, SelectedHex, SelectionHolder,
};
use crate::cells::{self, CellError, HexId};
use crate::math;
use crate::navigation::{Location, Navigate, Route};

// ── Location → selection ────────────────────────────────────────────

/// Reconciles the selection with the current route.
///
/// Runs when the location changes, and once when the map viewport first
/// appears. Before the viewport exists this is a no-op.
pub fn sync_selection_with_location(
    location: Res<Location>,
    surface_ready: Query<(), Added<MapViewport>>,
    viewports: Query<(), With<MapViewport>>,
    mut holder: SelectionHolder,
) {
    if viewports.is_empty() {
        return;
    }
    if !location.is_changed() && surface_ready.is_empty() {
        return;
    }

    let desired = match location.route() {
        Route::Hex(hex) if holder.current() != Some(&hex) => Some(hex),
        Route::Root if holder.current().is_some() => None,
        _ => return,
    };
    if let Err(e) = holder.set(desired) {
        error!("Cannot select hex for {}: {e}", location.path());
    }
}

// ── Clicks ──────────────────────────────────────────────────────────

/// Turns clicks on hex features into navigation.
///
/// Clicking the selected hex navigates home; any other hex navigates to its
/// detail path. The selection itself only changes once the path does.
pub fn select_clicked_hex(
    mut clicks: MessageReader<MapClick>,
    selected: Res<SelectedHex>,
    mut navigate: MessageWriter<Navigate>,
) {
    let current = selected.hex();
    for click in clicks.read() {
        for id in click.hits_on(MapLayer::Hexes).filter_map(|hit| hit.id()) {
            if current.is_some_and(|hex| hex.as_str() == id) {
                navigate.write(Navigate::root());
            } else {
                navigate.write(Navigate::hex(&HexId::new(id)));
            }
        }
    }
}

/// Logs clicked radar properties. Never touches selection or navigation.
pub fn inspect_radar_clicks(mut clicks: MessageReader<MapClick>) {
    for hit in clicks
        .read()
        .flat_map(|click| click.hits_on(MapLayer::DroneRadars))
    {
        let p = &hit.properties;
        info!(
            "Drone radar {}: status {}, concentration {}",
            p["id"], p["status"], p["concentration"]
        );
    }
}

// ── Viewport director ───────────────────────────────────────────────

/// Camera transition needed to show `hex`, if any.
pub fn plan_flight(
    viewport: &MapViewport,
    hex: &HexId,
    cfg: &HexMapConfig,
) -> Result<Option<FlyTo>, CellError> {
    let center = cells::center(hex)?;
    let zoom = cfg.zoom_table.zoom_for(cells::resolution(hex)?)?;
    let in_view = viewport.bounds().contains(center);
    Ok(math::needs_flight(viewport.zoom, zoom, cfg.fly_zoom_gap, in_view)
        .then_some(FlyTo { center, zoom }))
}

/// Requests a camera flight for each new selection that is not already
/// reasonably visible.
pub fn direct_viewport(
    mut selections: MessageReader<HexSelected>,
    viewports: Query<&MapViewport>,
    cfg: Res<HexMapConfig>,
    mut fly: MessageWriter<FlyTo>,
) {
    for HexSelected { hex } in selections.read() {
        let Ok(viewport) = viewports.single() else {
            continue;
        };
        match plan_flight(viewport, hex, &cfg) {
            Ok(Some(flight)) => {
                debug!("Flying to {hex} at zoom {}", flight.zoom);
                fly.write(flight);
            }
            Ok(None) => debug!("{hex} already in view"),
            Err(e) => error!("Cannot frame {hex}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MapSet;
    use crate::cells::GeoPoint;
    use crate::map::entities::{FeatureHit, OutlineCache};
    use crate::map::{HexMapPlugin, ZoomTable};
    use crate::navigation::{NavigationConfig, NavigationPlugin};

    const HEX: &str = "882830829bfffff";
    const OTHER_HEX: &str = "8828308281fffff";

    #[derive(Resource, Default)]
    struct FlightLog(Vec<FlyTo>);

    fn record_flights(mut fly: MessageReader<FlyTo>, mut log: ResMut<FlightLog>) {
        log.0.extend(fly.read().copied());
    }

    fn hex_center() -> GeoPoint {
        cells::center(&HexId::new(HEX)).unwrap()
    }

    fn viewport(center: GeoPoint, zoom: f32) -> MapViewport {
        MapViewport {
            center,
            zoom,
            size: Vec2::new(256.0, 256.0),
        }
    }

    /// Viewport centered on the equator at zoom 2; San Francisco is off screen.
    fn far_viewport() -> MapViewport {
        viewport(GeoPoint::new(0.0, 0.0), 2.0)
    }

    fn app_with(path: &str, cfg: HexMapConfig, view: Option<MapViewport>) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(NavigationPlugin(NavigationConfig {
                initial_path: path.into(),
            }))
            .add_plugins(HexMapPlugin(cfg))
            .init_resource::<FlightLog>()
            .add_systems(Update, record_flights.after(MapSet::Viewport));
        if let Some(view) = view {
            app.world_mut().spawn(view);
        }
        app
    }

    fn app(path: &str, view: Option<MapViewport>) -> App {
        app_with(path, HexMapConfig::default(), view)
    }

    fn selected(app: &App) -> Option<HexId> {
        app.world().resource::<SelectedHex>().hex().cloned()
    }

    fn flights(app: &App) -> &[FlyTo] {
        &app.world().resource::<FlightLog>().0
    }

    fn path(app: &App) -> String {
        app.world().resource::<Location>().path().to_owned()
    }

    fn hex_hit(id: &str) -> FeatureHit {
        FeatureHit {
            layer: MapLayer::Hexes,
            properties: json!({ "id": id }),
        }
    }

    fn radar_hit(id: &str) -> FeatureHit {
        FeatureHit {
            layer: MapLayer::DroneRadars,
            properties: json!({ "id": id, "status": "active", "concentration": 0.5 }),
        }
    }

    fn click(app: &mut App, features: Vec<FeatureHit>) {
        app.world_mut().write_message(MapClick { features });
        app.update();
    }

    fn navigate(app: &mut App, to: Navigate) {
        app.world_mut().write_message(to);
        app.update();
    }

    // ── plan_flight ─────────────────────────────────────────────────

    #[test]
    fn stays_put_when_close_enough_and_visible() {
        let cfg = HexMapConfig::default();
        let view = viewport(hex_center(), 9.0);
        assert_eq!(plan_flight(&view, &HexId::new(HEX), &cfg), Ok(None));
    }

    #[test]
    fn moves_when_five_levels_out() {
        let cfg = HexMapConfig::default();
        let view = viewport(hex_center(), 7.0);
        let flight = plan_flight(&view, &HexId::new(HEX), &cfg).unwrap();
        assert_eq!(
            flight,
            Some(FlyTo {
                center: hex_center(),
                zoom: 12.0
            })
        );
    }

    #[test]
    fn moves_when_out_of_bounds_at_target_zoom() {
        let cfg = HexMapConfig::default();
        let view = viewport(GeoPoint::new(0.0, 0.0), 12.0);
        assert!(plan_flight(&view, &HexId::new(HEX), &cfg).unwrap().is_some());
    }

    #[test]
    fn plan_fails_for_missing_zoom_entry() {
        let cfg = HexMapConfig {
            zoom_table: ZoomTable::new([]),
            ..default()
        };
        assert_eq!(
            plan_flight(&far_viewport(), &HexId::new(HEX), &cfg),
            Err(CellError::MissingZoom(8))
        );
    }

    // ── location → selection ────────────────────────────────────────

    #[test]
    fn hex_path_selects_and_flies_once() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();

        assert_eq!(selected(&app), Some(HexId::new(HEX)));
        assert_eq!(
            flights(&app),
            &[FlyTo {
                center: hex_center(),
                zoom: 12.0
            }]
        );
        let sel = app.world().resource::<SelectedHex>().get().cloned().unwrap();
        assert_eq!(sel.outline.polygons.len(), 1);
    }

    #[test]
    fn repeated_sync_is_idempotent() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        let first = app.world().resource::<SelectedHex>().get().cloned();

        for _ in 0..5 {
            app.update();
        }
        navigate(&mut app, Navigate::hex(&HexId::new(HEX)));

        assert_eq!(app.world().resource::<SelectedHex>().get().cloned(), first);
        assert_eq!(flights(&app).len(), 1);
    }

    #[test]
    fn root_path_clears_selection_without_moving_camera() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        navigate(&mut app, Navigate::root());

        assert_eq!(selected(&app), None);
        assert_eq!(flights(&app).len(), 1);
    }

    #[test]
    fn other_paths_leave_selection_alone() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        navigate(&mut app, Navigate::to("/stats"));
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
    }

    #[test]
    fn select_root_select_restores_outline_and_zoom() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        let original = app.world().resource::<SelectedHex>().get().cloned();

        navigate(&mut app, Navigate::root());
        assert_eq!(
            app.world().resource::<OutlineCache>().cached(),
            Some(&HexId::new(HEX))
        );
        navigate(&mut app, Navigate::hex(&HexId::new(HEX)));

        assert_eq!(app.world().resource::<SelectedHex>().get().cloned(), original);
        let log = flights(&app);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], log[1]);
    }

    #[test]
    fn round_trip_restores_outline_after_cache_eviction() {
        for _ in 0..20 {
            let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
            app.update();
            let original = app.world().resource::<SelectedHex>().get().cloned();

            navigate(&mut app, Navigate::hex(&HexId::new(OTHER_HEX)));
            navigate(&mut app, Navigate::root());
            navigate(&mut app, Navigate::hex(&HexId::new(HEX)));

            assert_eq!(
                app.world().resource::<OutlineCache>().cached(),
                Some(&HexId::new(HEX))
            );
            assert_eq!(app.world().resource::<SelectedHex>().get().cloned(), original);
        }
    }

    #[test]
    fn switching_hexes_replaces_selection() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        navigate(&mut app, Navigate::hex(&HexId::new(OTHER_HEX)));
        assert_eq!(selected(&app), Some(HexId::new(OTHER_HEX)));
        assert_eq!(
            app.world().resource::<OutlineCache>().cached(),
            Some(&HexId::new(OTHER_HEX))
        );
    }

    #[test]
    fn waits_for_viewport_before_selecting() {
        let mut app = app(&format!("/hex/{HEX}"), None);
        app.update();
        app.update();
        assert_eq!(selected(&app), None);
        assert!(flights(&app).is_empty());

        app.world_mut().spawn(far_viewport());
        app.update();
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
        assert_eq!(flights(&app).len(), 1);
    }

    #[test]
    fn malformed_hex_is_rejected_without_panicking() {
        let mut app = app("/hex/not-a-hex", Some(far_viewport()));
        app.update();
        assert_eq!(selected(&app), None);
        assert!(flights(&app).is_empty());
    }

    #[test]
    fn malformed_hex_keeps_previous_selection() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        navigate(&mut app, Navigate::to("/hex/zzz"));
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
    }

    #[test]
    fn missing_zoom_entry_rejects_selection() {
        let cfg = HexMapConfig {
            zoom_table: ZoomTable::new([(9, 13.0)]),
            ..default()
        };
        let mut app = app_with(&format!("/hex/{HEX}"), cfg, Some(far_viewport()));
        app.update();
        assert_eq!(selected(&app), None);
        assert!(flights(&app).is_empty());
    }

    #[test]
    fn visible_hex_selects_without_flight() {
        let mut app = app(&format!("/hex/{HEX}"), Some(viewport(hex_center(), 10.0)));
        app.update();
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
        assert!(flights(&app).is_empty());
    }

    // ── clicks ──────────────────────────────────────────────────────

    #[test]
    fn clicking_a_hex_navigates_to_it() {
        let mut app = app("/", Some(far_viewport()));
        app.update();
        click(&mut app, vec![hex_hit(HEX)]);
        assert_eq!(path(&app), format!("/hex/{HEX}"));
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
    }

    #[test]
    fn clicking_selected_hex_toggles_off_and_on() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();

        click(&mut app, vec![hex_hit(HEX)]);
        assert_eq!(path(&app), "/");
        assert_eq!(selected(&app), None);

        click(&mut app, vec![hex_hit(HEX)]);
        assert_eq!(path(&app), format!("/hex/{HEX}"));
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
    }

    #[test]
    fn radar_hits_do_not_navigate() {
        let mut app = app("/", Some(far_viewport()));
        app.update();
        click(&mut app, vec![radar_hit("drone-1")]);
        assert_eq!(path(&app), "/");
        assert_eq!(selected(&app), None);
    }

    #[test]
    fn stacked_hits_only_use_the_hex_feature() {
        let mut app = app("/", Some(far_viewport()));
        app.update();
        click(&mut app, vec![radar_hit("drone-1"), hex_hit(HEX)]);
        assert_eq!(path(&app), format!("/hex/{HEX}"));
        assert_eq!(selected(&app), Some(HexId::new(HEX)));
    }

    #[test]
    fn hex_hit_without_id_is_ignored() {
        let mut app = app("/", Some(far_viewport()));
        app.update();
        click(
            &mut app,
            vec![FeatureHit {
                layer: MapLayer::Hexes,
                properties: json!({}),
            }],
        );
        assert_eq!(path(&app), "/");
    }

    #[test]
    fn click_uses_selection_snapshot_from_before_navigation() {
        let mut app = app(&format!("/hex/{HEX}"), Some(far_viewport()));
        app.update();
        // both hits compare against the selection at click time
        click(&mut app, vec![hex_hit(OTHER_HEX), hex_hit(HEX)]);
        assert_eq!(path(&app), "/");
        assert_eq!(selected(&app), None);
    }
}
