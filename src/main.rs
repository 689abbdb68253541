#![warn(missing_docs)]
//! Hotspots map viewer.
//!
//! Drone radar markers over a base map, with coverage hexes that can be
//! selected by clicking. The selection follows the `/hex/<id>` path and the
//! camera flies to it.

use bevy::app::AppExit;
use bevy::prelude::*;
#[cfg(feature = "native")]
use bevy::remote::{RemotePlugin, http::RemoteHttpPlugin};
use bevy_inspector_egui::quick::WorldInspectorPlugin;
use hotspots_map::AppState;
use hotspots_map::map::{HexMapConfig, HexMapPlugin, MapSurfacePlugin};
use hotspots_map::markers::{MarkersConfig, MarkersPlugin};
use hotspots_map::navigation::{NavigationConfig, NavigationPlugin};

#[cfg(feature = "native")]
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to start on, e.g. `/hex/882830829bfffff`.
    #[arg(long, default_value = "/")]
    path: String,
    /// Start with the light base map.
    #[arg(long)]
    light: bool,
    /// Number of mock drone radars.
    #[arg(long, default_value_t = 100)]
    radars: usize,
}

#[cfg(feature = "native")]
fn configs() -> (NavigationConfig, MarkersConfig, HexMapConfig) {
    use clap::Parser;
    use hotspots_map::style::MapTheme;

    let cli = Cli::parse();
    (
        NavigationConfig {
            initial_path: cli.path,
        },
        MarkersConfig {
            count: cli.radars,
            ..default()
        },
        HexMapConfig {
            theme: if cli.light {
                MapTheme::Light
            } else {
                MapTheme::Dark
            },
            ..default()
        },
    )
}

#[cfg(not(feature = "native"))]
fn configs() -> (NavigationConfig, MarkersConfig, HexMapConfig) {
    default()
}

fn main() {
    let (nav, markers, map) = configs();
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Hotspots Map".into(),
            ..default()
        }),
        ..default()
    }))
    .register_type::<AppState>()
    .init_state::<AppState>();

    #[cfg(feature = "native")]
    app.add_plugins(RemotePlugin::default())
        .add_plugins(RemoteHttpPlugin::default());

    app.add_plugins(bevy_egui::EguiPlugin::default())
        .add_plugins(NavigationPlugin(nav))
        .add_plugins(MarkersPlugin(markers))
        .add_plugins(HexMapPlugin(map))
        .add_plugins(MapSurfacePlugin)
        .add_systems(Update, exit_on_esc)
        .add_systems(Update, toggle_inspector)
        .add_plugins(WorldInspectorPlugin::new().run_if(in_state(AppState::Debugging)));

    app.run();
}

fn toggle_inspector(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<AppState>>,
    mut next: ResMut<NextState<AppState>>,
) {
    if keys.just_pressed(KeyCode::Tab) {
        next.set(match state.get() {
            AppState::Running => AppState::Debugging,
            AppState::Debugging => AppState::Running,
        });
    }
}

fn exit_on_esc(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
