//! Navigation location: the current path, its parsed route, and path pushes.
//!
//! Paths are pushed as [`Navigate`] messages and applied by a single system,
//! so a push issued from inside a click handler only takes effect once that
//! handler has returned.

mod entities;
mod systems;

pub use entities::{Location, Navigate, Route};

use bevy::prelude::*;

use crate::MapSet;

/// Per-plugin configuration for the navigation provider.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct NavigationConfig {
    /// Path the application starts on.
    pub initial_path: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            initial_path: "/".into(),
        }
    }
}

/// Owns [`Location`] and applies [`Navigate`] pushes to it.
pub struct NavigationPlugin(pub NavigationConfig);

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<NavigationConfig>()
            .register_type::<Location>()
            .insert_resource(self.0.clone())
            .insert_resource(Location::new(&self.0.initial_path))
            .add_message::<Navigate>()
            .add_systems(
                Update,
                systems::apply_navigation.in_set(MapSet::Navigation),
            );
    }
}
