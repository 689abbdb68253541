#![warn(missing_docs)]
//! Interactive H3 hex map with a single navigation-synchronized selection.
//!
//! The selected hex lives in three places at once: the highlighted outline on
//! the map, the application's navigation path (`/hex/<id>`), and the camera
//! viewport. [`map::HexMapPlugin`] keeps them consistent; the other modules
//! provide the geometry, navigation, markers and rendering surface it runs on.

pub mod cells;
pub mod map;
pub mod markers;
pub mod math;
pub mod navigation;
pub mod protocol;
pub mod style;

use bevy::prelude::*;

/// Application-wide state, used for system scheduling.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash, Reflect)]
pub enum AppState {
    /// Normal map interaction.
    #[default]
    Running,
    /// Debug overlay active (Tab to toggle).
    Debugging,
}

/// Per-frame ordering of the selection pipeline.
///
/// Click handlers only request navigation; navigation is applied before the
/// selection is reconciled, and the viewport reacts to the reconciled
/// selection. Each stage runs to completion before the next one starts.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapSet {
    /// Raw pointer and keyboard input turned into map clicks and camera moves.
    Pointer,
    /// Click handlers.
    Input,
    /// Pending path pushes applied to the location.
    Navigation,
    /// Location reconciled into the selection.
    Selection,
    /// Camera decisions for the new selection.
    Viewport,
    /// Camera animation and layer drawing.
    Surface,
}
