use bevy::prelude::*;

use super::entities::{Location, Navigate};

/// Applies pending [`Navigate`] pushes in order; the last one wins.
///
/// Pushing the path that is already current does not mark [`Location`] as
/// changed, so downstream reconciliation does not run for it.
pub fn apply_navigation(mut pushes: MessageReader<Navigate>, mut location: ResMut<Location>) {
    for push in pushes.read() {
        let next = Location::new(&push.path);
        let from = location.path().to_owned();
        if location.set_if_neq(next) {
            info!("Navigate {from} -> {}", location.path());
        }
    }
}
