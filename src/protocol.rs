//! Process-wide tile protocol registration.
//!
//! A protocol name (e.g. `pmtiles`) can be registered once per process. The
//! returned [`TileProtocolGuard`] unregisters it when dropped, so the
//! registration lives exactly as long as the map that acquired it.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;
use thiserror::Error;

/// Protocol used for vector tile archives.
pub const PMTILES: &str = "pmtiles";

static REGISTERED: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(Mutex::default);

fn registry() -> MutexGuard<'static, HashSet<String>> {
    REGISTERED.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tile protocol registration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Another owner already holds this protocol.
    #[error("tile protocol `{0}` is already registered")]
    AlreadyRegistered(String),
}

/// Scoped registration of a tile protocol.
#[derive(Debug)]
pub struct TileProtocolGuard {
    name: String,
}

impl TileProtocolGuard {
    /// Protocol name held by this guard.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TileProtocolGuard {
    fn drop(&mut self) {
        registry().remove(&self.name);
        debug!("Removed tile protocol {}", self.name);
    }
}

/// Registers `name`, failing if it is already held.
pub fn add_protocol(name: &str) -> Result<TileProtocolGuard, ProtocolError> {
    if !registry().insert(name.to_owned()) {
        return Err(ProtocolError::AlreadyRegistered(name.to_owned()));
    }
    debug!("Added tile protocol {name}");
    Ok(TileProtocolGuard {
        name: name.to_owned(),
    })
}

/// Whether `name` is currently registered.
#[cfg(test)]
pub(crate) fn is_registered(name: &str) -> bool {
    registry().contains(name)
}

/// The map's tile protocol registration; removing the resource releases it.
#[derive(Resource, Debug)]
pub struct TileProtocol(pub TileProtocolGuard);
