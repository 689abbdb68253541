use bevy::prelude::*;

use crate::cells::HexId;

/// The application's current navigation path.
///
/// Stored normalized: always a leading `/`, no trailing `/` except for root.
#[derive(Resource, Clone, Debug, PartialEq, Eq, Reflect)]
pub struct Location {
    path: String,
}

impl Location {
    /// Normalizes `path` into a location.
    pub fn new(path: &str) -> Self {
        let trimmed = path.trim().trim_matches('/');
        Self {
            path: format!("/{trimmed}"),
        }
    }

    /// Normalized path, e.g. `/hex/882830829bfffff`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-empty path segments.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// The first segment, if any (e.g. `mobile`).
    pub fn first_segment(&self) -> Option<&str> {
        self.path.split('/').find(|s| !s.is_empty())
    }

    /// Parsed route shape.
    pub fn route(&self) -> Route {
        match self.segments().as_slice() {
            [] => Route::Root,
            ["hex", id] => Route::Hex(HexId::new(*id)),
            _ => Route::Other,
        }
    }
}

/// Route shapes the map reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Root,
    /// `/hex/<id>`
    Hex(HexId),
    /// Anything else; selection is left alone.
    Other,
}

/// Request to push a new path.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct Navigate {
    /// Target path.
    pub path: String,
}

impl Navigate {
    /// Push `path`.
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Push the root path.
    pub fn root() -> Self {
        Self::to("/")
    }

    /// Push the detail path of `hex`.
    pub fn hex(hex: &HexId) -> Self {
        Self::to(format!("/hex/{hex}"))
    }
}
