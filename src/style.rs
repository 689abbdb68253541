//! Map style: theme colors and the vector style descriptor handed to the
//! tile renderer.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

/// Environment variable holding the base URL of the vector tile archive.
pub const TILES_URL_ENV: &str = "PMTILES_URL";

const GLYPHS_URL: &str = "https://cdn.protomaps.com/fonts/pbf/{fontstack}/{range}.pbf";

/// Light or dark base map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTheme {
    /// Dark base map (default).
    #[default]
    Dark,
    /// Light base map.
    Light,
}

impl MapTheme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Background color behind all layers.
    pub fn clear_color(self) -> Color {
        match self {
            Self::Dark => Color::srgb(0.05, 0.06, 0.09),
            Self::Light => Color::srgb(0.93, 0.93, 0.91),
        }
    }

    /// Line color of the selected-hex outline.
    pub fn outline_color(self) -> Color {
        match self {
            Self::Dark => Color::WHITE,
            Self::Light => Color::BLACK,
        }
    }

    /// Line color of coverage hexes.
    pub fn coverage_color(self) -> Color {
        match self {
            Self::Dark => Color::srgba(0.27, 0.55, 1.0, 0.6),
            Self::Light => Color::srgba(0.1, 0.35, 0.85, 0.6),
        }
    }

    /// Line color of the coverage hex under the cursor.
    pub fn hover_color(self) -> Color {
        match self {
            Self::Dark => Color::srgb(0.55, 0.8, 1.0),
            Self::Light => Color::srgb(0.0, 0.2, 0.6),
        }
    }

    /// Base layer table for this theme.
    pub fn base_layers(self) -> &'static [&'static str] {
        match self {
            Self::Dark => &[
                "background_dark",
                "earth_dark",
                "water_dark",
                "roads_dark",
                "boundaries_dark",
                "places_dark",
            ],
            Self::Light => &[
                "background_light",
                "earth_light",
                "water_light",
                "roads_light",
                "boundaries_light",
                "places_light",
            ],
        }
    }
}

/// A vector tile source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorSource {
    /// Always `vector`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Tile URL templates.
    pub tiles: Vec<String>,
}

/// Style descriptor in the shape tile renderers expect (`version: 8`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapStyle {
    /// Style format version.
    pub version: u8,
    /// Named tile sources.
    pub sources: BTreeMap<String, VectorSource>,
    /// Glyph URL template.
    pub glyphs: String,
    /// Layer ids, bottom to top.
    pub layers: Vec<String>,
    /// Theme the layers were picked for.
    #[serde(skip)]
    pub theme: MapTheme,
}

impl MapStyle {
    /// Builds the style for `theme` with tiles served from `tiles_url`.
    pub fn new(theme: MapTheme, tiles_url: &str) -> Self {
        let base = tiles_url.trim_end_matches('/');
        let mut sources = BTreeMap::new();
        sources.insert(
            "protomaps".to_owned(),
            VectorSource {
                kind: "vector",
                tiles: vec![format!("{base}/{{z}}/{{x}}/{{y}}.mvt")],
            },
        );
        Self {
            version: 8,
            sources,
            glyphs: GLYPHS_URL.to_owned(),
            layers: theme.base_layers().iter().map(|s| (*s).to_owned()).collect(),
            theme,
        }
    }

    /// Same sources with the layer table of `theme`.
    pub fn with_theme(&self, theme: MapTheme) -> Self {
        Self {
            layers: theme.base_layers().iter().map(|s| (*s).to_owned()).collect(),
            theme,
            ..self.clone()
        }
    }
}

/// The style currently applied to the map.
#[derive(Resource, Clone, Debug)]
pub struct ActiveStyle(pub MapStyle);
