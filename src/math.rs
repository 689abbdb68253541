//! Projection, easing and camera math on plain numbers and `Vec2`s.
//!
//! World coordinates are spherical Web-Mercator scaled so the whole world spans
//! [`WORLD_SIZE`] units at zoom 0, centred on the origin with +y pointing north.

use bevy::prelude::Vec2;

/// Width (and height) of the Mercator world in world-units at zoom 0.
pub const WORLD_SIZE: f64 = 256.0;

/// Latitude limit of the square Web-Mercator projection (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Maps a noise value from the standard `[-1, 1]` range into `[min, max]`.
///
/// Noise generators (e.g. `Fbm<Perlin>`) produce values centred around zero.
/// This linearly rescales to an arbitrary output range.
///
/// # Examples
/// ```
/// # use hotspots_map::math::map_noise_to_range;
/// assert_eq!(map_noise_to_range(-1.0, 0.0, 10.0), 0.0);
/// assert_eq!(map_noise_to_range( 1.0, 0.0, 10.0), 10.0);
/// assert_eq!(map_noise_to_range( 0.0, 2.0, 6.0),  4.0);
/// ```
pub fn map_noise_to_range(noise_val: f64, min: f64, max: f64) -> f64 {
    min + ((noise_val + 1.0) / 2.0) * (max - min)
}

/// Cubic ease-out curve: fast start, gentle deceleration.
///
/// `t` should be in `[0, 1]`. Returns `1 - (1 - t)^3`.
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Linear interpolation from `a` to `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Projects a `(lat, lng)` pair in degrees into Mercator world-units.
pub fn project(lat: f64, lng: f64) -> Vec2 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = lng / 360.0 * WORLD_SIZE;
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln() / std::f64::consts::TAU
        * WORLD_SIZE;
    Vec2::new(x as f32, y as f32)
}

/// Inverse of [`project`]: world-units back to `(lat, lng)` in degrees.
///
/// Longitude is not wrapped; callers that need `[-180, 180]` normalize it.
pub fn unproject(world: Vec2) -> (f64, f64) {
    let x = world.x as f64;
    let y = world.y as f64;
    let lng = x / WORLD_SIZE * 360.0;
    let lat = 2.0 * (y / WORLD_SIZE * std::f64::consts::TAU).exp().atan()
        - std::f64::consts::FRAC_PI_2;
    (lat.to_degrees(), lng)
}

/// World-units covered by one screen pixel at `zoom`.
pub fn units_per_pixel(zoom: f32) -> f32 {
    2f32.powf(-zoom)
}

/// Whether the camera has to move to show a freshly selected hex.
///
/// Flies when the camera is more than `zoom_gap` levels shallower than the
/// target, or when the target is not on screen at all.
pub fn needs_flight(current_zoom: f32, target_zoom: f32, zoom_gap: f32, in_view: bool) -> bool {
    current_zoom < target_zoom - zoom_gap || !in_view
}

/// Wraps a longitude into `[-180, 180)`.
pub fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
