//! Equirectangular world map projection.
//!
//! The map surface is a single 2:1 world image: x grows east from longitude
//! -180, y grows south from latitude 90. Positions on the overlay are in
//! native image pixels.

use crate::models::{LatLng, LAT_MAX, LAT_MIN, LNG_MAX, LNG_MIN};

// World image dimensions in pixels
pub const MAP_WIDTH_PX: f64 = 2048.0;
pub const MAP_HEIGHT_PX: f64 = 1024.0;

pub const PX_PER_DEGREE_LNG: f64 = MAP_WIDTH_PX / (LNG_MAX - LNG_MIN);
pub const PX_PER_DEGREE_LAT: f64 = MAP_HEIGHT_PX / (LAT_MAX - LAT_MIN);

/// Where the map opens: central London.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 51.5074,
    lng: -0.1278,
};
pub const DEFAULT_ZOOM: f64 = 4.0;

/// Graticule spacing in degrees.
pub const GRATICULE_STEP_DEG: f64 = 30.0;

/// Convert a geographic position to image pixel coordinates.
pub fn lat_lng_to_px(pos: LatLng) -> (f64, f64) {
    (
        (pos.lng - LNG_MIN) * PX_PER_DEGREE_LNG,
        (LAT_MAX - pos.lat) * PX_PER_DEGREE_LAT,
    )
}

/// Convert image pixel coordinates to a geographic position, clamped to the valid ranges.
pub fn px_to_lat_lng(px_x: f64, px_y: f64) -> LatLng {
    let lng = (px_x / PX_PER_DEGREE_LNG + LNG_MIN).clamp(LNG_MIN, LNG_MAX);
    let lat = (LAT_MAX - px_y / PX_PER_DEGREE_LAT).clamp(LAT_MIN, LAT_MAX);
    LatLng::new(lat, lng)
}

/// Format a position as a compact hemisphere-suffixed string (e.g., "51.5074N 0.1278W").
pub fn format_lat_lng(pos: LatLng) -> String {
    let ns = if pos.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if pos.lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}{} {:.4}{}", pos.lat.abs(), ns, pos.lng.abs(), ew)
}

/// Pixel X of a meridian line.
pub fn meridian_px(lng: f64) -> f64 {
    (lng - LNG_MIN) * PX_PER_DEGREE_LNG
}

/// Pixel Y of a parallel line.
pub fn parallel_px(lat: f64) -> f64 {
    (LAT_MAX - lat) * PX_PER_DEGREE_LAT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_corner() {
        let (x, y) = lat_lng_to_px(LatLng::new(90.0, -180.0));
        assert!((x - 0.0).abs() < 1e-9);
        assert!((y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_bottom_right_corner() {
        let (x, y) = lat_lng_to_px(LatLng::new(-90.0, 180.0));
        assert!((x - MAP_WIDTH_PX).abs() < 1e-9);
        assert!((y - MAP_HEIGHT_PX).abs() < 1e-9);
    }

    #[test]
    fn test_null_island_is_center() {
        let (x, y) = lat_lng_to_px(LatLng::new(0.0, 0.0));
        assert!((x - MAP_WIDTH_PX / 2.0).abs() < 1e-9);
        assert!((y - MAP_HEIGHT_PX / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_px_to_lat_lng_inverts() {
        let (x, y) = lat_lng_to_px(DEFAULT_CENTER);
        let back = px_to_lat_lng(x, y);
        assert!((back.lat - DEFAULT_CENTER.lat).abs() < 1e-9);
        assert!((back.lng - DEFAULT_CENTER.lng).abs() < 1e-9);
    }

    #[test]
    fn test_px_to_lat_lng_clamps() {
        let pos = px_to_lat_lng(-50.0, MAP_HEIGHT_PX + 50.0);
        assert_eq!(pos, LatLng::new(-90.0, -180.0));
        assert!(pos.is_valid());
    }

    #[test]
    fn test_format_lat_lng_hemispheres() {
        assert_eq!(format_lat_lng(DEFAULT_CENTER), "51.5074N 0.1278W");
        assert_eq!(format_lat_lng(LatLng::new(-33.8688, 151.2093)), "33.8688S 151.2093E");
    }

    #[test]
    fn test_graticule_lines() {
        assert!((meridian_px(0.0) - MAP_WIDTH_PX / 2.0).abs() < 1e-9);
        assert!((parallel_px(0.0) - MAP_HEIGHT_PX / 2.0).abs() < 1e-9);
        assert!((parallel_px(90.0) - 0.0).abs() < 1e-9);
    }
}
