use markerboard_shared::models::LatLng;
use markerboard_shared::projection;

/// Pure function: convert container-relative coordinates to native map-image pixels,
/// undoing zoom/pan CSS transform. Usable in unit tests (no web_sys dependency).
///
/// Only `container_w` is needed because the image renders with `width:100%; height:auto`,
/// so both axes share the same scale factor (`MAP_WIDTH_PX / container_w`).
pub fn client_to_map_px_zoomed(
    container_x: f64,
    container_y: f64,
    container_w: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    if container_w <= 0.0 || zoom <= 0.0 {
        return None;
    }

    // Undo CSS transform: translate(pan_x, pan_y) scale(zoom)
    let rendered_x = (container_x - pan_x) / zoom;
    let rendered_y = (container_y - pan_y) / zoom;

    let scale = projection::MAP_WIDTH_PX / container_w;
    let img_x = (rendered_x * scale).clamp(0.0, projection::MAP_WIDTH_PX);
    let img_y = (rendered_y * scale).clamp(0.0, projection::MAP_HEIGHT_PX);

    Some((img_x, img_y))
}

/// Inverse of [`client_to_map_px_zoomed`]: where a map-image pixel lands in the container.
pub fn map_px_to_container(
    img_x: f64,
    img_y: f64,
    container_w: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> (f64, f64) {
    let scale = container_w / projection::MAP_WIDTH_PX;
    (img_x * scale * zoom + pan_x, img_y * scale * zoom + pan_y)
}

/// Pan offsets that put `center` in the middle of the container at `zoom`.
pub fn centered_pan(center: LatLng, zoom: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let (img_x, img_y) = projection::lat_lng_to_px(center);
    let (x, y) = map_px_to_container(img_x, img_y, container_w, zoom, 0.0, 0.0);
    (container_w / 2.0 - x, container_h / 2.0 - y)
}

/// Get container-relative click coordinates using web_sys, then convert
/// from rendered pixel space to map-image pixel space, undoing zoom/pan transform.
pub fn click_to_map_px_zoomed(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();

    let container_x = client_x - rect.left();
    let container_y = client_y - rect.top();

    client_to_map_px_zoomed(container_x, container_y, rect.width(), zoom, pan_x, pan_y)
}

/// Like [`click_to_map_px_zoomed`], but yields a geographic position.
pub fn click_to_lat_lng(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<LatLng> {
    click_to_map_px_zoomed(client_x, client_y, container_id, zoom, pan_x, pan_y)
        .map(|(x, y)| projection::px_to_lat_lng(x, y))
}

/// Screen pixels to map-image pixels at the given zoom, for sizing overlay shapes
/// so they keep a constant on-screen size.
pub fn screen_to_image_scale(container_w: f64, zoom: f64) -> f64 {
    if container_w <= 0.0 || zoom <= 0.0 {
        return 1.0;
    }
    projection::MAP_WIDTH_PX / container_w / zoom
}
