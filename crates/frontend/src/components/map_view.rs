use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use markerboard_shared::board::{RenderedMarker, SurfaceEvent};
use markerboard_shared::models::LatLng;
use markerboard_shared::projection;

use crate::coords;

const MAP_CONTAINER_ID: &str = "marker-map-container";
/// Equirectangular world plate served from `ASSETS_DIR`. Any 2:1 image works.
const MAP_IMAGE_URL: &str = "/static/maps/world.svg";

/// Drag threshold in pixels. Movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold, larger than the mouse one.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 12.0;
const ZOOM_STEP: f64 = 1.1;

/// Marker radius in screen pixels.
const MARKER_RADIUS: f64 = 9.0;

/// Pointer distance (screen pixels) within which a marker is grabbed.
const HIT_RADIUS: f64 = 14.0;

/// Used for sizing before the container has been laid out.
const REFERENCE_WIDTH: f64 = 960.0;

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

fn container_width() -> f64 {
    container_rect().map(|r| r.width()).unwrap_or(REFERENCE_WIDTH)
}

// ---------------------------------------------------------------------------
// Zoom / pan math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Compute new pan offsets so that `cursor` stays over the same content point
/// when zooming from `old_zoom` to `new_zoom`.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_zoom: f64,
    new_zoom: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_zoom;
    let content_y = (cursor_y - old_pan_y) / old_zoom;
    (
        cursor_x - content_x * new_zoom,
        cursor_y - content_y * new_zoom,
    )
}

/// Clamp pan values so the map can't be dragged off-screen.
///
/// The map image is rendered at `width: 100%` of the container, so its rendered
/// height is `container_w * (MAP_HEIGHT_PX / MAP_WIDTH_PX)`, which may be smaller
/// or larger than the container height.
fn clamp_pan(pan_x: f64, pan_y: f64, zoom: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let content_w = container_w * zoom;
    let content_h = container_w * (projection::MAP_HEIGHT_PX / projection::MAP_WIDTH_PX) * zoom;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

fn clamp_pan_to_container(pan_x: f64, pan_y: f64, zoom: f64) -> (f64, f64) {
    match container_rect() {
        Some(rect) => clamp_pan(pan_x, pan_y, zoom, rect.width(), rect.height()),
        None => (pan_x, pan_y),
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Find the id of the nearest marker within `threshold` (image pixels).
fn find_nearest(markers: &[(String, (f64, f64))], point: (f64, f64), threshold: f64) -> Option<String> {
    let mut best = None;
    let mut best_dist = threshold;
    for (id, pos) in markers {
        let d = point_distance(*pos, point);
        if d < best_dist {
            best_dist = d;
            best = Some(id.clone());
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Gestures
// ---------------------------------------------------------------------------

/// What the primary pointer is doing between press and release.
#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    /// Pressed on empty map. Becomes a pan once it moves past the threshold,
    /// otherwise the release is a map click.
    Pan {
        start: (f64, f64),
        start_pan: (f64, f64),
        moved: bool,
    },
    /// Pressed on a marker. Becomes a drag once it moves past the threshold,
    /// otherwise the release is a marker click.
    Marker {
        id: String,
        start: (f64, f64),
        moved: bool,
        last: Option<LatLng>,
    },
}

/// Advance a marker gesture to the pointer at `client` (located at `position`).
fn drag_step(
    gesture: &mut Gesture,
    client: (f64, f64),
    threshold: f64,
    position: Option<LatLng>,
) -> Vec<SurfaceEvent> {
    let mut events = Vec::new();
    if let Gesture::Marker {
        id,
        start,
        moved,
        last,
    } = gesture
    {
        if !*moved && point_distance(*start, client) > threshold {
            *moved = true;
            events.push(SurfaceEvent::MarkerDragStart { id: id.clone() });
        }
        if *moved {
            if let Some(position) = position {
                *last = Some(position);
                events.push(SurfaceEvent::MarkerDragMove {
                    id: id.clone(),
                    position,
                });
            }
        }
    }
    events
}

/// The event a completed gesture amounts to, if any.
fn release(gesture: Gesture, position: Option<LatLng>) -> Option<SurfaceEvent> {
    match gesture {
        Gesture::Idle => None,
        Gesture::Pan { moved: true, .. } => None,
        Gesture::Pan { moved: false, .. } => position.map(SurfaceEvent::MapClick),
        Gesture::Marker { id, moved: false, .. } => Some(SurfaceEvent::MarkerClick { id }),
        Gesture::Marker { id, last, .. } => position
            .or(last)
            .map(|position| SurfaceEvent::MarkerDragEnd { id, position }),
    }
}

/// Abandon a gesture without a final pointer position. A drag in progress is
/// dropped where it was last seen, anything else is forgotten.
fn cancel(gesture: Gesture) -> Option<SurfaceEvent> {
    match gesture {
        Gesture::Marker {
            id,
            moved: true,
            last: Some(position),
            ..
        } => Some(SurfaceEvent::MarkerDragEnd { id, position }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the overlay SVG content. `s` converts screen pixels to image pixels.
fn build_svg_content(markers: &[RenderedMarker], s: f64) -> String {
    let mut svg = String::with_capacity(4096);
    build_graticule(&mut svg, s);
    // Selected marker last so its ring sits on top
    for marker in markers.iter().filter(|m| !m.selected) {
        build_marker(&mut svg, marker, s);
    }
    for marker in markers.iter().filter(|m| m.selected) {
        build_marker(&mut svg, marker, s);
    }
    svg
}

fn build_graticule(svg: &mut String, s: f64) {
    let sw = 1.0 * s;
    let steps = (360.0 / projection::GRATICULE_STEP_DEG) as i32;
    for i in 0..=steps {
        let x = projection::meridian_px(-180.0 + i as f64 * projection::GRATICULE_STEP_DEG);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="0" x2="{x}" y2="{}" stroke="rgba(255,255,255,0.18)" stroke-width="{sw}"/>"#,
            projection::MAP_HEIGHT_PX
        ));
    }
    for i in 0..=steps / 2 {
        let y = projection::parallel_px(90.0 - i as f64 * projection::GRATICULE_STEP_DEG);
        svg.push_str(&format!(
            r#"<line x1="0" y1="{y}" x2="{}" y2="{y}" stroke="rgba(255,255,255,0.18)" stroke-width="{sw}"/>"#,
            projection::MAP_WIDTH_PX
        ));
    }
}

fn build_marker(svg: &mut String, marker: &RenderedMarker, s: f64) {
    let (cx, cy) = projection::lat_lng_to_px(marker.position);
    let r = MARKER_RADIUS * s;
    let sw = 2.0 * s;
    let fs = 12.0 * s;
    let label = escape_xml(&marker.label);
    let title = if marker.selected {
        "Selected marker".to_string()
    } else {
        format!("Marker {}", label)
    };
    svg.push_str(&format!(r##"<g role="img"><title>{title}</title>"##));
    svg.push_str(&format!(
        r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="#d9482b" stroke="white" stroke-width="{sw}"/>"##
    ));
    if !label.is_empty() {
        svg.push_str(&format!(
            r##"<text x="{cx}" y="{cy}" fill="white" font-size="{fs}" font-family="sans-serif" font-weight="700" text-anchor="middle" dominant-baseline="central">{label}</text>"##
        ));
    }
    if marker.selected {
        build_selection_ring(svg, cx, cy, s);
    }
    svg.push_str("</g>");
}

/// Emit an animated dashed selection ring around a marker.
fn build_selection_ring(svg: &mut String, cx: f64, cy: f64, s: f64) {
    let r = 16.0 * s;
    let sw = 2.5 * s;
    let da1 = 5.0 * s;
    let da2 = 3.0 * s;
    svg.push_str(&format!(
        r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="white" stroke-width="{sw}" stroke-dasharray="{da1} {da2}" opacity="0.9"><animate attributeName="opacity" values="0.5;1;0.5" dur="1.2s" repeatCount="indefinite"/></circle>"##
    ));
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// The world map with its marker overlay. Translates pointer gestures into
/// [`SurfaceEvent`]s; it never changes markers itself.
#[component]
pub fn MapView(markers: Vec<RenderedMarker>, on_event: EventHandler<SurfaceEvent>) -> Element {
    let mut zoom = use_signal(|| projection::DEFAULT_ZOOM);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);

    let mut gesture = use_signal(|| Gesture::Idle);

    // Touch state
    let mut last_touch = use_signal(|| None::<(f64, f64)>);
    let mut is_pinching = use_signal(|| false);
    let mut pinch_start_distance = use_signal(|| 0.0_f64);
    let mut pinch_start_zoom = use_signal(|| 1.0_f64);
    let mut pinch_midpoint = use_signal(|| (0.0_f64, 0.0_f64));
    let mut pinch_start_pan_x = use_signal(|| 0.0_f64);
    let mut pinch_start_pan_y = use_signal(|| 0.0_f64);

    // Open centered on the default view once the container has a size
    use_effect(move || {
        if let Some(rect) = container_rect() {
            let z = projection::DEFAULT_ZOOM;
            let (px, py) = coords::centered_pan(projection::DEFAULT_CENTER, z, rect.width(), rect.height());
            let (px, py) = clamp_pan(px, py, z, rect.width(), rect.height());
            pan_x.set(px);
            pan_y.set(py);
        }
    });

    let locate = move |client: (f64, f64)| {
        coords::click_to_lat_lng(
            client.0,
            client.1,
            MAP_CONTAINER_ID,
            *zoom.read(),
            *pan_x.read(),
            *pan_y.read(),
        )
    };

    // Marker positions in image pixels, for hit testing
    let hit_targets: Vec<(String, (f64, f64))> = markers
        .iter()
        .map(|m| (m.id.clone(), projection::lat_lng_to_px(m.position)))
        .collect();

    // Start a gesture at `client`: on a marker if one is under the pointer
    let press = move |client: (f64, f64), targets: &[(String, (f64, f64))]| {
        let cur_zoom = *zoom.read();
        let hit = coords::click_to_map_px_zoomed(
            client.0,
            client.1,
            MAP_CONTAINER_ID,
            cur_zoom,
            *pan_x.read(),
            *pan_y.read(),
        )
        .and_then(|point| {
            let threshold = HIT_RADIUS * coords::screen_to_image_scale(container_width(), cur_zoom);
            find_nearest(targets, point, threshold)
        });
        match hit {
            Some(id) => Gesture::Marker {
                id,
                start: client,
                moved: false,
                last: None,
            },
            None => Gesture::Pan {
                start: client,
                start_pan: (*pan_x.read(), *pan_y.read()),
                moved: false,
            },
        }
    };

    // Follow the pointer: pan the map, or drag the pressed marker
    let mut follow = move |client: (f64, f64), threshold: f64| {
        let mut current = gesture.read().clone();
        if current == Gesture::Idle {
            return;
        }
        if let Gesture::Pan {
            start,
            start_pan,
            moved,
        } = &mut current
        {
            if !*moved && point_distance(*start, client) > threshold {
                *moved = true;
            }
            if *moved {
                let new_px = start_pan.0 + client.0 - start.0;
                let new_py = start_pan.1 + client.1 - start.1;
                let (px, py) = clamp_pan_to_container(new_px, new_py, *zoom.read());
                pan_x.set(px);
                pan_y.set(py);
            }
        }
        for event in drag_step(&mut current, client, threshold, locate(client)) {
            on_event.call(event);
        }
        gesture.set(current);
    };

    let mut finish = move |client: Option<(f64, f64)>| {
        let done = gesture.replace(Gesture::Idle);
        let event = match client {
            Some(client) => release(done, locate(client)),
            None => cancel(done),
        };
        if let Some(event) = event {
            on_event.call(event);
        }
    };

    let cur_zoom = *zoom.read();
    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();

    let s = coords::screen_to_image_scale(container_width(), cur_zoom);
    let svg_html = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5;">{}</svg>"#,
        projection::MAP_WIDTH_PX,
        projection::MAP_HEIGHT_PX,
        build_svg_content(&markers, s)
    );

    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_zoom}); transform-origin: 0 0;"
    );
    let container_class = match &*gesture.read() {
        Gesture::Pan { moved: true, .. } => "map-container dragging",
        Gesture::Marker { moved: true, .. } => "map-container moving-marker",
        _ => "map-container",
    };

    let selected_readout = markers
        .iter()
        .find(|m| m.selected)
        .map(|m| projection::format_lat_lng(m.position));

    let touch_targets = hit_targets.clone();

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let old_z = *zoom.read();
                let new_z = (old_z * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }

                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                let cx = client.x - rect.left();
                let cy = client.y - rect.top();

                let (new_px, new_py) =
                    zoom_pan_at_cursor(cx, cy, old_z, new_z, *pan_x.read(), *pan_y.read());
                let (px, py) = clamp_pan(new_px, new_py, new_z, rect.width(), rect.height());

                zoom.set(new_z);
                pan_x.set(px);
                pan_y.set(py);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                gesture.set(press((client.x, client.y), &hit_targets));
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                follow((client.x, client.y), DRAG_THRESHOLD);
            },

            onmouseup: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                finish(Some((client.x, client.y)));
            },

            onmouseleave: move |_| finish(None),

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let c = touches[0].client_coordinates();
                    last_touch.set(Some((c.x, c.y)));
                    gesture.set(press((c.x, c.y), &touch_targets));
                } else if touches.len() >= 2 {
                    // A second finger turns whatever was going on into a pinch
                    finish(None);
                    let c0 = touches[0].client_coordinates();
                    let c1 = touches[1].client_coordinates();
                    let p0 = (c0.x, c0.y);
                    let p1 = (c1.x, c1.y);
                    is_pinching.set(true);
                    pinch_start_distance.set(point_distance(p0, p1));
                    pinch_start_zoom.set(*zoom.read());
                    pinch_midpoint.set(((p0.0 + p1.0) / 2.0, (p0.1 + p1.1) / 2.0));
                    pinch_start_pan_x.set(*pan_x.read());
                    pinch_start_pan_y.set(*pan_y.read());
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();

                if *is_pinching.read() && touches.len() >= 2 {
                    let c0 = touches[0].client_coordinates();
                    let c1 = touches[1].client_coordinates();
                    let d = point_distance((c0.x, c0.y), (c1.x, c1.y));
                    let start_d = *pinch_start_distance.read();
                    if start_d < 1.0 { return; }

                    let old_z = *pinch_start_zoom.read();
                    let new_z = (old_z * d / start_d).clamp(ZOOM_MIN, ZOOM_MAX);

                    let Some(rect) = container_rect() else { return };
                    let mid = *pinch_midpoint.read();
                    let (new_px, new_py) = zoom_pan_at_cursor(
                        mid.0 - rect.left(), mid.1 - rect.top(), old_z, new_z,
                        *pinch_start_pan_x.read(), *pinch_start_pan_y.read(),
                    );
                    let (px, py) = clamp_pan(new_px, new_py, new_z, rect.width(), rect.height());
                    zoom.set(new_z);
                    pan_x.set(px);
                    pan_y.set(py);
                } else if touches.len() == 1 {
                    let c = touches[0].client_coordinates();
                    last_touch.set(Some((c.x, c.y)));
                    follow((c.x, c.y), TOUCH_DRAG_THRESHOLD);
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                if !evt.data().touches().is_empty() {
                    return;
                }
                if *is_pinching.read() {
                    is_pinching.set(false);
                } else {
                    let at = last_touch.take();
                    finish(at);
                }
                last_touch.set(None);
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                finish(None);
                last_touch.set(None);
                is_pinching.set(false);
            },

            // Inner wrapper: the CSS transform applies zoom/pan to map and overlay together
            div {
                class: "map-inner",
                style: "{transform_style}",

                img { src: MAP_IMAGE_URL, alt: "World map", draggable: "false" }

                div {
                    dangerous_inner_html: "{svg_html}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
            }

            if let Some(readout) = selected_readout {
                div { class: "coord-readout",
                    span { class: "coord-tag", "{readout}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_image_ships_with_the_server_assets() {
        let relative = MAP_IMAGE_URL.trim_start_matches("/static/");
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets")
            .join(relative);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains(r#"viewBox="0 0 2048 1024""#));
    }

    fn rendered(id: &str, lat: f64, lng: f64, label: &str, selected: bool) -> RenderedMarker {
        RenderedMarker {
            id: id.to_string(),
            position: LatLng::new(lat, lng),
            label: label.to_string(),
            selected,
        }
    }

    fn marker_gesture(id: &str) -> Gesture {
        Gesture::Marker {
            id: id.to_string(),
            start: (100.0, 100.0),
            moved: false,
            last: None,
        }
    }

    // --- gesture tests ---

    #[test]
    fn test_press_without_movement_is_a_map_click() {
        let gesture = Gesture::Pan {
            start: (10.0, 10.0),
            start_pan: (0.0, 0.0),
            moved: false,
        };
        let at = LatLng::new(51.5, -0.1);
        assert_eq!(release(gesture, Some(at)), Some(SurfaceEvent::MapClick(at)));
    }

    #[test]
    fn test_pan_release_emits_nothing() {
        let gesture = Gesture::Pan {
            start: (10.0, 10.0),
            start_pan: (0.0, 0.0),
            moved: true,
        };
        assert_eq!(release(gesture, Some(LatLng::new(1.0, 1.0))), None);
    }

    #[test]
    fn test_marker_press_without_movement_is_a_marker_click() {
        assert_eq!(
            release(marker_gesture("a"), Some(LatLng::new(1.0, 1.0))),
            Some(SurfaceEvent::MarkerClick { id: "a".to_string() })
        );
    }

    #[test]
    fn test_small_movement_does_not_start_drag() {
        let mut gesture = marker_gesture("a");
        let events = drag_step(&mut gesture, (101.0, 101.0), DRAG_THRESHOLD, Some(LatLng::new(1.0, 1.0)));
        assert!(events.is_empty());
        assert_eq!(gesture, marker_gesture("a"));
    }

    #[test]
    fn test_marker_drag_emits_start_moves_and_end() {
        let mut gesture = marker_gesture("a");
        let p1 = LatLng::new(10.0, 10.0);
        let p2 = LatLng::new(12.0, 14.0);

        let events = drag_step(&mut gesture, (120.0, 100.0), DRAG_THRESHOLD, Some(p1));
        assert_eq!(
            events,
            vec![
                SurfaceEvent::MarkerDragStart { id: "a".to_string() },
                SurfaceEvent::MarkerDragMove { id: "a".to_string(), position: p1 },
            ]
        );

        let events = drag_step(&mut gesture, (130.0, 100.0), DRAG_THRESHOLD, Some(p2));
        assert_eq!(
            events,
            vec![SurfaceEvent::MarkerDragMove { id: "a".to_string(), position: p2 }]
        );

        assert_eq!(
            release(gesture, Some(p2)),
            Some(SurfaceEvent::MarkerDragEnd { id: "a".to_string(), position: p2 })
        );
    }

    #[test]
    fn test_cancelled_drag_drops_marker_at_last_position() {
        let mut gesture = marker_gesture("a");
        let p = LatLng::new(5.0, 6.0);
        drag_step(&mut gesture, (150.0, 100.0), DRAG_THRESHOLD, Some(p));
        assert_eq!(
            cancel(gesture),
            Some(SurfaceEvent::MarkerDragEnd { id: "a".to_string(), position: p })
        );
    }

    #[test]
    fn test_cancelled_click_emits_nothing() {
        assert_eq!(cancel(marker_gesture("a")), None);
        assert_eq!(cancel(Gesture::Idle), None);
    }

    // --- find_nearest tests ---

    #[test]
    fn test_find_nearest_picks_closest_within_threshold() {
        let markers = vec![
            ("a".to_string(), (100.0, 100.0)),
            ("b".to_string(), (110.0, 110.0)),
        ];
        assert_eq!(find_nearest(&markers, (108.0, 108.0), 30.0), Some("b".to_string()));
        assert_eq!(find_nearest(&markers, (102.0, 102.0), 30.0), Some("a".to_string()));
        assert_eq!(find_nearest(&markers, (300.0, 300.0), 30.0), None);
    }

    // --- SVG tests ---

    #[test]
    fn test_svg_shows_labels_of_unselected_markers() {
        let svg = build_svg_content(&[rendered("a", 0.0, 0.0, "7", false)], 1.0);
        assert!(svg.contains(">7</text>"));
        assert!(svg.contains("<title>Marker 7</title>"));
        assert!(!svg.contains("<animate"));
    }

    #[test]
    fn test_svg_selected_marker_has_ring_and_no_label() {
        let svg = build_svg_content(&[rendered("a", 0.0, 0.0, "", true)], 1.0);
        assert!(svg.contains("<animate"));
        assert!(!svg.contains("</text>"));
    }

    #[test]
    fn test_svg_marker_at_projected_position() {
        let svg = build_svg_content(&[rendered("a", 0.0, 0.0, "1", false)], 1.0);
        assert!(svg.contains(r#"cx="1024" cy="512""#));
    }

    #[test]
    fn test_svg_escapes_labels() {
        let svg = build_svg_content(&[rendered("a", 0.0, 0.0, "<b>", false)], 1.0);
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
    }

    #[test]
    fn test_graticule_line_count() {
        let mut svg = String::new();
        build_graticule(&mut svg, 1.0);
        // 13 meridians and 7 parallels at 30 degree spacing
        assert_eq!(svg.matches("<line").count(), 20);
    }

    // --- clamp_pan tests ---

    #[test]
    fn test_clamp_pan_zoom1_map_fits_in_container() {
        // 1024 wide container shows the image 512 tall, inside a 600 tall container
        let (px, py) = clamp_pan(-50.0, -50.0, 1.0, 1024.0, 600.0);
        assert_eq!(px, 0.0);
        assert_eq!(py, 0.0);
    }

    #[test]
    fn test_clamp_pan_zoomed_limits() {
        // At zoom 4: content is 4096 x 2048 in a 1024 x 600 container
        let (px, py) = clamp_pan(-10_000.0, -10_000.0, 4.0, 1024.0, 600.0);
        assert_eq!(px, -3072.0);
        assert_eq!(py, -1448.0);
    }

    #[test]
    fn test_clamp_pan_prevents_positive_pan() {
        let (px, py) = clamp_pan(50.0, 50.0, 2.0, 800.0, 600.0);
        assert_eq!(px, 0.0);
        assert_eq!(py, 0.0);
    }

    #[test]
    fn test_zoom_pan_at_cursor_keeps_point_fixed() {
        let (px, py) = zoom_pan_at_cursor(200.0, 100.0, 2.0, 4.0, -100.0, -50.0);
        // Content point under the cursor: ((200+100)/2, (100+50)/2) = (150, 75)
        assert_eq!((px, py), (200.0 - 150.0 * 4.0, 100.0 - 75.0 * 4.0));
    }
}
