//! Map containers.
//!
//! A map renders as an empty container plus a JSON configuration block that
//! the site's map script reads by `data-map` id:
//!
//! ```html
//! <div class="inline-map" id="map-0" data-tileset="…"></div>
//! <script class="map-config" type="application/json" data-map="map-0">{…}</script>
//! ```
//!
//! Marker messages are author text. They travel as JSON string data only,
//! with `<`, `>` and `&` written as Unicode escapes so the payload can never
//! close the surrounding script element.

use crate::document::Map;
use maud::{Markup, PreEscaped, html};
use serde_json::json;

pub fn render_map(map: &Map, index: usize) -> Markup {
    let id = format!("map-{index}");
    let payload = escape_script_json(&config_payload(map).to_string());
    html! {
        div.inline-map id=(id) data-tileset=(map.tileset) {}
        script.map-config type="application/json" data-map=(id) {
            (PreEscaped(payload))
        }
    }
}

fn config_payload(map: &Map) -> serde_json::Value {
    let markers: Vec<_> = map
        .markers
        .iter()
        .map(|marker| {
            json!({
                "position": marker.position,
                "message": marker.message,
            })
        })
        .collect();
    json!({
        "tileset": map.tileset,
        "center": map.center,
        "zoom": map.zoom,
        "minZoom": map.min_zoom,
        "maxZoom": map.max_zoom,
        "markers": markers,
    })
}

/// Escape characters that are significant to an HTML parser inside a
/// `<script>` element. The result is still valid JSON with the same value.
fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}
