//! Shareable view-state codec.
//!
//! A snapshot is written as a small JSON object, compressed with LZ-string and
//! emitted in its URI-component alphabet, so tokens produced by the earlier
//! JavaScript map still decode here. The older flat `lat`/`lng`/`zoom` query
//! form is accepted as well.

use crate::models::{Category, LatLng, ViewSnapshot};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Links beyond this many are dropped from a share token.
pub const MAX_SHARED_LINKS: usize = 25;
pub const MAX_ZOOM: u8 = 24;

/// Query parameter carrying the compressed token.
pub const STATE_PARAM: &str = "s";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty share token")]
    Empty,
    #[error("share token could not be decompressed")]
    Decompress,
    #[error("share token is not valid UTF-16 text")]
    Utf16,
    #[error("share token is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid view state: {0}")]
    Invalid(String),
}

// ============================================================================
// Wire form
// ============================================================================

/// Numbers written by the old client were fixed-point strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> Result<f64, DecodeError> {
        let v = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| DecodeError::Invalid(format!("{field} is not a number: {s:?}")))?,
        };
        if v.is_finite() {
            Ok(v)
        } else {
            Err(DecodeError::Invalid(format!("{field} is not finite")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireState {
    lat: Numeric,
    lng: Numeric,
    zoom: Numeric,
    #[serde(default)]
    popup: Option<String>,
    #[serde(default)]
    links: Option<Vec<String>>,
    #[serde(default)]
    layers: Option<BTreeMap<String, bool>>,
}

fn parse_center(lat: f64, lng: f64) -> Result<LatLng, DecodeError> {
    normalize_center(LatLng::new(lat, lng))
}

/// Latitude must lie in [-90, 90]. Longitudes outside [-180, 180], which a map
/// panned across the antimeridian reports, are wrapped back into range.
pub fn normalize_center(center: LatLng) -> Result<LatLng, DecodeError> {
    let LatLng { lat, lng } = center;
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(DecodeError::Invalid(format!("latitude {lat} out of range")));
    }
    if !lng.is_finite() {
        return Err(DecodeError::Invalid("longitude is not finite".to_string()));
    }
    let lng = if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    };
    Ok(LatLng::new(lat, lng))
}

/// Zoom levels are integers; fractional values truncate as the old client's
/// `parseInt` did.
fn parse_zoom(zoom: f64) -> Result<u8, DecodeError> {
    let z = zoom.trunc();
    if z < 0.0 || z > f64::from(MAX_ZOOM) {
        return Err(DecodeError::Invalid(format!("zoom {zoom} out of range")));
    }
    Ok(z as u8)
}

fn parse_layers(layers: &BTreeMap<String, bool>) -> Result<BTreeSet<Category>, DecodeError> {
    let mut visible = BTreeSet::new();
    for (name, &on) in layers {
        let category = Category::parse(name)
            .ok_or_else(|| DecodeError::Invalid(format!("unknown layer {name:?}")))?;
        if on {
            visible.insert(category);
        }
    }
    Ok(visible)
}

/// A decoded snapshot plus whether it says anything about layer visibility.
/// Legacy links and tokens without a `layers` object leave layers alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedView {
    pub snapshot: ViewSnapshot,
    pub applies_layers: bool,
}

impl WireState {
    fn into_view(self) -> Result<DecodedView, DecodeError> {
        let center = parse_center(self.lat.value("lat")?, self.lng.value("lng")?)?;
        let zoom = parse_zoom(self.zoom.value("zoom")?)?;
        let visible_categories = match &self.layers {
            Some(layers) => parse_layers(layers)?,
            None => BTreeSet::new(),
        };
        let mut linked_ids = self.links.unwrap_or_default();
        linked_ids.truncate(MAX_SHARED_LINKS);

        Ok(DecodedView {
            snapshot: ViewSnapshot {
                center,
                zoom,
                visible_categories,
                linked_ids,
                active_popup_id: self.popup.filter(|p| !p.is_empty()),
            },
            applies_layers: self.layers.is_some(),
        })
    }
}

// ============================================================================
// Encode / Decode
// ============================================================================

fn canonical_json(snapshot: &ViewSnapshot) -> Value {
    let layers: Map<String, Value> = Category::ALL
        .iter()
        .map(|c| {
            (
                c.as_str().to_string(),
                Value::Bool(snapshot.visible_categories.contains(c)),
            )
        })
        .collect();
    let links = &snapshot.linked_ids[..snapshot.linked_ids.len().min(MAX_SHARED_LINKS)];

    json!({
        "lat": snapshot.center.lat,
        "lng": snapshot.center.lng,
        "zoom": snapshot.zoom,
        "popup": snapshot.active_popup_id,
        "links": links,
        "layers": layers,
    })
}

/// Serialise a snapshot to a URL-safe token. Only the first
/// `MAX_SHARED_LINKS` linked ids are kept; warning the user is up to the caller.
pub fn encode(snapshot: &ViewSnapshot) -> String {
    let text = canonical_json(snapshot).to_string();
    lz_str::compress_to_encoded_uri_component(text.as_str())
}

pub fn decode(token: &str) -> Result<ViewSnapshot, DecodeError> {
    decode_view(token).map(|v| v.snapshot)
}

pub fn decode_view(token: &str) -> Result<DecodedView, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }
    // Form decoding turns '+' into a space.
    let token = token.replace(' ', "+");
    let wide = lz_str::decompress_from_encoded_uri_component(token.as_str())
        .ok_or(DecodeError::Decompress)?;
    let text = String::from_utf16(&wide).map_err(|_| DecodeError::Utf16)?;
    let wire: WireState = serde_json::from_str(&text)?;
    wire.into_view()
}

/// Flat `lat`/`lng`/`zoom` parameters from older shared links.
pub fn decode_legacy(lat: &str, lng: &str, zoom: &str) -> Result<ViewSnapshot, DecodeError> {
    let lat = Numeric::Text(lat.to_string()).value("lat")?;
    let lng = Numeric::Text(lng.to_string()).value("lng")?;
    let zoom = Numeric::Text(zoom.to_string()).value("zoom")?;
    Ok(ViewSnapshot {
        center: parse_center(lat, lng)?,
        zoom: parse_zoom(zoom)?,
        visible_categories: BTreeSet::new(),
        linked_ids: Vec::new(),
        active_popup_id: None,
    })
}

/// Pick the restore source out of a page query string: `s` wins, then the
/// legacy triple. `Ok(None)` means there is nothing to restore.
pub fn decode_query(query: &str) -> Result<Option<DecodedView>, DecodeError> {
    let query = query.trim_start_matches('?');
    let params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    if let Some(token) = params.get(STATE_PARAM) {
        return decode_view(token).map(Some);
    }

    match (params.get("lat"), params.get("lng"), params.get("zoom")) {
        (Some(lat), Some(lng), Some(zoom)) => Ok(Some(DecodedView {
            snapshot: decode_legacy(lat, lng, zoom)?,
            applies_layers: false,
        })),
        _ => Ok(None),
    }
}

/// `base` with its query and fragment replaced by `?s=<token>`.
pub fn share_url(base: &Url, token: &str) -> String {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    format!("{}?{}={}", url, STATE_PARAM, urlencoding::encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(links: usize) -> ViewSnapshot {
        ViewSnapshot {
            center: LatLng::new(51.507351, -0.127758),
            zoom: 7,
            visible_categories: [Category::Red, Category::Black].into_iter().collect(),
            linked_ids: (0..links).map(|i| format!("{:08}", i)).collect(),
            active_popup_id: Some("00000003".to_string()),
        }
    }

    fn js_token(json: &str) -> String {
        lz_str::compress_to_encoded_uri_component(json)
    }

    #[test]
    fn test_round_trip() {
        let s = snapshot(3);
        let token = encode(&s);
        assert_eq!(decode(&token).unwrap(), s);
    }

    #[test]
    fn test_round_trip_without_popup_or_layers() {
        let s = ViewSnapshot {
            center: LatLng::new(-33.8688197, 151.2092955),
            zoom: 0,
            visible_categories: BTreeSet::new(),
            linked_ids: Vec::new(),
            active_popup_id: None,
        };
        assert_eq!(decode(&encode(&s)).unwrap(), s);
    }

    #[test]
    fn test_encode_truncates_to_first_25_links() {
        let s = snapshot(30);
        let decoded = decode(&encode(&s)).unwrap();
        assert_eq!(decoded.linked_ids.len(), MAX_SHARED_LINKS);
        assert_eq!(decoded.linked_ids, s.linked_ids[..25].to_vec());
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode(&snapshot(25));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '$'));
    }

    #[test]
    fn test_decodes_string_coordinates_from_old_client() {
        let token = js_token(
            r#"{"lat":"51.500000","lng":"-0.120000","zoom":9,"popup":"123","links":["123","456"],"layers":{"green":true,"orange":false,"red":true,"grey":false,"black":false}}"#,
        );
        let view = decode_view(&token).unwrap();
        assert!(view.applies_layers);
        let s = view.snapshot;
        assert_eq!(s.center, LatLng::new(51.5, -0.12));
        assert_eq!(s.zoom, 9);
        assert_eq!(s.linked_ids, vec!["123", "456"]);
        assert_eq!(s.active_popup_id.as_deref(), Some("123"));
        assert_eq!(
            s.visible_categories,
            [Category::Green, Category::Red].into_iter().collect()
        );
    }

    #[test]
    fn test_missing_layers_and_links_are_tolerated() {
        let token = js_token(r#"{"lat":1,"lng":2,"zoom":"3"}"#);
        let view = decode_view(&token).unwrap();
        assert!(!view.applies_layers);
        assert!(view.snapshot.linked_ids.is_empty());
        assert_eq!(view.snapshot.active_popup_id, None);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(matches!(decode(""), Err(DecodeError::Empty)));
        assert!(decode("not a real token!!").is_err());

        let token = encode(&snapshot(5));
        assert!(decode(&token[..token.len() / 2]).is_err());
    }

    #[test]
    fn test_rejects_structurally_invalid_state() {
        let cases = [
            r#""hello""#,
            r#"[]"#,
            r#"{"lng":2,"zoom":3}"#,
            r#"{"lat":"north","lng":2,"zoom":3}"#,
            r#"{"lat":91,"lng":2,"zoom":3}"#,
            r#"{"lat":1,"lng":2,"zoom":-1}"#,
            r#"{"lat":1,"lng":2,"zoom":3,"links":[1,2]}"#,
            r#"{"lat":1,"lng":2,"zoom":3,"layers":{"purple":true}}"#,
        ];
        for json in cases {
            assert!(decode(&js_token(json)).is_err(), "accepted {json}");
        }
    }

    #[test]
    fn test_wraps_longitude_past_antimeridian() {
        let view = decode_view(&js_token(r#"{"lat":10,"lng":200,"zoom":3}"#)).unwrap();
        assert_eq!(view.snapshot.center, LatLng::new(10.0, -160.0));
        let view = decode_view(&js_token(r#"{"lat":10,"lng":-180,"zoom":3}"#)).unwrap();
        assert_eq!(view.snapshot.center, LatLng::new(10.0, -180.0));
    }

    #[test]
    fn test_normalize_center() {
        assert_eq!(
            normalize_center(LatLng::new(51.5, 359.0)).unwrap(),
            LatLng::new(51.5, -1.0)
        );
        assert!(normalize_center(LatLng::new(95.0, 0.0)).is_err());
        assert!(normalize_center(LatLng::new(0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_decode_tolerates_space_for_plus() {
        let token = encode(&snapshot(10));
        let spaced = token.replace('+', " ");
        assert_eq!(decode(&spaced).unwrap(), snapshot(10));
    }

    #[test]
    fn test_legacy_parameters() {
        let s = decode_legacy("48.8566", "2.3522", "11").unwrap();
        assert_eq!(s.center, LatLng::new(48.8566, 2.3522));
        assert_eq!(s.zoom, 11);
        assert!(s.linked_ids.is_empty());
        assert!(s.visible_categories.is_empty());
        assert!(decode_legacy("x", "2", "3").is_err());
    }

    #[test]
    fn test_decode_query_prefers_state_param() {
        let token = encode(&snapshot(2));
        let query = format!("lat=1&lng=2&zoom=3&s={}", urlencoding::encode(&token));
        let view = decode_query(&query).unwrap().unwrap();
        assert_eq!(view.snapshot, snapshot(2));

        let view = decode_query("?lat=1&lng=2&zoom=3").unwrap().unwrap();
        assert!(!view.applies_layers);
        assert_eq!(view.snapshot.zoom, 3);

        assert!(decode_query("lat=1&lng=2").unwrap().is_none());
        assert!(decode_query("").unwrap().is_none());
        assert!(decode_query("s=%%%").is_err());
    }

    #[test]
    fn test_share_url_replaces_query() {
        let base = Url::parse("https://example.org/map/?lat=1&lng=2&zoom=3#x").unwrap();
        let token = encode(&snapshot(1));
        let url = share_url(&base, &token);
        assert!(url.starts_with("https://example.org/map/?s="));
        let parsed = Url::parse(&url).unwrap();
        let query = parsed.query().unwrap();
        assert_eq!(decode_query(query).unwrap().unwrap().snapshot, snapshot(1));
    }
}
