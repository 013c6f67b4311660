//! Place search against a Nominatim-compatible geocoder.

use crate::models::{LatLng, Viewport};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const PLACE_LIMIT: usize = 5;
pub const PLACE_ZOOM: u8 = 10;
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned an unusable coordinate: {0}")]
    BadCoordinate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// Viewport that recenters on this place.
    pub fn view(&self) -> Viewport {
        Viewport {
            center: LatLng::new(self.lat, self.lon),
            zoom: PLACE_ZOOM,
        }
    }
}

/// Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Hit {
    display_name: String,
    lat: String,
    lon: String,
}

fn parse_coordinate(s: &str) -> Result<f64, GeocodeError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::BadCoordinate(s.to_string()))
}

fn into_places(hits: Vec<Hit>) -> Result<Vec<Place>, GeocodeError> {
    hits.into_iter()
        .take(PLACE_LIMIT)
        .map(|hit| {
            Ok(Place {
                lat: parse_coordinate(&hit.lat)?,
                lon: parse_coordinate(&hit.lon)?,
                display_name: hit.display_name,
            })
        })
        .collect()
}

pub async fn search_places(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
) -> Result<Vec<Place>, GeocodeError> {
    let limit = PLACE_LIMIT.to_string();
    let hits: Vec<Hit> = client
        .get(endpoint)
        .timeout(GEOCODE_TIMEOUT)
        .query(&[
            ("q", query),
            ("format", "json"),
            ("limit", limit.as_str()),
            ("addressdetails", "1"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    debug!(query = %query, hits = hits.len(), "geocoder answered");
    into_places(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(json: &str) -> Vec<Hit> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_places_parses_string_coordinates() {
        let places = into_places(hits(
            r#"[{"display_name":"London, Greater London, England","lat":"51.5073219","lon":"-0.1276474","address":{"city":"London"}}]"#,
        ))
        .unwrap();
        assert_eq!(
            places,
            vec![Place {
                display_name: "London, Greater London, England".into(),
                lat: 51.5073219,
                lon: -0.1276474,
            }]
        );
    }

    #[test]
    fn test_into_places_caps_results() {
        let json = format!(
            "[{}]",
            vec![r#"{"display_name":"x","lat":"1","lon":"2"}"#; 8].join(",")
        );
        assert_eq!(into_places(hits(&json)).unwrap().len(), PLACE_LIMIT);
    }

    #[test]
    fn test_into_places_rejects_garbage() {
        let garbage = hits(r#"[{"display_name":"x","lat":"north","lon":"2"}]"#);
        let err = into_places(garbage).unwrap_err();
        assert!(matches!(err, GeocodeError::BadCoordinate(s) if s == "north"));
    }

    #[test]
    fn test_place_view_zoom() {
        let place = Place {
            display_name: "Leeds".into(),
            lat: 53.8,
            lon: -1.55,
        };
        assert_eq!(
            place.view(),
            Viewport {
                center: LatLng::new(53.8, -1.55),
                zoom: PLACE_ZOOM
            }
        );
    }
}
