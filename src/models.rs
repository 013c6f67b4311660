//! Data models for the PSC map.
//!
//! This module contains the core data structures shared by the classifier,
//! location model, record index, link graph and view-state codec, along with
//! the raw dataset shapes they are built from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Categories and Modes
// ============================================================================

/// Advisory risk label derived from registry flags.
///
/// Declaration order is the legend order, which is also the order layers are
/// written into a share token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Green,
    Orange,
    Red,
    Grey,
    Black,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Green,
        Category::Orange,
        Category::Red,
        Category::Grey,
        Category::Black,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Green => "green",
            Category::Orange => "orange",
            Category::Red => "red",
            Category::Grey => "grey",
            Category::Black => "black",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Layers shown when a session starts. Grey and black start hidden.
    pub fn default_visible() -> BTreeSet<Category> {
        [Category::Green, Category::Orange, Category::Red]
            .into_iter()
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of a record's two coordinate pairs is its plotted position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    #[serde(rename = "psc")]
    Psc,
    #[serde(rename = "uk")]
    UkCompany,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "psc" => Some(Mode::Psc),
            "uk" => Some(Mode::UkCompany),
            _ => None,
        }
    }

    /// Viewport the map moves to after switching into this mode.
    pub fn default_viewport(&self) -> Viewport {
        match self {
            Mode::Psc => Viewport::GLOBAL,
            Mode::UkCompany => Viewport::UK,
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned rectangle in degrees, as drawn by the selection tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self {
            south: a.lat.min(b.lat),
            west: a.lng.min(b.lng),
            north: a.lat.max(b.lat),
            east: a.lng.max(b.lng),
        }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    /// Smallest rectangle covering every point, or `None` for no points.
    pub fn covering(points: impl IntoIterator<Item = LatLng>) -> Option<Bounds> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Bounds::from_corners(first, first);
        for p in points {
            bounds.extend(p);
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Viewport {
    pub const GLOBAL: Viewport = Viewport {
        center: LatLng::new(54.0, -2.0),
        zoom: 2,
    };
    pub const UK: Viewport = Viewport {
        center: LatLng::new(55.0, -2.0),
        zoom: 6,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::GLOBAL
    }
}

// ============================================================================
// Raw Dataset Shapes
// ============================================================================
//
// The dataset is a JSON array of loosely-typed objects. Every field is
// optional here; defaults are applied once at ingestion.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub company_number: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub data: RawPsc,
    #[serde(default)]
    pub company_details: Option<RawCompanyDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPsc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ceased_on: Option<String>,
    #[serde(default)]
    pub address: RawAddress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAddress {
    #[serde(default)]
    pub premises: Option<String>,
    #[serde(default)]
    pub address_line_1: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCompanyDetails {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_status: Option<String>,
    #[serde(default)]
    pub accounts_overdue: Option<bool>,
    #[serde(default)]
    pub registered_office_is_in_dispute: Option<bool>,
    #[serde(default)]
    pub undeliverable_registered_office_address: Option<bool>,
    #[serde(default)]
    pub accounts_type: Option<String>,
    #[serde(default)]
    pub incorporation_date: Option<String>,
    #[serde(default, rename = "SICs")]
    pub sics: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

// ============================================================================
// Records
// ============================================================================

/// Registry flags the category is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryFlags {
    pub company_status: String,
    pub ceased_on: Option<String>,
    pub accounts_overdue: bool,
    pub office_in_dispute: bool,
    pub office_undeliverable: bool,
    pub accounts_type: String,
}

/// Lower-cased names used only for search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayNames {
    pub company: String,
    pub psc: String,
}

impl DisplayNames {
    pub fn contains(&self, needle_lower: &str) -> bool {
        self.company.contains(needle_lower) || self.psc.contains(needle_lower)
    }
}

/// Rendering payload carried through the core untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordMetadata {
    pub company_name: String,
    pub psc_name: String,
    pub psc_address: String,
    pub uk_company_address: String,
    pub incorporation_date: String,
    pub company_status: String,
    pub ceased_on: Option<String>,
    pub warnings: Vec<&'static str>,
    pub accounts_type: String,
    pub sics: String,
}

/// One ownership relationship.
///
/// Fields are private so the derived category cannot drift from the flags it
/// was computed from; construct through `index::ingest`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    category: Category,
    psc_location: Option<LatLng>,
    uk_location: Option<LatLng>,
    display_names: DisplayNames,
    metadata: RecordMetadata,
}

impl Record {
    pub(crate) fn new(
        id: String,
        category: Category,
        psc_location: Option<LatLng>,
        uk_location: Option<LatLng>,
        display_names: DisplayNames,
        metadata: RecordMetadata,
    ) -> Self {
        Self {
            id,
            category,
            psc_location,
            uk_location,
            display_names,
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn psc_location(&self) -> Option<LatLng> {
        self.psc_location
    }

    pub fn uk_location(&self) -> Option<LatLng> {
        self.uk_location
    }

    pub fn display_names(&self) -> &DisplayNames {
        &self.display_names
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn has_both_locations(&self) -> bool {
        self.psc_location.is_some() && self.uk_location.is_some()
    }
}

// ============================================================================
// View Snapshot
// ============================================================================

/// Shareable view state. Ephemeral; only ever lives in a URL token.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub center: LatLng,
    pub zoom: u8,
    pub visible_categories: BTreeSet<Category>,
    pub linked_ids: Vec<String>,
    pub active_popup_id: Option<String>,
}

impl ViewSnapshot {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            center: self.center,
            zoom: self.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        assert_eq!(Category::parse("purple"), None);
    }

    #[test]
    fn test_default_visible_hides_grey_and_black() {
        let visible = Category::default_visible();
        assert!(visible.contains(&Category::Red));
        assert!(!visible.contains(&Category::Grey));
        assert!(!visible.contains(&Category::Black));
    }

    #[test]
    fn test_bounds_covering_and_contains() {
        let b = Bounds::covering([
            LatLng::new(51.0, -1.0),
            LatLng::new(53.0, 2.0),
            LatLng::new(52.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.south, 51.0);
        assert_eq!(b.east, 2.0);
        assert!(b.contains(LatLng::new(53.0, -1.0)));
        assert!(!b.contains(LatLng::new(50.9, 0.0)));
        assert!(Bounds::covering(std::iter::empty()).is_none());
    }

    #[test]
    fn test_raw_record_tolerates_missing_fields() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"company_number":"01","latitude":1.5,"longitude":null,"data":{"name":"X"}}"#,
        )
        .unwrap();
        assert_eq!(raw.company_number.as_deref(), Some("01"));
        assert_eq!(raw.longitude, None);
        assert!(raw.company_details.is_none());
    }
}
