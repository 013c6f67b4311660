//! Record index: ingestion, lookup by id, and filtered search.
//!
//! Raw dataset rows are validated and defaulted exactly once here. Anything
//! downstream can rely on a `Record` having an id, a category, and at least
//! one plottable coordinate pair.

use crate::classify::{classify_flags, warning_labels};
use crate::location::{resolve_link_endpoints, resolve_position, LinkEndpoints, Unplottable};
use crate::models::{
    Bounds, Category, DisplayNames, LatLng, Mode, RawAddress, RawRecord, Record, RecordMetadata,
    RegistryFlags,
};
use std::collections::{BTreeSet, HashMap};

pub const UNKNOWN_COMPANY: &str = "Unknown UK Company";
pub const UNKNOWN_PSC: &str = "UNKNOWN PSC";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("record has no company number")]
    MissingId,
    #[error("record {0} is unplottable")]
    Unplottable(String),
}

// ============================================================================
// Ingestion
// ============================================================================

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn pair(lat: Option<f64>, lng: Option<f64>) -> Option<LatLng> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(LatLng::new(lat, lng)),
        _ => None,
    }
}

/// Capitalise each word of a comma-separated address.
pub fn title_case(s: &str) -> String {
    s.split(',')
        .map(|part| {
            part.trim()
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => {
                            let rest = chars.as_str().to_lowercase();
                            first.to_uppercase().collect::<String>() + &rest
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_address(address: &RawAddress) -> String {
    [
        &address.premises,
        &address.address_line_1,
        &address.locality,
        &address.region,
        &address.country,
    ]
    .into_iter()
    .filter_map(|part| non_empty(part.as_deref()))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Turn one raw dataset row into a typed record.
pub fn ingest(raw: &RawRecord) -> Result<Record, IngestError> {
    let id = non_empty(raw.company_number.as_deref()).ok_or(IngestError::MissingId)?;

    let details = raw.company_details.clone().unwrap_or_default();
    let psc_location = pair(raw.latitude, raw.longitude);
    let uk_location = pair(details.lat, details.lon);
    if psc_location.is_none() && uk_location.is_none() {
        return Err(IngestError::Unplottable(id));
    }

    let flags = RegistryFlags {
        company_status: details.company_status.clone().unwrap_or_default(),
        ceased_on: non_empty(raw.data.ceased_on.as_deref()),
        accounts_overdue: details.accounts_overdue.unwrap_or(false),
        office_in_dispute: details.registered_office_is_in_dispute.unwrap_or(false),
        office_undeliverable: details.undeliverable_registered_office_address.unwrap_or(false),
        accounts_type: details.accounts_type.clone().unwrap_or_default(),
    };
    let category = classify_flags(&flags);

    let company_name =
        non_empty(details.company_name.as_deref()).unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
    let psc_name = non_empty(raw.data.name.as_deref())
        .map(|n| n.to_uppercase())
        .unwrap_or_else(|| UNKNOWN_PSC.to_string());

    let display_names = DisplayNames {
        company: company_name.to_lowercase(),
        psc: psc_name.to_lowercase(),
    };

    let metadata = RecordMetadata {
        psc_address: join_address(&raw.data.address),
        uk_company_address: details.address.as_deref().map(title_case).unwrap_or_default(),
        incorporation_date: details.incorporation_date.clone().unwrap_or_default(),
        company_status: flags.company_status.clone(),
        ceased_on: flags.ceased_on.clone(),
        warnings: warning_labels(&flags),
        accounts_type: flags.accounts_type.clone(),
        sics: details.sics.clone().unwrap_or_default(),
        company_name,
        psc_name,
    };

    Ok(Record::new(
        id,
        category,
        psc_location,
        uk_location,
        display_names,
        metadata,
    ))
}

// ============================================================================
// Index
// ============================================================================

/// Counts from a build, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub kept: usize,
    pub missing_id: usize,
    pub unplottable: usize,
    pub duplicate: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    mode: Mode,
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
}

impl RecordIndex {
    /// Full rebuild under `mode`. Rows without an id, rows with no usable
    /// coordinates, and repeated ids (first one wins) are dropped.
    pub fn build(raw: &[RawRecord], mode: Mode) -> (RecordIndex, BuildReport) {
        let mut index = RecordIndex {
            mode,
            records: Vec::with_capacity(raw.len()),
            by_id: HashMap::with_capacity(raw.len()),
        };
        let mut report = BuildReport::default();

        for row in raw {
            let record = match ingest(row) {
                Ok(r) => r,
                Err(IngestError::MissingId) => {
                    report.missing_id += 1;
                    continue;
                }
                Err(IngestError::Unplottable(_)) => {
                    report.unplottable += 1;
                    continue;
                }
            };
            if resolve_position(&record, mode).is_err() {
                report.unplottable += 1;
                continue;
            }
            if index.by_id.contains_key(record.id()) {
                report.duplicate += 1;
                continue;
            }
            index.by_id.insert(record.id().to_string(), index.records.len());
            index.records.push(record);
        }

        report.kept = index.records.len();
        (index, report)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn by_id(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// Plotted position of a record under this index's mode.
    pub fn position(&self, record: &Record) -> Result<LatLng, Unplottable> {
        resolve_position(record, self.mode)
    }

    pub fn endpoints(&self, record: &Record) -> Result<LinkEndpoints, Unplottable> {
        resolve_link_endpoints(record, self.mode)
    }

    /// Case-insensitive substring match on company or PSC name, restricted to
    /// visible categories, in index order. A blank query matches nothing.
    pub fn search(&self, text: &str, visible: &BTreeSet<Category>) -> Vec<&Record> {
        use rayon::prelude::*;

        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.records
            .par_iter()
            .filter(|r| visible.contains(&r.category()) && r.display_names().contains(&needle))
            .collect()
    }

    /// Visible records whose plotted position lies inside `bounds`, in index order.
    pub fn within(&self, bounds: &Bounds, visible: &BTreeSet<Category>) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| visible.contains(&r.category()))
            .filter(|r| self.position(r).map(|p| bounds.contains(p)).unwrap_or(false))
            .collect()
    }
}
