//! Dual-coordinate location model.
//!
//! Every record may carry a PSC location and a UK company location. The mode
//! picks which one is plotted; the other becomes the link counterpart. A
//! missing pair falls back to the one that is present, so only a record with
//! neither pair is unplottable.

use crate::models::{LatLng, Mode, Record};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("record has neither a PSC nor a UK company location")]
pub struct Unplottable;

/// The two ends of a drawn link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkEndpoints {
    pub primary: LatLng,
    pub counterpart: LatLng,
}

impl LinkEndpoints {
    pub fn is_self_link(&self) -> bool {
        self.primary == self.counterpart
    }
}

pub fn resolve_coordinates(
    psc: Option<LatLng>,
    uk: Option<LatLng>,
    mode: Mode,
) -> Result<LinkEndpoints, Unplottable> {
    match mode {
        Mode::Psc => {
            let primary = psc.or(uk).ok_or(Unplottable)?;
            let counterpart = uk.unwrap_or(primary);
            Ok(LinkEndpoints {
                primary,
                counterpart,
            })
        }
        Mode::UkCompany => {
            let primary = uk.or(psc).ok_or(Unplottable)?;
            let counterpart = psc.unwrap_or(primary);
            Ok(LinkEndpoints {
                primary,
                counterpart,
            })
        }
    }
}

pub fn resolve_position(record: &Record, mode: Mode) -> Result<LatLng, Unplottable> {
    resolve_link_endpoints(record, mode).map(|e| e.primary)
}

pub fn resolve_link_endpoints(record: &Record, mode: Mode) -> Result<LinkEndpoints, Unplottable> {
    resolve_coordinates(record.psc_location(), record.uk_location(), mode)
}
