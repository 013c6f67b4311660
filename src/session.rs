//! Investigator session state and the operations that mutate it.
//!
//! Every operation is a state transition on `Session` followed by explicit
//! calls on a `RenderBoundary`, so the state can be asserted on without a
//! renderer. Dataset loads are tagged with the mode and mode epoch they were
//! issued under and are refused if the user has switched mode since.

use crate::codec::{self, DecodeError, DecodedView, MAX_SHARED_LINKS};
use crate::index::{BuildReport, RecordIndex};
use crate::links::{BulkSelectionError, LinkGraph, MAX_BULK_SELECTION};
use crate::models::{Bounds, Category, Mode, RawRecord, Record, ViewSnapshot, Viewport};
use crate::render::{
    link_segments, plot_all, segment_bounds, segment_for, sync_links, RenderBoundary,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no record with id {0}")]
    UnknownRecord(String),
    #[error("{count} companies selected - too many to display links (max is {max})")]
    SelectionTooLarge { count: usize, max: usize },
    #[error("dataset requested in {requested:?} mode is stale")]
    StaleDataset { requested: Mode },
}

impl From<BulkSelectionError> for SessionError {
    fn from(err: BulkSelectionError) -> Self {
        match err {
            BulkSelectionError::OverCap { count, cap } => {
                SessionError::SelectionTooLarge { count, max: cap }
            }
        }
    }
}

/// Identifies the session state a dataset load was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub mode: Mode,
    pub epoch: u64,
}

/// Result of preparing a share token.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub token: String,
    pub snapshot: ViewSnapshot,
    /// Links in the session, which may exceed what the token carries.
    pub total_links: usize,
}

impl Share {
    pub fn truncated(&self) -> bool {
        self.total_links > MAX_SHARED_LINKS
    }

    pub fn warning(&self) -> Option<String> {
        self.truncated().then(|| {
            format!(
                "Of the {} links created, only the first {} can be shared.",
                self.total_links, MAX_SHARED_LINKS
            )
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub linked: Vec<String>,
    pub skipped: Vec<String>,
    pub popup_opened: bool,
}

#[derive(Debug)]
pub enum RestoreOutcome {
    /// The query carried no view state.
    Nothing,
    Restored(RestoreReport),
    /// The token was rejected and the view reset to the global default.
    Failed(DecodeError),
}

#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    epoch: u64,
    index: RecordIndex,
    links: LinkGraph,
    visible: BTreeSet<Category>,
    viewport: Viewport,
    active_popup: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            mode: Mode::Psc,
            epoch: 0,
            index: RecordIndex::default(),
            links: LinkGraph::new(),
            visible: Category::default_visible(),
            viewport: Viewport::GLOBAL,
            active_popup: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    pub fn links(&self) -> &LinkGraph {
        &self.links
    }

    pub fn visible(&self) -> &BTreeSet<Category> {
        &self.visible
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_popup(&self) -> Option<&str> {
        self.active_popup.as_deref()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_active_popup(&mut self, id: Option<String>) {
        self.active_popup = id.filter(|id| self.index.by_id(id).is_some());
    }

    // ------------------------------------------------------------------------
    // Dataset and mode
    // ------------------------------------------------------------------------

    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            mode: self.mode,
            epoch: self.epoch,
        }
    }

    /// Rebuild the index from a completed load, then re-plot records, layers
    /// and links. Results for a superseded ticket are refused untouched.
    pub fn apply_dataset<R: RenderBoundary + ?Sized>(
        &mut self,
        ticket: LoadTicket,
        raw: &[RawRecord],
        renderer: &mut R,
    ) -> Result<BuildReport, SessionError> {
        if ticket != self.begin_load() {
            warn!(
                requested = ?ticket.mode,
                current = ?self.mode,
                "dropping stale dataset response"
            );
            return Err(SessionError::StaleDataset {
                requested: ticket.mode,
            });
        }

        let (index, report) = RecordIndex::build(raw, ticket.mode);
        info!(
            mode = ?ticket.mode,
            kept = report.kept,
            missing_id = report.missing_id,
            unplottable = report.unplottable,
            duplicate = report.duplicate,
            "record index built"
        );
        self.index = index;
        if let Some(id) = &self.active_popup {
            if self.index.by_id(id).is_none() {
                self.active_popup = None;
            }
        }

        self.render_all(renderer);
        Ok(report)
    }

    /// Idempotent: bring the renderer fully in line with the session.
    pub fn render_all<R: RenderBoundary + ?Sized>(&self, renderer: &mut R) {
        plot_all(renderer, &self.index);
        for category in Category::ALL {
            renderer.set_layer_visible(category, self.visible.contains(&category));
        }
        sync_links(renderer, &self.links, &self.index);
    }

    /// Switch mode and move to its default view. The caller must load the
    /// dataset again and hand it back with the returned ticket.
    pub fn switch_mode<R: RenderBoundary + ?Sized>(
        &mut self,
        mode: Mode,
        renderer: &mut R,
    ) -> LoadTicket {
        self.mode = mode;
        self.epoch += 1;
        self.viewport = mode.default_viewport();
        renderer.set_view(self.viewport);
        self.begin_load()
    }

    // ------------------------------------------------------------------------
    // Links and layers
    // ------------------------------------------------------------------------

    pub fn show_link<R: RenderBoundary + ?Sized>(
        &mut self,
        id: &str,
        renderer: &mut R,
    ) -> Result<(), SessionError> {
        let record = self
            .index
            .by_id(id)
            .ok_or_else(|| SessionError::UnknownRecord(id.to_string()))?;
        let segment = segment_for(record, &self.index)
            .ok_or_else(|| SessionError::UnknownRecord(id.to_string()))?;

        if self.links.add(id) {
            renderer.draw_link(&segment);
        }
        if let Some(bounds) = segment_bounds([&segment]) {
            renderer.fit_bounds(bounds);
        }
        Ok(())
    }

    pub fn clear_links<R: RenderBoundary + ?Sized>(&mut self, renderer: &mut R) {
        self.links.clear();
        renderer.remove_all_links();
    }

    pub fn set_layer_visible<R: RenderBoundary + ?Sized>(
        &mut self,
        category: Category,
        visible: bool,
        renderer: &mut R,
    ) {
        if visible {
            self.visible.insert(category);
        } else {
            self.visible.remove(&category);
        }
        renderer.set_layer_visible(category, visible);
    }

    /// Link every visible record plotted inside `bounds`. More than
    /// `MAX_BULK_SELECTION` candidates rejects the whole selection. Only
    /// records with both locations are linked. Returns the newly linked ids.
    pub fn select_area<R: RenderBoundary + ?Sized>(
        &mut self,
        bounds: Bounds,
        renderer: &mut R,
    ) -> Result<Vec<String>, SessionError> {
        let candidates: Vec<&Record> = self.index.within(&bounds, &self.visible);
        if candidates.len() > MAX_BULK_SELECTION {
            let err = SessionError::SelectionTooLarge {
                count: candidates.len(),
                max: MAX_BULK_SELECTION,
            };
            info!(count = candidates.len(), "area selection rejected");
            renderer.notify(&err.to_string());
            return Err(err);
        }
        renderer.notify(&format!("{} companies selected", candidates.len()));

        let eligible: Vec<String> = candidates
            .iter()
            .filter(|r| r.has_both_locations())
            .map(|r| r.id().to_string())
            .collect();
        let added = self.links.bulk_add(&eligible, MAX_BULK_SELECTION)?;

        for id in &added {
            if let Some(segment) = self.index.by_id(id).and_then(|r| segment_for(r, &self.index)) {
                renderer.draw_link(&segment);
            }
        }
        if let Some(bounds) = segment_bounds(&link_segments(&self.links, &self.index)) {
            renderer.fit_bounds(bounds);
        }
        Ok(added)
    }

    pub fn search(&self, text: &str) -> Vec<&Record> {
        self.index.search(text, &self.visible)
    }

    // ------------------------------------------------------------------------
    // Sharing
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            center: self.viewport.center,
            zoom: self.viewport.zoom,
            visible_categories: self.visible.clone(),
            linked_ids: self.links.first(MAX_SHARED_LINKS).to_vec(),
            active_popup_id: self.active_popup.clone(),
        }
    }

    pub fn share(&self) -> Share {
        let snapshot = self.snapshot();
        Share {
            token: codec::encode(&snapshot),
            snapshot,
            total_links: self.links.len(),
        }
    }

    /// Replay a decoded view onto a session cleared of links and popup.
    /// Order matters: layers first so links land in enabled layers, then the
    /// viewport, then links, then the viewport again to undo any drift from
    /// link drawing, then the popup.
    pub fn restore<R: RenderBoundary + ?Sized>(
        &mut self,
        view: &DecodedView,
        renderer: &mut R,
    ) -> RestoreReport {
        let snapshot = &view.snapshot;
        let mut report = RestoreReport::default();

        self.clear_links(renderer);
        self.active_popup = None;

        if view.applies_layers {
            for category in Category::ALL {
                let visible = snapshot.visible_categories.contains(&category);
                self.set_layer_visible(category, visible, renderer);
            }
        }

        self.viewport = snapshot.viewport();
        renderer.set_view(self.viewport);

        for id in &snapshot.linked_ids {
            let segment = self.index.by_id(id).and_then(|r| segment_for(r, &self.index));
            match segment {
                Some(segment) => {
                    if self.links.add(id) {
                        renderer.draw_link(&segment);
                    }
                    report.linked.push(id.clone());
                }
                None => {
                    debug!(id = %id, "shared link does not resolve, skipping");
                    report.skipped.push(id.clone());
                }
            }
        }

        renderer.set_view(self.viewport);

        if let Some(id) = &snapshot.active_popup_id {
            if self.index.by_id(id).is_some() {
                self.active_popup = Some(id.clone());
                renderer.reveal_record(id);
                report.popup_opened = true;
            }
        }

        report
    }

    /// Restore from a page query string. Decode failures never escape: they
    /// are logged and the view falls back to the global default.
    pub fn restore_from_query<R: RenderBoundary + ?Sized>(
        &mut self,
        query: &str,
        renderer: &mut R,
    ) -> RestoreOutcome {
        match codec::decode_query(query) {
            Ok(None) => RestoreOutcome::Nothing,
            Ok(Some(view)) => RestoreOutcome::Restored(self.restore(&view, renderer)),
            Err(err) => {
                warn!(error = %err, "could not restore shared view");
                self.viewport = Viewport::GLOBAL;
                renderer.set_view(self.viewport);
                RestoreOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
