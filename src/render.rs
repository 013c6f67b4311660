//! Render boundary.
//!
//! The core never draws. State transitions happen first (index, link graph,
//! layers); the renderer is then told what to show. `RenderQueue` collects
//! the calls as serialisable commands for the browser to replay, and doubles
//! as the test double.

use crate::index::RecordIndex;
use crate::links::LinkGraph;
use crate::location::LinkEndpoints;
use crate::models::{Bounds, Category, LatLng, Record, Viewport};
use crate::templates::popup_html;
use serde::Serialize;

/// One drawable link: a segment between the record's plotted position and its
/// counterpart, plus a highlighted marker at the counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSegment {
    pub id: String,
    pub category: Category,
    pub endpoints: LinkEndpoints,
}

pub trait RenderBoundary {
    fn clear_markers(&mut self);
    fn plot_record(&mut self, record: &Record, at: LatLng);
    fn draw_link(&mut self, segment: &LinkSegment);
    /// Removes every segment and extra marker and resets record icons.
    fn remove_all_links(&mut self);
    fn set_layer_visible(&mut self, category: Category, visible: bool);
    fn set_view(&mut self, viewport: Viewport);
    fn fit_bounds(&mut self, bounds: Bounds);
    /// Bring a record into view and open its popup.
    fn reveal_record(&mut self, id: &str);
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    ClearMarkers,
    PlotRecord {
        id: String,
        category: Category,
        at: LatLng,
        title: String,
        popup_html: String,
    },
    DrawLink(LinkSegment),
    RemoveAllLinks,
    SetLayerVisible {
        category: Category,
        visible: bool,
    },
    SetView(Viewport),
    FitBounds(Bounds),
    RevealRecord {
        id: String,
    },
    Notify {
        message: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RenderQueue {
    commands: Vec<RenderCommand>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<RenderCommand> {
        self.commands
    }

    pub fn count(&self, pred: impl Fn(&RenderCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl RenderBoundary for RenderQueue {
    fn clear_markers(&mut self) {
        self.commands.push(RenderCommand::ClearMarkers);
    }

    fn plot_record(&mut self, record: &Record, at: LatLng) {
        self.commands.push(RenderCommand::PlotRecord {
            id: record.id().to_string(),
            category: record.category(),
            at,
            title: record.metadata().company_name.clone(),
            popup_html: popup_html(record),
        });
    }

    fn draw_link(&mut self, segment: &LinkSegment) {
        self.commands.push(RenderCommand::DrawLink(segment.clone()));
    }

    fn remove_all_links(&mut self) {
        self.commands.push(RenderCommand::RemoveAllLinks);
    }

    fn set_layer_visible(&mut self, category: Category, visible: bool) {
        self.commands
            .push(RenderCommand::SetLayerVisible { category, visible });
    }

    fn set_view(&mut self, viewport: Viewport) {
        self.commands.push(RenderCommand::SetView(viewport));
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.commands.push(RenderCommand::FitBounds(bounds));
    }

    fn reveal_record(&mut self, id: &str) {
        self.commands
            .push(RenderCommand::RevealRecord { id: id.to_string() });
    }

    fn notify(&mut self, message: &str) {
        self.commands.push(RenderCommand::Notify {
            message: message.to_string(),
        });
    }
}

// ============================================================================
// Pure derivations
// ============================================================================

pub fn segment_for(record: &Record, index: &RecordIndex) -> Option<LinkSegment> {
    let endpoints = index.endpoints(record).ok()?;
    Some(LinkSegment {
        id: record.id().to_string(),
        category: record.category(),
        endpoints,
    })
}

/// Segments for every linked id the index can resolve, in link order.
pub fn link_segments(links: &LinkGraph, index: &RecordIndex) -> Vec<LinkSegment> {
    links
        .to_ordered_list()
        .iter()
        .filter_map(|id| index.by_id(id))
        .filter_map(|record| segment_for(record, index))
        .collect()
}

pub fn segment_bounds<'a>(segments: impl IntoIterator<Item = &'a LinkSegment>) -> Option<Bounds> {
    Bounds::covering(
        segments
            .into_iter()
            .flat_map(|s| [s.endpoints.primary, s.endpoints.counterpart]),
    )
}

// ============================================================================
// Sync steps
// ============================================================================

/// Re-plot every record at its position under the index's mode.
pub fn plot_all<R: RenderBoundary + ?Sized>(renderer: &mut R, index: &RecordIndex) {
    renderer.clear_markers();
    for record in index.records() {
        if let Ok(at) = index.position(record) {
            renderer.plot_record(record, at);
        }
    }
}

/// Bring drawn links in line with the graph. Safe to call repeatedly.
pub fn sync_links<R: RenderBoundary + ?Sized>(
    renderer: &mut R,
    links: &LinkGraph,
    index: &RecordIndex,
) {
    renderer.remove_all_links();
    for segment in link_segments(links, index) {
        renderer.draw_link(&segment);
    }
}
