//! Link graph: the ordered set of records the user has chosen to link.
//!
//! Order is insertion order, oldest first, and survives sharing and replay.

use std::collections::HashSet;

/// Selections larger than this are rejected outright.
pub const MAX_BULK_SELECTION: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkSelectionError {
    #[error("{count} companies selected - too many to display links (max is {cap})")]
    OverCap { count: usize, cap: usize },
}

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    order: Vec<String>,
    members: HashSet<String>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already linked.
    pub fn add(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        self.members.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_ordered_list(&self) -> &[String] {
        &self.order
    }

    /// First `n` ids in insertion order.
    pub fn first(&self, n: usize) -> &[String] {
        &self.order[..n.min(self.order.len())]
    }

    /// All-or-nothing batch add. A batch with more than `cap` candidates
    /// leaves the graph untouched; otherwise every candidate is attempted in
    /// iteration order. Returns the ids that were newly added.
    pub fn bulk_add<I, S>(&mut self, ids: I, cap: usize) -> Result<Vec<String>, BulkSelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<S> = ids.into_iter().collect();
        if candidates.len() > cap {
            return Err(BulkSelectionError::OverCap {
                count: candidates.len(),
                cap,
            });
        }

        let mut added = Vec::new();
        for id in &candidates {
            if self.add(id.as_ref()) {
                added.push(id.as_ref().to_string());
            }
        }
        Ok(added)
    }
}
