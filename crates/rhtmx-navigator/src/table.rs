/// Immutable, specificity-ordered route table
use std::sync::Arc;

use crate::route::RouteEntry;

/// The compiled set of routes, sorted by descending segment count
///
/// Longer templates are attempted first; routes with the same segment count
/// keep their declaration order. Built once, then shared read-only (entries
/// sit behind `Arc`, so the table can be cloned cheaply across tasks).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<Arc<RouteEntry>>,
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        let mut entries: Vec<Arc<RouteEntry>> = entries.into_iter().map(Arc::new).collect();
        // Stable sort: ties keep declaration order
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.segment_count()));
        Self { entries }
    }

    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that declare a logical name
    pub fn named(&self) -> impl Iterator<Item = (&str, &Arc<RouteEntry>)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.name.as_deref().map(|name| (name, entry)))
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Arc<RouteEntry>;
    type IntoIter = std::slice::Iter<'a, Arc<RouteEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
