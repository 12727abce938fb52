// ── Viewport visibility ──
//
// The core only needs to know which rows are on screen. Whatever draws the
// rows implements `VisibilityTracker` and reports enter/leave through the
// `VisibilitySignal` it is handed for each row.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};

/// Names of rows currently inside the viewport.
#[derive(Debug, Default)]
pub struct VisibleSet {
    names: DashSet<String>,
}

impl VisibleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn insert(&self, name: &str) {
        self.names.insert(name.to_owned());
    }

    pub(crate) fn remove(&self, name: &str) {
        self.names.remove(name);
    }

    pub(crate) fn clear(&self) {
        self.names.clear();
    }
}

/// Enter/leave callback for one row.
#[derive(Debug, Clone)]
pub struct VisibilitySignal {
    name: String,
    visible: Arc<VisibleSet>,
}

impl VisibilitySignal {
    pub(crate) fn new(name: &str, visible: Arc<VisibleSet>) -> Self {
        Self {
            name: name.to_owned(),
            visible,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The row scrolled into view.
    pub fn enter(&self) {
        self.visible.insert(&self.name);
    }

    /// The row left the viewport.
    pub fn leave(&self) {
        self.visible.remove(&self.name);
    }
}

/// Injected capability: watch rows and report when they enter or leave
/// the viewport.
pub trait VisibilityTracker: Send + Sync {
    /// Start watching a newly created row.
    fn observe(&self, signal: VisibilitySignal);

    /// Stop watching a removed row.
    fn unobserve(&self, name: &str);
}

/// Every row is always on screen. Suits surfaces that print the whole
/// table, such as a terminal redraw.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysVisible;

impl VisibilityTracker for AlwaysVisible {
    fn observe(&self, signal: VisibilitySignal) {
        signal.enter();
    }

    fn unobserve(&self, _name: &str) {}
}

/// Visibility driven by name from outside, e.g. a scrolling list that
/// knows which slice of rows it shows.
#[derive(Debug, Default)]
pub struct ManualVisibility {
    signals: DashMap<String, VisibilitySignal>,
}

impl ManualVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a row visible. Unknown names are ignored.
    pub fn enter(&self, name: &str) {
        if let Some(signal) = self.signals.get(name) {
            signal.enter();
        }
    }

    pub fn leave(&self, name: &str) {
        if let Some(signal) = self.signals.get(name) {
            signal.leave();
        }
    }

    /// Show exactly `names`, hiding every other observed row.
    pub fn show_only<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        for entry in &self.signals {
            entry.value().leave();
        }
        for name in names {
            self.enter(name);
        }
    }

    pub fn observed(&self) -> usize {
        self.signals.len()
    }
}

impl VisibilityTracker for ManualVisibility {
    fn observe(&self, signal: VisibilitySignal) {
        self.signals.insert(signal.name().to_owned(), signal);
    }

    fn unobserve(&self, name: &str) {
        self.signals.remove(name);
    }
}
