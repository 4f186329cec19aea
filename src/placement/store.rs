//! The authoritative mapping from element identity to committed position.
//!
//! A keyed map with mode metadata and nothing else: `set` overwrites
//! unconditionally, and the never-overwrite-manual rule is enforced by the
//! orchestrator, not here.

use std::collections::BTreeMap;

use crate::geometry::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// Engine-computed; recomputed whenever the element's inputs change.
    Auto,
    /// Pinned by an explicit user move; only an explicit call changes it.
    Manual,
}

/// A committed label. Owned exclusively by the store; the bounding box is
/// derived from the current position and size, never stored separately.
#[derive(Debug, Clone)]
pub struct Label {
    pub element_id: String,
    pub anchor_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub mode: PlacementMode,
    pub direction: String,
    pub resolved: bool,
    /// Fingerprint of the inputs the position was computed from. Zero for
    /// manual entries and for auto entries that must be recomputed.
    pub context: u64,
}

impl Label {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_center(self.x, self.y, self.width, self.height)
    }

    pub fn is_manual(&self) -> bool {
        self.mode == PlacementMode::Manual
    }
}

/// Residual-quality summary over the committed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub total: usize,
    pub manual: usize,
    pub unresolved: usize,
    /// Pairs of committed boxes that overlap each other.
    pub overlapping_pairs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementStore {
    labels: BTreeMap<String, Label>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, element_id: &str) -> Option<&Label> {
        self.labels.get(element_id)
    }

    /// Overwrite whatever was committed for this element.
    pub fn set(&mut self, label: Label) {
        self.labels.insert(label.element_id.clone(), label);
    }

    /// Flip an entry back to auto and clear its fingerprint so the next
    /// layout pass recomputes it. Returns false for unknown ids.
    pub fn reset_to_auto(&mut self, element_id: &str) -> bool {
        match self.labels.get_mut(element_id) {
            Some(label) => {
                label.mode = PlacementMode::Auto;
                label.context = 0;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, element_id: &str) -> Option<Label> {
        self.labels.remove(element_id)
    }

    /// Drop every label whose element id fails the predicate. Used when
    /// anchors disappear from the scene.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.labels.retain(|id, _| keep(id));
    }

    /// Labels in ascending element-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let labels: Vec<&Label> = self.labels.values().collect();
        let mut stats = StoreStats {
            total: labels.len(),
            ..StoreStats::default()
        };
        for (i, label) in labels.iter().enumerate() {
            if label.is_manual() {
                stats.manual += 1;
            }
            if !label.resolved {
                stats.unresolved += 1;
            }
            for other in &labels[i + 1..] {
                if label.bbox().overlaps(&other.bbox(), 0.0) {
                    stats.overlapping_pairs += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: &str, x: f64, y: f64, mode: PlacementMode) -> Label {
        Label {
            element_id: id.to_string(),
            anchor_id: id.to_string(),
            x,
            y,
            width: 2.0,
            height: 0.8,
            mode,
            direction: "upper-right".to_string(),
            resolved: true,
            context: 7,
        }
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let mut store = PlacementStore::new();
        store.set(label("a", 1.0, 1.0, PlacementMode::Manual));
        store.set(label("a", 2.0, 2.0, PlacementMode::Auto));
        let committed = store.get("a").expect("label should exist");
        assert_eq!(committed.x, 2.0);
        assert_eq!(committed.mode, PlacementMode::Auto);
    }

    #[test]
    fn reset_to_auto_clears_fingerprint() {
        let mut store = PlacementStore::new();
        store.set(label("a", 5.0, 5.0, PlacementMode::Manual));
        assert!(store.reset_to_auto("a"));
        let committed = store.get("a").expect("label should exist");
        assert_eq!(committed.mode, PlacementMode::Auto);
        assert_eq!(committed.context, 0);
        assert!(!store.reset_to_auto("missing"));
    }

    #[test]
    fn retain_prunes_removed_anchors() {
        let mut store = PlacementStore::new();
        store.set(label("a", 0.0, 0.0, PlacementMode::Auto));
        store.set(label("b", 3.0, 3.0, PlacementMode::Auto));
        store.retain(|id| id == "a");
        assert_eq!(store.len(), 1);
        assert!(store.get("b").is_none());
    }

    #[test]
    fn iteration_is_id_ordered() {
        let mut store = PlacementStore::new();
        store.set(label("b", 0.0, 0.0, PlacementMode::Auto));
        store.set(label("a", 3.0, 3.0, PlacementMode::Auto));
        let ids: Vec<&str> = store.iter().map(|l| l.element_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn stats_count_overlaps_and_modes() {
        let mut store = PlacementStore::new();
        store.set(label("a", 0.0, 0.0, PlacementMode::Auto));
        store.set(label("b", 0.5, 0.0, PlacementMode::Manual));
        store.set(label("c", 8.0, 8.0, PlacementMode::Auto));
        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.manual, 1);
        assert_eq!(stats.overlapping_pairs, 1);
    }
}
