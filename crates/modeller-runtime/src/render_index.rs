//! The render index: dense integer ids over non-owning renderable handles.
//!
//! Every entry points at a record in the physical arena by its stable
//! index, so removing a record never leaves a dangling reference. The ids
//! themselves stay dense and range-partitioned (see
//! [`RenderLayout`](modeller_core::selection::RenderLayout)), which means
//! every insertion and removal renumbers the ids above the touch point.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};

/// What a render id points at in the physical arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    Sphere(NodeIndex),
    Line(EdgeIndex),
    Label(NodeIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEntry {
    pub id: usize,
    pub target: RenderTarget,
}

/// Flat `(id, target)` sequence. Entry order is insertion order, not id order.
#[derive(Debug, Clone, Default)]
pub struct RenderIndex {
    entries: Vec<RenderEntry>,
}

impl RenderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RenderEntry] {
        &self.entries
    }

    /// Append without renumbering. Used while building from scratch.
    pub fn push(&mut self, id: usize, target: RenderTarget) {
        self.entries.push(RenderEntry { id, target });
    }

    /// Shift every id `>= id` up by one, then add `target` at `id`.
    pub fn insert(&mut self, id: usize, target: RenderTarget) {
        for entry in &mut self.entries {
            if entry.id >= id {
                entry.id += 1;
            }
        }
        self.entries.push(RenderEntry { id, target });
    }

    /// Drop the entries holding `ids` and close the gaps: every surviving id
    /// moves down by the number of removed ids below it.
    ///
    /// Returns the number of entries removed.
    pub fn remove_ids(&mut self, ids: &[usize]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.id));
        for entry in &mut self.entries {
            let below = ids.iter().filter(|removed| **removed < entry.id).count();
            entry.id -= below;
        }
        before - self.entries.len()
    }

    pub fn get(&self, id: usize) -> Option<RenderTarget> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.target)
    }

    /// Targets ordered by id, provided the ids are exactly `0..len` with no
    /// duplicates. `None` otherwise.
    pub fn dense_targets(&self, len: usize) -> Option<Vec<RenderTarget>> {
        if self.entries.len() != len {
            return None;
        }
        let mut slots = vec![None; len];
        for entry in &self.entries {
            let slot = slots.get_mut(entry.id)?;
            if slot.is_some() {
                return None;
            }
            *slot = Some(entry.target);
        }
        slots.into_iter().collect()
    }

    /// Ids in ascending order.
    pub fn sorted_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.entries.iter().map(|entry| entry.id).collect();
        ids.sort_unstable();
        ids
    }
}
