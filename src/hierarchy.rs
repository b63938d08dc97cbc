//! Region registry and drill-down navigation
//!
//! [`RegionTree`] holds every ingested [`Region`] in insertion order together
//! with the set of open (visible) region ids, the current selection and the
//! hovered region. The open set always mirrors the `visible` flags.

use indexmap::{IndexMap, IndexSet};

use crate::error::{Result, SynthesisError};
use crate::region::{Region, RegionId};

/// Insertion-ordered registry of regions with visibility and selection state
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    regions: IndexMap<RegionId, Region>,
    open: IndexSet<RegionId>,
    selected: Option<RegionId>,
    hovered: Option<RegionId>,
}

impl RegionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Register a region, replacing any region with the same id
    ///
    /// The region is opened or closed according to its `visible` flag.
    /// Returns the replaced region, if any.
    pub fn insert(&mut self, mut region: Region) -> Option<Region> {
        region.selected = self.selected.as_ref() == Some(&region.id);
        if region.visible {
            self.open.insert(region.id.clone());
        } else {
            self.open.shift_remove(&region.id);
        }
        self.regions.insert(region.id.clone(), region)
    }

    /// Register a region and make it visible
    pub fn insert_visible(&mut self, mut region: Region) -> Option<Region> {
        region.visible = true;
        self.insert(region)
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    /// All regions in insertion order
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// First id in `ids` that names a registered region
    pub fn first_available<'a, I>(&self, ids: I) -> Option<&Region>
    where
        I: IntoIterator<Item = &'a RegionId>,
    {
        ids.into_iter().find_map(|id| self.regions.get(id))
    }

    /// Ids of the visible regions, in the order they were opened
    pub fn open_ids(&self) -> impl Iterator<Item = &RegionId> {
        self.open.iter()
    }

    pub fn is_open(&self, id: &RegionId) -> bool {
        self.open.contains(id)
    }

    /// The selected region, if any
    pub fn selected(&self) -> Option<&Region> {
        self.selected.as_ref().and_then(|id| self.regions.get(id))
    }

    /// The hovered region, if any
    pub fn hovered(&self) -> Option<&Region> {
        self.hovered.as_ref().and_then(|id| self.regions.get(id))
    }

    /// Make `id` the only selected region
    pub fn select(&mut self, id: &RegionId) -> Result<()> {
        if !self.regions.contains_key(id) {
            return Err(SynthesisError::RegionNotFound(id.clone()));
        }
        if let Some(previous) = self.selected.take() {
            if let Some(region) = self.regions.get_mut(&previous) {
                region.selected = false;
            }
        }
        if let Some(region) = self.regions.get_mut(id) {
            region.selected = true;
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    /// Set or clear the hovered region; selection is unaffected
    pub fn hover(&mut self, id: Option<&RegionId>) -> Result<()> {
        match id {
            Some(id) if !self.regions.contains_key(id) => {
                Err(SynthesisError::RegionNotFound(id.clone()))
            }
            _ => {
                self.hovered = id.cloned();
                Ok(())
            }
        }
    }

    /// Flip a region's visibility and return the new value
    pub fn toggle_visibility(&mut self, id: &RegionId) -> Result<bool> {
        let region = self
            .regions
            .get_mut(id)
            .ok_or_else(|| SynthesisError::RegionNotFound(id.clone()))?;
        region.visible = !region.visible;
        if region.visible {
            self.open.insert(id.clone());
        } else {
            self.open.shift_remove(id);
        }
        Ok(region.visible)
    }

    /// Select a region and swap it for its children
    ///
    /// The region and every registered child have their visibility toggled.
    /// Leaf regions are only selected.
    pub fn drill_down(&mut self, id: &RegionId) -> Result<()> {
        if self.selected.as_ref() != Some(id) {
            self.select(id)?;
        }

        let children = match self.regions.get(id) {
            Some(region) if region.has_children() => region.child_ids.clone(),
            _ => return Ok(()),
        };

        self.toggle_visibility(id)?;
        for child in &children {
            if self.regions.contains_key(child) {
                self.toggle_visibility(child)?;
            } else {
                log::debug!("drill_down {}: child {} not loaded", id, child);
            }
        }
        Ok(())
    }

    /// Navigate from one region to another
    ///
    /// Afterwards exactly the registered members of the target's open family
    /// are visible and the target is selected. Navigating to the region you
    /// are on does nothing.
    ///
    /// # Errors
    ///
    /// `RegionNotFound` when the target is unknown or has an empty open
    /// family.
    pub fn drill_to(&mut self, from: &RegionId, to: &RegionId) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let family: IndexSet<RegionId> = match self.regions.get(to) {
            Some(target) if !target.open_family.is_empty() => {
                target.open_family.iter().cloned().collect()
            }
            _ => return Err(SynthesisError::RegionNotFound(to.clone())),
        };

        let to_open: Vec<RegionId> = family
            .iter()
            .filter(|id| !self.open.contains(*id) && self.regions.contains_key(*id))
            .cloned()
            .collect();
        let to_close: Vec<RegionId> = self
            .open
            .iter()
            .filter(|id| !family.contains(*id))
            .cloned()
            .collect();

        for id in to_open.iter().chain(&to_close) {
            self.toggle_visibility(id)?;
        }

        if self.selected.as_ref() != Some(to) {
            self.select(to)?;
        }
        log::debug!(
            "drill {} -> {}: opened {}, closed {}",
            from,
            to,
            to_open.len(),
            to_close.len()
        );
        Ok(())
    }

    /// Parent chain of a region, nearest first
    ///
    /// Follows `parent_id` links through registered regions. The chain ends
    /// at the first parent that is not registered, which is still included.
    pub fn ancestors(&self, id: &RegionId) -> Vec<RegionId> {
        let mut chain: IndexSet<RegionId> = IndexSet::new();
        let mut current = id;
        while let Some(parent) = self.regions.get(current).and_then(|r| r.parent_id.as_ref()) {
            if parent == id || !chain.insert(parent.clone()) {
                break;
            }
            current = parent;
        }
        chain.into_iter().collect()
    }

    /// Every registered descendant of a region, breadth first
    pub fn descendants(&self, id: &RegionId) -> Vec<RegionId> {
        self.collect_descendants(id, |_| true)
    }

    /// Descendants reachable through visible regions only
    ///
    /// A region contributes its children only while it is itself visible.
    pub fn open_descendants(&self, id: &RegionId) -> Vec<RegionId> {
        self.collect_descendants(id, |region| region.visible)
    }

    fn collect_descendants<F>(&self, id: &RegionId, include: F) -> Vec<RegionId>
    where
        F: Fn(&Region) -> bool,
    {
        let mut found: IndexSet<RegionId> = IndexSet::new();
        let mut next = 0;
        let mut current = Some(id.clone());

        while let Some(cursor) = current {
            if let Some(region) = self.regions.get(&cursor).filter(|r| include(r)) {
                for child in &region.child_ids {
                    if child != id && self.regions.contains_key(child) {
                        found.insert(child.clone());
                    }
                }
            }
            current = found.get_index(next).cloned();
            next += 1;
        }
        found.into_iter().collect()
    }

    /// Nearest region that is an ancestor of (or equal to) both `a` and `b`
    ///
    /// Uses each region's supplied `parent_ids` when present and the
    /// `parent_id` chain otherwise.
    pub fn lowest_common_ancestor(&self, a: &RegionId, b: &RegionId) -> Option<RegionId> {
        if a == b {
            return Some(a.clone());
        }
        let chain_a = self.ancestor_chain(a);
        let chain_b = self.ancestor_chain(b);

        if chain_b.contains(a) {
            return Some(a.clone());
        }
        if chain_a.contains(b) {
            return Some(b.clone());
        }
        chain_a.into_iter().find(|id| chain_b.contains(id))
    }

    fn ancestor_chain(&self, id: &RegionId) -> Vec<RegionId> {
        match self.regions.get(id) {
            Some(region) if !region.parent_ids.is_empty() => region.parent_ids.clone(),
            _ => self.ancestors(id),
        }
    }
}
