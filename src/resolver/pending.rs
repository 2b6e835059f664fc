//! Per-pass bookkeeping: which modules are accounted for and which
//! references are still waiting to be looked at.

use std::collections::HashSet;

use crate::core::{ReferenceDescriptor, ReferenceName};

/// Short names of modules already present or already attempted in this
/// pass. A name in this set is never fetched again.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    names: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
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
}

/// References collected from the present modules, in first-seen order.
///
/// A later reference to a name already collected is ignored, whatever its
/// version.
#[derive(Debug, Clone, Default)]
pub struct PendingReferences {
    order: Vec<ReferenceDescriptor>,
    names: HashSet<ReferenceName>,
}

impl PendingReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference. Returns `false` if the name was already collected.
    pub fn add(&mut self, descriptor: ReferenceDescriptor) -> bool {
        if !self.names.insert(descriptor.name.clone()) {
            return false;
        }
        self.order.push(descriptor);
        true
    }

    pub fn contains(&self, name: &ReferenceName) -> bool {
        self.names.contains(name)
    }

    /// Iterate in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ReferenceDescriptor> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
