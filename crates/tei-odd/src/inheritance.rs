//! Class-membership graph used to reject circular memberships

use std::collections::{HashMap, HashSet};

/// Tracks membership edges (member -> class) to detect cycles
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    edges: HashMap<String, Vec<String>>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, member: impl Into<String>, class: impl Into<String>) {
        self.edges.entry(member.into()).or_default().push(class.into());
    }

    /// Detect if adding `member -> class` would create a cycle
    pub fn would_create_cycle(&self, member: &str, class: &str) -> bool {
        if member == class {
            return true;
        }

        // Does class already reach member, directly or transitively?
        let mut to_visit = vec![class];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == member {
                return true;
            }
            if visited.insert(current) {
                if let Some(parents) = self.edges.get(current) {
                    to_visit.extend(parents.iter().map(String::as_str));
                }
            }
        }

        false
    }
}
