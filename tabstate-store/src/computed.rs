//! Derived values and dependency-cycle detection.
//!
//! A computed value at path `T` with dependencies `D1..Dn` is recomputed
//! whenever a listener on any `Di` fires. Writing `T` notifies listeners on
//! `T` and on every ancestor of `T`, so a dependency `D` is triggered by a
//! write to `W` when `D == W` or `D` is an ancestor of `W`. Registration is
//! rejected when following those edges from the new value leads back to it.

use crate::subscription::Subscription;
use std::fmt;
use std::sync::Weak;
use tabstate_types::StatePath;

use crate::store::StoreInner;

#[derive(Debug, Clone)]
struct ComputedNode {
    id: u64,
    target: StatePath,
    dependencies: Vec<StatePath>,
}

/// Registered computed values.
#[derive(Debug, Default)]
pub(crate) struct ComputedGraph {
    next_id: u64,
    nodes: Vec<ComputedNode>,
}

fn triggers(dependency: &StatePath, written: &StatePath) -> bool {
    dependency == written || dependency.is_ancestor_of(written)
}

fn self_referential(target: &StatePath, dependency: &StatePath) -> bool {
    target == dependency || target.is_ancestor_of(dependency) || dependency.is_ancestor_of(target)
}

impl ComputedGraph {
    /// Adds a node unless it would close a cycle. Returns the node id, or
    /// `None` on a cycle.
    pub(crate) fn try_insert(
        &mut self,
        target: StatePath,
        dependencies: Vec<StatePath>,
    ) -> Option<u64> {
        if dependencies.iter().any(|d| self_referential(&target, d)) {
            return None;
        }

        // Existing nodes form a DAG, so any new cycle runs through the new
        // node: walk from its target and see whether we can write it again.
        let mut stack = vec![target.clone()];
        let mut visited: Vec<u64> = Vec::new();
        while let Some(written) = stack.pop() {
            if dependencies.iter().any(|d| triggers(d, &written)) {
                return None;
            }
            for node in &self.nodes {
                if visited.contains(&node.id) {
                    continue;
                }
                if node.dependencies.iter().any(|d| triggers(d, &written)) {
                    visited.push(node.id);
                    stack.push(node.target.clone());
                }
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        self.nodes.push(ComputedNode {
            id,
            target,
            dependencies,
        });
        Some(id)
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.nodes.retain(|node| node.id != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Handle returned by [`Store::computed`](crate::Store::computed).
///
/// The value keeps updating until [`dispose`](Self::dispose) is called.
/// Dropping the handle does not stop it.
pub struct ComputedBinding {
    pub(crate) id: u64,
    pub(crate) path: String,
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) store: Weak<StoreInner>,
}

impl ComputedBinding {
    /// Path the derived value is written to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stops recomputing. The last computed value stays in the tree.
    /// Calling this more than once is harmless.
    pub fn dispose(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
        if let Some(store) = self.store.upgrade() {
            store.computed_graph().remove(self.id);
        }
    }
}

impl fmt::Debug for ComputedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedBinding")
            .field("path", &self.path)
            .field("dependencies", &self.subscriptions.len())
            .finish()
    }
}
