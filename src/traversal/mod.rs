// Traversal module - per-traversal state and the reachability result model

pub mod all_paths;
pub mod single_path;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::topology::{AccountProvider, DestinationResolver, Node, RoutingTarget};

/// Mutable state owned by one top-level traversal: the visited-node set,
/// the cancellation signal, and the handles node implementations need to
/// reach their own account scopes.
///
/// One context is created per direction of a reachability check and
/// discarded when the call returns. Contexts are never shared between
/// concurrent queries.
pub struct TraversalContext {
    visited: RwLock<HashSet<String>>,
    cancel: CancellationToken,
    accounts: Option<Arc<dyn AccountProvider>>,
    resolver: Option<Arc<dyn DestinationResolver>>,
    traversal_id: Uuid,
}

impl TraversalContext {
    pub fn new(
        accounts: Option<Arc<dyn AccountProvider>>,
        resolver: Option<Arc<dyn DestinationResolver>>,
        cancel: CancellationToken,
    ) -> Self {
        let traversal_id = Uuid::new_v4();
        tracing::debug!("Starting traversal {}", traversal_id);

        TraversalContext {
            visited: RwLock::new(HashSet::new()),
            cancel,
            accounts,
            resolver,
            traversal_id,
        }
    }

    /// Mark a node as visited. Idempotent; membership is by node
    /// identifier, not object identity, which collapses re-derived node
    /// instances representing the same underlying network element.
    pub async fn mark_visited(&self, node_id: &str) {
        let mut visited = self.visited.write().await;
        visited.insert(node_id.to_string());
    }

    pub async fn is_visited(&self, node_id: &str) -> bool {
        let visited = self.visited.read().await;
        visited.contains(node_id)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn accounts(&self) -> Option<&Arc<dyn AccountProvider>> {
        self.accounts.as_ref()
    }

    pub fn resolver(&self) -> Option<&Arc<dyn DestinationResolver>> {
        self.resolver.as_ref()
    }

    pub fn traversal_id(&self) -> Uuid {
        self.traversal_id
    }
}

/// Outcome of one directed path search. A blocked result is always
/// attributable to exactly one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PathResult {
    Success,
    Blocked { node_id: String, reason: String },
}

impl PathResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PathResult::Success)
    }

    pub fn blocked(node_id: &str, reason: impl Into<String>) -> Self {
        PathResult::Blocked {
            node_id: node_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Combined result of a bidirectional reachability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachabilityResult {
    pub source_to_destination: PathResult,
    pub destination_to_source: PathResult,
    pub overall_success: bool,
}

impl ReachabilityResult {
    /// Combine the two legs; overall success requires both.
    pub fn new(source_to_destination: PathResult, destination_to_source: PathResult) -> Self {
        let overall_success =
            source_to_destination.is_success() && destination_to_source.is_success();

        ReachabilityResult {
            source_to_destination,
            destination_to_source,
            overall_success,
        }
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        if self.overall_success {
            "reachable in both directions".to_string()
        } else {
            let leg = |result: &PathResult, label: &str| match result {
                PathResult::Success => None,
                PathResult::Blocked { node_id, reason } => {
                    Some(format!("{} blocked at {}: {}", label, node_id, reason))
                }
            };

            [
                leg(&self.source_to_destination, "forward"),
                leg(&self.destination_to_source, "return"),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ")
        }
    }
}

/// Find the hop, if any, that counts as the destination: either its
/// identifier equals `destination_id` or its own routing target matches
/// the destination target component-wise.
pub fn matching_destination<'h>(
    hops: &'h [Arc<dyn Node>],
    destination_target: &RoutingTarget,
    destination_id: &str,
) -> Option<&'h Arc<dyn Node>> {
    hops.iter().find(|hop| {
        hop.id() == destination_id || hop.routing_target().matches(destination_target)
    })
}

pub fn is_destination_reached(
    hops: &[Arc<dyn Node>],
    destination_target: &RoutingTarget,
    destination_id: &str,
) -> bool {
    matching_destination(hops, destination_target, destination_id).is_some()
}
