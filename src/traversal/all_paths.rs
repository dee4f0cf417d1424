// Multi-path traversal - exhaustive enumeration of simple paths

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{TraversalContext, matching_destination};
use crate::topology::address::is_private_address;
use crate::topology::{AccountProvider, Direction, Node, RoutingTarget};

const NO_ROUTE: &str = "no route to destination";

/// One fully-explored candidate path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTrace {
    pub success: bool,
    pub hops: Vec<String>,
    pub blocked_node_id: Option<String>,
    pub blocked_reason: Option<String>,
}

impl PathTrace {
    fn success(hops: Vec<String>) -> Self {
        PathTrace {
            success: true,
            hops,
            blocked_node_id: None,
            blocked_reason: None,
        }
    }

    fn blocked(hops: Vec<String>, node_id: &str, reason: impl Into<String>) -> Self {
        PathTrace {
            success: false,
            hops,
            blocked_node_id: Some(node_id.to_string()),
            blocked_reason: Some(reason.into()),
        }
    }
}

/// Aggregate of a bidirectional all-paths query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllPathsResult {
    pub forward_paths: Vec<PathTrace>,
    pub return_paths: Vec<PathTrace>,
    pub successful_forward_paths: usize,
    pub successful_return_paths: usize,
    pub has_reachable_path: bool,
}

impl AllPathsResult {
    /// Fold the two trace lists; a reachable path requires at least one
    /// success in each direction.
    pub fn new(forward_paths: Vec<PathTrace>, return_paths: Vec<PathTrace>) -> Self {
        let successful_forward_paths = forward_paths.iter().filter(|t| t.success).count();
        let successful_return_paths = return_paths.iter().filter(|t| t.success).count();
        let has_reachable_path = successful_forward_paths > 0 && successful_return_paths > 0;

        AllPathsResult {
            forward_paths,
            return_paths,
            successful_forward_paths,
            successful_return_paths,
            has_reachable_path,
        }
    }
}

/// Paths from a trace list that reached the destination.
pub fn successful_paths(traces: &[PathTrace]) -> Vec<&PathTrace> {
    traces.iter().filter(|t| t.success).collect()
}

/// Paths from a trace list that were blocked.
pub fn blocked_paths(traces: &[PathTrace]) -> Vec<&PathTrace> {
    traces.iter().filter(|t| !t.success).collect()
}

/// Exhaustive depth-first search enumerating every simple path from
/// `current` toward the destination: one trace per distinct path found
/// under this branch.
///
/// Cycle detection is per path, not global: each branch carries its own
/// lineage copy, so sibling branches may legitimately pass through a shared
/// downstream node while no single path revisits its own ancestors.
pub fn traverse_all_paths<'a>(
    current: Arc<dyn Node>,
    destination_target: &'a RoutingTarget,
    destination_id: &'a str,
    ctx: &'a TraversalContext,
    lineage: Vec<String>,
) -> Pin<Box<dyn Future<Output = Vec<PathTrace>> + Send + 'a>> {
    Box::pin(async move {
        let mut lineage = lineage;
        lineage.push(current.id().to_string());

        let hops = match current.next_hops(destination_target, ctx).await {
            Ok(hops) => hops,
            Err(e) => {
                tracing::debug!("Next-hop query failed at {}: {}", current.id(), e);
                return vec![PathTrace::blocked(lineage, current.id(), e.to_string())];
            }
        };

        let candidates: Vec<_> = hops
            .into_iter()
            .filter(|hop| !lineage.iter().any(|id| id == hop.id()))
            .collect();

        if let Some(reached) = matching_destination(&candidates, destination_target, destination_id)
        {
            let mut hops = lineage;
            hops.push(reached.id().to_string());
            return vec![PathTrace::success(hops)];
        }

        if candidates.is_empty() {
            if current.is_terminal() && !is_private_address(&destination_target.ip) {
                return vec![PathTrace::success(lineage)];
            }
            if current.is_filter() {
                return vec![PathTrace::success(lineage)];
            }
            return vec![PathTrace::blocked(lineage, current.id(), NO_ROUTE)];
        }

        let mut traces = Vec::new();
        for hop in candidates {
            traces.extend(
                traverse_all_paths(
                    hop,
                    destination_target,
                    destination_id,
                    ctx,
                    lineage.clone(),
                )
                .await,
            );
        }
        traces
    })
}

/// Bidirectional all-paths query: enumerate every simple path in each
/// direction and fold the trace lists into an aggregate.
pub async fn test_reachability_all_paths(
    source: Arc<dyn Node>,
    destination: Arc<dyn Node>,
    accounts: Option<Arc<dyn AccountProvider>>,
    cancel: CancellationToken,
) -> AllPathsResult {
    let resolver = accounts.as_ref().and_then(|a| a.default_resolver());

    tracing::info!(
        "Enumerating all paths between {} and {}",
        source.id(),
        destination.id()
    );

    let mut forward_target = destination.routing_target();
    forward_target.direction = Direction::Outbound;
    forward_target.source_is_private = is_private_address(&source.routing_target().ip);
    let forward_ctx = TraversalContext::new(accounts.clone(), resolver.clone(), cancel.clone());
    let forward_paths = traverse_all_paths(
        source.clone(),
        &forward_target,
        destination.id(),
        &forward_ctx,
        Vec::new(),
    )
    .await;

    let mut return_target = source.routing_target();
    return_target.direction = Direction::Inbound;
    return_target.source_is_private = is_private_address(&destination.routing_target().ip);
    let return_ctx = TraversalContext::new(accounts, resolver, cancel);
    let return_paths = traverse_all_paths(
        destination.clone(),
        &return_target,
        source.id(),
        &return_ctx,
        Vec::new(),
    )
    .await;

    let result = AllPathsResult::new(forward_paths, return_paths);
    tracing::info!(
        "All-paths {} <-> {}: {} forward / {} return successful",
        source.id(),
        destination.id(),
        result.successful_forward_paths,
        result.successful_return_paths
    );
    result
}
