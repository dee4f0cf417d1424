// Single-path traversal - depth-first search for the first viable path

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{PathResult, ReachabilityResult, TraversalContext, is_destination_reached};
use crate::topology::address::is_private_address;
use crate::topology::{AccountProvider, DestinationResolver, Direction, Node, RoutingTarget};

const NO_ROUTE: &str = "no route to destination";

/// Depth-first search from `current` toward the destination, returning the
/// first viable path as Success or the best available blocking explanation.
///
/// Cycles are cut by the context's shared visited set. When several sibling
/// hops are all blocked, the last one evaluated is surfaced; hop order is
/// whatever the node implementation returned.
pub fn traverse_path<'a>(
    current: Arc<dyn Node>,
    destination_target: &'a RoutingTarget,
    destination_id: &'a str,
    ctx: &'a TraversalContext,
) -> Pin<Box<dyn Future<Output = PathResult> + Send + 'a>> {
    Box::pin(async move {
        ctx.mark_visited(current.id()).await;

        let hops = match current.next_hops(destination_target, ctx).await {
            Ok(hops) => hops,
            Err(e) => {
                tracing::debug!("Next-hop query failed at {}: {}", current.id(), e);
                return PathResult::blocked(current.id(), e.to_string());
            }
        };

        let mut candidates = Vec::with_capacity(hops.len());
        for hop in hops {
            if !ctx.is_visited(hop.id()).await {
                candidates.push(hop);
            }
        }

        if is_destination_reached(&candidates, destination_target, destination_id) {
            return PathResult::Success;
        }

        if candidates.is_empty() {
            if current.is_terminal() && !is_private_address(&destination_target.ip) {
                // Edge of the known topology with a public destination:
                // traffic egresses to the internet from here.
                return PathResult::Success;
            }
            if current.is_filter() {
                // Admission control passed and there is nothing further to
                // forward to.
                return PathResult::Success;
            }
            return PathResult::blocked(current.id(), NO_ROUTE);
        }

        let mut last_blocked = None;
        for hop in candidates {
            match traverse_path(hop, destination_target, destination_id, ctx).await {
                PathResult::Success => return PathResult::Success,
                blocked => last_blocked = Some(blocked),
            }
        }

        last_blocked.unwrap_or_else(|| PathResult::blocked(current.id(), "all paths blocked"))
    })
}

/// Bidirectional reachability check between two resolved nodes, combining
/// both legs with AND semantics.
pub async fn test_reachability(
    source: Arc<dyn Node>,
    destination: Arc<dyn Node>,
    accounts: Option<Arc<dyn AccountProvider>>,
    cancel: CancellationToken,
) -> ReachabilityResult {
    test_reachability_with_resolver(source, destination, accounts, None, cancel).await
}

/// As [`test_reachability`], with an explicit destination resolver. When no
/// resolver is supplied the account handle's default resolver is used if it
/// offers one; a missing resolver degrades to node-local resolution.
pub async fn test_reachability_with_resolver(
    source: Arc<dyn Node>,
    destination: Arc<dyn Node>,
    accounts: Option<Arc<dyn AccountProvider>>,
    resolver: Option<Arc<dyn DestinationResolver>>,
    cancel: CancellationToken,
) -> ReachabilityResult {
    let resolver = resolver.or_else(|| accounts.as_ref().and_then(|a| a.default_resolver()));
    if resolver.is_none() {
        tracing::debug!("No destination resolver available; relying on node-local resolution");
    }

    tracing::info!(
        "Testing reachability between {} and {}",
        source.id(),
        destination.id()
    );

    let forward_target = directed_target(destination.as_ref(), Direction::Outbound, source.as_ref());
    let forward_ctx = TraversalContext::new(accounts.clone(), resolver.clone(), cancel.clone());
    let forward =
        traverse_path(source.clone(), &forward_target, destination.id(), &forward_ctx).await;

    let return_target = directed_target(source.as_ref(), Direction::Inbound, destination.as_ref());
    let return_ctx = TraversalContext::new(accounts, resolver, cancel);
    let return_leg =
        traverse_path(destination.clone(), &return_target, source.id(), &return_ctx).await;

    let result = ReachabilityResult::new(forward, return_leg);
    tracing::info!(
        "Reachability {} <-> {}: {}",
        source.id(),
        destination.id(),
        result.summary()
    );
    result
}

/// Build the search target for one endpoint: its own routing identity plus
/// the traversal-computed annotations. `source_is_private` classifies the
/// far end of the search, not the endpoint itself.
fn directed_target(endpoint: &dyn Node, direction: Direction, far_end: &dyn Node) -> RoutingTarget {
    let mut target = endpoint.routing_target();
    target.direction = direction;
    target.source_is_private = is_private_address(&far_end.routing_target().ip);
    target
}
