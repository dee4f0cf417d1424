// Topology module - the node capability contracts the engine traverses

pub mod address;

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::traversal::TraversalContext;

/// Which way a search is looking at the traffic: outbound when walking from
/// the source toward the destination, inbound for the reverse check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Outbound
    }
}

/// The address/port/protocol identity a search is aiming at.
///
/// `direction` and `source_is_private` are annotations computed by the
/// traversal, not intrinsic properties of any node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTarget {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub source_is_private: bool,
}

impl RoutingTarget {
    /// Component-wise match against a destination target. An empty field on
    /// the destination is a wildcard for that component; a destination with
    /// no ip, port, and protocol at all never matches.
    pub fn matches(&self, destination: &RoutingTarget) -> bool {
        if destination.ip.is_empty() && destination.port == 0 && destination.protocol.is_empty() {
            return false;
        }

        (destination.ip.is_empty() || destination.ip == self.ip)
            && (destination.port == 0 || destination.port == self.port)
            && (destination.protocol.is_empty() || destination.protocol == self.protocol)
    }
}

/// One rule consulted during a policy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub description: String,
    pub matched: bool,
    pub allowed: bool,
}

/// Outcome of scoring a target against a node's local policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub allowed: bool,
    pub reason: String,
    pub evaluations: Vec<RuleEvaluation>,
}

/// Policy evaluation capability for nodes that filter traffic.
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    async fn evaluate(&self, target: &RoutingTarget, direction: Direction) -> RuleVerdict;
}

/// Credentialed client for one account scope. The engine threads these
/// through to node implementations and never inspects them.
pub type ScopedClient = Arc<dyn Any + Send + Sync>;

/// Account/lookup handle for reaching isolated account scopes.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn resolve(&self, scope: &str) -> Result<ScopedClient, EngineError>;

    /// Resolver the engine falls back to when the caller supplies none.
    fn default_resolver(&self) -> Option<Arc<dyn DestinationResolver>> {
        None
    }
}

/// Resolves a bare IP within an account scope to a topology node.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    async fn resolve(&self, ip: &str, scope: &str)
    -> Result<Option<Arc<dyn Node>>, EngineError>;
}

/// One vertex in the network topology graph: a filtering device, a router,
/// a compute instance, a gateway.
///
/// The optional capabilities default to "not supported"; implementations
/// opt in by overriding the probe methods.
#[async_trait]
pub trait Node: Send + Sync {
    /// Next-hop nodes reachable from here toward `target`. Returning
    /// [`EngineError::Blocked`] means local policy denies the traffic; any
    /// other error means the lookup itself failed.
    async fn next_hops(
        &self,
        target: &RoutingTarget,
        ctx: &TraversalContext,
    ) -> Result<Vec<Arc<dyn Node>>, EngineError>;

    /// Stable identifier, unique within one traversal's scope.
    fn id(&self) -> &str;

    /// Identifier of the account scope that owns this node.
    fn owner_scope(&self) -> &str;

    /// Human-readable type tag ("security-group", "route-table", ...).
    fn kind(&self) -> &str;

    /// This node's own address/port/protocol identity.
    fn routing_target(&self) -> RoutingTarget;

    /// Local policy evaluation capability, if this node has one.
    fn rule_evaluator(&self) -> Option<&dyn RuleEvaluator> {
        None
    }

    /// Edge of the known topology: a dead end here is a valid success state
    /// when the destination lies outside the private address space.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Admission-control node: having no next hop after its check is a
    /// success state, not "no route".
    fn is_filter(&self) -> bool {
        false
    }
}
