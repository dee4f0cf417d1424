// Network reachability engine: walks a polymorphic graph of network nodes
// to decide whether traffic can travel between two endpoints, enumerate the
// candidate paths, or replay the flow as a timed step-by-step trace.

pub mod config;
pub mod error;
pub mod flow;
pub mod topology;
pub mod traversal;

#[cfg(test)]
mod testutil;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use flow::simulator::FlowSimulator;
pub use flow::{BidirectionalFlowResult, FlowAction, FlowResult, FlowStep, TrafficSpec};
pub use topology::address::is_private_address;
pub use topology::{
    AccountProvider, DestinationResolver, Direction, Node, RoutingTarget, RuleEvaluation,
    RuleEvaluator, RuleVerdict, ScopedClient,
};
pub use traversal::all_paths::{
    AllPathsResult, PathTrace, blocked_paths, successful_paths, test_reachability_all_paths,
    traverse_all_paths,
};
pub use traversal::single_path::{
    test_reachability, test_reachability_with_resolver, traverse_path,
};
pub use traversal::{PathResult, ReachabilityResult, TraversalContext, is_destination_reached};
