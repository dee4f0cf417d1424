// Flow simulator - breadth-first walk producing a cacheable timed trace
//
// This is a different algorithm from the traversal searches: a queue-based
// walk with one shared visited set for the whole simulation, so
// re-convergent paths collapse into a single trace instead of being
// enumerated. Any dead end mid-walk is benign termination here; the
// stricter Terminal/Filter gate applies only to the depth-first searches.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::cache::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, FlowCache};
use super::{BidirectionalFlowResult, FlowAction, FlowResult, FlowStep, TrafficSpec};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::topology::address::is_private_address;
use crate::topology::{AccountProvider, Direction, Node, RoutingTarget};
use crate::traversal::TraversalContext;

const NO_ROUTE: &str = "no route to destination";

pub struct FlowSimulator {
    cache: FlowCache,
    sweep_interval: Duration,
}

impl FlowSimulator {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        FlowSimulator {
            cache: FlowCache::new(ttl),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        FlowSimulator {
            cache: FlowCache::new(config.cache_ttl),
            sweep_interval: config.cache_sweep_interval,
        }
    }

    /// Start the periodic cache eviction task. Requires a running runtime.
    pub fn start_sweep_task(&self) {
        self.cache.start_sweep_task(self.sweep_interval);
        tracing::info!(
            "Flow cache sweep started (interval: {}s)",
            self.sweep_interval.as_secs()
        );
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        tracing::debug!("Flow cache cleared");
    }

    /// Simulate the traffic hop by hop from `source` toward `destination`,
    /// returning the step trace. Identical calls within the cache TTL
    /// return the same shared result.
    pub async fn simulate_flow(
        &self,
        source: Arc<dyn Node>,
        destination: Arc<dyn Node>,
        spec: &TrafficSpec,
        accounts: Option<Arc<dyn AccountProvider>>,
        cancel: CancellationToken,
    ) -> Result<Arc<FlowResult>, EngineError> {
        let key = cache_key(source.as_ref(), destination.as_ref(), spec);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Flow cache hit for {}", key);
            return Ok(cached);
        }

        tracing::info!(
            "Simulating flow {} -> {} ({}:{}/{})",
            source.id(),
            destination.id(),
            spec.destination_ip,
            spec.port,
            spec.protocol
        );

        let ctx = TraversalContext::new(accounts, None, cancel);
        let target = RoutingTarget {
            ip: spec.destination_ip.clone(),
            port: spec.port,
            protocol: spec.protocol.clone(),
            direction: Direction::Outbound,
            source_is_private: is_private_address(&spec.source_ip),
        };

        let mut result = FlowResult::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Arc<dyn Node>> = VecDeque::new();
        let mut step_number = 0u32;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            if ctx.cancel_token().is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if visited.contains(node.id()) {
                continue;
            }
            visited.insert(node.id().to_string());

            let hop_started = Instant::now();
            step_number += 1;
            let mut step = FlowStep {
                step_number,
                component_id: node.id().to_string(),
                component_type: node.kind().to_string(),
                action: FlowAction::Traverse,
                details: String::new(),
                latency_ms: 0.0,
                rule_checks: Vec::new(),
            };

            if let Some(evaluator) = node.rule_evaluator() {
                let verdict = evaluator.evaluate(&target, Direction::Outbound).await;
                step.rule_checks = verdict.evaluations;

                if !verdict.allowed {
                    step.action = FlowAction::Blocked;
                    step.details = verdict.reason.clone();
                    step.latency_ms = elapsed_ms(hop_started);
                    result.push_step(step);
                    result.block(Some(node.id()), verdict.reason);
                    return Ok(self.finish(key, result).await);
                }
            }

            let hops = match node.next_hops(&target, &ctx).await {
                Ok(hops) => hops,
                Err(EngineError::Blocked { node_id, reason }) => {
                    step.action = FlowAction::Blocked;
                    step.details = reason.clone();
                    step.latency_ms = elapsed_ms(hop_started);
                    result.push_step(step);
                    result.block(Some(node_id.as_str()), reason);
                    return Ok(self.finish(key, result).await);
                }
                Err(e) => return Err(e),
            };

            step.action = FlowAction::Forward;
            step.details = if hops.is_empty() {
                "terminal component".to_string()
            } else {
                format!("forwarding to {} next hop(s)", hops.len())
            };
            step.latency_ms = elapsed_ms(hop_started);
            result.push_step(step);

            if hops.is_empty() {
                result.success = true;
                return Ok(self.finish(key, result).await);
            }

            for hop in hops {
                if hop.id() == destination.id() {
                    step_number += 1;
                    result.push_step(FlowStep {
                        step_number,
                        component_id: destination.id().to_string(),
                        component_type: destination.kind().to_string(),
                        action: FlowAction::DestinationReached,
                        details: "destination reached".to_string(),
                        latency_ms: 0.0,
                        rule_checks: Vec::new(),
                    });
                    result.success = true;
                    return Ok(self.finish(key, result).await);
                }
                queue.push_back(hop);
            }
        }

        result.block(None, NO_ROUTE);
        Ok(self.finish(key, result).await)
    }

    /// Simulate both legs; the reverse leg swaps the traffic spec's source
    /// and destination addresses. A hard failure in either leg aborts the
    /// whole call rather than returning a partial result.
    pub async fn simulate_bidirectional(
        &self,
        source: Arc<dyn Node>,
        destination: Arc<dyn Node>,
        spec: &TrafficSpec,
        accounts: Option<Arc<dyn AccountProvider>>,
        cancel: CancellationToken,
    ) -> Result<BidirectionalFlowResult, EngineError> {
        let forward = self
            .simulate_flow(
                source.clone(),
                destination.clone(),
                spec,
                accounts.clone(),
                cancel.clone(),
            )
            .await
            .map_err(|e| EngineError::wrap("forward flow simulation failed", e))?;

        let reverse = self
            .simulate_flow(destination, source, &spec.reversed(), accounts, cancel)
            .await
            .map_err(|e| EngineError::wrap("reverse flow simulation failed", e))?;

        let overall_success = forward.success && reverse.success;
        Ok(BidirectionalFlowResult {
            forward: (*forward).clone(),
            reverse: (*reverse).clone(),
            overall_success,
        })
    }

    async fn finish(&self, key: String, result: FlowResult) -> Arc<FlowResult> {
        let shared = Arc::new(result);
        self.cache.insert(key, shared.clone()).await;
        shared
    }
}

impl Default for FlowSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(source: &dyn Node, destination: &dyn Node, spec: &TrafficSpec) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        source.id(),
        destination.id(),
        spec.destination_ip,
        spec.port,
        spec.protocol
    )
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
