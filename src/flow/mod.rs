// Flow module - timed step-by-step flow simulation and its result model

pub mod cache;
pub mod simulator;

use serde::{Deserialize, Serialize};

use crate::topology::RuleEvaluation;

/// The traffic being tested: source/destination address, port, protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSpec {
    pub source_ip: String,
    pub destination_ip: String,
    pub port: u16,
    pub protocol: String,
}

impl TrafficSpec {
    /// The same traffic viewed from the far end: source and destination
    /// addresses swap, port and protocol are unchanged.
    pub fn reversed(&self) -> TrafficSpec {
        TrafficSpec {
            source_ip: self.destination_ip.clone(),
            destination_ip: self.source_ip.clone(),
            port: self.port,
            protocol: self.protocol.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    Traverse,
    Forward,
    Blocked,
    DestinationReached,
}

/// One hop of a simulated flow, with the policy checks performed there and
/// the wall-clock time the hop took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    pub step_number: u32,
    pub component_id: String,
    pub component_type: String,
    pub action: FlowAction,
    pub details: String,
    pub latency_ms: f64,
    pub rule_checks: Vec<RuleEvaluation>,
}

/// Complete simulation trace. `total_latency_ms` is the sum of the per-step
/// latencies, not the wall-clock span of the call. Once a result enters the
/// cache it is shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
    pub steps: Vec<FlowStep>,
    pub success: bool,
    pub blocked_at: Option<String>,
    pub failure_reason: Option<String>,
    pub total_latency_ms: f64,
    pub computed_at: String,
}

impl FlowResult {
    pub(crate) fn new() -> Self {
        FlowResult {
            steps: Vec::new(),
            success: false,
            blocked_at: None,
            failure_reason: None,
            total_latency_ms: 0.0,
            computed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub(crate) fn push_step(&mut self, step: FlowStep) {
        self.total_latency_ms += step.latency_ms;
        self.steps.push(step);
    }

    pub(crate) fn block(&mut self, node_id: Option<&str>, reason: impl Into<String>) {
        self.success = false;
        self.blocked_at = node_id.map(|id| id.to_string());
        self.failure_reason = Some(reason.into());
    }
}

/// Both legs of a bidirectional simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidirectionalFlowResult {
    pub forward: FlowResult,
    pub reverse: FlowResult,
    pub overall_success: bool,
}
