// In-memory topology fixtures shared by the engine tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;

use crate::error::EngineError;
use crate::topology::{
    Direction, Node, RoutingTarget, RuleEvaluation, RuleEvaluator, RuleVerdict,
};
use crate::traversal::TraversalContext;

/// Mutable registry of test nodes. Edges are stored as node ids and
/// resolved lazily at next-hop time, so cyclic topologies build naturally.
#[derive(Default)]
pub struct TestGraph {
    nodes: Mutex<HashMap<String, Arc<TestNode>>>,
}

impl TestGraph {
    pub fn new() -> Arc<TestGraph> {
        Arc::new(TestGraph::default())
    }

    pub fn add(self: &Arc<Self>, mut node: TestNode) -> Arc<TestNode> {
        node.graph = Arc::downgrade(self);
        let node = Arc::new(node);
        self.nodes
            .lock()
            .unwrap()
            .insert(node.node_id.clone(), node.clone());
        node
    }
}

pub struct TestNode {
    node_id: String,
    node_kind: String,
    scope: String,
    target: RoutingTarget,
    edges: Vec<String>,
    terminal: bool,
    filter: bool,
    deny_reason: Option<String>,
    lookup_block: Option<String>,
    lookup_failure: Option<String>,
    graph: Weak<TestGraph>,
}

impl TestNode {
    pub fn new(id: &str) -> Self {
        TestNode {
            node_id: id.to_string(),
            node_kind: "component".to_string(),
            scope: "account-test".to_string(),
            target: RoutingTarget::default(),
            edges: Vec::new(),
            terminal: false,
            filter: false,
            deny_reason: None,
            lookup_block: None,
            lookup_failure: None,
            graph: Weak::new(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.node_kind = kind.to_string();
        self
    }

    pub fn with_target(mut self, ip: &str, port: u16, protocol: &str) -> Self {
        self.target = RoutingTarget {
            ip: ip.to_string(),
            port,
            protocol: protocol.to_string(),
            ..Default::default()
        };
        self
    }

    pub fn with_edges(mut self, ids: &[&str]) -> Self {
        self.edges = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn filter(mut self) -> Self {
        self.filter = true;
        self
    }

    /// Attach a rule evaluator that denies everything with this reason.
    pub fn with_deny_rule(mut self, reason: &str) -> Self {
        self.deny_reason = Some(reason.to_string());
        self
    }

    /// Next-hop queries fail with a blocking error.
    pub fn with_lookup_block(mut self, reason: &str) -> Self {
        self.lookup_block = Some(reason.to_string());
        self
    }

    /// Next-hop queries fail with an infrastructure error.
    pub fn with_lookup_failure(mut self, message: &str) -> Self {
        self.lookup_failure = Some(message.to_string());
        self
    }
}

#[async_trait]
impl Node for TestNode {
    async fn next_hops(
        &self,
        _target: &RoutingTarget,
        _ctx: &TraversalContext,
    ) -> Result<Vec<Arc<dyn Node>>, EngineError> {
        if let Some(reason) = &self.lookup_block {
            return Err(EngineError::Blocked {
                node_id: self.node_id.clone(),
                reason: reason.clone(),
            });
        }
        if let Some(message) = &self.lookup_failure {
            return Err(EngineError::Lookup(message.clone()));
        }

        let graph = self.graph.upgrade().expect("test graph dropped");
        let nodes = graph.nodes.lock().unwrap();
        Ok(self
            .edges
            .iter()
            .filter_map(|id| nodes.get(id).map(|n| n.clone() as Arc<dyn Node>))
            .collect())
    }

    fn id(&self) -> &str {
        &self.node_id
    }

    fn owner_scope(&self) -> &str {
        &self.scope
    }

    fn kind(&self) -> &str {
        &self.node_kind
    }

    fn routing_target(&self) -> RoutingTarget {
        self.target.clone()
    }

    fn rule_evaluator(&self) -> Option<&dyn RuleEvaluator> {
        self.deny_reason.as_ref().map(|_| self as &dyn RuleEvaluator)
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn is_filter(&self) -> bool {
        self.filter
    }
}

#[async_trait]
impl RuleEvaluator for TestNode {
    async fn evaluate(&self, target: &RoutingTarget, _direction: Direction) -> RuleVerdict {
        match &self.deny_reason {
            Some(reason) => RuleVerdict {
                allowed: false,
                reason: reason.clone(),
                evaluations: vec![RuleEvaluation {
                    rule_id: format!("{}-rule-1", self.node_id),
                    description: format!("{}:{}/{}", target.ip, target.port, target.protocol),
                    matched: true,
                    allowed: false,
                }],
            },
            None => RuleVerdict {
                allowed: true,
                reason: String::new(),
                evaluations: Vec::new(),
            },
        }
    }
}
