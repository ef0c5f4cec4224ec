//! Runtime scheduler
//!
//! Drives a validated graph through its lifecycle: dependency-ordered
//! dispatch with bounded parallelism for independent branches, per-node
//! error isolation with silent downstream skipping, cooperative one-shot
//! cancellation, and serially ordered observer events.
//!
//! All bookkeeping runs on a single dispatch loop; node bodies execute on
//! spawned tasks and report back over a completion channel, so observer
//! callbacks never interleave.

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ExecuteError;
use crate::events::{ExecutionObserver, WireOutputs};
use crate::extensions::Environment;
use crate::node::{ExecutionContext, NodeError, NodeInputs, NodeOutputs};
use crate::registry::NodeRegistry;
use crate::types::{NodeId, WorkflowGraph};
use crate::validation::Validator;

/// Lifecycle state of a node within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Waiting on upstream dependencies
    Idle,
    /// All inputs satisfied, queued for dispatch
    Ready,
    /// Body currently executing
    Running,
    /// Terminated successfully
    Completed,
    /// Terminated with an error
    Failed,
    /// Will never run because an ancestor failed
    Skipped,
}

impl NodeStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Scheduler tuning knobs
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum number of node bodies executing at once
    pub max_concurrency: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            max_concurrency: parallelism,
        }
    }
}

/// Final state of one scheduler run
#[derive(Debug)]
pub struct ExecutionReport {
    /// Unique identifier of this run
    pub execution_id: String,
    /// Outputs of every node that completed successfully
    pub outputs: HashMap<NodeId, NodeOutputs>,
    /// Error message of every node that failed
    pub errors: HashMap<NodeId, String>,
    /// Lifecycle state each node ended the run in
    pub statuses: HashMap<NodeId, NodeStatus>,
    /// True when cancellation was observed before natural completion
    pub aborted: bool,
}

/// Bookkeeping for one run, indexed by node position in the graph
struct RunState {
    /// node id -> index
    index_of: HashMap<NodeId, usize>,
    /// outgoing edge indices per node
    adjacency: Vec<Vec<usize>>,
    /// unresolved inbound edges per node
    incoming: Vec<usize>,
    /// resolved input slots, seeded from literals
    slots: Vec<NodeInputs>,
    status: Vec<NodeStatus>,
    outputs: Vec<Option<NodeOutputs>>,
    errors: Vec<Option<String>>,
    ready: VecDeque<usize>,
}

/// The runtime scheduler
///
/// One scheduler drives one graph for one `execute` call. Cancellation is a
/// one-shot flag: running bodies are never interrupted, but nothing further
/// is dispatched and no further events are delivered once it is observed.
pub struct Scheduler {
    graph: WorkflowGraph,
    registry: Arc<NodeRegistry>,
    observer: Arc<dyn ExecutionObserver>,
    options: SchedulerOptions,
    abort: Arc<AtomicBool>,
}

impl Scheduler {
    /// Create a scheduler with default options
    pub fn new(
        graph: WorkflowGraph,
        registry: Arc<NodeRegistry>,
        observer: Arc<dyn ExecutionObserver>,
    ) -> Self {
        Self::with_options(graph, registry, observer, SchedulerOptions::default())
    }

    /// Create a scheduler with explicit options
    pub fn with_options(
        graph: WorkflowGraph,
        registry: Arc<NodeRegistry>,
        observer: Arc<dyn ExecutionObserver>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            graph,
            registry,
            observer,
            options,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request orderly shutdown of a running execution
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// The cancellation signal, for wiring into external shutdown paths
    pub fn cancellation(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    fn cancelled(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Execute the graph to completion, cancellation, or fatal fault
    ///
    /// Validates first; a graph that fails validation is rejected through
    /// `on_execution_error` without running anything.
    pub async fn execute(&self, env: Environment) -> Result<ExecutionReport, ExecuteError> {
        let validation_errors = Validator::new(&self.registry).validate(&self.graph);
        if !validation_errors.is_empty() {
            let combined = validation_errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            self.emit(|| self.observer.on_execution_error(&combined));
            return Err(ExecuteError::Invalid(validation_errors));
        }

        let execution_id = uuid::Uuid::new_v4().to_string();
        log::debug!(
            "starting execution {} of graph '{}' ({} nodes, {} edges)",
            execution_id,
            self.graph.id,
            self.graph.nodes.len(),
            self.graph.edges.len()
        );

        let mut state = self.build_plan();
        let env = Arc::new(env);

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<NodeOutputs, NodeError>)>();
        let mut in_flight = 0usize;
        let max_concurrency = self.options.max_concurrency.max(1);

        loop {
            while !self.cancelled() && in_flight < max_concurrency {
                let Some(idx) = state.ready.pop_front() else {
                    break;
                };
                // A queued node may have been skipped by an upstream failure.
                if state.status[idx] != NodeStatus::Ready {
                    continue;
                }
                if state.incoming[idx] != 0 {
                    return self.fatal(format!(
                        "ready node '{}' still has {} unresolved inputs",
                        self.graph.nodes[idx].id, state.incoming[idx]
                    ));
                }

                let node = &self.graph.nodes[idx];
                let instance = match self.registry.instantiate(node) {
                    Ok(instance) => instance,
                    Err(e) => return self.fatal(e.to_string()),
                };

                state.status[idx] = NodeStatus::Running;
                self.emit(|| self.observer.on_node_start(&node.id));

                let ctx = ExecutionContext {
                    node_id: node.id.clone(),
                    workflow_id: self.graph.id.clone(),
                    execution_id: execution_id.clone(),
                    inputs: std::mem::take(&mut state.slots[idx]),
                    env: env.clone(),
                    abort_signal: self.abort.clone(),
                };

                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = AssertUnwindSafe(instance.execute(ctx))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(NodeError::failed(format!(
                                "UNCAUGHT: {}",
                                panic_message(panic)
                            )))
                        });
                    let _ = tx.send((idx, outcome));
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }

            let Some((idx, outcome)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            // Completion events of bodies that drain after cancellation was
            // observed are recorded but not delivered.
            let deliver = !self.cancelled();
            match outcome {
                Ok(outputs) => self.handle_success(idx, outputs, deliver, &mut state)?,
                Err(err) => self.fail_node(idx, err.to_string(), deliver, &mut state),
            }
        }

        let aborted = self.cancelled();
        if aborted {
            log::debug!("execution {} aborted by cancellation", execution_id);
        } else {
            debug_assert!(state.status.iter().all(NodeStatus::is_terminal));
            self.emit(|| self.observer.on_execution_complete());
        }

        Ok(self.build_report(execution_id, state, aborted))
    }

    /// Compute inbound counts, adjacency, and literal-seeded input slots.
    fn build_plan(&self) -> RunState {
        let node_count = self.graph.nodes.len();
        let index_of: HashMap<NodeId, usize> = self
            .graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        let mut incoming = vec![0usize; node_count];
        for (edge_idx, edge) in self.graph.edges.iter().enumerate() {
            adjacency[index_of[&edge.source]].push(edge_idx);
            incoming[index_of[&edge.target]] += 1;
        }

        let mut slots = vec![NodeInputs::new(); node_count];
        let mut literal_failures: Vec<(usize, String)> = Vec::new();

        for (idx, node) in self.graph.nodes.iter().enumerate() {
            for port in &node.inputs {
                let Some(wire) = port.value.as_ref().or(port.default_value.as_ref()) else {
                    continue;
                };
                let seeded = port
                    .kind
                    .deserialize(wire)
                    .and_then(|value| port.kind.validate(&value).map(|_| value));
                match seeded {
                    Ok(value) => {
                        slots[idx].insert(port.name.clone(), value);
                    }
                    Err(reason) => {
                        literal_failures.push((
                            idx,
                            format!("INPUT_VALIDATION: {}: {}", port.name, reason),
                        ));
                    }
                }
            }
        }

        let mut state = RunState {
            index_of,
            adjacency,
            incoming,
            slots,
            status: vec![NodeStatus::Idle; node_count],
            outputs: vec![None; node_count],
            errors: vec![None; node_count],
            ready: VecDeque::new(),
        };

        // Literals that fail their kind pre-fail the node before it runs.
        for (idx, message) in literal_failures {
            if state.status[idx] == NodeStatus::Idle {
                self.fail_node(idx, message, true, &mut state);
            }
        }

        for idx in 0..node_count {
            if state.status[idx] == NodeStatus::Idle && state.incoming[idx] == 0 {
                state.status[idx] = NodeStatus::Ready;
                state.ready.push_back(idx);
            }
        }

        state
    }

    /// Record a successful body, enforce its output contract, and route
    /// values downstream.
    fn handle_success(
        &self,
        idx: usize,
        mut outputs: NodeOutputs,
        deliver: bool,
        state: &mut RunState,
    ) -> Result<(), ExecuteError> {
        let node = &self.graph.nodes[idx];

        let declared: HashSet<&str> = node.outputs.iter().map(|p| p.name.as_str()).collect();
        let undeclared: Vec<String> = outputs
            .keys()
            .filter(|k| !declared.contains(k.as_str()))
            .cloned()
            .collect();
        for key in undeclared {
            log::warn!(
                "node '{}' produced undeclared output '{}', dropping",
                node.id,
                key
            );
            outputs.remove(&key);
        }

        // An output demanded by an outgoing edge must be present.
        let out_edges = state.adjacency[idx].clone();
        for &edge_idx in &out_edges {
            let edge = &self.graph.edges[edge_idx];
            if !outputs.contains_key(&edge.source_port) {
                self.fail_node(
                    idx,
                    format!("MISSING_OUTPUT: {}", edge.source_port),
                    deliver,
                    state,
                );
                return Ok(());
            }
        }

        state.status[idx] = NodeStatus::Completed;
        if deliver {
            let wire = self.wire_outputs(idx, &outputs);
            self.emit(|| self.observer.on_node_complete(&node.id, &wire));
        }

        let mut newly_ready: Vec<usize> = Vec::new();
        for &edge_idx in &out_edges {
            let edge = &self.graph.edges[edge_idx];
            let target_idx = state.index_of[&edge.target];
            if state.incoming[target_idx] == 0 {
                return self.fatal(format!(
                    "edge {} resolved into node '{}' with no pending inputs",
                    edge_idx, edge.target
                ));
            }
            state.incoming[target_idx] -= 1;

            if state.status[target_idx] != NodeStatus::Idle {
                continue;
            }

            let Some(target_port) = self.graph.nodes[target_idx].input_port(&edge.target_port)
            else {
                return self.fatal(format!(
                    "edge {} references port '{}' missing after validation",
                    edge_idx, edge.target_port
                ));
            };

            let value = outputs[&edge.source_port].clone();
            match target_port.kind.validate(&value) {
                Ok(()) => {
                    state.slots[target_idx].insert(edge.target_port.clone(), value);
                    if state.incoming[target_idx] == 0 {
                        newly_ready.push(target_idx);
                    }
                }
                Err(reason) => {
                    // Pre-fail the downstream before it ever executes.
                    self.fail_node(
                        target_idx,
                        format!("INPUT_VALIDATION: {}: {}", edge.target_port, reason),
                        deliver,
                        state,
                    );
                }
            }
        }

        // Nodes that became ready in the same wave start in declared order.
        newly_ready.sort_unstable();
        newly_ready.dedup();
        for target_idx in newly_ready {
            if state.status[target_idx] == NodeStatus::Idle {
                state.status[target_idx] = NodeStatus::Ready;
                state.ready.push_back(target_idx);
            }
        }

        state.outputs[idx] = Some(outputs);
        Ok(())
    }

    /// Mark a node failed and silently skip everything downstream of it.
    fn fail_node(&self, idx: usize, message: String, deliver: bool, state: &mut RunState) {
        let node_id = &self.graph.nodes[idx].id;
        log::debug!("node '{}' failed: {}", node_id, message);

        state.status[idx] = NodeStatus::Failed;
        state.errors[idx] = Some(message.clone());
        if deliver {
            self.emit(|| self.observer.on_node_error(node_id, &message));
        }

        // Transitive downstream nodes are skipped, not failed: they receive
        // no start and no error event.
        let mut stack: Vec<usize> = state.adjacency[idx]
            .iter()
            .map(|&edge_idx| state.index_of[&self.graph.edges[edge_idx].target])
            .collect();
        while let Some(target_idx) = stack.pop() {
            if matches!(
                state.status[target_idx],
                NodeStatus::Idle | NodeStatus::Ready
            ) {
                state.status[target_idx] = NodeStatus::Skipped;
                stack.extend(
                    state.adjacency[target_idx]
                        .iter()
                        .map(|&edge_idx| state.index_of[&self.graph.edges[edge_idx].target]),
                );
            }
        }
    }

    /// Serialize completed outputs into wire form for the observer boundary.
    fn wire_outputs(&self, idx: usize, outputs: &NodeOutputs) -> WireOutputs {
        let node = &self.graph.nodes[idx];
        outputs
            .iter()
            .filter_map(|(name, value)| {
                node.output_port(name)
                    .map(|port| (name.clone(), port.kind.serialize(value)))
            })
            .collect()
    }

    /// A broken scheduler invariant ends the run immediately.
    fn fatal<T>(&self, message: String) -> Result<T, ExecuteError> {
        log::error!("fatal scheduler fault: {}", message);
        self.emit(|| self.observer.on_execution_error(&message));
        Err(ExecuteError::Internal(message))
    }

    /// Invoke an observer callback, containing any panic it raises.
    fn emit(&self, call: impl FnOnce()) {
        if std::panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
            log::warn!("observer callback panicked, continuing");
        }
    }

    fn build_report(
        &self,
        execution_id: String,
        state: RunState,
        aborted: bool,
    ) -> ExecutionReport {
        let mut outputs = HashMap::new();
        let mut errors = HashMap::new();
        let mut statuses = HashMap::new();

        for (idx, node) in self.graph.nodes.iter().enumerate() {
            statuses.insert(node.id.clone(), state.status[idx]);
            if let Some(node_outputs) = &state.outputs[idx] {
                outputs.insert(node.id.clone(), node_outputs.clone());
            }
            if let Some(error) = &state.errors[idx] {
                errors.insert(node.id.clone(), error.clone());
            }
        }

        ExecutionReport {
            execution_id,
            outputs,
            errors,
            statuses,
            aborted,
        }
    }
}

/// Render a caught panic payload into a message.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "node body panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeCategory, NodeDescriptor, PortSpec};
    use crate::events::{ExecutionEvent, RecordingObserver};
    use crate::node::{InputsExt, Node};
    use crate::params::{ParamKind, ParamValue};
    use crate::types::{GraphEdge, GraphNode, Position};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    type Behavior =
        Arc<dyn Fn(&ExecutionContext) -> Result<NodeOutputs, NodeError> + Send + Sync>;

    struct FnNode {
        id: String,
        descriptor: NodeDescriptor,
        delay: Option<Duration>,
        behavior: Behavior,
    }

    #[async_trait]
    impl Node for FnNode {
        fn descriptor(&self) -> &NodeDescriptor {
            &self.descriptor
        }

        fn id(&self) -> &str {
            &self.id
        }

        async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.behavior)(&ctx)
        }
    }

    fn number_out(value: f64) -> Result<NodeOutputs, NodeError> {
        let mut outputs = NodeOutputs::new();
        outputs.insert("out".into(), ParamValue::Number(value));
        Ok(outputs)
    }

    fn descriptor(kind: &str, inputs: Vec<PortSpec>, outputs: Vec<PortSpec>) -> NodeDescriptor {
        NodeDescriptor {
            kind: kind.into(),
            label: kind.into(),
            category: NodeCategory::Processing,
            icon: "gear".into(),
            description: String::new(),
            inputs,
            outputs,
        }
    }

    fn register(
        registry: &mut NodeRegistry,
        desc: NodeDescriptor,
        delay: Option<Duration>,
        behavior: Behavior,
    ) {
        let factory_desc = desc.clone();
        registry
            .register(
                desc,
                Box::new(move |node| {
                    Box::new(FnNode {
                        id: node.id.clone(),
                        descriptor: factory_desc.clone(),
                        delay,
                        behavior: behavior.clone(),
                    })
                }),
            )
            .unwrap();
    }

    fn test_registry() -> Arc<NodeRegistry> {
        let mut registry = NodeRegistry::new();

        register(
            &mut registry,
            descriptor(
                "const-five",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|_| number_out(5.0)),
        );

        register(
            &mut registry,
            descriptor(
                "double",
                vec![PortSpec::required("in", ParamKind::Number)],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|ctx| number_out(ctx.inputs.get_number("in")? * 2.0)),
        );

        register(
            &mut registry,
            descriptor(
                "fail",
                vec![PortSpec::optional("in", ParamKind::Number)],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|_| Err(NodeError::failed("boom"))),
        );

        register(
            &mut registry,
            descriptor(
                "panic",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|_| panic!("wild panic")),
        );

        register(
            &mut registry,
            descriptor(
                "sleepy",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            Some(Duration::from_millis(200)),
            Arc::new(|_| number_out(1.0)),
        );

        register(
            &mut registry,
            descriptor(
                "no-output",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|_| Ok(NodeOutputs::new())),
        );

        // Declares `any` but emits a string; downstream number ports reject it.
        register(
            &mut registry,
            descriptor(
                "loose",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Any)],
            ),
            None,
            Arc::new(|_| {
                let mut outputs = NodeOutputs::new();
                outputs.insert("out".into(), ParamValue::String("text".into()));
                Ok(outputs)
            }),
        );

        register(
            &mut registry,
            descriptor(
                "canceller",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|ctx| {
                ctx.abort_signal.store(true, Ordering::Relaxed);
                number_out(1.0)
            }),
        );

        register(
            &mut registry,
            descriptor(
                "chatty",
                vec![],
                vec![PortSpec::optional("out", ParamKind::Number)],
            ),
            None,
            Arc::new(|_| {
                let mut outputs = NodeOutputs::new();
                outputs.insert("out".into(), ParamValue::Number(1.0));
                outputs.insert("extra".into(), ParamValue::Number(2.0));
                Ok(outputs)
            }),
        );

        Arc::new(registry)
    }

    fn node(registry: &NodeRegistry, id: &str, kind: &str) -> GraphNode {
        registry
            .descriptor(kind)
            .unwrap()
            .instantiate(id, id, Position::default())
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            source_port: "out".into(),
            target: target.into(),
            target_port: "in".into(),
        }
    }

    fn graph(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> WorkflowGraph {
        let mut g = WorkflowGraph::new("wf", "Test");
        g.nodes = nodes;
        g.edges = edges;
        g
    }

    fn event_index(events: &[ExecutionEvent], wanted: impl Fn(&ExecutionEvent) -> bool) -> usize {
        events
            .iter()
            .position(wanted)
            .expect("expected event missing")
    }

    fn started(events: &[ExecutionEvent], id: &str) -> usize {
        event_index(events, |e| {
            matches!(e, ExecutionEvent::NodeStarted { node_id } if node_id == id)
        })
    }

    fn completed(events: &[ExecutionEvent], id: &str) -> usize {
        event_index(events, |e| {
            matches!(e, ExecutionEvent::NodeCompleted { node_id, .. } if node_id == id)
        })
    }

    async fn run(
        g: WorkflowGraph,
        registry: Arc<NodeRegistry>,
    ) -> (
        Result<ExecutionReport, ExecuteError>,
        Vec<ExecutionEvent>,
    ) {
        let observer = Arc::new(RecordingObserver::new());
        let scheduler = Scheduler::new(g, registry, observer.clone());
        let result = scheduler.execute(Environment::new()).await;
        (result, observer.events())
    }

    #[tokio::test]
    async fn test_single_node_run() {
        let registry = test_registry();
        let g = graph(vec![node(&registry, "n1", "const-five")], vec![]);

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert!(!report.aborted);
        assert_eq!(report.statuses["n1"], NodeStatus::Completed);
        assert_eq!(report.outputs["n1"]["out"], ParamValue::Number(5.0));
        assert!(report.errors.is_empty());

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ExecutionEvent::NodeStarted { node_id } if node_id == "n1"));
        assert!(
            matches!(&events[1], ExecutionEvent::NodeCompleted { outputs, .. } if outputs["out"] == json!(5.0))
        );
        assert!(matches!(&events[2], ExecutionEvent::ExecutionCompleted));
    }

    #[tokio::test]
    async fn test_dependency_order_in_chain() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "a", "const-five"),
                node(&registry, "b", "double"),
                node(&registry, "c", "double"),
            ],
            vec![edge("a", "b"), edge("b", "c")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.outputs["c"]["out"], ParamValue::Number(20.0));

        assert!(started(&events, "a") < completed(&events, "a"));
        assert!(completed(&events, "a") < started(&events, "b"));
        assert!(completed(&events, "b") < started(&events, "c"));
        assert!(matches!(
            events.last().unwrap(),
            ExecutionEvent::ExecutionCompleted
        ));
    }

    #[tokio::test]
    async fn test_independent_branches_run_in_parallel() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "s1", "sleepy"),
                node(&registry, "s2", "sleepy"),
            ],
            vec![],
        );

        let observer = Arc::new(RecordingObserver::new());
        let scheduler = Scheduler::with_options(
            g,
            registry,
            observer.clone(),
            SchedulerOptions { max_concurrency: 2 },
        );

        let start = std::time::Instant::now();
        let report = scheduler.execute(Environment::new()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(report.outputs.len(), 2);
        // Two 200ms bodies on two workers must not serialize to 400ms.
        assert!(
            elapsed < Duration::from_millis(390),
            "branches were serialized: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_same_wave_starts_in_declared_order() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "src", "const-five"),
                node(&registry, "b", "double"),
                node(&registry, "c", "double"),
                node(&registry, "d", "double"),
            ],
            vec![edge("src", "b"), edge("src", "c"), edge("src", "d")],
        );

        let observer = Arc::new(RecordingObserver::new());
        let scheduler = Scheduler::with_options(
            g,
            registry,
            observer.clone(),
            SchedulerOptions { max_concurrency: 1 },
        );
        scheduler.execute(Environment::new()).await.unwrap();

        let events = observer.events();
        assert!(started(&events, "src") < started(&events, "b"));
        assert!(started(&events, "b") < started(&events, "c"));
        assert!(started(&events, "c") < started(&events, "d"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_downstream_skipped() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "f", "fail"),
                node(&registry, "after", "double"),
                node(&registry, "solo", "const-five"),
            ],
            vec![edge("f", "after")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert!(!report.aborted);
        assert_eq!(report.errors["f"], "boom");
        assert_eq!(report.statuses["f"], NodeStatus::Failed);
        assert_eq!(report.statuses["after"], NodeStatus::Skipped);
        assert_eq!(report.statuses["solo"], NodeStatus::Completed);
        assert!(report.outputs.contains_key("solo"));
        assert!(!report.outputs.contains_key("after"));

        // Skipping is silent: no start and no error for the skipped node.
        assert!(!events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeStarted { node_id } if node_id == "after"
        )));
        assert!(!events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeFailed { node_id, .. } if node_id == "after"
        )));
        // A single node failure does not fail the run.
        assert!(matches!(
            events.last().unwrap(),
            ExecutionEvent::ExecutionCompleted
        ));
    }

    #[tokio::test]
    async fn test_missing_expected_output_fails_node() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "empty", "no-output"),
                node(&registry, "after", "double"),
            ],
            vec![edge("empty", "after")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.errors["empty"], "MISSING_OUTPUT: out");
        assert_eq!(report.statuses["after"], NodeStatus::Skipped);
        assert!(events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeFailed { node_id, error }
                if node_id == "empty" && error.starts_with("MISSING_OUTPUT")
        )));
    }

    #[tokio::test]
    async fn test_invalid_routed_value_prefails_downstream() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "l", "loose"),
                node(&registry, "d", "double"),
                node(&registry, "dd", "double"),
            ],
            vec![edge("l", "d"), edge("d", "dd")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.statuses["l"], NodeStatus::Completed);
        assert_eq!(report.statuses["d"], NodeStatus::Failed);
        assert_eq!(report.statuses["dd"], NodeStatus::Skipped);
        assert!(report.errors["d"].starts_with("INPUT_VALIDATION: in"));

        // The pre-failed node reports an error but never starts.
        assert!(!events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeStarted { node_id } if node_id == "d"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeFailed { node_id, .. } if node_id == "d"
        )));
    }

    #[tokio::test]
    async fn test_invalid_literal_prefails_node() {
        let registry = test_registry();
        let mut bad = node(&registry, "d", "double");
        bad.inputs[0].value = Some(json!("not a number"));

        let g = graph(vec![bad], vec![]);
        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.statuses["d"], NodeStatus::Failed);
        assert!(report.errors["d"].starts_with("INPUT_VALIDATION: in"));
        assert!(!events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeStarted { node_id } if node_id == "d"
        )));
    }

    #[tokio::test]
    async fn test_panic_is_caught_as_uncaught_failure() {
        let registry = test_registry();
        let g = graph(vec![node(&registry, "p", "panic")], vec![]);

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.statuses["p"], NodeStatus::Failed);
        assert_eq!(report.errors["p"], "UNCAUGHT: wild panic");
        assert!(matches!(
            events.last().unwrap(),
            ExecutionEvent::ExecutionCompleted
        ));
    }

    #[tokio::test]
    async fn test_undeclared_outputs_are_dropped() {
        let registry = test_registry();
        let g = graph(vec![node(&registry, "c", "chatty")], vec![]);

        let (result, _) = run(g, registry).await;
        let report = result.unwrap();

        let outputs = &report.outputs["c"];
        assert!(outputs.contains_key("out"));
        assert!(!outputs.contains_key("extra"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_dispatch_and_suppresses_events() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "c", "canceller"),
                node(&registry, "after", "double"),
            ],
            vec![edge("c", "after")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert!(report.aborted);
        // The in-flight body finished and its outcome was recorded...
        assert_eq!(report.outputs["c"]["out"], ParamValue::Number(1.0));
        // ...but its completion event was not delivered, nothing further
        // started, and no terminal completion event fired.
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ExecutionEvent::NodeStarted { node_id } if node_id == "c"));
        assert_eq!(report.statuses["after"], NodeStatus::Ready);
    }

    #[tokio::test]
    async fn test_cancel_before_execute_dispatches_nothing() {
        let registry = test_registry();
        let g = graph(vec![node(&registry, "n1", "const-five")], vec![]);

        let observer = Arc::new(RecordingObserver::new());
        let scheduler = Scheduler::new(g, registry, observer.clone());
        scheduler.cancel();

        let report = scheduler.execute(Environment::new()).await.unwrap();
        assert!(report.aborted);
        assert!(observer.events().is_empty());
        assert!(report.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_graph_is_rejected_before_running() {
        let registry = test_registry();
        let mut n = node(&registry, "n1", "const-five");
        n.kind = "mystery".into();

        let (result, events) = run(graph(vec![n], vec![]), registry).await;

        match result {
            Err(ExecuteError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation rejection, got {:?}", other.is_ok()),
        }
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ExecutionEvent::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_fan_out_waits_for_upstream() {
        let registry = test_registry();
        let g = graph(
            vec![
                node(&registry, "a", "const-five"),
                node(&registry, "b", "double"),
                node(&registry, "c", "double"),
            ],
            vec![edge("a", "b"), edge("a", "c")],
        );

        let (result, events) = run(g, registry).await;
        let report = result.unwrap();

        assert_eq!(report.outputs["b"]["out"], ParamValue::Number(10.0));
        assert_eq!(report.outputs["c"]["out"], ParamValue::Number(10.0));
        assert!(completed(&events, "a") < started(&events, "b"));
        assert!(completed(&events, "a") < started(&events, "c"));
    }
}
