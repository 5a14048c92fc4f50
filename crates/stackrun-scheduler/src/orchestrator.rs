//! Run orchestrator - drives a run through its phases.
//!
//! ```text
//! Idle -> Provisioning -> Deploying -> Aggregating -> Publishing -> Done
//!                             |             |              |
//!                             +-------------+--------------+--> Failed
//! ```
//!
//! Provisioning never fails a run. Deploy, aggregation and publish failures
//! end it; a publish failure leaves the deployed infrastructure in place.

use crate::{
    OutputAggregator, ProvisionReport, RunError, StatePublisher, WorkspaceProvisioner,
};
use serde::Serialize;
use stackrun_config::RunConfig;
use stackrun_core::{
    AggregateState, ConfigStore, DeploySpec, Environment, ProcessOutcome, ProcessRunner, RunId,
    StackName, StackSet, WorkspaceApi, WorkspaceProvisionResult,
};
use stackrun_executor::{ExecutionEvent, SequentialExecutor};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, info_span, warn};

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Provisioning,
    Deploying,
    Aggregating,
    Publishing,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, Provisioning)
                | (Provisioning, Deploying)
                | (Deploying, Aggregating)
                | (Deploying, Failed)
                | (Aggregating, Publishing)
                | (Aggregating, Failed)
                | (Publishing, Done)
                | (Publishing, Failed)
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Provisioning => write!(f, "provisioning"),
            RunPhase::Deploying => write!(f, "deploying"),
            RunPhase::Aggregating => write!(f, "aggregating"),
            RunPhase::Publishing => write!(f, "publishing"),
            RunPhase::Done => write!(f, "done"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Event emitted during a run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    PhaseChanged { phase: RunPhase },
    /// State left by a previous run. `cluster` is its `cluster.name` output.
    PriorState { key: String, cluster: Option<String> },
    PriorStateUnavailable { key: String },
    WorkspaceProvisioned { result: WorkspaceProvisionResult },
    /// Emitted once after provisioning when at least one stack failed.
    ProvisionDiagnostic { message: String },
    Execution(ExecutionEvent),
    Deployed { workspaces_url: String },
    /// State stored under `key` in the `team` config.
    StatePublished {
        key: String,
        team: String,
        state: AggregateState,
    },
    RunCompleted { success: bool },
}

impl From<ExecutionEvent> for RunEvent {
    fn from(event: ExecutionEvent) -> Self {
        RunEvent::Execution(event)
    }
}

impl From<WorkspaceProvisionResult> for RunEvent {
    fn from(result: WorkspaceProvisionResult) -> Self {
        RunEvent::WorkspaceProvisioned { result }
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub environment: Environment,
    pub stacks: Vec<StackName>,
    pub state_key: String,
    /// Terminal phase, `Done` or `Failed`.
    pub phase: RunPhase,
    pub provision: ProvisionReport,
    /// Outcomes of every deploy process that ran, in order.
    pub outcomes: Vec<ProcessOutcome>,
    pub state: Option<AggregateState>,
    pub error: Option<RunError>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.phase == RunPhase::Done
    }
}

/// Orchestrates one run over a resolved stack set.
pub struct Orchestrator {
    config: RunConfig,
    stacks: StackSet,
    specs: Vec<DeploySpec>,
    provisioner: WorkspaceProvisioner,
    executor: SequentialExecutor,
    aggregator: OutputAggregator,
    publisher: StatePublisher,
}

impl Orchestrator {
    /// Resolve the stack set and deploy specs. Fails without side effects
    /// when the selection is invalid.
    pub fn new(
        config: RunConfig,
        workspaces: Arc<dyn WorkspaceApi>,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self, RunError> {
        let stacks = config.stack_set()?;
        let specs = config.deploy_specs(&stacks);

        Ok(Self {
            provisioner: WorkspaceProvisioner::new(workspaces.clone()),
            executor: SequentialExecutor::new(runner),
            aggregator: OutputAggregator::new(workspaces),
            publisher: StatePublisher::new(store),
            config,
            stacks,
            specs,
        })
    }

    pub fn stacks(&self) -> &StackSet {
        &self.stacks
    }

    pub fn specs(&self) -> &[DeploySpec] {
        &self.specs
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Start the run on a background task, returning a channel of events and
    /// a handle to the final report.
    pub fn execute(
        self: Arc<Self>,
    ) -> (mpsc::Receiver<RunEvent>, tokio::task::JoinHandle<RunReport>) {
        let (tx, rx) = mpsc::channel(100);
        let handle = tokio::spawn(async move { self.run(Some(tx)).await });
        (rx, handle)
    }

    /// Run every phase to completion.
    pub async fn run(&self, events: Option<mpsc::Sender<RunEvent>>) -> RunReport {
        let run_id = RunId::new();
        let span = info_span!(
            "run",
            run_id = %run_id,
            environment = %self.config.environment(),
            stack_type = %self.config.stack_type()
        );
        self.run_phases(run_id, events.as_ref()).instrument(span).await
    }

    async fn run_phases(
        &self,
        run_id: RunId,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> RunReport {
        let config = &self.config;
        let mut report = RunReport {
            run_id,
            environment: config.environment(),
            stacks: self.stacks.stacks().to_vec(),
            state_key: config.state_key(),
            phase: RunPhase::Idle,
            provision: ProvisionReport::default(),
            outcomes: Vec::new(),
            state: None,
            error: None,
        };

        info!(stacks = ?report.stacks, "Starting run");
        self.probe_prior_state(&report.state_key, events).await;

        // Provisioning: best-effort, always advances.
        Self::transition(&mut report, RunPhase::Provisioning, events).await;
        report.provision = self
            .provisioner
            .provision_all(config.organization(), &self.stacks, config.token(), events)
            .await;
        if let Some(message) = report.provision.diagnostic() {
            warn!(
                failed = report.provision.failures().count(),
                "Workspace provisioning reported errors, continuing with deploy"
            );
            emit(events, RunEvent::ProvisionDiagnostic { message }).await;
        }

        // Deploying: strictly sequential, stops at the first failure.
        Self::transition(&mut report, RunPhase::Deploying, events).await;
        match self.executor.run_all_with_events(&self.specs, events).await {
            Ok(outcomes) => report.outcomes = outcomes,
            Err(e) => {
                report.outcomes = e.attempted();
                return Self::fail(report, e.into(), events).await;
            }
        }
        emit(
            events,
            RunEvent::Deployed {
                workspaces_url: config.workspaces_url(),
            },
        )
        .await;

        // Aggregating: concurrent reads, merged in stack order.
        Self::transition(&mut report, RunPhase::Aggregating, events).await;
        info!(team = %config.team(), "Syncing infrastructure state with team");
        let state = match self
            .aggregator
            .collect_outputs(config.organization(), &self.stacks, config.token())
            .await
        {
            Ok(state) => state,
            Err(e) => return Self::fail(report, e.into(), events).await,
        };

        // Publishing: failure is reported; the deployment stays applied.
        Self::transition(&mut report, RunPhase::Publishing, events).await;
        if let Err(e) = self.publisher.publish(&report.state_key, &state).await {
            report.state = Some(state);
            return Self::fail(report, e.into(), events).await;
        }
        emit(
            events,
            RunEvent::StatePublished {
                key: report.state_key.clone(),
                team: config.team().to_string(),
                state: state.clone(),
            },
        )
        .await;
        report.state = Some(state);

        Self::transition(&mut report, RunPhase::Done, events).await;
        info!(key = %report.state_key, "Run completed successfully");
        emit(events, RunEvent::RunCompleted { success: true }).await;
        report
    }

    /// Report state left by an earlier run. Never fails the run.
    async fn probe_prior_state(&self, key: &str, events: Option<&mpsc::Sender<RunEvent>>) {
        match self.publisher.previous(key).await {
            Ok(Some(state)) => {
                let cluster = state
                    .get("cluster")
                    .and_then(|c| c.get("name"))
                    .and_then(|n| n.as_str())
                    .map(str::to_string);
                info!(key = %key, cluster = ?cluster, "Found state from a previous run");
                emit(
                    events,
                    RunEvent::PriorState {
                        key: key.to_string(),
                        cluster,
                    },
                )
                .await;
            }
            Ok(None) => {
                info!(key = %key, "No previous state, proceeding with setup");
                emit(events, RunEvent::PriorStateUnavailable { key: key.to_string() }).await;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not read previous state, proceeding with setup");
                emit(events, RunEvent::PriorStateUnavailable { key: key.to_string() }).await;
            }
        }
    }

    async fn transition(
        report: &mut RunReport,
        next: RunPhase,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) {
        debug_assert!(
            report.phase.can_transition_to(next),
            "invalid transition {} -> {}",
            report.phase,
            next
        );
        info!(from = %report.phase, to = %next, "Run phase changed");
        report.phase = next;
        emit(events, RunEvent::PhaseChanged { phase: next }).await;
    }

    async fn fail(
        mut report: RunReport,
        err: RunError,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> RunReport {
        error!(phase = %report.phase, error = %err, "Run failed");
        Self::transition(&mut report, RunPhase::Failed, events).await;
        report.error = Some(err);
        emit(events, RunEvent::RunCompleted { success: false }).await;
        report
    }
}

async fn emit(events: Option<&mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
