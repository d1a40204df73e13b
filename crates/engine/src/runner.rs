// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch loop.
//!
//! One long-lived worker task drives everything: each tick it asks the
//! orchestrator what is active, admits at most one queued request while the
//! parallelism ceiling allows, then reconciles tracked runs against their
//! reported states. `stop()` flips intent through a single-shot channel;
//! the worker notices at the top of its next tick, so a stop lands within
//! one poll interval.
//!
//! Lock order is dispatcher state → tracker → queue, and no lock is ever
//! held across an orchestrator or reporter call.

use crate::admission::{admit, merge_patch};
use crate::labels::select_labels;
use crate::tracker::FlowTracker;
use crate::EngineError;
use parking_lot::RwLock;
use sluice_adapters::{CreateRun, FlowApi, OutcomeNote, Reporter, RuntimeNote};
use sluice_core::{fingerprint_hex, Agent, Clock, EnqueueRequest, KeyedRequest, RunState};
use sluice_queue::RequestQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Dispatcher settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub flow_name: String,
    pub project_name: String,
    /// Maximum concurrent orchestrator runs attributable to our flow.
    pub parallelism: usize,
    pub poll_interval: Duration,
    /// Send the request fingerprint as the orchestrator idempotency key.
    pub orchestrator_idempotency: bool,
    /// Suppress duplicate admissions by fingerprint.
    pub queue_dedup: bool,
    /// Workers carrying this label never enter the roster.
    pub agent_label_to_ignore: String,
}

struct RunnerState {
    running: bool,
    stop_tx: Option<mpsc::Sender<()>>,
}

/// Background worker that services the request queue.
pub struct DispatchRunner {
    config: DispatchConfig,
    queue: Arc<dyn RequestQueue<KeyedRequest>>,
    flows: Arc<dyn FlowApi>,
    reporter: Arc<dyn Reporter>,
    clock: Arc<dyn Clock>,
    tracker: FlowTracker,
    /// Worker roster, fetched once at construction.
    agents: Vec<Agent>,
    state: RwLock<RunnerState>,
}

impl DispatchRunner {
    /// Build a runner and take the one-time worker roster snapshot.
    ///
    /// An unreachable orchestrator at startup leaves the roster empty:
    /// label steering degrades to "orchestrator decides" but admission and
    /// dispatch still work.
    pub async fn new(
        config: DispatchConfig,
        queue: Arc<dyn RequestQueue<KeyedRequest>>,
        flows: Arc<dyn FlowApi>,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let agents = match flows.list_agents(&config.agent_label_to_ignore).await {
            Ok(agents) => agents,
            Err(e) => {
                warn!(error = %e, "failed to fetch worker roster; label steering disabled");
                Vec::new()
            }
        };
        info!(workers = agents.len(), "dispatcher constructed");

        Arc::new(Self {
            config,
            queue,
            flows,
            reporter,
            clock,
            tracker: FlowTracker::new(),
            agents,
            state: RwLock::new(RunnerState {
                running: false,
                stop_tx: None,
            }),
        })
    }

    /// Spawn the worker task. A second start while running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut state = self.state.write();
        if state.running {
            return;
        }
        let (stop_tx, stop_rx) = mpsc::channel(1);
        state.running = true;
        state.stop_tx = Some(stop_tx);
        drop(state);

        let runner = Arc::clone(self);
        tokio::spawn(async move { runner.run_loop(stop_rx).await });
        info!("dispatcher started");
    }

    /// Signal the worker to stop and return.
    ///
    /// The signal is observed at the top of the next tick, so the stop
    /// takes effect no later than one poll interval after the call. A stop
    /// while stopped is a no-op.
    pub fn stop(&self) {
        let mut state = self.state.write();
        if !state.running {
            return;
        }
        if let Some(stop_tx) = state.stop_tx.take() {
            let _ = stop_tx.try_send(());
            info!("dispatcher stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.read().running
    }

    /// Number of runs currently tracked to completion.
    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }

    async fn run_loop(self: Arc<Self>, mut stop_rx: mpsc::Receiver<()>) {
        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }
            self.tick().await;
            tokio::time::sleep(self.config.poll_interval).await;
        }
        self.state.write().running = false;
        info!("dispatcher stopped");
    }

    /// One pass of the poll–admit–submit–reconcile cycle.
    async fn tick(&self) {
        match self
            .flows
            .active_runs_for_flow(&self.config.flow_name, &self.config.project_name)
            .await
        {
            Ok(active) => {
                if active.len() < self.config.parallelism {
                    let labels = select_labels(&self.agents, &active);
                    if let Err(e) = self.submit(labels).await {
                        warn!(error = %e, "submission failed");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch active runs; skipping admission this tick");
            }
        }

        self.reconcile().await;
    }

    /// Dequeue the next request and hand it to the orchestrator.
    ///
    /// The request leaves the queue before the orchestrator accepts it; a
    /// failed creation therefore loses it. Retry-from-history is the
    /// operator's remedy.
    async fn submit(&self, labels: Vec<String>) -> Result<(), EngineError> {
        if self.queue.size() == 0 {
            return Ok(());
        }
        let keyed = self.queue.dequeue()?;
        let now = self.clock.epoch_ms();

        let runtime_note = RuntimeNote {
            run_id: keyed.request.run_id.clone(),
            data_id: keyed.request.model_id.clone(),
            doc_ids: keyed.request.doc_ids.clone(),
            is_indicator: keyed.request.is_indicator,
            start_time: keyed.enqueue_time_ms,
            end_time: now,
        };
        if let Err(e) = self.reporter.queue_runtime(&runtime_note).await {
            warn!(error = %e, "queue-runtime report failed");
        }

        let version_group = self
            .flows
            .version_group_for(&self.config.flow_name, &self.config.project_name)
            .await?;

        let labels = if keyed.label_override.is_empty() {
            labels
        } else {
            keyed.label_override.clone()
        };
        let idempotency_key = self
            .config
            .orchestrator_idempotency
            .then(|| fingerprint_hex(keyed.request_key));

        let run_name = keyed.request.run_name();
        let run_id = self
            .flows
            .create_run(CreateRun {
                version_group_id: &version_group,
                run_name: &run_name,
                labels: &labels,
                idempotency_key,
                parameters_json: &keyed.request.raw,
            })
            .await?;

        info!(run = %run_id, name = %run_name, "submitted queued request");
        self.tracker.insert(run_id, keyed.request, now);
        Ok(())
    }

    /// Submit the next queued request regardless of the parallelism gate.
    ///
    /// A non-empty override wins; otherwise the label set comes from a
    /// fresh active-run fetch.
    pub async fn force_submit(&self, label_override: Vec<String>) -> Result<(), EngineError> {
        let labels = if !label_override.is_empty() {
            label_override
        } else {
            match self
                .flows
                .active_runs_for_flow(&self.config.flow_name, &self.config.project_name)
                .await
            {
                Ok(active) => select_labels(&self.agents, &active),
                Err(e) => {
                    warn!(error = %e, "active-run fetch failed; submitting without labels");
                    Vec::new()
                }
            }
        };
        self.submit(labels).await
    }

    /// Resolve tracked runs that reached a terminal state.
    ///
    /// The tracker is snapshotted up front and entries are removed after
    /// their outcome notification was attempted; the lock is never held
    /// across the orchestrator or reporter calls.
    async fn reconcile(&self) {
        let ids = self.tracker.ids();
        if ids.is_empty() {
            return;
        }

        let runs = match self
            .flows
            .runs_by_id(&ids, &self.config.flow_name, &self.config.project_name)
            .await
        {
            Ok(runs) => runs,
            Err(e) => {
                warn!(error = %e, "failed to fetch tracked runs; will retry next tick");
                return;
            }
        };

        for run in runs.iter().filter(|r| r.state.is_terminal()) {
            let Some(tracked) = self.tracker.get(&run.id) else {
                continue;
            };
            let note = OutcomeNote {
                flow_id: run.id.clone(),
                run_id: tracked.request.run_id.clone(),
                data_id: tracked.request.model_id.clone(),
                doc_ids: tracked.request.doc_ids.clone(),
                is_indicator: tracked.request.is_indicator,
                start_time: None,
                end_time: None,
            };

            match run.state {
                RunState::Success => {
                    let note = OutcomeNote {
                        start_time: Some(tracked.start_time_ms),
                        end_time: Some(self.clock.epoch_ms()),
                        ..note
                    };
                    if let Err(e) = self.reporter.processing_succeeded(&note).await {
                        warn!(run = %run.id, error = %e, "succeeded report failed; falling back to failed");
                        if let Err(e) = self.reporter.processing_failed(&note).await {
                            warn!(run = %run.id, error = %e, "fallback failed report also failed");
                        }
                    }
                }
                RunState::Failed | RunState::Cancelled => {
                    if let Err(e) = self.reporter.processing_failed(&note).await {
                        warn!(run = %run.id, error = %e, "failed report not delivered");
                    }
                }
                _ => continue,
            }

            self.tracker.remove(&run.id);
        }
    }

    /// Re-admit a finished run with its stored parameters, patched.
    ///
    /// Fails with [`EngineError::FlowNotDone`] while the run is still
    /// tracked. Patch keys overwrite stored keys; the merged document is
    /// revalidated and enters through normal admission.
    pub async fn retry(
        &self,
        run_id: &str,
        patch: Option<serde_json::Value>,
        label_override: Vec<String>,
    ) -> Result<(), EngineError> {
        if self.tracker.contains(run_id) {
            return Err(EngineError::FlowNotDone(run_id.to_string()));
        }

        let mut parameters = self.flows.run_parameters(run_id).await?;
        if let Some(patch) = patch {
            merge_patch(&mut parameters, &patch);
        }

        let raw = parameters.to_string();
        let request = EnqueueRequest::parse(raw.as_bytes())?;
        info!(run = run_id, name = %request.run_name(), "re-admitting finished run");
        admit(
            self.queue.as_ref(),
            request,
            label_override,
            self.config.queue_dedup,
            self.clock.as_ref(),
        )
    }

    /// Fresh count of active orchestrator runs for our flow.
    pub async fn active_count(&self) -> Result<usize, EngineError> {
        let active = self
            .flows
            .active_runs_for_flow(&self.config.flow_name, &self.config.project_name)
            .await?;
        Ok(active.len())
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
