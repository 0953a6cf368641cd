// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI-Coder Session Manager (spec §4.1, C1): the orchestrator that
//! creates, starts, and tears down provider-backed coder sessions, each
//! with its own workspace and lifecycle state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brummer_adapters::provider::GenerateOptions;
use brummer_core::clock::{Clock, SystemClock};
use brummer_core::coder::CoderOp;
use brummer_core::event::CoderEventPayload;
use brummer_core::id::UuidIdGen;
use brummer_core::{Coder, CoderId, CoderRequest, CoderState, CoreError, Event, IdGen};
use parking_lot::RwLock;
use tracing::warn;

use crate::config::CoderManagerConfig;
use crate::event_bus::EventBus;
use crate::provider_registry::ProviderRegistry;
use crate::workspace::WorkspaceManager;

/// Delay between a `Start` transition firing its event and the provider
/// call actually being dispatched, giving observers of `ai_coder_started`
/// a beat to settle before `ai_coder_completed`/`ai_coder_failed` can
/// follow (spec §4.1, §8).
const START_SETTLE_WINDOW: Duration = Duration::from_millis(50);

/// Owns every managed [`Coder`] plus the provider registry and workspace
/// allocator it delegates to (spec §4.1).
pub struct CoderManager {
    config: CoderManagerConfig,
    workspace: WorkspaceManager,
    providers: Arc<ProviderRegistry>,
    event_bus: Arc<EventBus>,
    id_gen: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
    coders: RwLock<HashMap<CoderId, Arc<RwLock<Coder>>>>,
}

impl CoderManager {
    pub fn new(config: CoderManagerConfig, providers: Arc<ProviderRegistry>, event_bus: Arc<EventBus>) -> Arc<Self> {
        Self::with_clock_and_ids(config, providers, event_bus, Arc::new(SystemClock), Arc::new(UuidIdGen))
    }

    pub fn with_clock_and_ids(
        config: CoderManagerConfig,
        providers: Arc<ProviderRegistry>,
        event_bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
    ) -> Arc<Self> {
        let workspace = WorkspaceManager::new(config.workspace_base_dir.clone());
        Arc::new(Self {
            config,
            workspace,
            providers,
            event_bus,
            id_gen,
            clock,
            coders: RwLock::new(HashMap::new()),
        })
    }

    fn active_count(&self) -> usize {
        self.coders
            .read()
            .values()
            .filter(|c| {
                let state = c.read().state;
                !state.is_terminal() && state != CoderState::Stopped
            })
            .count()
    }

    /// Allocates a workspace and registers a new coder in `Creating`
    /// state (spec §4.1's `Create`). Fails `ConcurrencyLimit` if
    /// `max_concurrent` non-terminal coders are already tracked, or
    /// `UnknownProvider` if `request.provider` names an unregistered one.
    /// A workspace that partially initializes is cleaned up before the
    /// error is returned.
    pub fn create(self: &Arc<Self>, request: CoderRequest) -> Result<Coder, CoreError> {
        if self.active_count() >= self.config.max_concurrent {
            return Err(CoreError::ConcurrencyLimit {
                max: self.config.max_concurrent,
            });
        }

        let provider_name = request
            .provider
            .clone()
            .unwrap_or_else(|| self.config.default_provider.clone());
        if !self.providers.contains(&provider_name) {
            return Err(CoreError::UnknownProvider(provider_name));
        }

        let id = CoderId::new(self.id_gen.next_id());
        let now = self.clock.now();

        let workspace_root = match self
            .workspace
            .init_workspace(&id, &now.to_rfc3339(), &request.workspace_files)
        {
            Ok(root) => root,
            Err(err) => {
                let root = self.workspace.workspace_root(&id);
                let _ = self.workspace.cleanup_workspace(&root);
                return Err(err);
            }
        };

        let coder = Coder {
            id: id.clone(),
            name: request.name,
            provider: provider_name,
            workspace_root,
            state: CoderState::Creating,
            created_at: now,
            updated_at: now,
            task: request.task,
            progress: 0.0,
            status_message: None,
            session_tag: id.to_string(),
            attached_ui_count: 0,
        };

        self.coders.write().insert(id, Arc::new(RwLock::new(coder.clone())));
        self.emit(Event::CoderCreated(self.payload(&coder, None)));
        Ok(coder)
    }

    pub fn get(&self, id: &CoderId) -> Result<Coder, CoreError> {
        self.coders
            .read()
            .get(id)
            .map(|record| record.read().clone())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<Coder> {
        self.coders.read().values().map(|record| record.read().clone()).collect()
    }

    pub fn register_provider(&self, name: impl Into<String>, provider: Arc<dyn brummer_adapters::Provider>) -> Result<(), CoreError> {
        self.providers.register(name, provider)
    }

    /// Transitions to `Running`, then dispatches the provider call in the
    /// background after [`START_SETTLE_WINDOW`] (spec §4.1, §8).
    pub fn start(self: &Arc<Self>, id: &CoderId) -> Result<(), CoreError> {
        let coder = self.apply_transition(id, CoderOp::Start)?;

        let manager = Arc::clone(self);
        let id = id.clone();
        let provider_name = coder.provider.clone();
        let task = coder.task.clone();
        tokio::spawn(async move {
            tokio::time::sleep(START_SETTLE_WINDOW).await;
            manager.run_provider_call(&id, &provider_name, &task).await;
        });

        Ok(())
    }

    async fn run_provider_call(self: &Arc<Self>, id: &CoderId, provider_name: &str, task: &str) {
        let provider = match self.providers.get(provider_name) {
            Ok(provider) => provider,
            Err(err) => {
                self.mark_failed(id, err.to_string());
                return;
            }
        };

        match provider.generate_code(task, &GenerateOptions::default()).await {
            Ok(result) => self.mark_completed(id, result.summary),
            Err(err) => self.mark_failed(id, err.to_string()),
        }
    }

    fn mark_completed(self: &Arc<Self>, id: &CoderId, summary: String) {
        if let Err(err) = self.apply_transition_with(id, CoderOp::Complete, |coder| {
            coder.set_progress(1.0);
            coder.status_message = Some(summary);
        }) {
            warn!(coder_id = %id, error = %err, "failed to mark coder completed");
        }
    }

    fn mark_failed(self: &Arc<Self>, id: &CoderId, message: String) {
        if let Err(err) = self.apply_transition_with(id, CoderOp::Fail, |coder| {
            coder.status_message = Some(message);
        }) {
            warn!(coder_id = %id, error = %err, "failed to mark coder failed");
        }
    }

    pub fn pause(self: &Arc<Self>, id: &CoderId) -> Result<(), CoreError> {
        self.apply_transition(id, CoderOp::Pause)?;
        Ok(())
    }

    pub fn resume(self: &Arc<Self>, id: &CoderId) -> Result<(), CoreError> {
        self.apply_transition(id, CoderOp::Resume)?;
        Ok(())
    }

    pub fn stop(self: &Arc<Self>, id: &CoderId) -> Result<(), CoreError> {
        self.apply_transition(id, CoderOp::Stop)?;
        Ok(())
    }

    /// Sets `progress` (spec §3 permits non-monotonic progress, clamped to
    /// `[0, 1]`) and emits `ai_coder_progress`.
    pub fn update_progress(self: &Arc<Self>, id: &CoderId, progress: f32) -> Result<(), CoreError> {
        let record = self
            .coders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let coder = {
            let mut coder = record.write();
            coder.set_progress(progress);
            coder.updated_at = self.clock.now();
            coder.clone()
        };
        self.emit(Event::CoderProgress(self.payload(&coder, None)));
        Ok(())
    }

    pub fn update_task(self: &Arc<Self>, id: &CoderId, task: String) -> Result<(), CoreError> {
        let record = self
            .coders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let mut coder = record.write();
        coder.task = task;
        coder.updated_at = self.clock.now();
        Ok(())
    }

    /// Stops an active coder first, then removes its record and
    /// workspace (spec §4.1: "if active, Stop first; remove workspace,
    /// remove record, emit `coder_deleted`"). A workspace-removal
    /// failure is logged and swallowed rather than aborting the delete
    /// (spec §4.1, §7) — the record is removed and `ai_coder_deleted` is
    /// emitted regardless.
    pub fn delete(self: &Arc<Self>, id: &CoderId) -> Result<(), CoreError> {
        let record = self
            .coders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let mut coder = record.read().clone();
        if !coder.state.is_terminal() && coder.state != CoderState::Stopped {
            coder = self.apply_transition(id, CoderOp::Stop)?;
        }

        if let Err(err) = self.workspace.cleanup_workspace(&coder.workspace_root) {
            warn!(coder_id = %id, error = %err, "workspace cleanup failed during delete");
        }
        self.coders.write().remove(id);

        let payload = CoderEventPayload {
            coder_id: coder.id.clone(),
            coder_name: coder.name.clone(),
            status: coder.state,
            message: Some("deleted".to_string()),
            time: self.clock.now(),
            data: serde_json::Map::new(),
        };
        let _ = self.event_bus.publish(Event::CoderDeleted(payload));
        Ok(())
    }

    fn apply_transition(self: &Arc<Self>, id: &CoderId, op: CoderOp) -> Result<Coder, CoreError> {
        self.apply_transition_with(id, op, |_| {})
    }

    fn apply_transition_with(
        self: &Arc<Self>,
        id: &CoderId,
        op: CoderOp,
        mutate: impl FnOnce(&mut Coder),
    ) -> Result<Coder, CoreError> {
        let record = self
            .coders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let coder = {
            let mut coder = record.write();
            let next_state = coder.state.transition(op)?;
            coder.state = next_state;
            coder.updated_at = self.clock.now();
            mutate(&mut coder);
            coder.clone()
        };

        self.emit(self.event_for_op(op, self.payload(&coder, None)));
        Ok(coder)
    }

    fn payload(&self, coder: &Coder, message: Option<String>) -> CoderEventPayload {
        CoderEventPayload {
            coder_id: coder.id.clone(),
            coder_name: coder.name.clone(),
            status: coder.state,
            message: message.or_else(|| coder.status_message.clone()),
            time: coder.updated_at,
            data: serde_json::Map::new(),
        }
    }

    /// Maps the *requested operation*, not merely the destination state,
    /// onto its wire event: `Start` and `Resume` both land the coder in
    /// `Running`, but spec §6 requires distinct `ai_coder_started` /
    /// `ai_coder_resumed` tags, so the event is keyed on `op` rather than
    /// on `coder.state`.
    fn event_for_op(&self, op: CoderOp, payload: CoderEventPayload) -> Event {
        match op {
            CoderOp::Start => Event::CoderStarted(payload),
            CoderOp::Pause => Event::CoderPaused(payload),
            CoderOp::Resume => Event::CoderResumed(payload),
            CoderOp::Stop => Event::CoderStopped(payload),
            CoderOp::Complete => Event::CoderCompleted(payload),
            CoderOp::Fail => Event::CoderFailed(payload),
        }
    }

    fn emit(&self, event: Event) {
        let _ = self.event_bus.publish(event);
    }
}

#[cfg(test)]
#[path = "coder_manager_tests.rs"]
mod tests;
