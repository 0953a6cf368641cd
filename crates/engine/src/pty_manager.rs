// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PTY Manager (spec §4.4, C2): owns the set of live [`PtySession`]s,
//! tracks which one is "current" for a terminal UI, and relays each
//! session's event stream onto the outer [`EventBus`]. A per-session
//! monitor task also runs the auto-injection pattern analyzer: in debug
//! mode, output matching a known error/test/build keyword schedules a
//! data injection back into that same session a beat later.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brummer_adapters::pty::{PtyError, PtyEvent, PtySession, PtySessionConfig};
use brummer_core::event::PtyEventPayload;
use brummer_core::{CoreError, Event, IdGen, PtySessionId};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::PtyManagerConfig;
use crate::data_provider::{matches_any_keyword, DataInjector, DataProvider, InjectLabel};
use crate::event_bus::EventBus;

/// Delay between an auto-injection trigger and the injection itself, so
/// the triggering output has a chance to finish printing first (spec
/// §4.4, §8).
const AUTO_INJECT_DELAY: Duration = Duration::from_millis(100);

const ERROR_KEYWORDS: &[&str] = &["error:", "failed", "exception"];
const TEST_FAILURE_KEYWORDS: &[&str] = &["test failed", "fail:", "\u{2717}", "\u{274c}"];
const BUILD_FAILURE_KEYWORDS: &[&str] = &["build failed", "compilation error", "compile error"];

/// Which auto-injection class, if any, a chunk of output matches (spec
/// §4.4's keyword table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoInjectTrigger {
    Error,
    TestFailure,
    BuildFailure,
}

fn classify_output(text: &str) -> Option<AutoInjectTrigger> {
    if matches_any_keyword(text, TEST_FAILURE_KEYWORDS) {
        Some(AutoInjectTrigger::TestFailure)
    } else if matches_any_keyword(text, BUILD_FAILURE_KEYWORDS) {
        Some(AutoInjectTrigger::BuildFailure)
    } else if matches_any_keyword(text, ERROR_KEYWORDS) {
        Some(AutoInjectTrigger::Error)
    } else {
        None
    }
}

#[derive(Default)]
struct SessionTable {
    by_id: HashMap<PtySessionId, Arc<PtySession>>,
    /// Creation order, used for `NextSession`/`PreviousSession` wraparound
    /// (spec §4.4, §8).
    order: Vec<PtySessionId>,
}

/// Owns every live PTY session plus the "current" pointer a terminal UI
/// follows (spec §4.4).
pub struct PtyManager {
    config: PtyManagerConfig,
    event_bus: Arc<EventBus>,
    data_provider: Arc<dyn DataProvider>,
    id_gen: Arc<dyn IdGen>,
    sessions: RwLock<SessionTable>,
    current: RwLock<Option<PtySessionId>>,
}

impl PtyManager {
    pub fn new(
        config: PtyManagerConfig,
        event_bus: Arc<EventBus>,
        data_provider: Arc<dyn DataProvider>,
        id_gen: Arc<dyn IdGen>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            event_bus,
            data_provider,
            id_gen,
            sessions: RwLock::new(SessionTable::default()),
            current: RwLock::new(None),
        })
    }

    /// Spawns a new session inheriting the caller's environment as-is
    /// (spec §4.4's `CreateSession`).
    pub fn create_session(self: &Arc<Self>, mut config: PtySessionConfig) -> Result<PtySessionId, PtyError> {
        if config.env.is_empty() {
            config.env = std::env::vars().collect();
        }
        self.spawn_and_track(config)
    }

    /// Spawns a new session with `overrides` merged over the caller's
    /// environment, `${VAR}` references expanded first (spec §4.4's
    /// `CreateSessionWithEnv`).
    pub fn create_session_with_env(
        self: &Arc<Self>,
        mut config: PtySessionConfig,
        overrides: Vec<(String, String)>,
    ) -> Result<PtySessionId, PtyError> {
        let base: Vec<(String, String)> = std::env::vars().collect();
        let expanded: Vec<(String, String)> = overrides
            .into_iter()
            .map(|(key, value)| (key, brummer_adapters::env::expand_vars(&value, &base)))
            .collect();
        config.env = brummer_adapters::env::merge_env(&base, &expanded);
        self.spawn_and_track(config)
    }

    fn spawn_and_track(self: &Arc<Self>, config: PtySessionConfig) -> Result<PtySessionId, PtyError> {
        let session_id = PtySessionId::new(self.id_gen.next_id());
        let (session, channels) = PtySession::spawn(session_id.clone(), config, self.config.history_bytes_max)?;
        let session = Arc::new(session);

        {
            let mut sessions = self.sessions.write();
            sessions.by_id.insert(session_id.clone(), Arc::clone(&session));
            sessions.order.push(session_id.clone());
        }
        if self.current.read().is_none() {
            *self.current.write() = Some(session_id.clone());
        }

        self.spawn_monitor(session_id.clone(), channels);

        let payload = PtyEventPayload::new(session_id.clone(), chrono::Utc::now());
        let _ = self.event_bus.publish(Event::PtySessionCreated(payload));

        Ok(session_id)
    }

    fn spawn_monitor(
        self: &Arc<Self>,
        session_id: PtySessionId,
        mut channels: brummer_adapters::pty::PtyChannels,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    chunk = channels.output_rx.recv() => {
                        let Some(chunk) = chunk else { break };
                        manager.on_output(&session_id, &chunk);
                    }
                    event = channels.event_rx.recv() => {
                        let Some(event) = event else { break };
                        if manager.on_pty_event(&session_id, event) {
                            break;
                        }
                    }
                }
            }
            debug!(session_id = %session_id, "pty session monitor exiting");
        });
    }

    fn on_output(self: &Arc<Self>, session_id: &PtySessionId, chunk: &[u8]) {
        let payload = PtyEventPayload {
            bytes: Some(chunk.to_vec()),
            ..PtyEventPayload::new(session_id.clone(), chrono::Utc::now())
        };
        let _ = self.event_bus.publish(Event::Output(payload));

        let Some(session) = self.get_session(session_id) else {
            return;
        };
        if !session.is_debug_mode() {
            return;
        }
        let text = String::from_utf8_lossy(chunk);
        if let Some(trigger) = classify_output(&text) {
            let manager = Arc::clone(self);
            let session_id = session_id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(AUTO_INJECT_DELAY).await;
                let label = match trigger {
                    AutoInjectTrigger::Error => InjectLabel::LastError,
                    AutoInjectTrigger::TestFailure => InjectLabel::TestFailure,
                    AutoInjectTrigger::BuildFailure => InjectLabel::BuildOutput,
                };
                if let Err(err) = manager.inject_data_to_session(&session_id, label) {
                    warn!(session_id = %session_id, error = %err, "auto-injection failed");
                }
            });
        }
    }

    /// Returns `true` when the monitor loop should stop (the session
    /// closed).
    fn on_pty_event(self: &Arc<Self>, session_id: &PtySessionId, event: PtyEvent) -> bool {
        let time = chrono::Utc::now();
        match event {
            PtyEvent::Input(bytes) => {
                let payload = PtyEventPayload {
                    bytes: Some(bytes),
                    ..PtyEventPayload::new(session_id.clone(), time)
                };
                let _ = self.event_bus.publish(Event::Input(payload));
                false
            }
            PtyEvent::Resize { .. } => {
                let payload = PtyEventPayload::new(session_id.clone(), time);
                let _ = self.event_bus.publish(Event::Resize(payload));
                false
            }
            PtyEvent::DataInject { label } => {
                let payload = PtyEventPayload {
                    label: Some(label),
                    ..PtyEventPayload::new(session_id.clone(), time)
                };
                let _ = self.event_bus.publish(Event::DataInject(payload));
                false
            }
            PtyEvent::Close { error } => {
                let payload = PtyEventPayload {
                    error,
                    ..PtyEventPayload::new(session_id.clone(), time)
                };
                self.remove_session(session_id);
                let _ = self.event_bus.publish(Event::PtySessionClosed(payload));
                true
            }
            PtyEvent::Output(_) => false,
        }
    }

    fn remove_session(&self, session_id: &PtySessionId) {
        let mut sessions = self.sessions.write();
        sessions.by_id.remove(session_id);
        sessions.order.retain(|id| id != session_id);
        drop(sessions);

        let mut current = self.current.write();
        if current.as_ref() == Some(session_id) {
            *current = self.sessions.read().order.first().cloned();
        }
    }

    pub fn get_session(&self, session_id: &PtySessionId) -> Option<Arc<PtySession>> {
        self.sessions.read().by_id.get(session_id).cloned()
    }

    pub fn get_current_session(&self) -> Option<Arc<PtySession>> {
        let current = self.current.read().clone()?;
        self.get_session(&current)
    }

    /// Fails with `NotFound` and leaves the current pointer untouched
    /// when `session_id` is unknown (spec §8).
    pub fn set_current_session(self: &Arc<Self>, session_id: &PtySessionId) -> Result<(), CoreError> {
        if !self.sessions.read().by_id.contains_key(session_id) {
            return Err(CoreError::NotFound(session_id.to_string()));
        }
        *self.current.write() = Some(session_id.clone());
        let payload = PtyEventPayload::new(session_id.clone(), chrono::Utc::now());
        let _ = self.event_bus.publish(Event::PtySessionFocused(payload));
        Ok(())
    }

    fn step_session(self: &Arc<Self>, forward: bool) -> Option<PtySessionId> {
        let sessions = self.sessions.read();
        if sessions.order.is_empty() {
            return None;
        }
        let current = self.current.read().clone();
        let next_id = match current.and_then(|id| sessions.order.iter().position(|s| *s == id)) {
            Some(index) => {
                let len = sessions.order.len();
                let next_index = if forward {
                    (index + 1) % len
                } else {
                    (index + len - 1) % len
                };
                sessions.order[next_index].clone()
            }
            None => sessions.order[0].clone(),
        };
        drop(sessions);
        *self.current.write() = Some(next_id.clone());
        let payload = PtyEventPayload::new(next_id.clone(), chrono::Utc::now());
        let _ = self.event_bus.publish(Event::PtySessionSwitched(payload));
        Some(next_id)
    }

    pub fn next_session(self: &Arc<Self>) -> Option<PtySessionId> {
        self.step_session(true)
    }

    pub fn previous_session(self: &Arc<Self>) -> Option<PtySessionId> {
        self.step_session(false)
    }

    pub async fn close_session(self: &Arc<Self>, session_id: &PtySessionId) -> Result<(), CoreError> {
        let session = self
            .get_session(session_id)
            .ok_or_else(|| CoreError::NotFound(session_id.to_string()))?;
        session.close().await;
        self.remove_session(session_id);
        let payload = PtyEventPayload::new(session_id.clone(), chrono::Utc::now());
        let _ = self.event_bus.publish(Event::PtySessionClosed(payload));
        Ok(())
    }

    /// Closes every session, returning the last error encountered (spec
    /// §4.4: "CloseAllSessions — closes all; returns the last error
    /// encountered").
    pub async fn close_all_sessions(self: &Arc<Self>) -> Result<(), CoreError> {
        let ids: Vec<PtySessionId> = self.sessions.read().order.clone();
        let mut last_err = None;
        for id in ids {
            if let Err(err) = self.close_session(&id).await {
                last_err = Some(err);
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn inject_data_to_current(self: &Arc<Self>, kind: InjectLabel) -> Result<(), CoreError> {
        let session_id = self
            .current
            .read()
            .clone()
            .ok_or_else(|| CoreError::NotFound("no current pty session".to_string()))?;
        self.inject_data_to_session(&session_id, kind)
    }

    /// Resolves `kind` against the data provider's matching getter, then
    /// delegates the formatted payload to the session (spec §4.4, §4.6's
    /// type \u{2192} getter table).
    pub fn inject_data_to_session(&self, session_id: &PtySessionId, kind: InjectLabel) -> Result<(), CoreError> {
        let session = self
            .get_session(session_id)
            .ok_or_else(|| CoreError::NotFound(session_id.to_string()))?;
        let injector = DataInjector::default();

        let payload = match kind {
            InjectLabel::LastError | InjectLabel::Error => self
                .data_provider
                .get_last_error()
                .map(|ctx| injector.format_error_context(&ctx)),
            InjectLabel::RecentLogs => {
                let logs = self.data_provider.get_recent_logs(20);
                (!logs.is_empty()).then(|| injector.format_recent_logs(&logs))
            }
            InjectLabel::TestFailure => {
                let failures = self.data_provider.get_test_failures();
                (!failures.is_empty()).then(|| injector.format_test_failures(&failures))
            }
            InjectLabel::BuildOutput => {
                let output = self.data_provider.get_build_output();
                (!output.is_empty()).then(|| injector.format_build_output(&output))
            }
            InjectLabel::ProcessInfo => Some(injector.format_process_info(&self.data_provider.get_process_info())),
            InjectLabel::DetectedUrls => {
                let urls = self.data_provider.get_detected_urls();
                (!urls.is_empty()).then(|| injector.format_detected_urls(&urls))
            }
            InjectLabel::ProxyRequest => self
                .data_provider
                .get_recent_proxy_requests(1)
                .first()
                .map(|req| injector.format_proxy_request(req)),
            InjectLabel::SystemMessage | InjectLabel::Data => None,
        };

        let Some(payload) = payload else {
            return Ok(());
        };

        session
            .inject_data(kind.as_str(), &payload)
            .map_err(|err| CoreError::WorkspaceIo(err.to_string()))
    }

    pub fn session_ids(&self) -> Vec<PtySessionId> {
        self.sessions.read().order.clone()
    }
}

#[cfg(test)]
#[path = "pty_manager_tests.rs"]
mod tests;
