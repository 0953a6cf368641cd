// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PTY session mechanism (spec §4.4): real pseudo-terminal spawn via
//! `portable-pty`, VT emulation via `vt100`, a bounded raw-byte
//! scrollback, and the streaming-JSON line parser.

mod stream_json;

pub use stream_json::{StreamJsonParser, StreamJsonRender};

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

use brummer_core::session::PtySessionId;

/// Window size clamp floor (spec §8: "must clamp to the defaults (80,
/// 24)" when given non-positive dimensions).
pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;
/// Default bounded scrollback (spec §6: `pty.history_bytes_max`).
pub const DEFAULT_HISTORY_BYTES_MAX: usize = 10 * 1024 * 1024;
/// Read-loop chunk size (spec §4.4, §6: `pty.io_buffer_bytes`).
pub const IO_BUFFER_BYTES: usize = 4096;
/// Close() defers channel teardown by this long so in-flight readers and
/// writers can exit via cancellation first (spec §4.4, §9).
const CLOSE_DRAIN_DELAY: std::time::Duration = std::time::Duration::from_millis(100);
/// Capacity of the bounded input channel; a saturated channel surfaces
/// `BufferFull` to the caller rather than blocking (spec §5).
const INPUT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to spawn PTY: {0}")]
    Spawn(String),
    #[error("session is not active")]
    NotActive,
    #[error("input buffer is full")]
    BufferFull,
}

#[derive(Debug, Clone)]
pub struct PtySessionConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Caller-supplied additions; merged over `TERM`/`COLORTERM`/
    /// `COLUMNS`/`LINES` defaults (spec §4.4).
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub cols: u16,
    pub rows: u16,
}

impl PtySessionConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }

    /// True when any adjacent argument pair is `--output-format
    /// stream-json` (spec §4.4).
    fn is_stream_json_mode(&self) -> bool {
        self.args
            .windows(2)
            .any(|pair| pair[0] == "--output-format" && pair[1] == "stream-json")
    }
}

/// Notifications a session emits alongside its raw output (spec §4.4,
/// §6's wire event taxonomy). The PTY Manager forwards these onto the
/// outer event bus.
#[derive(Debug, Clone)]
pub enum PtyEvent {
    Output(Vec<u8>),
    Input(Vec<u8>),
    Resize { cols: u16, rows: u16 },
    Close { error: Option<String> },
    DataInject { label: String },
}

/// Cursor position and the textual content of each visible row, a
/// lightweight copy of the VT emulator's screen (spec §4.4's
/// `GetTerminal`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSnapshot {
    pub rows: Vec<String>,
    pub cursor_row: u16,
    pub cursor_col: u16,
}

struct SharedState {
    active: AtomicBool,
    full_screen: AtomicBool,
    debug: AtomicBool,
    parser: Mutex<vt100::Parser>,
    history: Mutex<VecDeque<u8>>,
    history_max: usize,
    stream_json: Option<Mutex<StreamJsonParser>>,
    pty_master: Mutex<Box<dyn MasterPty + Send>>,
    pty_writer: Mutex<Box<dyn Write + Send>>,
    child: Mutex<Box<dyn Child + Send>>,
    close_notify: Notify,
}

/// A child process attached to a pseudo-terminal, with VT emulation and a
/// structured event stream (spec §3, §4.4).
pub struct PtySession {
    pub session_id: PtySessionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    state: Arc<SharedState>,
    input_tx: mpsc::Sender<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<PtyEvent>,
}

/// Returned once from [`PtySession::spawn`]; the output and event
/// channels are each consumed by exactly one reader.
pub struct PtyChannels {
    pub output_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pub event_rx: mpsc::UnboundedReceiver<PtyEvent>,
}

impl PtySession {
    pub fn spawn(
        session_id: PtySessionId,
        config: PtySessionConfig,
        history_max: usize,
    ) -> Result<(Self, PtyChannels), PtyError> {
        let stream_json_mode = config.is_stream_json_mode();
        let cols = clamp_dimension(config.cols, DEFAULT_COLS);
        let rows = clamp_dimension(config.rows, DEFAULT_ROWS);

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Spawn(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&config.command);
        for arg in &config.args {
            cmd.arg(arg);
        }
        if let Some(cwd) = &config.cwd {
            cmd.cwd(cwd);
        }
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        cmd.env("COLUMNS", cols.to_string());
        cmd.env("LINES", rows.to_string());
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn(e.to_string()))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Spawn(e.to_string()))?;

        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);

        let state = Arc::new(SharedState {
            active: AtomicBool::new(true),
            full_screen: AtomicBool::new(false),
            debug: AtomicBool::new(false),
            parser: Mutex::new(vt100::Parser::new(rows, cols, 0)),
            history: Mutex::new(VecDeque::new()),
            history_max,
            stream_json: stream_json_mode.then(|| Mutex::new(StreamJsonParser::new())),
            pty_master: Mutex::new(pair.master),
            pty_writer: Mutex::new(writer),
            child: Mutex::new(child),
            close_notify: Notify::new(),
        });

        spawn_read_loop(Arc::clone(&state), reader, output_tx, event_tx.clone());
        spawn_write_loop(Arc::clone(&state), input_rx, event_tx.clone());

        let session = Self {
            session_id,
            name: config.name,
            created_at: Utc::now(),
            state,
            input_tx,
            event_tx,
        };

        Ok((session, PtyChannels { output_rx, event_rx }))
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Non-blocking enqueue; returns `BufferFull` rather than waiting
    /// when the input channel is saturated (spec §4.4, §5).
    pub fn write_input(&self, bytes: Vec<u8>) -> Result<(), PtyError> {
        if !self.is_active() {
            return Err(PtyError::NotActive);
        }
        self.input_tx.try_send(bytes).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PtyError::BufferFull,
            mpsc::error::TrySendError::Closed(_) => PtyError::NotActive,
        })
    }

    /// Adjusts the PTY window and the VT emulator dimensions, clamping
    /// non-positive values to the 80x24 default first (spec §4.4, §8).
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        let cols = clamp_dimension(cols, DEFAULT_COLS);
        let rows = clamp_dimension(rows, DEFAULT_ROWS);

        self.state
            .pty_master
            .lock()
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        self.state.parser.lock().set_size(rows, cols);

        let _ = self.event_tx.send(PtyEvent::Resize { cols, rows });
        Ok(())
    }

    /// Formats `payload` with the data-injection banner and writes it as
    /// synthetic input (spec §4.4, §6).
    pub fn inject_data(&self, label: &str, payload: &str) -> Result<(), PtyError> {
        let banner = format!("\n\n\u{1F539} [BRUMMER] {label}\n{payload}\n");
        self.write_input(banner.into_bytes())?;
        let _ = self.event_tx.send(PtyEvent::DataInject {
            label: label.to_string(),
        });
        Ok(())
    }

    pub fn set_full_screen(&self, value: bool) {
        self.state.full_screen.store(value, Ordering::SeqCst);
    }

    pub fn set_debug_mode(&self, value: bool) {
        self.state.debug.store(value, Ordering::SeqCst);
        if let Some(stream_json) = &self.state.stream_json {
            stream_json.lock().set_debug_mode(value);
        }
    }

    pub fn is_debug_mode(&self) -> bool {
        self.state.debug.load(Ordering::SeqCst)
    }

    pub fn get_terminal(&self) -> TerminalSnapshot {
        let parser = self.state.parser.lock();
        let screen = parser.screen();
        let (rows, cols) = screen.size();
        let mut lines = Vec::with_capacity(rows as usize);
        for row in 0..rows {
            lines.push(screen.contents_between(row, 0, row, cols));
        }
        let (cursor_row, cursor_col) = screen.cursor_position();
        TerminalSnapshot {
            rows: lines,
            cursor_row,
            cursor_col,
        }
    }

    /// Snapshot copy of the bounded scrollback (spec §4.4, §8).
    pub fn get_output_history(&self) -> Vec<u8> {
        self.state.history.lock().iter().copied().collect()
    }

    pub fn is_at_start_of_line(&self) -> bool {
        self.state.parser.lock().screen().cursor_position().1 == 0
    }

    pub fn get_current_line_content(&self) -> String {
        let parser = self.state.parser.lock();
        let screen = parser.screen();
        let (row, _) = screen.cursor_position();
        let (_, cols) = screen.size();
        screen.contents_between(row, 0, row, cols)
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state.child.lock().try_wait(), Ok(None))
    }

    /// Idempotent. Marks the session inactive immediately, then after a
    /// short delay (so the read/write loops can observe `active` and
    /// exit cleanly) kills the child and drops the PTY handle (spec
    /// §4.4, §8, §9).
    pub async fn close(&self) {
        if self.state.active.swap(false, Ordering::SeqCst) {
            self.state.close_notify.notify_waiters();
            tokio::time::sleep(CLOSE_DRAIN_DELAY).await;
            let mut child = self.state.child.lock();
            if matches!(child.try_wait(), Ok(None)) {
                let _ = child.kill();
            }
        }
    }
}

fn clamp_dimension(value: u16, default: u16) -> u16 {
    if value == 0 {
        default
    } else {
        value
    }
}

/// Synchronous reader thread: blocking PTY reads can't live on the tokio
/// runtime, and the loop runs for the session's entire lifetime, so a
/// dedicated OS thread is used instead of `spawn_blocking`.
fn spawn_read_loop(
    state: Arc<SharedState>,
    mut reader: Box<dyn std::io::Read + Send>,
    output_tx: mpsc::UnboundedSender<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<PtyEvent>,
) {
    std::thread::spawn(move || {
        let mut buf = [0u8; IO_BUFFER_BYTES];
        loop {
            if !state.active.load(Ordering::SeqCst) {
                break;
            }
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = &buf[..n];
                    append_history(&state, chunk);

                    if let Some(stream_json) = &state.stream_json {
                        let rendered = stream_json.lock().feed(chunk);
                        if !rendered.is_empty() {
                            state.parser.lock().process(rendered.as_bytes());
                        }
                    } else {
                        state.parser.lock().process(chunk);
                    }

                    if output_tx.send(chunk.to_vec()).is_err() {
                        break;
                    }
                    if event_tx.send(PtyEvent::Output(chunk.to_vec())).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(err) => {
                    debug!(error = %err, "pty read loop exiting on error");
                    let _ = event_tx.send(PtyEvent::Close {
                        error: Some(err.to_string()),
                    });
                    state.active.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    });
}

fn append_history(state: &SharedState, chunk: &[u8]) {
    let mut history = state.history.lock();
    history.extend(chunk.iter().copied());
    while history.len() > state.history_max {
        history.pop_front();
    }
}

fn spawn_write_loop(
    state: Arc<SharedState>,
    mut input_rx: mpsc::Receiver<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<PtyEvent>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_bytes = input_rx.recv() => {
                    let Some(bytes) = maybe_bytes else { break };
                    let state = Arc::clone(&state);
                    let write_result = tokio::task::spawn_blocking({
                        let bytes = bytes.clone();
                        move || state.pty_writer.lock().write_all(&bytes)
                    })
                    .await;

                    match write_result {
                        Ok(Ok(())) => {
                            let _ = event_tx.send(PtyEvent::Input(bytes));
                        }
                        Ok(Err(err)) => {
                            warn!(error = %err, "pty write loop exiting on error");
                            let _ = event_tx.send(PtyEvent::Close { error: Some(err.to_string()) });
                            break;
                        }
                        Err(join_err) => {
                            warn!(error = %join_err, "pty write task panicked");
                            break;
                        }
                    }
                }
                _ = state.close_notify.notified() => break,
            }
        }
    });
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
