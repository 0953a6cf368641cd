// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-domain-socket accept loop (spec §7): one task per connection,
//! each request handled to completion before the next is read off the
//! same connection. Routes decoded requests onto the engine components
//! constructed in `main`.

use std::sync::Arc;

use brummer_adapters::pty::PtySessionConfig;
use brummer_core::{CoreError, PtySessionId};
use brummer_engine::{CoderManager, DiscoveryRegistry, PtyManager};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::protocol::{self, ProtocolError, Request, Response};

/// Every component a connection handler needs to service a request.
/// Cloning is cheap: every field is an `Arc`.
#[derive(Clone)]
pub struct ListenCtx {
    pub coders: Arc<CoderManager>,
    pub pty: Arc<PtyManager>,
    pub discovery: Arc<DiscoveryRegistry>,
}

/// Owns the bound socket; `run` never returns until the listener is
/// dropped or the accept loop hits an unrecoverable error.
pub struct Listener {
    inner: UnixListener,
    ctx: ListenCtx,
}

impl Listener {
    pub fn bind(socket_path: &std::path::Path, ctx: ListenCtx) -> std::io::Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        let inner = UnixListener::bind(socket_path)?;
        Ok(Self { inner, ctx })
    }

    pub async fn run(self) {
        loop {
            match self.inner.accept().await {
                Ok((stream, _addr)) => {
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, ctx).await {
                            debug!(error = %err, "connection ended");
                        }
                    });
                }
                Err(err) => {
                    error!(error = %err, "failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, ctx: ListenCtx) -> Result<(), ProtocolError> {
    loop {
        let request = match protocol::read_request(&mut stream).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };

        let response = dispatch(&ctx, request).await;
        protocol::write_response(&mut stream, &response).await?;
    }
}

async fn dispatch(ctx: &ListenCtx, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::CreateCoder(req) => result_to_response(ctx.coders.create(req), Response::Coder),
        Request::GetCoder(id) => result_to_response(ctx.coders.get(&id), Response::Coder),
        Request::ListCoders => Response::Coders(ctx.coders.list()),
        Request::StartCoder(id) => ack_or_error(ctx.coders.start(&id)),
        Request::PauseCoder(id) => ack_or_error(ctx.coders.pause(&id)),
        Request::ResumeCoder(id) => ack_or_error(ctx.coders.resume(&id)),
        Request::StopCoder(id) => ack_or_error(ctx.coders.stop(&id)),
        Request::DeleteCoder(id) => ack_or_error(ctx.coders.delete(&id)),
        Request::UpdateCoderTask { id, task } => ack_or_error(ctx.coders.update_task(&id, task)),

        Request::CreatePtySession { name, command, args } => {
            let config = PtySessionConfig {
                args,
                ..PtySessionConfig::new(name, command)
            };
            match ctx.pty.create_session(config) {
                Ok(id) => Response::PtySessionId(id),
                Err(err) => Response::Error(err.to_string()),
            }
        }
        Request::ListPtySessions => Response::PtySessionIds(ctx.pty.session_ids()),
        Request::CurrentPtySession => {
            Response::MaybePtySessionId(ctx.pty.get_current_session().map(|s| s.session_id.clone()))
        }
        Request::SetCurrentPtySession(id) => ack_or_error(ctx.pty.set_current_session(&id)),
        Request::NextPtySession => Response::MaybePtySessionId(ctx.pty.next_session()),
        Request::PreviousPtySession => Response::MaybePtySessionId(ctx.pty.previous_session()),
        Request::ClosePtySession(id) => ack_or_error(ctx.pty.close_session(&id).await),
        Request::WriteInput { session_id, bytes } => write_pty_input(ctx, &session_id, bytes),

        Request::ListInstances => Response::Instances(ctx.discovery.list_instances()),
    }
}

fn write_pty_input(ctx: &ListenCtx, session_id: &PtySessionId, bytes: Vec<u8>) -> Response {
    let Some(session) = ctx.pty.get_session(session_id) else {
        return Response::Error(CoreError::NotFound(session_id.to_string()).to_string());
    };
    match session.write_input(bytes) {
        Ok(()) => Response::Ack,
        Err(err) => Response::Error(err.to_string()),
    }
}

fn result_to_response<T>(result: Result<T, CoreError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => Response::Error(err.to_string()),
    }
}

fn ack_or_error(result: Result<(), CoreError>) -> Response {
    match result {
        Ok(()) => Response::Ack,
        Err(err) => {
            warn!(error = %err, "request failed");
            Response::Error(err.to_string())
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
