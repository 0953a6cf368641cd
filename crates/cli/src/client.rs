// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for `brummerd`'s Unix-domain-socket protocol (spec §7).
//! One request per round trip; the CLI opens a fresh connection per
//! invocation rather than holding a persistent session.

use std::path::PathBuf;

use brummer_daemon::protocol::{self, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("brummerd is not running (no socket at {0}); start it with `brummerd`")]
    DaemonNotRunning(PathBuf),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("{0}")]
    Remote(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning(self.socket_path.clone()))?;

        let payload = protocol::encode(&request)?;
        protocol::write_message(&mut stream, &payload).await?;
        let response_bytes = protocol::read_message(&mut stream).await?;
        let response: Response = protocol::decode(&response_bytes)?;

        if let Response::Error(message) = response {
            return Err(ClientError::Remote(message));
        }
        Ok(response)
    }
}
