// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon/CLI wire protocol (spec §7): a 4-byte big-endian length prefix
//! followed by a JSON payload, covering Brummer's coder/pty/discovery
//! request-response pairs.

use std::time::Duration;

use brummer_core::{Coder, CoderId, CoderRequest, InstanceRecord, PtySessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

/// No single instance record set or coder roster should exceed this; a
/// larger frame almost certainly means a corrupted length prefix (spec
/// §7, §9).
pub const MAX_MESSAGE_SIZE: u32 = 64 * 1024 * 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {0} bytes exceeds the {1} byte limit")]
    MessageTooLarge(u32, u32),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("operation timed out")]
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    CreateCoder(CoderRequest),
    GetCoder(CoderId),
    ListCoders,
    StartCoder(CoderId),
    PauseCoder(CoderId),
    ResumeCoder(CoderId),
    StopCoder(CoderId),
    DeleteCoder(CoderId),
    UpdateCoderTask { id: CoderId, task: String },
    CreatePtySession { name: String, command: String, args: Vec<String> },
    ListPtySessions,
    CurrentPtySession,
    SetCurrentPtySession(PtySessionId),
    NextPtySession,
    PreviousPtySession,
    ClosePtySession(PtySessionId),
    WriteInput { session_id: PtySessionId, bytes: Vec<u8> },
    ListInstances,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Coder(Coder),
    Coders(Vec<Coder>),
    PtySessionId(PtySessionId),
    PtySessionIds(Vec<PtySessionId>),
    MaybePtySessionId(Option<PtySessionId>),
    Instances(Vec<InstanceRecord>),
    Ack,
    Pong,
    Error(String),
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads one length-prefixed frame: a 4-byte big-endian length, then
/// exactly that many bytes (spec §7).
pub async fn read_message(stream: &mut (impl tokio::io::AsyncRead + Unpin)) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(err) => return Err(err.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
    }

    let mut payload = vec![0u8; len as usize];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

pub async fn write_message(
    stream: &mut (impl tokio::io::AsyncWrite + Unpin),
    payload: &[u8],
) -> Result<(), ProtocolError> {
    if payload.len() as u64 > MAX_MESSAGE_SIZE as u64 {
        return Err(ProtocolError::MessageTooLarge(payload.len() as u32, MAX_MESSAGE_SIZE));
    }
    stream.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn read_request(
    stream: &mut (impl tokio::io::AsyncRead + Unpin),
) -> Result<Request, ProtocolError> {
    let payload = timeout(DEFAULT_TIMEOUT, read_message(stream))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&payload)
}

pub async fn write_response(
    stream: &mut (impl tokio::io::AsyncWrite + Unpin),
    response: &Response,
) -> Result<(), ProtocolError> {
    let payload = encode(response)?;
    timeout(DEFAULT_TIMEOUT, write_message(stream, &payload))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
