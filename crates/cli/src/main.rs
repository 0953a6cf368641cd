// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `brummer`: thin command-line client for a running `brummerd`. Opens
//! one connection per invocation and round-trips a single request (spec
//! §7's wire protocol); it holds no state of its own.

mod client;
mod output;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use brummer_core::{CoderId, CoderRequest, PtySessionId};
use brummer_daemon::protocol::{Request, Response};
use clap::{Parser, Subcommand};
use client::DaemonClient;

#[derive(Parser)]
#[command(name = "brummer", version, about = "Control client for brummerd")]
struct Cli {
    /// Path to the daemon's control socket (defaults to the daemon's
    /// configured state directory).
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// AI-coder session management
    #[command(subcommand)]
    Coder(CoderCommand),
    /// Interactive PTY session management
    #[command(subcommand)]
    Pty(PtyCommand),
    /// List supervisor instances discovered on this machine
    Instances,
    /// Check that brummerd is reachable
    Ping,
}

#[derive(Subcommand)]
enum CoderCommand {
    /// Create a new coder
    Create {
        /// Display name
        name: String,
        /// Task description given to the provider
        #[arg(long)]
        task: String,
        /// Provider name (defaults to the daemon's configured default)
        #[arg(long)]
        provider: Option<String>,
        /// Workspace files to seed with stubs
        #[arg(long = "file")]
        workspace_files: Vec<String>,
    },
    /// Show one coder
    Get { id: String },
    /// List all coders
    List,
    /// Start a coder
    Start { id: String },
    /// Pause a running coder
    Pause { id: String },
    /// Resume a paused coder
    Resume { id: String },
    /// Stop a coder
    Stop { id: String },
    /// Delete a coder and its workspace
    Delete { id: String },
    /// Update a coder's task description
    UpdateTask { id: String, task: String },
}

#[derive(Subcommand)]
enum PtyCommand {
    /// Start a new PTY session
    Create {
        name: String,
        command: String,
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// List PTY session ids
    List,
    /// Show the currently focused session, if any
    Current,
    /// Focus a session by id
    SetCurrent { id: String },
    /// Advance focus to the next session
    Next,
    /// Move focus to the previous session
    Previous,
    /// Close a session
    Close { id: String },
    /// Write raw bytes (read from stdin if `--stdin`, otherwise the text argument) to a session
    Write {
        id: String,
        #[arg(long)]
        stdin: bool,
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let socket_path = match cli.socket {
        Some(path) => path,
        None => brummer_daemon::Config::load()?.socket_path,
    };
    let client = DaemonClient::new(socket_path);

    match cli.command {
        Commands::Ping => {
            match client.send(Request::Ping).await? {
                Response::Pong => println!("pong"),
                _ => return Err(anyhow!("unexpected response to ping")),
            }
            Ok(())
        }
        Commands::Instances => {
            match client.send(Request::ListInstances).await? {
                Response::Instances(instances) => output::print_instances(&instances),
                _ => return Err(anyhow!("unexpected response")),
            }
            Ok(())
        }
        Commands::Coder(cmd) => handle_coder(&client, cmd).await,
        Commands::Pty(cmd) => handle_pty(&client, cmd).await,
    }
}

async fn handle_coder(client: &DaemonClient, cmd: CoderCommand) -> Result<()> {
    match cmd {
        CoderCommand::Create { name, task, provider, workspace_files } => {
            let request = Request::CreateCoder(CoderRequest { provider, name, task, workspace_files });
            match client.send(request).await? {
                Response::Coder(coder) => output::print_coder(&coder),
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        CoderCommand::Get { id } => {
            match client.send(Request::GetCoder(CoderId::new(id))).await? {
                Response::Coder(coder) => output::print_coder(&coder),
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        CoderCommand::List => {
            match client.send(Request::ListCoders).await? {
                Response::Coders(coders) => output::print_coders(&coders),
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        CoderCommand::Start { id } => {
            expect_ack(client.send(Request::StartCoder(CoderId::new(id))).await?)?;
        }
        CoderCommand::Pause { id } => {
            expect_ack(client.send(Request::PauseCoder(CoderId::new(id))).await?)?;
        }
        CoderCommand::Resume { id } => {
            expect_ack(client.send(Request::ResumeCoder(CoderId::new(id))).await?)?;
        }
        CoderCommand::Stop { id } => {
            expect_ack(client.send(Request::StopCoder(CoderId::new(id))).await?)?;
        }
        CoderCommand::Delete { id } => {
            expect_ack(client.send(Request::DeleteCoder(CoderId::new(id))).await?)?;
        }
        CoderCommand::UpdateTask { id, task } => {
            expect_ack(client.send(Request::UpdateCoderTask { id: CoderId::new(id), task }).await?)?;
        }
    }
    Ok(())
}

async fn handle_pty(client: &DaemonClient, cmd: PtyCommand) -> Result<()> {
    match cmd {
        PtyCommand::Create { name, command, args } => {
            match client.send(Request::CreatePtySession { name, command, args }).await? {
                Response::PtySessionId(id) => println!("{id}"),
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        PtyCommand::List => {
            match client.send(Request::ListPtySessions).await? {
                Response::PtySessionIds(ids) => {
                    for id in ids {
                        println!("{id}");
                    }
                }
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        PtyCommand::Current => {
            match client.send(Request::CurrentPtySession).await? {
                Response::MaybePtySessionId(Some(id)) => println!("{id}"),
                Response::MaybePtySessionId(None) => println!("no current session"),
                _ => return Err(anyhow!("unexpected response")),
            }
        }
        PtyCommand::SetCurrent { id } => {
            expect_ack(client.send(Request::SetCurrentPtySession(PtySessionId::new(id))).await?)?;
        }
        PtyCommand::Next => print_maybe_session(client.send(Request::NextPtySession).await?)?,
        PtyCommand::Previous => print_maybe_session(client.send(Request::PreviousPtySession).await?)?,
        PtyCommand::Close { id } => {
            expect_ack(client.send(Request::ClosePtySession(PtySessionId::new(id))).await?)?;
        }
        PtyCommand::Write { id, stdin, text } => {
            let bytes = if stdin {
                use std::io::Read;
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            } else {
                text.ok_or_else(|| anyhow!("either pass text or --stdin"))?.into_bytes()
            };
            expect_ack(client.send(Request::WriteInput { session_id: PtySessionId::new(id), bytes }).await?)?;
        }
    }
    Ok(())
}

fn expect_ack(response: Response) -> Result<()> {
    match response {
        Response::Ack => {
            println!("ok");
            Ok(())
        }
        _ => Err(anyhow!("unexpected response")),
    }
}

fn print_maybe_session(response: Response) -> Result<()> {
    match response {
        Response::MaybePtySessionId(Some(id)) => {
            println!("{id}");
            Ok(())
        }
        Response::MaybePtySessionId(None) => {
            println!("no sessions");
            Ok(())
        }
        _ => Err(anyhow!("unexpected response")),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
