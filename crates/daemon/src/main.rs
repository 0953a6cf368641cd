// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! brummerd: the background process that owns every engine component and
//! serves the `brummer` CLI over a Unix domain socket.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::io::Write;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::time::Duration;

use brummer_adapters::provider::{CliToolConfig, CliToolProvider, MockProvider};
use brummer_core::instance::ProcessInfo;
use brummer_core::InstanceRecord;
use brummer_daemon::config::Config;
use brummer_daemon::listener::{ListenCtx, Listener};
use brummer_engine::{CoderManager, DiscoveryRegistry, EventBus, InMemoryDataProvider, ProviderRegistry, PtyManager};
use fs2::FileExt;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How often the daemon re-pings its own instance record and sweeps
/// stale ones (spec §4.5's staleness sweep runs alongside self-reporting).
const PING_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    let lock_file = acquire_singleton_lock(&config)?;

    info!("starting brummerd");

    let event_bus = EventBus::new(None);

    let providers = Arc::new(ProviderRegistry::new());
    register_providers(&providers, &config.coder.default_provider);

    let coders = CoderManager::new(config.coder.clone(), Arc::clone(&providers), Arc::clone(&event_bus));
    let pty = PtyManager::new(
        config.pty,
        Arc::clone(&event_bus),
        Arc::new(InMemoryDataProvider::new()),
        Arc::new(brummer_core::id::UuidIdGen),
    );

    let discovery = DiscoveryRegistry::new(config.discovery.clone());
    discovery.start().await?;

    let self_record = self_instance_record()?;
    let control_listener = self_record.0;
    discovery.register_instance(self_record.1).await?;
    let instance_id = discovery
        .list_instances()
        .into_iter()
        .find(|r| r.process_info.pid == std::process::id() as i64)
        .map(|r| r.id)
        .unwrap_or_default();

    let listener = Listener::bind(
        &config.socket_path,
        ListenCtx {
            coders: Arc::clone(&coders),
            pty: Arc::clone(&pty),
            discovery: Arc::clone(&discovery),
        },
    )?;
    tokio::spawn(listener.run());

    spawn_ping_sweep(Arc::clone(&discovery), instance_id.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "brummerd ready");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    if let Err(err) = pty.close_all_sessions().await {
        warn!(error = %err, "error while closing pty sessions on shutdown");
    }
    if let Err(err) = discovery.unregister_instance(&instance_id).await {
        warn!(error = %err, "failed to unregister instance on shutdown");
    }
    discovery.stop();
    drop(control_listener);
    release_singleton_lock(lock_file, &config);

    info!("brummerd stopped");
    Ok(())
}

/// Registers a deterministic `mock` provider (used by tests and by
/// operators without a configured API key) plus a CLI-tool provider
/// under the configured default-provider name, shelling out to a binary
/// of the same name on `PATH` (spec §4.3, §6).
fn register_providers(providers: &Arc<ProviderRegistry>, default_provider: &str) {
    if let Err(err) = providers.register("mock", Arc::new(MockProvider::new())) {
        warn!(error = %err, "failed to register mock provider");
    }
    if default_provider != "mock" {
        let cli_provider = CliToolProvider::new(default_provider.to_string(), CliToolConfig {
            command: default_provider.to_string(),
            base_args: Vec::new(),
            flag_mapping: Default::default(),
            working_dir: None,
            environment: Vec::new(),
        });
        if let Err(err) = providers.register(default_provider.to_string(), Arc::new(cli_provider)) {
            warn!(error = %err, provider = default_provider, "failed to register default provider");
        }
    }
}

/// Binds an ephemeral loopback listener purely to claim a valid, unused
/// port for this daemon's instance record (spec §3 requires `port` in
/// `[1, 65535]`); brummerd serves nothing over it today. Held alive for
/// the process lifetime so the port can't be stolen out from under the
/// registration.
fn self_instance_record() -> Result<(StdTcpListener, InstanceRecord), Box<dyn std::error::Error>> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let now = chrono::Utc::now();

    let directory = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    let name = directory
        .rsplit(std::path::MAIN_SEPARATOR)
        .next()
        .unwrap_or("brummer")
        .to_string();

    let record = InstanceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        directory,
        port,
        started_at: now,
        last_ping: now,
        process_info: ProcessInfo {
            pid: std::process::id() as i64,
            executable: std::env::current_exe()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "brummerd".to_string()),
        },
    };

    Ok((listener, record))
}

fn spawn_ping_sweep(discovery: Arc<DiscoveryRegistry>, self_id: String) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PING_INTERVAL);
        loop {
            interval.tick().await;
            if !self_id.is_empty() {
                if let Err(err) = discovery.update_instance_ping(&self_id).await {
                    warn!(error = %err, "failed to refresh self instance ping");
                }
            }
            let removed = discovery.cleanup_stale_instances(pid_is_running).await;
            if !removed.is_empty() {
                info!(count = removed.len(), "swept stale instance records");
            }
        }
    });
}

/// `kill -0` sends no signal but reports whether the process exists and
/// is owned by us or root (spec §4.5's liveness check for the staleness
/// sweep).
fn pid_is_running(pid: i64) -> bool {
    if pid <= 0 {
        return false;
    }
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn acquire_singleton_lock(config: &Config) -> Result<std::fs::File, Box<dyn std::error::Error>> {
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(|err| {
        error!(error = %err, "brummerd is already running");
        err
    })?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

fn release_singleton_lock(lock_file: std::fs::File, config: &Config) {
    let _ = fs2::FileExt::unlock(&lock_file);
    drop(lock_file);
    let _ = std::fs::remove_file(&config.lock_path);
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let parent = config
        .log_path
        .parent()
        .ok_or("log path has no parent directory")?;
    std::fs::create_dir_all(parent)?;

    let file_name = config
        .log_path
        .file_name()
        .ok_or("log path has no file name")?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
