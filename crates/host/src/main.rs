// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jsvm-inspect - JSVM host with the inspector attached
//!
//! Runs an idle VM main thread that services inspector interrupts, so
//! DevTools frontends can discover and attach to it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use insp_adapters::{
    BackendFactory, DebuggerBackend, Environment, Interrupter, LoopEnvironment, NoOpBackend,
    TracedBackend,
};
use insp_agent::{find_available_port, port_range, Agent, AgentError, AgentOptions};
use insp_core::{ExclusiveAccess, HostPort, InspectPublishUid};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// Longest the idle loop sleeps between interrupt checks.
const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(
    name = "jsvm-inspect",
    version,
    about = "Run a JSVM host with the debugging inspector attached"
)]
struct Cli {
    /// Interface the inspector listens on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Inspector port; 0 binds an ephemeral port, omitted probes 9229-9999
    #[arg(long)]
    port: Option<u16>,

    /// Wait for a debugger to attach before running
    #[arg(long)]
    wait: bool,

    /// Wait for a debugger, then break on the first statement
    #[arg(long)]
    brk: bool,

    /// Script advertised as the debug target
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Stop after this many milliseconds instead of running until interrupted
    #[arg(long, value_name = "MS")]
    run_for_ms: Option<u64>,

    /// Do not print the "Debugger listening" banner
    #[arg(long)]
    no_console: bool,

    /// Do not serve the /json discovery endpoints
    #[arg(long)]
    no_http: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn publish(&self) -> InspectPublishUid {
        InspectPublishUid {
            console: !self.no_console,
            http: !self.no_http,
        }
    }

    fn script_name(&self) -> String {
        self.script
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let _log_guard = setup_logging(cli.log_file.as_deref())?;

    let env = Rc::new(LoopEnvironment::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_watcher(Arc::clone(&shutdown), env.interrupter())
        .context("failed to install signal handlers")?;

    let vm_env: Rc<dyn Environment> = env.clone();
    let mut agent = Agent::new(vm_env, backend_factory());
    if let Err(e) = start_inspector(&mut agent, &cli) {
        error!(error = %e, "inspector not started, running without it");
    }

    let deadline = cli
        .run_for_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));
    while !shutdown.load(Ordering::SeqCst) {
        let tick = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                remaining.min(TICK)
            }
            None => TICK,
        };
        env.park(tick);
        env.run_and_clear_interrupts();
    }
    info!("vm finished");

    agent.wait_for_disconnect();
    agent.stop();
    Ok(())
}

fn start_inspector(agent: &mut Agent, cli: &Cli) -> Result<(), AgentError> {
    let port = match cli.port {
        Some(port) => port,
        None => find_available_port(port_range())?,
    };
    let host_port = Arc::new(ExclusiveAccess::new(HostPort::new(
        cli.host.as_str(),
        port,
        Some(std::process::id()),
    )));
    agent.start_with(
        &cli.script_name(),
        host_port,
        AgentOptions {
            is_main: true,
            wait_for_connect: cli.wait || cli.brk,
            publish: cli.publish(),
        },
    )?;
    if cli.brk {
        agent.pause_on_next_javascript_statement("Break on start");
    }
    if let Some(url) = agent.ws_url() {
        info!(%url, "inspector ready");
    }
    Ok(())
}

fn backend_factory() -> BackendFactory {
    Box::new(|client| Box::new(TracedBackend::new(NoOpBackend::new(client))) as Box<dyn DebuggerBackend>)
}

/// Flag shutdown and wake the VM on SIGINT or SIGTERM.
fn spawn_signal_watcher(
    shutdown: Arc<AtomicBool>,
    interrupter: Arc<dyn Interrupter>,
) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!(error = %e, "SIGTERM handler unavailable");
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            });
            info!("shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
            interrupter.request_interrupt();
        })?;
    Ok(())
}

fn setup_logging(log_file: Option<&Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Ok(Some(guard))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
