//! External worker running the engine executable
//!
//! The engine is started with the staged configuration (`-c <file>`), its
//! output is fed through the log parser into the stats cache, and a stop
//! request interrupts only this child process.

use super::{MiningWorker, WorkerSession};
use crate::log_parser;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn, Instrument};

/// Time the engine gets to exit after an interrupt before it is killed
pub const DEFAULT_INTERRUPT_GRACE: Duration = Duration::from_millis(400);

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// External worker that executes the engine binary
#[derive(Debug)]
pub struct ExternalWorker {
    engine_path: RwLock<PathBuf>,
    extra_args: Vec<String>,
    interrupt_grace: Duration,
}

impl ExternalWorker {
    /// Create a new external worker for the engine at `engine_path`
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        let engine_path = engine_path.into();
        info!("Creating external worker with engine: {}", engine_path.display());

        Self {
            engine_path: RwLock::new(engine_path),
            extra_args: Vec::new(),
            interrupt_grace: DEFAULT_INTERRUPT_GRACE,
        }
    }

    /// Arguments placed before the configuration arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Override the interrupt grace period
    pub fn with_interrupt_grace(mut self, grace: Duration) -> Self {
        self.interrupt_grace = grace;
        self
    }

    /// Point at a different engine binary; applies to the next session
    pub fn set_engine_path(&self, engine_path: impl Into<PathBuf>) {
        let engine_path = engine_path.into();
        info!("Engine path set to {}", engine_path.display());
        *self.engine_path.write() = engine_path;
    }

    /// Current engine binary
    pub fn engine_path(&self) -> PathBuf {
        self.engine_path.read().clone()
    }

    /// Program and arguments for one session
    fn build_command(&self, config_path: &Path) -> (PathBuf, Vec<String>) {
        let mut args = self.extra_args.clone();
        args.push("-c".to_string());
        args.push(config_path.to_string_lossy().into_owned());
        args.push("--no-color".to_string());

        (self.engine_path(), args)
    }

    /// Ask the engine to exit, then kill it if it does not
    async fn shutdown(&self, child: &mut Child) {
        interrupt(child);

        match timeout(self.interrupt_grace, child.wait()).await {
            Ok(Ok(status)) => info!("Engine exited after interrupt: {}", status),
            Ok(Err(e)) => warn!("Failed to wait for engine: {}", e),
            Err(_) => {
                warn!(
                    "Engine ignored interrupt for {:?}, killing it",
                    self.interrupt_grace
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill engine: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl MiningWorker for ExternalWorker {
    fn worker_type(&self) -> &'static str {
        "external"
    }

    fn prepare(&self, config_path: &Path) -> Result<()> {
        let engine_path = self.engine_path();
        if resolve_program(&engine_path).is_none() {
            return Err(Error::spawn_failed(format!(
                "engine executable not found: {}",
                engine_path.display()
            )));
        }
        if !config_path.is_file() {
            return Err(Error::spawn_failed(format!(
                "staged configuration missing: {}",
                config_path.display()
            )));
        }
        Ok(())
    }

    async fn run(&self, session: WorkerSession) -> Result<()> {
        let (program, args) = self.build_command(&session.config_path);
        debug!("Executing engine: {} {:?}", program.display(), args);

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn_failed(format!("{}: {}", program.display(), e)))?;

        info!("Engine started (pid {:?})", child.id());

        if let Some(stderr) = child.stderr.take() {
            let stats = session.stats.clone();
            tokio::spawn(
                async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(target: "engine", "{}", line);
                        log_parser::apply_line(&line, &stats);
                    }
                }
                .in_current_span(),
            );
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::external_process("engine stdout was not captured"))?;
        let mut lines = BufReader::new(stdout).lines();
        let mut stdout_open = true;

        loop {
            tokio::select! {
                line = lines.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => {
                        trace!(target: "engine", "{}", line);
                        log_parser::apply_line(&line, &session.stats);
                    }
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        warn!("Failed to read engine output: {}", e);
                        stdout_open = false;
                    }
                },
                status = child.wait() => {
                    let status = status?;
                    if stdout_open {
                        drain(&mut lines, &session).await;
                    }
                    return if status.success() {
                        info!("Engine exited: {}", status);
                        Ok(())
                    } else {
                        Err(Error::external_process(format!("engine exited with {}", status)))
                    };
                }
                _ = session.cancellation.cancelled() => {
                    info!("Stop requested, interrupting engine");
                    self.shutdown(&mut child).await;
                    return Err(Error::cancelled("external engine"));
                }
            }
        }
    }
}

/// Output still buffered in the pipe after the engine exited
async fn drain<R>(lines: &mut Lines<R>, session: &WorkerSession)
where
    R: AsyncBufRead + Unpin,
{
    let drained = timeout(DRAIN_TIMEOUT, async {
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(target: "engine", "{}", line);
            log_parser::apply_line(&line, &session.stats);
        }
    })
    .await;

    if drained.is_err() {
        debug!("Engine output still open after exit, leaving it");
    }
}

/// Locate `program` directly or on `PATH`
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(unix)]
fn interrupt(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs
        // to a child we have not reaped yet.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        if rc != 0 {
            warn!("Failed to interrupt engine: {}", std::io::Error::last_os_error());
        }
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to stop engine: {}", e);
    }
}
