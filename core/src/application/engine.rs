//! Sequential evaluator for action trees.
//!
//! One `Engine` owns the state of one run: the leftover registry, the check
//! cache, the temp path allocator, the transport handle and the cancellation
//! signal. Nothing here is global, so independent runs never share state.
//! Evaluation is strictly sequential; the state is not synchronized and must
//! not be shared with a parallel evaluator.

use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use crate::application::action::{Action, Checker, MessageLevel, Step};
use crate::application::ports::{Communicator, ProgressReporter};
use crate::domain::cache::CheckCache;
use crate::domain::config::ProvisionConfig;
use crate::domain::error::{ActionError, CleanupError};
use crate::domain::marker::split_lines;
use crate::domain::temp_path::TempPathAllocator;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

// ── Cancellation ──────────────────────────────────────────────────────────────

/// Cloneable cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Run state ─────────────────────────────────────────────────────────────────

/// Mutable per-run state, handed to `Deferred` builders.
#[derive(Debug, Default)]
pub struct RunState {
    leftovers: Vec<String>,
    cache: CheckCache,
    temp_paths: TempPathAllocator,
}

impl RunState {
    #[must_use]
    pub fn new(temp_paths: TempPathAllocator) -> Self {
        Self {
            leftovers: Vec::new(),
            cache: CheckCache::default(),
            temp_paths,
        }
    }

    /// Registered leftovers, in registration order.
    #[must_use]
    pub fn leftovers(&self) -> &[String] {
        &self.leftovers
    }

    pub fn add_leftover(&mut self, path: impl Into<String>) {
        self.leftovers.push(path.into());
    }

    /// Drain the registry.
    pub fn take_leftovers(&mut self) -> Vec<String> {
        std::mem::take(&mut self.leftovers)
    }

    #[must_use]
    pub fn cache(&self) -> &CheckCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CheckCache {
        &mut self.cache
    }

    #[must_use]
    pub fn temp_paths(&self) -> &TempPathAllocator {
        &self.temp_paths
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Evaluates actions and checkers against a `Communicator`.
pub struct Engine<C, R> {
    comm: C,
    reporter: R,
    state: RunState,
    cancel: CancelSignal,
    /// Nesting depth of `Guarded` cleanup sections currently running.
    cleanup_depth: usize,
}

impl<C: Communicator, R: ProgressReporter> Engine<C, R> {
    pub fn new(comm: C, reporter: R) -> Self {
        Self {
            comm,
            reporter,
            state: RunState::default(),
            cancel: CancelSignal::new(),
            cleanup_depth: 0,
        }
    }

    pub fn with_config(comm: C, reporter: R, config: &ProvisionConfig) -> Self {
        let mut engine = Self::new(comm, reporter);
        engine.state = RunState::new(TempPathAllocator::from_config(&config.temp));
        engine
    }

    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    #[must_use]
    pub fn communicator(&self) -> &C {
        &self.comm
    }

    #[must_use]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Evaluate an action tree to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error that was not swallowed by a `BestEffort` node.
    pub async fn run(&mut self, action: Action) -> Result<()> {
        self.eval(action).await
    }

    /// Evaluate a checker.
    ///
    /// # Errors
    ///
    /// Returns an error only when the check could not be performed; a
    /// negative answer is `Ok(false)`.
    pub async fn check(&mut self, checker: &Checker) -> Result<bool> {
        self.eval_check(checker).await
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cleanup_depth == 0 && self.cancel.is_cancelled() {
            return Err(ActionError::Cancelled.into());
        }
        Ok(())
    }

    fn eval(&mut self, action: Action) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            match action {
                Action::Leaf(step) => {
                    self.ensure_not_cancelled()?;
                    self.run_step(step).await
                }
                Action::Sequence(list) => {
                    for next in list {
                        self.eval(next).await?;
                    }
                    Ok(())
                }
                Action::Deferred(build) => {
                    self.ensure_not_cancelled()?;
                    let next = build(&mut self.state);
                    self.eval(next).await
                }
                Action::Fail(err) => Err(err),
                Action::Guarded { body, cleanup } => {
                    let result = self.eval(*body).await;
                    self.cleanup_depth += 1;
                    let cleaned = self.eval(*cleanup).await;
                    self.cleanup_depth -= 1;
                    match (result, cleaned) {
                        (Err(err), Err(cleanup_err)) => {
                            warn!(error = %format!("{cleanup_err:#}"), "cleanup failed after error");
                            self.reporter
                                .warn(&format!("cleanup failed: {cleanup_err:#}"));
                            Err(err)
                        }
                        (Err(err), Ok(())) => Err(err),
                        (Ok(()), cleaned) => cleaned,
                    }
                }
                Action::BestEffort(inner) => {
                    let label = inner.describe();
                    match self.eval(*inner).await {
                        Err(err) if is_cancelled(&err) => Err(err),
                        Err(err) => {
                            warn!(action = %label, error = %format!("{err:#}"), "ignoring failure");
                            self.reporter
                                .warn(&format!("ignoring failure of {label}: {err:#}"));
                            Ok(())
                        }
                        Ok(()) => Ok(()),
                    }
                }
                Action::When { checker, then } => {
                    if self.eval_check(&checker).await? {
                        self.eval(*then).await
                    } else {
                        debug!(checker = ?checker, "condition not met, skipping");
                        Ok(())
                    }
                }
                Action::Collect(list) => {
                    let total = list.len();
                    let mut failures = Vec::new();
                    for next in list {
                        let label = next.describe();
                        if let Err(err) = self.eval(next).await {
                            if is_cancelled(&err) {
                                return Err(err);
                            }
                            failures.push(format!("{label}: {err:#}"));
                        }
                    }
                    if failures.is_empty() {
                        Ok(())
                    } else {
                        Err(CleanupError::Incomplete { total, failures }.into())
                    }
                }
            }
        })
    }

    fn eval_check<'a>(&'a mut self, checker: &'a Checker) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            match checker {
                Checker::Exec(command) => {
                    self.ensure_not_cancelled()?;
                    let output = self
                        .comm
                        .exec(command)
                        .await
                        .with_context(|| format!("check `{command}`"))?;
                    Ok(output.status.success())
                }
                Checker::Not(inner) => Ok(!self.eval_check(inner).await?),
                Checker::Once { key, inner } => {
                    if let Some(cached) = self.state.cache.get(key) {
                        debug!(key = %key, cached, "check cache hit");
                        return Ok(cached);
                    }
                    let value = self.eval_check(inner).await?;
                    self.state.cache.insert(key.clone(), value);
                    Ok(value)
                }
                Checker::LocalFile(path) => Ok(local_path_exists(path).await),
            }
        })
    }

    async fn run_step(&mut self, step: Step) -> Result<()> {
        debug!(step = ?step, "running step");
        match step {
            Step::Exec(command) => {
                let output = self
                    .comm
                    .exec(&command)
                    .await
                    .with_context(|| format!("exec `{command}`"))?;
                ensure_success(command, &output)
            }
            Step::ExecLines { command, sink } => {
                let output = self
                    .comm
                    .exec(&command)
                    .await
                    .with_context(|| format!("exec `{command}`"))?;
                {
                    let mut sink = sink.lock().map_err(|_| anyhow!("line sink poisoned"))?;
                    for line in split_lines(&output.stdout) {
                        sink.line(line)?;
                    }
                }
                ensure_success(command, &output)
            }
            Step::Upload { dest, content } => {
                let mut reader: &[u8] = &content;
                self.comm
                    .upload(&dest, &mut reader)
                    .await
                    .map_err(|err| ActionError::UploadFailed {
                        dest: dest.clone(),
                        reason: format!("{err:#}"),
                    })?;
                Ok(())
            }
            Step::Message { level, text } => {
                if !text.is_empty() {
                    match level {
                        MessageLevel::Info => self.reporter.step(&text),
                        MessageLevel::Debug => self.reporter.detail(&text),
                        MessageLevel::Warn => self.reporter.warn(&text),
                    }
                }
                Ok(())
            }
            Step::CacheStore { key, value } => {
                self.state.cache.insert(key, value);
                Ok(())
            }
            Step::CacheEvict(key) => {
                self.state.cache.remove(&key);
                Ok(())
            }
            Step::AddLeftover(path) => {
                self.state.add_leftover(path);
                Ok(())
            }
            Step::RemoveLocal(path) => match tokio::fs::remove_file(&path).await {
                Err(err) if err.kind() != ErrorKind::NotFound => {
                    Err(err).with_context(|| format!("removing {}", path.display()))
                }
                _ => Ok(()),
            },
            Step::MoveLocal { src, dst } => {
                if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating directory {}", parent.display()))?;
                }
                match tokio::fs::rename(&src, &dst).await {
                    Err(err) if err.kind() == ErrorKind::CrossesDevices => {
                        debug!(src = %src.display(), dst = %dst.display(), "rename crosses devices, copying");
                        copy_then_remove(&src, &dst).await
                    }
                    result => result.with_context(|| {
                        format!("moving {} to {}", src.display(), dst.display())
                    }),
                }
            }
            Step::WriteLocal { path, contents } => tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("cannot write {}", path.display())),
        }
    }
}

fn ensure_success(command: String, output: &std::process::Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(ActionError::CommandFailed {
        command,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ActionError>(),
        Some(ActionError::Cancelled)
    )
}

/// Move by copying, for paths on different filesystems. `dst` is overwritten.
async fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    tokio::fs::copy(src, dst)
        .await
        .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    tokio::fs::remove_file(src)
        .await
        .with_context(|| format!("removing {} after copy", src.display()))
}

/// Stat a local path; empty paths and any stat failure count as absent.
async fn local_path_exists(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    tokio::fs::metadata(path).await.is_ok()
}
