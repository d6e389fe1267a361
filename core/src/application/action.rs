//! The action algebra: composable units of work and remote/local checks.
//!
//! Building an `Action` performs no I/O. Work happens only when an
//! [`Engine`](crate::application::Engine) evaluates the tree, strictly
//! left-to-right, resolving `Deferred` nodes at the moment they are reached.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::application::engine::RunState;

// ── Leaf steps ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Debug,
    Warn,
}

/// Receives raw command output one line at a time, without the newline.
pub trait LineSink: Send {
    /// # Errors
    ///
    /// An error stops the stream; no further lines are delivered.
    fn line(&mut self, line: &[u8]) -> anyhow::Result<()>;
}

pub type SharedLineSink = Arc<Mutex<dyn LineSink>>;

/// A single concrete operation.
pub enum Step {
    /// Run a remote command; non-zero exit is an error.
    Exec(String),
    /// Run a remote command and hand every raw stdout line to `sink`.
    ExecLines {
        command: String,
        sink: SharedLineSink,
    },
    /// Stream bytes to a remote path through the transport.
    Upload { dest: String, content: Vec<u8> },
    Message { level: MessageLevel, text: String },
    CacheStore { key: String, value: bool },
    CacheEvict(String),
    AddLeftover(String),
    /// Remove a local file; a missing file is not an error.
    RemoveLocal(PathBuf),
    /// Rename a local file over `dst`, creating parent directories.
    MoveLocal { src: PathBuf, dst: PathBuf },
    /// Create or truncate a local file and write `contents`.
    WriteLocal { path: PathBuf, contents: String },
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec(cmd) => f.debug_tuple("Exec").field(cmd).finish(),
            Self::ExecLines { command, .. } => f
                .debug_struct("ExecLines")
                .field("command", command)
                .finish_non_exhaustive(),
            Self::Upload { dest, content } => f
                .debug_struct("Upload")
                .field("dest", dest)
                .field("bytes", &content.len())
                .finish(),
            Self::Message { level, text } => f
                .debug_struct("Message")
                .field("level", level)
                .field("text", text)
                .finish(),
            Self::CacheStore { key, value } => f
                .debug_struct("CacheStore")
                .field("key", key)
                .field("value", value)
                .finish(),
            Self::CacheEvict(key) => f.debug_tuple("CacheEvict").field(key).finish(),
            Self::AddLeftover(path) => f.debug_tuple("AddLeftover").field(path).finish(),
            Self::RemoveLocal(path) => f.debug_tuple("RemoveLocal").field(path).finish(),
            Self::MoveLocal { src, dst } => f
                .debug_struct("MoveLocal")
                .field("src", src)
                .field("dst", dst)
                .finish(),
            Self::WriteLocal { path, contents } => f
                .debug_struct("WriteLocal")
                .field("path", path)
                .field("bytes", &contents.len())
                .finish(),
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// Builds the next action from the run state when evaluation reaches it.
pub type Builder = Box<dyn FnOnce(&mut RunState) -> Action + Send>;

/// A node in an execution tree. Consumed exactly once by the engine.
pub enum Action {
    Leaf(Step),
    /// Evaluated in order; the first error stops the sequence.
    Sequence(Vec<Action>),
    Deferred(Builder),
    /// Short-circuits immediately with the carried error.
    Fail(anyhow::Error),
    /// `cleanup` always runs after `body`; the node reports the body's result.
    Guarded {
        body: Box<Action>,
        cleanup: Box<Action>,
    },
    /// Errors are reported as warnings and swallowed.
    BestEffort(Box<Action>),
    /// Runs `then` only when `checker` holds.
    When {
        checker: Checker,
        then: Box<Action>,
    },
    /// Every member runs even after failures; failures are aggregated.
    Collect(Vec<Action>),
}

impl Action {
    /// An empty sequence: succeeds without doing anything.
    #[must_use]
    pub fn noop() -> Self {
        Self::Sequence(Vec::new())
    }

    #[must_use]
    pub fn exec(command: impl Into<String>) -> Self {
        Self::Leaf(Step::Exec(command.into()))
    }

    #[must_use]
    pub fn message(level: MessageLevel, text: impl Into<String>) -> Self {
        Self::Leaf(Step::Message {
            level,
            text: text.into(),
        })
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::message(MessageLevel::Info, text)
    }

    #[must_use]
    pub fn debug(text: impl Into<String>) -> Self {
        Self::message(MessageLevel::Debug, text)
    }

    #[must_use]
    pub fn fail(err: impl Into<anyhow::Error>) -> Self {
        Self::Fail(err.into())
    }

    #[must_use]
    pub fn deferred(build: impl FnOnce(&mut RunState) -> Action + Send + 'static) -> Self {
        Self::Deferred(Box::new(build))
    }

    #[must_use]
    pub fn guarded(body: Action, cleanup: Action) -> Self {
        Self::Guarded {
            body: Box::new(body),
            cleanup: Box::new(cleanup),
        }
    }

    #[must_use]
    pub fn best_effort(action: Action) -> Self {
        Self::BestEffort(Box::new(action))
    }

    #[must_use]
    pub fn when(checker: Checker, then: Action) -> Self {
        Self::When {
            checker,
            then: Box::new(then),
        }
    }

    /// Short label used in logs and aggregated errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Leaf(Step::Exec(cmd) | Step::ExecLines { command: cmd, .. }) => {
                format!("exec `{cmd}`")
            }
            Self::Leaf(step) => format!("{step:?}"),
            Self::Sequence(list) => match list.as_slice() {
                [] => "nothing".to_string(),
                [only] => only.describe(),
                [first, rest @ ..] => format!("{} and {} more", first.describe(), rest.len()),
            },
            Self::Deferred(_) => "deferred".to_string(),
            Self::Fail(err) => format!("error: {err}"),
            Self::Guarded { body, .. } => format!("guarded {}", body.describe()),
            Self::BestEffort(inner) => format!("try {}", inner.describe()),
            Self::When { checker, .. } => format!("when {checker:?}"),
            Self::Collect(list) => format!("collect of {}", list.len()),
        }
    }
}

impl From<Vec<Action>> for Action {
    fn from(list: Vec<Action>) -> Self {
        Self::Sequence(list)
    }
}

impl From<Step> for Action {
    fn from(step: Step) -> Self {
        Self::Leaf(step)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(step) => step.fmt(f),
            Self::Sequence(list) => f.debug_tuple("Sequence").field(list).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Fail(err) => f.debug_tuple("Fail").field(&err.to_string()).finish(),
            Self::Guarded { body, cleanup } => f
                .debug_struct("Guarded")
                .field("body", body)
                .field("cleanup", cleanup)
                .finish(),
            Self::BestEffort(inner) => f.debug_tuple("BestEffort").field(inner).finish(),
            Self::When { checker, then } => f
                .debug_struct("When")
                .field("checker", checker)
                .field("then", then)
                .finish(),
            Self::Collect(list) => f.debug_tuple("Collect").field(list).finish(),
        }
    }
}

// ── Checkers ──────────────────────────────────────────────────────────────────

/// A predicate over remote or local state. Negate with `!checker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checker {
    /// Remote command; exit 0 is `true`, any other exit is `false`.
    Exec(String),
    Not(Box<Checker>),
    /// Memoized under `key` in the run's check cache.
    Once { key: String, inner: Box<Checker> },
    /// Local stat; any failure is `false`.
    LocalFile(PathBuf),
}

impl Checker {
    #[must_use]
    pub fn exec(command: impl Into<String>) -> Self {
        Self::Exec(command.into())
    }

    #[must_use]
    pub fn once(key: impl Into<String>, inner: Checker) -> Self {
        Self::Once {
            key: key.into(),
            inner: Box::new(inner),
        }
    }
}

impl std::ops::Not for Checker {
    type Output = Checker;

    fn not(self) -> Checker {
        Checker::Not(Box::new(self))
    }
}
