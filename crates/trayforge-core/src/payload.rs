//! Invocable action payloads.
//!
//! An action descriptor carries an opaque executable payload; the engine's
//! responsibility ends at wiring the trigger. Payloads implement
//! [`Invocable`] and run synchronously on the caller's timeline when the
//! action fires — errors propagate to the invoker, never back into the
//! composition engine.
//!
//! No code is evaluated inside this process: inline commands and file
//! contents are handed to a [`ScriptRunner`], whose default implementation
//! spawns an external interpreter process.

use std::process::Command;
use std::sync::Arc;

use crate::error::InvocationError;

/// Marker prefix for path segments substituted from the environment.
const ENV_MARKER: char = '$';

/// An opaque, deferred, side-effecting payload.
pub trait Invocable: Send + Sync {
    fn invoke(&self) -> Result<(), InvocationError>;
}

/// Executes script source on behalf of a payload.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, source: &str) -> Result<(), InvocationError>;
}

/// Runs script source through an external process, e.g. `sh -c <source>`.
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The platform's default command interpreter.
    pub fn shell() -> Self {
        #[cfg(unix)]
        {
            Self::new("sh", vec!["-c".to_string()])
        }
        #[cfg(not(unix))]
        {
            Self::new("cmd", vec!["/C".to_string()])
        }
    }
}

impl ScriptRunner for ProcessRunner {
    fn run(&self, source: &str) -> Result<(), InvocationError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(InvocationError::Failed { status })
        }
    }
}

/// Payload holding inline script source, executed verbatim at invocation time.
pub struct ScriptPayload {
    source: String,
    runner: Arc<dyn ScriptRunner>,
}

impl ScriptPayload {
    pub fn new(source: impl Into<String>, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            source: source.into(),
            runner,
        }
    }
}

impl Invocable for ScriptPayload {
    fn invoke(&self) -> Result<(), InvocationError> {
        self.runner.run(&self.source)
    }
}

/// Payload holding a filesystem path whose contents are read and executed at
/// invocation time, not at composition time.
///
/// Path segments beginning with `$` are substituted with the same-named
/// environment variable when the action fires.
pub struct FilePayload {
    path: String,
    runner: Arc<dyn ScriptRunner>,
}

impl FilePayload {
    pub fn new(path: impl Into<String>, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            path: path.into(),
            runner,
        }
    }
}

impl Invocable for FilePayload {
    fn invoke(&self) -> Result<(), InvocationError> {
        let path = expand_env_segments(&self.path);
        let source = std::fs::read_to_string(&path)?;
        self.runner.run(&source)
    }
}

/// Payload wrapping a pre-registered callable. Used for engine-provided
/// actions such as Exit.
pub struct CallbackPayload {
    callback: Arc<dyn Fn() -> Result<(), InvocationError> + Send + Sync>,
}

impl CallbackPayload {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() -> Result<(), InvocationError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl Invocable for CallbackPayload {
    fn invoke(&self) -> Result<(), InvocationError> {
        (self.callback)()
    }
}

/// Replaces `$`-prefixed path segments with the value of the same-named
/// environment variable. An unset variable leaves the segment literal,
/// marker included.
///
/// A substituted value may itself be absolute or separator-terminated;
/// duplicate separators are collapsed so the expanded path stays normalized.
pub fn expand_env_segments(path: &str) -> String {
    if !path.contains(ENV_MARKER) {
        return path.to_string();
    }

    let expanded = path
        .split(std::path::MAIN_SEPARATOR)
        .map(|segment| match segment.strip_prefix(ENV_MARKER) {
            Some(name) => std::env::var(name).unwrap_or_else(|_| segment.to_string()),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(std::path::MAIN_SEPARATOR_STR);

    let mut normalized = String::with_capacity(expanded.len());
    let mut previous_was_separator = false;
    for ch in expanded.chars() {
        if ch == std::path::MAIN_SEPARATOR {
            if previous_was_separator {
                continue;
            }
            previous_was_separator = true;
        } else {
            previous_was_separator = false;
        }
        normalized.push(ch);
    }
    normalized
}
