//! Core error types.

use thiserror::Error;

/// Errors reported by a host shell while building or mutating the menu tree.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The container refused to accept the node.
    #[error("Container rejected node: {0}")]
    Rejected(String),

    /// The widget backing this handle no longer exists.
    #[error("Container is no longer available: {0}")]
    Detached(String),

    /// Any other shell-side failure.
    #[error("Shell error: {0}")]
    Other(String),
}

/// Errors raised when an action payload is fired.
///
/// The composition engine never catches these — they propagate to whatever
/// triggered the action.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The payload source could not be read.
    #[error("Failed to read payload source: {0}")]
    Io(#[from] std::io::Error),

    /// The payload process finished with a non-success status.
    #[error("Payload process exited with {status}")]
    Failed { status: std::process::ExitStatus },
}
