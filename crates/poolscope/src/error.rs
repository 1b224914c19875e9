//! Error types for poolscope

use crate::scope::ScopeId;
use crate::target::InterceptionTarget;
use thiserror::Error;

/// Result type alias for poolscope operations
pub type InstrumentResult<T> = Result<T, InstrumentError>;

/// Errors raised by the instrumentation core.
///
/// None of these ever reach the instrumented application: setup errors are returned to
/// the host from [`Agent::build`](crate::agent::AgentBuilder::build), and everything raised
/// while a class loads or an instrumented method runs is logged and contained.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// A target was bound twice within one plugin setup pass
    #[error("Duplicate binding for {target} in setup pass of '{plugin}'")]
    DuplicateBinding {
        target: InterceptionTarget,
        plugin: String,
    },

    /// Monitor state is already attached to this instance
    #[error("Monitor state already attached to instance of {class_name}")]
    AlreadyAttached { class_name: String },

    /// A bound method does not exist on the loading class
    #[error("Method not found: {0}")]
    MethodNotFound(InterceptionTarget),

    /// An interceptor hook returned an error or panicked
    #[error("Hook '{interceptor}' failed during {phase} of {target}: {message}")]
    HookFailure {
        interceptor: String,
        phase: &'static str,
        target: InterceptionTarget,
        message: String,
    },

    /// `exit` called for a scope that is not active on this thread
    #[error("Unbalanced exit of scope '{0}'")]
    UnbalancedScopeExit(ScopeId),

    /// The host instrumentor could not inspect or rewrite a class
    #[error("Instrumentor error: {0}")]
    Instrumentor(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl InstrumentError {
    /// Create an instrumentor error
    pub fn instrumentor(message: impl Into<String>) -> Self {
        Self::Instrumentor(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a duplicate binding error
    pub fn is_duplicate_binding(&self) -> bool {
        matches!(self, Self::DuplicateBinding { .. })
    }

    /// Check if this is an already-attached error
    pub fn is_already_attached(&self) -> bool {
        matches!(self, Self::AlreadyAttached { .. })
    }

    /// Check if this is a method-not-found error
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound(_))
    }
}
