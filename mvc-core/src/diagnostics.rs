//! Registration-time diagnostics.
//!
//! The registrar reports what it did (and what it had to skip) to an injected
//! [`DiagnosticsSink`] rather than a global logger. [`TracingSink`] forwards
//! to `tracing`; [`RecordingSink`] keeps events in memory for tests.

use std::sync::Mutex;

use crate::resolver::Verb;

/// One registration event for a controller, identified by its qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    BinderLoaded {
        controller: String,
        field: String,
        value_type: String,
    },
    ActivationFailed {
        controller: String,
        error: String,
    },
    ResolutionFailed {
        controller: String,
        error: String,
    },
    HandlerSkipped {
        controller: String,
        method: String,
    },
    RouteRegistered {
        controller: String,
        verb: Verb,
        path: String,
        index: usize,
        method: String,
    },
    /// A host could not mount a registered route, e.g. because it collides
    /// with a route of another controller.
    RouteSkipped {
        controller: String,
        verb: Verb,
        path: String,
        reason: String,
    },
    /// Configuration disabled the controller; it was not activated.
    ControllerDisabled {
        controller: String,
    },
}

impl Diagnostic {
    pub fn controller(&self) -> &str {
        match self {
            Diagnostic::BinderLoaded { controller, .. }
            | Diagnostic::ActivationFailed { controller, .. }
            | Diagnostic::ResolutionFailed { controller, .. }
            | Diagnostic::HandlerSkipped { controller, .. }
            | Diagnostic::RouteRegistered { controller, .. }
            | Diagnostic::RouteSkipped { controller, .. }
            | Diagnostic::ControllerDisabled { controller } => controller,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::BinderLoaded { controller, field, value_type } => write!(
                f,
                "MVC {controller}: binder loaded for '{controller}.{field}' \
                 with value of type {value_type}"
            ),
            Diagnostic::ActivationFailed { controller, error } => {
                write!(f, "MVC {controller}: {error}")
            }
            Diagnostic::ResolutionFailed { controller, error } => {
                write!(f, "MVC {controller}: {error}")
            }
            Diagnostic::HandlerSkipped { controller, method } => {
                write!(f, "MVC {controller}: no method handler could be built for {method}")
            }
            Diagnostic::RouteRegistered { controller, verb, path, index, method } => {
                write!(f, "MVC {controller}: {verb} {path} maps to function[{index}] '{method}'")
            }
            Diagnostic::RouteSkipped { controller, verb, path, reason } => {
                write!(f, "MVC {controller}: {verb} {path} was not mounted: {reason}")
            }
            Diagnostic::ControllerDisabled { controller } => {
                write!(f, "MVC {controller}: disabled by configuration")
            }
        }
    }
}

/// Receiver of registration diagnostics.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        let controller = diagnostic.controller();
        match diagnostic {
            Diagnostic::BinderLoaded { .. } | Diagnostic::RouteRegistered { .. } => {
                tracing::debug!(controller, "{diagnostic}");
            }
            Diagnostic::ControllerDisabled { .. } => {
                tracing::info!(controller, "{diagnostic}");
            }
            Diagnostic::HandlerSkipped { .. } | Diagnostic::RouteSkipped { .. } => {
                tracing::warn!(controller, "{diagnostic}");
            }
            Diagnostic::ActivationFailed { .. } | Diagnostic::ResolutionFailed { .. } => {
                tracing::error!(controller, "{diagnostic}");
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic.clone());
        }
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for std::sync::Arc<S> {
    fn emit(&self, diagnostic: &Diagnostic) {
        (**self).emit(diagnostic)
    }
}
