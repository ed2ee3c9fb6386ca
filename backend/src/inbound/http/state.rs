//! Shared HTTP adapter state.
//!
//! Handlers accept this via `web::Data` and only talk to the dispatcher and
//! the permission gate, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::dispatcher::Dispatcher;
use crate::domain::ports::PermissionGate;

/// Whether failed envelopes keep their `exceptionMessage` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsMode {
    #[default]
    Redacted,
    Exposed,
}

impl DiagnosticsMode {
    pub const fn from_flag(expose: bool) -> Self {
        if expose { Self::Exposed } else { Self::Redacted }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub dispatcher: Dispatcher,
    pub permissions: Arc<dyn PermissionGate>,
    pub diagnostics: DiagnosticsMode,
}

impl HttpState {
    /// State with diagnostics redacted.
    pub fn new(dispatcher: Dispatcher, permissions: Arc<dyn PermissionGate>) -> Self {
        Self {
            dispatcher,
            permissions,
            diagnostics: DiagnosticsMode::Redacted,
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsMode) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
