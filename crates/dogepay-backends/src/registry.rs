//! Runtime registry of settlement backends.
//!
//! Built once at startup and handed to the engine by `Arc`. The registry
//! owns the polymorphic backend set; the Method Selector works from the
//! availability snapshot so it stays a pure function.

use std::collections::HashMap;
use std::sync::Arc;

use dogepay_types::PayoutMethod;

use crate::SettlementBackend;

/// Point-in-time health snapshot of the three routes.
///
/// Input to the Method Selector: a route counts as available when a backend
/// is registered for it and reports healthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendAvailability {
    pub node_direct: bool,
    pub explorer_api: bool,
    pub wrapped_token: bool,
}

impl BackendAvailability {
    /// Availability of one route.
    #[must_use]
    pub fn of(&self, method: PayoutMethod) -> bool {
        match method {
            PayoutMethod::NodeDirect => self.node_direct,
            PayoutMethod::ExplorerApi => self.explorer_api,
            PayoutMethod::WrappedToken => self.wrapped_token,
        }
    }
}

/// Maps each payout method to its backend implementation.
pub struct BackendRegistry {
    backends: HashMap<PayoutMethod, Arc<dyn SettlementBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a backend under its own method. Replaces any previous
    /// backend for that method.
    pub fn register(&mut self, backend: Arc<dyn SettlementBackend>) {
        self.backends.insert(backend.method(), backend);
    }

    /// The backend for a method, if one is registered.
    #[must_use]
    pub fn get(&self, method: PayoutMethod) -> Option<Arc<dyn SettlementBackend>> {
        self.backends.get(&method).map(Arc::clone)
    }

    /// Whether a method has a registered, healthy backend.
    #[must_use]
    pub fn is_available(&self, method: PayoutMethod) -> bool {
        self.backends
            .get(&method)
            .is_some_and(|b| b.is_available())
    }

    /// Health snapshot across all three routes.
    #[must_use]
    pub fn availability(&self) -> BackendAvailability {
        BackendAvailability {
            node_direct: self.is_available(PayoutMethod::NodeDirect),
            explorer_api: self.is_available(PayoutMethod::ExplorerApi),
            wrapped_token: self.is_available(PayoutMethod::WrappedToken),
        }
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
