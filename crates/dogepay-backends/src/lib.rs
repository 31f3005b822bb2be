//! # dogepay-backends
//!
//! The settlement backend contract and runtime registry.
//!
//! Three interchangeable routes move DOGE out of the system: a local full
//! node, a public chain-query API, and a wrapped-token transfer service.
//! Each is an implementation of [`SettlementBackend`]; the engine resolves
//! one at runtime through the [`BackendRegistry`] and never sees past the
//! trait.
//!
//! Concrete clients (node RPC, explorer HTTP, wrapped-token service) live
//! with the embedding application. This crate ships a scripted
//! [`MockBackend`] behind the `test-helpers` feature for exercising the
//! engine without external services.

pub mod backend;
pub mod registry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

pub use backend::{SettlementBackend, TransferReceipt, TransferState, TransferStatus};
pub use registry::{BackendAvailability, BackendRegistry};

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::{MockBackend, SubmitBehavior};
