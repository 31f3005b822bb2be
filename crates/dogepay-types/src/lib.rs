//! # dogepay-types
//!
//! Shared types, errors, and configuration for the **Dogepay** payout engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TransactionId`], [`Address`]
//! - **Account model**: [`AccountBalance`]
//! - **Transaction model**: [`Transaction`], [`TransactionKind`], [`WithdrawalStatus`]
//! - **Payout routing**: [`PayoutMethod`], [`MethodChoice`], address grammars in [`address`]
//! - **Configuration**: [`PayoutConfig`]
//! - **Errors**: [`DogepayError`] with `DP_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod account;
pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod method;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use dogepay_types::{Transaction, WithdrawalStatus, PayoutMethod, ...};

pub use account::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use method::*;
pub use transaction::*;

// Constants are accessed via `dogepay_types::constants::FOO`
// (not re-exported to avoid name collisions). Address grammar helpers are
// accessed via `dogepay_types::address::{classify, is_native_address, ...}`.
