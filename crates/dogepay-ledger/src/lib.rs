//! # dogepay-ledger
//!
//! Balance state and the append-only transaction log for the Dogepay
//! payout engine.
//!
//! ## Architecture
//!
//! Two store objects, both held by `Arc` and locked at the finest
//! necessary granularity:
//!
//! - [`Ledger`] — per-account balances with reservation accounting
//!   (`credit` / `reserve` / `release` / `commit_withdrawal`). One mutex
//!   per account: same-account operations serialize, cross-account
//!   operations run in parallel.
//! - [`TransactionStore`] — the append-only payout log. One mutex per
//!   record: the orchestrator's dispatch step and the poller's
//!   confirmation updates never race on the same record.
//!
//! Neither store performs I/O; durability is a concern of whichever
//! process embeds them.

pub mod ledger;
pub mod tx_store;

pub use ledger::Ledger;
pub use tx_store::TransactionStore;
