//! The settlement backend contract.
//!
//! A backend is one concrete way to move DOGE to an external address: a
//! local full node, a public chain-query API, or a wrapped-token transfer
//! service. The engine never cares which — it talks to `dyn
//! SettlementBackend` resolved at runtime by the Method Selector.

use async_trait::async_trait;
use dogepay_types::{Address, PayoutMethod, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a backend returns from a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// External transfer id — a chain tx hash for node/explorer routes,
    /// the service's transfer id for wrapped transfers.
    pub reference: String,
    /// Explorer link for the transfer, if the backend can produce one.
    pub explorer_url: Option<String>,
}

/// Where a dispatched transfer currently stands, as reported by its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// The backend does not recognize the reference.
    Unknown,
    /// Broadcast but not yet buried under enough blocks.
    Pending,
    /// At or past the backend's finality threshold.
    Confirmed,
    /// Explicitly rejected or dropped by the backend / chain.
    Rejected,
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A confirmation snapshot for an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatus {
    /// Confirmation count observed by the backend.
    pub confirmations: u32,
    /// The backend's view of the transfer.
    pub state: TransferState,
}

/// One settlement route. Implementations wrap a full-node RPC client, a
/// block-explorer API client, or a wrapped-token transfer service; the
/// engine only depends on this surface.
#[async_trait]
pub trait SettlementBackend: Send + Sync {
    /// Which route this backend implements.
    fn method(&self) -> PayoutMethod;

    /// Health flag. An unavailable backend is never selected; requests that
    /// resolve to it are rejected synchronously, before any reservation.
    fn is_available(&self) -> bool;

    /// Whether `address` matches this route's address grammar.
    fn validate_address(&self, address: &Address) -> bool;

    /// Confirmations required before a transfer counts as final.
    fn required_confirmations(&self) -> u32;

    /// Submit a transfer. The memo carries the withdrawal's transaction id
    /// so the transfer can be located again by [`Self::find_transfer`].
    async fn submit(&self, to: &Address, amount: Decimal, memo: &str) -> Result<TransferReceipt>;

    /// Current confirmation status of a previously submitted transfer.
    async fn transfer_status(&self, reference: &str) -> Result<TransferStatus>;

    /// Locate an already executed transfer by its memo. This is the
    /// re-query safeguard for ambiguous dispatch timeouts: a submit call
    /// that timed out may still have gone through, and paying again would
    /// double-spend.
    async fn find_transfer(&self, memo: &str) -> Result<Option<TransferReceipt>>;
}
