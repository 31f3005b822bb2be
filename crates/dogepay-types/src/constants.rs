//! System-wide constants for the Dogepay payout engine.

/// Maximum decimal precision for amounts (8 decimal places).
pub const AMOUNT_PRECISION: u32 = 8;

/// Default minimum withdrawal, in whole DOGE.
pub const DEFAULT_MIN_WITHDRAWAL: u64 = 10;

/// Default maximum withdrawal, in whole DOGE.
pub const DEFAULT_MAX_WITHDRAWAL: u64 = 100_000;

/// Default fixed fee, in whole DOGE.
pub const DEFAULT_FEE_FIXED: u64 = 1;

/// Default proportional fee, in basis points (100 = 1%).
pub const DEFAULT_FEE_RATE_BPS: i64 = 100;

/// Default timeout for a single backend submit call, in milliseconds.
pub const DEFAULT_DISPATCH_TIMEOUT_MS: u64 = 30_000;

/// Default number of re-query attempts after an ambiguous dispatch timeout.
pub const DEFAULT_REQUERY_ATTEMPTS: u32 = 3;

/// Default delay between re-query attempts, in milliseconds.
pub const DEFAULT_REQUERY_DELAY_MS: u64 = 2_000;

/// Default confirmation poll interval, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;

/// How long a backend may report a reference as unknown before the
/// withdrawal is failed, in milliseconds.
pub const DEFAULT_REFERENCE_GRACE_MS: u64 = 600_000;

/// Operator bound on how long a dispatched transfer may sit without
/// reaching finality before the withdrawal is failed, in milliseconds.
pub const DEFAULT_MAX_CONFIRMATION_WAIT_MS: u64 = 7_200_000;

/// Default finality threshold for backends that do not override it.
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u32 = 6;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Dogepay";
