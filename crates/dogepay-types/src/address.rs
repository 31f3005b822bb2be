//! Destination address grammars.
//!
//! Two address families are recognized:
//! - Native Dogecoin P2PKH: base58, 34 characters, `D` prefix.
//! - EVM (wrapped-DOGE destinations): `0x` followed by 40 hex digits.

use std::sync::LazyLock;

use regex::Regex;

use crate::Address;

/// Dogecoin mainnet P2PKH grammar: `D`, a version character, then 32 base58
/// characters (no `0`, `O`, `I`, `l`).
static DOGE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^D[5-9A-HJ-NP-U][1-9A-HJ-NP-Za-km-z]{32}$").expect("valid regex")
});

/// EVM address grammar: `0x` + 40 hex digits.
static EVM_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid regex"));

/// The address family a destination string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Native Dogecoin base58 address.
    Native,
    /// Smart-contract-chain (EVM) address.
    Evm,
    /// Neither grammar matched.
    Unknown,
}

/// Whether `addr` is a well-formed native Dogecoin address.
#[must_use]
pub fn is_native_address(addr: &Address) -> bool {
    DOGE_ADDRESS.is_match(addr.as_str())
}

/// Whether `addr` is a well-formed EVM address.
#[must_use]
pub fn is_evm_address(addr: &Address) -> bool {
    EVM_ADDRESS.is_match(addr.as_str())
}

/// Classify a destination address by shape.
#[must_use]
pub fn classify(addr: &Address) -> AddressKind {
    if is_native_address(addr) {
        AddressKind::Native
    } else if is_evm_address(addr) {
        AddressKind::Evm
    } else {
        AddressKind::Unknown
    }
}
