//! Payout method enums.
//!
//! Three interchangeable settlement routes exist for a withdrawal:
//! a local Dogecoin full node, a public chain-query API, and a wrapped-DOGE
//! (ERC-20) transfer service. A caller either names one explicitly or asks
//! for `auto`, in which case the Method Selector classifies the destination
//! address and picks a route.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete settlement route for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    /// Direct send through a local Dogecoin full node (RPC).
    NodeDirect,
    /// Broadcast through a public block-explorer API.
    ExplorerApi,
    /// Wrapped-DOGE (ERC-20) transfer on a smart-contract chain.
    WrappedToken,
}

impl PayoutMethod {
    /// All methods, in selector preference order for native addresses.
    pub const ALL: [Self; 3] = [Self::NodeDirect, Self::ExplorerApi, Self::WrappedToken];
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeDirect => write!(f, "NODE_DIRECT"),
            Self::ExplorerApi => write!(f, "EXPLORER_API"),
            Self::WrappedToken => write!(f, "WRAPPED_TOKEN"),
        }
    }
}

/// What the caller asked for: a specific route, or automatic selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodChoice {
    /// Classify the destination address and pick a route.
    #[default]
    Auto,
    /// Use exactly this route (destination must match its grammar).
    Explicit(PayoutMethod),
}

impl fmt::Display for MethodChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "AUTO"),
            Self::Explicit(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(PayoutMethod::NodeDirect.to_string(), "NODE_DIRECT");
        assert_eq!(PayoutMethod::ExplorerApi.to_string(), "EXPLORER_API");
        assert_eq!(PayoutMethod::WrappedToken.to_string(), "WRAPPED_TOKEN");
        assert_eq!(MethodChoice::Auto.to_string(), "AUTO");
        assert_eq!(
            MethodChoice::Explicit(PayoutMethod::NodeDirect).to_string(),
            "NODE_DIRECT"
        );
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&PayoutMethod::WrappedToken).unwrap();
        assert_eq!(json, "\"wrapped_token\"");
        let back: PayoutMethod = serde_json::from_str("\"node_direct\"").unwrap();
        assert_eq!(back, PayoutMethod::NodeDirect);
    }

    #[test]
    fn default_choice_is_auto() {
        assert_eq!(MethodChoice::default(), MethodChoice::Auto);
    }
}
