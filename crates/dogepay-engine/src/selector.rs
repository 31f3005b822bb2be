//! The Method Selector.
//!
//! A pure, total decision function: given the destination address, the
//! caller's requested method, and a health snapshot of the backend set, it
//! resolves the settlement route — or rejects the request before any funds
//! move. No I/O, no clock, no shared state.

use dogepay_backends::BackendAvailability;
use dogepay_types::{
    Address, DogepayError, MethodChoice, PayoutMethod, Result,
    address::{AddressKind, classify},
};

/// Resolve the settlement route for a withdrawal.
///
/// Rules, in order:
/// 1. An explicit method requires the destination to match that route's
///    address grammar, regardless of what auto-detection would say.
/// 2. `Auto` classifies the destination by shape: native Dogecoin addresses
///    prefer the direct node, falling back to the explorer API; EVM
///    addresses always resolve to the wrapped-token route.
/// 3. A resolved route without a healthy backend fails with
///    `BackendUnavailable` — reported synchronously, before reservation.
///
/// # Errors
/// - `InvalidDestination` if the address fits no grammar (or not the
///   explicitly requested route's grammar).
/// - `BackendUnavailable` if the resolved route has no healthy backend.
pub fn select(
    to: &Address,
    requested: MethodChoice,
    availability: &BackendAvailability,
) -> Result<PayoutMethod> {
    match requested {
        MethodChoice::Explicit(method) => {
            let expected = match method {
                PayoutMethod::NodeDirect | PayoutMethod::ExplorerApi => AddressKind::Native,
                PayoutMethod::WrappedToken => AddressKind::Evm,
            };
            if classify(to) != expected {
                return Err(DogepayError::InvalidDestination {
                    reason: format!("{} does not match the {method} address format", to.short()),
                });
            }
            if !availability.of(method) {
                return Err(DogepayError::BackendUnavailable(method));
            }
            Ok(method)
        }
        MethodChoice::Auto => match classify(to) {
            AddressKind::Native => {
                if availability.node_direct {
                    Ok(PayoutMethod::NodeDirect)
                } else if availability.explorer_api {
                    Ok(PayoutMethod::ExplorerApi)
                } else {
                    Err(DogepayError::BackendUnavailable(PayoutMethod::NodeDirect))
                }
            }
            AddressKind::Evm => {
                if availability.wrapped_token {
                    Ok(PayoutMethod::WrappedToken)
                } else {
                    Err(DogepayError::BackendUnavailable(PayoutMethod::WrappedToken))
                }
            }
            AddressKind::Unknown => Err(DogepayError::InvalidDestination {
                reason: format!("unrecognized destination address format: {}", to.short()),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOGE: &str = "DBXu2kgc3xtvCUWFcxFE3r9hEYgmuaaCyD";
    const EVM: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    fn all_available() -> BackendAvailability {
        BackendAvailability {
            node_direct: true,
            explorer_api: true,
            wrapped_token: true,
        }
    }

    #[test]
    fn native_auto_prefers_node() {
        let method = select(&Address::new(DOGE), MethodChoice::Auto, &all_available()).unwrap();
        assert_eq!(method, PayoutMethod::NodeDirect);
    }

    #[test]
    fn native_auto_falls_back_to_explorer() {
        let avail = BackendAvailability {
            node_direct: false,
            explorer_api: true,
            wrapped_token: true,
        };
        let method = select(&Address::new(DOGE), MethodChoice::Auto, &avail).unwrap();
        assert_eq!(method, PayoutMethod::ExplorerApi);
    }

    #[test]
    fn native_auto_with_no_native_route_is_unavailable() {
        let avail = BackendAvailability {
            node_direct: false,
            explorer_api: false,
            wrapped_token: true,
        };
        let err = select(&Address::new(DOGE), MethodChoice::Auto, &avail).unwrap_err();
        assert!(matches!(err, DogepayError::BackendUnavailable(_)));
    }

    #[test]
    fn evm_auto_is_wrapped_regardless_of_other_routes() {
        for (node, explorer) in [(false, false), (true, false), (false, true), (true, true)] {
            let avail = BackendAvailability {
                node_direct: node,
                explorer_api: explorer,
                wrapped_token: true,
            };
            let method = select(&Address::new(EVM), MethodChoice::Auto, &avail).unwrap();
            assert_eq!(method, PayoutMethod::WrappedToken);
        }
    }

    #[test]
    fn evm_auto_without_wrapped_backend_is_unavailable() {
        let avail = BackendAvailability {
            node_direct: true,
            explorer_api: true,
            wrapped_token: false,
        };
        let err = select(&Address::new(EVM), MethodChoice::Auto, &avail).unwrap_err();
        assert!(matches!(
            err,
            DogepayError::BackendUnavailable(PayoutMethod::WrappedToken)
        ));
    }

    #[test]
    fn garbage_address_is_invalid_destination() {
        let err = select(&Address::new("not-an-address"), MethodChoice::Auto, &all_available())
            .unwrap_err();
        assert!(matches!(err, DogepayError::InvalidDestination { .. }));
    }

    #[test]
    fn explicit_method_enforces_its_grammar() {
        // EVM address explicitly routed to the node backend: rejected even
        // though auto-detection would happily pick wrapped-token.
        let err = select(
            &Address::new(EVM),
            MethodChoice::Explicit(PayoutMethod::NodeDirect),
            &all_available(),
        )
        .unwrap_err();
        assert!(matches!(err, DogepayError::InvalidDestination { .. }));

        let err = select(
            &Address::new(DOGE),
            MethodChoice::Explicit(PayoutMethod::WrappedToken),
            &all_available(),
        )
        .unwrap_err();
        assert!(matches!(err, DogepayError::InvalidDestination { .. }));
    }

    #[test]
    fn explicit_method_honored_when_valid() {
        let method = select(
            &Address::new(DOGE),
            MethodChoice::Explicit(PayoutMethod::ExplorerApi),
            &all_available(),
        )
        .unwrap();
        assert_eq!(method, PayoutMethod::ExplorerApi);
    }

    #[test]
    fn explicit_unavailable_backend_rejected() {
        let avail = BackendAvailability {
            node_direct: false,
            explorer_api: true,
            wrapped_token: true,
        };
        let err = select(
            &Address::new(DOGE),
            MethodChoice::Explicit(PayoutMethod::NodeDirect),
            &avail,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DogepayError::BackendUnavailable(PayoutMethod::NodeDirect)
        ));
    }

    #[test]
    fn selection_is_deterministic() {
        let avail = all_available();
        let first = select(&Address::new(DOGE), MethodChoice::Auto, &avail).unwrap();
        for _ in 0..10 {
            assert_eq!(
                select(&Address::new(DOGE), MethodChoice::Auto, &avail).unwrap(),
                first
            );
        }
    }
}
