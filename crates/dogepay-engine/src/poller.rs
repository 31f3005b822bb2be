//! # Confirmation Poller
//!
//! Background task that advances in-flight withdrawals to a terminal state.
//! Each tick it sweeps every `Processing` record that has a backend
//! reference, re-queries the owning backend, and either updates the
//! confirmation count or drives a terminal transition.
//!
//! All writes go through the same per-record lock as the orchestrator's
//! dispatch step, so the two never race on one record. Ordinary slow
//! transfers keep retrying; only an explicit rejection, an
//! unknown-reference grace expiry, or the operator's maximum wait bound
//! fails a dispatched withdrawal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dogepay_backends::TransferState;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::WithdrawalEngine;

/// Periodic confirmation sweep over the transaction store.
pub struct ConfirmationPoller {
    engine: Arc<WithdrawalEngine>,
    running: Arc<AtomicBool>,
}

impl ConfirmationPoller {
    #[must_use]
    pub fn new(engine: Arc<WithdrawalEngine>) -> Self {
        Self {
            engine,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background loop. Returns `None` if already running.
    ///
    /// The returned handle completes after [`Self::stop`]; await it for a
    /// clean shutdown.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("confirmation poller already running");
            return None;
        }

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let period_ms = self.engine.config.poll_interval_ms;

        Some(tokio::spawn(async move {
            let mut ticker = interval(engine.config.poll_interval());
            tracing::info!(period_ms, "confirmation poller started");

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                Self::sweep(&engine).await;
            }

            tracing::info!("confirmation poller stopped");
        }))
    }

    /// Signal the loop to exit after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One sweep over all dispatched, non-terminal withdrawals. Public so
    /// tests (and embedders with their own schedulers) can drive ticks
    /// directly.
    pub async fn sweep(engine: &Arc<WithdrawalEngine>) {
        for id in engine.store.processing_with_reference().await {
            let Some(handle) = engine.store.handle(id).await else {
                continue;
            };

            let (method, reference, dispatched_at) = {
                let tx = handle.lock().await;
                if tx.is_terminal() {
                    continue;
                }
                let (Some(method), Some(reference)) = (tx.method, tx.backend_reference.clone())
                else {
                    continue;
                };
                (method, reference, tx.dispatched_at)
            };

            let Some(backend) = engine.registry.get(method) else {
                engine
                    .fail_and_release(&handle, format!("backend {method} is no longer registered"))
                    .await;
                continue;
            };

            let status = match backend.transfer_status(&reference).await {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(%id, %err, "confirmation query failed; will retry");
                    continue;
                }
            };

            tracing::debug!(
                %id, confirmations = status.confirmations, state = %status.state,
                "confirmation update"
            );

            match status.state {
                TransferState::Confirmed => {
                    engine.complete(&handle, status.confirmations).await;
                }
                TransferState::Rejected => {
                    engine
                        .fail_and_release(&handle, "backend reported the transfer as rejected")
                        .await;
                }
                TransferState::Pending => {
                    if status.confirmations >= backend.required_confirmations() {
                        engine.complete(&handle, status.confirmations).await;
                    } else if dispatched_at.is_some_and(|at| {
                        Utc::now() - at > engine.config.max_confirmation_wait()
                    }) {
                        engine
                            .fail_and_release(
                                &handle,
                                format!(
                                    "transfer unconfirmed after maximum wait of {}ms",
                                    engine.config.max_confirmation_wait_ms
                                ),
                            )
                            .await;
                    } else {
                        let mut tx = handle.lock().await;
                        if !tx.is_terminal() {
                            tx.set_confirmations(status.confirmations);
                        }
                    }
                }
                TransferState::Unknown => {
                    if dispatched_at
                        .is_some_and(|at| Utc::now() - at > engine.config.reference_grace())
                    {
                        engine
                            .fail_and_release(
                                &handle,
                                format!(
                                    "backend did not recognize reference {reference} within the \
                                     {}ms grace period",
                                    engine.config.reference_grace_ms
                                ),
                            )
                            .await;
                    }
                    // Within grace: transient backend lag, retry next tick.
                }
            }
        }
    }
}
