//! Append-only transaction log.
//!
//! Every record sits behind its own mutex: the Withdrawal Orchestrator's
//! dispatch step and the Confirmation Poller's updates serialize on it, so
//! a record never sees two mutators at once. No record is ever removed.

use std::collections::HashMap;
use std::sync::Arc;

use dogepay_types::{Address, Transaction, TransactionId, WithdrawalStatus};
use tokio::sync::{Mutex, RwLock};

/// In-memory transaction store satisfying the append-only log contract.
pub struct TransactionStore {
    records: RwLock<HashMap<TransactionId, Arc<Mutex<Transaction>>>>,
}

impl TransactionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Append a record. Returns its id.
    pub async fn insert(&self, tx: Transaction) -> TransactionId {
        let id = tx.id;
        let mut records = self.records.write().await;
        records.insert(id, Arc::new(Mutex::new(tx)));
        tracing::debug!(%id, "transaction recorded");
        id
    }

    /// The per-record lock handle. Mutators (orchestrator, poller) go
    /// through this so state transitions serialize per transaction.
    pub async fn handle(&self, id: TransactionId) -> Option<Arc<Mutex<Transaction>>> {
        self.records.read().await.get(&id).map(Arc::clone)
    }

    /// A point-in-time copy of a record.
    pub async fn snapshot(&self, id: TransactionId) -> Option<Transaction> {
        let handle = self.handle(id).await?;
        let tx = handle.lock().await;
        Some(tx.clone())
    }

    /// All records for an account, newest first.
    pub async fn for_account(&self, account: &Address) -> Vec<Transaction> {
        let records = self.records.read().await;
        let mut out = Vec::new();
        for handle in records.values() {
            let tx = handle.lock().await;
            if tx.account == *account {
                out.push(tx.clone());
            }
        }
        drop(records);
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    /// The Confirmation Poller's work list: `Processing` records that
    /// already have a backend reference.
    pub async fn processing_with_reference(&self) -> Vec<TransactionId> {
        let records = self.records.read().await;
        let mut out = Vec::new();
        for (id, handle) in records.iter() {
            let tx = handle.lock().await;
            if tx.status == WithdrawalStatus::Processing && tx.backend_reference.is_some() {
                out.push(*id);
            }
        }
        out
    }

    /// Number of records in the log.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogepay_types::PayoutMethod;
    use rust_decimal::Decimal;

    fn alice() -> Address {
        Address::new("DBXu2kgc3xtvCUWFcxFE3r9hEYgmuaaCyD")
    }

    fn bob() -> Address {
        Address::new("DTnt7VZqR5ofHhAxZuDy4m3PhSjKFXpw3e")
    }

    fn withdrawal(account: Address) -> Transaction {
        Transaction::new_withdrawal(
            account,
            bob(),
            PayoutMethod::NodeDirect,
            Decimal::new(50, 0),
            Decimal::ONE,
        )
    }

    #[tokio::test]
    async fn insert_and_snapshot() {
        let store = TransactionStore::new();
        assert!(store.is_empty().await);

        let id = store.insert(withdrawal(alice())).await;
        assert_eq!(store.len().await, 1);

        let snap = store.snapshot(id).await.unwrap();
        assert_eq!(snap.id, id);
        assert_eq!(snap.status, WithdrawalStatus::Pending);
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let store = TransactionStore::new();
        assert!(store.snapshot(TransactionId::new()).await.is_none());
        assert!(store.handle(TransactionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn mutations_through_handle_are_visible() {
        let store = TransactionStore::new();
        let id = store.insert(withdrawal(alice())).await;

        {
            let handle = store.handle(id).await.unwrap();
            let mut tx = handle.lock().await;
            tx.mark_processing().unwrap();
            tx.record_dispatch("cafe".repeat(16), None);
        }

        let snap = store.snapshot(id).await.unwrap();
        assert_eq!(snap.status, WithdrawalStatus::Processing);
        assert!(snap.backend_reference.is_some());
    }

    #[tokio::test]
    async fn history_is_per_account_newest_first() {
        let store = TransactionStore::new();
        let first = store.insert(Transaction::new_earning(alice(), Decimal::new(10, 0))).await;
        let second = store.insert(withdrawal(alice())).await;
        store.insert(Transaction::new_earning(bob(), Decimal::new(5, 0))).await;

        let history = store.for_account(&alice()).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second);
        assert_eq!(history[1].id, first);
    }

    #[tokio::test]
    async fn poller_work_list_filters_correctly() {
        let store = TransactionStore::new();

        // Pending: not in the work list.
        store.insert(withdrawal(alice())).await;

        // Processing without a reference: dispatch still in flight, skip.
        let no_ref = store.insert(withdrawal(alice())).await;
        {
            let handle = store.handle(no_ref).await.unwrap();
            handle.lock().await.mark_processing().unwrap();
        }

        // Processing with a reference: this is the poller's work.
        let with_ref = store.insert(withdrawal(alice())).await;
        {
            let handle = store.handle(with_ref).await.unwrap();
            let mut tx = handle.lock().await;
            tx.mark_processing().unwrap();
            tx.record_dispatch("ab".repeat(32), None);
        }

        // Terminal: never polled.
        let done = store.insert(withdrawal(alice())).await;
        {
            let handle = store.handle(done).await.unwrap();
            let mut tx = handle.lock().await;
            tx.mark_processing().unwrap();
            tx.record_dispatch("cd".repeat(32), None);
            tx.mark_completed().unwrap();
        }

        let work = store.processing_with_reference().await;
        assert_eq!(work, vec![with_ref]);
    }
}
