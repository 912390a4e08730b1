//! Sync coordination.
//!
//! # Responsibilities
//! - Hold the current snapshot of each account behind an atomic pointer
//! - Run at most one sync per account at a time
//! - Publish a new snapshot only when a sync succeeds
//!
//! Syncs of different accounts run concurrently. A pending operation recorded
//! while a sync of the same account is in flight is carried into the
//! snapshot that sync publishes.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::account::{Account, Operation};
use crate::bridge::error::BroadcastError;
use crate::bridge::FamilyRegistry;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::pending::add_pending_operation;

/// Shared, atomically replaced account snapshot.
#[derive(Debug)]
pub struct AccountHandle {
    current: ArcSwap<Account>,
}

impl AccountHandle {
    pub fn new(account: Account) -> Self {
        Self {
            current: ArcSwap::from_pointee(account),
        }
    }

    /// Current snapshot. Never observes a partially applied sync.
    pub fn load(&self) -> Arc<Account> {
        self.current.load_full()
    }

    /// Record a broadcast operation as pending on the current snapshot.
    pub fn record_pending(&self, operation: Operation) -> Result<Arc<Account>, BroadcastError> {
        if operation.hash.is_empty() {
            return Err(BroadcastError::MissingHash);
        }
        self.current.rcu(|current| match add_pending_operation(current, operation.clone()) {
            Ok(next) => Arc::new(next),
            Err(_) => Arc::clone(current),
        });
        Ok(self.load())
    }
}

/// Pending operations recorded on `latest` since `base` was loaded, followed
/// by the pending operations that survived the sync.
fn carry_pending(latest: &Account, base: &Account, synced: &Account) -> Account {
    let known: HashSet<&str> = base.pending_operations.iter().map(|op| op.id.as_str()).collect();
    let mut pending: Vec<Operation> = latest
        .pending_operations
        .iter()
        .filter(|op| !known.contains(op.id.as_str()))
        .cloned()
        .collect();
    pending.extend(synced.pending_operations.iter().cloned());

    Account {
        pending_operations: pending,
        ..synced.clone()
    }
}

/// Serializes syncs per account and publishes their results.
#[derive(Debug)]
pub struct SyncCoordinator {
    registry: Arc<FamilyRegistry>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl SyncCoordinator {
    pub fn new(registry: Arc<FamilyRegistry>) -> Self {
        Self {
            registry,
            in_flight: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &FamilyRegistry {
        &self.registry
    }

    /// Sync the account behind `handle`.
    ///
    /// Waits for any sync of the same account already running, then syncs
    /// from the snapshot it left. On error the handle is left untouched.
    pub async fn sync(&self, handle: &AccountHandle) -> SyncResult<Arc<Account>> {
        let account_id = handle.load().id.clone();
        let lock = self
            .in_flight
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        let base = handle.load();
        let bridge = self
            .registry
            .get(base.family)
            .ok_or(SyncError::UnsupportedFamily(base.family))?;
        let synced = Arc::new(bridge.sync(&base).await?);

        handle.current.rcu(|latest| {
            if Arc::ptr_eq(latest, &base) {
                Arc::clone(&synced)
            } else {
                Arc::new(carry_pending(latest, &base, &synced))
            }
        });
        Ok(handle.load())
    }

    /// Sync several accounts concurrently. Results keep the input order.
    pub async fn sync_many(&self, handles: &[Arc<AccountHandle>]) -> Vec<SyncResult<Arc<Account>>> {
        join_all(handles.iter().map(|handle| self.sync(handle))).await
    }
}
