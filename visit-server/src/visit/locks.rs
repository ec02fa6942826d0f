//! Per-table serialization
//!
//! Every mutating engine operation holds the guard of its table for the whole
//! transaction. Different tables map to different mutexes and never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 桌台锁表 (table id → mutex)
#[derive(Debug, Clone, Default)]
pub struct TableLocks {
    inner: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one table
    pub async fn lock(&self, table_id: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out before awaiting: a DashMap shard guard must not
        // be held across an await point
        let mutex = self
            .inner
            .entry(table_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop the mutex of a deleted table
    pub fn forget(&self, table_id: i64) {
        self.inner.remove(&table_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_table_is_exclusive() {
        let locks = TableLocks::new();
        let guard = locks.lock(1).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock(1).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_tables_do_not_block() {
        let locks = TableLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock(2)).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
