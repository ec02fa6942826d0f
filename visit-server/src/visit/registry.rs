//! TableRegistry - 桌台状态与访问密钥
//!
//! Single source of truth for whether a table accepts orders and for the
//! secret material of its current visit.
//!
//! # Invariant
//!
//! `visit_token` is set only while `is_open`; every closed → open transition
//! stores a fresh token and a fresh verification code. Both are dropped on
//! close.

use ring::rand::SystemRandom;
use shared::models::DiningTable;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::OwnedMutexGuard;

use super::locks::TableLocks;
use super::secrets;
use crate::db::repository::{RepoError, dining_table, order};
use crate::security_log;
use crate::utils::validation::validate_table_number;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Result of opening a table
#[derive(Debug, Clone)]
pub struct VisitOpening {
    pub table: DiningTable,
    pub visit_token: String,
    pub verification_code: String,
    /// A new visit started (the table was closed before)
    pub rotated: bool,
}

#[derive(Clone)]
pub struct TableRegistry {
    pool: SqlitePool,
    locks: TableLocks,
    rng: SystemRandom,
}

fn table_not_found(key: &str, value: i64) -> AppError {
    AppError::new(ErrorCode::TableNotFound).with_detail(key, value)
}

fn map_duplicate(err: RepoError, number: i64) -> AppError {
    match err {
        RepoError::Duplicate(_) => {
            AppError::new(ErrorCode::TableNumberExists).with_detail("number", number)
        }
        other => other.into(),
    }
}

impl TableRegistry {
    pub fn new(pool: SqlitePool, locks: TableLocks) -> Self {
        Self {
            pool,
            locks,
            rng: SystemRandom::new(),
        }
    }

    /// Shared per-table lock map
    pub fn locks(&self) -> &TableLocks {
        &self.locks
    }

    /// Lock a table that exists, returning the row read under the lock.
    ///
    /// Unknown ids fail `TableNotFound` without leaving a mutex behind; a
    /// table removed while we waited releases its mutex as well.
    pub(crate) async fn lock_existing(
        &self,
        table_id: i64,
    ) -> AppResult<(OwnedMutexGuard<()>, DiningTable)> {
        if dining_table::find_by_id(&self.pool, table_id).await?.is_none() {
            return Err(table_not_found("id", table_id));
        }
        let guard = self.locks.lock(table_id).await;
        match dining_table::find_by_id(&self.pool, table_id).await? {
            Some(table) => Ok((guard, table)),
            None => {
                drop(guard);
                self.locks.forget(table_id);
                Err(table_not_found("id", table_id))
            }
        }
    }

    // ========== Visit lifecycle ==========

    /// Open a table by number.
    ///
    /// Idempotent: an open table returns its current token and code.
    pub async fn open(&self, number: i64) -> AppResult<VisitOpening> {
        let table = self.get(number).await?;
        let _guard = self.locks.lock(table.id).await;
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        self.open_in(&mut conn, table.id).await
    }

    /// Open inside the caller's transaction. Caller holds the table lock.
    pub(crate) async fn open_in(
        &self,
        conn: &mut SqliteConnection,
        table_id: i64,
    ) -> AppResult<VisitOpening> {
        let candidate_token = secrets::visit_token(&self.rng)?;
        let candidate_code = secrets::verification_code(&self.rng)?;
        let now = shared::util::now_millis();

        let table = dining_table::open_visit(
            &mut *conn,
            table_id,
            &candidate_token,
            &candidate_code,
            now,
        )
        .await?
        .ok_or_else(|| table_not_found("id", table_id))?;

        let (Some(visit_token), Some(verification_code)) =
            (table.visit_token.clone(), table.verification_code.clone())
        else {
            return Err(AppError::internal(format!(
                "Table {} is open without visit secrets",
                table.id
            )));
        };
        let rotated = visit_token == candidate_token;

        if rotated {
            security_log!(INFO, "table_opened", table_id = table.id, number = table.number);
        }

        Ok(VisitOpening {
            table,
            visit_token,
            verification_code,
            rotated,
        })
    }

    /// Close a table and drop its visit secrets. Closing a closed table is a no-op.
    pub async fn close(&self, table_id: i64) -> AppResult<()> {
        let (_guard, _) = self.lock_existing(table_id).await?;
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        self.close_in(&mut conn, table_id).await
    }

    /// Close inside the caller's transaction. Caller holds the table lock.
    pub(crate) async fn close_in(&self, conn: &mut SqliteConnection, table_id: i64) -> AppResult<()> {
        let matched = dining_table::close_visit(&mut *conn, table_id, shared::util::now_millis()).await?;
        if matched == 0 {
            return Err(table_not_found("id", table_id));
        }
        security_log!(INFO, "table_closed", table_id = table_id);
        Ok(())
    }

    /// True iff the table is open and `code` is its current verification code
    pub async fn verify_code(&self, number: i64, code: &str) -> AppResult<bool> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(false);
        }
        let Some(table) = dining_table::find_by_number(&self.pool, number).await? else {
            return Ok(false);
        };
        Ok(table.is_open
            && table
                .verification_code
                .as_deref()
                .is_some_and(|current| secrets::secrets_match(current, code)))
    }

    // ========== Lookups ==========

    pub async fn get(&self, number: i64) -> AppResult<DiningTable> {
        dining_table::find_by_number(&self.pool, number)
            .await?
            .ok_or_else(|| table_not_found("number", number))
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<DiningTable> {
        dining_table::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| table_not_found("id", id))
    }

    pub async fn list(&self) -> AppResult<Vec<DiningTable>> {
        Ok(dining_table::find_all(&self.pool).await?)
    }

    // ========== Administration ==========

    /// Register a physical table (created closed)
    pub async fn add(&self, number: i64) -> AppResult<DiningTable> {
        validate_table_number(number)?;
        let id = shared::util::snowflake_id();
        let now = shared::util::now_millis();
        dining_table::insert(&self.pool, id, number, now)
            .await
            .map_err(|e| map_duplicate(e, number))?;

        tracing::info!(table_id = id, number, "Table added");
        Ok(DiningTable {
            id,
            number,
            is_open: false,
            visit_token: None,
            verification_code: None,
            updated_at: now,
        })
    }

    /// Renumber a table
    pub async fn modify(&self, id: i64, number: i64) -> AppResult<DiningTable> {
        validate_table_number(number)?;
        let (_guard, _) = self.lock_existing(id).await?;
        let updated = dining_table::update_number(&self.pool, id, number, shared::util::now_millis())
            .await
            .map_err(|e| map_duplicate(e, number))?;
        if updated == 0 {
            return Err(table_not_found("id", id));
        }
        self.get_by_id(id).await
    }

    /// Delete a closed table that no order references. Sessions go with it.
    pub async fn remove(&self, id: i64) -> AppResult<()> {
        let (guard, table) = self.lock_existing(id).await?;
        if table.is_open {
            return Err(AppError::new(ErrorCode::TableOccupied).with_detail("id", id));
        }
        let orders = order::count_for_table(&self.pool, id).await?;
        if orders > 0 {
            return Err(AppError::new(ErrorCode::TableHasOrders)
                .with_detail("id", id)
                .with_detail("orders", orders));
        }
        dining_table::delete(&self.pool, id).await?;
        drop(guard);
        self.locks.forget(id);

        tracing::info!(table_id = id, number = table.number, "Table removed");
        Ok(())
    }
}
