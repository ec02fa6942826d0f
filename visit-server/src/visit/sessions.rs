//! VisitSessionManager - 顾客设备会话
//!
//! Binds anonymous devices to the current visit of a table.
//!
//! A session is valid only while all three hold:
//! - the session is active
//! - its table is open
//! - its visit token equals the table's live token
//!
//! The token comparison alone rejects sessions from a previous visit, so
//! explicit invalidation only narrows the window, it is not load-bearing.

use ring::rand::SystemRandom;
use shared::models::{DeviceSession, SessionValidation};
use sqlx::{SqliteConnection, SqlitePool};
use std::time::Duration;

use super::registry::{TableRegistry, VisitOpening};
use super::secrets;
use crate::db::repository::{RepoError, device_session};
use crate::security_log;
use crate::utils::validation::MAX_SECRET_LEN;
use crate::utils::{AppError, AppResult, ErrorCode};

/// A freshly issued device session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: String,
    pub visit_token: String,
    pub table_id: i64,
    pub table_number: i64,
}

/// Caller of an anonymous order, resolved from a valid session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedVisit {
    pub session_id: String,
    pub table_id: i64,
    pub table_number: i64,
    pub visit_token: String,
}

#[derive(Clone)]
pub struct VisitSessionManager {
    pool: SqlitePool,
    registry: TableRegistry,
    rng: SystemRandom,
}

impl VisitSessionManager {
    pub fn new(pool: SqlitePool, registry: TableRegistry) -> Self {
        Self {
            pool,
            registry,
            rng: SystemRandom::new(),
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// QR scan: open the table if needed and issue a session for this device.
    ///
    /// When the scan starts a new visit, every older session of the table is
    /// deactivated in the same transaction, before the new one is stored.
    pub async fn open_visit(&self, table_number: i64) -> AppResult<IssuedSession> {
        let table = self.registry.get(table_number).await?;
        let _guard = self.registry.locks().lock(table.id).await;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let opening = self.open_and_rotate(&mut tx, table.id).await?;

        let now = shared::util::now_millis();
        let session = DeviceSession {
            id: secrets::session_id(&self.rng)?,
            table_id: opening.table.id,
            visit_token: opening.visit_token.clone(),
            is_active: true,
            created_at: now,
            last_activity_at: now,
        };
        device_session::insert(&mut *tx, &session).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            table_id = opening.table.id,
            table_number = opening.table.number,
            rotated = opening.rotated,
            "Device session issued"
        );

        Ok(IssuedSession {
            session_id: session.id,
            visit_token: opening.visit_token,
            table_id: opening.table.id,
            table_number: opening.table.number,
        })
    }

    /// Staff opening from the table status screen. Same rotation rules, no device session.
    pub async fn open_table(&self, table_id: i64) -> AppResult<VisitOpening> {
        let (_guard, _) = self.registry.lock_existing(table_id).await?;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let opening = self.open_and_rotate(&mut tx, table_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(opening)
    }

    async fn open_and_rotate(
        &self,
        conn: &mut SqliteConnection,
        table_id: i64,
    ) -> AppResult<VisitOpening> {
        let opening = self.registry.open_in(&mut *conn, table_id).await?;
        if opening.rotated {
            let revoked = device_session::deactivate_for_table(&mut *conn, table_id).await?;
            if revoked > 0 {
                tracing::info!(table_id, revoked, "Sessions of the previous visit revoked");
            }
        }
        Ok(opening)
    }

    /// Check a device session against the live table state.
    ///
    /// Lock-free: one joined read plus an activity touch.
    pub async fn validate(&self, session_id: &str, visit_token: &str) -> AppResult<SessionValidation> {
        Ok(match self.resolve(session_id, visit_token).await? {
            Some(visit) => SessionValidation::valid(visit.visit_token, visit.table_number),
            None => SessionValidation::invalid(),
        })
    }

    async fn resolve(&self, session_id: &str, visit_token: &str) -> AppResult<Option<ValidatedVisit>> {
        if session_id.is_empty()
            || visit_token.is_empty()
            || session_id.len() > MAX_SECRET_LEN
            || visit_token.len() > MAX_SECRET_LEN
        {
            return Ok(None);
        }

        let Some(binding) = device_session::find_binding(&self.pool, session_id).await? else {
            security_log!(WARN, "session_unknown", reason = "not_found");
            return Ok(None);
        };

        let live_token = match (&binding.table_token, binding.table_open, binding.is_active) {
            (Some(token), true, true) => token,
            _ => {
                security_log!(
                    WARN,
                    "session_rejected",
                    table_id = binding.table_id,
                    active = binding.is_active,
                    table_open = binding.table_open
                );
                return Ok(None);
            }
        };

        if !secrets::secrets_match(&binding.session_token, live_token)
            || !secrets::secrets_match(visit_token, live_token)
        {
            security_log!(WARN, "session_rejected", table_id = binding.table_id, reason = "token_mismatch");
            return Ok(None);
        }

        device_session::touch(&self.pool, &binding.session_id, shared::util::now_millis()).await?;

        Ok(Some(ValidatedVisit {
            session_id: binding.session_id,
            table_id: binding.table_id,
            table_number: binding.table_number,
            visit_token: live_token.clone(),
        }))
    }

    /// Deactivate every session of a table
    pub async fn invalidate_all(&self, table_id: i64) -> AppResult<u64> {
        let (_guard, _) = self.registry.lock_existing(table_id).await?;
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        self.invalidate_all_in(&mut conn, table_id).await
    }

    /// Deactivate inside the caller's transaction. Caller holds the table lock.
    pub(crate) async fn invalidate_all_in(
        &self,
        conn: &mut SqliteConnection,
        table_id: i64,
    ) -> AppResult<u64> {
        let revoked = device_session::deactivate_for_table(&mut *conn, table_id).await?;
        security_log!(INFO, "sessions_invalidated", table_id = table_id, revoked = revoked);
        Ok(revoked)
    }

    /// Gate for anonymous order placement.
    ///
    /// Fails `SessionInvalid` when the session does not validate and
    /// `SessionTableMismatch` when it belongs to another table.
    pub async fn validate_order_request(
        &self,
        session_id: &str,
        visit_token: &str,
        table_number: i64,
    ) -> AppResult<ValidatedVisit> {
        let visit = self
            .resolve(session_id, visit_token)
            .await?
            .ok_or_else(AppError::session_invalid)?;

        if visit.table_number != table_number {
            security_log!(
                WARN,
                "session_table_mismatch",
                session_table = visit.table_number,
                requested_table = table_number
            );
            return Err(AppError::new(ErrorCode::SessionTableMismatch)
                .with_detail("tableNumber", table_number));
        }
        Ok(visit)
    }

    /// Mark sessions idle for longer than `idle` inactive. Housekeeping only.
    pub async fn sweep_idle(&self, idle: Duration) -> AppResult<u64> {
        let idle_ms = i64::try_from(idle.as_millis()).unwrap_or(i64::MAX);
        let cutoff = shared::util::now_millis().saturating_sub(idle_ms);
        let swept = device_session::deactivate_idle(&self.pool, cutoff).await?;
        if swept > 0 {
            tracing::debug!(swept, "Idle device sessions deactivated");
        }
        Ok(swept)
    }

    /// Sessions of a table, oldest first
    pub async fn sessions_of(&self, table_id: i64) -> AppResult<Vec<DeviceSession>> {
        Ok(device_session::find_by_table(&self.pool, table_id).await?)
    }
}
