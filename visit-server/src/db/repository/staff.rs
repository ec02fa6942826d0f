//! Staff Repository - users, groups and the group graph

use super::{RepoError, RepoResult};
use sqlx::SqliteExecutor;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffGroup {
    pub id: i64,
    pub name: String,
}

pub async fn find_user<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<StaffUser>> {
    let user = sqlx::query_as::<_, StaffUser>(
        "SELECT id, username, is_active, created_at FROM staff_user WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_user_by_username<'e>(
    db: impl SqliteExecutor<'e>,
    username: &str,
) -> RepoResult<Option<StaffUser>> {
    let user = sqlx::query_as::<_, StaffUser>(
        "SELECT id, username, is_active, created_at FROM staff_user WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn create_user<'e>(db: impl SqliteExecutor<'e>, username: &str) -> RepoResult<StaffUser> {
    if username.trim().is_empty() {
        return Err(RepoError::Validation("Username must not be empty".into()));
    }
    let user = sqlx::query_as::<_, StaffUser>(
        "INSERT INTO staff_user (id, username, is_active, created_at) VALUES (?, ?, 1, ?) RETURNING id, username, is_active, created_at",
    )
    .bind(shared::util::snowflake_id())
    .bind(username)
    .bind(shared::util::now_millis())
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn create_group<'e>(db: impl SqliteExecutor<'e>, name: &str) -> RepoResult<StaffGroup> {
    let group = sqlx::query_as::<_, StaffGroup>(
        "INSERT INTO staff_group (id, name) VALUES (?, ?) RETURNING id, name",
    )
    .bind(shared::util::snowflake_id())
    .bind(name)
    .fetch_one(db)
    .await?;
    Ok(group)
}

pub async fn find_group_by_name<'e>(
    db: impl SqliteExecutor<'e>,
    name: &str,
) -> RepoResult<Option<StaffGroup>> {
    let group = sqlx::query_as::<_, StaffGroup>("SELECT id, name FROM staff_group WHERE name = ?")
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(group)
}

pub async fn add_membership<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    group_id: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO staff_user_group (user_id, group_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(group_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_membership<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    group_id: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM staff_user_group WHERE user_id = ? AND group_id = ?")
        .bind(user_id)
        .bind(group_id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn add_parent<'e>(
    db: impl SqliteExecutor<'e>,
    group_id: i64,
    parent_id: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO staff_group_parent (group_id, parent_id) VALUES (?, ?)")
        .bind(group_id)
        .bind(parent_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn grant_action<'e>(
    db: impl SqliteExecutor<'e>,
    group_id: i64,
    action: &str,
) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO staff_group_action (group_id, action) VALUES (?, ?)")
        .bind(group_id)
        .bind(action)
        .execute(db)
        .await?;
    Ok(())
}

/// Direct group memberships of a user (groups named, not inherited)
pub async fn groups_of_user<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
) -> RepoResult<Vec<StaffGroup>> {
    let groups = sqlx::query_as::<_, StaffGroup>(
        "SELECT g.id, g.name FROM staff_group g JOIN staff_user_group ug ON ug.group_id = g.id WHERE ug.user_id = ?",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(groups)
}

pub async fn all_groups<'e>(db: impl SqliteExecutor<'e>) -> RepoResult<Vec<StaffGroup>> {
    let groups = sqlx::query_as::<_, StaffGroup>("SELECT id, name FROM staff_group")
        .fetch_all(db)
        .await?;
    Ok(groups)
}

/// Every (group, parent) edge
pub async fn all_parent_edges<'e>(db: impl SqliteExecutor<'e>) -> RepoResult<Vec<(i64, i64)>> {
    let edges = sqlx::query_as::<_, (i64, i64)>("SELECT group_id, parent_id FROM staff_group_parent")
        .fetch_all(db)
        .await?;
    Ok(edges)
}

/// Every (group, action) grant
pub async fn all_grants<'e>(db: impl SqliteExecutor<'e>) -> RepoResult<Vec<(i64, String)>> {
    let grants = sqlx::query_as::<_, (i64, String)>("SELECT group_id, action FROM staff_group_action")
        .fetch_all(db)
        .await?;
    Ok(grants)
}
