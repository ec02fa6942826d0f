//! 员工能力图
//!
//! Groups carry granted action names and may inherit from parent groups.
//! A user's capability set is the union over every group reachable from
//! their direct memberships. The walk is iterative with a visited set, so
//! cyclic parent chains terminate.
//!
//! Resolved sets are cached per user and dropped wholesale whenever the graph
//! changes through this type. Every change also bumps a generation counter;
//! a set computed under an older generation is returned but never cached.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::db::repository::staff;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Group whose members may do everything
pub const ADMIN_GROUP: &str = "admin";
/// Grant that allows every action
pub const ALL_ACTIONS: &str = "all";

/// Resolved actions of one user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    unrestricted: bool,
    actions: HashSet<String>,
}

impl CapabilitySet {
    pub fn new(actions: impl IntoIterator<Item = String>, admin_member: bool) -> Self {
        let actions: HashSet<String> = actions.into_iter().collect();
        Self {
            unrestricted: admin_member || actions.contains(ALL_ACTIONS),
            actions,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Exact grant, or a `prefix:*` grant covering the action
    pub fn allows(&self, action: &str) -> bool {
        if self.unrestricted || self.actions.contains(action) {
            return true;
        }
        self.actions.iter().any(|granted| {
            granted
                .strip_suffix(":*")
                .is_some_and(|prefix| action.strip_prefix(prefix).is_some_and(|rest| rest.starts_with(':')))
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }
}

/// Every group reachable from `start` through parent edges (start included)
pub fn reachable_groups(start: &[i64], parents: &HashMap<i64, Vec<i64>>) -> HashSet<i64> {
    let mut visited: HashSet<i64> = HashSet::new();
    let mut queue: VecDeque<i64> = start.iter().copied().collect();
    while let Some(group) = queue.pop_front() {
        if !visited.insert(group) {
            continue;
        }
        if let Some(next) = parents.get(&group) {
            queue.extend(next.iter().copied().filter(|g| !visited.contains(g)));
        }
    }
    visited
}

/// Union of the grants of `groups`
pub fn reachable_actions(groups: &HashSet<i64>, grants: &[(i64, String)]) -> HashSet<String> {
    grants
        .iter()
        .filter(|(group, _)| groups.contains(group))
        .map(|(_, action)| action.clone())
        .collect()
}

/// 能力解析与缓存
#[derive(Clone)]
pub struct CapabilityGraph {
    pool: SqlitePool,
    cache: Arc<DashMap<i64, Arc<CapabilitySet>>>,
    generation: Arc<AtomicU64>,
}

impl CapabilityGraph {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cache: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Capability set of an active staff user
    pub async fn resolve(&self, user_id: i64) -> AppResult<Arc<CapabilitySet>> {
        if let Some(cached) = self.cache.get(&user_id) {
            return Ok(cached.clone());
        }
        let seen = self.generation.load(Ordering::Acquire);

        let user = staff::find_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::StaffUserNotFound).with_detail("userId", user_id))?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        let direct = staff::groups_of_user(&self.pool, user_id).await?;
        let mut parents: HashMap<i64, Vec<i64>> = HashMap::new();
        for (group, parent) in staff::all_parent_edges(&self.pool).await? {
            parents.entry(group).or_default().push(parent);
        }
        let grants = staff::all_grants(&self.pool).await?;
        let names: HashMap<i64, String> = staff::all_groups(&self.pool)
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

        let start: Vec<i64> = direct.iter().map(|g| g.id).collect();
        let groups = reachable_groups(&start, &parents);
        let admin_member = groups
            .iter()
            .any(|g| names.get(g).is_some_and(|name| name == ADMIN_GROUP));
        let set = Arc::new(CapabilitySet::new(reachable_actions(&groups, &grants), admin_member));

        self.store(user_id, set.clone(), seen);
        Ok(set)
    }

    /// `HasCapability(actor, action)`
    pub async fn has_capability(&self, user_id: i64, action: &str) -> AppResult<bool> {
        Ok(self.resolve(user_id).await?.allows(action))
    }

    // ========== Graph changes (drop cached sets) ==========

    pub async fn add_membership(&self, user_id: i64, group_id: i64) -> AppResult<()> {
        staff::add_membership(&self.pool, user_id, group_id).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn remove_membership(&self, user_id: i64, group_id: i64) -> AppResult<()> {
        staff::remove_membership(&self.pool, user_id, group_id).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn add_parent(&self, group_id: i64, parent_id: i64) -> AppResult<()> {
        staff::add_parent(&self.pool, group_id, parent_id).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn grant(&self, group_id: i64, action: &str) -> AppResult<()> {
        staff::grant_action(&self.pool, group_id, action).await?;
        self.invalidate();
        Ok(())
    }

    /// Look a group up by name
    pub async fn group_id(&self, name: &str) -> AppResult<i64> {
        staff::find_group_by_name(&self.pool, name)
            .await?
            .map(|g| g.id)
            .ok_or_else(|| AppError::new(ErrorCode::GroupNotFound).with_detail("name", name))
    }

    /// Cache `set` unless the graph changed since `seen` was read.
    ///
    /// The generation is compared while the shard is write-locked. `invalidate`
    /// bumps before it clears, so a set stored under the old generation is
    /// still swept by that clear.
    fn store(&self, user_id: i64, set: Arc<CapabilitySet>, seen: u64) -> bool {
        match self.cache.entry(user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                if self.generation.load(Ordering::Acquire) != seen {
                    return false;
                }
                slot.insert(set);
                true
            }
        }
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.clear();
    }

    pub fn cached_users(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(i64, i64)]) -> HashMap<i64, Vec<i64>> {
        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        for (g, p) in pairs {
            map.entry(*g).or_default().push(*p);
        }
        map
    }

    #[test]
    fn test_inherited_grants() {
        // cashier(3) -> waiter(2)
        let parents = edges(&[(3, 2)]);
        let grants = vec![(2, "orders:view".to_string()), (3, "tickets:issue".to_string())];
        let groups = reachable_groups(&[3], &parents);
        let actions = reachable_actions(&groups, &grants);
        assert!(actions.contains("orders:view"));
        assert!(actions.contains("tickets:issue"));

        let waiter = reachable_actions(&reachable_groups(&[2], &parents), &grants);
        assert!(!waiter.contains("tickets:issue"));
    }

    #[test]
    fn test_cycles_terminate() {
        let parents = edges(&[(1, 2), (2, 3), (3, 1), (3, 3)]);
        let groups = reachable_groups(&[1], &parents);
        assert_eq!(groups, HashSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_set_computed_before_change_is_not_cached() {
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let graph = CapabilityGraph::new(pool);
        let stale = Arc::new(CapabilitySet::new(["orders:view".to_string()], false));

        // 计算期间图发生了变化
        let seen = graph.generation.load(Ordering::Acquire);
        graph.invalidate();
        assert!(!graph.store(7, stale.clone(), seen));
        assert_eq!(graph.cached_users(), 0);

        let fresh = graph.generation.load(Ordering::Acquire);
        assert!(graph.store(7, stale, fresh));
        assert_eq!(graph.cached_users(), 1);
        graph.invalidate();
        assert_eq!(graph.cached_users(), 0);
    }

    #[test]
    fn test_wildcard_and_all() {
        let set = CapabilitySet::new(["tickets:*".to_string()], false);
        assert!(set.allows("tickets:issue"));
        assert!(!set.allows("ticketsx:issue"));
        assert!(!set.allows("orders:view"));

        let all = CapabilitySet::new([ALL_ACTIONS.to_string()], false);
        assert!(all.allows("tables:delete"));
        assert!(CapabilitySet::new([], true).allows("anything:at_all"));
        assert!(!CapabilitySet::default().allows("tables:view"));
    }
}
