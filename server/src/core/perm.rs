//! Permission resolution and caching.
//!
//! Resolved permission sets are a derived, rebuildable projection of the role
//! graph and its grants — never a source of truth. The cache is keyed by
//! principal (`user_perms_{id}`) with a fixed TTL, but correctness rests on
//! push-based invalidation: every mutation of a grant or an assignment goes
//! through this service and invalidates the affected principals before
//! control returns to the caller. A cached "allow" surviving a revocation is
//! a security defect, not a staleness bug.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use collegio_types::directory_adapter::{
	CreateAssignmentData, CreateRoleData, DirectoryAdapter, PermScope, Role, RoleAssignment,
};

use crate::core::roles::RoleGraph;
use crate::prelude::*;
use crate::types::{AuthCtx, now};

/// Cache entry lifetime in seconds.
pub const PERM_CACHE_TTL: i64 = 3600;

/// Permission required to assign roles to other principals.
pub const PERM_ASSIGN_ROLE: &str = "users.assign_role";

// Cache keys are deterministic per (entity-kind, scope) pair so that
// invalidation-by-pattern stays tractable.
pub fn user_perms_key(user_id: UserId) -> String {
	format!("user_perms_{}", user_id.0)
}

pub fn org_tree_key(filter: ScopeFilter) -> String {
	match filter {
		ScopeFilter::Tenant(tn_id) => format!("org_tree_{}", tn_id.0),
		ScopeFilter::All => "org_tree_all".into(),
		ScopeFilter::Empty => "org_tree_none".into(),
	}
}

struct CacheEntry<T> {
	value: T,
	expires_at: i64,
}

impl<T: Clone> CacheEntry<T> {
	fn new(value: T, at: i64) -> Self {
		Self { value, expires_at: at + PERM_CACHE_TTL }
	}

	fn live(&self, at: i64) -> Option<T> {
		(self.expires_at > at).then(|| self.value.clone())
	}
}

pub type PermSet = Arc<HashSet<Box<str>>>;

pub struct PermissionService {
	directory: Arc<dyn DirectoryAdapter>,
	perms: RwLock<HashMap<String, CacheEntry<PermSet>>>,
	trees: RwLock<HashMap<String, CacheEntry<Arc<RoleGraph>>>>,
}

impl PermissionService {
	pub fn new(directory: Arc<dyn DirectoryAdapter>) -> Self {
		Self { directory, perms: RwLock::new(HashMap::new()), trees: RwLock::new(HashMap::new()) }
	}

	// Role graph snapshots //
	//**********************//
	pub async fn role_graph(&self, filter: ScopeFilter) -> ClResult<Arc<RoleGraph>> {
		if filter == ScopeFilter::Empty {
			return Ok(Arc::new(RoleGraph::new(vec![])));
		}
		let key = org_tree_key(filter);
		let at = now().0;
		if let Some(graph) = self.trees.read().get(&key).and_then(|e| e.live(at)) {
			return Ok(graph);
		}

		let roles = self.directory.list_roles(filter).await?;
		let graph = Arc::new(RoleGraph::new(roles));
		self.trees.write().insert(key, CacheEntry::new(graph.clone(), at));
		Ok(graph)
	}

	// Resolution //
	//************//
	/// Union of permission codes granted through the principal's active,
	/// unexpired role assignments.
	pub async fn resolve_permissions(&self, user_id: UserId) -> ClResult<PermSet> {
		let key = user_perms_key(user_id);
		let at = now().0;
		if let Some(perms) = self.perms.read().get(&key).and_then(|e| e.live(at)) {
			return Ok(perms);
		}

		let mut codes: HashSet<Box<str>> = HashSet::new();
		let assignments = self.directory.list_active_assignments(user_id).await?;
		for assignment in assignments.iter().filter(|a| a.is_effective(Timestamp(at))) {
			for grant in self.directory.list_role_permissions(assignment.role_id).await? {
				codes.insert(grant.code);
			}
		}

		let perms: PermSet = Arc::new(codes);
		self.perms.write().insert(key, CacheEntry::new(perms.clone(), at));
		debug!(user_id = %user_id, count = perms.len(), "resolved permissions");
		Ok(perms)
	}

	pub async fn has_permission(&self, auth: &AuthCtx, code: &str) -> ClResult<bool> {
		// Superadmins short-circuit to all permissions without consulting the graph
		if auth.is_superadmin() {
			return Ok(true);
		}
		let perms = self.resolve_permissions(auth.user_id).await?;
		Ok(perms.contains(code))
	}

	/// The broadest scope keyword the principal holds for a resource
	/// (college > department > own), or `None` when no grant touches it.
	pub async fn resolve_scope_for(
		&self,
		auth: &AuthCtx,
		resource: &str,
	) -> ClResult<Option<PermScope>> {
		let at = now();
		let prefix = format!("{}.", resource);
		let mut best: Option<PermScope> = None;

		let assignments = self.directory.list_active_assignments(auth.user_id).await?;
		for assignment in assignments.iter().filter(|a| a.is_effective(at)) {
			for grant in self.directory.list_role_permissions(assignment.role_id).await? {
				if !grant.code.starts_with(&prefix) {
					continue;
				}
				best = Some(match (best, grant.scope) {
					(Some(PermScope::College), _) | (_, PermScope::College) => PermScope::College,
					(Some(PermScope::Department), _) | (_, PermScope::Department) => {
						PermScope::Department
					}
					_ => PermScope::Own,
				});
			}
		}
		Ok(best)
	}

	// Grant mutations //
	//*****************//
	// Invalidation runs synchronously with the write: every principal holding
	// the role loses their cache entry before this call returns.
	pub async fn grant_permission(
		&self,
		role_id: RoleId,
		code: &str,
		can_delegate: bool,
		scope: PermScope,
	) -> ClResult<()> {
		self.directory.grant_permission(role_id, code, can_delegate, scope).await?;
		self.invalidate_role_holders(role_id).await?;
		info!(role_id = %role_id, code = code, "permission granted");
		Ok(())
	}

	pub async fn revoke_permission(&self, role_id: RoleId, code: &str) -> ClResult<()> {
		self.directory.revoke_permission(role_id, code).await?;
		self.invalidate_role_holders(role_id).await?;
		info!(role_id = %role_id, code = code, "permission revoked");
		Ok(())
	}

	// Role tree mutations //
	//*********************//
	pub async fn create_role(
		&self,
		scope: &TenantScope,
		data: &CreateRoleData<'_>,
	) -> ClResult<Role> {
		// The tenant is stamped from the scope, never from the payload
		let tn_id = scope.require_tenant()?;
		if let Some(parent) = data.parent {
			let parent_role = self.directory.read_role(parent).await?;
			if let Some(parent_tn) = parent_role.tn_id
				&& parent_tn != tn_id
			{
				return Err(Error::CrossTenant);
			}
		}
		let role = self.directory.create_role(tn_id, data).await?;
		self.invalidate_org_trees();
		Ok(role)
	}

	pub async fn delete_role(&self, scope: &TenantScope, role_id: RoleId) -> ClResult<()> {
		let tn_id = scope.require_tenant()?;
		self.invalidate_role_holders(role_id).await?;
		self.directory.delete_role(tn_id, role_id).await?;
		self.invalidate_org_trees();
		Ok(())
	}

	// Assignment mutations //
	//**********************//
	/// Assigns a role to a principal within the scoped tenant.
	///
	/// The assigner needs `users.assign_role` (superadmins bypass), the role
	/// must belong to the scoped tenant or be global, and the numeric-level
	/// guard runs inside the adapter's transaction together with the insert.
	pub async fn assign_role(
		&self,
		assigner: &AuthCtx,
		scope: &TenantScope,
		target: UserId,
		role_id: RoleId,
		expires_at: Option<Timestamp>,
	) -> ClResult<(RoleAssignment, bool)> {
		let tn_id = scope.require_tenant()?;

		let role = self.directory.read_role(role_id).await?;
		if let Some(role_tn) = role.tn_id
			&& role_tn != tn_id
		{
			// Rejected before any write occurs
			return Err(Error::CrossTenant);
		}

		if !assigner.is_superadmin() && !self.has_permission(assigner, PERM_ASSIGN_ROLE).await? {
			debug!(assigner = %assigner.user_id, "assign_role denied: missing permission");
			return Err(Error::PermissionDenied);
		}

		let (assignment, created) = self
			.directory
			.create_assignment(
				tn_id,
				&CreateAssignmentData {
					user_id: target,
					role_id,
					assigned_by: assigner.user_id,
					expires_at,
					enforce_level: !assigner.is_superadmin(),
				},
			)
			.await?;

		if created {
			self.invalidate_user(target);
			info!(assigner = %assigner.user_id, target = %target, role_id = %role_id, "role assigned");
		}
		Ok((assignment, created))
	}

	pub async fn deactivate_assignment(
		&self,
		scope: &TenantScope,
		assignment_id: i64,
	) -> ClResult<RoleAssignment> {
		let tn_id = scope.require_tenant()?;
		let assignment = self.directory.deactivate_assignment(tn_id, assignment_id).await?;
		self.invalidate_user(assignment.user_id);
		info!(assignment_id = assignment_id, user_id = %assignment.user_id, "assignment deactivated");
		Ok(assignment)
	}

	pub async fn delete_assignment(
		&self,
		scope: &TenantScope,
		assignment_id: i64,
	) -> ClResult<RoleAssignment> {
		let tn_id = scope.require_tenant()?;
		let assignment = self.directory.delete_assignment(tn_id, assignment_id).await?;
		self.invalidate_user(assignment.user_id);
		info!(assignment_id = assignment_id, user_id = %assignment.user_id, "assignment deleted");
		Ok(assignment)
	}

	// Invalidation //
	//**************//
	pub fn invalidate_user(&self, user_id: UserId) {
		self.perms.write().remove(&user_perms_key(user_id));
	}

	// Invalidation is deliberately unscoped: a global role may be held in any
	// tenant, and dropping an extra cache entry costs one rebuild.
	async fn invalidate_role_holders(&self, role_id: RoleId) -> ClResult<()> {
		let holders = self.directory.list_users_with_role(ScopeFilter::All, role_id).await?;
		let mut perms = self.perms.write();
		for user_id in holders {
			perms.remove(&user_perms_key(user_id));
		}
		Ok(())
	}

	pub fn invalidate_org_trees(&self) {
		self.trees.write().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cache_keys_are_deterministic() {
		assert_eq!(user_perms_key(UserId(42)), "user_perms_42");
		assert_eq!(org_tree_key(ScopeFilter::Tenant(TnId(3))), "org_tree_3");
		assert_eq!(org_tree_key(ScopeFilter::All), "org_tree_all");
	}

	#[test]
	fn test_cache_entry_expiry() {
		let entry = CacheEntry::new(1u32, 1000);
		assert_eq!(entry.live(1000 + PERM_CACHE_TTL - 1), Some(1));
		assert_eq!(entry.live(1000 + PERM_CACHE_TTL), None);
	}
}

// vim: ts=4
