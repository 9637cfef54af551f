//! Hierarchy propagation: materializes leader/member team memberships from
//! the role tree whenever role assignments change.
//!
//! Propagated rows are tagged `auto_assigned` with the `hierarchy`
//! relationship type and are fully derived state: every row can be recomputed
//! from the active assignments and the role tree. Inserts go through a
//! storage uniqueness constraint, so running propagation twice for the same
//! assignment is a no-op rather than a duplicate.

use parking_lot::RwLock;
use std::sync::Arc;

use collegio_types::directory_adapter::{
	CreateTeamMembershipData, DirectoryAdapter, HIERARCHY_RELATIONSHIP, RoleAssignment,
};

use crate::core::perm::PermissionService;
use crate::prelude::*;
use crate::types::now;

/// Permission-resource categories that propagation fans out over, one
/// membership row per category. Feature modules register their resource
/// at startup.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
	resources: RwLock<Vec<Box<str>>>,
}

impl ResourceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, resource: &str) {
		let mut resources = self.resources.write();
		if !resources.iter().any(|r| &**r == resource) {
			resources.push(resource.into());
		}
	}

	pub fn list(&self) -> Vec<Box<str>> {
		self.resources.read().clone()
	}
}

pub struct HierarchyService {
	directory: Arc<dyn DirectoryAdapter>,
	resources: Arc<ResourceRegistry>,
}

impl HierarchyService {
	pub fn new(directory: Arc<dyn DirectoryAdapter>, resources: Arc<ResourceRegistry>) -> Self {
		Self { directory, resources }
	}

	// Triggers //
	//**********//
	/// Runs after an assignment is committed. Creates the membership rows the
	/// new assignment implies: every holder of an ancestor role becomes a
	/// leader over the target, and the target becomes a leader over every
	/// holder of a descendant role.
	pub async fn on_assignment_created(
		&self,
		perm: &PermissionService,
		assignment: &RoleAssignment,
	) -> ClResult<u32> {
		if !assignment.is_effective(now()) {
			return Ok(0);
		}
		let created = self.materialize(perm, assignment).await?;
		debug!(
			user_id = %assignment.user_id,
			role_id = %assignment.role_id,
			created = created,
			"hierarchy propagated for new assignment"
		);
		Ok(created)
	}

	pub async fn on_assignment_deactivated(
		&self,
		perm: &PermissionService,
		assignment: &RoleAssignment,
	) -> ClResult<()> {
		self.rebuild_for_user(perm, assignment.tn_id, assignment.user_id).await
	}

	pub async fn on_assignment_deleted(
		&self,
		perm: &PermissionService,
		assignment: &RoleAssignment,
	) -> ClResult<()> {
		self.rebuild_for_user(perm, assignment.tn_id, assignment.user_id).await
	}

	// Reconciliation //
	//****************//
	/// Drops every auto-assigned hierarchy row the user appears in (either
	/// side) and re-materializes from their remaining active assignments.
	/// Converges to the same end state no matter how many times it runs.
	pub async fn rebuild_for_user(
		&self,
		perm: &PermissionService,
		tn_id: TnId,
		user_id: UserId,
	) -> ClResult<()> {
		let removed = self.directory.delete_hierarchy_memberships(tn_id, Some(user_id), None).await?
			+ self.directory.delete_hierarchy_memberships(tn_id, None, Some(user_id)).await?;

		let at = now();
		let mut created = 0;
		let assignments = self.directory.list_active_assignments(user_id).await?;
		for assignment in assignments.iter().filter(|a| a.tn_id == tn_id && a.is_effective(at)) {
			created += self.materialize(perm, assignment).await?;
		}

		debug!(user_id = %user_id, removed = removed, created = created, "hierarchy rebuilt");
		Ok(())
	}

	async fn materialize(
		&self,
		perm: &PermissionService,
		assignment: &RoleAssignment,
	) -> ClResult<u32> {
		let graph = perm.role_graph(ScopeFilter::Tenant(assignment.tn_id)).await?;
		let reason =
			graph.role(assignment.role_id).map(|role| format!("via role {}", role.name));
		let mut created = 0;

		// Holders are looked up within the assignment's tenant: a global role
		// held in another tenant grants no leadership here.
		for role_id in graph.ancestors(assignment.role_id, false) {
			for leader in
				self.directory.list_users_with_role(ScopeFilter::Tenant(assignment.tn_id), role_id).await?
			{
				if leader == assignment.user_id {
					continue;
				}
				created +=
					self.link(assignment.tn_id, leader, assignment.user_id, reason.as_deref()).await?;
			}
		}

		for role_id in graph.descendants(assignment.role_id, false) {
			for member in
				self.directory.list_users_with_role(ScopeFilter::Tenant(assignment.tn_id), role_id).await?
			{
				if member == assignment.user_id {
					continue;
				}
				created +=
					self.link(assignment.tn_id, assignment.user_id, member, reason.as_deref()).await?;
			}
		}

		Ok(created)
	}

	/// One membership row per registered resource; counts only rows actually
	/// inserted (the uniqueness constraint swallows re-runs).
	async fn link(
		&self,
		tn_id: TnId,
		leader: UserId,
		member: UserId,
		reason: Option<&str>,
	) -> ClResult<u32> {
		let mut created = 0;
		for resource in self.resources.list() {
			let inserted = self
				.directory
				.create_team_membership(
					tn_id,
					&CreateTeamMembershipData {
						team_id: None,
						leader,
						member,
						resource: &resource,
						relationship_type: HIERARCHY_RELATIONSHIP,
						auto_assigned: true,
						reason,
					},
				)
				.await?;
			if inserted {
				created += 1;
			}
		}
		Ok(created)
	}
}


// vim: ts=4
