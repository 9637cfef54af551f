//! In-memory directory adapter for server tests.
//!
//! Mirrors the semantics of the SQLite adapter (fail-closed scope filters,
//! the transactional level guard, membership uniqueness) without touching
//! disk, so service- and router-level tests stay fast and deterministic.

use async_trait::async_trait;
use parking_lot::Mutex;

use collegio_types::directory_adapter::*;
use collegio_types::error::{ClResult, Error};
use collegio_types::scope::ScopeFilter;
use collegio_types::types::{NodeId, RoleId, TeamId, TnId, UserId, now};

#[derive(Debug, Default)]
struct State {
	tenants: Vec<Tenant>,
	roles: Vec<Role>,
	permissions: Vec<Permission>,
	grants: Vec<RolePermission>,
	assignments: Vec<RoleAssignment>,
	org_nodes: Vec<OrgNode>,
	memberships: Vec<TeamMembership>,
	next_id: i64,
}

impl State {
	fn next_id(&mut self) -> i64 {
		self.next_id += 1;
		self.next_id
	}
}

#[derive(Debug, Default)]
pub struct MemDirectory {
	state: Mutex<State>,
}

impl MemDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	fn min_level(state: &State, tn_id: TnId, user_id: UserId) -> Option<i32> {
		let at = now();
		state
			.assignments
			.iter()
			.filter(|a| a.tn_id == tn_id && a.user_id == user_id && a.is_effective(at))
			.filter_map(|a| state.roles.iter().find(|r| r.role_id == a.role_id))
			.map(|r| r.level)
			.min()
	}
}

#[async_trait]
impl DirectoryAdapter for MemDirectory {
	async fn read_tenant(&self, tn_id: TnId) -> ClResult<Tenant> {
		let state = self.state.lock();
		state.tenants.iter().find(|t| t.tn_id == tn_id).cloned().ok_or(Error::NotFound)
	}

	async fn read_tenant_by_code(&self, code: &str) -> ClResult<Tenant> {
		let state = self.state.lock();
		state.tenants.iter().find(|t| &*t.code == code).cloned().ok_or(Error::NotFound)
	}

	async fn list_tenants(
		&self,
		scope: ScopeFilter,
		opts: &ListTenantsOptions<'_>,
	) -> ClResult<Vec<Tenant>> {
		let state = self.state.lock();
		let tenants = state
			.tenants
			.iter()
			.filter(|t| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => t.tn_id == tn_id,
				ScopeFilter::All => true,
			})
			.filter(|t| opts.active.is_none_or(|active| t.active == active))
			.filter(|t| opts.q.is_none_or(|q| t.code.contains(q) || t.name.contains(q)))
			.cloned()
			.collect();
		Ok(tenants)
	}

	async fn create_tenant(&self, data: &CreateTenantData<'_>) -> ClResult<Tenant> {
		let mut state = self.state.lock();
		if state.tenants.iter().any(|t| &*t.code == data.code) {
			return Err(Error::DbError);
		}
		let tenant = Tenant {
			tn_id: TnId(state.tenants.len() as u32 + 1),
			code: data.code.into(),
			name: data.name.into(),
			active: true,
			created_at: now(),
		};
		state.tenants.push(tenant.clone());
		Ok(tenant)
	}

	async fn update_tenant_active(&self, tn_id: TnId, active: bool) -> ClResult<()> {
		let mut state = self.state.lock();
		let tenant =
			state.tenants.iter_mut().find(|t| t.tn_id == tn_id).ok_or(Error::NotFound)?;
		tenant.active = active;
		Ok(())
	}

	async fn read_role(&self, role_id: RoleId) -> ClResult<Role> {
		let state = self.state.lock();
		state.roles.iter().find(|r| r.role_id == role_id).cloned().ok_or(Error::NotFound)
	}

	async fn list_roles(&self, scope: ScopeFilter) -> ClResult<Vec<Role>> {
		let state = self.state.lock();
		let roles = state
			.roles
			.iter()
			.filter(|r| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => r.tn_id.is_none() || r.tn_id == Some(tn_id),
				ScopeFilter::All => true,
			})
			.cloned()
			.collect();
		Ok(roles)
	}

	async fn create_role(&self, tn_id: TnId, data: &CreateRoleData<'_>) -> ClResult<Role> {
		let mut state = self.state.lock();
		let role = Role {
			role_id: RoleId(state.next_id()),
			tn_id: Some(tn_id),
			name: data.name.into(),
			level: data.level,
			parent: data.parent,
		};
		state.roles.push(role.clone());
		Ok(role)
	}

	async fn delete_role(&self, tn_id: TnId, role_id: RoleId) -> ClResult<()> {
		let mut state = self.state.lock();
		let before = state.roles.len();
		state.roles.retain(|r| !(r.role_id == role_id && r.tn_id == Some(tn_id)));
		if state.roles.len() == before {
			return Err(Error::NotFound);
		}
		state.grants.retain(|g| g.role_id != role_id);
		Ok(())
	}

	async fn list_permissions(&self) -> ClResult<Vec<Permission>> {
		Ok(self.state.lock().permissions.clone())
	}

	async fn register_permission(&self, code: &str, category: &str) -> ClResult<()> {
		let mut state = self.state.lock();
		if let Some(perm) = state.permissions.iter_mut().find(|p| &*p.code == code) {
			perm.category = category.into();
		} else {
			state.permissions.push(Permission { code: code.into(), category: category.into() });
		}
		Ok(())
	}

	async fn list_role_permissions(&self, role_id: RoleId) -> ClResult<Vec<RolePermission>> {
		let state = self.state.lock();
		Ok(state.grants.iter().filter(|g| g.role_id == role_id).cloned().collect())
	}

	async fn grant_permission(
		&self,
		role_id: RoleId,
		code: &str,
		can_delegate: bool,
		scope: PermScope,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		state.grants.retain(|g| !(g.role_id == role_id && &*g.code == code));
		state.grants.push(RolePermission { role_id, code: code.into(), can_delegate, scope });
		Ok(())
	}

	async fn revoke_permission(&self, role_id: RoleId, code: &str) -> ClResult<()> {
		let mut state = self.state.lock();
		let before = state.grants.len();
		state.grants.retain(|g| !(g.role_id == role_id && &*g.code == code));
		if state.grants.len() == before { Err(Error::NotFound) } else { Ok(()) }
	}

	async fn list_users_with_role(
		&self,
		scope: ScopeFilter,
		role_id: RoleId,
	) -> ClResult<Vec<UserId>> {
		let state = self.state.lock();
		let at = now();
		let mut users: Vec<UserId> = state
			.assignments
			.iter()
			.filter(|a| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => a.tn_id == tn_id,
				ScopeFilter::All => true,
			})
			.filter(|a| a.role_id == role_id && a.is_effective(at))
			.map(|a| a.user_id)
			.collect();
		users.sort_unstable();
		users.dedup();
		Ok(users)
	}

	async fn list_assignments(
		&self,
		scope: ScopeFilter,
		user_id: Option<UserId>,
	) -> ClResult<Vec<RoleAssignment>> {
		let state = self.state.lock();
		let assignments = state
			.assignments
			.iter()
			.filter(|a| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => a.tn_id == tn_id,
				ScopeFilter::All => true,
			})
			.filter(|a| user_id.is_none_or(|u| a.user_id == u))
			.cloned()
			.collect();
		Ok(assignments)
	}

	async fn list_active_assignments(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
		let state = self.state.lock();
		Ok(state
			.assignments
			.iter()
			.filter(|a| a.user_id == user_id && a.is_active)
			.cloned()
			.collect())
	}

	async fn create_assignment(
		&self,
		tn_id: TnId,
		data: &CreateAssignmentData,
	) -> ClResult<(RoleAssignment, bool)> {
		let mut state = self.state.lock();

		let role_level = state
			.roles
			.iter()
			.find(|r| r.role_id == data.role_id)
			.map(|r| r.level)
			.ok_or(Error::NotFound)?;

		if data.enforce_level {
			match Self::min_level(&state, tn_id, data.assigned_by) {
				Some(level) if level <= role_level => (),
				_ => return Err(Error::PrivilegeEscalation),
			}
		}

		if let Some(existing) = state
			.assignments
			.iter_mut()
			.find(|a| a.tn_id == tn_id && a.user_id == data.user_id && a.role_id == data.role_id)
		{
			if existing.is_active {
				return Ok((existing.clone(), false));
			}
			existing.is_active = true;
			existing.assigned_by = Some(data.assigned_by);
			existing.assigned_at = now();
			existing.expires_at = data.expires_at;
			return Ok((existing.clone(), true));
		}

		let assignment = RoleAssignment {
			assignment_id: state.next_id(),
			tn_id,
			user_id: data.user_id,
			role_id: data.role_id,
			assigned_by: Some(data.assigned_by),
			assigned_at: now(),
			expires_at: data.expires_at,
			is_active: true,
		};
		state.assignments.push(assignment.clone());
		Ok((assignment, true))
	}

	async fn deactivate_assignment(
		&self,
		tn_id: TnId,
		assignment_id: i64,
	) -> ClResult<RoleAssignment> {
		let mut state = self.state.lock();
		let assignment = state
			.assignments
			.iter_mut()
			.find(|a| a.assignment_id == assignment_id && a.tn_id == tn_id)
			.ok_or(Error::NotFound)?;
		assignment.is_active = false;
		Ok(assignment.clone())
	}

	async fn delete_assignment(&self, tn_id: TnId, assignment_id: i64) -> ClResult<RoleAssignment> {
		let mut state = self.state.lock();
		let idx = state
			.assignments
			.iter()
			.position(|a| a.assignment_id == assignment_id && a.tn_id == tn_id)
			.ok_or(Error::NotFound)?;
		Ok(state.assignments.remove(idx))
	}

	async fn max_role_level(&self, user_id: UserId) -> ClResult<Option<i32>> {
		let state = self.state.lock();
		let at = now();
		Ok(state
			.assignments
			.iter()
			.filter(|a| a.user_id == user_id && a.is_effective(at))
			.filter_map(|a| state.roles.iter().find(|r| r.role_id == a.role_id))
			.map(|r| r.level)
			.min())
	}

	async fn create_org_node(
		&self,
		tn_id: TnId,
		data: &CreateOrgNodeData<'_>,
	) -> ClResult<OrgNode> {
		let mut state = self.state.lock();
		let node_id = NodeId(state.next_id());
		let team_id = if data.node_type == "department" {
			Some(TeamId(state.next_id()))
		} else {
			None
		};
		let node = OrgNode {
			node_id,
			tn_id,
			node_type: data.node_type.into(),
			title: data.title.into(),
			role_id: data.role_id,
			user_id: data.user_id,
			parent: data.parent,
			team_id,
		};
		state.org_nodes.push(node.clone());
		Ok(node)
	}

	async fn read_org_node(&self, tn_id: TnId, node_id: NodeId) -> ClResult<OrgNode> {
		let state = self.state.lock();
		state
			.org_nodes
			.iter()
			.find(|n| n.node_id == node_id && n.tn_id == tn_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn list_org_nodes(&self, scope: ScopeFilter) -> ClResult<Vec<OrgNode>> {
		let state = self.state.lock();
		let nodes = state
			.org_nodes
			.iter()
			.filter(|n| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => n.tn_id == tn_id,
				ScopeFilter::All => true,
			})
			.cloned()
			.collect();
		Ok(nodes)
	}

	async fn create_team_membership(
		&self,
		tn_id: TnId,
		data: &CreateTeamMembershipData<'_>,
	) -> ClResult<bool> {
		let mut state = self.state.lock();
		let duplicate = state.memberships.iter().any(|m| {
			m.tn_id == tn_id
				&& m.leader == data.leader
				&& m.member == data.member
				&& &*m.resource == data.resource
				&& &*m.relationship_type == data.relationship_type
		});
		if duplicate {
			return Ok(false);
		}
		let membership = TeamMembership {
			membership_id: state.next_id(),
			tn_id,
			team_id: data.team_id,
			leader: data.leader,
			member: data.member,
			resource: data.resource.into(),
			relationship_type: data.relationship_type.into(),
			auto_assigned: data.auto_assigned,
			reason: data.reason.map(Into::into),
		};
		state.memberships.push(membership);
		Ok(true)
	}

	async fn delete_hierarchy_memberships(
		&self,
		tn_id: TnId,
		leader: Option<UserId>,
		member: Option<UserId>,
	) -> ClResult<u32> {
		let mut state = self.state.lock();
		let before = state.memberships.len();
		state.memberships.retain(|m| {
			!(m.tn_id == tn_id
				&& m.auto_assigned
				&& &*m.relationship_type == HIERARCHY_RELATIONSHIP
				&& leader.is_none_or(|l| m.leader == l)
				&& member.is_none_or(|u| m.member == u))
		});
		Ok((before - state.memberships.len()) as u32)
	}

	async fn list_team_memberships(
		&self,
		scope: ScopeFilter,
		opts: &ListTeamMembershipOptions,
	) -> ClResult<Vec<TeamMembership>> {
		let state = self.state.lock();
		let memberships = state
			.memberships
			.iter()
			.filter(|m| match scope {
				ScopeFilter::Empty => false,
				ScopeFilter::Tenant(tn_id) => m.tn_id == tn_id,
				ScopeFilter::All => true,
			})
			.filter(|m| opts.leader.is_none_or(|l| m.leader == l))
			.filter(|m| opts.member.is_none_or(|u| m.member == u))
			.filter(|m| opts.resource.as_deref().is_none_or(|r| &*m.resource == r))
			.filter(|m| opts.auto_assigned.is_none_or(|auto| m.auto_assigned == auto))
			.cloned()
			.collect();
		Ok(memberships)
	}
}

// vim: ts=4
