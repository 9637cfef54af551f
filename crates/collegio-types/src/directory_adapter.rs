//! Adapter that stores the tenant catalog, role graph, permission grants,
//! role assignments, and the derived organizational hierarchy.
//!
//! Every `DirectoryAdapter` implementation is required to implement this
//! trait. Tenant-scoped reads take a [`ScopeFilter`] so the fail-closed
//! default (`Empty` returns zero rows) is part of the contract, not a
//! convention individual call sites may forget.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::error::ClResult;
use crate::scope::ScopeFilter;
use crate::types::{NodeId, RoleId, TeamId, Timestamp, TnId, UserId};

/// Relationship type tag owned by the hierarchy propagation engine.
pub const HIERARCHY_RELATIONSHIP: &str = "hierarchy";

// Tenants //
//*********//
/// A tenant (a college). The top-level isolation boundary.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
	pub tn_id: TnId,
	pub code: Box<str>,
	pub name: Box<str>,
	pub active: bool,
	pub created_at: Timestamp,
}

/// Data needed to create a new tenant. Carries no tenant reference: the
/// identifier is allocated by storage, never supplied by a caller.
#[derive(Debug)]
pub struct CreateTenantData<'a> {
	pub code: &'a str,
	pub name: &'a str,
}

#[derive(Debug, Default)]
pub struct ListTenantsOptions<'a> {
	pub q: Option<&'a str>,
	pub active: Option<bool>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

// Roles //
//*******//
/// A role in the self-referencing hierarchy. `tn_id` is `None` for global
/// roles visible to every tenant. Lower `level` denotes higher authority.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
	pub role_id: RoleId,
	pub tn_id: Option<TnId>,
	pub name: Box<str>,
	pub level: i32,
	pub parent: Option<RoleId>,
}

#[derive(Debug)]
pub struct CreateRoleData<'a> {
	pub name: &'a str,
	pub level: i32,
	pub parent: Option<RoleId>,
}

// Permissions //
//*************//
/// Immutable catalog entry identified by a dotted code (`students.create`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
	pub code: Box<str>,
	pub category: Box<str>,
}

/// Scope keyword attached to a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermScope {
	College,
	Department,
	Own,
}

impl PermScope {
	pub fn as_str(&self) -> &'static str {
		match self {
			PermScope::College => "college",
			PermScope::Department => "department",
			PermScope::Own => "own",
		}
	}

	pub fn parse(s: &str) -> Option<PermScope> {
		match s {
			"college" => Some(PermScope::College),
			"department" => Some(PermScope::Department),
			"own" => Some(PermScope::Own),
			_ => None,
		}
	}
}

/// A permission granted to a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermission {
	pub role_id: RoleId,
	pub code: Box<str>,
	pub can_delegate: bool,
	pub scope: PermScope,
}

// Role assignments //
//******************//
/// A principal holding a role within a tenant. Only active, unexpired
/// assignments contribute to permission resolution and hierarchy propagation.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
	pub assignment_id: i64,
	pub tn_id: TnId,
	pub user_id: UserId,
	pub role_id: RoleId,
	pub assigned_by: Option<UserId>,
	pub assigned_at: Timestamp,
	pub expires_at: Option<Timestamp>,
	pub is_active: bool,
}

impl RoleAssignment {
	pub fn is_effective(&self, at: Timestamp) -> bool {
		self.is_active && self.expires_at.is_none_or(|exp| exp > at)
	}
}

#[derive(Debug)]
pub struct CreateAssignmentData {
	pub user_id: UserId,
	pub role_id: RoleId,
	pub assigned_by: UserId,
	pub expires_at: Option<Timestamp>,
	/// When set, the adapter checks — atomically with the insert — that the
	/// assigner's own maximum authority (minimum active role level) does not
	/// exceed the new role's level. Cleared only for superadmin assigners.
	pub enforce_level: bool,
}

// Org hierarchy //
//***************//
/// A position in the organizational chart, linked to at most one role and
/// at most one principal.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
	pub node_id: NodeId,
	pub tn_id: TnId,
	pub node_type: Box<str>,
	pub title: Box<str>,
	pub role_id: Option<RoleId>,
	pub user_id: Option<UserId>,
	pub parent: Option<NodeId>,
	/// Attached team, created lazily for department-like node types.
	pub team_id: Option<TeamId>,
}

#[derive(Debug)]
pub struct CreateOrgNodeData<'a> {
	pub node_type: &'a str,
	pub title: &'a str,
	pub role_id: Option<RoleId>,
	pub user_id: Option<UserId>,
	pub parent: Option<NodeId>,
}

// Team memberships //
//******************//
/// A leader/member relationship, one row per permission-resource category.
///
/// Rows with `auto_assigned = true` are owned by the hierarchy propagation
/// engine and are recreated/deleted in lockstep with role-assignment changes.
/// Manually added rows are never touched by propagation.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
	pub membership_id: i64,
	pub tn_id: TnId,
	pub team_id: Option<TeamId>,
	pub leader: UserId,
	pub member: UserId,
	pub resource: Box<str>,
	pub relationship_type: Box<str>,
	pub auto_assigned: bool,
	pub reason: Option<Box<str>>,
}

#[derive(Debug)]
pub struct CreateTeamMembershipData<'a> {
	pub team_id: Option<TeamId>,
	pub leader: UserId,
	pub member: UserId,
	pub resource: &'a str,
	pub relationship_type: &'a str,
	pub auto_assigned: bool,
	pub reason: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct ListTeamMembershipOptions {
	pub leader: Option<UserId>,
	pub member: Option<UserId>,
	pub resource: Option<Box<str>>,
	pub auto_assigned: Option<bool>,
}

/// A Collegio directory adapter.
///
/// Stores the authoritative state the scoping and permission engine runs on.
/// Derived relations (role ancestors/descendants, team memberships produced
/// by propagation) are computed by the server, never stored as edges here.
#[async_trait]
pub trait DirectoryAdapter: Debug + Send + Sync {
	// Tenant catalog
	//****************
	async fn read_tenant(&self, tn_id: TnId) -> ClResult<Tenant>;

	/// Explicitly unscoped lookup used by the scoping middleware to resolve
	/// the inbound header (the one read that cannot itself be scoped).
	async fn read_tenant_by_code(&self, code: &str) -> ClResult<Tenant>;

	async fn list_tenants(
		&self,
		scope: ScopeFilter,
		opts: &ListTenantsOptions<'_>,
	) -> ClResult<Vec<Tenant>>;
	async fn create_tenant(&self, data: &CreateTenantData<'_>) -> ClResult<Tenant>;
	async fn update_tenant_active(&self, tn_id: TnId, active: bool) -> ClResult<()>;

	// Roles
	//*******
	async fn read_role(&self, role_id: RoleId) -> ClResult<Role>;

	/// Under `Tenant(t)` this returns the tenant's roles plus global roles.
	async fn list_roles(&self, scope: ScopeFilter) -> ClResult<Vec<Role>>;
	async fn create_role(&self, tn_id: TnId, data: &CreateRoleData<'_>) -> ClResult<Role>;
	async fn delete_role(&self, tn_id: TnId, role_id: RoleId) -> ClResult<()>;

	// Permission catalog & grants
	//*****************************
	async fn list_permissions(&self) -> ClResult<Vec<Permission>>;
	async fn register_permission(&self, code: &str, category: &str) -> ClResult<()>;
	async fn list_role_permissions(&self, role_id: RoleId) -> ClResult<Vec<RolePermission>>;
	async fn grant_permission(
		&self,
		role_id: RoleId,
		code: &str,
		can_delegate: bool,
		scope: PermScope,
	) -> ClResult<()>;
	async fn revoke_permission(&self, role_id: RoleId, code: &str) -> ClResult<()>;

	/// Distinct principals currently holding an active, unexpired assignment
	/// of the role. Hierarchy propagation passes `Tenant` so holders of a
	/// global role in other tenants never leak in; cache invalidation passes
	/// `All` (over-invalidation is harmless, a stale allow is not).
	async fn list_users_with_role(
		&self,
		scope: ScopeFilter,
		role_id: RoleId,
	) -> ClResult<Vec<UserId>>;

	// Role assignments
	//******************
	async fn list_assignments(
		&self,
		scope: ScopeFilter,
		user_id: Option<UserId>,
	) -> ClResult<Vec<RoleAssignment>>;
	async fn list_active_assignments(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>>;

	/// Creates (or reactivates) an assignment. Returns the assignment and
	/// whether a write happened. The privilege-escalation guard runs inside
	/// the same transaction as the write when `enforce_level` is set.
	async fn create_assignment(
		&self,
		tn_id: TnId,
		data: &CreateAssignmentData,
	) -> ClResult<(RoleAssignment, bool)>;
	async fn deactivate_assignment(&self, tn_id: TnId, assignment_id: i64)
	-> ClResult<RoleAssignment>;
	async fn delete_assignment(&self, tn_id: TnId, assignment_id: i64) -> ClResult<RoleAssignment>;

	/// The assigner-side of the escalation guard: minimum (strongest) level
	/// among the user's active assignments, `None` when they hold none.
	async fn max_role_level(&self, user_id: UserId) -> ClResult<Option<i32>>;

	// Org chart
	//***********
	async fn create_org_node(&self, tn_id: TnId, data: &CreateOrgNodeData<'_>) -> ClResult<OrgNode>;
	async fn read_org_node(&self, tn_id: TnId, node_id: NodeId) -> ClResult<OrgNode>;
	async fn list_org_nodes(&self, scope: ScopeFilter) -> ClResult<Vec<OrgNode>>;

	// Team memberships
	//******************
	/// Idempotent: returns `false` when an identical row already exists.
	/// Enforced by a storage uniqueness constraint, not a pre-check, so it
	/// stays correct under concurrent triggers.
	async fn create_team_membership(
		&self,
		tn_id: TnId,
		data: &CreateTeamMembershipData<'_>,
	) -> ClResult<bool>;

	/// Deletes hierarchy-tagged, auto-assigned memberships matching the given
	/// leader/member filters (provided filters combine conjunctively). Manual
	/// rows are never touched. Returns the number of rows removed.
	async fn delete_hierarchy_memberships(
		&self,
		tn_id: TnId,
		leader: Option<UserId>,
		member: Option<UserId>,
	) -> ClResult<u32>;

	async fn list_team_memberships(
		&self,
		scope: ScopeFilter,
		opts: &ListTeamMembershipOptions,
	) -> ClResult<Vec<TeamMembership>>;
}

// vim: ts=4
