//! SQLite-backed directory adapter.
//!
//! Stores the tenant catalog, role tree, permission grants, role assignments,
//! the org chart, and team memberships. The fail-closed scoping contract is
//! enforced here: every list operation short-circuits to zero rows on an
//! `Empty` filter before any SQL runs.

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use collegio::{directory_adapter, directory_adapter::DirectoryAdapter, prelude::*};

mod assignment;
mod org;
mod permission;
mod role;
mod team;
mod tenant;
mod utils;

#[derive(Debug)]
pub struct DirectoryAdapterSqlite {
	db: SqlitePool,
}

impl DirectoryAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db).await.inspect_err(|err| warn!("DB: {:#?}", err)).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl DirectoryAdapter for DirectoryAdapterSqlite {
	// Tenant catalog
	//****************
	async fn read_tenant(&self, tn_id: TnId) -> ClResult<directory_adapter::Tenant> {
		tenant::read_tenant(&self.db, tn_id).await
	}

	async fn read_tenant_by_code(&self, code: &str) -> ClResult<directory_adapter::Tenant> {
		tenant::read_tenant_by_code(&self.db, code).await
	}

	async fn list_tenants(
		&self,
		scope: ScopeFilter,
		opts: &directory_adapter::ListTenantsOptions<'_>,
	) -> ClResult<Vec<directory_adapter::Tenant>> {
		tenant::list_tenants(&self.db, scope, opts).await
	}

	async fn create_tenant(
		&self,
		data: &directory_adapter::CreateTenantData<'_>,
	) -> ClResult<directory_adapter::Tenant> {
		tenant::create_tenant(&self.db, data).await
	}

	async fn update_tenant_active(&self, tn_id: TnId, active: bool) -> ClResult<()> {
		tenant::update_tenant_active(&self.db, tn_id, active).await
	}

	// Roles
	//*******
	async fn read_role(&self, role_id: RoleId) -> ClResult<directory_adapter::Role> {
		role::read_role(&self.db, role_id).await
	}

	async fn list_roles(&self, scope: ScopeFilter) -> ClResult<Vec<directory_adapter::Role>> {
		role::list_roles(&self.db, scope).await
	}

	async fn create_role(
		&self,
		tn_id: TnId,
		data: &directory_adapter::CreateRoleData<'_>,
	) -> ClResult<directory_adapter::Role> {
		role::create_role(&self.db, tn_id, data).await
	}

	async fn delete_role(&self, tn_id: TnId, role_id: RoleId) -> ClResult<()> {
		role::delete_role(&self.db, tn_id, role_id).await
	}

	// Permission catalog & grants
	//*****************************
	async fn list_permissions(&self) -> ClResult<Vec<directory_adapter::Permission>> {
		permission::list_permissions(&self.db).await
	}

	async fn register_permission(&self, code: &str, category: &str) -> ClResult<()> {
		permission::register_permission(&self.db, code, category).await
	}

	async fn list_role_permissions(
		&self,
		role_id: RoleId,
	) -> ClResult<Vec<directory_adapter::RolePermission>> {
		permission::list_role_permissions(&self.db, role_id).await
	}

	async fn grant_permission(
		&self,
		role_id: RoleId,
		code: &str,
		can_delegate: bool,
		scope: directory_adapter::PermScope,
	) -> ClResult<()> {
		permission::grant_permission(&self.db, role_id, code, can_delegate, scope).await
	}

	async fn revoke_permission(&self, role_id: RoleId, code: &str) -> ClResult<()> {
		permission::revoke_permission(&self.db, role_id, code).await
	}

	async fn list_users_with_role(
		&self,
		scope: ScopeFilter,
		role_id: RoleId,
	) -> ClResult<Vec<UserId>> {
		permission::list_users_with_role(&self.db, scope, role_id).await
	}

	// Role assignments
	//******************
	async fn list_assignments(
		&self,
		scope: ScopeFilter,
		user_id: Option<UserId>,
	) -> ClResult<Vec<directory_adapter::RoleAssignment>> {
		assignment::list_assignments(&self.db, scope, user_id).await
	}

	async fn list_active_assignments(
		&self,
		user_id: UserId,
	) -> ClResult<Vec<directory_adapter::RoleAssignment>> {
		assignment::list_active_assignments(&self.db, user_id).await
	}

	async fn create_assignment(
		&self,
		tn_id: TnId,
		data: &directory_adapter::CreateAssignmentData,
	) -> ClResult<(directory_adapter::RoleAssignment, bool)> {
		assignment::create_assignment(&self.db, tn_id, data).await
	}

	async fn deactivate_assignment(
		&self,
		tn_id: TnId,
		assignment_id: i64,
	) -> ClResult<directory_adapter::RoleAssignment> {
		assignment::deactivate_assignment(&self.db, tn_id, assignment_id).await
	}

	async fn delete_assignment(
		&self,
		tn_id: TnId,
		assignment_id: i64,
	) -> ClResult<directory_adapter::RoleAssignment> {
		assignment::delete_assignment(&self.db, tn_id, assignment_id).await
	}

	async fn max_role_level(&self, user_id: UserId) -> ClResult<Option<i32>> {
		assignment::max_role_level(&self.db, user_id).await
	}

	// Org chart
	//***********
	async fn create_org_node(
		&self,
		tn_id: TnId,
		data: &directory_adapter::CreateOrgNodeData<'_>,
	) -> ClResult<directory_adapter::OrgNode> {
		org::create_org_node(&self.db, tn_id, data).await
	}

	async fn read_org_node(
		&self,
		tn_id: TnId,
		node_id: NodeId,
	) -> ClResult<directory_adapter::OrgNode> {
		org::read_org_node(&self.db, tn_id, node_id).await
	}

	async fn list_org_nodes(&self, scope: ScopeFilter) -> ClResult<Vec<directory_adapter::OrgNode>> {
		org::list_org_nodes(&self.db, scope).await
	}

	// Team memberships
	//******************
	async fn create_team_membership(
		&self,
		tn_id: TnId,
		data: &directory_adapter::CreateTeamMembershipData<'_>,
	) -> ClResult<bool> {
		team::create_team_membership(&self.db, tn_id, data).await
	}

	async fn delete_hierarchy_memberships(
		&self,
		tn_id: TnId,
		leader: Option<UserId>,
		member: Option<UserId>,
	) -> ClResult<u32> {
		team::delete_hierarchy_memberships(&self.db, tn_id, leader, member).await
	}

	async fn list_team_memberships(
		&self,
		scope: ScopeFilter,
		opts: &directory_adapter::ListTeamMembershipOptions,
	) -> ClResult<Vec<directory_adapter::TeamMembership>> {
		team::list_team_memberships(&self.db, scope, opts).await
	}
}

async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	/***********/
	/* Init DB */
	/***********/

	// Tenants //
	/////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS tenants (
		tn_id integer PRIMARY KEY AUTOINCREMENT,
		code text NOT NULL UNIQUE,
		name text NOT NULL,
		active integer NOT NULL DEFAULT 1,
		created_at integer NOT NULL
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Roles //
	///////////
	// tn_id is NULL for global roles visible to every tenant
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS roles (
		role_id integer PRIMARY KEY AUTOINCREMENT,
		tn_id integer,
		name text NOT NULL,
		level integer NOT NULL,
		parent integer,
		UNIQUE(tn_id, name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Permission catalog //
	////////////////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS permissions (
		code text NOT NULL,
		category text NOT NULL,
		PRIMARY KEY(code)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS role_permissions (
		role_id integer NOT NULL,
		code text NOT NULL,
		can_delegate integer NOT NULL DEFAULT 0,
		scope text NOT NULL DEFAULT 'own',
		PRIMARY KEY(role_id, code)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Role assignments //
	//////////////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS role_assignments (
		assignment_id integer PRIMARY KEY AUTOINCREMENT,
		tn_id integer NOT NULL,
		user_id integer NOT NULL,
		role_id integer NOT NULL,
		assigned_by integer,
		assigned_at integer NOT NULL,
		expires_at integer,
		is_active integer NOT NULL DEFAULT 1,
		UNIQUE(tn_id, user_id, role_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_role_assignments_user ON role_assignments (user_id, is_active)",
	)
	.execute(&mut *tx)
	.await?;

	// Org chart //
	///////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS org_nodes (
		node_id integer PRIMARY KEY AUTOINCREMENT,
		tn_id integer NOT NULL,
		node_type text NOT NULL,
		title text NOT NULL,
		role_id integer,
		user_id integer,
		parent integer,
		team_id integer
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS teams (
		team_id integer PRIMARY KEY AUTOINCREMENT,
		tn_id integer NOT NULL,
		name text NOT NULL,
		node_id integer
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Team memberships //
	//////////////////////
	// The uniqueness constraint is what makes hierarchy propagation idempotent
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS team_memberships (
		membership_id integer PRIMARY KEY AUTOINCREMENT,
		tn_id integer NOT NULL,
		team_id integer,
		leader integer NOT NULL,
		member integer NOT NULL,
		resource text NOT NULL,
		relationship_type text NOT NULL,
		auto_assigned integer NOT NULL DEFAULT 0,
		reason text,
		UNIQUE(tn_id, leader, member, resource, relationship_type)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
