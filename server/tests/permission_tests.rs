//! Permission service tests: cache invalidation, the superadmin
//! short-circuit, and the assignment guard chain.

mod common;

use collegio_types::error::Error;
use collegio_types::scope::TenantScope;
use collegio_types::types::{TnId, UserId};

use common::fixtures::{PRINCIPAL, TEACHER, auth, build_app};

#[tokio::test]
async fn test_resolved_permissions_union_over_roles() {
	let fx = build_app().await;
	let principal = auth(PRINCIPAL, fx.tn_id, &[]);

	assert!(fx.app.perm.has_permission(&principal, "students.read").await.expect("Should resolve"));
	assert!(!fx.app.perm.has_permission(&principal, "students.delete").await.expect("Should resolve"));

	let teacher = auth(TEACHER, fx.tn_id, &[]);
	assert!(fx.app.perm.has_permission(&teacher, "teams.list").await.expect("Should resolve"));
	assert!(!fx.app.perm.has_permission(&teacher, "students.read").await.expect("Should resolve"));
}

#[tokio::test]
async fn test_revoke_invalidates_cache_immediately() {
	let fx = build_app().await;
	let teacher = auth(TEACHER, fx.tn_id, &[]);

	// Warm the cache, then revoke well within the TTL
	assert!(fx.app.perm.has_permission(&teacher, "teams.list").await.expect("Should resolve"));
	fx.app.perm.revoke_permission(fx.teacher_role, "teams.list").await.expect("Should revoke");

	assert!(
		!fx.app.perm.has_permission(&teacher, "teams.list").await.expect("Should resolve"),
		"Revocation must be visible on the next check, not after TTL expiry"
	);
}

#[tokio::test]
async fn test_grant_invalidates_cache_immediately() {
	let fx = build_app().await;
	let teacher = auth(TEACHER, fx.tn_id, &[]);

	assert!(!fx.app.perm.has_permission(&teacher, "students.read").await.expect("Should resolve"));
	fx.app
		.perm
		.grant_permission(
			fx.teacher_role,
			"students.read",
			false,
			collegio_types::directory_adapter::PermScope::Own,
		)
		.await
		.expect("Should grant");

	assert!(fx.app.perm.has_permission(&teacher, "students.read").await.expect("Should resolve"));
}

#[tokio::test]
async fn test_deactivation_invalidates_target() {
	let fx = build_app().await;
	let principal = auth(PRINCIPAL, fx.tn_id, &[]);
	let scope = TenantScope::Tenant(fx.tn_id);

	let (assignment, created) = fx
		.app
		.perm
		.assign_role(&principal, &scope, UserId(7), fx.teacher_role, None)
		.await
		.expect("Should assign");
	assert!(created);

	let target = auth(UserId(7), fx.tn_id, &[]);
	assert!(fx.app.perm.has_permission(&target, "teams.list").await.expect("Should resolve"));

	fx.app
		.perm
		.deactivate_assignment(&scope, assignment.assignment_id)
		.await
		.expect("Should deactivate");
	assert!(!fx.app.perm.has_permission(&target, "teams.list").await.expect("Should resolve"));
}

#[tokio::test]
async fn test_superadmin_short_circuits() {
	let fx = build_app().await;
	// No assignments at all, just the role claim
	let admin = auth(UserId(99), fx.tn_id, &["superadmin"]);

	assert!(fx.app.perm.has_permission(&admin, "anything.at_all").await.expect("Should resolve"));
}

#[tokio::test]
async fn test_assign_requires_permission() {
	let fx = build_app().await;
	let teacher = auth(TEACHER, fx.tn_id, &[]);
	let scope = TenantScope::Tenant(fx.tn_id);

	let res = fx.app.perm.assign_role(&teacher, &scope, UserId(7), fx.teacher_role, None).await;
	assert!(matches!(res, Err(Error::PermissionDenied)));
}

#[tokio::test]
async fn test_assign_enforces_level_for_non_admins() {
	let fx = build_app().await;
	let scope = TenantScope::Tenant(fx.tn_id);

	// Give the teacher the assign permission; their level is still 5
	fx.app
		.perm
		.grant_permission(
			fx.teacher_role,
			"users.assign_role",
			false,
			collegio_types::directory_adapter::PermScope::College,
		)
		.await
		.expect("Should grant");

	let teacher = auth(TEACHER, fx.tn_id, &[]);
	let res = fx.app.perm.assign_role(&teacher, &scope, UserId(7), fx.principal_role, None).await;
	assert!(matches!(res, Err(Error::PrivilegeEscalation)));

	// A superadmin bypasses the level guard
	let admin = auth(UserId(99), fx.tn_id, &["superadmin"]);
	let (_, created) = fx
		.app
		.perm
		.assign_role(&admin, &scope, UserId(7), fx.principal_role, None)
		.await
		.expect("Superadmin should bypass the level guard");
	assert!(created);
}

#[tokio::test]
async fn test_assign_requires_tenant_scope() {
	let fx = build_app().await;
	let admin = auth(UserId(99), fx.tn_id, &["superadmin"]);

	let res = fx
		.app
		.perm
		.assign_role(&admin, &TenantScope::Unset, UserId(7), fx.teacher_role, None)
		.await;
	assert!(matches!(res, Err(Error::TenantRequired)));

	// `All` is a read bypass, never a write target
	let res = fx
		.app
		.perm
		.assign_role(&admin, &TenantScope::all_tenants(), UserId(7), fx.teacher_role, None)
		.await;
	assert!(matches!(res, Err(Error::TenantRequired)));
}

#[tokio::test]
async fn test_assign_rejects_cross_tenant_role() {
	let fx = build_app().await;
	let admin = auth(UserId(99), fx.tn_id, &["superadmin"]);

	// A role belonging to another tenant
	let other = fx
		.app
		.directory
		.create_tenant(&collegio_types::directory_adapter::CreateTenantData {
			code: "zenith",
			name: "Zenith University",
		})
		.await
		.expect("Should create tenant");
	let foreign_role = fx
		.app
		.directory
		.create_role(
			other.tn_id,
			&collegio_types::directory_adapter::CreateRoleData {
				name: "dean",
				level: 2,
				parent: None,
			},
		)
		.await
		.expect("Should create role");

	let scope = TenantScope::Tenant(fx.tn_id);
	let res = fx.app.perm.assign_role(&admin, &scope, UserId(7), foreign_role.role_id, None).await;
	assert!(matches!(res, Err(Error::CrossTenant)));
}

#[tokio::test]
async fn test_resolve_scope_for_picks_broadest() {
	let fx = build_app().await;
	use collegio_types::directory_adapter::PermScope;

	let principal = auth(PRINCIPAL, fx.tn_id, &[]);
	let scope = fx.app.perm.resolve_scope_for(&principal, "teams").await.expect("Should resolve");
	assert_eq!(scope, Some(PermScope::Department));

	let teacher = auth(TEACHER, fx.tn_id, &[]);
	let scope = fx.app.perm.resolve_scope_for(&teacher, "teams").await.expect("Should resolve");
	assert_eq!(scope, Some(PermScope::Own));

	let scope = fx.app.perm.resolve_scope_for(&teacher, "grades").await.expect("Should resolve");
	assert_eq!(scope, None);
}

#[tokio::test]
async fn test_scope_resolver_narrowing() {
	use collegio::core::scope_resolver::RowFilter;
	let fx = build_app().await;

	let principal = auth(PRINCIPAL, fx.tn_id, &[]);
	let filter = fx
		.app
		.scope_resolver
		.narrow(&fx.app.perm, &principal, "teams", RowFilter::default())
		.await
		.expect("Should narrow");
	assert_eq!(filter, RowFilter { owner: None, team_of: Some(PRINCIPAL) });

	let teacher = auth(TEACHER, fx.tn_id, &[]);
	let filter = fx
		.app
		.scope_resolver
		.narrow(&fx.app.perm, &teacher, "teams", RowFilter::default())
		.await
		.expect("Should narrow");
	assert_eq!(filter, RowFilter { owner: Some(TEACHER), team_of: None });

	// No grant at all degrades to `own`, not to an error or full access
	let stranger = auth(UserId(50), fx.tn_id, &[]);
	let filter = fx
		.app
		.scope_resolver
		.narrow(&fx.app.perm, &stranger, "grades", RowFilter::default())
		.await
		.expect("Should narrow");
	assert_eq!(filter, RowFilter { owner: Some(UserId(50)), team_of: None });

	let admin = auth(UserId(99), TnId(1), &["superadmin"]);
	let filter = fx
		.app
		.scope_resolver
		.narrow(&fx.app.perm, &admin, "teams", RowFilter::default())
		.await
		.expect("Should narrow");
	assert_eq!(filter, RowFilter::default());
}

// vim: ts=4
