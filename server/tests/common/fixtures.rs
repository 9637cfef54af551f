//! App fixtures: a seeded in-memory directory and builder helpers.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;

use collegio::core::token::generate_access_token;
use collegio::{App, AppBuilder};
use collegio_types::auth::AuthCtx;
use collegio_types::directory_adapter::{
	CreateAssignmentData, CreateRoleData, CreateTenantData, DirectoryAdapter, PermScope,
};
use collegio_types::types::{RoleId, TnId, UserId};

use super::adapters::MemDirectory;

pub const TOKEN_SECRET: &str = "test-secret";

/// User 1 holds the principal role (level 2).
pub const PRINCIPAL: UserId = UserId(1);
/// User 2 holds the teacher role (level 5).
pub const TEACHER: UserId = UserId(2);

pub struct TestApp {
	pub app: App,
	pub tn_id: TnId,
	pub principal_role: RoleId,
	pub teacher_role: RoleId,
}

/// One tenant ("acme"), a two-level role tree, a small permission catalog,
/// and bootstrap assignments for [`PRINCIPAL`] and [`TEACHER`].
pub async fn build_app() -> TestApp {
	let directory = Arc::new(MemDirectory::new());

	let tenant = directory
		.create_tenant(&CreateTenantData { code: "acme", name: "ACME College" })
		.await
		.expect("Should create tenant");
	let tn_id = tenant.tn_id;

	let principal_role = directory
		.create_role(tn_id, &CreateRoleData { name: "principal", level: 2, parent: None })
		.await
		.expect("Should create role");
	let teacher_role = directory
		.create_role(
			tn_id,
			&CreateRoleData { name: "teacher", level: 5, parent: Some(principal_role.role_id) },
		)
		.await
		.expect("Should create role");

	for (code, category) in [
		("users.assign_role", "users"),
		("roles.manage", "roles"),
		("students.read", "students"),
		("teams.list", "teams"),
	] {
		directory.register_permission(code, category).await.expect("Should register permission");
	}

	for (code, scope) in [
		("users.assign_role", PermScope::College),
		("roles.manage", PermScope::College),
		("students.read", PermScope::College),
		("teams.list", PermScope::Department),
	] {
		directory
			.grant_permission(principal_role.role_id, code, true, scope)
			.await
			.expect("Should grant permission");
	}
	directory
		.grant_permission(teacher_role.role_id, "teams.list", false, PermScope::Own)
		.await
		.expect("Should grant permission");

	for (user_id, role_id) in
		[(PRINCIPAL, principal_role.role_id), (TEACHER, teacher_role.role_id)]
	{
		directory
			.create_assignment(
				tn_id,
				&CreateAssignmentData {
					user_id,
					role_id,
					assigned_by: PRINCIPAL,
					expires_at: None,
					enforce_level: false,
				},
			)
			.await
			.expect("Should create seed assignment");
	}

	let mut builder = AppBuilder::new();
	builder
		.token_secret(TOKEN_SECRET)
		.resource("students")
		.resource("attendance")
		.directory_adapter(directory);
	let app = builder.build();

	TestApp {
		app,
		tn_id,
		principal_role: principal_role.role_id,
		teacher_role: teacher_role.role_id,
	}
}

pub fn auth(user_id: UserId, tn_id: TnId, roles: &[&str]) -> AuthCtx {
	AuthCtx { user_id, tn_id, roles: roles.iter().map(|r| Box::from(*r)).collect() }
}

/// `Authorization` header value for the given principal.
pub fn bearer(user_id: UserId, tn_id: TnId, roles: Option<&str>) -> String {
	let token = generate_access_token(TOKEN_SECRET, user_id, tn_id, roles)
		.expect("Should mint test token");
	format!("Bearer {}", token)
}

// vim: ts=4
