use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};
use serde::Deserialize;

use collegio_types::directory_adapter::{CreateRoleData, Role, RoleAssignment};

use crate::core::Auth;
use crate::prelude::*;
use crate::types::ApiResponse;

/// Permission required to create or delete roles.
const PERM_MANAGE_ROLES: &str = "roles.manage";

// Roles //
//*******//
/// GET /api/roles
///
/// Tenant-scoped roles plus the global ones; empty under an unset scope.
pub async fn list_roles(
	State(app): State<App>,
	scope: TenantScope,
) -> ClResult<Json<ApiResponse<Vec<Role>>>> {
	let roles = app.directory.list_roles(scope.filter()).await?;
	Ok(Json(ApiResponse::new(roles)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
	pub name: Box<str>,
	pub level: i32,
	pub parent: Option<RoleId>,
}

/// POST /api/roles
pub async fn create_role(
	State(app): State<App>,
	Auth(auth): Auth,
	scope: TenantScope,
	Json(req): Json<CreateRoleRequest>,
) -> ClResult<(StatusCode, Json<Role>)> {
	if !app.perm.has_permission(&auth, PERM_MANAGE_ROLES).await? {
		return Err(Error::PermissionDenied);
	}
	if req.name.trim().is_empty() {
		return Err(Error::Validation("role name is required".into()));
	}

	let role = app
		.perm
		.create_role(
			&scope,
			&CreateRoleData { name: &req.name, level: req.level, parent: req.parent },
		)
		.await?;

	Ok((StatusCode::CREATED, Json(role)))
}

// Assignments //
//*************//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
	pub user_id: UserId,
	pub role_id: RoleId,
	pub expires_at: Option<Timestamp>,
}

/// POST /api/roles/assignments
///
/// The assignment is committed first; hierarchy propagation runs after it and
/// is reconciliation-repairable, so a propagation failure is logged but does
/// not fail the request.
pub async fn create_assignment(
	State(app): State<App>,
	Auth(auth): Auth,
	scope: TenantScope,
	Json(req): Json<CreateAssignmentRequest>,
) -> ClResult<(StatusCode, Json<RoleAssignment>)> {
	let (assignment, created) = app
		.perm
		.assign_role(&auth, &scope, req.user_id, req.role_id, req.expires_at)
		.await?;

	if created
		&& let Err(err) = app.hierarchy.on_assignment_created(&app.perm, &assignment).await
	{
		warn!(assignment_id = assignment.assignment_id, ?err, "hierarchy propagation failed");
	}

	let status = if created { StatusCode::CREATED } else { StatusCode::OK };
	Ok((status, Json(assignment)))
}

/// DELETE /api/roles/assignments/{assignment_id}
///
/// Deactivates (does not delete) the assignment, then rebuilds the derived
/// hierarchy rows for the affected principal.
pub async fn deactivate_assignment(
	State(app): State<App>,
	Auth(auth): Auth,
	scope: TenantScope,
	Path(assignment_id): Path<i64>,
) -> ClResult<Json<RoleAssignment>> {
	if !app.perm.has_permission(&auth, crate::core::perm::PERM_ASSIGN_ROLE).await? {
		return Err(Error::PermissionDenied);
	}

	let assignment = app.perm.deactivate_assignment(&scope, assignment_id).await?;

	if let Err(err) = app.hierarchy.on_assignment_deactivated(&app.perm, &assignment).await {
		warn!(assignment_id = assignment.assignment_id, ?err, "hierarchy rebuild failed");
	}

	Ok(Json(assignment))
}

// Permissions //
//*************//
/// GET /api/permissions/me
///
/// The caller's resolved permission codes. Superadmins get the full catalog.
pub async fn my_permissions(
	State(app): State<App>,
	Auth(auth): Auth,
) -> ClResult<Json<ApiResponse<Vec<Box<str>>>>> {
	let mut codes: Vec<Box<str>> = if auth.is_superadmin() {
		app.directory.list_permissions().await?.into_iter().map(|p| p.code).collect()
	} else {
		app.perm.resolve_permissions(auth.user_id).await?.iter().cloned().collect()
	};
	codes.sort_unstable();

	Ok(Json(ApiResponse::new(codes)))
}

// vim: ts=4
