use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde::Deserialize;

use collegio_types::directory_adapter::{CreateTenantData, ListTenantsOptions, Tenant};

use crate::core::Auth;
use crate::prelude::*;
use crate::types::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ListTenantsQuery {
	pub q: Option<Box<str>>,
	pub active: Option<bool>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

/// GET /api/tenants
///
/// Under a tenant scope this returns at most the caller's own tenant; the
/// full catalog needs the `all` scope (superadmin only). Unset scope returns
/// an empty list, not an error.
pub async fn list_tenants(
	State(app): State<App>,
	scope: TenantScope,
	Query(query): Query<ListTenantsQuery>,
) -> ClResult<Json<ApiResponse<Vec<Tenant>>>> {
	let opts = ListTenantsOptions {
		q: query.q.as_deref(),
		active: query.active,
		limit: query.limit,
		offset: query.offset,
	};
	let tenants = app.directory.list_tenants(scope.filter(), &opts).await?;

	let offset = query.offset.unwrap_or(0) as usize;
	let count = tenants.len();
	Ok(Json(ApiResponse::with_pagination(tenants, offset, count, None)))
}

/// GET /api/tenants/{tn_id}
///
/// A tenant-scoped caller asking for a different tenant gets 404, the same
/// answer as for a tenant that does not exist.
pub async fn read_tenant(
	State(app): State<App>,
	scope: TenantScope,
	Path(tn_id): Path<u32>,
) -> ClResult<Json<Tenant>> {
	let tn_id = TnId(tn_id);
	match scope.filter() {
		ScopeFilter::Empty => Err(Error::NotFound),
		ScopeFilter::Tenant(scoped) if scoped != tn_id => Err(Error::CrossTenant),
		_ => Ok(Json(app.directory.read_tenant(tn_id).await?)),
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
	pub code: Box<str>,
	pub name: Box<str>,
}

/// POST /api/tenants
///
/// Tenant provisioning is a platform operation, superadmin only.
pub async fn create_tenant(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<CreateTenantRequest>,
) -> ClResult<(StatusCode, Json<Tenant>)> {
	if !auth.is_superadmin() {
		return Err(Error::PermissionDenied);
	}
	if req.code.trim().is_empty() || req.name.trim().is_empty() {
		return Err(Error::Validation("tenant code and name are required".into()));
	}

	let tenant = app
		.directory
		.create_tenant(&CreateTenantData { code: &req.code, name: &req.name })
		.await?;
	info!(tn_id = %tenant.tn_id, code = %tenant.code, "tenant created");

	Ok((StatusCode::CREATED, Json(tenant)))
}

// vim: ts=4
