//! Custom middlewares: authentication and tenant scoping.
//!
//! The scoping middleware is the request boundary of the whole engine. It
//! resolves the inbound tenant header into a [`TenantScope`] and stores it in
//! the request extensions. The scope is an explicit per-request value: it is
//! created fresh for every request and dropped with the request on every exit
//! path (success, handled error, or cancellation mid-flight), so no residue
//! can leak into an unrelated request served by the same worker.

use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Request, header, response::Response},
	middleware::Next,
};

use crate::core::{Auth, token};
use crate::prelude::*;

/// Primary tenant-identifying header.
pub const TENANT_HEADER: &str = "x-tenant-id";
/// Accepted for backward compatibility; the primary header wins if both are present.
pub const TENANT_HEADER_LEGACY: &str = "x-college-id";

/// Sentinel header value meaning "no tenant restriction".
const ALL_TENANTS: &str = "all";

pub async fn require_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	let auth_header = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.ok_or(Error::PermissionDenied)?;

	if !auth_header.starts_with("Bearer ") {
		return Err(Error::PermissionDenied);
	}

	let token = auth_header[7..].trim();
	let auth = token::validate_access_token(&app.opts.token_secret, token)?;

	req.extensions_mut().insert(Auth(auth));

	Ok(next.run(req).await)
}

pub async fn optional_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	if let Some(auth_header) =
		req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok())
		&& auth_header.starts_with("Bearer ")
	{
		let token = auth_header[7..].trim();
		let auth = token::validate_access_token(&app.opts.token_secret, token)?;
		req.extensions_mut().insert(Auth(auth));
	}

	Ok(next.run(req).await)
}

/// Resolves the tenant header into a [`TenantScope`] request extension.
///
/// Must be layered inside `optional_auth` so the `all` sentinel can consult
/// the authenticated principal.
pub async fn tenant_scope(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	let auth = req.extensions().get::<Auth>().cloned();
	let scope = resolve_scope(&app, req.headers(), auth.as_ref()).await;

	// A token is bound to the tenant it was minted for. Grants resolved for
	// the principal would otherwise travel with the header into any tenant.
	if let (TenantScope::Tenant(tn_id), Some(Auth(ctx))) = (scope, auth.as_ref())
		&& ctx.tn_id != tn_id
		&& !ctx.is_superadmin()
	{
		debug!(token_tn = %ctx.tn_id, scope_tn = %tn_id, "token tenant does not match request tenant");
		return Err(Error::PermissionDenied);
	}

	req.extensions_mut().insert(scope);

	Ok(next.run(req).await)
}

async fn resolve_scope(app: &App, headers: &HeaderMap, auth: Option<&Auth>) -> TenantScope {
	let Some(value) = headers
		.get(TENANT_HEADER)
		.or_else(|| headers.get(TENANT_HEADER_LEGACY))
		.and_then(|h| h.to_str().ok())
		.map(str::trim)
	else {
		return TenantScope::Unset;
	};

	if value.eq_ignore_ascii_case(ALL_TENANTS) {
		// The sentinel is honored only for superadmins. Anyone else falls
		// through to Unset, which is fail-closed downstream.
		return match auth {
			Some(Auth(ctx)) if ctx.is_superadmin() => TenantScope::All,
			_ => {
				debug!("'all' tenant scope requested without superadmin rights");
				TenantScope::Unset
			}
		};
	}

	// Numeric id or tenant code, resolved with the explicitly unscoped
	// catalog lookup. An unresolvable value is not an error at this layer:
	// the tenant requirement is enforced downstream.
	let tenant = match value.parse::<u32>() {
		Ok(id) => app.directory.read_tenant(TnId(id)).await,
		Err(_) => app.directory.read_tenant_by_code(value).await,
	};

	match tenant {
		Ok(tenant) if tenant.active => TenantScope::Tenant(tenant.tn_id),
		Ok(tenant) => {
			debug!(tn_id = %tenant.tn_id, "inactive tenant in scope header");
			TenantScope::Unset
		}
		Err(_) => {
			debug!(header = value, "unresolvable tenant in scope header");
			TenantScope::Unset
		}
	}
}

// vim: ts=4
