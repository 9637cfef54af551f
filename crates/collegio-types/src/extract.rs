//! Custom Axum extractors for Collegio-specific types.
//!
//! The middleware stack stores the authenticated principal and the resolved
//! tenant scope in the request extensions; these extractors read them back.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::AuthCtx;
use crate::error::Error;
use crate::scope::TenantScope;

// Auth //
//******//
#[derive(Debug, Clone)]
pub struct Auth(pub AuthCtx);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		if let Some(auth) = parts.extensions.get::<Auth>().cloned() {
			Ok(auth)
		} else {
			Err(Error::PermissionDenied)
		}
	}
}

// OptionalAuth //
//**************//
/// Optional auth extractor that doesn't fail if auth is missing.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthCtx>);

impl<S> FromRequestParts<S> for OptionalAuth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let auth = parts.extensions.get::<Auth>().cloned().map(|a| a.0);
		Ok(OptionalAuth(auth))
	}
}

// TenantScope //
//*************//
// A request that never passed the scoping middleware extracts as `Unset`,
// which is fail-closed downstream; extraction itself cannot widen access.
impl<S> FromRequestParts<S> for TenantScope
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(parts.extensions.get::<TenantScope>().copied().unwrap_or_default())
	}
}

// vim: ts=4
