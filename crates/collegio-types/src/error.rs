//! Error taxonomy shared by the server and all adapters.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	/// A scoped write or mandatory-tenant read was attempted with no tenant
	/// bound and no administrative bypass.
	TenantRequired,
	/// An entity outside the current tenant's boundary was referenced.
	CrossTenant,
	/// An assigner attempted to grant a role above their own authority.
	PrivilegeEscalation,
	Validation(Box<str>),
	DbError,

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::TenantRequired => write!(f, "tenant header required"),
			Error::CrossTenant => write!(f, "cross-tenant reference"),
			Error::PrivilegeEscalation => write!(f, "role level exceeds assigner authority"),
			Error::Validation(msg) => write!(f, "validation: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Io(err) => write!(f, "io: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, message) = match &self {
			// CrossTenant is reported as NotFound on purpose: a probe for
			// another tenant's row must be indistinguishable from a missing row.
			Error::NotFound | Error::CrossTenant => (StatusCode::NOT_FOUND, "not found".into()),
			Error::PermissionDenied => (StatusCode::FORBIDDEN, "permission denied".into()),
			Error::PrivilegeEscalation => {
				(StatusCode::FORBIDDEN, "role level exceeds assigner authority".into())
			}
			Error::TenantRequired => (StatusCode::BAD_REQUEST, "tenant header required".into()),
			Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
			Error::DbError | Error::Io(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
			}
		};
		(status, Json(json!({ "error": message }))).into_response()
	}
}

// vim: ts=4
