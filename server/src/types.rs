//! Common types used throughout the Collegio server.

use serde::Serialize;
use serde_with::skip_serializing_none;

pub use collegio_types::auth::AuthCtx;
pub use collegio_types::scope::{ScopeFilter, TenantScope};
pub use collegio_types::types::{NodeId, RoleId, TeamId, Timestamp, TnId, UserId, now};

// ApiResponse //
//*************//
/// Standard response envelope for list/detail endpoints.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub data: T,
	pub pagination: Option<Pagination>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub offset: usize,
	pub count: usize,
	pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, pagination: None }
	}

	pub fn with_pagination(data: T, offset: usize, count: usize, total: Option<usize>) -> Self {
		Self { data, pagination: Some(Pagination { offset, count, total }) }
	}
}

// vim: ts=4
