use axum::{
	Json,
	extract::{Query, State},
};
use serde::Deserialize;

use collegio_types::directory_adapter::{ListTeamMembershipOptions, TeamMembership};

use crate::core::Auth;
use crate::core::scope_resolver::RowFilter;
use crate::prelude::*;
use crate::types::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ListMembershipsQuery {
	pub resource: Option<Box<str>>,
}

/// GET /api/teams/memberships
///
/// Tenant scoping and permission-scope narrowing compose: the tenant filter
/// bounds the rows, then the caller's `teams.*` scope narrows to their teams
/// (`department`) or their own rows (`own`).
pub async fn list_memberships(
	State(app): State<App>,
	Auth(auth): Auth,
	scope: TenantScope,
	Query(query): Query<ListMembershipsQuery>,
) -> ClResult<Json<ApiResponse<Vec<TeamMembership>>>> {
	let row_filter =
		app.scope_resolver.narrow(&app.perm, &auth, "teams", RowFilter::default()).await?;

	let opts = ListTeamMembershipOptions {
		leader: row_filter.team_of,
		member: row_filter.owner,
		resource: query.resource,
		auto_assigned: None,
	};
	let memberships = app.directory.list_team_memberships(scope.filter(), &opts).await?;

	Ok(Json(ApiResponse::new(memberships)))
}

// vim: ts=4
