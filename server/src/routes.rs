use axum::{
	Router, middleware,
	routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::middleware::{optional_auth, require_auth, tenant_scope};
use crate::prelude::*;
use crate::{directory, team, tenant};

pub fn init(app: App) -> Router {
	let assignment_router = Router::new()
		.route("/api/roles/assignments", post(directory::handler::create_assignment))
		.route(
			"/api/roles/assignments/{assignment_id}",
			delete(directory::handler::deactivate_assignment),
		)
		.layer(middleware::from_fn_with_state(app.clone(), require_auth));

	// optional_auth must run before tenant_scope: the scope resolution of the
	// `all` sentinel consults the authenticated principal.
	Router::new()
		.route(
			"/api/tenants",
			get(tenant::handler::list_tenants).post(tenant::handler::create_tenant),
		)
		.route("/api/tenants/{tn_id}", get(tenant::handler::read_tenant))
		.route(
			"/api/roles",
			get(directory::handler::list_roles).post(directory::handler::create_role),
		)
		.route("/api/permissions/me", get(directory::handler::my_permissions))
		.route("/api/teams/memberships", get(team::handler::list_memberships))
		.merge(assignment_router)
		.layer(middleware::from_fn_with_state(app.clone(), tenant_scope))
		.layer(middleware::from_fn_with_state(app.clone(), optional_auth))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(app)
}

// vim: ts=4
