//! Scope resolver: turns a permission's scope keyword into a row-level
//! filter for list queries.
//!
//! The resolver only ever narrows: the returned filter is the caller's base
//! filter with additional constraints, never fewer. Feature modules can
//! register a resource-specific rule; everything else goes through the
//! default mapping.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use collegio_types::directory_adapter::PermScope;

use crate::core::perm::PermissionService;
use crate::prelude::*;
use crate::types::AuthCtx;

/// Row-level constraints applied on top of the tenant filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
	/// Restrict to rows owned by this principal.
	pub owner: Option<UserId>,
	/// Restrict to rows belonging to principals in this leader's teams.
	pub team_of: Option<UserId>,
}

/// Maps a scope keyword to a row filter for one resource.
pub trait ScopeRule: Send + Sync {
	fn apply(&self, auth: &AuthCtx, scope: PermScope, base: RowFilter) -> RowFilter;
}

/// college: tenant-wide, no extra constraint. department: rows reachable
/// through the principal's team leaderships. own: rows the principal owns.
pub struct DefaultScopeRule;

impl ScopeRule for DefaultScopeRule {
	fn apply(&self, auth: &AuthCtx, scope: PermScope, base: RowFilter) -> RowFilter {
		match scope {
			PermScope::College => base,
			PermScope::Department => RowFilter { team_of: Some(auth.user_id), ..base },
			PermScope::Own => RowFilter { owner: Some(auth.user_id), ..base },
		}
	}
}

pub struct ScopeResolver {
	rules: RwLock<HashMap<Box<str>, Arc<dyn ScopeRule>>>,
	default_rule: Arc<dyn ScopeRule>,
}

impl Default for ScopeResolver {
	fn default() -> Self {
		Self::new()
	}
}

impl ScopeResolver {
	pub fn new() -> Self {
		Self { rules: RwLock::new(HashMap::new()), default_rule: Arc::new(DefaultScopeRule) }
	}

	pub fn register(&self, resource: &str, rule: Arc<dyn ScopeRule>) {
		self.rules.write().insert(resource.into(), rule);
	}

	/// Narrows `base` by the broadest scope the principal holds for the
	/// resource. No grant at all degrades to `own`, the most restrictive
	/// mapping, rather than an error. Superadmins pass the base through.
	pub async fn narrow(
		&self,
		perm: &PermissionService,
		auth: &AuthCtx,
		resource: &str,
		base: RowFilter,
	) -> ClResult<RowFilter> {
		if auth.is_superadmin() {
			return Ok(base);
		}

		let scope = perm.resolve_scope_for(auth, resource).await?.unwrap_or(PermScope::Own);
		let rule = self
			.rules
			.read()
			.get(resource)
			.cloned()
			.unwrap_or_else(|| self.default_rule.clone());

		let filter = rule.apply(auth, scope, base);
		debug!(user_id = %auth.user_id, resource = resource, scope = scope.as_str(), "scope narrowed");
		Ok(filter)
	}
}


// vim: ts=4
