//! Request-scoped tenant context.
//!
//! `TenantScope` is an explicit value set once by the scoping middleware and
//! carried in the request extensions for the lifetime of one request. There is
//! no global or thread-local tenant state anywhere in the system: the scope is
//! created fresh per request and dropped with it on every exit path.

use crate::error::{ClResult, Error};
use crate::types::TnId;

// ScopeFilter //
//*************//
/// The restriction every tenant-scoped read takes.
///
/// Adapters receiving `Empty` must return zero rows without touching storage.
/// An absent tenant context never degrades to "see everything".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeFilter {
	/// No tenant bound: fail closed, return nothing.
	Empty,
	/// Restrict to rows owned by this tenant.
	Tenant(TnId),
	/// No tenant restriction (administrative bypass).
	All,
}

// TenantScope //
//*************//
/// The tenant binding of the current request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TenantScope {
	/// No tenant resolved. Reads are empty, scoped writes fail.
	#[default]
	Unset,
	Tenant(TnId),
	/// Cross-tenant access. Only produced by the middleware for superadmins,
	/// or constructed explicitly via [`TenantScope::all_tenants`].
	All,
}

impl TenantScope {
	/// Explicit cross-tenant escape hatch for batch jobs and admin tooling.
	///
	/// Must not be called on a request-reachable code path without a prior
	/// authorization check; request handlers obtain `All` only through the
	/// middleware's superadmin gate.
	pub fn all_tenants() -> TenantScope {
		TenantScope::All
	}

	pub fn filter(&self) -> ScopeFilter {
		match self {
			TenantScope::Unset => ScopeFilter::Empty,
			TenantScope::Tenant(tn_id) => ScopeFilter::Tenant(*tn_id),
			TenantScope::All => ScopeFilter::All,
		}
	}

	/// The tenant to stamp onto a scoped write.
	///
	/// Fails with [`Error::TenantRequired`] when no tenant is bound; an
	/// unscoped or null-tenant row must never be written.
	pub fn require_tenant(&self) -> ClResult<TnId> {
		match self {
			TenantScope::Tenant(tn_id) => Ok(*tn_id),
			_ => Err(Error::TenantRequired),
		}
	}

	pub fn tenant(&self) -> Option<TnId> {
		match self {
			TenantScope::Tenant(tn_id) => Some(*tn_id),
			_ => None,
		}
	}

	pub fn is_all(&self) -> bool {
		matches!(self, TenantScope::All)
	}
}


// vim: ts=4
