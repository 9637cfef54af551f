//! Authenticated principal context.

use crate::types::{TnId, UserId};

/// Role name granting unrestricted, cross-tenant access.
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// Context struct for an authenticated principal.
#[derive(Clone, Debug)]
pub struct AuthCtx {
	pub user_id: UserId,
	pub tn_id: TnId,
	pub roles: Box<[Box<str>]>,
}

impl AuthCtx {
	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|r| r.as_ref() == role)
	}

	/// The single administrative-bypass check.
	///
	/// Everything that grants cross-tenant or all-permission access calls
	/// this predicate; no other code inspects role strings for adminness.
	pub fn is_superadmin(&self) -> bool {
		self.has_role(SUPERADMIN_ROLE)
	}
}


// vim: ts=4
