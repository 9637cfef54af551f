//! Role graph: derived ancestor/descendant views over the role tree.
//!
//! The graph is an in-memory snapshot built from the stored roles. The
//! ancestor and descendant relations are computed on demand from the `parent`
//! pointers — never materialized as stored edges — so they are always
//! consistent with the tree shape the snapshot was taken from.

use std::collections::{HashMap, HashSet};

use collegio_types::directory_adapter::Role;

use crate::prelude::*;

#[derive(Debug)]
pub struct RoleGraph {
	roles: HashMap<RoleId, Role>,
	children: HashMap<RoleId, Vec<RoleId>>,
}

impl RoleGraph {
	pub fn new(roles: Vec<Role>) -> Self {
		let mut children: HashMap<RoleId, Vec<RoleId>> = HashMap::new();
		for role in &roles {
			if let Some(parent) = role.parent {
				children.entry(parent).or_default().push(role.role_id);
			}
		}
		let roles = roles.into_iter().map(|r| (r.role_id, r)).collect();
		Self { roles, children }
	}

	pub fn role(&self, role_id: RoleId) -> Option<&Role> {
		self.roles.get(&role_id)
	}

	pub fn roles(&self) -> impl Iterator<Item = &Role> {
		self.roles.values()
	}

	/// Walks the `parent` chain upward. A visited set guards against cycles
	/// introduced by bad data; a cycle terminates the walk instead of looping.
	pub fn ancestors(&self, role_id: RoleId, include_self: bool) -> Vec<RoleId> {
		let mut out = Vec::new();
		let mut seen: HashSet<RoleId> = HashSet::new();
		seen.insert(role_id);
		if include_self && self.roles.contains_key(&role_id) {
			out.push(role_id);
		}

		let mut current = self.roles.get(&role_id).and_then(|r| r.parent);
		while let Some(id) = current {
			if !seen.insert(id) {
				warn!(role_id = %id, "cycle in role tree");
				break;
			}
			let Some(role) = self.roles.get(&id) else { break };
			out.push(id);
			current = role.parent;
		}
		out
	}

	/// Breadth-first walk over the child index.
	pub fn descendants(&self, role_id: RoleId, include_self: bool) -> Vec<RoleId> {
		let mut out = Vec::new();
		let mut seen: HashSet<RoleId> = HashSet::new();
		seen.insert(role_id);
		if include_self && self.roles.contains_key(&role_id) {
			out.push(role_id);
		}

		let mut queue: Vec<RoleId> = self.children.get(&role_id).cloned().unwrap_or_default();
		while let Some(id) = queue.pop() {
			if !seen.insert(id) {
				continue;
			}
			out.push(id);
			if let Some(children) = self.children.get(&id) {
				queue.extend_from_slice(children);
			}
		}
		out
	}
}


// vim: ts=4
