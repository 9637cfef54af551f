//! Core engine: app state, request scoping, role graph, permission cache,
//! hierarchy propagation, and row-level scope resolution.

pub mod app;
pub mod extract;
pub mod hierarchy;
pub mod middleware;
pub mod perm;
pub mod roles;
pub mod scope_resolver;
pub mod token;

pub use extract::{Auth, OptionalAuth};

// vim: ts=4
