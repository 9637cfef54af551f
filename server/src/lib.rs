//! Collegio is a multi-tenant backend core for campus/college ERP systems.
//!
//! # Features
//!
//! - Multi-tenant request scoping
//!		- tenant resolved once at the request boundary from an inbound header
//!		- every read automatically narrowed to the bound tenant
//!		- fail-closed: an absent tenant context yields empty results, never all rows
//!	- Hierarchical role graph
//!		- self-referencing role tree with derived ancestor/descendant views
//!		- numeric role levels guarding against privilege escalation
//!	- Permission resolution
//!		- per-principal permission cache with push-based invalidation
//!	- Hierarchy propagation
//!		- leader/member team relationships materialized from the role tree
//!	- Row-level scope resolution
//!		- pluggable per-resource narrowing (college / department / own)

#![forbid(unsafe_code)]

pub mod core;
pub mod directory;
pub mod error;
pub mod prelude;
pub mod routes;
pub mod team;
pub mod tenant;
pub mod types;

pub use crate::core::app::{App, AppBuilder};

// vim: ts=4
