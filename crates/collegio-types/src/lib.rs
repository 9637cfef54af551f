//! Shared types, adapter traits, and core utilities for the Collegio platform.
//!
//! This crate contains the foundational types shared between the server crate
//! and all adapter implementations: identifier newtypes, the error taxonomy,
//! the request-scoped tenant context, and the `DirectoryAdapter` trait that
//! backs roles, permissions, and the organizational hierarchy.

pub mod auth;
pub mod directory_adapter;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod scope;
pub mod types;

// vim: ts=4
