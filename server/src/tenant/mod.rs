//! Tenant catalog endpoints.

pub mod handler;

// vim: ts=4
