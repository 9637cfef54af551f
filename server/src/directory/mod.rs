//! Role, permission and assignment endpoints.

pub mod handler;

// vim: ts=4
