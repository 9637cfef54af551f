//! Team membership endpoints.

pub mod handler;

// vim: ts=4
