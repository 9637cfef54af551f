//! Custom extractors for Collegio-specific data.
//!
//! The `FromRequestParts` implementations live in collegio-types next to the
//! types they extract; this module re-exports them for handler imports.

pub use collegio_types::extract::{Auth, OptionalAuth};

// vim: ts=4
