pub use collegio_types::error::{ClResult, Error};

// vim: ts=4
