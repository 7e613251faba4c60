//! Argument sets and where they come from

/// Typed argument sets and the command template they are appended to
pub mod argument_set;

/// Read argument sets from JSON files and validate them before use
pub mod read;

/// Embedded JSON schema for argument set files
pub mod schema;
