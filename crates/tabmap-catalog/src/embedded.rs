//! Embedded catalog data.
//!
//! The default field catalog is compiled into the binary with `include_str!()`
//! so the engine works without any file on disk.

/// Default target field catalog (performance session metrics).
pub const FIELDS_CSV: &str = include_str!("../data/fields.csv");
