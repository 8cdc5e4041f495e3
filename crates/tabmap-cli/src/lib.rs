//! Library side of the `tabmap` command line tool.
//!
//! The binary wires these modules to the import wizard; they live in a
//! library so integration tests can drive them without spawning a process.

pub mod local;
pub mod logging;
pub mod settings;
pub mod summary;
