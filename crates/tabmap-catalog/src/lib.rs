//! Target field catalog for tabmap.
//!
//! Holds the ordered set of destination fields (embedded at compile time, with
//! an optional CSV override on disk), the required-field subset and the fixed
//! default-preselection table.

pub mod catalog;
pub mod embedded;
pub mod error;
pub mod preselect;

pub use catalog::FieldCatalog;
pub use error::{CatalogError, Result};
pub use preselect::{DefaultPreselection, default_preselection, default_preselections};
