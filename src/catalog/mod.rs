//! # Catalogs: columnar tables and spherical matching
//!
//! The columnar foundation of the crate. [`table::ColumnTable`] is a generic
//! in-memory table of named, equal-length columns; [`sky::SkyCatalog`] wraps
//! it with mandatory `ra`/`dec` position columns and adds unit-sphere
//! matching and index-aligned merging; [`table_file`] is the opaque tabular
//! store boundary (read/write with exact round-trip of names, kinds, values
//! and sentinels).
//!
//! Tables are mutated in place and are not synchronized: parallel workers
//! must partition the work by brick and run identity (see
//! [`crate::runs`]) so each owns its table instances.

pub mod column;
pub mod sky;
pub mod table;
pub mod table_file;

pub use column::{Column, ColumnKind, Rows};
pub use sky::{RadecMatch, SkyCatalog};
pub use table::{CollisionPolicy, ColumnTable, MergeIndex};
