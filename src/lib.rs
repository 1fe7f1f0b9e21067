//! # skysim — catalog subsystem for synthetic-source injection
//!
//! Columnar catalogs with spherical matching and merging, a static brick
//! registry over sky tiles, and a deterministic run-identity/path scheme
//! that lets many uncoordinated parallel workers write and later locate,
//! merge and cross-match their outputs without collision.
//!
//! Contains:
//! - `catalog` : column tables, spatial catalogs (sphere match, merge), and
//!   the tabular store boundary.
//! - `bricks` : immutable registry partitioning the sky footprint into named
//!   tiles.
//! - `runs` : run-identity encoding, canonical output paths, and run-catalog
//!   discovery.
//! - `targets` : color-cut target selection and truth-table resampling.
//!
//! The core is single-process and synchronous; parallelism is obtained by
//! partitioning work by brick and run identity, whose encoded tuples map to
//! disjoint filesystem namespaces.

pub mod bricks;
pub mod catalog;
pub mod constants;
pub mod runs;
pub mod skysim_errors;
pub mod targets;

pub use bricks::{Brick, BrickCatalog, RadecBox};
pub use catalog::{
    CollisionPolicy, Column, ColumnKind, ColumnTable, MergeIndex, RadecMatch, Rows,
    SkyCatalog,
};
pub use runs::{find_file, find_pipeline_file, find_sim_file, Source};
pub use runs::{RunCatalog, RunEntry, SimIdScheme, SIM_ID_V1};
pub use skysim_errors::SkysimError;

/// Crate version, surfaced so outputs can record the code that wrote them.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
