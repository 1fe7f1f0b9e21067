//! # Run identities, canonical paths and run catalogs
//!
//! Everything that lets many independent, uncoordinated workers write and
//! later locate their outputs without collision:
//!
//! * [`sim_id`] – deterministic bijection between a work-unit key tuple and a
//!   short encoded string.
//! * [`paths`] – pure resolution of the canonical nested output path.
//! * [`run_catalog`] – enumeration of (brickname, sim-id) work units by
//!   directory discovery or from explicit lists.

pub mod paths;
pub mod run_catalog;
pub mod sim_id;

pub use paths::{find_file, find_pipeline_file, find_sim_file, Source};
pub use run_catalog::{RunCatalog, RunEntry};
pub use sim_id::{SimIdScheme, SimIdValues, SIM_ID_V1};
