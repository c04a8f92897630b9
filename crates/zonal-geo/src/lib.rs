//! # zonal-geo: Geometry Pipeline for Zone Translation
//!
//! Turns two labeled polygon partitions into a mass-conserving translation
//! matrix, surviving the defects real infrastructure geodata carries.
//!
//! ## Pipeline
//!
//! | Stage | Module | Responsibility |
//! |-------|--------|----------------|
//! | Sanitizer | [`sanitize`] | make-valid repair of bowties and slivers |
//! | Normalizer | [`project`] | single metric CRS, per-zone areas |
//! | Overlay | [`overlay`] | intersection fragments + OUTSIDE remainder |
//! | Builder | `zonal-core::matrix` | row rebalancing, diagnostics |
//!
//! The single entry point most callers want is
//! [`build_translation_matrix`]:
//!
//! ```ignore
//! use zonal_geo::build_translation_matrix;
//!
//! let matrix = build_translation_matrix(&ba_areas, &load_zones, false)?;
//! let report = matrix.report(3);
//! println!("{}", report.interesting);
//! ```
//!
//! All stages are deterministic, in-process batch computations; nothing
//! here suspends, spawns, or holds resources beyond its call frame.

pub mod ingest;
pub mod overlay;
pub mod project;
pub mod sanitize;
pub mod translate;

pub use ingest::{partition_from_wkt, zone_from_wkt};
pub use overlay::fragments;
pub use project::normalize;
pub use sanitize::sanitize;
pub use translate::build_translation_matrix;
