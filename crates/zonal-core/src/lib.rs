//! # zonal-core: Zone Translation Core
//!
//! Data model and numeric kernel for translating per-zone quantities between
//! two polygon partitions of the same region (e.g., balancing-authority
//! areas to load zones).
//!
//! ## Design Philosophy
//!
//! The geometry work (validity repair, projection, overlay) lives in
//! `zonal-geo`; this crate owns everything that survives the geometry:
//!
//! - **Zones and partitions**: labeled `MultiPolygon`s with a declared CRS
//!   tag, never mutated by the pipeline
//! - **Fragments**: the transient overlap pieces the overlay engine emits
//! - **The translation matrix**: a sparse row-stochastic table
//!   `M[source, target]`, rebalanced to conserve mass despite target
//!   overlaps, gaps and isolated sources
//! - **Diagnostics**: recoverable defects collected, not thrown
//!
//! ## Quick Start
//!
//! ```
//! use geo::{polygon, MultiPolygon};
//! use zonal_core::{Crs, Partition, Zone};
//!
//! let triangle = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)];
//! let partition = Partition::new(
//!     "demo",
//!     Some(Crs::new("EPSG:4326")),
//!     vec![Zone::new("A1", MultiPolygon::new(vec![triangle]))],
//! ).unwrap();
//!
//! assert_eq!(partition.labels(), vec!["A1"]);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`] - translation matrix builder and diagnostic report
//! - [`diagnostics`] - warning/error collection shared by all operations
//! - [`error`] - the unified [`ZonalError`]
//! - [`units`] - the `SquareMeters` newtype

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod matrix;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{ZonalError, ZonalResult};
pub use matrix::{Fragment, InterestingView, MatrixReport, TranslationMatrix};
pub use units::SquareMeters;

/// Opaque coordinate reference system tag (e.g. "EPSG:4269").
///
/// The core does not parse authority registries; it only distinguishes the
/// geographic tags it can reproject from the working metric CRS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    pub fn new(tag: impl Into<String>) -> Self {
        Crs(tag.into())
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Geographic (degree-based) systems the normalizer knows how to project.
    pub fn is_geographic(&self) -> bool {
        matches!(
            self.0.as_str(),
            "EPSG:4326" | "EPSG:4269" | "OGC:CRS84" | "CRS84"
        )
    }

    /// The working metric CRS: spherical Pseudo-Mercator.
    pub fn is_pseudo_mercator(&self) -> bool {
        self.0 == "EPSG:3857"
    }
}

impl From<&str> for Crs {
    fn from(tag: &str) -> Self {
        Crs(tag.to_string())
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One labeled planar region of a partition.
///
/// Labels are opaque strings, unique within a partition. Geometries may
/// overlap each other and need not cover the region; the matrix builder
/// recovers from both.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub label: String,
    pub geometry: MultiPolygon<f64>,
}

impl Zone {
    pub fn new(label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            label: label.into(),
            geometry,
        }
    }
}

/// A named, ordered collection of zones with a common CRS.
///
/// Supplied by the caller and never mutated by the pipeline; sanitize and
/// normalize return fresh partitions. Zone order is significant: it fixes
/// the row/column order of every matrix built from this partition.
#[derive(Debug, Clone)]
pub struct Partition {
    name: String,
    crs: Option<Crs>,
    zones: Vec<Zone>,
}

impl Partition {
    /// Create a partition, rejecting duplicate zone labels.
    pub fn new(
        name: impl Into<String>,
        crs: Option<Crs>,
        zones: Vec<Zone>,
    ) -> ZonalResult<Self> {
        let name = name.into();
        let mut labels = std::collections::HashSet::new();
        for zone in &zones {
            if !labels.insert(zone.label.as_str()) {
                return Err(ZonalError::DuplicateLabel {
                    partition: name,
                    label: zone.label.clone(),
                });
            }
        }
        Ok(Self { name, crs, zones })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn labels(&self) -> Vec<&str> {
        self.zones.iter().map(|z| z.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.label == label)
    }
}

/// A zone reprojected to the working metric CRS, annotated with its area.
#[derive(Debug, Clone)]
pub struct NormalizedZone {
    pub label: String,
    pub geometry: MultiPolygon<f64>,
    pub area: SquareMeters,
}

/// A partition in the working metric CRS (EPSG:3857), areas precomputed.
///
/// Produced by the normalizer; both sides of an overlay must be normalized
/// so every area ratio uses the same planar measure.
#[derive(Debug, Clone)]
pub struct NormalizedPartition {
    name: String,
    zones: Vec<NormalizedZone>,
}

impl NormalizedPartition {
    pub fn new(name: impl Into<String>, zones: Vec<NormalizedZone>) -> Self {
        Self {
            name: name.into(),
            zones,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[NormalizedZone] {
        &self.zones
    }

    pub fn labels(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.label.clone()).collect()
    }

    /// (label, area) pairs in declared order, as the matrix builder wants them.
    pub fn areas(&self) -> Vec<(String, SquareMeters)> {
        self.zones
            .iter()
            .map(|z| (z.label.clone(), z.area))
            .collect()
    }
}
