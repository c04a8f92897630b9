//! Geometry repair for partitions headed into set-theoretic overlay.
//!
//! Real shapefiles carry bowties, self-touching rings and zero-area
//! slivers; boolean overlay on such input produces garbage areas (a bowtie
//! ring's shoelace area is near zero because the lobes cancel). The
//! sanitizer applies the simple-features make-valid procedure: invalid
//! polygonal geometry is passed through the boolean-ops kernel, which
//! splits self-intersections into valid lobes and collapses slivers.
//! Already-valid geometry passes through untouched.

use geo::{BooleanOps, MultiPolygon, Validation};
use zonal_core::{Partition, Zone, ZonalError, ZonalResult};

/// Return an equivalent partition in which every geometry passes planar
/// validity. Fails only if a zone's geometry is not a polygonal region.
pub fn sanitize(partition: &Partition) -> ZonalResult<Partition> {
    let mut repaired = Vec::with_capacity(partition.len());

    for zone in partition.zones() {
        if !is_polygonal(&zone.geometry) {
            return Err(ZonalError::InvalidGeometry {
                partition: partition.name().to_string(),
                zone: zone.label.clone(),
            });
        }

        let geometry = if zone.geometry.is_valid() {
            zone.geometry.clone()
        } else {
            make_valid(&zone.geometry)
        };

        if !geometry.is_valid() {
            return Err(ZonalError::InvalidGeometry {
                partition: partition.name().to_string(),
                zone: zone.label.clone(),
            });
        }

        repaired.push(Zone::new(zone.label.clone(), geometry));
    }

    Partition::new(partition.name(), partition.crs().cloned(), repaired)
}

/// A union against the empty set runs the geometry through the overlay
/// kernel's node-and-rebuild pass: crossing rings come back as separate
/// valid polygons whose union equals the input's well-defined point set.
fn make_valid(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.union(&MultiPolygon::new(Vec::new()))
}

fn is_polygonal(geometry: &MultiPolygon<f64>) -> bool {
    !geometry.0.is_empty()
        && geometry
            .iter()
            .any(|polygon| polygon.exterior().0.len() >= 4)
}
