//! CRS normalization: reproject both partitions into one metric planar
//! system before any area ratio is taken.
//!
//! The working CRS is spherical Pseudo-Mercator (EPSG:3857). It is not
//! equal-area, and that is acceptable: every ratio in a translation matrix
//! divides two areas measured in the same projection, so the shared
//! distortion cancels to within the weighting tolerance over
//! sub-continental regions. What is never acceptable is mixing geodesic
//! and planar areas within one matrix.

use geo::{Area, Coord, MapCoords};
use zonal_core::{NormalizedPartition, NormalizedZone, Partition, SquareMeters, ZonalError, ZonalResult};

/// WGS84 / spherical-mercator earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Spherical Pseudo-Mercator forward projection (degrees to meters).
fn to_pseudo_mercator(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: EARTH_RADIUS_M * c.x.to_radians(),
        y: EARTH_RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + c.y.to_radians() / 2.0)
                .tan()
                .ln(),
    }
}

/// Reproject a partition to the working metric CRS and annotate each zone
/// with its planar area.
///
/// Errors: [`ZonalError::MissingCrs`] if the partition declares no CRS,
/// [`ZonalError::Crs`] for a tag the normalizer cannot project, and
/// [`ZonalError::ZeroAreaZone`] if a zone degenerates under projection.
pub fn normalize(partition: &Partition) -> ZonalResult<NormalizedPartition> {
    let crs = partition
        .crs()
        .ok_or_else(|| ZonalError::MissingCrs(partition.name().to_string()))?;

    let needs_projection = if crs.is_geographic() {
        true
    } else if crs.is_pseudo_mercator() {
        false
    } else {
        return Err(ZonalError::Crs(crs.tag().to_string()));
    };

    let mut zones = Vec::with_capacity(partition.len());
    for zone in partition.zones() {
        let geometry = if needs_projection {
            zone.geometry.map_coords(to_pseudo_mercator)
        } else {
            zone.geometry.clone()
        };
        let area = geometry.unsigned_area();
        if area <= 0.0 {
            return Err(ZonalError::ZeroAreaZone {
                partition: partition.name().to_string(),
                zone: zone.label.clone(),
            });
        }
        zones.push(NormalizedZone {
            label: zone.label.clone(),
            geometry,
            area: SquareMeters(area),
        });
    }

    Ok(NormalizedPartition::new(partition.name(), zones))
}
