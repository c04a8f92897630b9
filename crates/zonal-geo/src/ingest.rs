//! WKT ingestion for the partition boundary format.
//!
//! Partitions arrive as tables of {label, geometry, crs-tag} where the
//! geometry column carries Simple Features / WKT text. Only polygonal
//! geometries make sense as zones; anything else is rejected here rather
//! than failing obscurely inside the overlay.

use geo::{Geometry, MultiPolygon};
use wkt::TryFromWkt;
use zonal_core::{Crs, Partition, Zone, ZonalError, ZonalResult};

/// Parse one zone from a WKT POLYGON or MULTIPOLYGON string.
pub fn zone_from_wkt(label: &str, wkt_str: &str) -> ZonalResult<Zone> {
    let geometry = Geometry::<f64>::try_from_wkt_str(wkt_str)
        .map_err(|e| ZonalError::Parse(format!("zone '{label}': invalid WKT: {e}")))?;

    let geometry = match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        Geometry::MultiPolygon(mp) => mp,
        other => {
            return Err(ZonalError::Parse(format!(
                "zone '{label}': expected POLYGON or MULTIPOLYGON, got {}",
                wkt_kind(&other)
            )))
        }
    };

    Ok(Zone::new(label, geometry))
}

/// Assemble a partition from (label, wkt) rows and an optional CRS tag.
pub fn partition_from_wkt(
    name: &str,
    crs_tag: Option<&str>,
    rows: &[(&str, &str)],
) -> ZonalResult<Partition> {
    let zones = rows
        .iter()
        .map(|(label, wkt_str)| zone_from_wkt(label, wkt_str))
        .collect::<ZonalResult<Vec<_>>>()?;
    Partition::new(name, crs_tag.map(Crs::new), zones)
}

fn wkt_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) | Geometry::Triangle(_) => "POLYGON",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
    }
}
