//! Planar overlay of two normalized partitions.
//!
//! Produces the fragment set the matrix builder pivots: one fragment per
//! (source zone, target zone) pair with positive intersection area, plus
//! one OUTSIDE fragment per source zone for whatever part of it the target
//! cover misses. Empty intersections produce no fragment at all.
//!
//! Candidate pairs are prefiltered by bounding rectangle before the exact
//! boolean intersection runs. The OUTSIDE area is measured against the
//! union of all target zones, not against the sum of per-target fragments,
//! so overlapping targets cannot leak into the OUTSIDE column.

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon};
use zonal_core::{Fragment, NormalizedPartition, SquareMeters};

/// Compute the overlap fragments of `source` against `target`.
///
/// Both partitions must already be normalized to the same metric CRS;
/// fragment areas per source label sum to the source zone's area when the
/// target zones are disjoint (overlaps double-count, by design).
pub fn fragments(source: &NormalizedPartition, target: &NormalizedPartition) -> Vec<Fragment> {
    let target_boxes: Vec<_> = target
        .zones()
        .iter()
        .map(|z| z.geometry.bounding_rect())
        .collect();

    let cover: MultiPolygon<f64> = target
        .zones()
        .iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, z| {
            acc.union(&z.geometry)
        });

    let mut out = Vec::new();
    for s in source.zones() {
        let s_box = s.geometry.bounding_rect();

        for (t, t_box) in target.zones().iter().zip(&target_boxes) {
            let candidate = match (&s_box, t_box) {
                (Some(a), Some(b)) => a.intersects(b),
                _ => false,
            };
            if !candidate {
                continue;
            }
            let area = s.geometry.intersection(&t.geometry).unsigned_area();
            if area > 0.0 {
                out.push(Fragment::new(
                    s.label.clone(),
                    Some(t.label.clone()),
                    SquareMeters(area),
                ));
            }
        }

        let covered = s.geometry.intersection(&cover).unsigned_area();
        let outside = s.area.value() - covered;
        if outside > 0.0 {
            out.push(Fragment::new(s.label.clone(), None, SquareMeters(outside)));
        }
    }
    out
}
