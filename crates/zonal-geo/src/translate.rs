//! End-to-end construction of a translation matrix from two partitions.

use zonal_core::{Partition, TranslationMatrix, ZonalResult};

use crate::overlay;
use crate::project::normalize;
use crate::sanitize::sanitize;

/// Build the source-to-target translation matrix.
///
/// Chains sanitize -> normalize -> overlay -> matrix build. Topological
/// defects (isolated sources, self-overlapping targets, gaps) are recovered
/// and recorded on the matrix; only structural problems (missing CRS,
/// non-polygonal geometry, zero-area zones) abort.
///
/// Callers typically build one matrix per partition pair and apply it to
/// many quantity tables; cache the matrix, never the fragments.
///
/// With `verbose`, the collected warnings are also emitted through
/// `tracing` at warn level.
pub fn build_translation_matrix(
    source: &Partition,
    target: &Partition,
    verbose: bool,
) -> ZonalResult<TranslationMatrix> {
    let source = sanitize(source)?;
    let target = sanitize(target)?;

    let source = normalize(&source)?;
    let target = normalize(&target)?;

    let fragments = overlay::fragments(&source, &target);

    let matrix = TranslationMatrix::from_fragments(
        source.name(),
        target.name(),
        &source.areas(),
        &target.labels(),
        &fragments,
    )?;

    if verbose {
        for issue in &matrix.diagnostics().issues {
            tracing::warn!("{issue}");
        }
    }

    Ok(matrix)
}
