//! Translation matrix construction and inspection.
//!
//! A [`TranslationMatrix`] distributes each source zone's quantity across
//! target zones in proportion to physical overlap. Rows are source labels,
//! columns are target labels, both in the order the caller declared them.
//! Every non-isolated row sums to 1 (mass conservation); isolated rows are
//! all zero. The matrix owns no geometry and may outlive the partitions it
//! was built from.
//!
//! The builder consumes [`Fragment`]s (overlap areas computed by the
//! overlay engine, or synthetic weights from the bus redistributor) and
//! rebalances rows to survive three real-world defects:
//!
//! - target zones overlapping each other (coverage sum above 1),
//! - target zones failing to cover a source (coverage sum below 1),
//! - source zones entirely outside the target cover (isolated, zero row).

use std::collections::HashMap;

use serde::Serialize;
use sprs::{CsMat, TriMat};

use crate::diagnostics::Diagnostics;
use crate::error::{ZonalError, ZonalResult};
use crate::units::SquareMeters;

/// Coverage sums above `1 + SELF_OVERLAP_TOLERANCE` trigger the
/// self-overlapping-target warning. Row normalization itself uses no
/// tolerance; rows are forced to 1 by a single division.
pub const SELF_OVERLAP_TOLERANCE: f64 = 1e-3;

/// One piece of a source zone: its overlap with a single target zone, or
/// with the exterior of the target cover (`target_label == None`).
///
/// Fragments exist only between the overlay engine and the matrix builder;
/// the matrix retains none of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub source_label: String,
    /// `None` means the fragment lies outside the target cover (OUTSIDE).
    pub target_label: Option<String>,
    pub area: SquareMeters,
}

impl Fragment {
    pub fn new(source_label: impl Into<String>, target_label: Option<String>, area: SquareMeters) -> Self {
        Self {
            source_label: source_label.into(),
            target_label,
            area,
        }
    }
}

/// Per-source fractional distribution across target zones.
#[derive(Debug, Clone)]
pub struct TranslationMatrix {
    source_name: String,
    target_name: String,
    source_labels: Vec<String>,
    target_labels: Vec<String>,
    source_index: HashMap<String, usize>,
    target_index: HashMap<String, usize>,
    /// Row-major sparse storage; absent entries read as 0.
    values: CsMat<f64>,
    isolated_sources: Vec<String>,
    diagnostics: Diagnostics,
}

impl TranslationMatrix {
    /// Build a translation matrix from overlap fragments.
    ///
    /// `sources` supplies the declared source labels (row order) with their
    /// total areas; `target_labels` supplies the declared column order.
    /// Targets never seen in a fragment become zero columns; sources with
    /// no fragments become zero rows and are flagged isolated.
    ///
    /// Hard errors: a source with non-positive area, a fragment referencing
    /// an undeclared label, or a non-isolated row whose coverage sum is
    /// exactly zero.
    pub fn from_fragments(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        sources: &[(String, SquareMeters)],
        target_labels: &[String],
        fragments: &[Fragment],
    ) -> ZonalResult<Self> {
        let source_name = source_name.into();
        let target_name = target_name.into();

        let source_index: HashMap<String, usize> = sources
            .iter()
            .enumerate()
            .map(|(i, (label, _))| (label.clone(), i))
            .collect();
        let target_index: HashMap<String, usize> = target_labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();

        let n_sources = sources.len();
        let n_targets = target_labels.len();

        // Pivot: W[s, t] plus the reserved OUTSIDE accumulator per row.
        let mut weights: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n_sources];
        let mut outside: Vec<f64> = vec![0.0; n_sources];
        let mut seen: Vec<bool> = vec![false; n_sources];

        for fragment in fragments {
            let s = *source_index.get(&fragment.source_label).ok_or_else(|| {
                ZonalError::Validation(format!(
                    "fragment references undeclared source '{}' in '{}'",
                    fragment.source_label, source_name
                ))
            })?;
            seen[s] = true;
            match &fragment.target_label {
                Some(label) => {
                    let t = *target_index.get(label).ok_or_else(|| {
                        ZonalError::Validation(format!(
                            "fragment references undeclared target '{}' in '{}'",
                            label, target_name
                        ))
                    })?;
                    *weights[s].entry(t).or_insert(0.0) += fragment.area.value();
                }
                None => outside[s] += fragment.area.value(),
            }
        }

        let mut triplets = TriMat::new((n_sources, n_targets));
        let mut isolated_sources = Vec::new();
        let mut overlapping_rows = Vec::new();
        let mut diagnostics = Diagnostics::new();

        for (s, (label, area)) in sources.iter().enumerate() {
            let area = area.value();
            if area <= 0.0 {
                return Err(ZonalError::ZeroAreaZone {
                    partition: source_name,
                    zone: label.clone(),
                });
            }

            if !seen[s] {
                isolated_sources.push(label.clone());
                continue;
            }

            let outside_ratio = outside[s] / area;
            let covered: f64 = weights[s].values().map(|w| w / area).sum();

            // A row that is all OUTSIDE (fully outside the cover, or with
            // its only weight there) is dropped as isolated and re-added as
            // a zero row so the result shape stays complete.
            if outside_ratio >= 1.0 || (covered == 0.0 && outside_ratio > 0.0) {
                isolated_sources.push(label.clone());
                continue;
            }

            if covered == 0.0 {
                return Err(ZonalError::Validation(format!(
                    "source '{}' in '{}' has zero coverage but is not isolated",
                    label, source_name
                )));
            }

            if covered > 1.0 + SELF_OVERLAP_TOLERANCE {
                overlapping_rows.push(label.clone());
            }

            // Mass conservation: rescale so the non-OUTSIDE entries sum to 1,
            // preserving the relative proportions dictated by overlap.
            for (&t, &w) in &weights[s] {
                let entry = (w / area) / covered;
                if entry != 0.0 {
                    triplets.add_triplet(s, t, entry);
                }
            }
        }

        if !isolated_sources.is_empty() {
            diagnostics.add_warning(
                "coverage",
                &format!(
                    "{} source zone(s) in '{}' have no coverage in '{}' and were zeroed: {}",
                    isolated_sources.len(),
                    source_name,
                    target_name,
                    isolated_sources.join(", ")
                ),
            );
        }
        if !overlapping_rows.is_empty() {
            diagnostics.add_warning(
                "coverage",
                &format!(
                    "target zones in '{}' overlap each other; coverage above 1 was rescaled for: {}",
                    target_name,
                    overlapping_rows.join(", ")
                ),
            );
        }

        Ok(Self {
            source_name,
            target_name,
            source_labels: sources.iter().map(|(l, _)| l.clone()).collect(),
            target_labels: target_labels.to_vec(),
            source_index,
            target_index,
            values: triplets.to_csr(),
            isolated_sources,
            diagnostics,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Row labels, in the order the source partition declared them.
    pub fn source_labels(&self) -> &[String] {
        &self.source_labels
    }

    /// Column labels, in the order the target partition declared them.
    pub fn target_labels(&self) -> &[String] {
        &self.target_labels
    }

    /// (rows, columns) = (|S|, |T|)
    pub fn shape(&self) -> (usize, usize) {
        (self.source_labels.len(), self.target_labels.len())
    }

    /// Entry by label. `None` for labels the matrix does not know; zero
    /// entries are reported as `Some(0.0)`.
    pub fn value(&self, source_label: &str, target_label: &str) -> Option<f64> {
        let s = *self.source_index.get(source_label)?;
        let t = *self.target_index.get(target_label)?;
        Some(self.entry(s, t))
    }

    /// Entry by (row, column) index; absent sparse entries read as 0.
    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.values.get(row, col).copied().unwrap_or(0.0)
    }

    /// Non-zero entries of one row as (column, value) pairs.
    pub fn row_entries(&self, row: usize) -> Vec<(usize, f64)> {
        self.values
            .outer_view(row)
            .map(|v| v.iter().map(|(t, x)| (t, *x)).collect())
            .unwrap_or_default()
    }

    /// Sum of one row; 1 for non-isolated rows, 0 for isolated ones.
    pub fn row_sum(&self, source_label: &str) -> Option<f64> {
        let s = *self.source_index.get(source_label)?;
        Some(self.row_entries(s).iter().map(|(_, v)| v).sum())
    }

    /// True if the row carries any weight at all.
    pub fn row_has_weight(&self, source_label: &str) -> bool {
        self.source_index
            .get(source_label)
            .map(|&s| !self.row_entries(s).is_empty())
            .unwrap_or(false)
    }

    /// Source zones whose fragments lay entirely outside the target cover.
    pub fn isolated_sources(&self) -> &[String] {
        &self.isolated_sources
    }

    pub fn is_isolated(&self, source_label: &str) -> bool {
        self.isolated_sources.iter().any(|l| l == source_label)
    }

    /// Warnings collected while building (isolated sources, rescaled
    /// self-overlaps). Never contains errors; those abort the build.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Structured diagnostic report at the given rounding precision.
    ///
    /// `interesting` keeps only the non-trivial reassignments: entries are
    /// rounded to `rounding` decimals, exact 1.0 entries (a zone mapping
    /// wholly into one target) are blanked, and rows/columns left with no
    /// non-zero entry are dropped.
    pub fn report(&self, rounding: u32) -> MatrixReport {
        let (n_rows, n_cols) = self.shape();
        let scale = 10f64.powi(rounding as i32);

        let mut col_has_weight = vec![false; n_cols];
        let mut rounded = vec![vec![0.0f64; n_cols]; n_rows];
        for s in 0..n_rows {
            for (t, v) in self.row_entries(s) {
                if v != 0.0 {
                    col_has_weight[t] = true;
                }
                let r = (v * scale).round() / scale;
                rounded[s][t] = if r == 1.0 { 0.0 } else { r };
            }
        }

        let empty_targets: Vec<String> = self
            .target_labels
            .iter()
            .zip(&col_has_weight)
            .filter(|(_, has)| !**has)
            .map(|(label, _)| label.clone())
            .collect();

        let keep_rows: Vec<usize> = (0..n_rows)
            .filter(|&s| rounded[s].iter().any(|&v| v != 0.0))
            .collect();
        let keep_cols: Vec<usize> = (0..n_cols)
            .filter(|&t| keep_rows.iter().any(|&s| rounded[s][t] != 0.0))
            .collect();

        let cells = keep_rows
            .iter()
            .map(|&s| {
                keep_cols
                    .iter()
                    .map(|&t| {
                        let v = rounded[s][t];
                        (v != 0.0).then_some(v)
                    })
                    .collect()
            })
            .collect();

        MatrixReport {
            isolated_sources: self.isolated_sources.clone(),
            empty_targets,
            interesting: InterestingView {
                source_labels: keep_rows
                    .iter()
                    .map(|&s| self.source_labels[s].clone())
                    .collect(),
                target_labels: keep_cols
                    .iter()
                    .map(|&t| self.target_labels[t].clone())
                    .collect(),
                cells,
            },
        }
    }
}

/// Diagnostic summary of a translation matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    /// Source zones with no coverage at all (zero rows).
    pub isolated_sources: Vec<String>,
    /// Target zones no source maps into (zero columns).
    pub empty_targets: Vec<String>,
    /// The filtered non-trivial reassignments.
    pub interesting: InterestingView,
}

/// Rounded, filtered view of the non-trivial matrix entries.
///
/// `cells[i][j]` is `None` where the rounded entry is zero (rendered "-").
#[derive(Debug, Clone, Serialize)]
pub struct InterestingView {
    pub source_labels: Vec<String>,
    pub target_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl InterestingView {
    pub fn is_empty(&self) -> bool {
        self.source_labels.is_empty()
    }
}

impl std::fmt::Display for InterestingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>16}", "")?;
        for label in &self.target_labels {
            write!(f, " {:>12}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.source_labels.iter().zip(&self.cells) {
            write!(f, "{:>16}", label)?;
            for cell in row {
                match cell {
                    Some(v) => write!(f, " {:>12}", v)?,
                    None => write!(f, " {:>12}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(pairs: &[(&str, f64)]) -> Vec<(String, SquareMeters)> {
        pairs
            .iter()
            .map(|(l, a)| (l.to_string(), SquareMeters(*a)))
            .collect()
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn frag(s: &str, t: Option<&str>, area: f64) -> Fragment {
        Fragment::new(s, t.map(|t| t.to_string()), SquareMeters(area))
    }

    #[test]
    fn test_perfect_containment() {
        let m = TranslationMatrix::from_fragments(
            "tri",
            "quad",
            &sources(&[("A1", 2.0), ("A2", 3.0)]),
            &labels(&["B1"]),
            &[frag("A1", Some("B1"), 2.0), frag("A2", Some("B1"), 3.0)],
        )
        .unwrap();

        assert_eq!(m.shape(), (2, 1));
        assert_eq!(m.value("A1", "B1"), Some(1.0));
        assert_eq!(m.value("A2", "B1"), Some(1.0));
        assert!(m.isolated_sources().is_empty());
        assert!(!m.diagnostics().has_issues());
    }

    #[test]
    fn test_double_coverage_rescales_to_half() {
        // One source, two identical targets stacked on top of it.
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 4.0)]),
            &labels(&["T1", "T2"]),
            &[frag("S", Some("T1"), 4.0), frag("S", Some("T2"), 4.0)],
        )
        .unwrap();

        assert_eq!(m.value("S", "T1"), Some(0.5));
        assert_eq!(m.value("S", "T2"), Some(0.5));
        assert_eq!(m.row_sum("S"), Some(1.0));
        assert!(m.diagnostics().has_warnings());
    }

    #[test]
    fn test_gap_rescales_up() {
        // Half the source is uncovered (but inside the cover's extent is
        // irrelevant here): covered entries scale by 1/covered.
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 4.0)]),
            &labels(&["T1", "T2"]),
            &[
                frag("S", Some("T1"), 1.0),
                frag("S", Some("T2"), 1.0),
                frag("S", None, 2.0),
            ],
        )
        .unwrap();

        assert_eq!(m.value("S", "T1"), Some(0.5));
        assert_eq!(m.value("S", "T2"), Some(0.5));
    }

    #[test]
    fn test_isolated_source_zero_row() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("IN", 1.0), ("OUT", 2.0)]),
            &labels(&["T"]),
            &[frag("IN", Some("T"), 1.0), frag("OUT", None, 2.0)],
        )
        .unwrap();

        assert_eq!(m.isolated_sources(), &["OUT".to_string()]);
        assert!(m.is_isolated("OUT"));
        assert_eq!(m.value("OUT", "T"), Some(0.0));
        assert_eq!(m.row_sum("OUT"), Some(0.0));
        assert!(m
            .diagnostics()
            .warnings()
            .any(|i| i.message.contains("OUT")));
    }

    #[test]
    fn test_source_without_fragments_is_isolated() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("A", 1.0), ("GHOST", 1.0)]),
            &labels(&["T"]),
            &[frag("A", Some("T"), 1.0)],
        )
        .unwrap();

        assert!(m.is_isolated("GHOST"));
        assert_eq!(m.row_sum("GHOST"), Some(0.0));
    }

    #[test]
    fn test_only_outside_weight_dropped_as_isolated() {
        // Row sum equals the OUTSIDE column exactly, though below 1.
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 4.0)]),
            &labels(&["T"]),
            &[frag("S", None, 1.0)],
        )
        .unwrap();

        assert!(m.is_isolated("S"));
    }

    #[test]
    fn test_zero_coverage_non_isolated_is_hard_error() {
        let err = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 4.0)]),
            &labels(&["T"]),
            &[frag("S", Some("T"), 0.0)],
        )
        .unwrap_err();

        assert!(matches!(err, ZonalError::Validation(_)));
    }

    #[test]
    fn test_zero_area_source_is_hard_error() {
        let err = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 0.0)]),
            &labels(&["T"]),
            &[frag("S", Some("T"), 1.0)],
        )
        .unwrap_err();

        assert!(matches!(err, ZonalError::ZeroAreaZone { .. }));
    }

    #[test]
    fn test_undeclared_label_is_hard_error() {
        let err = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 1.0)]),
            &labels(&["T"]),
            &[frag("S", Some("MYSTERY"), 1.0)],
        )
        .unwrap_err();

        assert!(matches!(err, ZonalError::Validation(_)));
    }

    #[test]
    fn test_entries_bounded_and_labels_ordered() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("B", 2.0), ("A", 2.0)]),
            &labels(&["Y", "X"]),
            &[
                frag("B", Some("Y"), 1.5),
                frag("B", Some("X"), 0.5),
                frag("A", Some("X"), 2.0),
            ],
        )
        .unwrap();

        // Declared order is preserved, not sorted.
        assert_eq!(m.source_labels(), &["B".to_string(), "A".to_string()]);
        assert_eq!(m.target_labels(), &["Y".to_string(), "X".to_string()]);
        for s in m.source_labels() {
            for t in m.target_labels() {
                let v = m.value(s, t).unwrap();
                assert!((0.0..=1.0).contains(&v), "entry {v} out of range");
            }
        }
        assert!((m.row_sum("B").unwrap() - 1.0).abs() < f64::EPSILON * 4.0);
    }

    #[test]
    fn test_empty_target_column() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("S", 1.0)]),
            &labels(&["T", "UNTOUCHED"]),
            &[frag("S", Some("T"), 1.0)],
        )
        .unwrap();

        let report = m.report(3);
        assert_eq!(report.empty_targets, vec!["UNTOUCHED".to_string()]);
    }

    #[test]
    fn test_report_filters_trivial_entries() {
        // A maps wholly into X (trivial), B splits across X and Y.
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("A", 1.0), ("B", 4.0)]),
            &labels(&["X", "Y"]),
            &[
                frag("A", Some("X"), 1.0),
                frag("B", Some("X"), 1.0),
                frag("B", Some("Y"), 3.0),
            ],
        )
        .unwrap();

        let report = m.report(3);
        // The all-1.0 row for A disappears; B's split remains.
        assert_eq!(report.interesting.source_labels, vec!["B".to_string()]);
        assert_eq!(
            report.interesting.target_labels,
            vec!["X".to_string(), "Y".to_string()]
        );
        assert_eq!(report.interesting.cells[0][0], Some(0.25));
        assert_eq!(report.interesting.cells[0][1], Some(0.75));

        let rendered = format!("{}", report.interesting);
        assert!(rendered.contains("B"));
        assert!(rendered.contains("0.25"));
    }

    #[test]
    fn test_report_drops_rows_rounding_to_trivial() {
        // B's split is 1.0 / ~0 at 3 decimals, so its row disappears.
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("A", 2.0), ("B", 2.0)]),
            &labels(&["X", "Y"]),
            &[
                frag("A", Some("X"), 1.0),
                frag("A", Some("Y"), 1.0),
                frag("B", Some("Y"), 2.0),
                frag("B", Some("X"), 0.0000004),
            ],
        )
        .unwrap();

        let view = m.report(3).interesting;
        assert_eq!(view.source_labels, vec!["A".to_string()]);
        assert_eq!(view.cells[0], vec![Some(0.5), Some(0.5)]);
    }

    #[test]
    fn test_report_renders_dash_for_zero() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("A", 2.0), ("B", 2.0)]),
            &labels(&["X", "Y", "Z"]),
            &[
                frag("A", Some("X"), 1.0),
                frag("A", Some("Y"), 1.0),
                frag("B", Some("Y"), 1.0),
                frag("B", Some("Z"), 1.0),
            ],
        )
        .unwrap();

        let view = m.report(3).interesting;
        // A has no weight in Z; the kept-column grid shows it as a dash.
        assert_eq!(view.cells[0], vec![Some(0.5), Some(0.5), None]);
        assert_eq!(view.cells[1], vec![None, Some(0.5), Some(0.5)]);
        let rendered = format!("{}", view);
        assert!(rendered.contains('-'));
        assert!(rendered.contains("0.5"));
    }

    #[test]
    fn test_report_serializes() {
        let m = TranslationMatrix::from_fragments(
            "src",
            "tgt",
            &sources(&[("A", 1.0)]),
            &labels(&["X"]),
            &[frag("A", Some("X"), 1.0)],
        )
        .unwrap();
        let json = serde_json::to_string(&m.report(3)).unwrap();
        assert!(json.contains("isolated_sources"));
        assert!(json.contains("empty_targets"));
    }
}
