//! Bus-level redistribution of zone demand.
//!
//! Downstream of the geographic translation, each target zone's demand has
//! to land on individual buses. The split is population-driven: every zip
//! gets a fixed share of its zone's demand, divided across the zip's buses
//! by weight; whatever a county keeps at county level spreads evenly over
//! its buses that no zip claims.
//!
//! Rather than a bespoke allocator, the split is expressed as one more
//! [`TranslationMatrix`] (rows = zones, columns = bus ids) with synthetic
//! unit areas, so the same rebalancing, diagnostics, and quantity remapping
//! apply unchanged.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use zonal_core::{Fragment, SquareMeters, TranslationMatrix, ZonalError, ZonalResult};

/// One bus with its population-weighting attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRecord {
    pub id: String,
    pub zone: String,
    /// Zip the bus draws from, if the zip-level census covers it.
    pub zip: Option<String>,
    /// County fallback for buses outside any covered zip.
    pub county: Option<String>,
    pub weight: f64,
}

/// Build the zone-to-bus translation matrix.
///
/// `zip_shares` and `county_shares` are fractions of the owning zone's
/// demand. Per zip, the share splits across the zip's buses in proportion
/// to `weight`, so no zip's buses ever receive more than its allocation.
/// Per county, the share splits evenly across the county's buses that carry
/// no zip. Rows renormalize to sum to 1; a zone with no buses comes back as
/// an isolated row with a warning, same as a disjoint source zone.
pub fn build_bus_matrix(
    zones: &[String],
    buses: &[BusRecord],
    zip_shares: &HashMap<String, f64>,
    county_shares: &HashMap<String, f64>,
) -> ZonalResult<TranslationMatrix> {
    let mut seen = HashSet::new();
    for bus in buses {
        if !seen.insert(bus.id.as_str()) {
            return Err(ZonalError::DuplicateLabel {
                partition: "buses".to_string(),
                label: bus.id.clone(),
            });
        }
        if !bus.weight.is_finite() || bus.weight < 0.0 {
            return Err(ZonalError::Validation(format!(
                "bus '{}' has invalid weight {}",
                bus.id, bus.weight
            )));
        }
    }

    // Total weight per (zone, zip), for the proportional split.
    let mut zip_totals: HashMap<(&str, &str), f64> = HashMap::new();
    // Bus count per (zone, county) among zip-less buses, for the even split.
    let mut county_counts: HashMap<(&str, &str), usize> = HashMap::new();
    for bus in buses {
        match (&bus.zip, &bus.county) {
            (Some(zip), _) => {
                *zip_totals.entry((&bus.zone, zip)).or_insert(0.0) += bus.weight;
            }
            (None, Some(county)) => {
                *county_counts.entry((&bus.zone, county)).or_insert(0) += 1;
            }
            (None, None) => {
                return Err(ZonalError::Validation(format!(
                    "bus '{}' has neither zip nor county",
                    bus.id
                )));
            }
        }
    }

    let mut fragments = Vec::with_capacity(buses.len());
    for bus in buses {
        let allocation = match (&bus.zip, &bus.county) {
            (Some(zip), _) => {
                let share = zip_shares.get(zip).copied().unwrap_or(0.0);
                let total = zip_totals[&(bus.zone.as_str(), zip.as_str())];
                if total > 0.0 {
                    share * bus.weight / total
                } else {
                    0.0
                }
            }
            (None, Some(county)) => {
                let share = county_shares.get(county).copied().unwrap_or(0.0);
                let count = county_counts[&(bus.zone.as_str(), county.as_str())];
                share / count as f64
            }
            (None, None) => unreachable!("rejected above"),
        };
        if allocation > 0.0 {
            fragments.push(Fragment::new(
                bus.zone.clone(),
                Some(bus.id.clone()),
                SquareMeters(allocation),
            ));
        }
    }

    let sources: Vec<(String, SquareMeters)> = zones
        .iter()
        .map(|z| (z.clone(), SquareMeters(1.0)))
        .collect();
    let bus_ids: Vec<String> = buses.iter().map(|b| b.id.clone()).collect();

    TranslationMatrix::from_fragments("zones", "buses", &sources, &bus_ids, &fragments)
}
