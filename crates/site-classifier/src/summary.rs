//! Roll-ups of classifier results.

use serde::Serialize;

use crate::adaptive::AdaptiveOutcome;
use crate::mineral::{MineralCell, MineralShares};
use crate::tiered::TieredOutcome;

/// Good/bad counts of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub slot: String,
    pub good_strict: usize,
    pub bad_strict: usize,
    pub good_soft: usize,
    pub bad_soft: usize,
    pub total: usize,
}

/// Per-slot counts, in slot order.
pub fn slot_summaries(outcome: &TieredOutcome) -> Vec<SlotSummary> {
    outcome
        .slots
        .iter()
        .map(|s| {
            let total = s.flags.len();
            let good_strict = s.strict_good_count();
            let good_soft = s.soft_good_count();
            SlotSummary {
                slot: s.slot.clone(),
                good_strict,
                bad_strict: total - good_strict,
                good_soft,
                bad_soft: total - good_soft,
                total,
            }
        })
        .collect()
}

/// Mean mineral shares over the cells that passed.
///
/// `cells` and `outcome.records` must be in the same order. Returns `None`
/// when nothing passed.
pub fn good_site_composition(cells: &[MineralCell], outcome: &AdaptiveOutcome) -> Option<MineralShares> {
    let passing: Vec<&MineralShares> = cells
        .iter()
        .zip(&outcome.records)
        .filter(|(_, r)| r.pass)
        .map(|(c, _)| &c.shares)
        .collect();

    if passing.is_empty() {
        return None;
    }
    let n = passing.len() as f64;
    Some(MineralShares {
        fe_mg: passing.iter().map(|s| s.fe_mg).sum::<f64>() / n,
        al_oh: passing.iter().map(|s| s.al_oh).sum::<f64>() / n,
        h2o: passing.iter().map(|s| s.h2o).sum::<f64>() / n,
    })
}
