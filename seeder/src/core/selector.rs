//! Deterministic selection of due steps.

use crate::core::types::{CandidateStep, StepRecord};
use crate::core::validate::is_recorded_complete;

/// Steps not yet recorded complete, in ascending order.
///
/// Candidates sharing an order keep their load order; validation rejects
/// such sets before anything executes.
pub fn due_steps<'a>(
    candidates: &'a [CandidateStep],
    records: &[StepRecord],
) -> Vec<&'a CandidateStep> {
    let mut due: Vec<&CandidateStep> = candidates
        .iter()
        .filter(|step| !is_recorded_complete(records, step.order()))
        .collect();
    due.sort_by_key(|step| step.order());
    due
}

/// The candidate with `order`, if one was loaded.
pub fn find_step(candidates: &[CandidateStep], order: i64) -> Option<&CandidateStep> {
    candidates.iter().find(|step| step.order() == order)
}
