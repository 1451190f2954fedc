//! Merge loaded steps with recorded state into the presentation view.

use std::collections::BTreeMap;

use crate::core::types::{CandidateStep, StepRecord, StepStatus, StepSummary};

/// One summary per distinct order across candidates and records, ascending.
///
/// A candidate with a record is `Complete` when the hashes agree and
/// `ValidationHashMismatch` otherwise. A candidate without a record is
/// `Pending`; a record without a candidate is `MissingInFile`.
pub fn summarize(candidates: &[CandidateStep], records: &[StepRecord]) -> Vec<StepSummary> {
    let recorded: BTreeMap<i64, &StepRecord> =
        records.iter().map(|record| (record.order, record)).collect();

    let mut summaries: Vec<StepSummary> = candidates
        .iter()
        .map(|step| StepSummary {
            order: step.order(),
            name: step.name().to_string(),
            status: match recorded.get(&step.order()) {
                None => StepStatus::Pending,
                Some(record) if record.validation_hash == step.content_hash => {
                    StepStatus::Complete
                }
                Some(_) => StepStatus::ValidationHashMismatch,
            },
        })
        .collect();

    summaries.extend(
        records
            .iter()
            .filter(|record| !candidates.iter().any(|step| step.order() == record.order))
            .map(|record| StepSummary {
                order: record.order,
                name: record.name.clone(),
                status: StepStatus::MissingInFile,
            }),
    );

    summaries.sort_by_key(|summary| summary.order);
    summaries
}
