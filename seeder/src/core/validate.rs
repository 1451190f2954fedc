//! Validation rules over loaded steps and recorded state.
//!
//! Each rule is an independent pure function that inspects the whole
//! candidate set and reports at most one finding: the violation plus the
//! orders that caused it. Scoping to a single step is applied afterwards, so
//! every rule computes the same thing whether a caller validates everything
//! or one step.

use std::collections::{BTreeMap, HashMap};

use crate::core::report::{
    ErrorCode, KEY_ITEM_TYPE, KEY_ORDER, KEY_VALIDATION_HASH, KeyCode, Violations,
};
use crate::core::types::{CandidateStep, IgnoreSettings, StepRecord};
use crate::registry::HandlerLookup;

/// Everything a validation pass looks at.
pub struct ValidationRequest<'a> {
    pub candidates: &'a [CandidateStep],
    pub records: &'a [StepRecord],
    pub handlers: &'a dyn HandlerLookup,
    pub ignore: IgnoreSettings,
    /// Restrict failures to findings that involve this order.
    pub scope: Option<i64>,
}

/// A rule's violation together with the orders that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Finding {
    orders: Vec<i64>,
    violation: KeyCode,
}

type Rule = fn(&ValidationRequest<'_>) -> Option<Finding>;

/// Rules that can never be ignored.
const ALWAYS: [Rule; 4] = [
    duplicate_orders,
    negative_orders,
    unresolved_types,
    unmapped_types,
];

/// Run every applicable rule and collect all in-scope violations.
///
/// Never stops at the first failure: the returned report lists everything
/// that is wrong with the requested scope.
pub fn validate_steps(request: &ValidationRequest<'_>) -> Violations {
    let mut rules: Vec<Rule> = ALWAYS.to_vec();
    if !request.ignore.hash_mismatch {
        rules.push(hash_mismatches);
    }
    if !request.ignore.out_of_order {
        rules.push(out_of_order);
    }

    rules
        .into_iter()
        .filter_map(|rule| rule(request))
        .filter(|finding| in_scope(finding, request.scope))
        .map(|finding| finding.violation)
        .collect()
}

fn in_scope(finding: &Finding, scope: Option<i64>) -> bool {
    match scope {
        None => true,
        Some(order) => finding.orders.contains(&order),
    }
}

/// Orders shared by more than one candidate.
fn duplicate_orders(request: &ValidationRequest<'_>) -> Option<Finding> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for step in request.candidates {
        *counts.entry(step.order()).or_default() += 1;
    }
    let orders: Vec<i64> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(order, _)| order)
        .collect();
    finding(orders.clone(), || {
        KeyCode::with_list(KEY_ORDER, ErrorCode::Duplicate, order_labels(&orders))
    })
}

fn negative_orders(request: &ValidationRequest<'_>) -> Option<Finding> {
    let orders: Vec<i64> = request
        .candidates
        .iter()
        .map(CandidateStep::order)
        .filter(|order| *order < 0)
        .collect();
    finding(orders.clone(), || {
        KeyCode::with_list(KEY_ORDER, ErrorCode::Invalid, order_labels(&orders))
    })
}

/// Steps whose item type name did not resolve to a registered type.
fn unresolved_types(request: &ValidationRequest<'_>) -> Option<Finding> {
    let unresolved: Vec<&CandidateStep> = request
        .candidates
        .iter()
        .filter(|step| step.resolved_type.is_none())
        .collect();
    type_finding(&unresolved, ErrorCode::NotFound)
}

/// Steps whose type resolved but has no handler.
fn unmapped_types(request: &ValidationRequest<'_>) -> Option<Finding> {
    let unmapped: Vec<&CandidateStep> = request
        .candidates
        .iter()
        .filter(|step| {
            step.resolved_type
                .as_ref()
                .is_some_and(|handle| !request.handlers.has_handler(handle))
        })
        .collect();
    type_finding(&unmapped, ErrorCode::Unmapped)
}

/// Recorded steps whose content changed since they ran.
fn hash_mismatches(request: &ValidationRequest<'_>) -> Option<Finding> {
    let recorded: HashMap<i64, &str> = request
        .records
        .iter()
        .map(|record| (record.order, record.validation_hash.as_str()))
        .collect();
    let orders: Vec<i64> = request
        .candidates
        .iter()
        .filter(|step| {
            recorded
                .get(&step.order())
                .is_some_and(|hash| *hash != step.content_hash)
        })
        .map(CandidateStep::order)
        .collect();
    finding(orders.clone(), || {
        KeyCode::with_list(
            KEY_VALIDATION_HASH,
            ErrorCode::Mismatch,
            order_labels(&orders),
        )
    })
}

/// Unexecuted steps positioned at or below the highest completed order.
fn out_of_order(request: &ValidationRequest<'_>) -> Option<Finding> {
    let max_completed = max_completed_order(request.records);
    let orders: Vec<i64> = request
        .candidates
        .iter()
        .filter(|step| !is_recorded_complete(request.records, step.order()))
        .map(CandidateStep::order)
        .filter(|order| *order <= max_completed)
        .collect();
    finding(orders.clone(), || {
        KeyCode::with_list(KEY_ORDER, ErrorCode::OutOfOrder, order_labels(&orders))
    })
}

/// Highest order recorded as complete, or 0 when nothing has run.
pub fn max_completed_order(records: &[StepRecord]) -> i64 {
    records
        .iter()
        .filter(|record| record.is_complete())
        .map(|record| record.order)
        .max()
        .unwrap_or(0)
}

pub fn is_recorded_complete(records: &[StepRecord], order: i64) -> bool {
    records
        .iter()
        .any(|record| record.order == order && record.is_complete())
}

fn finding(orders: Vec<i64>, violation: impl FnOnce() -> KeyCode) -> Option<Finding> {
    if orders.is_empty() {
        return None;
    }
    Some(Finding {
        violation: violation(),
        orders,
    })
}

fn type_finding(steps: &[&CandidateStep], code: ErrorCode) -> Option<Finding> {
    let labels: Vec<String> = steps
        .iter()
        .map(|step| format!("{}-{}", step.order(), step.item_type()))
        .collect();
    let orders = steps.iter().map(|step| step.order()).collect();
    finding(orders, || KeyCode::with_list(KEY_ITEM_TYPE, code, labels))
}

fn order_labels(orders: &[i64]) -> Vec<String> {
    orders.iter().map(ToString::to_string).collect()
}
