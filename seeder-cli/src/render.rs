//! Plain-text rendering of command results.

use seeder::{StepSummary, Violations};

/// One line per step: right-aligned order, status label, name.
pub fn summaries(summaries: &[StepSummary]) -> String {
    if summaries.is_empty() {
        return "no steps\n".to_string();
    }
    let mut out = String::new();
    for summary in summaries {
        out.push_str(&format!(
            "{:>5}  {:<15}  {}\n",
            summary.order,
            summary.status.label(),
            summary.name
        ));
    }
    out
}

/// One `key:code[:detail]` entry per line.
pub fn violations(violations: &Violations) -> String {
    let mut out = String::new();
    for entry in violations {
        out.push_str(&format!("  {entry}\n"));
    }
    out
}
