//! Shared deterministic types for the seed core.
//!
//! These types define stable contracts between the loader, validator and
//! runner. They carry no I/O and compare by value so tests can assert on them
//! directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::TypeHandle;

/// Authored step definition, decoded from one definition blob.
///
/// Field names are matched case-insensitively by the loader, so `Order`,
/// `ORDER` and `order` all land in [`StepDefinition::order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// Unique identity and execution position of the step.
    pub order: i64,
    pub name: String,
    /// Logical item type name, resolved through the item registry.
    pub item_type: String,
    /// Raw items, decoded into the resolved type only at execution time.
    pub items: Vec<Value>,
}

/// A loaded step plus everything derived from it during discovery.
///
/// Candidates live for a single runner call and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStep {
    pub definition: StepDefinition,
    /// Identifier of the blob the step was loaded from.
    pub source: String,
    /// `None` when `item_type` does not name a registered type.
    pub resolved_type: Option<TypeHandle>,
    /// Whitespace-insensitive hash of the raw blob, captured at load time.
    pub content_hash: String,
}

impl CandidateStep {
    pub fn order(&self) -> i64 {
        self.definition.order
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn item_type(&self) -> &str {
        &self.definition.item_type
    }
}

/// Durable status of a recorded step. Only completion is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    Complete,
}

/// Repository entry for a step that finished executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub order: i64,
    pub name: String,
    pub status: RecordStatus,
    pub validation_hash: String,
}

impl StepRecord {
    /// Build the completion record for `step`, reusing its load-time hash.
    pub fn complete(step: &CandidateStep) -> Self {
        Self {
            order: step.order(),
            name: step.name().to_string(),
            status: RecordStatus::Complete,
            validation_hash: step.content_hash.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, RecordStatus::Complete)
    }
}

/// Presentation status derived by merging candidates with records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Pending,
    Complete,
    MissingInFile,
    ValidationHashMismatch,
}

impl StepStatus {
    pub fn label(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Complete => "complete",
            StepStatus::MissingInFile => "missing-in-file",
            StepStatus::ValidationHashMismatch => "hash-mismatch",
        }
    }
}

/// Caller-facing view of a step. Content hashes are never exposed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub order: i64,
    pub name: String,
    pub status: StepStatus,
}

/// Per-call switches that suppress the two skippable validation rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreSettings {
    /// Skip content-hash drift detection.
    pub hash_mismatch: bool,
    /// Skip the out-of-order execution check.
    pub out_of_order: bool,
}

impl IgnoreSettings {
    /// Run every validation rule.
    pub fn none() -> Self {
        Self::default()
    }
}
