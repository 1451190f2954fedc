//! Step discovery: turn raw definition blobs into candidate steps.
//!
//! Loading never stops at the first bad blob. Every blob is examined and all
//! failures are returned together, keyed by the blob identifier.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::decode::decode;
use crate::core::hash::ContentHasher;
use crate::core::report::{ErrorCode, KeyCode, Violations, sanitize_detail};
use crate::core::types::{CandidateStep, StepDefinition};
use crate::error::SeedError;
use crate::io::source::{DefinitionSource, RawDefinition};
use crate::registry::ItemRegistry;

/// Read every blob from `source` and load it.
#[instrument(skip_all)]
pub fn load_candidates<S, H>(
    source: &S,
    registry: &ItemRegistry,
    hasher: &H,
) -> Result<Vec<CandidateStep>, SeedError>
where
    S: DefinitionSource + ?Sized,
    H: ContentHasher + ?Sized,
{
    let blobs = source.definitions()?;
    debug!(blobs = blobs.len(), "loading step definitions");
    let candidates = load_definitions(&blobs, registry, hasher)?;
    Ok(candidates)
}

/// Load already-read blobs, aggregating every per-blob failure.
pub fn load_definitions<H>(
    blobs: &[RawDefinition],
    registry: &ItemRegistry,
    hasher: &H,
) -> Result<Vec<CandidateStep>, Violations>
where
    H: ContentHasher + ?Sized,
{
    let mut candidates = Vec::with_capacity(blobs.len());
    let mut violations = Violations::new();
    for blob in blobs {
        match load_blob(blob, registry, hasher) {
            Ok(candidate) => {
                debug!(
                    id = %blob.id,
                    order = candidate.order(),
                    item_type = %candidate.item_type(),
                    resolved = candidate.resolved_type.is_some(),
                    "loaded step definition"
                );
                candidates.push(candidate);
            }
            Err(violation) => {
                debug!(id = %blob.id, code = %violation.code, "rejected step definition");
                violations.push(violation);
            }
        }
    }
    violations.into_result()?;
    Ok(candidates)
}

fn load_blob<H>(
    blob: &RawDefinition,
    registry: &ItemRegistry,
    hasher: &H,
) -> Result<CandidateStep, KeyCode>
where
    H: ContentHasher + ?Sized,
{
    if blob.content.trim().is_empty() {
        return Err(KeyCode::new(&blob.id, ErrorCode::EmptyFile));
    }

    let definition = parse_definition(&blob.content).map_err(|err| {
        KeyCode::with_text(
            &blob.id,
            ErrorCode::FailedToParse,
            sanitize_detail(&err.to_string()),
        )
    })?;
    let Some(definition) = definition else {
        return Err(KeyCode::new(&blob.id, ErrorCode::NullResult));
    };

    Ok(CandidateStep {
        resolved_type: registry.resolve_type(&definition.item_type),
        content_hash: hasher.hash(&blob.content),
        source: blob.id.clone(),
        definition,
    })
}

/// A literal `null` document decodes to `None`.
fn parse_definition(content: &str) -> Result<Option<StepDefinition>, serde_json::Error> {
    let value: Value = serde_json::from_str(content)?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_registry, order_hasher, step_json};

    fn load_one(id: &str, content: &str) -> Result<Vec<CandidateStep>, Violations> {
        let registry = fixture_registry().registry;
        load_definitions(&[RawDefinition::new(id, content)], &registry, &order_hasher)
    }

    #[test]
    fn loads_valid_definitions_with_hash_and_type() {
        let registry = fixture_registry().registry;
        let blobs = vec![
            RawDefinition::new(
                "001.json",
                step_json(1, "StepOne", r#"[{"number": 1, "text": "a"}]"#),
            ),
            RawDefinition::new("002.json", step_json(2, "StepTwo", "[]")),
        ];
        let candidates = load_definitions(&blobs, &registry, &order_hasher).expect("load");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].content_hash, "1");
        assert_eq!(candidates[1].content_hash, "2");
        assert_eq!(candidates[0].source, "001.json");
        assert_eq!(
            candidates[0].resolved_type.as_ref().map(|handle| handle.name()),
            Some("StepOne")
        );
    }

    #[test]
    fn field_names_are_case_insensitive() {
        let content = r#"{"ORDER": 4, "Name": "caps", "ItemType": "StepOne", "Items": []}"#;
        let candidates = load_one("caps.json", content).expect("load");
        assert_eq!(candidates[0].order(), 4);
        assert_eq!(candidates[0].name(), "caps");
    }

    #[test]
    fn unknown_item_type_loads_unresolved() {
        let candidates = load_one("x.json", &step_json(1, "NoSuchType", "[]")).expect("load");
        assert!(candidates[0].resolved_type.is_none());
    }

    #[test]
    fn every_bad_blob_is_reported() {
        let registry = fixture_registry().registry;
        let blobs = vec![
            RawDefinition::new("empty.json", "  \n"),
            RawDefinition::new("bad.json", "{ \"order\": "),
            RawDefinition::new("null.json", "null"),
            RawDefinition::new("good.json", step_json(1, "StepOne", "[]")),
            RawDefinition::new("shape.json", r#"{"order": "one"}"#),
        ];
        let violations =
            load_definitions(&blobs, &registry, &order_hasher).expect_err("should fail");
        assert_eq!(violations.len(), 4);
        assert!(violations.contains(ErrorCode::EmptyFile, "empty.json"));
        assert!(violations.contains(ErrorCode::FailedToParse, "bad.json"));
        assert!(violations.contains(ErrorCode::NullResult, "null.json"));
        assert!(violations.contains(ErrorCode::FailedToParse, "shape.json"));
    }

    #[test]
    fn parse_failure_detail_has_no_delimiter() {
        let violations = load_one("bad.json", "{ nope").expect_err("should fail");
        let entry = violations
            .find(ErrorCode::FailedToParse, "bad.json")
            .expect("entry");
        let detail = entry.detail.as_ref().expect("detail").to_string();
        assert!(!detail.is_empty());
        assert!(!detail.contains(':'));
    }

    #[test]
    fn missing_fields_fail_to_parse() {
        let violations =
            load_one("partial.json", r#"{"order": 1, "name": "x"}"#).expect_err("should fail");
        assert!(violations.contains(ErrorCode::FailedToParse, "partial.json"));
    }
}
