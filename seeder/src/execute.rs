//! Item executor: feed one step's items to its handler, then record it.

use tracing::{debug, info, instrument};

use crate::core::types::{CandidateStep, StepRecord};
use crate::error::SeedError;
use crate::io::repository::SeedRepository;
use crate::registry::{HandlerLookup, ItemFailure, ItemRegistry};

/// Decode and hand every item of `step` to its handler in file order, then
/// persist the completion record.
///
/// The first failing item aborts the step. Items before it stay applied and
/// no record is written, so the step remains due for a later run.
#[instrument(skip_all, fields(order = step.order(), item_type = %step.item_type()))]
pub fn execute_step<R>(
    step: &CandidateStep,
    registry: &mut ItemRegistry,
    repository: &mut R,
) -> Result<StepRecord, SeedError>
where
    R: SeedRepository + ?Sized,
{
    let order = step.order();
    let item_type = step.item_type();
    let handle = step
        .resolved_type
        .as_ref()
        .ok_or_else(|| SeedError::UnresolvedType {
            order,
            item_type: item_type.to_string(),
        })?;
    if !registry.has_handler(handle) {
        return Err(SeedError::MissingHandler {
            order,
            item_type: item_type.to_string(),
        });
    }

    for (index, item) in step.definition.items.iter().enumerate() {
        debug!(index, "applying item");
        registry
            .invoke(handle, item.clone())
            .map_err(|failure| match failure {
                ItemFailure::Unmapped => SeedError::MissingHandler {
                    order,
                    item_type: item_type.to_string(),
                },
                ItemFailure::Decode(source) => SeedError::ItemDecode {
                    order,
                    index,
                    item_type: item_type.to_string(),
                    source,
                },
                ItemFailure::Handler(source) => SeedError::Handler {
                    order,
                    index,
                    item_type: item_type.to_string(),
                    source,
                },
            })?;
    }

    let record = StepRecord::complete(step);
    repository.save_step(record.clone())?;
    info!(
        name = %step.name(),
        items = step.definition.items.len(),
        "step complete"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RecordStatus;
    use crate::io::repository::MemoryRepository;
    use crate::test_support::{StepOneModel, fixture_registry, loaded_step};

    #[test]
    fn applies_items_in_order_and_records_completion() {
        let mut fixture = fixture_registry();
        let mut repo = MemoryRepository::new();
        let step = loaded_step(
            &fixture.registry,
            1,
            "StepOne",
            r#"[{"number": 1, "text": "a"}, {"NUMBER": 2, "Text": "b"}]"#,
        );

        let record = execute_step(&step, &mut fixture.registry, &mut repo).expect("execute");
        assert_eq!(record.status, RecordStatus::Complete);
        assert_eq!(record.validation_hash, step.content_hash);
        assert_eq!(repo.get(1), Some(&record));
        assert_eq!(
            fixture.seen.step_one(),
            vec![
                StepOneModel {
                    number: 1,
                    text: "a".to_string()
                },
                StepOneModel {
                    number: 2,
                    text: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_step_still_completes() {
        let mut fixture = fixture_registry();
        let mut repo = MemoryRepository::new();
        let step = loaded_step(&fixture.registry, 3, "StepTwo", "[]");
        execute_step(&step, &mut fixture.registry, &mut repo).expect("execute");
        assert!(repo.get(3).is_some());
    }

    #[test]
    fn undecodable_item_aborts_without_record() {
        let mut fixture = fixture_registry();
        let mut repo = MemoryRepository::new();
        let step = loaded_step(
            &fixture.registry,
            1,
            "StepOne",
            r#"[{"number": 1, "text": "a"}, {"number": "two", "text": "b"}]"#,
        );

        let err = execute_step(&step, &mut fixture.registry, &mut repo).expect_err("decode");
        assert!(matches!(err, SeedError::ItemDecode { order: 1, index: 1, .. }));
        assert!(repo.is_empty());
        assert_eq!(fixture.seen.step_one().len(), 1);
    }

    #[test]
    fn handler_failure_aborts_without_record() {
        let mut fixture = fixture_registry();
        fixture
            .registry
            .register_handler::<StepOneModel, _>(|_| Err(anyhow::anyhow!("store offline")));
        let mut repo = MemoryRepository::new();
        let step = loaded_step(&fixture.registry, 1, "StepOne", r#"[{"number": 1, "text": "a"}]"#);

        let err = execute_step(&step, &mut fixture.registry, &mut repo).expect_err("handler");
        assert!(matches!(err, SeedError::Handler { index: 0, .. }));
        assert!(repo.is_empty());
    }

    #[test]
    fn unresolved_or_unmapped_types_are_fatal() {
        let mut fixture = fixture_registry();
        let mut repo = MemoryRepository::new();

        let unresolved = loaded_step(&fixture.registry, 1, "Nope", "[]");
        let err = execute_step(&unresolved, &mut fixture.registry, &mut repo)
            .expect_err("unresolved");
        assert!(matches!(err, SeedError::UnresolvedType { .. }));

        let unmapped = loaded_step(&fixture.registry, 2, "Unmapped", "[]");
        let err =
            execute_step(&unmapped, &mut fixture.registry, &mut repo).expect_err("unmapped");
        assert!(matches!(err, SeedError::MissingHandler { .. }));
        assert!(repo.is_empty());
    }
}
