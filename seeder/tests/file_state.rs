//! Persistence across runner instances with the JSON state file.

use seeder::SeedRunner;
use seeder::core::report::{ErrorCode, KEY_VALIDATION_HASH};
use seeder::core::types::{IgnoreSettings, StepStatus};
use seeder::io::repository::SeedRepository;
use seeder::test_support::{
    FixtureSet, PASS_STEP_ONE_ITEMS, STEP_ONE, SeedDir, fixture_registry, step_json,
};

fn statuses(dir: &SeedDir) -> Vec<StepStatus> {
    let runner = SeedRunner::new(dir.source(), dir.repository(), fixture_registry().registry);
    runner
        .step_summaries()
        .expect("summaries")
        .iter()
        .map(|summary| summary.status)
        .collect()
}

#[test]
fn completed_steps_survive_a_fresh_runner() {
    let dir = SeedDir::with_set(FixtureSet::Pass).expect("seed dir");

    let fixture = fixture_registry();
    let mut first = SeedRunner::new(dir.source(), dir.repository(), fixture.registry);
    assert_eq!(first.run().expect("first run").len(), 2);
    assert!(dir.state_path().exists());

    let fixture = fixture_registry();
    let mut second = SeedRunner::new(dir.source(), dir.repository(), fixture.registry);
    assert!(second.run().expect("second run").is_empty());
    assert_eq!(fixture.seen.total(), 0);
    assert_eq!(second.repository().list_steps().expect("records").len(), 2);
}

#[test]
fn whitespace_edits_keep_the_stored_hash_valid() {
    let dir = SeedDir::with_set(FixtureSet::Pass).expect("seed dir");
    let mut runner = SeedRunner::new(dir.source(), dir.repository(), fixture_registry().registry);
    runner.run_step(1, IgnoreSettings::none()).expect("run step 1");

    let reformatted = step_json(1, STEP_ONE, PASS_STEP_ONE_ITEMS)
        .replace("\n", "\r\n\t")
        .replace(": ", ":   ");
    dir.write("001.json", &reformatted).expect("rewrite");

    assert_eq!(statuses(&dir), vec![StepStatus::Complete, StepStatus::Pending]);
}

#[test]
fn content_edits_are_detected_as_drift() {
    let dir = SeedDir::with_set(FixtureSet::Pass).expect("seed dir");
    let mut runner = SeedRunner::new(dir.source(), dir.repository(), fixture_registry().registry);
    runner.run().expect("run");

    let edited = step_json(1, STEP_ONE, r#"[{ "number": 3, "text": "three" }]"#);
    dir.write("001.json", &edited).expect("rewrite");

    assert_eq!(
        statuses(&dir),
        vec![StepStatus::ValidationHashMismatch, StepStatus::Complete]
    );
    let err = runner
        .validate_steps(IgnoreSettings::none())
        .expect_err("drift");
    let violations = err.violations().expect("rejected");
    assert!(violations.contains(ErrorCode::Mismatch, KEY_VALIDATION_HASH));

    let ignore = IgnoreSettings {
        hash_mismatch: true,
        out_of_order: false,
    };
    runner.validate_steps(ignore).expect("drift ignored");
}

#[test]
fn removed_definition_shows_as_missing() {
    let dir = SeedDir::with_set(FixtureSet::Pass).expect("seed dir");
    let mut runner = SeedRunner::new(dir.source(), dir.repository(), fixture_registry().registry);
    runner.run().expect("run");

    dir.remove("002.json").expect("remove");

    assert_eq!(
        statuses(&dir),
        vec![StepStatus::Complete, StepStatus::MissingInFile]
    );
}
