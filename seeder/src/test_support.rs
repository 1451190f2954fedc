//! Test-only helpers: fixture item models, recording handlers, definition
//! sets and temporary seed directories.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tempfile::TempDir;

use crate::core::hash::ContentHasher;
use crate::core::types::{CandidateStep, RecordStatus, StepDefinition, StepRecord};
use crate::io::repository::{JsonFileRepository, MemoryRepository};
use crate::io::source::{DirectorySource, RawDefinition};
use crate::load::load_definitions;
use crate::registry::ItemRegistry;
use crate::runner::SeedRunner;

pub const STEP_ONE: &str = "StepOne";
pub const STEP_TWO: &str = "StepTwo";
pub const ENUM_PROP: &str = "EnumProp";
/// Registered without a handler.
pub const UNMAPPED: &str = "Unmapped";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepOneModel {
    pub number: i32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepTwoModel {
    pub price: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExampleEnum {
    Value1,
    Value2,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumPropModel {
    pub number: ExampleEnum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnmappedModel {
    pub id: i64,
}

/// Items received by the fixture handlers, in call order.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    step_one: Rc<RefCell<Vec<StepOneModel>>>,
    step_two: Rc<RefCell<Vec<StepTwoModel>>>,
    enum_props: Rc<RefCell<Vec<EnumPropModel>>>,
}

impl Recorded {
    pub fn step_one(&self) -> Vec<StepOneModel> {
        self.step_one.borrow().clone()
    }

    pub fn step_two(&self) -> Vec<StepTwoModel> {
        self.step_two.borrow().clone()
    }

    pub fn enum_props(&self) -> Vec<EnumPropModel> {
        self.enum_props.borrow().clone()
    }

    pub fn total(&self) -> usize {
        self.step_one.borrow().len()
            + self.step_two.borrow().len()
            + self.enum_props.borrow().len()
    }
}

/// A registry wired to recording handlers, plus the recordings.
pub struct Fixture {
    pub registry: ItemRegistry,
    pub seen: Recorded,
}

/// Registry with `StepOne`, `StepTwo` and `EnumProp` handled, and
/// `Unmapped` resolvable but without a handler.
///
/// The `StepOne` handler rejects negative numbers.
pub fn fixture_registry() -> Fixture {
    let seen = Recorded::default();
    let mut registry = ItemRegistry::new();

    let sink = Rc::clone(&seen.step_one);
    registry.register::<StepOneModel, _>(STEP_ONE, move |model| {
        if model.number < 0 {
            bail!("number must not be negative, got {}", model.number);
        }
        sink.borrow_mut().push(model);
        Ok(())
    });
    let sink = Rc::clone(&seen.step_two);
    registry.register::<StepTwoModel, _>(STEP_TWO, move |model| {
        sink.borrow_mut().push(model);
        Ok(())
    });
    let sink = Rc::clone(&seen.enum_props);
    registry.register::<EnumPropModel, _>(ENUM_PROP, move |model| {
        sink.borrow_mut().push(model);
        Ok(())
    });
    registry.register_type::<UnmappedModel>(UNMAPPED);

    Fixture { registry, seen }
}

static ORDER_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"order"\s*:\s*(-?\d+)"#).expect("order pattern is valid")
});

/// Hasher whose output is the blob's declared order, or `"0"` without one.
///
/// Lets tests predict stored hashes without computing SHA-256.
pub fn order_hasher(content: &str) -> String {
    ORDER_FIELD
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| "0".to_string(), |order| order.as_str().to_string())
}

/// Pretty-printed definition named `step {order}`; `items` is raw JSON.
pub fn step_json(order: i64, item_type: &str, items: &str) -> String {
    format!(
        "{{\n  \"order\": {order},\n  \"name\": \"step {order}\",\n  \"itemType\": \"{item_type}\",\n  \"items\": {items}\n}}\n"
    )
}

/// A candidate without items whose type resolves under `item_type`.
pub fn candidate(order: i64, item_type: &str, hash: &str) -> CandidateStep {
    let handle = ItemRegistry::new().register_type::<Value>(item_type);
    CandidateStep {
        definition: StepDefinition {
            order,
            name: format!("step {order}"),
            item_type: item_type.to_string(),
            items: Vec::new(),
        },
        source: format!("{order:03}.json"),
        resolved_type: Some(handle),
        content_hash: hash.to_string(),
    }
}

/// A candidate loaded through `registry` from [`step_json`], hashed with
/// [`order_hasher`].
pub fn loaded_step(
    registry: &ItemRegistry,
    order: i64,
    item_type: &str,
    items: &str,
) -> CandidateStep {
    let blob = RawDefinition::new(
        format!("{order:03}.json"),
        step_json(order, item_type, items),
    );
    let mut steps =
        load_definitions(&[blob], registry, &order_hasher).expect("fixture step loads");
    steps.remove(0)
}

pub fn complete_record(order: i64, hash: &str) -> StepRecord {
    StepRecord {
        order,
        name: format!("step {order}"),
        status: RecordStatus::Complete,
        validation_hash: hash.to_string(),
    }
}

pub const PASS_STEP_ONE_ITEMS: &str = r#"[
    { "number": 1, "text": "one" },
    { "number": 2, "text": "two" }
  ]"#;

pub const PASS_STEP_TWO_ITEMS: &str = r#"[
    { "price": 1.11, "date": "2024-01-01" },
    { "price": 2.22, "date": "2024-02-02" }
  ]"#;

/// Named definition sets covering the loader and validator failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureSet {
    /// Step 1 (`StepOne`) and step 2 (`StepTwo`), both valid.
    Pass,
    BadJson,
    /// `{}`: valid JSON missing every required field.
    EmptyJson,
    EmptyFile,
    BadType,
    DuplicateOrder,
    NegativeOrder,
    UnmappedType,
    EnumType,
    /// Step 1 valid, step 2 names an unknown type.
    SecondIsInvalidType,
}

impl FixtureSet {
    /// File name and content of every blob in the set.
    pub fn files(self) -> Vec<(&'static str, String)> {
        match self {
            FixtureSet::Pass => vec![
                ("001.json", step_json(1, STEP_ONE, PASS_STEP_ONE_ITEMS)),
                ("002.json", step_json(2, STEP_TWO, PASS_STEP_TWO_ITEMS)),
            ],
            FixtureSet::BadJson => vec![("001.json", "{ \"order\": 1, \"name\": ".to_string())],
            FixtureSet::EmptyJson => vec![("001.json", "{}".to_string())],
            FixtureSet::EmptyFile => vec![("001.json", String::new())],
            FixtureSet::BadType => vec![("001.json", step_json(1, "DoesNotExist", "[]"))],
            FixtureSet::DuplicateOrder => vec![
                ("001.json", step_json(1, STEP_ONE, PASS_STEP_ONE_ITEMS)),
                ("002.json", step_json(1, STEP_TWO, PASS_STEP_TWO_ITEMS)),
            ],
            FixtureSet::NegativeOrder => {
                vec![("001.json", step_json(-1, STEP_ONE, PASS_STEP_ONE_ITEMS))]
            }
            FixtureSet::UnmappedType => {
                vec![("001.json", step_json(1, UNMAPPED, r#"[{ "id": 1 }]"#))]
            }
            FixtureSet::EnumType => vec![(
                "001.json",
                step_json(
                    1,
                    ENUM_PROP,
                    r#"[{ "number": "value1" }, { "number": "value2" }]"#,
                ),
            )],
            FixtureSet::SecondIsInvalidType => vec![
                ("001.json", step_json(1, STEP_ONE, PASS_STEP_ONE_ITEMS)),
                ("002.json", step_json(2, "DoesNotExist", "[]")),
            ],
        }
    }
}

/// A temporary project holding a `seed/` definitions directory and its state file.
pub struct SeedDir {
    temp: TempDir,
}

impl SeedDir {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let dir = Self { temp };
        fs::create_dir_all(dir.definitions_dir())
            .with_context(|| format!("create {}", dir.definitions_dir().display()))?;
        Ok(dir)
    }

    pub fn with_set(set: FixtureSet) -> Result<Self> {
        let dir = Self::new()?;
        for (name, content) in set.files() {
            dir.write(name, &content)?;
        }
        Ok(dir)
    }

    pub fn definitions_dir(&self) -> PathBuf {
        self.temp.path().join("seed")
    }

    pub fn state_path(&self) -> PathBuf {
        self.definitions_dir().join(".state").join("steps.json")
    }

    /// Write (or overwrite) a definition file.
    pub fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.definitions_dir().join(name);
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))
    }

    /// Write raw bytes, for content that is not valid UTF-8 text.
    pub fn write_bytes(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.definitions_dir().join(name);
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.definitions_dir().join(name);
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }

    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(self.definitions_dir())
    }

    pub fn repository(&self) -> JsonFileRepository {
        JsonFileRepository::new(self.state_path())
    }
}

/// Runner over `dir` with an in-memory repository seeded with `records`.
pub fn memory_runner<H: ContentHasher>(
    dir: &SeedDir,
    records: Vec<StepRecord>,
    hasher: H,
) -> (SeedRunner<DirectorySource, MemoryRepository, H>, Recorded) {
    let Fixture { registry, seen } = fixture_registry();
    let runner = SeedRunner::with_hasher(
        dir.source(),
        MemoryRepository::with_records(records),
        registry,
        hasher,
    );
    (runner, seen)
}
