//! Orchestrator: load, validate, then execute due steps.
//!
//! Every operation reloads definitions and re-reads the repository, so
//! calls are independent and reentrant; nothing is cached between them.

use tracing::{info, instrument, warn};

use crate::core::hash::{ContentHasher, Sha256Hasher};
use crate::core::report::{ErrorCode, KEY_ORDER, KeyCode, Violations};
use crate::core::selector::{due_steps, find_step};
use crate::core::summary::summarize;
use crate::core::types::{CandidateStep, IgnoreSettings, StepRecord, StepStatus, StepSummary};
use crate::core::validate::{ValidationRequest, is_recorded_complete, validate_steps};
use crate::error::SeedError;
use crate::execute::execute_step;
use crate::io::repository::SeedRepository;
use crate::io::source::DefinitionSource;
use crate::load::load_candidates;
use crate::registry::ItemRegistry;

/// Seeds data from ordered step definitions, exactly once per step.
pub struct SeedRunner<S, R, H = Sha256Hasher> {
    source: S,
    repository: R,
    registry: ItemRegistry,
    hasher: H,
}

impl<S, R> SeedRunner<S, R, Sha256Hasher>
where
    S: DefinitionSource,
    R: SeedRepository,
{
    pub fn new(source: S, repository: R, registry: ItemRegistry) -> Self {
        Self::with_hasher(source, repository, registry, Sha256Hasher)
    }
}

impl<S, R, H> SeedRunner<S, R, H>
where
    S: DefinitionSource,
    R: SeedRepository,
    H: ContentHasher,
{
    pub fn with_hasher(source: S, repository: R, registry: ItemRegistry, hasher: H) -> Self {
        Self {
            source,
            repository,
            registry,
            hasher,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Register item types after construction.
    pub fn registry_mut(&mut self) -> &mut ItemRegistry {
        &mut self.registry
    }

    /// Execute every step not yet recorded complete, in ascending order.
    ///
    /// Nothing runs unless loading and full, unskippable validation succeed.
    /// Returns the steps executed by this call.
    #[instrument(skip_all)]
    pub fn run(&mut self) -> Result<Vec<StepSummary>, SeedError> {
        let candidates = self.load()?;
        let records = self.records()?;
        self.check(&candidates, &records, IgnoreSettings::none(), None)?;

        let due = due_steps(&candidates, &records);
        let mut executed = Vec::with_capacity(due.len());
        for step in due {
            let record = execute_step(step, &mut self.registry, &mut self.repository)?;
            executed.push(completed(record));
        }
        info!(executed = executed.len(), "seed run finished");
        Ok(executed)
    }

    /// Merged view of definitions and recorded state, sorted by order.
    #[instrument(skip_all)]
    pub fn step_summaries(&self) -> Result<Vec<StepSummary>, SeedError> {
        let candidates = self.load()?;
        let records = self.records()?;
        Ok(summarize(&candidates, &records))
    }

    /// Validate every loaded step without executing anything.
    #[instrument(skip(self))]
    pub fn validate_steps(&self, ignore: IgnoreSettings) -> Result<(), SeedError> {
        let candidates = self.load()?;
        let records = self.records()?;
        self.check(&candidates, &records, ignore, None)
    }

    /// Validate with failures restricted to findings that involve `order`.
    #[instrument(skip(self))]
    pub fn validate_step(&self, order: i64, ignore: IgnoreSettings) -> Result<(), SeedError> {
        let candidates = self.load()?;
        require_step(&candidates, order)?;
        let records = self.records()?;
        self.check(&candidates, &records, ignore, Some(order))
    }

    /// Execute the single step `order` after scoped validation.
    #[instrument(skip(self))]
    pub fn run_step(
        &mut self,
        order: i64,
        ignore: IgnoreSettings,
    ) -> Result<StepSummary, SeedError> {
        let candidates = self.load()?;
        let step = require_step(&candidates, order)?;
        let records = self.records()?;
        if is_recorded_complete(&records, order) {
            return Err(reject(ErrorCode::AlreadyRun, order));
        }
        self.check(&candidates, &records, ignore, Some(order))?;

        let record = execute_step(step, &mut self.registry, &mut self.repository)?;
        Ok(completed(record))
    }

    /// Loaded steps not yet recorded complete, in ascending order.
    ///
    /// Does not validate; use it to preview what [`SeedRunner::run`] would do.
    pub fn pending_steps(&self) -> Result<Vec<CandidateStep>, SeedError> {
        let candidates = self.load()?;
        let records = self.records()?;
        Ok(due_steps(&candidates, &records).into_iter().cloned().collect())
    }

    fn load(&self) -> Result<Vec<CandidateStep>, SeedError> {
        load_candidates(&self.source, &self.registry, &self.hasher)
    }

    fn records(&self) -> Result<Vec<StepRecord>, SeedError> {
        Ok(self.repository.list_steps()?)
    }

    fn check(
        &self,
        candidates: &[CandidateStep],
        records: &[StepRecord],
        ignore: IgnoreSettings,
        scope: Option<i64>,
    ) -> Result<(), SeedError> {
        let violations = validate_steps(&ValidationRequest {
            candidates,
            records,
            handlers: &self.registry,
            ignore,
            scope,
        });
        if !violations.is_empty() {
            warn!(?scope, %violations, "validation rejected");
            return Err(SeedError::Rejected(violations));
        }
        Ok(())
    }
}

fn require_step(candidates: &[CandidateStep], order: i64) -> Result<&CandidateStep, SeedError> {
    find_step(candidates, order).ok_or_else(|| reject(ErrorCode::NotFound, order))
}

fn reject(code: ErrorCode, order: i64) -> SeedError {
    SeedError::Rejected(Violations::from(KeyCode::with_list(
        KEY_ORDER,
        code,
        [order.to_string()],
    )))
}

fn completed(record: StepRecord) -> StepSummary {
    StepSummary {
        order: record.order,
        name: record.name,
        status: StepStatus::Complete,
    }
}
