//! Runs units in dependency order on a worker pool.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use kbforge_core::{
    Completion, LanguageOrder, Theme, ThemeFamily, ThemeRegistry, read_header,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, info_span, warn};

use crate::context::ExtractionContext;
use crate::error::{ConfigurationError, PipelineError, Result};
use crate::extractor::{Extractor, all_inputs};
use crate::graph::{Plan, Task, UnitGraph};
use crate::report::{RunReport, SkippedUnit, UnitFailure, UnitRun, UnitState, millis};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where themes are written.
    pub output_folder: PathBuf,
    /// Where cached inputs of an earlier run are looked up first.
    pub cache_folder: Option<PathBuf>,
    pub languages: LanguageOrder,
    pub threads: usize,
    /// Written at the top of every theme file.
    pub header: String,
    /// Mark complete theme files already on disk as available at start-up.
    pub reuse: bool,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            cache_folder: None,
            languages: LanguageOrder::default(),
            threads: 4,
            header: "Produced by kbforge".to_string(),
            reuse: true,
        }
    }

    #[must_use]
    pub fn with_languages(mut self, languages: LanguageOrder) -> Self {
        self.languages = languages;
        self
    }

    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    #[must_use]
    pub fn with_cache_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub const fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }
}

#[derive(Default)]
struct TaskOutcome {
    runs: Vec<UnitRun>,
    failures: Vec<UnitFailure>,
    skipped: Vec<SkippedUnit>,
}

/// Owns the theme registry and the unit graph of one pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    graph: UnitGraph,
    registry: ThemeRegistry,
    pool: ThreadPool,
}

impl Pipeline {
    /// Builds the unit graph and registers every theme. Cached inputs found
    /// complete in the cache folder are always made available for reading.
    /// With [`PipelineConfig::reuse`] set, so are complete theme files already
    /// in the output folder.
    pub fn new(config: PipelineConfig, units: Vec<Arc<dyn Extractor>>) -> Result<Self> {
        let graph = UnitGraph::new(units)?;
        let registry = ThemeRegistry::new();
        for theme in graph.themes() {
            registry.register(theme);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|i| format!("kbforge-worker-{i}"))
            .build()?;
        std::fs::create_dir_all(&config.output_folder)
            .map_err(|e| ConfigurationError::Theme(e.into()))?;

        let pipeline = Self {
            config,
            graph,
            registry,
            pool,
        };
        info!(
            "Pipeline with {} units over {} themes, languages {}",
            pipeline.graph.tasks().len(),
            pipeline.graph.themes().count(),
            pipeline.config.languages
        );
        pipeline.assign_cached_inputs();
        if pipeline.config.reuse {
            pipeline.reuse_existing();
        }
        Ok(pipeline)
    }

    #[must_use]
    pub const fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn graph(&self) -> &UnitGraph {
        &self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn folders_for(&self, theme: &str) -> Vec<&Path> {
        let mut folders = Vec::with_capacity(2);
        if self.graph.is_cached_input(theme) {
            if let Some(cache) = &self.config.cache_folder {
                folders.push(cache.as_path());
            }
        }
        folders.push(self.config.output_folder.as_path());
        folders
    }

    fn is_settled(&self, theme: &str) -> bool {
        self.registry.is_available_for_reading(theme) || self.registry.was_produced(theme)
    }

    /// Assigns `theme` to `folder` if a complete file for it is there.
    fn assign_if_complete(&self, theme: &Theme, folder: &Path) -> bool {
        let name = theme.name();
        let file = theme.file_in(folder);
        if !file.is_file() {
            return false;
        }
        match read_header(&file) {
            Ok(header) if header.complete => match self.registry.assign_to_folder(name, folder) {
                Ok(()) => {
                    info!("Reusing {name} from {}", file.display());
                    true
                }
                Err(e) => {
                    warn!("Cannot reuse {name}: {e}");
                    false
                }
            },
            Ok(_) => {
                info!("Ignoring incomplete {}", file.display());
                false
            }
            Err(e) => {
                warn!("Cannot read header of {}: {e}", file.display());
                false
            }
        }
    }

    /// Marks cached inputs with a complete file in the cache folder as
    /// available, whatever [`PipelineConfig::reuse`] says. Returns how many
    /// themes were assigned.
    pub fn assign_cached_inputs(&self) -> usize {
        let Some(cache) = &self.config.cache_folder else {
            return 0;
        };
        self.graph
            .themes()
            .filter(|theme| self.graph.is_cached_input(theme.name()))
            .filter(|theme| !self.is_settled(theme.name()))
            .filter(|theme| self.assign_if_complete(theme, cache))
            .count()
    }

    /// Marks complete theme files from earlier runs as available. Cached
    /// inputs are looked up in the cache folder first. Returns how many
    /// themes were reused.
    pub fn reuse_existing(&self) -> usize {
        let mut reused = 0;
        for theme in self.graph.themes() {
            if self.is_settled(theme.name()) {
                continue;
            }
            if self
                .folders_for(theme.name())
                .into_iter()
                .any(|folder| self.assign_if_complete(theme, folder))
            {
                reused += 1;
            }
        }
        reused
    }

    fn regenerable(&self, themes: &[String]) -> BTreeSet<String> {
        themes
            .iter()
            .filter(|theme| {
                if self.registry.was_produced(theme) {
                    warn!("{theme} was already produced in this run, not regenerating it");
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }

    /// Resolves the units needed for `targets` without running anything.
    pub fn plan(
        &self,
        targets: &[String],
        regenerate: &[String],
    ) -> std::result::Result<Plan, ConfigurationError> {
        let regenerate = self.regenerable(regenerate);
        self.graph.resolve(targets, &regenerate, |theme| {
            self.registry.is_available_for_reading(theme)
        })
    }

    /// Produces `targets` and everything they depend on that is not yet
    /// available.
    pub fn materialize(&self, targets: &[String]) -> Result<RunReport> {
        self.execute(targets, &[])
    }

    /// Produces `themes` again even if an earlier run left them behind.
    pub fn regenerate(&self, themes: &[String]) -> Result<RunReport> {
        self.execute(&[], themes)
    }

    /// Produces every member of a multilingual family, one per configured
    /// language.
    pub fn materialize_family(&self, family: &ThemeFamily) -> Result<RunReport> {
        let targets: Vec<String> = family
            .in_languages(&self.config.languages)
            .iter()
            .map(|theme| theme.name().to_string())
            .collect();
        self.materialize(&targets)
    }

    /// Produces every output of every unit.
    pub fn run_all(&self) -> Result<RunReport> {
        self.materialize(&self.graph.outputs())
    }

    /// Resolves, then runs the plan wave by wave. Units of one wave run in
    /// parallel. A failed unit only stops the units depending on it.
    pub fn execute(&self, targets: &[String], regenerate: &[String]) -> Result<RunReport> {
        let started = Instant::now();
        let plan = self.plan(targets, regenerate)?;
        for theme in &plan.regenerate {
            self.registry
                .forget(theme)
                .map_err(ConfigurationError::from)?;
        }
        for theme in &plan.cache_hits {
            debug!("Cache hit: {theme}");
        }

        let mut report = RunReport {
            cache_hits: plan.cache_hits.clone(),
            ..RunReport::default()
        };
        if plan.is_empty() {
            info!("Nothing to do, all requested themes are available");
        }

        for (i, wave) in plan.waves.iter().enumerate() {
            info!("Wave {}/{}: {}", i + 1, plan.waves.len(), wave.join(", "));
            let outcomes: Vec<TaskOutcome> = self.pool.install(|| {
                wave.par_iter()
                    .filter_map(|name| self.graph.task(name))
                    .map(|task| self.run_task(task))
                    .collect()
            });
            for outcome in outcomes {
                report.executed.extend(outcome.runs);
                report.failed.extend(outcome.failures);
                report.skipped.extend(outcome.skipped);
            }
            self.evict_caches(plan.waves.get(i + 1..).unwrap_or_default());
        }

        self.warn_unconsumed(&plan, targets);
        report.set_elapsed(started.elapsed());
        info!(
            "Run finished: {} executed, {} failed, {} skipped, {} cache hits in {} ms",
            report.executed.len(),
            report.failed.len(),
            report.skipped.len(),
            report.cache_hits.len(),
            report.elapsed_ms
        );
        if report.failed.is_empty() {
            Ok(report)
        } else {
            Err(PipelineError::UnitsFailed(Box::new(report)))
        }
    }

    /// Runs a unit and then its follow-ups, one queued task at a time.
    fn run_task(&self, task: &Task) -> TaskOutcome {
        let mut outcome = TaskOutcome::default();
        if let Some(missing) = task
            .inputs()
            .iter()
            .find(|theme| !self.registry.is_available_for_reading(theme))
        {
            warn!("Skipping {}: input {missing} is not available", task.name());
            outcome.skipped.extend(task.members().iter().map(|unit| SkippedUnit {
                unit: unit.clone(),
                reason: format!("input {missing} is not available"),
            }));
            return outcome;
        }

        let mut queue: VecDeque<(Arc<dyn Extractor>, Option<String>)> =
            VecDeque::from([(Arc::clone(task.unit()), None)]);
        while let Some((unit, parent)) = queue.pop_front() {
            match self.run_unit(unit.as_ref(), parent) {
                Ok(run) => {
                    let follow_ups = unit.follow_up();
                    if !follow_ups.is_empty() {
                        debug!(
                            "{} -> {}: {} follow-ups",
                            run.unit,
                            UnitState::FollowupsDispatched,
                            follow_ups.len()
                        );
                    }
                    for follow_up in follow_ups {
                        queue.push_back((follow_up, Some(run.unit.clone())));
                    }
                    debug!("{} -> {}", run.unit, UnitState::Done);
                    outcome.runs.push(run);
                }
                Err(failure) => {
                    let reason = format!("{} failed", failure.unit);
                    outcome.skipped.extend(descendants(unit.as_ref()).into_iter().map(
                        |name| SkippedUnit {
                            unit: name,
                            reason: reason.clone(),
                        },
                    ));
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }

    /// Drives one unit through its states. Outputs are always closed, with
    /// an incomplete marker if the unit failed.
    fn run_unit(
        &self,
        unit: &dyn Extractor,
        parent: Option<String>,
    ) -> std::result::Result<UnitRun, UnitFailure> {
        let name = unit.name();
        let span = info_span!("unit", name = %name);
        let _guard = span.enter();
        let started = Instant::now();
        let mut state = UnitState::Pending;
        let fail = |state: UnitState, message: String| {
            error!("{name} failed while {state}: {message}");
            UnitFailure {
                unit: name.clone(),
                state,
                message,
            }
        };
        info!("Starting {name}");

        let inputs: Vec<String> = all_inputs(unit)
            .iter()
            .map(|theme| theme.name().to_string())
            .collect();
        if let Some(missing) = inputs
            .iter()
            .find(|theme| !self.registry.is_available_for_reading(theme))
        {
            return Err(fail(state, format!("input {missing} is not available")));
        }
        advance(&name, &mut state, UnitState::InputsResolved);
        for theme in unit.input_cached() {
            if let Err(e) = self.registry.fact_store(theme.name()) {
                return Err(fail(state, format!("cannot load {}: {e}", theme.name())));
            }
        }

        let outputs: Vec<String> = unit
            .output()
            .iter()
            .map(|theme| theme.name().to_string())
            .collect();
        advance(&name, &mut state, UnitState::OutputOpen);
        let mut opened: Vec<&str> = Vec::with_capacity(outputs.len());
        for theme in &outputs {
            match self
                .registry
                .open_for_writing(theme, &self.config.output_folder, &self.config.header)
            {
                Ok(()) => opened.push(theme),
                Err(e) => {
                    let message = format!("cannot open {theme}: {e}");
                    self.close_all(&opened, &Completion::Failed(message.clone()));
                    return Err(fail(state, message));
                }
            }
        }

        advance(&name, &mut state, UnitState::Extracting);
        let context = ExtractionContext::new(
            name.clone(),
            &self.registry,
            &self.config.languages,
            inputs,
            outputs.iter().cloned(),
        );
        let result = match catch_unwind(AssertUnwindSafe(|| unit.extract(&context))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };

        let completion = match &result {
            Ok(()) => Completion::Complete,
            Err(message) => Completion::Failed(message.clone()),
        };
        let closed = self.close_all(&opened, &completion);
        if let Err(message) = result {
            return Err(fail(state, message));
        }
        advance(&name, &mut state, UnitState::OutputClosed);
        let facts_written = closed.map_err(|message| fail(state, message))?;

        let elapsed = started.elapsed();
        info!("Finished {name}: {facts_written} facts in {} ms", millis(elapsed));
        Ok(UnitRun {
            unit: name.clone(),
            parent,
            facts_written,
            elapsed_ms: millis(elapsed),
        })
    }

    /// Closes every theme in `themes`, even after a failure. Returns the
    /// number of facts written or the first close error.
    fn close_all(
        &self,
        themes: &[&str],
        completion: &Completion,
    ) -> std::result::Result<usize, String> {
        let mut written = 0;
        let mut first_error = None;
        for theme in themes {
            match self.registry.close(theme, completion) {
                Ok(count) => written += count,
                Err(e) => {
                    error!("Cannot close {theme}: {e}");
                    first_error.get_or_insert_with(|| format!("cannot close {theme}: {e}"));
                }
            }
        }
        first_error.map_or(Ok(written), Err)
    }

    /// Drops cached stores no remaining unit reads from the cache.
    fn evict_caches(&self, remaining: &[Vec<String>]) {
        let keep: HashSet<&str> = remaining
            .iter()
            .flatten()
            .filter_map(|name| self.graph.task(name))
            .flat_map(|task| task.cached_inputs().iter().map(String::as_str))
            .collect();
        for theme in self.graph.themes() {
            let name = theme.name();
            if !keep.contains(name) && self.registry.is_cached(name) {
                debug!("Releasing cached store of {name}");
                self.registry.kill_cache(name);
            }
        }
    }

    fn warn_unconsumed(&self, plan: &Plan, targets: &[String]) {
        for unit in plan.units() {
            let Some(task) = self.graph.task(unit) else {
                continue;
            };
            for theme in task.outputs() {
                let internal = self
                    .registry
                    .theme(theme)
                    .is_some_and(|theme| theme.is_internal());
                if internal
                    && self.registry.was_produced(theme)
                    && self.graph.consumers_of(theme).is_empty()
                    && !targets.contains(theme)
                {
                    warn!("Nobody consumed {theme}");
                }
            }
        }
    }
}

fn advance(unit: &str, state: &mut UnitState, next: UnitState) {
    debug!("{unit}: {state} -> {next}");
    *state = next;
}

/// Names of every follow-up below `unit`, breadth first.
fn descendants(unit: &dyn Extractor) -> Vec<String> {
    let mut names = Vec::new();
    let mut queue: VecDeque<Arc<dyn Extractor>> = unit.follow_up().into();
    while let Some(next) = queue.pop_front() {
        names.push(next.name());
        queue.extend(next.follow_up());
    }
    names
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(
            || "unit panicked".to_string(),
            |message| format!("unit panicked: {message}"),
        )
}
