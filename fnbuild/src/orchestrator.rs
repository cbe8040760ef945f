//! Builds the eligible functions of a stack on a fixed number of worker threads.
//!
//! A run moves through the phases validating, selecting, dispatching and draining before it reports the aggregated
//! result. Failed builds, including builds that panic, never take down the run or their sibling builds. They are
//! collected and reported together once every dispatched build has finished. Unless errors are shuttled, the first
//! observed failure stops the dispatch of builds that have not started yet.

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Mutex, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};

use crate::{
    build_arg::BuildArgMap,
    builder::{BuildArgs, Builder},
    select,
    stack::{FunctionSpec, Stack},
    tag::ImageTag,
};

/// Options that are passed through to every build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub no_cache: bool,
    pub squash: bool,
    pub shrinkwrap: bool,
    pub build_args: BuildArgMap,
    pub build_options: Vec<String>,
    /// Resolved once per run, before dispatch.
    pub tag: ImageTag,
}

#[derive(Debug, Clone)]
pub struct BuildPolicy {
    /// The number of builds that may run at the same time. Zero is treated as one.
    pub parallelism: usize,
    /// Keep dispatching builds after a build has failed.
    pub shuttle_errors: bool,
    pub options: BuildOptions,
}

impl BuildPolicy {
    pub fn new(parallelism: usize, shuttle_errors: bool) -> Self {
        Self {
            parallelism,
            shuttle_errors,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(self, options: BuildOptions) -> Self {
        Self { options, ..self }
    }

    fn workers(&self) -> usize {
        self.parallelism.max(1)
    }
}

#[derive(Debug)]
pub enum BuildFailure {
    /// The builder returned an error.
    Failed(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// The builder panicked.
    Aborted(String),
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildFailure::Failed(error) => write!(f, "{error}"),
            BuildFailure::Aborted(message) => write!(f, "build aborted: {message}"),
        }
    }
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub name: String,
    pub elapsed: Duration,
    pub result: Result<(), BuildFailure>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// The outcomes of a run in the order in which the builds finished.
#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<BuildOutcome>,
    /// Eligible functions that were never dispatched because an earlier build failed.
    pub not_started: usize,
}

impl Report {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_success())
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &BuildFailure)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(()) => None,
                Err(failure) => Some((outcome.name.as_str(), failure)),
            })
    }
}

#[derive(Debug)]
pub enum RunError {
    /// Functions without a language. Nothing was built.
    MissingLanguage(Vec<String>),
    /// At least one build failed.
    BuildsFailed(Report),
}

impl RunError {
    pub fn report(&self) -> Option<&Report> {
        match self {
            RunError::MissingLanguage(_) => None,
            RunError::BuildsFailed(report) => Some(report),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::MissingLanguage(names) => {
                f.write_str("no language specified for ")?;
                for (index, name) in names.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name:?}")?;
                }
                f.write_str(", please set `lang` in the stack file")
            }
            RunError::BuildsFailed(report) => {
                let failed = report.outcomes.len() - report.succeeded();
                write!(
                    f,
                    "failed to build {failed} of {total} functions:",
                    total = report.outcomes.len()
                )?;
                for (name, failure) in report.failures() {
                    write!(f, "\n  {name}: {failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RunError {}

/// Builds every function of the stack that has a language and is not marked with `skip_build`.
pub fn build<B: Builder + ?Sized>(
    stack: &Stack,
    parallelism: usize,
    shuttle_errors: bool,
    builder: &B,
) -> Result<(), RunError> {
    run(
        &stack.functions,
        &BuildPolicy::new(parallelism, shuttle_errors),
        builder,
    )
    .map(drop)
}

pub fn run<B: Builder + ?Sized>(
    functions: &BTreeMap<String, FunctionSpec>,
    policy: &BuildPolicy,
    builder: &B,
) -> Result<Report, RunError> {
    debug!("validating {count} functions...", count = functions.len());
    let missing = select::missing_language(functions);
    if !missing.is_empty() {
        return Err(RunError::MissingLanguage(
            missing.into_iter().map(str::to_owned).collect(),
        ));
    }

    debug!("selecting functions...");
    let tasks = select::select(functions);
    let skipped = functions.len() - tasks.len();
    if skipped != 0 {
        info!("skipping {skipped} functions marked with `skip_build`");
    }
    if tasks.is_empty() {
        info!("nothing to build");
        return Ok(Report::default());
    }

    let total = tasks.len();
    let workers = policy.workers();
    debug!("dispatching {total} functions to {workers} workers...");

    let queue = Mutex::new(tasks.into_iter());
    let halted = AtomicBool::new(false);
    let (outcome_tx, outcome_rx) = mpsc::channel::<BuildOutcome>();

    let outcomes = thread::scope(|scope| {
        for worker in 0..workers {
            let outcome_tx = outcome_tx.clone();
            let queue = &queue;
            let halted = &halted;
            scope.spawn(move || {
                while let Some(function) = next_task(queue, halted) {
                    let outcome = build_one(function, policy, builder);
                    if !outcome.is_success() && !policy.shuttle_errors {
                        halted.store(true, Ordering::SeqCst);
                    }
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
                debug!("worker {worker} is done");
            });
        }

        // Drop our sender so the channel closes when all workers are done.
        drop(outcome_tx);

        debug!("draining outcomes...");
        outcome_rx
            .iter()
            .inspect(|outcome| match &outcome.result {
                Ok(()) => info!(
                    "built function {name:?} in {elapsed:.1?}",
                    name = outcome.name,
                    elapsed = outcome.elapsed
                ),
                Err(failure) => error!(
                    "failed to build function {name:?}: {failure}",
                    name = outcome.name
                ),
            })
            .collect::<Vec<_>>()
    });

    let report = Report {
        not_started: total - outcomes.len(),
        outcomes,
    };

    if report.not_started != 0 {
        warn!(
            "did not start {count} builds because an earlier build failed",
            count = report.not_started
        );
    }

    if report.failures().next().is_some() {
        Err(RunError::BuildsFailed(report))
    } else {
        debug!("built all {total} functions");
        Ok(report)
    }
}

/// Takes the next function from the queue unless dispatch has been halted.
fn next_task<'a, I>(queue: &Mutex<I>, halted: &AtomicBool) -> Option<&'a FunctionSpec>
where
    I: Iterator<Item = &'a FunctionSpec>,
{
    // Workers never panic while holding the lock, builds run outside of it.
    let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
    if halted.load(Ordering::SeqCst) {
        return None;
    }
    queue.next()
}

fn build_one<B: Builder + ?Sized>(
    function: &FunctionSpec,
    policy: &BuildPolicy,
    builder: &B,
) -> BuildOutcome {
    let FunctionSpec {
        name,
        handler,
        image,
        language,
        build_args,
        build_options,
        ..
    } = function;
    let options = &policy.options;

    // Run level build arguments take precedence over the ones declared by the function.
    let build_args: BuildArgMap = build_args
        .iter()
        .chain(&options.build_args)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let build_options: Vec<String> = options
        .build_options
        .iter()
        .chain(build_options)
        .cloned()
        .collect();

    info!("building function {name:?}...");
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        builder.build(BuildArgs {
            image,
            handler,
            name,
            language,
            no_cache: options.no_cache,
            squash: options.squash,
            shrinkwrap: options.shrinkwrap,
            build_args: &build_args,
            build_options: &build_options,
            tag: &options.tag,
        })
    }));
    let elapsed = start.elapsed();

    BuildOutcome {
        name: name.clone(),
        elapsed,
        result: match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(BuildFailure::Failed(error)),
            Err(payload) => Err(BuildFailure::Aborted(panic_message(payload.as_ref()))),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "the builder panicked".to_owned()
    }
}
