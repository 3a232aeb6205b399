//! Concurrency stress runner
//!
//! This module provides the `stress` subcommand. It seeds one shared
//! `RotatingSet`, lets several threads run a weighted mix of `add`, `next`,
//! `try_remove` and `elements` against it for a fixed duration, and then
//! checks that the final length equals the seeds plus net adds minus
//! removals.
//!
//! Every worker adds and removes keys from its own range only, which keeps
//! its removal count exact while all workers rotate the same set.

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use rotating_set::RotatingSet;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DEFAULT_THREADS: usize = 4;
const DEFAULT_DURATION_MS: u64 = 1_000;
const DEFAULT_INITIAL_ITEMS: usize = 16;
const DEFAULT_KEY_SPACE: usize = 64;

/// Arguments for the stress subcommand
#[derive(Args, Debug, Default)]
pub struct StressArgs {
    /// Scenario YAML file path
    #[arg(long, short = 's', default_value = "xtask/scenarios/default.yaml")]
    pub scenario: PathBuf,

    /// Override worker thread count
    #[arg(long)]
    pub threads: Option<usize>,

    /// Override run duration in milliseconds
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// Override the number of items seeded before workers start
    #[arg(long)]
    pub initial_items: Option<usize>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Scenario configuration from YAML
#[derive(Debug, Default, Deserialize)]
struct ScenarioConfig {
    name: Option<String>,
    threads: Option<usize>,
    duration_ms: Option<u64>,
    initial_items: Option<usize>,
    key_space: Option<usize>,
    mix: Option<OperationMix>,
}

/// Relative weights of each operation in a worker's schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
struct OperationMix {
    #[serde(default)]
    add: u32,
    #[serde(default)]
    next: u32,
    #[serde(default)]
    try_remove: u32,
    #[serde(default)]
    elements: u32,
}

impl Default for OperationMix {
    fn default() -> Self {
        Self {
            add: 30,
            next: 50,
            try_remove: 15,
            elements: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Operation {
    Add,
    #[default]
    Next,
    TryRemove,
    Elements,
}

impl OperationMix {
    fn total(&self) -> u64 {
        [self.add, self.next, self.try_remove, self.elements]
            .into_iter()
            .map(u64::from)
            .sum()
    }

    /// Interleaves the weighted operations into one cycle, e.g. weights
    /// (2, 3, 1, 0) become `[add, next, try_remove, add, next, next]`.
    fn schedule(&self) -> RotatingSet<Operation> {
        let weighted = [
            (Operation::Add, self.add),
            (Operation::Next, self.next),
            (Operation::TryRemove, self.try_remove),
            (Operation::Elements, self.elements),
        ];
        let rounds = weighted.iter().map(|(_, weight)| *weight).max().unwrap_or(0);

        let schedule = RotatingSet::with_partial_eq();
        for round in 0..rounds {
            schedule.add_all(
                weighted
                    .iter()
                    .filter(|(_, weight)| round < *weight)
                    .map(|(operation, _)| *operation),
            );
        }
        schedule
    }
}

/// Fully resolved run parameters
#[derive(Debug, Clone, PartialEq, Eq)]
struct StressPlan {
    name: String,
    threads: usize,
    duration: Duration,
    initial_items: usize,
    key_space: usize,
    mix: OperationMix,
}

impl StressPlan {
    /// Resolves parameters from CLI flags, environment and scenario.
    ///
    /// Priority: CLI > Environment > Scenario YAML > Default
    fn resolve(
        args: &StressArgs,
        scenario: &ScenarioConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let threads = args
            .threads
            .or_else(|| lookup("STRESS_THREADS").and_then(|v| v.parse().ok()))
            .or(scenario.threads)
            .unwrap_or(DEFAULT_THREADS);

        let duration_ms = args
            .duration_ms
            .or_else(|| lookup("STRESS_DURATION_MS").and_then(|v| v.parse().ok()))
            .or(scenario.duration_ms)
            .unwrap_or(DEFAULT_DURATION_MS);

        let initial_items = args
            .initial_items
            .or(scenario.initial_items)
            .unwrap_or(DEFAULT_INITIAL_ITEMS);

        let key_space = scenario.key_space.unwrap_or(DEFAULT_KEY_SPACE);
        let mix = scenario.mix.unwrap_or_default();

        if threads == 0 {
            bail!("threads must be at least 1");
        }
        if key_space == 0 {
            bail!("key_space must be at least 1");
        }
        if mix.total() == 0 {
            bail!("operation mix needs at least one non-zero weight");
        }

        Ok(Self {
            name: scenario
                .name
                .clone()
                .unwrap_or_else(|| "unnamed".to_string()),
            threads,
            duration: Duration::from_millis(duration_ms),
            initial_items,
            key_space,
            mix,
        })
    }

    /// First key of the range seeded before the run; never removed.
    const fn seed_base(&self) -> usize {
        self.threads * self.key_space
    }
}

/// Per-worker operation counts
#[derive(Debug, Default, Clone, Copy, Serialize)]
struct WorkerTally {
    operations: u64,
    adds: usize,
    removed: usize,
    served: u64,
    empty_serves: u64,
    snapshots: u64,
    inconsistencies: u64,
}

impl WorkerTally {
    const fn merge(mut self, other: Self) -> Self {
        self.operations += other.operations;
        self.adds += other.adds;
        self.removed += other.removed;
        self.served += other.served;
        self.empty_serves += other.empty_serves;
        self.snapshots += other.snapshots;
        self.inconsistencies += other.inconsistencies;
        self
    }
}

/// Outcome of one stress run
#[derive(Debug, Serialize)]
struct StressReport {
    scenario: String,
    threads: usize,
    duration_ms: u64,
    #[serde(flatten)]
    totals: WorkerTally,
    expected_len: usize,
    final_len: usize,
}

impl StressReport {
    const fn is_consistent(&self) -> bool {
        self.totals.inconsistencies == 0 && self.expected_len == self.final_len
    }
}

fn run_worker(
    index: usize,
    set: &RotatingSet<usize>,
    plan: &StressPlan,
    deadline: Instant,
) -> WorkerTally {
    let schedule = plan.mix.schedule();
    let base = index * plan.key_space;
    let owned_range = base..base + plan.key_space;
    let mut owned = vec![0_usize; plan.key_space];
    let mut add_cursor = 0_usize;
    let mut remove_cursor = 0_usize;
    let mut tally = WorkerTally::default();

    while Instant::now() < deadline {
        match schedule.next() {
            Operation::Add => {
                let slot = add_cursor % plan.key_space;
                add_cursor += 1;
                set.add(base + slot);
                owned[slot] += 1;
                tally.adds += 1;
            }
            Operation::Next => {
                // Key 0 is a legal item, so the default value cannot mean "empty".
                if set.try_next().is_some() {
                    tally.served += 1;
                } else {
                    tally.empty_serves += 1;
                }
            }
            Operation::TryRemove => {
                let slot = remove_cursor.wrapping_mul(7) % plan.key_space;
                remove_cursor += 1;
                let removed = set.try_remove(&(base + slot));
                if removed != (owned[slot] > 0) {
                    tally.inconsistencies += 1;
                }
                tally.removed += owned[slot];
                owned[slot] = 0;
            }
            Operation::Elements => {
                let visible = set
                    .elements()
                    .into_iter()
                    .filter(|key| owned_range.contains(key))
                    .count();
                if visible != owned.iter().sum::<usize>() {
                    tally.inconsistencies += 1;
                }
                tally.snapshots += 1;
            }
        }
        tally.operations += 1;
    }

    debug!(worker = index, ?tally, "worker finished");
    tally
}

fn execute(plan: &StressPlan) -> Result<StressReport> {
    let set = RotatingSet::with_partial_eq();
    let seed_base = plan.seed_base();
    set.add_all(seed_base..seed_base + plan.initial_items);

    let deadline = Instant::now() + plan.duration;
    let totals = thread::scope(|scope| {
        let handles: Vec<_> = (0..plan.threads)
            .map(|index| {
                let set = &set;
                scope.spawn(move || run_worker(index, set, plan, deadline))
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .try_fold(WorkerTally::default(), |totals, (index, handle)| {
                handle
                    .join()
                    .map(|tally| totals.merge(tally))
                    .map_err(|_| anyhow!("worker {index} panicked"))
            })
    })?;

    Ok(StressReport {
        scenario: plan.name.clone(),
        threads: plan.threads,
        duration_ms: u64::try_from(plan.duration.as_millis()).unwrap_or(u64::MAX),
        totals,
        expected_len: plan.initial_items + totals.adds - totals.removed,
        final_len: set.len(),
    })
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_or_else(|_| PathBuf::from("."), PathBuf::from);

    // xtask is in project_root/xtask, so go up one level
    match manifest_dir.parent() {
        Some(parent) if manifest_dir.ends_with("xtask") => parent.to_path_buf(),
        _ => manifest_dir,
    }
}

fn resolve_scenario_path(root: &Path, scenario: &Path) -> Result<PathBuf> {
    if scenario.is_absolute() {
        return Ok(scenario.to_path_buf());
    }

    let direct = root.join(scenario);
    if direct.exists() {
        return Ok(direct);
    }

    // Try looking in scenarios directory
    let alt_path = root.join("xtask/scenarios").join(scenario);
    if alt_path.exists() {
        Ok(alt_path)
    } else {
        bail!(
            "Scenario file not found: {} or {}",
            direct.display(),
            alt_path.display()
        )
    }
}

fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    serde_yaml::from_str(&content).context("Failed to parse scenario YAML")
}

pub fn run(args: StressArgs) -> Result<()> {
    let root = project_root();
    let scenario_path = resolve_scenario_path(&root, &args.scenario)?;
    let scenario = load_scenario(&scenario_path)?;
    let plan = StressPlan::resolve(&args, &scenario, |key| env::var(key).ok())?;

    info!(
        scenario = %plan.name,
        path = %scenario_path.display(),
        threads = plan.threads,
        duration = ?plan.duration,
        initial_items = plan.initial_items,
        key_space = plan.key_space,
        mix = ?plan.mix,
        "starting stress run"
    );

    let report = execute(&plan)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        info!(
            operations = report.totals.operations,
            adds = report.totals.adds,
            removed = report.totals.removed,
            served = report.totals.served,
            empty_serves = report.totals.empty_serves,
            snapshots = report.totals.snapshots,
            final_len = report.final_len,
            "stress run finished"
        );
    }

    if !report.is_consistent() {
        bail!(
            "RotatingSet lost track of its items: expected {} items, found {} ({} inconsistent observations)",
            report.expected_len,
            report.final_len,
            report.totals.inconsistencies
        );
    }

    Ok(())
}
