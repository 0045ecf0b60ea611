//! Runner harness: execute solver plugins against cached datasets under a
//! wall-clock timeout, optionally verifying unknown answers live through the
//! submission controller.

use crate::cache::PuzzleCache;
use crate::ledger::GuessLedger;
use crate::model::{values_equal, Part, PuzzleId};
use crate::submit::{Outcome, SubmitController};
use crate::transport::Transport;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A solver plugin: `(year, day, input) -> (answer_a, answer_b)`.
/// Implementations must be pure enough to run on a blocking worker thread.
pub trait Solver: Send + Sync {
    fn solve(&self, year: u16, day: u8, input: &str)
        -> anyhow::Result<(Option<String>, Option<String>)>;
}

impl<F> Solver for F
where
    F: Fn(u16, u8, &str) -> anyhow::Result<(Option<String>, Option<String>)> + Send + Sync,
{
    fn solve(
        &self,
        year: u16,
        day: u8,
        input: &str,
    ) -> anyhow::Result<(Option<String>, Option<String>)> {
        self(year, day, input)
    }
}

/// Name -> solver registry. Discovery (files, manifest, linkage) is the
/// embedder's concern; the harness only consumes the mapping.
#[derive(Default, Clone)]
pub struct SolverRegistry {
    solvers: HashMap<String, Arc<dyn Solver>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, solver: Arc<dyn Solver>) {
        self.solvers.insert(name.into(), solver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Solver>> {
        self.solvers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.solvers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// One account's data for one puzzle.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub user: String,
    pub year: u16,
    pub day: u8,
    pub input: String,
    pub expected_a: Option<String>,
    pub expected_b: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Wall-clock limit per solver invocation.
    pub timeout: Duration,
    /// Concurrent datasets.
    pub parallel: usize,
    /// Verify unknown answers live via the submission controller.
    pub check: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            parallel: 4,
            check: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pass,
    Fail,
    Timeout,
    Error,
    /// An answer was produced but nothing to verify it against.
    Unverified,
    /// No answer produced and none expected (e.g. a locked part).
    Skipped,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pass => "pass",
            RunStatus::Fail => "fail",
            RunStatus::Timeout => "timeout",
            RunStatus::Error => "error",
            RunStatus::Unverified => "unverified",
            RunStatus::Skipped => "skipped",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Fail | RunStatus::Timeout | RunStatus::Error)
    }
}

/// Per-dataset result row.
#[derive(Debug, Clone)]
pub struct RunRow {
    pub user: String,
    pub year: u16,
    pub day: u8,
    pub answer_a: Option<String>,
    pub answer_b: Option<String>,
    pub status_a: RunStatus,
    pub status_b: RunStatus,
    pub duration: Duration,
    /// Error or timeout detail, when there is one.
    pub message: Option<String>,
}

impl RunRow {
    pub fn is_failure(&self) -> bool {
        self.status_a.is_failure() || self.status_b.is_failure()
    }
}

pub struct Runner {
    registry: SolverRegistry,
    /// Present only when live verification (`check`) is wanted.
    controller: Option<Arc<SubmitController>>,
}

impl Runner {
    pub fn new(registry: SolverRegistry) -> Self {
        Self {
            registry,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: Arc<SubmitController>) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Run one plugin over the datasets. Results are collected in completion
    /// order internally but returned sorted by (user, year, day) for
    /// deterministic output.
    pub async fn run(
        &self,
        plugin: &str,
        datasets: Vec<Dataset>,
        cfg: &RunConfig,
    ) -> anyhow::Result<Vec<RunRow>> {
        let solver = self
            .registry
            .get(plugin)
            .with_context(|| format!("no solver registered under {:?}", plugin))?;

        let sem = Arc::new(Semaphore::new(cfg.parallel.max(1)));
        let mut join_set = JoinSet::new();
        for ds in datasets {
            let permit = sem.clone().acquire_owned().await?;
            let solver = solver.clone();
            let timeout = cfg.timeout;
            let check = cfg.check;
            let controller = self.controller.clone();
            join_set.spawn(async move {
                let _permit = permit;
                run_dataset(solver, ds, timeout, check, controller).await
            });
        }

        let mut rows = Vec::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::error!(error = %e, "solver task panicked");
                }
            }
        }
        rows.sort_by(|a, b| {
            (&a.user, a.year, a.day).cmp(&(&b.user, b.year, b.day))
        });
        Ok(rows)
    }
}

async fn run_dataset(
    solver: Arc<dyn Solver>,
    ds: Dataset,
    timeout: Duration,
    check: bool,
    controller: Option<Arc<SubmitController>>,
) -> RunRow {
    let started = Instant::now();
    let (year, day, input) = (ds.year, ds.day, ds.input.clone());
    let solved = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || solver.solve(year, day, &input)),
    )
    .await;

    let duration = started.elapsed();
    let mut row = match solved {
        // Timer won: the worker thread is abandoned and the dataset is
        // reported as a timeout, never silently skipped.
        Err(_elapsed) => RunRow {
            user: ds.user.clone(),
            year,
            day,
            answer_a: None,
            answer_b: None,
            status_a: RunStatus::Timeout,
            status_b: RunStatus::Timeout,
            duration,
            message: Some(format!("exceeded {}s wall-clock limit", timeout.as_secs())),
        },
        Ok(Err(join_err)) => error_row(&ds, duration, format!("solver panicked: {join_err}")),
        Ok(Ok(Err(e))) => error_row(&ds, duration, format!("solver error: {e:#}")),
        Ok(Ok(Ok((answer_a, answer_b)))) => RunRow {
            status_a: part_status(ds.expected_a.as_deref(), answer_a.as_deref()),
            status_b: part_status(ds.expected_b.as_deref(), answer_b.as_deref()),
            user: ds.user.clone(),
            year,
            day,
            answer_a,
            answer_b,
            duration,
            message: None,
        },
    };

    if check {
        if let Some(controller) = controller {
            verify_live(&controller, &ds, &mut row).await;
        }
    }
    row
}

fn error_row(ds: &Dataset, duration: Duration, message: String) -> RunRow {
    RunRow {
        user: ds.user.clone(),
        year: ds.year,
        day: ds.day,
        answer_a: None,
        answer_b: None,
        status_a: RunStatus::Error,
        status_b: RunStatus::Error,
        duration,
        message: Some(message),
    }
}

fn part_status(expected: Option<&str>, actual: Option<&str>) -> RunStatus {
    match (expected, actual) {
        (Some(want), Some(got)) => {
            if values_equal(want, got) {
                RunStatus::Pass
            } else {
                RunStatus::Fail
            }
        }
        (Some(_), None) => RunStatus::Fail,
        (None, Some(_)) => RunStatus::Unverified,
        (None, None) => RunStatus::Skipped,
    }
}

/// Route unverified answers through the submission controller and fold the
/// outcome back into the row.
async fn verify_live(controller: &SubmitController, ds: &Dataset, row: &mut RunRow) {
    for (part, answer, status) in [
        (Part::A, row.answer_a.clone(), &mut row.status_a),
        (Part::B, row.answer_b.clone(), &mut row.status_b),
    ] {
        if *status != RunStatus::Unverified {
            continue;
        }
        let Some(answer) = answer else { continue };
        let id = match PuzzleId::new(ds.year, ds.day, part, ds.user.clone()) {
            Ok(id) => id,
            Err(e) => {
                *status = RunStatus::Error;
                row.message = Some(e.to_string());
                continue;
            }
        };
        match controller.submit(&id, &answer).await {
            Ok(Outcome::Accepted { .. }) => *status = RunStatus::Pass,
            Ok(Outcome::AlreadySolved { answer: known }) => {
                *status = match known {
                    Some(known) if values_equal(&known, &answer) => RunStatus::Pass,
                    Some(_) => RunStatus::Fail,
                    None => RunStatus::Unverified,
                };
            }
            Ok(Outcome::Rejected { .. }) => *status = RunStatus::Fail,
            Ok(Outcome::RateLimited { wait }) => {
                row.message = Some(format!(
                    "verification rate-limited; retry in {}s",
                    wait.as_secs()
                ));
            }
            Err(e) => {
                *status = RunStatus::Error;
                row.message = Some(format!("verification failed: {e}"));
            }
        }
    }
}

/// Assemble a dataset for one account: cached input (fetched once if
/// missing) and the ledger's known answers as the expected values.
pub async fn dataset_for(
    cache: &PuzzleCache,
    ledger: &GuessLedger,
    transport: &dyn Transport,
    user: &str,
    year: u16,
    day: u8,
) -> anyhow::Result<Dataset> {
    let id_a = PuzzleId::new(year, day, Part::A, user)?;
    let input = cache.fetch_input(&id_a, transport).await?;
    let expected_a = ledger.correct_answer(&id_a)?;
    let expected_b = ledger.correct_answer(&id_a.sibling(Part::B))?;
    Ok(Dataset {
        user: user.to_string(),
        year,
        day,
        input,
        expected_a,
        expected_b,
    })
}

/// Assemble an example dataset: scraped example input and answers instead of
/// the account's real data.
pub async fn example_dataset_for(
    cache: &PuzzleCache,
    transport: &dyn Transport,
    user: &str,
    year: u16,
    day: u8,
) -> anyhow::Result<Option<Dataset>> {
    let id_a = PuzzleId::new(year, day, Part::A, user)?;
    let html = cache.fetch_prose(&id_a, transport).await?;
    let Some(example) = crate::prose::extract_examples(&html).into_iter().next() else {
        return Ok(None);
    };
    Ok(Some(Dataset {
        user: user.to_string(),
        year,
        day,
        input: example.input_data,
        expected_a: example.answer_a,
        expected_b: example.answer_b,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(user: &str) -> Dataset {
        Dataset {
            user: user.to_string(),
            year: 2020,
            day: 1,
            input: "1\n2\n3\n".to_string(),
            expected_a: Some("6".to_string()),
            expected_b: None,
        }
    }

    fn registry_with(name: &str, solver: Arc<dyn Solver>) -> SolverRegistry {
        let mut registry = SolverRegistry::new();
        registry.register(name, solver);
        registry
    }

    type Answers = anyhow::Result<(Option<String>, Option<String>)>;

    fn sum_solver() -> Arc<dyn Solver> {
        Arc::new(|_year: u16, _day: u8, input: &str| -> Answers {
            let total: i64 = crate::transforms::numbers_flat(input).iter().sum();
            Ok((Some(total.to_string()), None))
        })
    }

    #[tokio::test]
    async fn pass_fail_and_unverified_statuses() {
        let runner = Runner::new(registry_with("sum", sum_solver()));
        let mut wrong = ds("u2");
        wrong.expected_a = Some("7".to_string());
        let mut unverified = ds("u3");
        unverified.expected_a = None;

        let rows = runner
            .run("sum", vec![ds("u1"), wrong, unverified], &RunConfig::default())
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        // Sorted by user: u1, u2, u3
        assert_eq!(rows[0].status_a, RunStatus::Pass);
        assert_eq!(rows[1].status_a, RunStatus::Fail);
        assert_eq!(rows[2].status_a, RunStatus::Unverified);
        for row in &rows {
            assert_eq!(row.status_b, RunStatus::Skipped);
        }
    }

    #[tokio::test]
    async fn sleeping_solver_is_reported_as_timeout() {
        let sleeper: Arc<dyn Solver> = Arc::new(|_: u16, _: u8, _: &str| -> Answers {
            std::thread::sleep(Duration::from_secs(30));
            Ok((Some("42".to_string()), None))
        });
        let runner = Runner::new(registry_with("sleeper", sleeper));
        let cfg = RunConfig {
            timeout: Duration::from_millis(50),
            ..RunConfig::default()
        };

        let rows = runner.run("sleeper", vec![ds("u1")], &cfg).await.unwrap();
        assert_eq!(rows[0].status_a, RunStatus::Timeout);
        assert_eq!(rows[0].status_b, RunStatus::Timeout);
        assert!(rows[0].message.as_deref().unwrap().contains("wall-clock"));
    }

    #[tokio::test]
    async fn failing_solver_is_reported_as_error() {
        let broken: Arc<dyn Solver> =
            Arc::new(|_: u16, _: u8, _: &str| -> Answers { anyhow::bail!("no parser for this input") });
        let runner = Runner::new(registry_with("broken", broken));

        let rows = runner
            .run("broken", vec![ds("u1")], &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(rows[0].status_a, RunStatus::Error);
        assert!(rows[0].message.as_deref().unwrap().contains("no parser"));
    }

    #[tokio::test]
    async fn unknown_plugin_is_an_error() {
        let runner = Runner::new(SolverRegistry::new());
        let err = runner
            .run("ghost", vec![ds("u1")], &RunConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn part_status_matrix() {
        assert_eq!(part_status(Some("42"), Some("042")), RunStatus::Pass);
        assert_eq!(part_status(Some("42"), Some("43")), RunStatus::Fail);
        assert_eq!(part_status(Some("42"), None), RunStatus::Fail);
        assert_eq!(part_status(None, Some("42")), RunStatus::Unverified);
        assert_eq!(part_status(None, None), RunStatus::Skipped);
    }
}
