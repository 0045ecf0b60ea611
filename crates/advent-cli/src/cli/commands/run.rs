use crate::cli::args::RunArgs;
use crate::exit_codes;
use advent_core::report::print_summary;
use advent_core::resolve;
use advent_core::runner::{
    dataset_for, example_dataset_for, RunConfig, Runner, Solver, SolverRegistry,
};
use advent_core::submit::SubmitController;
use advent_core::transport::HttpTransport;
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

/// Bridge to an external solver process: `<cmd> <year> <day>` with the input
/// on stdin, answers on the first two stdout lines ("-" for none).
struct CommandSolver {
    program: String,
}

impl Solver for CommandSolver {
    fn solve(
        &self,
        year: u16,
        day: u8,
        input: &str,
    ) -> anyhow::Result<(Option<String>, Option<String>)> {
        let mut child = Command::new(&self.program)
            .arg(year.to_string())
            .arg(day.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn solver {:?}", self.program))?;
        child
            .stdin
            .take()
            .context("solver stdin unavailable")?
            .write_all(input.as_bytes())?;
        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!("solver {:?} exited with {}", self.program, output.status);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
        Ok((parse_answer(lines.next()), parse_answer(lines.next())))
    }
}

fn parse_answer(line: Option<&str>) -> Option<String> {
    match line {
        None | Some("-") | Some("") => None,
        Some(s) => Some(s.to_string()),
    }
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    if args.example && args.check {
        bail!("--check cannot be combined with --example: example answers are never submitted");
    }

    let primary = resolve::resolve_session(args.common.session.clone())?;
    let mut sessions = vec![primary.clone()];
    if let Some(path) = &args.tokens {
        sessions.extend(resolve::load_tokens(path)?);
    }
    let mut seen = HashSet::new();
    sessions.retain(|s| seen.insert(s.user.clone()));

    let (year, day) = resolve::resolve_puzzle_date(args.common.year, args.common.day)?;
    let (ledger, cache) = super::open_stores(&args.common)?;

    let mut transport = HttpTransport::new(&primary.token)?;
    for session in &sessions[1..] {
        transport.add_session(&session.token);
    }
    let transport: Arc<HttpTransport> = Arc::new(transport);

    let mut datasets = Vec::new();
    for session in &sessions {
        if args.example {
            match example_dataset_for(&cache, transport.as_ref(), &session.user, year, day).await? {
                Some(ds) => datasets.push(ds),
                None => {
                    tracing::warn!(user = %session.user, "no example found in prose, skipping");
                }
            }
        } else {
            datasets
                .push(dataset_for(&cache, &ledger, transport.as_ref(), &session.user, year, day).await?);
        }
    }
    if datasets.is_empty() {
        bail!("no datasets to run");
    }

    let mut registry = SolverRegistry::new();
    registry.register(
        "command",
        Arc::new(CommandSolver {
            program: args.solver_cmd.clone(),
        }),
    );

    let mut runner = Runner::new(registry);
    if args.check {
        runner = runner.with_controller(Arc::new(SubmitController::new(
            ledger.clone(),
            cache.clone(),
            transport.clone(),
        )));
    }

    let cfg = RunConfig {
        timeout: Duration::from_secs(args.timeout),
        parallel: args.parallel,
        check: args.check,
    };
    let rows = runner.run("command", datasets, &cfg).await?;
    print_summary(&rows, args.quiet);

    let code = if rows.iter().any(|r| r.is_failure()) {
        exit_codes::FAILED
    } else {
        exit_codes::OK
    };
    Ok(code)
}
