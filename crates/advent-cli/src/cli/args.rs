use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "advent",
    version,
    about = "Fetch, cache, and submit daily programming-puzzle answers; benchmark solver plugins against cached datasets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch and cache the puzzle input and prose for one day
    Fetch(FetchArgs),
    /// Submit a candidate answer through the local ledger and bound checks
    Submit(SubmitArgs),
    /// Show the recorded guess history, bounds, and answer for one part
    Guesses(GuessesArgs),
    /// Run a solver over one or more accounts' datasets under a timeout
    Run(RunArgs),
}

#[derive(clap::Args, Clone)]
pub struct CommonArgs {
    /// Store path (ledger + puzzle cache); defaults to the user data dir
    #[arg(long, env = "ADVENT_DB")]
    pub db: Option<PathBuf>,

    /// Session cookie for the puzzle site
    #[arg(long, env = "AOC_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Puzzle year; inferred from the calendar during the event
    #[arg(long, env = "AOC_YEAR")]
    pub year: Option<u16>,

    /// Puzzle day; inferred from the calendar during the event
    #[arg(long, env = "AOC_DAY")]
    pub day: Option<u8>,
}

#[derive(clap::Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Clone)]
pub struct SubmitArgs {
    /// The candidate answer
    pub value: String,

    /// Puzzle part: a|b
    #[arg(long, default_value = "a")]
    pub part: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Clone)]
pub struct GuessesArgs {
    /// Puzzle part: a|b
    #[arg(long, default_value = "a")]
    pub part: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Clone)]
pub struct RunArgs {
    /// Solver command: invoked as `<cmd> <year> <day>` with the input on
    /// stdin; prints answer_a and answer_b on two lines ("-" for none)
    #[arg(long)]
    pub solver_cmd: String,

    /// Wall-clock limit per solver invocation, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Concurrent datasets
    #[arg(long, default_value_t = 4)]
    pub parallel: usize,

    /// Only list failing datasets (the totals footer always prints)
    #[arg(long)]
    pub quiet: bool,

    /// Run against the scraped example data instead of real inputs
    #[arg(long)]
    pub example: bool,

    /// Verify unknown answers live against the server
    #[arg(long)]
    pub check: bool,

    /// JSON file with extra session tokens (object name -> token, or list)
    #[arg(long)]
    pub tokens: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}
