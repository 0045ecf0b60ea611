use crate::cli::args::{Cli, Command, CommonArgs};
use advent_core::cache::PuzzleCache;
use advent_core::ledger::GuessLedger;
use advent_core::model::Part;
use anyhow::{bail, Context};
use std::path::PathBuf;

pub mod fetch;
pub mod guesses;
pub mod run;
pub mod submit;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Fetch(args) => fetch::run(args).await,
        Command::Submit(args) => submit::run(args).await,
        Command::Guesses(args) => guesses::run(args).await,
        Command::Run(args) => run::run(args).await,
    }
}

pub(crate) fn db_path(common: &CommonArgs) -> PathBuf {
    common.db.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".advent"))
            .join("advent")
            .join("store.db")
    })
}

/// Open the ledger and puzzle cache on one store file, creating parents.
pub(crate) fn open_stores(common: &CommonArgs) -> anyhow::Result<(GuessLedger, PuzzleCache)> {
    let path = db_path(common);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let ledger = GuessLedger::open(&path)
        .with_context(|| format!("failed to open store {}", path.display()))?;
    let cache = PuzzleCache::open(&path)
        .with_context(|| format!("failed to open store {}", path.display()))?;
    Ok((ledger, cache))
}

pub(crate) fn parse_part(s: &str) -> anyhow::Result<Part> {
    match Part::parse(s) {
        Some(part) => Ok(part),
        None => bail!("invalid part {:?} (expected a|b)", s),
    }
}
