use crate::cli::args::FetchArgs;
use crate::exit_codes;
use advent_core::model::{Part, PuzzleId};
use advent_core::resolve;
use advent_core::transport::HttpTransport;

pub async fn run(args: FetchArgs) -> anyhow::Result<i32> {
    let session = resolve::resolve_session(args.common.session.clone())?;
    let (year, day) = resolve::resolve_puzzle_date(args.common.year, args.common.day)?;
    let id = PuzzleId::new(year, day, Part::A, session.user.clone())?;

    let (_ledger, cache) = super::open_stores(&args.common)?;
    let transport = HttpTransport::new(&session.token)?;

    let input = cache.fetch_input(&id, &transport).await?;
    let prose = cache.fetch_prose(&id, &transport).await?;
    println!(
        "{}/{:02}: input {} bytes, prose {} bytes (cached)",
        year,
        day,
        input.len(),
        prose.len()
    );
    Ok(exit_codes::OK)
}
