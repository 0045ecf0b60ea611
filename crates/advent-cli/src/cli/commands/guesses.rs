use crate::cli::args::GuessesArgs;
use crate::exit_codes;
use advent_core::resolve;

pub async fn run(args: GuessesArgs) -> anyhow::Result<i32> {
    let part = super::parse_part(&args.part)?;
    let session = resolve::resolve_session(args.common.session.clone())?;
    let id = resolve::resolve_identity(args.common.year, args.common.day, part, &session)?;

    let (ledger, _cache) = super::open_stores(&args.common)?;

    let records = ledger.guesses(&id)?;
    if records.is_empty() {
        println!("{id}: no guesses recorded");
    }
    for rec in &records {
        println!(
            "{}  {:<8} {}  {}",
            rec.submitted_at.to_rfc3339(),
            rec.verdict.code(),
            rec.value,
            rec.raw_message
        );
    }

    let bounds = ledger.bounds(&id)?;
    if !bounds.is_unbounded() {
        let lower = bounds
            .lower_exclusive
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-inf".into());
        let upper = bounds
            .upper_exclusive
            .map(|n| n.to_string())
            .unwrap_or_else(|| "+inf".into());
        println!("feasible window: ({lower}, {upper})");
    }
    if let Some(answer) = ledger.correct_answer(&id)? {
        println!("correct answer: {answer}");
    }
    Ok(exit_codes::OK)
}
