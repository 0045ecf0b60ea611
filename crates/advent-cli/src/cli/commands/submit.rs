use crate::cli::args::SubmitArgs;
use crate::exit_codes;
use advent_core::resolve;
use advent_core::submit::{Outcome, SubmitController};
use advent_core::transport::HttpTransport;
use std::sync::Arc;

pub async fn run(args: SubmitArgs) -> anyhow::Result<i32> {
    let part = super::parse_part(&args.part)?;
    let session = resolve::resolve_session(args.common.session.clone())?;
    let id = resolve::resolve_identity(args.common.year, args.common.day, part, &session)?;

    let (ledger, cache) = super::open_stores(&args.common)?;
    let transport = Arc::new(HttpTransport::new(&session.token)?);
    let controller = SubmitController::new(ledger, cache, transport);

    let outcome = controller.submit(&id, &args.value).await?;
    let code = match &outcome {
        Outcome::Accepted { value } => {
            println!("{id}: that's the right answer: {value}");
            exit_codes::OK
        }
        Outcome::AlreadySolved { answer: Some(answer) } => {
            println!("{id}: already solved, answer = {answer}");
            exit_codes::OK
        }
        Outcome::AlreadySolved { answer: None } => {
            println!("{id}: already solved elsewhere (posted answer not recoverable)");
            exit_codes::OK
        }
        Outcome::Rejected {
            verdict,
            message,
            source,
        } => {
            println!("{id}: rejected [{}] via {source}: {message}", verdict.code());
            exit_codes::FAILED
        }
        Outcome::RateLimited { wait } => {
            println!("{id}: rate limited, retry in {}s", wait.as_secs());
            exit_codes::FAILED
        }
    };
    Ok(code)
}
