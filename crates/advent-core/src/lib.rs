//! advent-core: fetch, cache, and submit answers for daily programming
//! puzzles, and benchmark solver plugins against cached datasets.
//!
//! The heart of the crate is the submission path: [`submit::SubmitController`]
//! consults the durable [`ledger::GuessLedger`] and the derived
//! [`bounds::Bounds`] before ever touching the network, classifies server
//! replies with [`classify::classify`], and persists every judged guess so a
//! known-bad or provably-impossible value is never submitted twice.

pub mod bounds;
pub mod cache;
pub mod classify;
pub mod ledger;
pub mod model;
pub mod prose;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod submit;
pub mod transforms;
pub mod transport;

pub use bounds::Bounds;
pub use cache::PuzzleCache;
pub use classify::{classify as classify_response, Verdict};
pub use ledger::GuessLedger;
pub use model::{Part, PuzzleId};
pub use submit::{Outcome, SubmitController};
pub use transport::{HttpTransport, Transport};
