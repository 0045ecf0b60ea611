//! Input transforms applied to raw puzzle data before it reaches a solver.

use regex::Regex;
use std::sync::OnceLock;

/// Non-empty trimmed lines of the input.
pub fn lines(data: &str) -> Vec<&str> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+").expect("valid pattern"))
}

/// Signed integers per line, in order of appearance. Handles CSV,
/// whitespace-separated, and mixed forms like "68,788 -> 68,875"; rows may
/// be ragged.
pub fn numbers(data: &str) -> Vec<Vec<i64>> {
    lines(data)
        .into_iter()
        .map(|line| {
            int_re()
                .find_iter(line)
                .filter_map(|m| m.as_str().parse().ok())
                .collect()
        })
        .collect()
}

/// All integers in the input, flattened.
pub fn numbers_flat(data: &str) -> Vec<i64> {
    numbers(data).into_iter().flatten().collect()
}
