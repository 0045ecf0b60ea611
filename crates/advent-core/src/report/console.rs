//! Plain-text rendering of runner results.

use crate::runner::{RunRow, RunStatus};

/// Format one result row for display. Deterministic, unit-testable.
#[must_use]
pub fn format_row(row: &RunRow) -> String {
    let mut line = format!(
        "{}/{:02} {:<10} {:>6.1}s  a: {}{}",
        row.year,
        row.day,
        row.user,
        row.duration.as_secs_f64(),
        row.status_a.as_str(),
        format_answer(row.answer_a.as_deref()),
    );
    if row.status_b != RunStatus::Skipped {
        line.push_str(&format!(
            "  b: {}{}",
            row.status_b.as_str(),
            format_answer(row.answer_b.as_deref()),
        ));
    }
    if let Some(msg) = &row.message {
        line.push_str(&format!("  ({})", msg));
    }
    line
}

fn format_answer(answer: Option<&str>) -> String {
    match answer {
        Some(a) => format!(" [{}]", truncate(a, 30)),
        None => String::new(),
    }
}

fn truncate(s: &str, maxlen: usize) -> String {
    if s.len() <= maxlen {
        return s.to_string();
    }
    let mut end = maxlen;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Print per-row lines and a totals footer. With `quiet`, only failing rows
/// are listed; the footer always prints.
pub fn print_summary(rows: &[RunRow], quiet: bool) {
    let mut pass = 0;
    let mut fail = 0;
    let mut timeout = 0;
    let mut error = 0;
    let mut other = 0;
    for row in rows {
        if !quiet || row.is_failure() {
            println!("{}", format_row(row));
        }
        for status in [row.status_a, row.status_b] {
            match status {
                RunStatus::Pass => pass += 1,
                RunStatus::Fail => fail += 1,
                RunStatus::Timeout => timeout += 1,
                RunStatus::Error => error += 1,
                RunStatus::Unverified => other += 1,
                RunStatus::Skipped => {}
            }
        }
    }
    println!(
        "{} datasets: {} pass, {} fail, {} timeout, {} error, {} unverified",
        rows.len(),
        pass,
        fail,
        timeout,
        error,
        other
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn row() -> RunRow {
        RunRow {
            user: "u1".to_string(),
            year: 2015,
            day: 24,
            answer_a: Some("99".to_string()),
            answer_b: None,
            status_a: RunStatus::Pass,
            status_b: RunStatus::Skipped,
            duration: Duration::from_millis(1500),
            message: None,
        }
    }

    #[test]
    fn format_row_omits_skipped_part() {
        let line = format_row(&row());
        assert!(line.starts_with("2015/24 u1"));
        assert!(line.contains("a: pass [99]"));
        assert!(!line.contains("b:"));
    }

    #[test]
    fn format_row_includes_failure_detail() {
        let mut r = row();
        r.status_a = RunStatus::Timeout;
        r.answer_a = None;
        r.message = Some("exceeded 60s wall-clock limit".to_string());
        let line = format_row(&r);
        assert!(line.contains("a: timeout"));
        assert!(line.contains("exceeded 60s"));
    }

    #[test]
    fn long_answers_are_truncated() {
        let mut r = row();
        r.answer_a = Some("x".repeat(100));
        let line = format_row(&r);
        assert!(line.len() < 120);
        assert!(line.contains("..."));
    }
}
