//! Prose scraping: pull structured pieces out of puzzle-page html.
//!
//! The pages are simple and stable enough that anchored regexes over the
//! `<article>` / `<pre><code>` / `<code>` structure beat carrying a full html
//! parser. Everything here is best-effort: absent pieces come back as `None`
//! or an empty list, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Worked example scraped from the puzzle prose: the first code block of the
/// part-A article plus candidate answers from each article's trailing code
/// literal. `extra` carries human-readable context when the example needs it
/// (e.g. fewer iterations than the real input).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Example {
    pub input_data: String,
    pub answer_a: Option<String>,
    pub answer_b: Option<String>,
    pub extra: Option<String>,
}

fn article_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<article[^>]*>(.*?)</article>").expect("valid pattern"))
}

fn pre_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<pre>\s*<code>(.*?)</code>\s*</pre>").expect("valid pattern")
    })
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<code>(.*?)</code>").expect("valid pattern"))
}

fn posted_answer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Your puzzle answer was\s*<code>(.*?)</code>").expect("valid pattern")
    })
}

/// Inner html of each `<article>` on the page, in order. Part A first;
/// part B present only once unlocked.
pub fn articles(html: &str) -> Vec<String> {
    article_re()
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

/// Plain text of the first `<article>`, for classification of answer replies.
pub fn article_text(html: &str) -> Option<String> {
    let inner = article_re().captures(html)?.get(1)?.as_str();
    Some(strip_tags(inner))
}

/// Values of "Your puzzle answer was `X`" occurrences, in page order
/// (index 0 = part A). Source of truth for answers solved elsewhere.
pub fn posted_answers(html: &str) -> Vec<String> {
    posted_answer_re()
        .captures_iter(html)
        .map(|c| strip_tags(&c[1]).trim().to_string())
        .collect()
}

/// Scrape worked examples from the puzzle prose. At most one per page in
/// this implementation: input from the part-A article's first code block,
/// answers from each article's last short code literal.
pub fn extract_examples(html: &str) -> Vec<Example> {
    let articles = articles(html);
    let Some(article_a) = articles.first() else {
        return Vec::new();
    };
    let Some(input) = first_code_block(article_a) else {
        return Vec::new();
    };
    let example = Example {
        input_data: input,
        answer_a: trailing_answer(article_a),
        answer_b: articles.get(1).and_then(|a| trailing_answer(a)),
        extra: None,
    };
    vec![example]
}

fn first_code_block(article: &str) -> Option<String> {
    let caps = pre_code_re().captures(article)?;
    let text = strip_tags(&caps[1]);
    let trimmed = text.trim_end_matches(['\r', '\n']).to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// The last `<code>` literal of an article, taken as the example answer when
/// it looks like one (short, single line, not the input block itself).
fn trailing_answer(article: &str) -> Option<String> {
    let last = code_re()
        .captures_iter(article)
        .last()
        .map(|c| strip_tags(&c[1]))?;
    let candidate = last.trim();
    if candidate.is_empty() || candidate.len() > 40 || candidate.contains('\n') {
        return None;
    }
    Some(candidate.to_string())
}

/// Drop tags and decode the handful of entities the pages actually use.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLVED_PAGE: &str = r#"
        <main>
        <article class="day-desc"><h2>--- Day 1: Not Quite Lisp ---</h2>
        <p>For example:</p>
        <pre><code>(()
        ))(
        </code></pre>
        <p>the result is <code><em>3</em></code>.</p>
        </article>
        <p>Your puzzle answer was <code>280</code>.</p>
        <article class="day-desc"><h2>--- Part Two ---</h2>
        <p>the position is <code>5</code>.</p>
        </article>
        <p>Your puzzle answer was <code>1797</code>.</p>
        </main>
    "#;

    #[test]
    fn posted_answers_come_back_in_part_order() {
        assert_eq!(posted_answers(SOLVED_PAGE), ["280", "1797"]);
        assert!(posted_answers("<main>no answers here</main>").is_empty());
    }

    #[test]
    fn articles_are_split_in_order() {
        let arts = articles(SOLVED_PAGE);
        assert_eq!(arts.len(), 2);
        assert!(arts[0].contains("Not Quite Lisp"));
        assert!(arts[1].contains("Part Two"));
    }

    #[test]
    fn article_text_strips_markup() {
        let text = article_text("<article><p>your answer is <em>too high</em>.</p></article>")
            .unwrap();
        assert_eq!(text.trim(), "your answer is too high.");
    }

    #[test]
    fn examples_use_first_code_block_and_trailing_literals() {
        let examples = extract_examples(SOLVED_PAGE);
        assert_eq!(examples.len(), 1);
        let eg = &examples[0];
        assert!(eg.input_data.starts_with("(()"));
        assert_eq!(eg.answer_a.as_deref(), Some("3"));
        assert_eq!(eg.answer_b.as_deref(), Some("5"));
        assert_eq!(eg.extra, None);
    }

    #[test]
    fn example_answers_fall_back_to_none() {
        let html = "<article><pre><code>1\n2\n3</code></pre></article>";
        let examples = extract_examples(html);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].input_data, "1\n2\n3");
        // The only <code> is the input block itself: multiline, so rejected
        assert_eq!(examples[0].answer_a, None);
        assert_eq!(examples[0].answer_b, None);
    }

    #[test]
    fn no_article_means_no_examples() {
        assert!(extract_examples("<html><body>nope</body></html>").is_empty());
    }

    #[test]
    fn strip_tags_decodes_entities() {
        assert_eq!(strip_tags("<em>a &lt; b &amp;&amp; c</em>"), "a < b && c");
    }
}
