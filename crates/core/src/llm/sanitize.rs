//! Strips markdown artifacts from model text so it reads as the plain-text template the chat
//! persona asks for.

use regex::Regex;
use std::sync::LazyLock;

const BULLET: &str = "• ";

// A deletion can join two fragments into a new match (`_(_` becomes `__`), so the ordered pass
// runs until nothing changes. Two passes reach the fixed point for any input; the extra ones
// are headroom.
const MAX_PASSES: usize = 4;

static HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"#+[ \t]*"));
static UNDERSCORE_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"_{2,}"));
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| compile(r"[\[\]()]"));
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^[ \t]*[-•][ \t]+"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\s*\n\s*\n"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid sanitizer pattern {pattern}: {e}"))
}

/// Removes heading markers, emphasis, underscore runs and bracket characters, normalizes list
/// bullets to `• `, collapses runs of blank lines and trims. Idempotent.
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_pass(text);
    for _ in 1..MAX_PASSES {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn sanitize_pass(text: &str) -> String {
    let out = HEADING.replace_all(text, "");
    let out = out.replace('*', "");
    let out = UNDERSCORE_RUN.replace_all(&out, "");
    let out = BRACKETS.replace_all(&out, "");
    let out = LIST_MARKER.replace_all(&out, BULLET);
    let out = BLANK_LINES.replace_all(&out, "\n\n");
    out.trim().to_string()
}
