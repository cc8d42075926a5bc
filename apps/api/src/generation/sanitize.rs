//! Output sanitization for generated variants.
//!
//! Models wrap answers in conversational scaffolding no matter how firmly the
//! prompt forbids it. This pipeline runs in a fixed order; the steps are not
//! commutative (preambles must go before the quote check, whitespace collapse
//! before the final trim):
//!   1. strip leading preambles, looped until stable
//!   2. strip wrapping quotes when the entire content is quoted
//!   3. collapse horizontal whitespace runs, preserving line breaks
//!   4. collapse 3+ consecutive line breaks to exactly 2
//!   5. trim

use regex::Regex;
use std::sync::LazyLock;

static PREAMBLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^here['’]?s\s[^:\n]{0,80}:\s*",
        r"(?i)^here\sis\s[^:\n]{0,80}:\s*",
        r"(?i)^i['’]?ll\s[^:\n]{0,80}:\s*",
        r"(?i)^i['’]?ve\s[^:\n]{0,80}:\s*",
        r"(?i)^sure[!,.:]\s*",
        r"(?i)^certainly[!,.:]\s*",
        r"(?i)^of course[!,.:]\s*",
        r"(?i)^absolutely[!,.:]\s*",
        r"(?i)^(?:great|good)\s(?:idea|question|one)[!,.:]\s*",
        r"(?i)^as requested[,:]\s*",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static HORIZONTAL_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static EXCESS_NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Runs the full sanitization pipeline over raw model output.
pub fn sanitize_output(raw: &str) -> String {
    let mut text = raw.to_string();

    // Step 1: stacked preambles ("Sure! Here's your post: ...") need repeated
    // passes; each pass strips at least one character, so this terminates.
    loop {
        let mut changed = false;
        for re in PREAMBLE_PATTERNS.iter() {
            if re.is_match(&text) {
                text = re.replace(&text, "").into_owned();
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Step 2
    let text = strip_wrapping_quotes(&text).to_string();

    // Steps 3 and 4, with line endings normalized first
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS_RE.replace_all(&text, " ");
    let text = EXCESS_NEWLINES_RE.replace_all(&text, "\n\n");

    // Step 5
    text.trim().to_string()
}

/// Strips one layer of wrapping quotes when the whole content is quoted.
/// Surrounding whitespace does not count against the wrap check; straight and
/// curly double quotes only, since apostrophes are too common inside post
/// text to treat as wrappers.
fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [("\"", "\""), ("\u{201C}", "\u{201D}")] {
        if trimmed.len() >= open.len() + close.len() {
            if let Some(inner) = trimmed
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
            {
                return inner;
            }
        }
    }
    text
}
