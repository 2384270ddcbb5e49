//! Deterministic clean-up of diagram text returned by the model.
//!
//! The output always starts with exactly one header line, never contains a
//! triple-backtick fence, never contains blank lines, and keeps every other
//! non-blank line verbatim and in its original order.

use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_DIAGRAM_HEADER: &str = "flowchart TD";

// 語言標籤只在 fence 後獨佔該行時才移除，緊接在 fence 後的圖表內容保留
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)```(?:[\w+-]+[ \t\r]*$)?").expect("fence pattern is valid"));

/// Remove every fence marker, plus a language tag when it is the rest of the line.
///
/// Runs to a fixpoint so that backticks left adjacent by a removal can not
/// form a new fence.
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = text.to_string();

    while FENCE_RE.is_match(&cleaned) {
        cleaned = FENCE_RE.replace_all(&cleaned, "").into_owned();
    }

    cleaned
}

fn is_header_line(line: &str, header: &str) -> bool {
    line.trim().eq_ignore_ascii_case(header.trim())
}

/// Clean model output into diagram source that begins with `header`.
pub fn clean_diagram(raw: &str, header: &str) -> String {
    let header = header.trim();
    let stripped = strip_code_fences(raw);

    let mut lines = vec![header.to_string()];
    let mut header_seen = false;

    for line in stripped.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if is_header_line(line, header) {
            // 只保留第一個標頭，其餘重複的丟棄
            header_seen = true;
            continue;
        }
        lines.push(line.to_string());
    }

    if !header_seen {
        tracing::debug!("Diagram output had no header line, prepending '{}'", header);
    }

    lines.join("\n")
}
