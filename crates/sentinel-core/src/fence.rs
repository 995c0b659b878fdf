//! Markdown code-fence handling for model replies.

use regex::Regex;
use std::sync::OnceLock;

fn fence_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```(?:json)?").expect("static regex"))
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("static regex"))
}

/// Remove every fence marker (```` ```json ```` and bare ```` ``` ````) and trim.
pub fn strip_code_fences(text: &str) -> String {
    fence_marker().replace_all(text, "").trim().to_string()
}

/// Inner text of the first fenced block, trimmed. `None` without one.
pub fn extract_first_code_block(text: &str) -> Option<String> {
    fenced_block()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
