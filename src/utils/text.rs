//! Text helpers for handling raw model output.

/// Strip surrounding Markdown code fences from a model response.
///
/// Models frequently wrap JSON answers in ```json fences despite being told
/// not to; parsing must happen on the bare payload.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let opened = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let closed = opened.trim_end().strip_suffix("```").unwrap_or(opened);
    closed.trim()
}

/// UTF-8 safe prefix of `text`, at most `max_bytes` long. Used to keep log
/// lines with raw model output bounded.
pub fn preview(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
