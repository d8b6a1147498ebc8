//! Telegram MarkdownV2 escaping and length-safe truncation.
//!
//! Lengths are counted in `char`s throughout.

/// Characters MarkdownV2 reserves outside of entities.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

const CODE_FENCE: &str = "```";

/// Escape `text` so every character renders literally under MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut already-escaped MarkdownV2 text to at most `max_chars`, keeping it
/// parseable.
///
/// A trailing lone escape character is dropped and an unterminated code
/// fence is closed; the close may add up to four characters.
pub fn truncate_escaped(text: &str, max_chars: usize) -> String {
    let mut cut = truncate_chars(text, max_chars);

    let trailing = cut.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        cut = &cut[..cut.len() - 1];
    }

    let mut out = cut.to_owned();
    if out.matches(CODE_FENCE).count() % 2 == 1 {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(CODE_FENCE);
    }
    out
}
