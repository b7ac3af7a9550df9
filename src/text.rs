//! Splitting long text into size-limited pieces
//!
//! Used for Telegram's per-message cap and the short-input limit of the
//! Google speech endpoint. Limits are counted in characters, not bytes.

/// Split `text` into trimmed, non-empty pieces of at most `limit` characters.
///
/// Prefers breaking at the last newline inside the window, then at the last
/// whitespace, and only hard-splits a single overlong word.
#[must_use]
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut pieces = Vec::new();
    let mut remaining = text.trim();

    while !remaining.is_empty() {
        if remaining.chars().count() <= limit {
            pieces.push(remaining.to_string());
            break;
        }

        let split_at = find_split_point(remaining, limit);
        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        remaining = remaining[split_at..].trim_start();
    }

    pieces
}

/// Byte offset to split at, always on a char boundary and never zero
fn find_split_point(text: &str, limit: usize) -> usize {
    // Byte offset just past the `limit`-th char
    let window_end = text
        .char_indices()
        .nth(limit)
        .map_or(text.len(), |(idx, _)| idx);
    let window = &text[..window_end];

    if let Some(pos) = window.rfind('\n').filter(|&p| p > 0) {
        return pos;
    }
    if let Some(pos) = window.rfind(char::is_whitespace).filter(|&p| p > 0) {
        return pos;
    }
    window_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_piece() {
        assert_eq!(split_text("hello there", 100), vec!["hello there"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("   ", 10).is_empty());
    }

    #[test]
    fn splits_on_whitespace() {
        let pieces = split_text("one two three four", 9);
        assert_eq!(pieces, vec!["one two", "three", "four"]);
        assert!(pieces.iter().all(|p| p.chars().count() <= 9));
    }

    #[test]
    fn prefers_newlines() {
        let pieces = split_text("first line\nsecond line", 15);
        assert_eq!(pieces, vec!["first line", "second line"]);
    }

    #[test]
    fn hard_splits_long_words_on_char_boundaries() {
        let pieces = split_text("привітпривіт", 5);
        assert_eq!(pieces, vec!["приві", "тприв", "іт"]);
    }
}
