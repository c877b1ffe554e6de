//! Word-bounded text helpers for event cards and the add form.

/// Word cap for card titles.
pub const CARD_TITLE_MAX_WORDS: usize = 10;
/// Word cap for card descriptions.
pub const CARD_DESC_MAX_WORDS: usize = 40;

const ELLIPSIS: char = '…';

/// Shortens `text` to its first `max_words` words followed by an ellipsis.
///
/// Text within the limit comes back unchanged, internal spacing included.
/// Missing text yields an empty string.
pub fn truncate_words(text: Option<&str>, max_words: usize) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }

    let mut out = words[..max_words].join(" ");
    out.push(ELLIPSIS);
    out
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::{count_words, truncate_words};

    #[test]
    fn keeps_text_at_exact_limit() {
        assert_eq!(
            truncate_words(Some("One two three four five"), 5),
            "One two three four five"
        );
    }

    #[test]
    fn cuts_and_appends_ellipsis() {
        assert_eq!(truncate_words(Some("a b c d e f"), 5), "a b c d e…");
        assert_eq!(
            truncate_words(Some("  free   pizza\tin the\nlounge "), 2),
            "free pizza…"
        );
    }

    #[test]
    fn preserves_spacing_when_under_limit() {
        assert_eq!(
            truncate_words(Some("  free   pizza  "), 10),
            "  free   pizza  "
        );
    }

    #[test]
    fn missing_text_is_empty() {
        assert_eq!(truncate_words(None, 10), "");
        assert_eq!(truncate_words(Some(""), 0), "");
    }

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words(" tacos  and\tchurros "), 3);
    }
}
