//! Filesystem-safe title tokens.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid pattern"));

/// Reduce a raw model title to a filesystem-safe token: every character that
/// is not a word character (letter, digit, underscore) or whitespace is
/// removed, then the remainder is trimmed and internal whitespace runs are
/// collapsed to single underscores.
///
/// Total over all inputs (the empty string maps to the empty string) and
/// idempotent — callers decide what to do with an empty result.
pub fn sanitize_title(title: &str) -> String {
    let stripped = NON_WORD.replace_all(title, "");
    stripped.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(sanitize_title("Quarterly Report 2023"), "Quarterly_Report_2023");
    }

    #[test]
    fn punctuation_is_removed() {
        assert_eq!(sanitize_title("Invoice #42: Acme, Inc."), "Invoice_42_Acme_Inc");
    }

    #[test]
    fn whitespace_runs_collapse_to_one_underscore() {
        assert_eq!(sanitize_title("  Annual \t Review \n 2024  "), "Annual_Review_2024");
    }

    #[test]
    fn unicode_letters_survive() {
        assert_eq!(sanitize_title("Überweisung März"), "Überweisung_März");
    }

    #[test]
    fn degenerate_input_maps_to_empty() {
        assert_eq!(sanitize_title(""), "");
        assert_eq!(sanitize_title("?!.,;:"), "");
        assert_eq!(sanitize_title("   "), "");
    }

    #[test]
    fn sanitizing_twice_is_a_no_op() {
        for raw in ["A: messy/title?", "plain", "  padded  ", "!!!", "a  b"] {
            let once = sanitize_title(raw);
            assert_eq!(sanitize_title(&once), once);
        }
    }
}
