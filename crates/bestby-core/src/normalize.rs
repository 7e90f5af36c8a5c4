//! Normalization of raw recognized label text before date parsing.
//!
//! Recognized expiry labels carry two kinds of noise: the label phrase
//! itself ("BEST BEFORE", "EXP", ...) and character-level confusion between
//! visually similar glyphs (O/0, l/I/1). Both are repaired here, before any
//! date-shape matching runs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Label phrases and their trailing separators.
    static ref LABEL_PREFIX: Regex = Regex::new(
        r"(?i)\b(?:BEST\s*BEFORE|USE\s*BY|SELL\s*BY|EXPIRES|EXPIRY|EXP|BB|MFG|PKD)\b[:.\-\s]*"
    ).unwrap();

    // O is repaired to 0 only next to digits or directly before a month
    // token, so unrelated words keep their spelling. The month rule also
    // keeps "15OCT25" intact: that O opens the month itself.
    static ref O_BEFORE_MONTH: Regex = Regex::new(
        r"(?i)O(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)"
    ).unwrap();
    static ref O_BETWEEN_DIGITS: Regex = Regex::new(r"(\d)[Oo](\d)").unwrap();
    static ref O_BEFORE_DIGIT: Regex = Regex::new(r"[Oo](\d)").unwrap();
    static ref O_AFTER_DIGIT: Regex = Regex::new(r"(\d)[Oo]($|[^A-Za-z0-9])").unwrap();

    static ref L_BETWEEN_DIGITS: Regex = Regex::new(r"(\d)[lI](\d)").unwrap();
    static ref L_BEFORE_DIGIT: Regex = Regex::new(r"[lI](\d)").unwrap();
    static ref L_AFTER_DIGIT: Regex = Regex::new(r"(\d)[lI]($|[^A-Za-z0-9])").unwrap();

    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize raw recognized text for date extraction.
///
/// Strips known label prefixes, repairs O/l/I digit confusion in numeric
/// context, and collapses whitespace. Never fails; any input (including the
/// empty string) comes back as a string. Idempotent: normalizing already
/// normalized text is a no-op.
pub fn normalize(raw: &str) -> String {
    let stripped = LABEL_PREFIX.replace_all(raw, "");
    let repaired = repair_digit_confusion(&stripped);
    WHITESPACE.replace_all(&repaired, " ").trim().to_string()
}

/// Run the character repairs to a fixed point.
///
/// A single pass can expose new numeric context (e.g. "3O01" needs the
/// second O fixed before the first becomes digit-adjacent), so repairs are
/// repeated until the text stops changing. Each pass strictly reduces the
/// number of confusable letters, so this terminates.
fn repair_digit_confusion(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = repair_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn repair_pass(text: &str) -> String {
    let text = O_BEFORE_MONTH.replace_all(text, "0${1}");
    let text = O_BETWEEN_DIGITS.replace_all(&text, "${1}0${2}");
    let text = O_BEFORE_DIGIT.replace_all(&text, "0${1}");
    let text = O_AFTER_DIGIT.replace_all(&text, "${1}0${2}");
    let text = L_BETWEEN_DIGITS.replace_all(&text, "${1}1${2}");
    let text = L_BEFORE_DIGIT.replace_all(&text, "1${1}");
    let text = L_AFTER_DIGIT.replace_all(&text, "${1}1${2}");
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_label_prefixes() {
        let cleaned = normalize("BEST BEFORE 30NOV25 153098041");
        assert!(cleaned.contains("30NOV25"));
        assert!(!cleaned.contains("BEST BEFORE"));

        assert_eq!(normalize("EXP: 30NOV25"), "30NOV25");
        assert_eq!(normalize("USE BY 30NOV25"), "30NOV25");
        assert_eq!(normalize("EXPIRY 30NOV25"), "30NOV25");
        assert_eq!(normalize("BB 30NOV25"), "30NOV25");
        assert_eq!(normalize("SELL BY 30NOV25"), "30NOV25");
    }

    #[test]
    fn does_not_strip_prefix_inside_words() {
        // EXP must not eat the start of unrelated words.
        assert_eq!(normalize("EXPORT QUALITY"), "EXPORT QUALITY");
    }

    #[test]
    fn repairs_letter_o_next_to_digits() {
        assert_eq!(normalize("2O24"), "2024");
        assert_eq!(normalize("O3"), "03");
        assert_eq!(normalize("3O NOV"), "30 NOV");
        assert_eq!(normalize("3ONOV25"), "30NOV25");
    }

    #[test]
    fn keeps_october_intact() {
        assert_eq!(normalize("15OCT25"), "15OCT25");
        assert_eq!(normalize("1OCT49"), "1OCT49");
    }

    #[test]
    fn repairs_l_and_i_next_to_digits() {
        assert_eq!(normalize("l5"), "15");
        assert_eq!(normalize("I5"), "15");
        assert_eq!(normalize("3l"), "31");
        assert_eq!(normalize("2025-l1-30"), "2025-11-30");
    }

    #[test]
    fn does_not_repair_letters_in_words() {
        assert_eq!(normalize("25lb BAG"), "25lb BAG");
        assert_eq!(normalize("OLIVE OIL"), "OLIVE OIL");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  30   NOV \n 25  "), "30 NOV 25");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "BEST BEFORE 30NOV25 153098041",
            "3ONOV25",
            "3O01",
            "OO1",
            "EXP: 2O24-l1-3O",
            "",
            "already clean text 30/11/25",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
