//! Candidate date extraction from normalized label text.
//!
//! An ordered set of date-shape rules competes over the input: every rule
//! contributes every match it finds, each decoded into a calendar date with
//! a confidence weight tied to the rule's reliability. Out-of-range
//! components get one shot at repair through the digit-confusion
//! correctors before a candidate is dropped.

pub mod patterns;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use crate::correct::{
    self, CorrectionSuggestion, YEAR_MAX, YEAR_MIN, expand_year,
};

/// How a rule's capture groups map onto date components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    /// Groups are (year, month, day), all numeric.
    NumericYmd,
    /// Groups are (day, month, year), all numeric.
    NumericDmy,
    /// Groups are (day, month-name, year).
    TextDmy,
    /// Groups are (month-name, day, year).
    TextMdy,
}

/// A date-shape rule: matcher, component order, and base confidence.
struct FormatRule {
    name: &'static str,
    pattern: &'static Regex,
    decode: Decode,
    confidence: u8,
}

lazy_static! {
    static ref RULES: Vec<FormatRule> = vec![
        FormatRule {
            name: "iso-ymd",
            pattern: &patterns::ISO_YMD,
            decode: Decode::NumericYmd,
            confidence: 95,
        },
        FormatRule {
            name: "slash-dmy",
            pattern: &patterns::SLASH_DMY,
            decode: Decode::NumericDmy,
            confidence: 90,
        },
        FormatRule {
            name: "textual-compact",
            pattern: &patterns::TEXTUAL_COMPACT,
            decode: Decode::TextDmy,
            confidence: 85,
        },
        FormatRule {
            name: "textual-spaced",
            pattern: &patterns::TEXTUAL_SPACED,
            decode: Decode::TextDmy,
            confidence: 85,
        },
        FormatRule {
            name: "textual-mdy",
            pattern: &patterns::TEXTUAL_MDY,
            decode: Decode::TextMdy,
            confidence: 85,
        },
        FormatRule {
            name: "compact-ymd",
            pattern: &patterns::COMPACT_YMD,
            decode: Decode::NumericYmd,
            confidence: 80,
        },
        FormatRule {
            name: "compact-dmy",
            pattern: &patterns::COMPACT_DMY,
            decode: Decode::NumericDmy,
            confidence: 70,
        },
    ];
}

/// A tentative date parse produced by one rule match.
#[derive(Debug, Clone)]
pub struct DateCandidate {
    /// The decoded, calendar-valid date.
    pub date: NaiveDate,
    /// Confidence score (0-100), from the rule weight capped by any
    /// corrections that were needed.
    pub confidence: u8,
    /// Name of the rule that produced the match.
    pub rule: &'static str,
    /// Byte span of the match in the input text.
    pub span: (usize, usize),
    /// The matched text.
    pub matched: String,
    /// Digit-confusion repairs applied while decoding.
    pub corrections: Vec<CorrectionSuggestion>,
}

/// Run every rule over the text and return all decodable candidates.
///
/// Matches are kept independently; the same piece of text may legitimately
/// yield several candidates (a pure digit run matches both the compact
/// rules), and deduplication is deliberately left to selection.
pub fn extract(text: &str) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();

    for rule in RULES.iter() {
        for caps in rule.pattern.captures_iter(text) {
            if let Some(candidate) = decode_match(rule, &caps) {
                debug!(
                    rule = rule.name,
                    matched = %candidate.matched,
                    date = %candidate.date,
                    confidence = candidate.confidence,
                    "date candidate"
                );
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// Extract candidates and pick the best future date.
///
/// Candidates not strictly after `today` are discarded: an expiry date in
/// the past is always a misread. Returns `None` when nothing survives;
/// that is the expected no-date outcome, not an error.
pub fn select_best(text: &str, today: NaiveDate) -> Option<DateCandidate> {
    let candidates = extract(text);
    let total = candidates.len();

    let mut future: Vec<DateCandidate> = candidates
        .into_iter()
        .filter(|c| c.date > today)
        .collect();

    debug!(total, future = future.len(), "filtered candidates to future dates");

    // Total order: confidence, then longer matched span, then rule name.
    // Keeps selection reproducible regardless of rule registration order.
    future.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| (b.span.1 - b.span.0).cmp(&(a.span.1 - a.span.0)))
            .then_with(|| a.rule.cmp(b.rule))
    });

    future.into_iter().next()
}

fn decode_match(rule: &FormatRule, caps: &Captures<'_>) -> Option<DateCandidate> {
    let full = caps.get(0).unwrap();
    let mut corrections = Vec::new();

    let (day, month, year) = match rule.decode {
        Decode::NumericYmd => {
            let year = resolve_year(&caps[1], &mut corrections)?;
            let month = resolve_month(&caps[2], &mut corrections)?;
            let day = resolve_day(&caps[3], &mut corrections)?;
            (day, month, year)
        }
        Decode::NumericDmy => {
            let day = resolve_day(&caps[1], &mut corrections)?;
            let month = resolve_month(&caps[2], &mut corrections)?;
            let year = resolve_year(&caps[3], &mut corrections)?;
            (day, month, year)
        }
        Decode::TextDmy => {
            let day = resolve_day(&caps[1], &mut corrections)?;
            let month = month_from_name(&caps[2])?;
            let year = resolve_year(&caps[3], &mut corrections)?;
            (day, month, year)
        }
        Decode::TextMdy => {
            let month = month_from_name(&caps[1])?;
            let day = resolve_day(&caps[2], &mut corrections)?;
            let year = resolve_year(&caps[3], &mut corrections)?;
            (day, month, year)
        }
    };

    // Calendar validity: constructing the date and reading the fields back
    // rejects impossible combinations like a 31st in a 30-day month.
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    if date.year() != year || date.month() != month || date.day() != day {
        return None;
    }

    let confidence = corrections
        .iter()
        .map(|c| c.confidence)
        .min()
        .map_or(rule.confidence, |lowest| rule.confidence.min(lowest));

    Some(DateCandidate {
        date,
        confidence,
        rule: rule.name,
        span: (full.start(), full.end()),
        matched: full.as_str().to_string(),
        corrections,
    })
}

fn resolve_day(token: &str, corrections: &mut Vec<CorrectionSuggestion>) -> Option<u32> {
    if let Ok(day) = token.parse::<u32>() {
        if (1..=31).contains(&day) {
            return Some(day);
        }
    }
    // One repair attempt, then a single re-validation. No repair chains.
    let suggestion = correct::correct_day(token, None)?;
    let repaired: u32 = suggestion.corrected.parse().ok()?;
    if !(1..=31).contains(&repaired) {
        return None;
    }
    corrections.push(suggestion);
    Some(repaired)
}

fn resolve_month(token: &str, corrections: &mut Vec<CorrectionSuggestion>) -> Option<u32> {
    if let Ok(month) = token.parse::<u32>() {
        if (1..=12).contains(&month) {
            return Some(month);
        }
    }
    let suggestion = correct::correct_month(token, None)?;
    let repaired: u32 = suggestion.corrected.parse().ok()?;
    if !(1..=12).contains(&repaired) {
        return None;
    }
    corrections.push(suggestion);
    Some(repaired)
}

fn resolve_year(token: &str, corrections: &mut Vec<CorrectionSuggestion>) -> Option<i32> {
    if let Ok(value) = token.parse::<i32>() {
        let year = expand_year(token, value);
        if (YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Some(year);
        }
    }
    let suggestion = correct::correct_year(token, None)?;
    let value: i32 = suggestion.corrected.parse().ok()?;
    let repaired = expand_year(&suggestion.corrected, value);
    if !(YEAR_MIN..=YEAR_MAX).contains(&repaired) {
        return None;
    }
    corrections.push(suggestion);
    Some(repaired)
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.to_uppercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_textual_compact() {
        let best = select_best("30NOV25", today()).unwrap();
        assert_eq!(best.date, date(2025, 11, 30));
        assert_eq!(best.rule, "textual-compact");
    }

    #[test]
    fn spaced_and_compact_textual_agree() {
        let spaced = select_best("30 NOV 25", today()).unwrap();
        let compact = select_best("30NOV25", today()).unwrap();
        assert_eq!(spaced.date, compact.date);
        assert_ne!(spaced.rule, compact.rule);
    }

    #[test]
    fn parses_prefixed_label_with_trailing_digits() {
        let best = select_best("30NOV25 153098041", today()).unwrap();
        assert_eq!(best.date, date(2025, 11, 30));
    }

    #[test]
    fn parses_long_month_words() {
        let best = select_best("30NOVEMBER25", today()).unwrap();
        assert_eq!(best.date, date(2025, 11, 30));

        let best = select_best("25DECEMBER2049", today()).unwrap();
        assert_eq!(best.date, date(2049, 12, 25));
    }

    #[test]
    fn parses_month_first_textual() {
        let best = select_best("DEC 25 2049", today()).unwrap();
        assert_eq!(best.date, date(2049, 12, 25));
        assert_eq!(best.rule, "textual-mdy");
    }

    #[test]
    fn parses_all_month_abbreviations() {
        for (token, month) in [
            ("JAN", 1), ("FEB", 2), ("MAR", 3), ("APR", 4),
            ("MAY", 5), ("JUN", 6), ("JUL", 7), ("AUG", 8),
            ("SEP", 9), ("OCT", 10), ("NOV", 11), ("DEC", 12),
        ] {
            let text = format!("15{token}49");
            let best = select_best(&text, today()).unwrap();
            assert_eq!(best.date.month(), month, "failed for {text}");
            assert_eq!(best.date.day(), 15);
        }
    }

    #[test]
    fn parses_separated_numeric_forms() {
        assert_eq!(
            select_best("30/11/2025", today()).unwrap().date,
            date(2025, 11, 30)
        );
        assert_eq!(
            select_best("30-11-2025", today()).unwrap().date,
            date(2025, 11, 30)
        );
        assert_eq!(
            select_best("2025.11.30", today()).unwrap().date,
            date(2025, 11, 30)
        );
    }

    #[test]
    fn parses_bare_digit_runs_with_low_confidence() {
        let best = select_best("301149", today()).unwrap();
        assert_eq!(best.date, date(2049, 11, 30));
        assert_eq!(best.confidence, 70);

        let best = select_best("20491130", today()).unwrap();
        assert_eq!(best.date, date(2049, 11, 30));
        assert_eq!(best.rule, "compact-ymd");
    }

    #[test]
    fn past_dates_are_never_selected() {
        assert!(select_best("01/01/2020", today()).is_none());
        // Same-day is not strictly in the future either.
        assert!(select_best("01/01/2025", today()).is_none());
    }

    #[test]
    fn future_date_beats_adjacent_past_date() {
        let best = select_best("01/01/2024 30/11/2025", today()).unwrap();
        assert_eq!(best.date, date(2025, 11, 30));
    }

    #[test]
    fn iso_outranks_slash_for_the_same_date() {
        let best = select_best("2025-11-30 and also 30/11/25", today()).unwrap();
        assert_eq!(best.rule, "iso-ymd");
        assert_eq!(best.date, date(2025, 11, 30));
        assert!(best.confidence > 90);

        let candidates = extract("2025-11-30 and also 30/11/25");
        let iso = candidates.iter().find(|c| c.rule == "iso-ymd").unwrap();
        let slash = candidates.iter().find(|c| c.rule == "slash-dmy").unwrap();
        assert!(iso.confidence >= slash.confidence);
    }

    #[test]
    fn tie_break_prefers_longer_span_then_rule_name() {
        // Both textual rules carry confidence 85; the spaced match is the
        // longer span and must win regardless of registration order.
        let best = select_best("30NOV49 or 25 DEC 49", today()).unwrap();
        assert_eq!(best.rule, "textual-spaced");
        assert_eq!(best.date, date(2049, 12, 25));
    }

    #[test]
    fn round_trip_validity_holds_for_all_candidates() {
        let texts = [
            "30NOV25 153098041",
            "2049-02-28 and 31/12/49",
            "15JAN49 05/06/2049 20491130",
        ];
        for text in texts {
            for candidate in extract(text) {
                let rebuilt = NaiveDate::from_ymd_opt(
                    candidate.date.year(),
                    candidate.date.month(),
                    candidate.date.day(),
                )
                .unwrap();
                assert_eq!(rebuilt, candidate.date);
            }
        }
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        // April has 30 days; no rule may roll this over into May.
        assert!(select_best("31/04/2049", today()).is_none());
        assert!(select_best("30/02/2049", today()).is_none());
    }

    #[test]
    fn rejects_years_outside_the_window() {
        assert!(select_best("30/11/2051", today()).is_none());
        assert!(select_best("30/11/1999", today()).is_none());
    }

    #[test]
    fn corrects_invalid_month_and_caps_confidence() {
        // 13 is no month; the corrector repairs it to 03.
        let best = select_best("30/13/2049", today()).unwrap();
        assert_eq!(best.date, date(2049, 3, 30));
        assert_eq!(best.corrections.len(), 1);
        assert_eq!(best.corrections[0].original, "13");
        assert_eq!(best.corrections[0].corrected, "03");
        // Rule confidence 90 capped by the correction's 85.
        assert_eq!(best.confidence, 85);
    }

    #[test]
    fn corrects_invalid_day_once_without_chains() {
        let best = select_best("35/06/2049", today()).unwrap();
        // 35 repairs to 25 (3↔2 confusion outranks 3↔0).
        assert_eq!(best.date, date(2049, 6, 25));
    }

    #[test]
    fn uncorrectable_components_drop_the_candidate() {
        // Day 45 is outside every repair table.
        assert!(select_best("45/06/2049", today()).is_none());
    }

    #[test]
    fn no_candidates_in_plain_text() {
        assert!(select_best("PRODUCT OF SPAIN", today()).is_none());
        assert!(extract("").is_empty());
    }
}
