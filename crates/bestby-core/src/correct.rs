//! Digit-confusion repair for out-of-range date components.
//!
//! Optical recognition routinely swaps visually similar glyphs (0↔O↔9,
//! 1↔l↔I↔7, 3↔8, 2↔Z, 5↔S). When a decoded day, month, or year token falls
//! outside its valid range, the correctors here propose the most plausible
//! repair from field-specific confusion tables. This layer deliberately
//! widens acceptance: an occasional false correction is traded for much
//! higher recall against noisy label text.

use serde::{Deserialize, Serialize};

/// Which date component a correction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Day,
    Month,
    Year,
}

/// A proposed repair for an out-of-range token.
///
/// The original token is never mutated; the suggestion carries both values
/// so callers can log the repair alongside the substituted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionSuggestion {
    /// The component this repair targets.
    pub field: DateField,
    /// The token as recognized.
    pub original: String,
    /// The proposed replacement token.
    pub corrected: String,
    /// Heuristic confidence in the repair (0-100).
    pub confidence: u8,
    /// Human-readable explanation of the confusion assumed.
    pub reason: String,
}

/// Accepted year window for expiry dates, chosen for a realistic horizon.
pub const YEAR_MIN: i32 = 2020;
pub const YEAR_MAX: i32 = 2050;

/// Expand a possibly two-digit year token by century.
///
/// Values below 50 land in the 2000s, the rest in the 1900s, matching the
/// calendar convention used by the extractor.
pub fn expand_year(token: &str, value: i32) -> i32 {
    if token.len() <= 2 {
        if value < 50 { 2000 + value } else { 1900 + value }
    } else {
        value
    }
}

/// Suggest a repair for an invalid month token.
///
/// Returns `None` when the token already parses to 1-12. Otherwise applies
/// the month confusion table and returns the highest-confidence candidate.
pub fn correct_month(token: &str, observed_confidence: Option<u8>) -> Option<CorrectionSuggestion> {
    let month: u32 = token.parse().ok()?;
    if (1..=12).contains(&month) {
        return None;
    }

    let mut candidates = Vec::new();

    if token == "00" {
        candidates.push(suggestion(
            DateField::Month,
            token,
            "09",
            70,
            "00 is invalid, likely 09 (0↔9 confusion)",
        ));
    }

    let second = token.chars().nth(1);
    if (13..=19).contains(&month) {
        let corrected = format!("0{}", second.unwrap());
        candidates.push(suggestion(
            DateField::Month,
            token,
            &corrected,
            85,
            &format!("{month} is invalid, likely {corrected} (stray leading 1)"),
        ));
    }

    if (20..=29).contains(&month) {
        if let Some(d @ ('0' | '1' | '2')) = second {
            let corrected = format!("1{d}");
            candidates.push(suggestion(
                DateField::Month,
                token,
                &corrected,
                75,
                &format!("{month} is invalid, likely {corrected} (2↔1 confusion)"),
            ));
        }
    }

    if (30..=39).contains(&month) {
        let corrected = format!("0{}", second.unwrap());
        candidates.push(suggestion(
            DateField::Month,
            token,
            &corrected,
            80,
            &format!("{month} is invalid, likely {corrected} (3↔0 confusion)"),
        ));
    }

    best(candidates, observed_confidence)
}

/// Suggest a repair for an invalid day token.
///
/// Returns `None` when the token already parses to 1-31.
pub fn correct_day(token: &str, observed_confidence: Option<u8>) -> Option<CorrectionSuggestion> {
    let day: u32 = token.parse().ok()?;
    if (1..=31).contains(&day) {
        return None;
    }

    let mut candidates = Vec::new();

    if token == "00" {
        candidates.push(suggestion(
            DateField::Day,
            token,
            "09",
            65,
            "00 is invalid, likely 09 (0↔9 confusion)",
        ));
    }

    if (32..=39).contains(&day) {
        let second = token.chars().nth(1).unwrap();
        let as_twenties = format!("2{second}");
        candidates.push(suggestion(
            DateField::Day,
            token,
            &as_twenties,
            75,
            &format!("{day} is invalid, likely {as_twenties} (3↔2 confusion)"),
        ));
        let as_single = format!("0{second}");
        candidates.push(suggestion(
            DateField::Day,
            token,
            &as_single,
            70,
            &format!("{day} is invalid, could be {as_single} (3↔0 confusion)"),
        ));
    }

    best(candidates, observed_confidence)
}

/// Suggest a repair for an invalid year token.
///
/// Two-digit tokens are expanded by century before the window check.
/// Returns `None` when the (expanded) year already falls in the accepted
/// window.
pub fn correct_year(token: &str, observed_confidence: Option<u8>) -> Option<CorrectionSuggestion> {
    if let Ok(value) = token.parse::<i32>() {
        let year = expand_year(token, value);
        if (YEAR_MIN..=YEAR_MAX).contains(&year) {
            return None;
        }
    }

    let mut candidates = Vec::new();

    // Literal O glyphs keep the token from parsing at all.
    let deglyphed = token.replace(['O', 'o'], "0");
    if deglyphed != token {
        candidates.push(suggestion(
            DateField::Year,
            token,
            &deglyphed,
            90,
            "letter O corrected to 0",
        ));
    }

    if token.len() == 4 && token.starts_with('3') {
        let corrected = format!("2{}", &token[1..]);
        candidates.push(suggestion(
            DateField::Year,
            token,
            &corrected,
            85,
            "year starts with 3, likely 2 (3↔2 confusion)",
        ));
    }

    best(candidates, observed_confidence)
}

fn suggestion(
    field: DateField,
    original: &str,
    corrected: &str,
    confidence: u8,
    reason: &str,
) -> CorrectionSuggestion {
    CorrectionSuggestion {
        field,
        original: original.to_string(),
        corrected: corrected.to_string(),
        confidence,
        reason: reason.to_string(),
    }
}

/// Pick the highest-confidence candidate, capping it by the recognizer's
/// own confidence in the token when one was reported.
fn best(
    mut candidates: Vec<CorrectionSuggestion>,
    observed_confidence: Option<u8>,
) -> Option<CorrectionSuggestion> {
    candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    let mut chosen = candidates.into_iter().next()?;
    if let Some(observed) = observed_confidence {
        chosen.confidence = chosen.confidence.min(observed);
    }
    Some(chosen)
}
