//! Date-shape regex patterns for expiry labels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // YYYY/MM/DD, YYYY-MM-DD, YYYY.MM.DD
    pub static ref ISO_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // DD/MM/YYYY, DD/MM/YY and dash/dot variants
    pub static ref SLASH_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{2,4})\b"
    ).unwrap();

    // DDMMMYY, DDMMMYYYY with the month token glued on ("30NOV25"),
    // tolerating long month words ("30NOVEMBER25")
    pub static ref TEXTUAL_COMPACT: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)[A-Z]*(\d{2,4})\b"
    ).unwrap();

    // DD MMM YYYY, DD MMM YY ("25 DEC 2024", "30 NOV 25")
    pub static ref TEXTUAL_SPACED: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s+(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)[A-Z]*\s+(\d{2,4})\b"
    ).unwrap();

    // MMM DD YYYY ("DEC 25 2024", "DEC 25, 2024")
    pub static ref TEXTUAL_MDY: Regex = Regex::new(
        r"(?i)\b(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)[A-Z]*\s*(\d{1,2})[,\s]+(\d{2,4})\b"
    ).unwrap();

    // YYYYMMDD as one digit run, anchored to this century
    pub static ref COMPACT_YMD: Regex = Regex::new(
        r"\b(20\d{2})(\d{2})(\d{2})\b"
    ).unwrap();

    // DDMMYY, DDMMYYYY as one bare digit run
    pub static ref COMPACT_DMY: Regex = Regex::new(
        r"\b(\d{2})(\d{2})(\d{2,4})\b"
    ).unwrap();

    // Cheap pre-check: does this text plausibly contain a date at all?
    pub static ref DATE_HINT: Regex = Regex::new(
        r"(?i)\d{1,4}[./\-]\d{1,2}|\d{2,8}|JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC"
    ).unwrap();
}
