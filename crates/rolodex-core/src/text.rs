/// Text helpers shared by the stores: phone normalization and search folding
use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Strip everything but ASCII digits from a phone number
/// Example: "+84 (90) 123-4567" -> "84901234567"
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Fold text for accent- and case-insensitive matching.
/// Decomposes to NFD, drops combining marks, lowercases.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Compare two digit strings by numeric value without parsing them.
/// Empty strings count as zero, so numbers of any length compare correctly.
pub fn cmp_numeric_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// `true` when the trimmed string is empty
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
