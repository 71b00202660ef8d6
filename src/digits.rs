//! Persian numeral handling for scraped price text.

const PERSIAN_ZERO: u32 = 0x06F0;
const PERSIAN_NINE: u32 = 0x06F9;

/// Replace every Persian digit (`۰`..`۹`) with its ASCII counterpart.
///
/// All other characters pass through untouched, so the output always has the
/// same number of chars as the input and normalizing twice is a no-op.
pub fn normalize_digits(text: &str) -> String {
    text.chars().map(to_ascii_digit).collect()
}

fn to_ascii_digit(c: char) -> char {
    let code = c as u32;
    if (PERSIAN_ZERO..=PERSIAN_NINE).contains(&code) {
        char::from_digit(code - PERSIAN_ZERO, 10).unwrap_or(c)
    } else {
        c
    }
}
