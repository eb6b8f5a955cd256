//! Sequential marker labels.
//!
//! Labels are stored as strings. Only the leading integer of a label counts;
//! anything without leading digits is treated as 0 instead of failing.

/// Parse the leading integer of a label: skip whitespace, accept an optional
/// `+`, then take the run of ASCII digits. No digits gives 0.
pub fn parse_label(label: &str) -> u32 {
    let s = label.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    // Overflowing labels saturate so the allocator still moves forward
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u32::MAX - 1)
    }
}

/// Next label number for the given set of live labels: `max + 1`, or 1 when empty.
pub fn next_label<'a, I>(labels: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .map(parse_label)
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

pub fn format_label(n: u32) -> String {
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_label("1"), 1);
        assert_eq!(parse_label("42"), 42);
        assert_eq!(parse_label("007"), 7);
    }

    #[test]
    fn test_parse_leading_integer() {
        assert_eq!(parse_label("12abc"), 12);
        assert_eq!(parse_label("  5"), 5);
        assert_eq!(parse_label("+9"), 9);
        assert_eq!(parse_label("3.7"), 3);
    }

    #[test]
    fn test_parse_non_numeric_is_zero() {
        assert_eq!(parse_label(""), 0);
        assert_eq!(parse_label("abc"), 0);
        assert_eq!(parse_label("-4"), 0);
        assert_eq!(parse_label("x1"), 0);
    }

    #[test]
    fn test_next_label_empty_is_one() {
        assert_eq!(next_label(std::iter::empty()), 1);
    }

    #[test]
    fn test_next_label_is_max_plus_one() {
        assert_eq!(next_label(["1", "2", "4"]), 5);
        assert_eq!(next_label(["4", "1"]), 5);
    }

    #[test]
    fn test_next_label_ignores_garbage() {
        assert_eq!(next_label(["home", "2", ""]), 3);
        assert_eq!(next_label(["home"]), 1);
    }

    #[test]
    fn test_next_label_huge_label_saturates() {
        assert_eq!(next_label(["99999999999999999999"]), u32::MAX);
    }
}
