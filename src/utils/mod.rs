use std::collections::HashSet;

/// Keeps only the ASCII digits of what was typed into the count box.
pub fn filter_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses the count box. Empty input yields `None`; values too large for
/// `usize` saturate, they get clamped to the collection size later anyway.
pub fn parse_count(raw: &str) -> Option<usize> {
    let digits = filter_digits(raw);
    if digits.is_empty() {
        return None;
    }
    let value = digits.bytes().fold(0usize, |acc, b| {
        acc.saturating_mul(10).saturating_add(usize::from(b - b'0'))
    });
    Some(value)
}

pub fn parse_id_list_csv(value: &str) -> Result<Vec<u64>, String> {
    let mut out: Vec<u64> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    for part in value.split(|c: char| c == ',' || c.is_whitespace()) {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let id: u64 = item.parse().map_err(|_| format!("invalid id '{item}'"))?;
        if seen.insert(id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// Parses a 1-based page number as typed by the user into a page index.
pub fn parse_page_number(value: &str) -> Result<usize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid page '{}'", value.trim()))?;
    if n == 0 {
        return Err("pages start at 1".to_string());
    }
    Ok(n - 1)
}

pub fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only() {
        assert_eq!(filter_digits("1a2 b3-"), "123");
        assert_eq!(filter_digits("-5"), "5");
        assert_eq!(filter_digits("abc"), "");
    }

    #[test]
    fn empty_count_is_rejected() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("  x "), None);
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("2 5"), Some(25));
        assert_eq!(parse_count("99999999999999999999999999"), Some(usize::MAX));
    }

    #[test]
    fn id_list_accepts_commas_and_spaces() {
        assert_eq!(parse_id_list_csv("3, 7 3,,9").unwrap(), vec![3, 7, 9]);
        assert!(parse_id_list_csv("").unwrap().is_empty());
        assert!(parse_id_list_csv("3,x").is_err());
    }

    #[test]
    fn page_numbers_are_one_based() {
        assert_eq!(parse_page_number(" 1 ").unwrap(), 0);
        assert_eq!(parse_page_number("12").unwrap(), 11);
        assert!(parse_page_number("0").is_err());
        assert!(parse_page_number("-1").is_err());
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
    }
}
