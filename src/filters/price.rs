//! Price text normalization.
//!
//! Listing prices arrive as localized text such as `"1.250,00 €"`, `"400 €"`
//! or `"Cijena na upit"`. [`normalize`] turns that into a comparable integer.

/// Value returned when no price can be read. Sorts after every real price.
pub const UNKNOWN_PRICE: i64 = i64::MAX;

/// Parse the first number in `price_text`, ignoring thousands separators and
/// dropping any fractional part. Returns [`UNKNOWN_PRICE`] when there is no
/// digit to read or the number does not fit.
pub fn normalize(price_text: Option<&str>) -> i64 {
    price_text.and_then(parse_first_number).unwrap_or(UNKNOWN_PRICE)
}

/// Same as [`normalize`] but keeps the unknown case as `None`
pub fn known(price_text: Option<&str>) -> Option<i64> {
    price_text.and_then(parse_first_number)
}

fn is_group_separator(c: char) -> bool {
    matches!(c, '.' | ',' | ' ' | '\u{a0}' | '\u{202f}' | '\'')
}

fn parse_first_number(text: &str) -> Option<i64> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;

    let mut digits = String::new();
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        digits.push(chars[i]);
        i += 1;
    }

    // Walk "<sep><digits>" groups. Exactly three digits continue the integer
    // part. Anything else ends the number: a fraction after '.' or ',', or a
    // second number after whitespace.
    while i < chars.len() && is_group_separator(chars[i]) {
        let group_start = i + 1;
        let mut end = group_start;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if end - group_start != 3 {
            break;
        }
        digits.extend(&chars[group_start..end]);
        i = end;
    }

    digits.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_european_format_with_decimals() {
        assert_eq!(normalize(Some("1.250,00 €")), 1250);
    }

    #[test]
    fn test_plain_and_suffixed_prices() {
        assert_eq!(normalize(Some("400 €")), 400);
        assert_eq!(normalize(Some("350€")), 350);
        assert_eq!(normalize(Some("EUR 720")), 720);
        assert_eq!(normalize(Some("  90 €/mj")), 90);
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(normalize(Some("1,250")), 1250);
        assert_eq!(normalize(Some("1 250 €")), 1250);
        assert_eq!(normalize(Some("1\u{a0}250 €")), 1250);
        assert_eq!(normalize(Some("12.500.000 kn")), 12_500_000);
        assert_eq!(normalize(Some("1,250.50 USD")), 1250);
    }

    #[test]
    fn test_fraction_is_dropped() {
        assert_eq!(normalize(Some("12,5 €")), 12);
        assert_eq!(normalize(Some("399.99")), 399);
    }

    #[test]
    fn test_only_first_number_counts() {
        assert_eq!(normalize(Some("450 € + 80 € režije")), 450);
        assert_eq!(normalize(Some("300 40")), 300);
    }

    #[test]
    fn test_unknown_prices() {
        assert_eq!(normalize(None), UNKNOWN_PRICE);
        assert_eq!(normalize(Some("no digits here")), UNKNOWN_PRICE);
        assert_eq!(normalize(Some("")), UNKNOWN_PRICE);
        assert_eq!(known(Some("Cijena na upit")), None);
    }

    #[test]
    fn test_overflow_is_unknown() {
        assert_eq!(normalize(Some("99999999999999999999999")), UNKNOWN_PRICE);
    }
}
