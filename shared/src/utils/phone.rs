//! Phone number utilities

use regex::Regex;
use once_cell::sync::Lazy;

// Chinese mobile phone number regex
static CHINA_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^1[3-9][0-9]{9}$").unwrap()
});

/// Characters accepted as formatting and removed before validation
const FORMATTING_CHARS: [char; 4] = [' ', '-', '(', ')'];

/// Normalize a phone number by removing spaces, dashes and parentheses
///
/// Every other character is kept, so anything beyond digits and a leading
/// `+` still fails validation afterwards.
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !FORMATTING_CHARS.contains(c))
        .collect()
}

/// Normalize to a bare 11-digit mainland number, dropping a `+86`/`0086`
/// country code. Returns `None` when the result is not a valid mobile number.
pub fn to_mainland_mobile(phone: &str) -> Option<String> {
    let normalized = normalize_phone_number(phone);
    let national = normalized
        .strip_prefix("+86")
        .or_else(|| normalized.strip_prefix("0086"))
        .unwrap_or(&normalized);

    if CHINA_MOBILE_REGEX.is_match(national) {
        Some(national.to_string())
    } else {
        None
    }
}

/// Mask a phone number for display and logs (e.g., 138****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = normalize_phone_number(phone).chars().collect();
    if chars.len() >= 7 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("138-1234-5678"), "13812345678");
        assert_eq!(normalize_phone_number("+86 138 1234 5678"), "+8613812345678");
        assert_eq!(normalize_phone_number("(138) 1234-5678"), "13812345678");
        assert_eq!(normalize_phone_number("138a1234"), "138a1234");
    }

    #[test]
    fn test_to_mainland_mobile() {
        assert_eq!(to_mainland_mobile("+86 138 0013 8000").as_deref(), Some("13800138000"));
        assert_eq!(to_mainland_mobile("008613800138000").as_deref(), Some("13800138000"));
        assert_eq!(to_mainland_mobile("1234567890"), None);
        assert_eq!(to_mainland_mobile(""), None);
    }

    #[test]
    fn test_mainland_mobile_prefixes_and_lengths() {
        assert!(to_mainland_mobile("13812345678").is_some());
        assert!(to_mainland_mobile("15912345678").is_some());
        assert!(to_mainland_mobile("19912345678").is_some());
        assert!(to_mainland_mobile("12812345678").is_none()); // Invalid prefix
        assert!(to_mainland_mobile("1381234567").is_none());   // Too short
        assert!(to_mainland_mobile("138123456789").is_none()); // Too long
    }

    #[test]
    fn test_other_characters_are_rejected() {
        assert_eq!(to_mainland_mobile("1380013800a0"), None);
        assert_eq!(to_mainland_mobile("tel:13800138000;ext=x"), None);
        assert_eq!(to_mainland_mobile("138.0013.8000"), None);
        assert_eq!(to_mainland_mobile("138_0013_8000"), None);
        assert_eq!(to_mainland_mobile("１３８００１３８０００"), None);
        assert_eq!(to_mainland_mobile("13８00138000"), None);
        assert_eq!(to_mainland_mobile("86+13800138000"), None);
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("13812345678"), "138****5678");
        assert_eq!(mask_phone_number("+8613812345678"), "+86****5678");
        assert_eq!(mask_phone_number("12345"), "****");
        assert_eq!(mask_phone_number("电话号码一二三四五"), "电话号****二三四五");
    }
}
