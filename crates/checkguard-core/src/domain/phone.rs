use crate::error::CoreError;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CANONICAL_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{9,14}$").expect("canonical phone pattern"));

/// Reduces user input to `+` followed by its digits.
///
/// Percent-encoded input (as received from query strings) is decoded first;
/// malformed escapes leave the input as typed. Returns an empty string when
/// no digit is present. The output is not guaranteed to be valid, see
/// [`is_valid_phone`].
pub fn normalize_phone(raw: &str) -> String {
    let decoded = decode_escapes(raw);
    let input = decoded.as_deref().unwrap_or(raw);

    let digits: String = input.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(digits.len() + 1);
    out.push('+');
    out.push_str(&digits);
    out
}

/// True iff `phone` is already in canonical form: `+`, a non-zero digit,
/// then 9 to 14 more digits.
pub fn is_valid_phone(phone: &str) -> bool {
    CANONICAL_PHONE.is_match(phone)
}

fn decode_escapes(raw: &str) -> Option<String> {
    if !raw.contains('%') {
        return None;
    }

    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let well_formed = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return None;
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// A phone number in canonical form. Only the storage layer's key type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Accepts an already-canonical number without normalizing it.
    pub fn new(canonical: &str) -> Result<Self, CoreError> {
        if canonical.is_empty() {
            return Err(CoreError::EmptyPhoneNumber);
        }
        if !is_valid_phone(canonical) {
            return Err(CoreError::InvalidPhoneNumber(canonical.to_string()));
        }
        Ok(Self(canonical.to_string()))
    }

    /// Normalizes raw input, then validates the canonical form.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = normalize_phone(raw);
        if normalized.is_empty() {
            return Err(CoreError::EmptyPhoneNumber);
        }
        if !is_valid_phone(&normalized) {
            return Err(CoreError::InvalidPhoneNumber(raw.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_phone, normalize_phone, PhoneNumber};
    use crate::error::CoreError;

    #[test]
    fn normalize_phone_strips_formatting() {
        assert_eq!(normalize_phone("(123) 456-7890"), "+1234567890");
        assert_eq!(normalize_phone("abc1234567890xyz"), "+1234567890");
        assert_eq!(normalize_phone("+1 (415) 555-0100"), "+14155550100");
    }

    #[test]
    fn normalize_phone_prepends_plus_without_country_code() {
        assert_eq!(normalize_phone("1234567890"), "+1234567890");
        assert_eq!(normalize_phone("123456789012"), "+123456789012");
        assert_eq!(normalize_phone("+91987654321"), "+91987654321");
    }

    #[test]
    fn normalize_phone_decodes_percent_escapes() {
        assert_eq!(normalize_phone("%2B1%20415%20555%200100"), "+14155550100");
        assert_eq!(normalize_phone("%2B14155550100"), "+14155550100");
    }

    #[test]
    fn normalize_phone_falls_back_to_raw_on_bad_escape() {
        // "%zz" is not an escape, so "%2B" stays literal and only digits survive.
        assert_eq!(normalize_phone("%2B1415%zz5550100"), "+214155550100");
    }

    #[test]
    fn normalize_phone_keeps_plus_only_in_front() {
        assert_eq!(normalize_phone("1+415+555"), "+1415555");
        assert_eq!(normalize_phone("1%2B415"), "+1415");
    }

    #[test]
    fn normalize_phone_returns_empty_without_digits() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("   "), "");
        assert_eq!(normalize_phone("+"), "");
        assert_eq!(normalize_phone("call me"), "");
    }

    #[test]
    fn normalize_phone_is_idempotent() {
        let inputs = [
            "",
            "+1234567890",
            "(415) 555-0100",
            "1+2+3",
            "%2B44%2020%207946%200958",
            "%zz12",
            "tel: +49 30 1234567",
            "٣٤٥ 12",
        ];
        for input in inputs {
            let once = normalize_phone(input);
            assert_eq!(normalize_phone(&once), once, "input {input:?}");
            if once.is_empty() {
                continue;
            }
            assert!(once.starts_with('+'), "input {input:?}");
            assert!(
                once[1..].chars().all(|ch| ch.is_ascii_digit()),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn is_valid_phone_checks_digit_count_bounds() {
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("+123456789012345"));
        assert!(!is_valid_phone("+123456789"));
        assert!(!is_valid_phone("+1234567890123456"));
    }

    #[test]
    fn is_valid_phone_rejects_leading_zero_and_noise() {
        assert!(!is_valid_phone("+0123456789"));
        assert!(!is_valid_phone("1234567890"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("+123"));
        assert!(!is_valid_phone("abcdef"));
        assert!(!is_valid_phone("+1234567890 "));
        assert!(!is_valid_phone("+1234567890\n"));
        assert!(!is_valid_phone("++1234567890"));
    }

    #[test]
    fn phone_number_parse_normalizes_then_validates() {
        let phone = PhoneNumber::parse("(415) 555-0100").unwrap();
        assert_eq!(phone.as_str(), "+4155550100");

        assert_eq!(PhoneNumber::parse("  "), Err(CoreError::EmptyPhoneNumber));
        assert!(matches!(
            PhoneNumber::parse("+0123456789"),
            Err(CoreError::InvalidPhoneNumber(_))
        ));
    }

    #[test]
    fn phone_number_new_does_not_normalize() {
        assert!(PhoneNumber::new("+14155550100").is_ok());
        assert!(matches!(
            PhoneNumber::new("14155550100"),
            Err(CoreError::InvalidPhoneNumber(_))
        ));
    }

    #[test]
    fn phone_number_deserialize_rejects_non_canonical() {
        let ok: PhoneNumber = serde_json::from_str("\"+14155550100\"").unwrap();
        assert_eq!(ok.to_string(), "+14155550100");
        assert!(serde_json::from_str::<PhoneNumber>("\"415-555-0100\"").is_err());
    }
}
