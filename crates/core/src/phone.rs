//! Telephone number validation and WhatsApp address normalisation.

/// Maximum stored telephone length, including an optional leading `+`.
pub const MAX_TELEPHONE_LEN: usize = 13;

/// Minimum telephone length; anything shorter cannot be a subscriber number.
pub const MIN_TELEPHONE_LEN: usize = 8;

/// Validate a telephone number as entered by staff or in a CSV upload.
///
/// Accepts digits with an optional leading `+`, between
/// [`MIN_TELEPHONE_LEN`] and [`MAX_TELEPHONE_LEN`] characters.
pub fn validate_telephone(telephone: &str) -> Result<(), String> {
    if telephone.is_empty() {
        return Err("telephone is required".to_string());
    }
    if telephone.len() > MAX_TELEPHONE_LEN {
        return Err(format!(
            "telephone '{telephone}' exceeds {MAX_TELEPHONE_LEN} characters"
        ));
    }
    if telephone.len() < MIN_TELEPHONE_LEN {
        return Err(format!(
            "telephone '{telephone}' is shorter than {MIN_TELEPHONE_LEN} characters"
        ));
    }
    let digits = telephone.strip_prefix('+').unwrap_or(telephone);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("telephone '{telephone}' must contain only digits"));
    }
    Ok(())
}

/// Convert a locally formatted number into the international form expected
/// by the WhatsApp gateway (digits only, country code first).
///
/// `0812...` becomes `62812...` for country code `62`; `+62812...` becomes
/// `62812...`; numbers already starting with the country code are kept.
pub fn to_whatsapp_number(telephone: &str, country_code: &str) -> String {
    let trimmed = telephone.trim();
    if let Some(rest) = trimmed.strip_prefix('+') {
        return rest.to_string();
    }
    if let Some(rest) = trimmed.strip_prefix('0') {
        return format!("{country_code}{rest}");
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_local_and_international_numbers() {
        assert!(validate_telephone("081234567890").is_ok());
        assert!(validate_telephone("+628123456789").is_ok());
    }

    #[test]
    fn rejects_too_long() {
        let err = validate_telephone("08123456789012").unwrap_err();
        assert!(err.contains("exceeds 13"));
    }

    #[test]
    fn rejects_non_digits() {
        assert!(validate_telephone("0812-3456-78").is_err());
        assert!(validate_telephone("+").is_err());
    }

    #[test]
    fn rejects_empty_and_short() {
        assert!(validate_telephone("").is_err());
        assert!(validate_telephone("0812").is_err());
    }

    #[test]
    fn whatsapp_number_replaces_leading_zero() {
        assert_eq!(to_whatsapp_number("08123456789", "62"), "628123456789");
    }

    #[test]
    fn whatsapp_number_strips_plus() {
        assert_eq!(to_whatsapp_number("+628123456789", "62"), "628123456789");
    }

    #[test]
    fn whatsapp_number_keeps_international_form() {
        assert_eq!(to_whatsapp_number("628123456789", "62"), "628123456789");
    }
}
