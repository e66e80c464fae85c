use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::identity::{CandidateIdentity, IdentityField};

/// Per-field error messages, keyed by field.
pub type FieldErrors = BTreeMap<IdentityField, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub field_errors: FieldErrors,
}

#[cfg(test)]
impl ValidationReport {
    pub fn error_for(&self, field: IdentityField) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }
}

const MIN_NAME_CHARS: usize = 2;
const MIN_MOBILE_DIGITS: usize = 10;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

// Optional leading '+', then at least 10 digits, spaces, dashes or parentheses.
// The digit count is checked separately.
static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").unwrap());

/// Validates a candidate identity.
///
/// Pure: the same input always yields the same report, so it can gate a
/// "start" action continuously as well as run on an explicit save.
///
/// Rules (applied to trimmed values):
/// - name: required, at least 2 characters
/// - email: required, `local@domain.tld` shape
/// - mobile: required, optional `+` then digits/spaces/dashes/parentheses,
///   with at least 10 digits
pub fn validate(identity: &CandidateIdentity) -> ValidationReport {
    let mut field_errors = FieldErrors::new();

    let name = identity.name.trim();
    if name.is_empty() {
        field_errors.insert(IdentityField::Name, "Name is required".to_string());
    } else if name.chars().count() < MIN_NAME_CHARS {
        field_errors.insert(
            IdentityField::Name,
            format!("Name must be at least {MIN_NAME_CHARS} characters"),
        );
    }

    let email = identity.email.trim();
    if email.is_empty() {
        field_errors.insert(IdentityField::Email, "Email is required".to_string());
    } else if !EMAIL_RE.is_match(email) {
        field_errors.insert(
            IdentityField::Email,
            "Please enter a valid email address".to_string(),
        );
    }

    let mobile = identity.mobile.trim();
    if mobile.is_empty() {
        field_errors.insert(IdentityField::Mobile, "Mobile number is required".to_string());
    } else if !MOBILE_RE.is_match(mobile)
        || mobile.chars().filter(char::is_ascii_digit).count() < MIN_MOBILE_DIGITS
    {
        field_errors.insert(
            IdentityField::Mobile,
            "Please enter a valid mobile number".to_string(),
        );
    }

    ValidationReport {
        valid: field_errors.is_empty(),
        field_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_identity() -> CandidateIdentity {
        CandidateIdentity::new("Jane Doe", "jane@example.com", "+1 (555) 123-4567")
    }

    #[test]
    fn test_valid_identity_passes() {
        let report = validate(&valid_identity());
        assert!(report.valid);
        assert!(report.field_errors.is_empty());
    }

    #[test]
    fn test_every_empty_field_gets_required_message() {
        let report = validate(&CandidateIdentity::default());
        assert!(!report.valid);
        assert_eq!(report.error_for(IdentityField::Name), Some("Name is required"));
        assert_eq!(report.error_for(IdentityField::Email), Some("Email is required"));
        assert_eq!(
            report.error_for(IdentityField::Mobile),
            Some("Mobile number is required")
        );
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let mut identity = valid_identity();
        identity.name = "   ".to_string();
        let report = validate(&identity);
        assert_eq!(report.error_for(IdentityField::Name), Some("Name is required"));
        assert_eq!(report.field_errors.len(), 1);
    }

    #[test]
    fn test_single_character_name_rejected() {
        let mut identity = valid_identity();
        identity.name = " J ".to_string();
        let report = validate(&identity);
        assert_eq!(
            report.error_for(IdentityField::Name),
            Some("Name must be at least 2 characters")
        );
    }

    #[test]
    fn test_malformed_emails_rejected() {
        for email in ["abc", "a@b", "a b@example.com", "@example.com", "jane@", "jane@@x.io"] {
            let mut identity = valid_identity();
            identity.email = email.to_string();
            let report = validate(&identity);
            assert!(!report.valid, "{email} should be invalid");
            assert_eq!(
                report.error_for(IdentityField::Email),
                Some("Please enter a valid email address")
            );
        }
    }

    #[test]
    fn test_email_is_trimmed_before_matching() {
        let mut identity = valid_identity();
        identity.email = "  jane@example.com ".to_string();
        assert!(validate(&identity).valid);
    }

    #[test]
    fn test_short_mobiles_rejected() {
        for mobile in ["12345", "555-1234", "+1 555 12", "phone: 5551234567", "(555) 12-34"] {
            let mut identity = valid_identity();
            identity.mobile = mobile.to_string();
            let report = validate(&identity);
            assert_eq!(
                report.error_for(IdentityField::Mobile),
                Some("Please enter a valid mobile number"),
                "{mobile} should be invalid"
            );
        }
    }

    #[test]
    fn test_punctuation_only_mobiles_rejected() {
        for mobile in ["(---)-----", "+ ( ) - - - - -", "(555) ---- ----"] {
            let mut identity = valid_identity();
            identity.mobile = mobile.to_string();
            assert_eq!(
                validate(&identity).error_for(IdentityField::Mobile),
                Some("Please enter a valid mobile number"),
                "{mobile} should be invalid"
            );
        }
    }

    #[test]
    fn test_formatted_mobiles_accepted() {
        for mobile in ["+1 (555) 123-4567", "5551234567", "+91 98765 43210"] {
            let mut identity = valid_identity();
            identity.mobile = mobile.to_string();
            assert!(validate(&identity).valid, "{mobile} should be valid");
        }
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = validate(&CandidateIdentity::new("Jane", "", "5551234567"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["fieldErrors"]["email"], "Email is required");
        assert!(json["fieldErrors"].get("name").is_none());
    }
}
