//! Static field rules.
//!
//! [`validate`] is pure: the same field set, rules and date always produce
//! the same [`ErrorSet`]. The error set is recomputed in full on every call,
//! never patched.

use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::config::DEFAULT_DEPARTMENTS;
use crate::types::{ErrorSet, Field, FieldSet};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Configurable parts of the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    departments: Vec<String>,
    corporate_domain: Option<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            None,
        )
    }
}

impl ValidationRules {
    pub fn new(departments: Vec<String>, corporate_domain: Option<String>) -> Self {
        Self {
            departments,
            corporate_domain,
        }
    }

    /// Require emails to belong to `domain`.
    pub fn with_corporate_domain(mut self, domain: impl Into<String>) -> Self {
        self.corporate_domain = Some(domain.into());
        self
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn corporate_domain(&self) -> Option<&str> {
        self.corporate_domain.as_deref()
    }

    /// Validate against today's date on the local clock.
    ///
    /// Dates of joining are compared with the caller's local calendar day, so
    /// results can flip for "today" right around midnight.
    pub fn check(&self, fields: &FieldSet) -> ErrorSet {
        validate(fields, self, Local::now().date_naive())
    }

    fn email_message(&self) -> String {
        match &self.corporate_domain {
            Some(domain) => format!("Valid @{domain} email is required."),
            None => "Valid email is required.".to_string(),
        }
    }

    fn email_is_valid(&self, email: &str) -> bool {
        if !email_shape().is_match(email) {
            return false;
        }
        match &self.corporate_domain {
            Some(domain) => email
                .rsplit_once('@')
                .is_some_and(|(_, host)| host.eq_ignore_ascii_case(domain)),
            None => true,
        }
    }
}

/// Validate every field and return exactly the failing ones.
pub fn validate(fields: &FieldSet, rules: &ValidationRules, today: NaiveDate) -> ErrorSet {
    let mut errors = ErrorSet::default();

    for field in Field::ALL {
        let value = fields.get(field).trim();
        if let Some(message) = check_field(field, value, rules, today) {
            errors.insert(field, message);
        }
    }

    errors
}

fn check_field(
    field: Field,
    value: &str,
    rules: &ValidationRules,
    today: NaiveDate,
) -> Option<String> {
    match field {
        Field::EmployeeId | Field::Name | Field::Role => {
            value.is_empty().then(|| format!("{} is required.", field.label()))
        }
        Field::Email => (!rules.email_is_valid(value)).then(|| rules.email_message()),
        Field::PhoneNumber => {
            let valid = value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit());
            (!valid).then(|| "Valid phone number is required.".to_string())
        }
        Field::Department => {
            let known = rules.departments.iter().any(|d| d == value);
            (!known).then(|| "Department is required.".to_string())
        }
        Field::DateOfJoining => {
            let valid = NaiveDate::parse_from_str(value, DATE_FORMAT)
                .is_ok_and(|date| date <= today);
            (!valid).then(|| "Invalid date.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn valid_fields() -> FieldSet {
        FieldSet::default()
            .with(Field::EmployeeId, "E1")
            .with(Field::Name, "Ada Lovelace")
            .with(Field::Email, "e1@company.com")
            .with(Field::PhoneNumber, "5551234567")
            .with(Field::Department, "Engineering")
            .with(Field::DateOfJoining, "2024-06-01")
            .with(Field::Role, "Engineer")
    }

    #[test]
    fn test_valid_fields_produce_no_errors() {
        let errors = validate(&valid_fields(), &ValidationRules::default(), today());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_emptying_one_field_flags_only_that_field() {
        let rules = ValidationRules::default();
        for field in Field::ALL {
            let fields = valid_fields().with(field, "   ");
            let errors = validate(&fields, &rules, today());
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec![field]);
        }
    }

    #[test]
    fn test_empty_form_flags_every_field() {
        let errors = validate(&FieldSet::default(), &ValidationRules::default(), today());
        assert_eq!(errors.len(), Field::ALL.len());
        assert_eq!(errors.get(Field::EmployeeId), Some("Employee ID is required."));
        assert_eq!(errors.get(Field::Role), Some("Role is required."));
        assert_eq!(errors.get(Field::DateOfJoining), Some("Invalid date."));
    }

    #[test]
    fn test_email_without_tld_is_rejected() {
        let fields = valid_fields().with(Field::Email, "a@b");
        let errors = validate(&fields, &ValidationRules::default(), today());
        assert_eq!(errors.get(Field::Email), Some("Valid email is required."));
    }

    #[test]
    fn test_corporate_domain_policy() {
        let rules = ValidationRules::default().with_corporate_domain("company.com");

        let fields = valid_fields().with(Field::Email, "user@company.com");
        assert!(validate(&fields, &rules, today()).is_empty());

        let fields = valid_fields().with(Field::Email, "USER@Company.COM");
        assert!(validate(&fields, &rules, today()).is_empty());

        let fields = valid_fields().with(Field::Email, "user@gmail.com");
        let errors = validate(&fields, &rules, today());
        assert_eq!(
            errors.get(Field::Email),
            Some("Valid @company.com email is required.")
        );

        // shape failure reports the same combined message
        let fields = valid_fields().with(Field::Email, "company.com");
        let errors = validate(&fields, &rules, today());
        assert_eq!(
            errors.get(Field::Email),
            Some("Valid @company.com email is required.")
        );
    }

    #[test]
    fn test_phone_number_must_be_ten_digits() {
        let rules = ValidationRules::default();
        for bad in ["555123456", "55512345678", "555-123-4567", "+15551234567", "555123456a"] {
            let fields = valid_fields().with(Field::PhoneNumber, bad);
            assert!(
                validate(&fields, &rules, today()).contains(Field::PhoneNumber),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_department_must_be_configured() {
        let fields = valid_fields().with(Field::Department, "Sales");
        let errors = validate(&fields, &ValidationRules::default(), today());
        assert!(errors.contains(Field::Department));

        let rules = ValidationRules::new(vec!["Sales".into()], None);
        assert!(validate(&fields, &rules, today()).is_empty());
    }

    #[test]
    fn test_date_of_joining_bounds() {
        let rules = ValidationRules::default();
        let tomorrow = today().checked_add_days(Days::new(1)).unwrap();

        let fields = valid_fields().with(Field::DateOfJoining, today().format(DATE_FORMAT).to_string());
        assert!(validate(&fields, &rules, today()).is_empty());

        let fields = valid_fields().with(Field::DateOfJoining, tomorrow.format(DATE_FORMAT).to_string());
        assert!(validate(&fields, &rules, today()).contains(Field::DateOfJoining));

        for bad in ["not a date", "2024-02-30", "15/06/2024"] {
            let fields = valid_fields().with(Field::DateOfJoining, bad);
            assert!(validate(&fields, &rules, today()).contains(Field::DateOfJoining));
        }
    }

    #[test]
    fn test_check_uses_local_today() {
        let today = Local::now().date_naive();
        let fields = valid_fields().with(Field::DateOfJoining, today.format(DATE_FORMAT).to_string());
        assert!(ValidationRules::default().check(&fields).is_empty());
    }
}
