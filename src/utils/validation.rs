use serde::Serialize;
use utoipa::ToSchema;

/// One offending input field and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "personalEmail")]
    pub field: String,
    #[schema(example = "must be a valid email address")]
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Collects field errors so a payload is reported in one pass instead of
/// failing on the first bad field.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<FieldError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} is required"));
        }
    }

    pub fn require_email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} is required"));
        } else if !is_email(value) {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value
            && !value.trim().is_empty()
            && !is_email(value)
        {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn extend(&mut self, other: Violations) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Shape check only: `local@domain.tld`, no whitespace.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("ann.lee@company.com"));
        assert!(is_email("  ann@mail.co.in "));
        assert!(!is_email("ann"));
        assert!(!is_email("@company.com"));
        assert!(!is_email("ann@company"));
        assert!(!is_email("ann@.com"));
        assert!(!is_email("ann@@company.com"));
        assert!(!is_email("ann lee@company.com"));
    }

    #[test]
    fn violations_collect_every_field() {
        let mut v = Violations::new();
        v.require("firstName", "  ");
        v.require("lastName", "Lee");
        v.require_email("personalEmail", "not-an-email");
        v.optional_email("companyEmail", Some(""));
        v.optional_email("companyEmail", None);

        let errors = v.into_result().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError::new("firstName", "firstName is required"),
                FieldError::new("personalEmail", "must be a valid email address"),
            ]
        );
    }
}
