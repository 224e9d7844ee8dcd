//! Input validation for inventory entities
//!
//! Limits here mirror the column sizes in the schema migration.

/// Maximum length of cluster, namespace, application and host names
pub const NAME_MAX: usize = 255;
/// Maximum length of cluster URLs and instance URIs
pub const URL_MAX: usize = 1024;
/// Maximum length of an instance id
pub const INSTANCE_ID_MAX: usize = 512;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {message}")]
    Field { field: String, message: String },
}

impl ValidationError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Validation result
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Name validator
///
/// Names are trimmed-non-empty, bounded, and free of control characters.
pub struct NameValidator {
    field: &'static str,
    max_length: usize,
}

impl NameValidator {
    #[must_use]
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            max_length: NAME_MAX,
        }
    }

    #[must_use]
    pub const fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = max;
        self
    }

    pub fn validate(&self, name: &str) -> ValidationResult<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::field(self.field, "must not be empty"));
        }

        if name.len() > self.max_length {
            return Err(ValidationError::field(
                self.field,
                format!("must be at most {} characters", self.max_length),
            ));
        }

        if name.chars().any(char::is_control) {
            return Err(ValidationError::field(
                self.field,
                "must not contain control characters",
            ));
        }

        Ok(())
    }
}

/// URL validator
///
/// Registry addresses are often written as bare `host:port`; those are
/// checked as if they had an `http://` prefix.
#[derive(Default)]
pub struct UrlValidator {
    require_scheme: bool,
}

impl UrlValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn require_scheme(mut self) -> Self {
        self.require_scheme = true;
        self
    }

    pub fn validate(&self, field: &str, raw: &str) -> ValidationResult<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::field(field, "must not be empty"));
        }
        if raw.len() > URL_MAX {
            return Err(ValidationError::field(
                field,
                format!("must be at most {URL_MAX} characters"),
            ));
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else if self.require_scheme {
            return Err(ValidationError::field(field, "must include a scheme"));
        } else {
            format!("http://{raw}")
        };

        match url::Url::parse(&candidate) {
            Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(()),
            Ok(_) => Err(ValidationError::field(field, "must include a host")),
            Err(_) => Err(ValidationError::field(field, "must be a valid URL")),
        }
    }
}

/// Validate a TCP port carried as a database integer
pub fn validate_port(port: i32) -> ValidationResult<()> {
    if (1..=i32::from(u16::MAX)).contains(&port) {
        Ok(())
    } else {
        Err(ValidationError::field("port", "must be between 1 and 65535"))
    }
}

/// Instance metadata must be a JSON object
pub fn validate_metadata(metadata: &serde_json::Value) -> ValidationResult<()> {
    if metadata.is_object() {
        Ok(())
    } else {
        Err(ValidationError::field("metadata", "must be a JSON object"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validator() {
        let validator = NameValidator::new("name");
        assert!(validator.validate("orders-service").is_ok());
        assert!(validator.validate("   ").is_err());
        assert!(validator.validate("bad\nname").is_err());
        assert!(validator.validate(&"a".repeat(NAME_MAX + 1)).is_err());
    }

    #[test]
    fn test_name_validator_custom_length() {
        let validator = NameValidator::new("instance_id").with_max_length(4);
        assert!(validator.validate("abcd").is_ok());
        let err = validator.validate("abcde").unwrap_err();
        assert_eq!(err.to_string(), "Invalid instance_id: must be at most 4 characters");
    }

    #[test]
    fn test_url_validator_accepts_bare_address() {
        let validator = UrlValidator::new();
        assert!(validator.validate("url", "127.0.0.1:8848").is_ok());
        assert!(validator.validate("url", "https://nacos.example.com/nacos").is_ok());
        assert!(validator.validate("url", "nacos://127.0.0.1").is_ok());
        assert!(validator.validate("url", "").is_err());
        assert!(validator.validate("url", "http://").is_err());
    }

    #[test]
    fn test_url_validator_require_scheme() {
        let validator = UrlValidator::new().require_scheme();
        assert!(validator.validate("uri", "10.0.0.1:8080").is_err());
        assert!(validator.validate("uri", "http://10.0.0.1:8080").is_ok());
    }

    #[test]
    fn test_validate_port() {
        assert!(validate_port(8080).is_ok());
        assert!(validate_port(0).is_err());
        assert!(validate_port(70000).is_err());
    }

    #[test]
    fn test_validate_metadata() {
        assert!(validate_metadata(&serde_json::json!({"zone": "a"})).is_ok());
        assert!(validate_metadata(&serde_json::json!(["zone"])).is_err());
    }

    #[test]
    fn test_converts_to_invalid_input() {
        let err: crate::Error = validate_port(0).unwrap_err().into();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
