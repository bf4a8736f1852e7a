/// Configuration validation for startup checks
use crate::error::{AppError, Result};
use tracing::{error, warn};

/// Validation result with specific issues
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.is_valid && other.is_valid;
    }

    /// Logs every collected issue and turns errors into a single `ConfigError`.
    pub fn into_result(self) -> Result<()> {
        for warning in &self.warnings {
            warn!("{}", warning);
        }

        if self.is_valid {
            return Ok(());
        }

        for (i, err) in self.errors.iter().enumerate() {
            error!("  {}. {}", i + 1, err);
        }

        Err(AppError::ConfigError {
            message: self.errors.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_failures() {
        let mut result = ValidationResult::new();
        result.add_warning("minimum exceeds limit".to_string());

        let mut other = ValidationResult::new();
        other.add_error("dirs overlap".to_string());
        result.merge(other);

        assert!(!result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.errors, vec!["dirs overlap".to_string()]);
    }

    #[test]
    fn test_into_result_joins_errors() {
        let mut result = ValidationResult::new();
        result.add_error("first".to_string());
        result.add_error("second".to_string());

        match result.into_result() {
            Err(AppError::ConfigError { message }) => assert_eq!(message, "first; second"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_warnings_alone_pass() {
        let mut result = ValidationResult::new();
        result.add_warning("only a warning".to_string());
        assert!(result.into_result().is_ok());
    }
}
