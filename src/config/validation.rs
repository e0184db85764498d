#![allow(clippy::collapsible_if)]

use std::{net::SocketAddr, path::Path};

use regex::Regex;

use crate::config::models::{RedirectSettings, ServerConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Some(root) = &config.static_root {
            if !Path::new(root).is_dir() {
                errors.push(ValidationError::InvalidField {
                    field: "static_root".to_string(),
                    message: format!("Static root directory '{root}' does not exist"),
                });
            }
        }

        if let Err(mut redirect_errors) = Self::validate_redirect_settings(&config.redirect) {
            errors.append(&mut redirect_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate the redirect section: forced host, every pattern, rule files.
    pub fn validate_redirect_settings(
        settings: &RedirectSettings,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(host) = settings.force_host.as_deref().filter(|h| !h.is_empty()) {
            if let Err(e) = Self::validate_host(host) {
                errors.push(e);
            }
        }

        let ignore_patterns = [
            ("force_lower_case_ignore", &settings.force_lower_case_ignore),
            (
                "force_trailing_slash_ignore",
                &settings.force_trailing_slash_ignore,
            ),
            (
                "force_no_trailing_slash_ignore",
                &settings.force_no_trailing_slash_ignore,
            ),
        ];
        for (field, pattern) in ignore_patterns {
            if let Some(pattern) = pattern.as_deref().filter(|p| !p.is_empty()) {
                if let Err(e) = Self::validate_pattern(field, pattern) {
                    errors.push(e);
                }
            }
        }

        for (i, entry) in settings.regex_redirects.iter().enumerate() {
            if let Err(e) =
                Self::validate_pattern(&format!("regex_redirects[{i}].pattern"), &entry.pattern)
            {
                errors.push(e);
            }
        }

        for (path, target) in &settings.redirects {
            if !path.starts_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("redirects '{path}'"),
                    message: "Redirect paths must start with '/'".to_string(),
                });
            }
            if target.is_empty() {
                errors.push(ValidationError::MissingField {
                    field: format!("redirects '{path}' target"),
                });
            }
        }

        let files = [
            ("redirects_file", &settings.redirects_file),
            ("regex_redirects_file", &settings.regex_redirects_file),
        ];
        for (field, file) in files {
            if let Some(file) = file.as_deref().filter(|f| !f.is_empty()) {
                if !Path::new(file).is_file() {
                    errors.push(ValidationError::InvalidField {
                        field: field.to_string(),
                        message: format!("Rule file '{file}' does not exist"),
                    });
                }
            }
        }

        if settings.force_trailing_slash && settings.force_no_trailing_slash {
            tracing::warn!(
                "force_trailing_slash and force_no_trailing_slash are both enabled; the trailing slash policy takes precedence"
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// A forced host is a bare `host[:port]`, without scheme or path
    fn validate_host(host: &str) -> ValidationResult<()> {
        if host.contains("://") || host.contains('/') {
            return Err(ValidationError::InvalidField {
                field: "force_host".to_string(),
                message: format!("'{host}' must be a host name without scheme or path"),
            });
        }

        if let Err(e) = url::Url::parse(&format!("http://{host}/")) {
            return Err(ValidationError::InvalidField {
                field: "force_host".to_string(),
                message: format!("'{host}' is not a valid host: {e}"),
            });
        }

        Ok(())
    }

    fn validate_pattern(field: &str, pattern: &str) -> ValidationResult<()> {
        Regex::new(pattern)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("Invalid regular expression '{pattern}': {e}"),
            })
    }

    /// Format multiple errors into a readable string
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .enumerate()
            .map(|(i, e)| format!("  {}. {}", i + 1, e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::RegexRedirectEntry;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = ServerConfig {
            listen_addr: "localhost".to_string(),
            ..Default::default()
        };

        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address"));
    }

    #[test]
    fn test_host_with_scheme_rejected() {
        let mut config = ServerConfig::default();
        config.redirect.force_host = Some("https://www.foo.com".to_string());

        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("force_host"));
    }

    #[test]
    fn test_host_with_port_accepted() {
        let mut config = ServerConfig::default();
        config.redirect.force_host = Some("www.foo.com:8443".to_string());

        assert!(ServerConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_host_means_disabled() {
        let mut config = ServerConfig::default();
        config.redirect.force_host = Some(String::new());

        assert!(ServerConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_all_invalid_patterns_reported() {
        let mut config = ServerConfig::default();
        config.redirect.force_lower_case_ignore = Some("(".to_string());
        config.redirect.regex_redirects = vec![RegexRedirectEntry {
            pattern: "[".to_string(),
            replacement: "/".to_string(),
        }];

        let errors =
            ServerConfigValidator::validate_redirect_settings(&config.redirect).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_rule_file_reported() {
        let mut config = ServerConfig::default();
        config.redirect.regex_redirects_file = Some("/no/such/regex.csv".to_string());

        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("regex_redirects_file"));
    }
}
