//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the listen URI and value ranges
//! - Check that the served root exists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.listen {value:?} is invalid: {reason}")]
    InvalidListen { value: String, reason: String },
    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("server.root {0:?} is not a directory")]
    RootNotDirectory(PathBuf),
    #[error("server.templates.pattern {pattern:?} is invalid: {reason}")]
    InvalidTemplatePattern { pattern: String, reason: String },
    #[error("logging.level {level:?} is invalid: {reason}")]
    InvalidLogLevel { level: String, reason: String },
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if let Err(e) = server.listen_spec() {
        errors.push(ValidationError::InvalidListen {
            value: server.listen.clone(),
            reason: e.to_string(),
        });
    }

    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if !server.root.is_dir() {
        errors.push(ValidationError::RootNotDirectory(server.root.clone()));
    }

    if let Some(templates) = &server.templates {
        if let Err(e) = glob::Pattern::new(&templates.pattern) {
            errors.push(ValidationError::InvalidTemplatePattern {
                pattern: templates.pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.logging.level.clone(),
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
