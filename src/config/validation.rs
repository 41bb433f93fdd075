//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServiceConfig -> Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServiceConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("http.bind_address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("http.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("realtime.host must not be empty")]
    EmptyRealtimeHost,

    #[error("realtime.port must be within 1..=65535")]
    InvalidRealtimePort,

    #[error("realtime.max_connections must be greater than zero")]
    ZeroConnectionLimit,

    #[error("auth.bearer_token must not be empty when set")]
    EmptyBearerToken,

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Run every semantic check and report all failures together.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.http.bind_address.clone(),
        ));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.http.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.realtime.host.trim().is_empty() {
        errors.push(ValidationError::EmptyRealtimeHost);
    }
    if config.realtime.port == 0 {
        errors.push(ValidationError::InvalidRealtimePort);
    }
    if config.realtime.max_connections == 0 {
        errors.push(ValidationError::ZeroConnectionLimit);
    }

    if matches!(config.auth.bearer_token.as_deref(), Some(token) if token.trim().is_empty()) {
        errors.push(ValidationError::EmptyBearerToken);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn all_errors_are_reported_together() {
        let mut config = ServiceConfig::default();
        config.http.bind_address = "not-an-address".to_string();
        config.http.request_timeout_secs = 0;
        config.realtime.port = 0;
        config.auth.bearer_token = Some("   ".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn metrics_address_is_ignored_when_metrics_are_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nope".to_string();

        assert!(validate_config(&config).is_ok());
    }
}
