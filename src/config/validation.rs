//! Configuration validation.
//!
//! Semantic checks on top of what Serde already guarantees syntactically.
//! Validation is a pure function over the policy table and returns every
//! violation found, not just the first, so a misconfigured service fails
//! startup with the complete list. Runs before a policy table is accepted
//! by the executor.

use crate::config::schema::{ResilienceConfig, ResiliencePolicies};
use crate::error::{ConfigError, ValidationError};

/// Validate a whole policy table: the default policy plus every override.
pub fn validate_policies(policies: &ResiliencePolicies) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    collect_config_errors("default", &policies.default, &mut errors);
    for (service, config) in &policies.services {
        collect_config_errors(&format!("services.{service}"), config, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

/// Validate a single per-service policy bundle.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    collect_config_errors("", config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

fn collect_config_errors(prefix: &str, config: &ResilienceConfig, out: &mut Vec<ValidationError>) {
    let field = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    };

    let b = &config.breaker;
    if b.failure_threshold == 0 {
        out.push(ValidationError::new(
            field("breaker.failure_threshold"),
            "must be positive",
        ));
    }
    if b.timeout_secs == 0 {
        out.push(ValidationError::new(
            field("breaker.timeout_secs"),
            "must be positive",
        ));
    }
    if b.max_half_open_requests == 0 {
        out.push(ValidationError::new(
            field("breaker.max_half_open_requests"),
            "must be positive",
        ));
    }
    if b.success_threshold == 0 {
        out.push(ValidationError::new(
            field("breaker.success_threshold"),
            "must be positive",
        ));
    }
    if !(b.failure_ratio > 0.0 && b.failure_ratio <= 1.0) {
        out.push(ValidationError::new(
            field("breaker.failure_ratio"),
            "must be within (0.0, 1.0]",
        ));
    }
    if b.min_requests == 0 {
        out.push(ValidationError::new(
            field("breaker.min_requests"),
            "must be positive",
        ));
    }

    let h = &config.health_check;
    if h.interval_secs == 0 {
        out.push(ValidationError::new(
            field("health_check.interval_secs"),
            "must be positive",
        ));
    }
    if h.timeout_secs == 0 {
        out.push(ValidationError::new(
            field("health_check.timeout_secs"),
            "must be positive",
        ));
    }
    if h.deregister_after_secs == 0 {
        out.push(ValidationError::new(
            field("health_check.deregister_after_secs"),
            "must be positive",
        ));
    }
    if h.unhealthy_threshold == 0 {
        out.push(ValidationError::new(
            field("health_check.unhealthy_threshold"),
            "must be positive",
        ));
    }
    if h.healthy_threshold == 0 {
        out.push(ValidationError::new(
            field("health_check.healthy_threshold"),
            "must be positive",
        ));
    }

    let f = &config.failover;
    if f.max_retries == 0 {
        out.push(ValidationError::new(
            field("failover.max_retries"),
            "must be positive",
        ));
    }
}
