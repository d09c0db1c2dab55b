//! Configuration validation.
//!
//! Serde handles the syntax; this pass checks values and returns every
//! problem found rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(field, format!("unsupported scheme '{}'", url.scheme()))),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid url '{}': {}", value, e))),
    }
}

fn check_addr(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{}'", value)));
    }
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(endpoint) = &config.network.lcd_endpoint {
        check_url("network.lcd_endpoint", endpoint, &mut errors);
    }
    for endpoint in &config.network.failover_endpoints {
        check_url("network.failover_endpoints", endpoint, &mut errors);
    }
    if config.network.gas_price == Some(0) {
        errors.push(ValidationError::new("network.gas_price", "must be greater than zero"));
    }

    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be greater than zero"));
    }
    if config.node.timeout_height_offset == 0 {
        errors.push(ValidationError::new("node.timeout_height_offset", "must be greater than zero"));
    }

    if config.dispatch.retry_base_delay_ms > config.dispatch.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "dispatch.retry_base_delay_ms",
            "must not exceed dispatch.retry_max_delay_ms",
        ));
    }

    check_addr("server.bind_address", &config.server.bind_address, &mut errors);
    if config.server.request_timeout_secs < config.node.rpc_timeout_secs {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be at least node.rpc_timeout_secs",
        ));
    }

    if config.observability.metrics_enabled {
        check_addr("observability.metrics_address", &config.observability.metrics_address, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
