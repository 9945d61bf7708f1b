use super::{types::Config, ConfigError, StoreBackend};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Agent id is not blank
/// - Simulation failure rate and delay range are sane
/// - Remote backend has a URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.agent.id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "agent.id cannot be empty".to_string(),
        ));
    }

    if let Some(sim) = &config.store.simulation {
        if !(0.0..=1.0).contains(&sim.failure_rate) {
            return Err(ConfigError::ValidationError(format!(
                "store.simulation.failure_rate must be between 0 and 1, got {}",
                sim.failure_rate
            )));
        }
        if sim.min_delay_ms > sim.max_delay_ms {
            return Err(ConfigError::ValidationError(format!(
                "store.simulation.min_delay_ms ({}) exceeds max_delay_ms ({})",
                sim.min_delay_ms, sim.max_delay_ms
            )));
        }
    }

    if config.store.backend == StoreBackend::Remote {
        match &config.store.remote {
            Some(remote) if !remote.url.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "store.remote.url is required when store.backend = \"remote\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}
