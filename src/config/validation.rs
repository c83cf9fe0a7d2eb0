use crate::config::types::{Config, CrawlerConfig, EngineEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_engines(&config.engines)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 20 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 20, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be >= 1, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.robots_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "robots_timeout_secs must be >= 1, got {}",
            config.robots_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates configured answer engines
fn validate_engines(engines: &[EngineEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in engines {
        if entry.name.is_empty() {
            return Err(ConfigError::Validation(
                "engine name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate engine name '{}'",
                entry.name
            )));
        }

        Url::parse(&entry.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid endpoint for engine '{}': {}",
                entry.name, e
            ))
        })?;

        if entry.timeout_secs < 1 {
            return Err(ConfigError::Validation(format!(
                "timeout_secs for engine '{}' must be >= 1, got {}",
                entry.name, entry.timeout_secs
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_agent() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "QueryscopeBot".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_validate_crawler_config_ranges() {
        let mut config = CrawlerConfig::default();
        assert!(validate_crawler_config(&config).is_ok());

        config.max_concurrent_fetches = 0;
        assert!(validate_crawler_config(&config).is_err());

        config.max_concurrent_fetches = 21;
        assert!(validate_crawler_config(&config).is_err());

        config.max_concurrent_fetches = 20;
        assert!(validate_crawler_config(&config).is_ok());

        config.robots_timeout_secs = 0;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_user_agent_name() {
        let mut ua = test_user_agent();
        assert!(validate_user_agent_config(&ua).is_ok());

        ua.crawler_name = "bad name!".to_string();
        assert!(validate_user_agent_config(&ua).is_err());

        ua.crawler_name = String::new();
        assert!(validate_user_agent_config(&ua).is_err());
    }

    #[test]
    fn test_validate_engines() {
        let engines = vec![
            EngineEntry {
                name: "chatgpt".to_string(),
                endpoint: "https://engines.internal/chatgpt".to_string(),
                timeout_secs: 30,
            },
            EngineEntry {
                name: "claude".to_string(),
                endpoint: "https://engines.internal/claude".to_string(),
                timeout_secs: 30,
            },
        ];
        assert!(validate_engines(&engines).is_ok());
    }

    #[test]
    fn test_validate_engines_rejects_duplicates() {
        let entry = EngineEntry {
            name: "chatgpt".to_string(),
            endpoint: "https://engines.internal/chatgpt".to_string(),
            timeout_secs: 30,
        };
        let engines = vec![entry.clone(), entry];
        assert!(validate_engines(&engines).is_err());
    }

    #[test]
    fn test_validate_engines_rejects_bad_endpoint() {
        let engines = vec![EngineEntry {
            name: "chatgpt".to_string(),
            endpoint: "not a url".to_string(),
            timeout_secs: 30,
        }];
        assert!(validate_engines(&engines).is_err());
    }
}
