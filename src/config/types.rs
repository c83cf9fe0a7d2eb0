use serde::Deserialize;

/// Main configuration structure for queryscope
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub engines: Vec<EngineEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page fetches in a crawl batch
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Per-page fetch timeout in seconds
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for fetching a site's robots.txt, in seconds
    #[serde(rename = "robots-timeout-secs", default = "default_robots_timeout")]
    pub robots_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_concurrent_fetches(),
            fetch_timeout_secs: default_fetch_timeout(),
            robots_timeout_secs: default_robots_timeout(),
        }
    }
}

fn default_concurrent_fetches() -> usize {
    4
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_robots_timeout() -> u64 {
    5
}

/// User agent identification configuration
///
/// Every outbound request identifies the crawler so site operators can reach
/// a human about its behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full user-agent string: `Name/Version (+ContactURL; Email)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// A configured answer engine endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EngineEntry {
    /// Engine name as shown in progress and reports (e.g. "chatgpt")
    pub name: String,

    /// Endpoint the analysis request is posted to
    pub endpoint: String,

    /// Per-call timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

fn default_engine_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.fetch_timeout_secs, 15);
        assert_eq!(config.robots_timeout_secs, 5);
    }

    #[test]
    fn test_user_agent_header_value() {
        let config = UserAgentConfig {
            crawler_name: "QueryscopeBot".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "ops@example.com".to_string(),
        };
        assert_eq!(
            config.header_value(),
            "QueryscopeBot/0.1 (+https://example.com/bot; ops@example.com)"
        );
    }
}
