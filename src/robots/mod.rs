//! Crawl policy checking
//!
//! Fetches a site's robots.txt and decides per-URL fetch permission. The
//! checker **fails open**: if the policy document cannot be retrieved
//! (non-success status, timeout, network error, malformed URL), the URL is
//! allowed and the decision records why. Absence of a policy, or inability to
//! check it, must never itself block crawling — this favors availability over
//! strict compliance and is covered by tests.

mod parser;

pub use parser::RobotsRules;

use crate::config::CrawlerConfig;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Permission decision for a single URL
///
/// Produced once per batch; never cached across batches, so policy changes
/// take effect on the next batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDecision {
    /// Whether the URL may be fetched
    pub allowed: bool,

    /// Why the decision fell out this way (fallbacks and denials only)
    pub reason: Option<String>,

    /// The raw robots.txt content, when it was retrieved
    pub raw_policy: Option<String>,
}

impl PolicyDecision {
    fn fail_open(reason: String) -> Self {
        Self {
            allowed: true,
            reason: Some(reason),
            raw_policy: None,
        }
    }
}

/// Checks whether a single URL may be fetched under its site's crawl policy
///
/// Requests `{origin}/robots.txt` with the configured timeout. The client is
/// expected to carry the identifying user-agent (see
/// [`crate::crawler::build_http_client`]).
pub async fn check_policy(client: &Client, config: &CrawlerConfig, url: &str) -> PolicyDecision {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return PolicyDecision::fail_open(format!("could not parse URL: {}", e));
        }
    };

    let (rules, raw) = match fetch_rules(client, config, &parsed).await {
        Ok(fetched) => fetched,
        Err(reason) => {
            tracing::debug!(url = %url, %reason, "robots.txt unavailable, allowing");
            return PolicyDecision::fail_open(reason);
        }
    };

    decide(&rules, raw, parsed.path())
}

/// Checks a batch of URLs, keyed by input URL
///
/// The policy document is fetched once per distinct origin; all origin
/// fetches run concurrently with no shared cap. One URL's failure never
/// affects another's decision.
pub async fn check_policy_batch(
    client: &Client,
    config: &CrawlerConfig,
    urls: &[String],
) -> HashMap<String, PolicyDecision> {
    // Group parseable URLs by origin so each robots.txt is fetched once.
    let mut by_origin: HashMap<String, Url> = HashMap::new();
    for url in urls {
        if let Ok(parsed) = Url::parse(url) {
            by_origin
                .entry(parsed.origin().ascii_serialization())
                .or_insert(parsed);
        }
    }

    let fetches = by_origin.iter().map(|(origin, sample)| async move {
        let fetched = fetch_rules(client, config, sample).await;
        (origin.clone(), fetched)
    });
    let fetched: HashMap<String, Result<(RobotsRules, Option<String>), String>> =
        join_all(fetches).await.into_iter().collect();

    let mut decisions = HashMap::with_capacity(urls.len());
    for url in urls {
        let decision = match Url::parse(url) {
            Err(e) => PolicyDecision::fail_open(format!("could not parse URL: {}", e)),
            Ok(parsed) => {
                let origin = parsed.origin().ascii_serialization();
                match fetched.get(&origin) {
                    Some(Ok((rules, raw))) => decide(rules, raw.clone(), parsed.path()),
                    Some(Err(reason)) => PolicyDecision::fail_open(reason.clone()),
                    // Unreachable for parseable URLs, but never block on it.
                    None => PolicyDecision::fail_open("policy check missing".to_string()),
                }
            }
        };
        decisions.insert(url.clone(), decision);
    }

    decisions
}

/// Fetches and parses `{origin}/robots.txt`
///
/// Returns the parsed rules and the raw document, or a human-readable reason
/// the document could not be retrieved.
async fn fetch_rules(
    client: &Client,
    config: &CrawlerConfig,
    url: &Url,
) -> Result<(RobotsRules, Option<String>), String> {
    let robots_url = url
        .join("/robots.txt")
        .map_err(|e| format!("could not derive robots.txt URL: {}", e))?;

    tracing::debug!(robots_url = %robots_url, "fetching crawl policy");

    let response = client
        .get(robots_url.clone())
        .timeout(Duration::from_secs(config.robots_timeout_secs))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                format!("timed out fetching {}", robots_url)
            } else {
                format!("could not fetch {}: {}", robots_url, e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        // Any non-success response is treated identically to "no policy".
        return Err(format!("robots.txt returned HTTP {}", status.as_u16()));
    }

    let content = response
        .text()
        .await
        .map_err(|e| format!("could not read robots.txt body: {}", e))?;

    Ok((RobotsRules::parse(&content), Some(content)))
}

fn decide(rules: &RobotsRules, raw_policy: Option<String>, path: &str) -> PolicyDecision {
    match rules.matching_rule(path) {
        Some(rule) => PolicyDecision {
            allowed: false,
            reason: Some(format!("path {} matches Disallow: {}", path, rule)),
            raw_policy,
        },
        None => PolicyDecision {
            allowed: true,
            reason: None,
            raw_policy,
        },
    }
}
