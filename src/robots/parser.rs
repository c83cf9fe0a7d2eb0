//! Robots.txt parser
//!
//! Deliberately minimal: only `Disallow:` rules inside the `User-agent: *`
//! section are honored, matched as plain path prefixes. Wildcard patterns,
//! `$` anchors, `Allow:` overrides, crawl delays and sitemap directives are
//! ignored. A bare `Disallow: /` is also ignored, since in practice it is
//! almost always accidental over-blocking.

/// Parsed robots.txt rules for a single site
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Path prefixes disallowed for all user agents
    disallow: Vec<String>,
}

impl RobotsRules {
    /// Parses robots.txt content into a set of disallowed path prefixes
    ///
    /// The scan tracks whether the current line sits inside a section opened
    /// by a `User-agent: *` directive; any other `User-agent:` line closes
    /// that section. Only `Disallow:` values seen inside the wildcard section
    /// are collected.
    pub fn parse(content: &str) -> Self {
        let mut disallow = Vec::new();
        let mut in_wildcard_section = false;

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim();

                match key.as_str() {
                    "user-agent" => {
                        in_wildcard_section = value == "*";
                    }
                    "disallow" if in_wildcard_section => {
                        // A bare "/" would block the whole site; treated as
                        // accidental and intentionally not honored.
                        if !value.is_empty() && value != "/" {
                            disallow.push(value.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        Self { disallow }
    }

    /// Checks whether a URL path is allowed under the collected rules
    ///
    /// A path is disallowed iff it starts with any collected `Disallow:`
    /// prefix. No pattern matching is performed.
    pub fn is_path_allowed(&self, path: &str) -> bool {
        !self.disallow.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Returns the first disallow prefix matching the path, if any
    pub fn matching_rule(&self, path: &str) -> Option<&str> {
        self.disallow
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .map(|s| s.as_str())
    }

    /// Number of collected disallow rules
    pub fn rule_count(&self) -> usize {
        self.disallow.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_allows_all() {
        let rules = RobotsRules::parse("");
        assert!(rules.is_path_allowed("/"));
        assert!(rules.is_path_allowed("/any/path"));
        assert_eq!(rules.rule_count(), 0);
    }

    #[test]
    fn test_no_wildcard_section_allows_all() {
        let content = "User-agent: BadBot\nDisallow: /private";
        let rules = RobotsRules::parse(content);
        assert!(rules.is_path_allowed("/private"));
        assert!(rules.is_path_allowed("/private/anything"));
    }

    #[test]
    fn test_disallow_prefix_match() {
        let content = "User-agent: *\nDisallow: /admin";
        let rules = RobotsRules::parse(content);
        assert!(rules.is_path_allowed("/"));
        assert!(rules.is_path_allowed("/page"));
        assert!(!rules.is_path_allowed("/admin"));
        assert!(!rules.is_path_allowed("/admin/users"));
        assert!(!rules.is_path_allowed("/administration"));
    }

    #[test]
    fn test_bare_slash_never_blocks() {
        let content = "User-agent: *\nDisallow: /";
        let rules = RobotsRules::parse(content);
        assert!(rules.is_path_allowed("/"));
        assert!(rules.is_path_allowed("/page"));
        assert_eq!(rules.rule_count(), 0);
    }

    #[test]
    fn test_other_user_agent_closes_wildcard_section() {
        let content = "User-agent: *\nDisallow: /a\nUser-agent: BadBot\nDisallow: /b";
        let rules = RobotsRules::parse(content);
        assert!(!rules.is_path_allowed("/a"));
        assert!(rules.is_path_allowed("/b"));
    }

    #[test]
    fn test_wildcard_section_reopens() {
        let content = "User-agent: BadBot\nDisallow: /b\nUser-agent: *\nDisallow: /a";
        let rules = RobotsRules::parse(content);
        assert!(!rules.is_path_allowed("/a"));
        assert!(rules.is_path_allowed("/b"));
    }

    #[test]
    fn test_case_insensitive_directives() {
        let content = "USER-AGENT: *\nDISALLOW: /secret";
        let rules = RobotsRules::parse(content);
        assert!(!rules.is_path_allowed("/secret"));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let content = "# policy\nUser-agent: *\n\n# keep out\nDisallow: /tmp\n";
        let rules = RobotsRules::parse(content);
        assert!(!rules.is_path_allowed("/tmp"));
        assert!(rules.is_path_allowed("/"));
    }

    #[test]
    fn test_empty_disallow_ignored() {
        let content = "User-agent: *\nDisallow:";
        let rules = RobotsRules::parse(content);
        assert!(rules.is_path_allowed("/anything"));
        assert_eq!(rules.rule_count(), 0);
    }

    #[test]
    fn test_allow_directives_ignored() {
        // Allow overrides are out of scope; the prefix still blocks.
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let rules = RobotsRules::parse(content);
        assert!(!rules.is_path_allowed("/private/public"));
    }

    #[test]
    fn test_matching_rule() {
        let content = "User-agent: *\nDisallow: /a\nDisallow: /b";
        let rules = RobotsRules::parse(content);
        assert_eq!(rules.matching_rule("/b/page"), Some("/b"));
        assert_eq!(rules.matching_rule("/c"), None);
    }

    #[test]
    fn test_garbage_content_allows_all() {
        let rules = RobotsRules::parse("This is not valid robots.txt {{{");
        assert!(rules.is_path_allowed("/any/path"));
    }
}
