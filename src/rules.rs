//! Strategy rule table for request classification
//!
//! Rules are an explicit ordered list evaluated top to bottom; the first
//! matching pattern wins and an implicit network-first default applies when
//! nothing matches. Patterns match against the request path only, never the
//! query string.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The caching algorithm to apply to a classified request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache, refresh in the background
    CacheFirst,
    /// Try the network, fall back to cache
    NetworkFirst,
    /// Serve stale from cache while revalidating
    StaleWhileRevalidate,
}

impl Strategy {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

/// A pattern an inbound request path is matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePattern {
    /// Path ends with a dot followed by one of these extensions
    Suffix(Vec<String>),
    /// First path component is one of these section names
    Section(Vec<String>),
    /// Path starts with this prefix
    Prefix(String),
}

impl RulePattern {
    /// Check whether this pattern matches a request path
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RulePattern::Suffix(extensions) => {
                let ext = match path.rsplit_once('.') {
                    Some((_, ext)) => ext,
                    None => return false,
                };
                extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            }
            RulePattern::Section(sections) => sections.iter().any(|section| {
                let trimmed = path.strip_prefix('/').unwrap_or(path);
                trimmed == section.as_str()
                    || trimmed.starts_with(&format!("{}/", section))
            }),
            RulePattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// An ordered (pattern, strategy, max-age) tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRule {
    /// Pattern matched against the request path
    pub pattern: RulePattern,
    /// Strategy applied on match
    pub strategy: Strategy,
    /// Freshness hint in seconds; entries older than this are treated as
    /// misses on lookup
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl StrategyRule {
    /// The rule's max-age hint as a Duration
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_secs.map(Duration::from_secs)
    }
}

/// The outcome of classifying a request against the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub strategy: Strategy,
    pub max_age: Option<Duration>,
}

/// Ordered list of strategy rules, first match wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub rules: Vec<StrategyRule>,
    /// Applied when no rule matches
    #[serde(default = "default_strategy")]
    pub default_strategy: Strategy,
}

fn default_strategy() -> Strategy {
    Strategy::NetworkFirst
}

const STATIC_SUFFIXES: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "woff", "woff2", "ttf", "eot",
];

const CONTENT_SECTIONS: &[&str] = &["posts", "resources", "roadmap"];

const SECS_PER_DAY: u64 = 24 * 60 * 60;

impl RuleTable {
    /// The built-in rule table: static assets cache-first for 30 days,
    /// content pages network-first for 1 day, API paths network-first for
    /// 1 hour, everything else network-first.
    pub fn builtin() -> Self {
        RuleTable {
            rules: vec![
                StrategyRule {
                    pattern: RulePattern::Suffix(
                        STATIC_SUFFIXES.iter().map(|s| s.to_string()).collect(),
                    ),
                    strategy: Strategy::CacheFirst,
                    max_age_secs: Some(30 * SECS_PER_DAY),
                },
                StrategyRule {
                    pattern: RulePattern::Section(
                        CONTENT_SECTIONS.iter().map(|s| s.to_string()).collect(),
                    ),
                    strategy: Strategy::NetworkFirst,
                    max_age_secs: Some(SECS_PER_DAY),
                },
                StrategyRule {
                    pattern: RulePattern::Prefix("/api/".to_string()),
                    strategy: Strategy::NetworkFirst,
                    max_age_secs: Some(60 * 60),
                },
            ],
            default_strategy: Strategy::NetworkFirst,
        }
    }

    /// Classify a request path, first matching rule wins
    pub fn classify(&self, path: &str) -> Classification {
        for rule in &self.rules {
            if rule.pattern.matches(path) {
                return Classification {
                    strategy: rule.strategy,
                    max_age: rule.max_age(),
                };
            }
        }
        Classification {
            strategy: self.default_strategy,
            max_age: None,
        }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}
