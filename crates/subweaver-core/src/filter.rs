// Node quality filter
//
// Drops disqualified records from one source's raw list before anything else
// sees them. All checks are case-insensitive tests over the display label
// only; the `type` check is the sole exception and rejects control constructs
// that are not addressable endpoints.

use regex::Regex;

use crate::model::Node;

/// Outbound kinds that are control constructs, not endpoints.
pub const NON_ENDPOINT_KINDS: [&str; 5] = ["selector", "urltest", "direct", "block", "dns"];

/// Default pattern for cost-inflated nodes: a decimal multiplier of 1.1x or
/// greater written as `<digit>.<digit...>x`. `1.0x` and `1.05x` survive.
pub const DEFAULT_HIGH_RATE_PATTERN: &str = r"(?i)(?:[1-9]\.[1-9]|[2-9]\.\d+)x";

/// Default administrative/placeholder terms that mark non-proxy entries.
pub const DEFAULT_BANNED_KEYWORDS: [&str; 14] = [
    "过期", "剩余", "网址", "官网", "流量", "到期", "重置", "有效", "套餐", "群组", "通知",
    "地址", "购买", "维护",
];

/// Filter policy for one invocation. The defaults match the standard
/// subscription conventions; both patterns are configuration inputs.
///
/// Either check may be disabled: an empty high-rate pattern or an empty
/// keyword list compiles to no matcher at all, never to a match-everything
/// pattern.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    high_rate: Option<Regex>,
    banned: Option<Regex>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_RATE_PATTERN, &DEFAULT_BANNED_KEYWORDS)
            .expect("default filter patterns are valid")
    }
}

impl FilterConfig {
    /// Build a filter from a high-rate regex and a banned-keyword list.
    ///
    /// The keyword list is compiled into a single case-insensitive
    /// alternation; `regex::escape` keeps literal metacharacters safe.
    /// Empty keywords are dropped, and an empty pattern or list disables
    /// that check.
    pub fn new(high_rate_pattern: &str, banned_keywords: &[&str]) -> Result<Self, regex::Error> {
        let high_rate = if high_rate_pattern.is_empty() {
            None
        } else {
            Some(Regex::new(high_rate_pattern)?)
        };

        let alternation = banned_keywords
            .iter()
            .filter(|kw| !kw.is_empty())
            .map(|kw| regex::escape(kw))
            .collect::<Vec<_>>()
            .join("|");
        let banned = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("(?i){alternation}"))?)
        };

        Ok(Self { high_rate, banned })
    }

    /// Whether this record is an addressable endpoint at all.
    fn is_endpoint(node: &Node) -> bool {
        match node.kind.as_deref() {
            Some(kind) => !NON_ENDPOINT_KINDS.contains(&kind),
            None => false,
        }
    }

    /// Whether a single record passes all three checks.
    pub fn accepts(&self, node: &Node) -> bool {
        Self::is_endpoint(node)
            && !self
                .high_rate
                .as_ref()
                .is_some_and(|re| re.is_match(&node.tag))
            && !self.banned.as_ref().is_some_and(|re| re.is_match(&node.tag))
    }

    /// Drop disqualified records, preserving order. Pure and idempotent.
    pub fn filter(&self, nodes: Vec<Node>) -> Vec<Node> {
        nodes.into_iter().filter(|n| self.accepts(n)).collect()
    }
}
