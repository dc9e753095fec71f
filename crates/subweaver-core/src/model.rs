// Profile document model
//
// Types for the sing-box template, subscription nodes, and the synthesized
// output. Transport-specific fields (server, port, uuid, tls, ...) are never
// interpreted -- they ride along in a flattened `extra` map so the final
// document carries them through unmodified.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Subscription nodes ───────────────────────────────────────────────

/// A proxy endpoint from a subscription feed.
///
/// Identity is `tag` (unique within one source; the cross-source merge key).
/// `kind` is the outbound protocol (`vmess`, `trojan`, `shadowsocks`, ...)
/// or a control-construct type that the filter stage rejects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tag: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Template ─────────────────────────────────────────────────────────

/// One outbound entry from the base template.
///
/// Selector-typed entries are the destination selectors whose `outbounds`
/// the policy composer overwrites. Everything else (urltest, direct, block,
/// dns, ...) passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateOutbound {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbounds: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateOutbound {
    /// Whether this entry is a rewritable destination selector.
    pub fn is_selector(&self) -> bool {
        self.kind.as_deref() == Some("selector")
    }

    /// Whether this entry is a control construct at all (has a non-empty
    /// type). Untyped entries are dropped from the final document.
    pub fn is_typed(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// The base routing template as fetched. Top-level fields other than
/// `outbounds` (inbounds, route, dns, ...) are preserved verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub outbounds: Vec<TemplateOutbound>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Synthesized groups ───────────────────────────────────────────────

/// A health-checked aggregation of same-region nodes from one source,
/// serialized as a sing-box `urltest` outbound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalGroup {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub outbounds: Vec<String>,
    pub url: String,
    pub interval: String,
    pub tolerance: u32,
    /// Region code this group was synthesized for. Bookkeeping for the
    /// policy composer; not part of the wire format.
    #[serde(skip)]
    pub region: String,
}

// ── Final document ───────────────────────────────────────────────────

/// One entry in the final document's outbound list.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundEntry {
    Template(TemplateOutbound),
    Regional(RegionalGroup),
    Node(Node),
}

/// The finished profile: rewritten template entries, then synthesized
/// regional groups, then the deduplicated global node list.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub outbounds: Vec<OutboundEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn node_transport_fields_round_trip_unmodified() {
        let raw = json!({
            "type": "vmess",
            "tag": "HK-01",
            "server": "1.2.3.4",
            "server_port": 443,
            "uuid": "aaaa-bbbb",
            "tls": { "enabled": true, "server_name": "example.com" }
        });

        let node: Node = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.tag, "HK-01");
        assert_eq!(node.kind.as_deref(), Some("vmess"));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn template_preserves_unknown_top_level_fields() {
        let raw = json!({
            "log": { "level": "warn" },
            "outbounds": [
                { "tag": "sel", "type": "selector", "outbounds": ["a"] }
            ],
            "route": { "final": "sel" }
        });

        let template: Template = serde_json::from_value(raw).unwrap();
        assert_eq!(template.outbounds.len(), 1);
        assert!(template.extra.contains_key("log"));
        assert!(template.extra.contains_key("route"));
    }

    #[test]
    fn selector_detection() {
        let sel: TemplateOutbound =
            serde_json::from_value(json!({ "tag": "s", "type": "selector" })).unwrap();
        let direct: TemplateOutbound =
            serde_json::from_value(json!({ "tag": "d", "type": "direct" })).unwrap();
        let untyped: TemplateOutbound = serde_json::from_value(json!({ "tag": "u" })).unwrap();

        assert!(sel.is_selector() && sel.is_typed());
        assert!(!direct.is_selector() && direct.is_typed());
        assert!(!untyped.is_selector() && !untyped.is_typed());
    }
}
