// Final assembly
//
// Orders the finished document: rewritten template control constructs first,
// then synthesized regional groups, then the deduplicated global node list.
// Node internals are never touched here.

use indexmap::IndexSet;

use crate::model::{Node, OutboundEntry, Profile, RegionalGroup, Template};

/// Merge everything into the final document.
///
/// Deduplication keys on node tag identity; the first occurrence in merge
/// order across sources wins and later duplicates are dropped silently.
/// Untyped template entries are discarded.
pub fn assemble(template: Template, groups: Vec<RegionalGroup>, nodes: Vec<Node>) -> Profile {
    let mut seen: IndexSet<String> = IndexSet::with_capacity(nodes.len());
    let unique_nodes: Vec<Node> = nodes
        .into_iter()
        .filter(|n| seen.insert(n.tag.clone()))
        .collect();

    let mut outbounds: Vec<OutboundEntry> = template
        .outbounds
        .into_iter()
        .filter(|entry| entry.is_typed())
        .map(OutboundEntry::Template)
        .collect();
    outbounds.extend(groups.into_iter().map(OutboundEntry::Regional));
    outbounds.extend(unique_nodes.into_iter().map(OutboundEntry::Node));

    Profile {
        outbounds,
        extra: template.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn node(tag: &str) -> Node {
        Node {
            kind: Some("vmess".to_owned()),
            tag: tag.to_owned(),
            extra: serde_json::Map::new(),
        }
    }

    fn group(tag: &str) -> RegionalGroup {
        RegionalGroup {
            tag: tag.to_owned(),
            kind: "urltest".to_owned(),
            outbounds: vec!["HK-01".to_owned()],
            url: "https://www.gstatic.com/generate_204".to_owned(),
            interval: "3m".to_owned(),
            tolerance: 150,
            region: "HK".to_owned(),
        }
    }

    #[test]
    fn ordering_is_template_then_groups_then_nodes() {
        let template: Template = serde_json::from_value(json!({
            "outbounds": [
                { "tag": "sel", "type": "selector", "outbounds": ["x"] },
                { "tag": "direct", "type": "direct" }
            ]
        }))
        .unwrap();

        let profile = assemble(template, vec![group("🇭🇰 HK-a")], vec![node("HK-01")]);
        let tags: Vec<&str> = profile
            .outbounds
            .iter()
            .map(|entry| match entry {
                OutboundEntry::Template(t) => t.tag.as_str(),
                OutboundEntry::Regional(g) => g.tag.as_str(),
                OutboundEntry::Node(n) => n.tag.as_str(),
            })
            .collect();

        assert_eq!(tags, ["sel", "direct", "🇭🇰 HK-a", "HK-01"]);
    }

    #[test]
    fn cross_source_duplicate_tags_first_wins() {
        let template: Template = serde_json::from_value(json!({ "outbounds": [] })).unwrap();

        let mut first = node("HK-01");
        first
            .extra
            .insert("server".to_owned(), json!("first.example"));
        let mut second = node("HK-01");
        second
            .extra
            .insert("server".to_owned(), json!("second.example"));

        let profile = assemble(template, vec![], vec![first, second, node("HK-02")]);

        assert_eq!(profile.outbounds.len(), 2);
        let OutboundEntry::Node(kept) = &profile.outbounds[0] else {
            panic!("expected a node entry");
        };
        assert_eq!(kept.tag, "HK-01");
        assert_eq!(kept.extra["server"], json!("first.example"));
    }

    #[test]
    fn untyped_template_entries_are_dropped() {
        let template: Template = serde_json::from_value(json!({
            "outbounds": [
                { "tag": "typed", "type": "selector" },
                { "tag": "untyped" },
                { "tag": "empty", "type": "" }
            ]
        }))
        .unwrap();

        let profile = assemble(template, vec![], vec![]);
        assert_eq!(profile.outbounds.len(), 1);
    }

    #[test]
    fn template_extra_fields_survive_into_the_profile() {
        let template: Template = serde_json::from_value(json!({
            "outbounds": [],
            "route": { "final": "sel" }
        }))
        .unwrap();

        let profile = assemble(template, vec![], vec![]);
        let rendered = serde_json::to_value(&profile).unwrap();
        assert_eq!(rendered["route"]["final"], json!("sel"));
    }
}
