// Group synthesis
//
// For every (source, region) pair with at least one matching node, emit one
// `urltest` aggregation group. Sources are processed independently: a source
// contributing nothing for a region never suppresses another source's group
// for the same region.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::{Node, RegionalGroup};
use crate::region::RegionTable;

/// Health-check parameters stamped onto every synthesized group. These are
/// policy constants handed to the downstream engine, not anything this
/// service measures itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub url: String,
    pub interval: String,
    pub tolerance: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            url: "https://www.gstatic.com/generate_204".to_owned(),
            interval: "3m".to_owned(),
            tolerance: 150,
        }
    }
}

/// Synthesize one source's regional groups.
///
/// Member tags are unique with insertion order preserved (first occurrence
/// wins). Regions with no matching nodes emit no group. The group label is
/// `"<flag> <REGION>-<source>"`.
pub fn synthesize(
    source: &str,
    nodes: &[Node],
    regions: &RegionTable,
    health: &HealthCheck,
) -> Vec<RegionalGroup> {
    let mut groups = Vec::new();

    for code in regions.codes() {
        let members: IndexSet<&str> = nodes
            .iter()
            .filter(|n| regions.matches(code, &n.tag))
            .map(|n| n.tag.as_str())
            .collect();

        if members.is_empty() {
            continue;
        }

        // Regions configured without a flag glyph get a plain label.
        let tag = match regions.flag(code) {
            "" => format!("{code}-{source}"),
            flag => format!("{flag} {code}-{source}"),
        };

        groups.push(RegionalGroup {
            tag,
            kind: "urltest".to_owned(),
            outbounds: members.into_iter().map(str::to_owned).collect(),
            url: health.url.clone(),
            interval: health.interval.clone(),
            tolerance: health.tolerance,
            region: code.to_owned(),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(tag: &str) -> Node {
        Node {
            kind: Some("vmess".to_owned()),
            tag: tag.to_owned(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn emits_one_group_per_matching_region() {
        let nodes = vec![node("HK-01"), node("HK-02"), node("US LAX 01")];
        let groups = synthesize("acme", &nodes, &RegionTable::default(), &HealthCheck::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tag, "\u{1f1ed}\u{1f1f0} HK-acme");
        assert_eq!(groups[0].outbounds, vec!["HK-01", "HK-02"]);
        assert_eq!(groups[0].region, "HK");
        assert_eq!(groups[1].tag, "\u{1f1fa}\u{1f1f8} US-acme");
        assert_eq!(groups[1].outbounds, vec!["US LAX 01"]);
    }

    #[test]
    fn duplicate_tags_collapse_first_wins() {
        let nodes = vec![node("HK-01"), node("HK-01"), node("HK-02")];
        let groups = synthesize("acme", &nodes, &RegionTable::default(), &HealthCheck::default());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].outbounds, vec!["HK-01", "HK-02"]);
    }

    #[test]
    fn multi_region_node_joins_every_matching_group() {
        let nodes = vec![node("HK-SIN relay")];
        let groups = synthesize("acme", &nodes, &RegionTable::default(), &HealthCheck::default());

        let regions: Vec<&str> = groups.iter().map(|g| g.region.as_str()).collect();
        assert_eq!(regions, vec!["HK", "SG"]);
        assert!(groups.iter().all(|g| g.outbounds == vec!["HK-SIN relay"]));
    }

    #[test]
    fn empty_region_emits_no_group() {
        let nodes = vec![node("Frankfurt 01")];
        let groups = synthesize("acme", &nodes, &RegionTable::default(), &HealthCheck::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn flagless_region_label_has_no_leading_space() {
        let keywords: indexmap::IndexMap<String, Vec<String>> =
            [("DE".to_owned(), vec!["FRANKFURT".to_owned()])]
                .into_iter()
                .collect();
        let regions = RegionTable::new(keywords, indexmap::IndexMap::new());

        let groups = synthesize(
            "acme",
            &[node("Frankfurt 01")],
            &regions,
            &HealthCheck::default(),
        );

        assert_eq!(groups[0].tag, "DE-acme");
    }

    #[test]
    fn groups_carry_health_check_parameters() {
        let health = HealthCheck {
            url: "https://probe.example/204".to_owned(),
            interval: "5m".to_owned(),
            tolerance: 200,
        };
        let groups = synthesize("acme", &[node("JP-01")], &RegionTable::default(), &health);

        assert_eq!(groups[0].url, "https://probe.example/204");
        assert_eq!(groups[0].interval, "5m");
        assert_eq!(groups[0].tolerance, 200);
        assert_eq!(groups[0].kind, "urltest");
    }
}
