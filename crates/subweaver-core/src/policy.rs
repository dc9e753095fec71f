// Policy composition
//
// Each destination selector in the template is rewritten exactly once from a
// declarative rule table: destination tag -> composition recipe. The table is
// total by construction -- an unmatched selector falls back to the full
// regional fan-out, never to an empty list.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::model::Template;

/// How a destination selector's member list is supplemented beyond the
/// anchor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Recipe {
    /// Every synthesized regional group, across all sources and regions.
    FanOut,
    /// Only the named regions' groups.
    Regions { regions: Vec<String> },
    /// A literal direct reference, then the named regions' groups.
    DirectPlusRegions { regions: Vec<String> },
    /// A literal direct reference and nothing else.
    DirectOnly,
    /// The anchor alone (catch-all / fallback destinations).
    AnchorOnly,
}

/// Per-destination composition rules.
///
/// `master_tag` names the selector that receives the full fan-out plus the
/// miscellaneous pool, and doubles as the anchor entry prepended to every
/// other selector. `direct_tag` is the literal reference used by the
/// direct-flavored recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub master_tag: String,
    pub direct_tag: String,
    #[serde(default)]
    pub rules: IndexMap<String, Recipe>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let rules = [
            ("🦚 PeacockTV", Recipe::Regions { regions: vec!["US".into()] }),
            ("🅾️ OpenAI", Recipe::Regions { regions: vec!["US".into()] }),
            ("🌀 Hamivideo", Recipe::Regions { regions: vec!["TW".into()] }),
            ("📹️ Viu", Recipe::Regions { regions: vec!["HK".into()] }),
            (
                "🎞 Emby",
                Recipe::DirectPlusRegions {
                    regions: vec!["HK".into(), "SG".into(), "US".into()],
                },
            ),
            ("🍎 Apple", Recipe::DirectOnly),
            ("🐧 Tencent", Recipe::DirectOnly),
            ("🐟 漏网之鱼", Recipe::AnchorOnly),
            ("🌐 GLOBAL", Recipe::AnchorOnly),
        ];

        Self {
            master_tag: "🗽 节点选择".to_owned(),
            direct_tag: "🎯 全球直连".to_owned(),
            rules: rules
                .into_iter()
                .map(|(tag, recipe)| (tag.to_owned(), recipe))
                .collect(),
        }
    }
}

impl PolicyTable {
    /// Recipe for a destination tag; unmatched tags get the full fan-out.
    pub fn recipe_for(&self, tag: &str) -> &Recipe {
        self.rules.get(tag).unwrap_or(&Recipe::FanOut)
    }

    /// Every region code referenced by any rule, for table validation
    /// against the keyword table (no orphan codes).
    pub fn referenced_regions(&self) -> IndexSet<&str> {
        self.rules
            .values()
            .filter_map(|recipe| match recipe {
                Recipe::Regions { regions } | Recipe::DirectPlusRegions { regions } => {
                    Some(regions.iter().map(String::as_str))
                }
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// First-occurrence-wins uniqueness pass.
fn unique(items: Vec<String>) -> Vec<String> {
    let set: IndexSet<String> = items.into_iter().collect();
    set.into_iter().collect()
}

/// Rewrite every selector-typed template entry according to the policy table.
///
/// `groups_by_region` maps each region code to its synthesized group labels
/// across all sources (possibly empty); `misc_pool` holds the tags of
/// filtered nodes that classified into no region. Non-selector entries pass
/// through untouched. The rewrite is total and happens once per selector.
pub fn compose(
    template: &mut Template,
    policy: &PolicyTable,
    groups_by_region: &IndexMap<String, Vec<String>>,
    misc_pool: &[String],
) {
    let all_groups: Vec<String> = groups_by_region.values().flatten().cloned().collect();

    let labels_for = |regions: &[String]| -> Vec<String> {
        regions
            .iter()
            .filter_map(|code| groups_by_region.get(code))
            .flatten()
            .cloned()
            .collect()
    };

    for entry in &mut template.outbounds {
        if !entry.is_selector() {
            continue;
        }

        // The master selector replaces its anchor outright: it exposes the
        // whole fan-out plus the miscellaneous pool, never itself.
        let keys = if entry.tag == policy.master_tag {
            let mut keys = all_groups.clone();
            keys.extend(misc_pool.iter().cloned());
            keys
        } else {
            let mut keys = vec![policy.master_tag.clone()];
            match policy.recipe_for(&entry.tag) {
                Recipe::FanOut => keys.extend(all_groups.iter().cloned()),
                Recipe::Regions { regions } => keys.extend(labels_for(regions)),
                Recipe::DirectPlusRegions { regions } => {
                    keys.push(policy.direct_tag.clone());
                    keys.extend(labels_for(regions));
                }
                Recipe::DirectOnly => keys.push(policy.direct_tag.clone()),
                Recipe::AnchorOnly => {}
            }
            keys
        };

        entry.outbounds = Some(unique(keys));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn template(tags: &[(&str, &str)]) -> Template {
        let outbounds: Vec<serde_json::Value> = tags
            .iter()
            .map(|(tag, kind)| json!({ "tag": tag, "type": kind, "outbounds": ["placeholder"] }))
            .collect();
        serde_json::from_value(json!({ "outbounds": outbounds })).unwrap()
    }

    fn groups() -> IndexMap<String, Vec<String>> {
        [
            ("HK", vec!["🇭🇰 HK-a", "🇭🇰 HK-b"]),
            ("TW", vec![]),
            ("SG", vec![]),
            ("JP", vec![]),
            ("US", vec!["🇺🇸 US-a", "🇺🇸 US-b"]),
        ]
        .into_iter()
        .map(|(code, labels)| {
            (
                code.to_owned(),
                labels.into_iter().map(str::to_owned).collect(),
            )
        })
        .collect()
    }

    #[test]
    fn master_gets_fan_out_plus_misc_without_anchor() {
        let mut t = template(&[("🗽 节点选择", "selector")]);
        compose(
            &mut t,
            &PolicyTable::default(),
            &groups(),
            &["stray-01".to_owned()],
        );

        let outbounds = t.outbounds[0].outbounds.as_ref().unwrap();
        assert_eq!(
            outbounds,
            &["🇭🇰 HK-a", "🇭🇰 HK-b", "🇺🇸 US-a", "🇺🇸 US-b", "stray-01"]
        );
    }

    #[test]
    fn unmatched_destination_defaults_to_full_fan_out() {
        let mut t = template(&[("📺 Netflix", "selector")]);
        compose(&mut t, &PolicyTable::default(), &groups(), &[]);

        let outbounds = t.outbounds[0].outbounds.as_ref().unwrap();
        assert_eq!(
            outbounds,
            &["🗽 节点选择", "🇭🇰 HK-a", "🇭🇰 HK-b", "🇺🇸 US-a", "🇺🇸 US-b"]
        );
    }

    #[test]
    fn region_subset_rule_selects_one_region_across_sources() {
        let mut t = template(&[("🅾️ OpenAI", "selector")]);
        compose(&mut t, &PolicyTable::default(), &groups(), &[]);

        let outbounds = t.outbounds[0].outbounds.as_ref().unwrap();
        assert_eq!(outbounds, &["🗽 节点选择", "🇺🇸 US-a", "🇺🇸 US-b"]);
    }

    #[test]
    fn direct_plus_regions_rule() {
        let mut t = template(&[("🎞 Emby", "selector")]);
        compose(&mut t, &PolicyTable::default(), &groups(), &[]);

        let outbounds = t.outbounds[0].outbounds.as_ref().unwrap();
        assert_eq!(
            outbounds,
            &["🗽 节点选择", "🎯 全球直连", "🇭🇰 HK-a", "🇭🇰 HK-b", "🇺🇸 US-a", "🇺🇸 US-b"]
        );
    }

    #[test]
    fn direct_only_and_anchor_only_rules() {
        let mut t = template(&[("🍎 Apple", "selector"), ("🐟 漏网之鱼", "selector")]);
        compose(&mut t, &PolicyTable::default(), &groups(), &[]);

        assert_eq!(
            t.outbounds[0].outbounds.as_ref().unwrap(),
            &["🗽 节点选择", "🎯 全球直连"]
        );
        assert_eq!(t.outbounds[1].outbounds.as_ref().unwrap(), &["🗽 节点选择"]);
    }

    #[test]
    fn non_selector_entries_pass_through() {
        let mut t = template(&[("🎯 全球直连", "direct")]);
        compose(&mut t, &PolicyTable::default(), &groups(), &[]);

        assert_eq!(
            t.outbounds[0].outbounds.as_ref().unwrap(),
            &["placeholder"]
        );
    }

    #[test]
    fn recipes_are_deduplicated() {
        let mut policy = PolicyTable::default();
        policy.rules.insert(
            "dup".to_owned(),
            Recipe::Regions {
                regions: vec!["US".into(), "US".into()],
            },
        );
        let mut t = template(&[("dup", "selector")]);
        compose(&mut t, &policy, &groups(), &[]);

        assert_eq!(
            t.outbounds[0].outbounds.as_ref().unwrap(),
            &["🗽 节点选择", "🇺🇸 US-a", "🇺🇸 US-b"]
        );
    }

    #[test]
    fn referenced_regions_collects_rule_codes() {
        let policy = PolicyTable::default();
        let referenced = policy.referenced_regions();
        assert!(referenced.contains("US"));
        assert!(referenced.contains("TW"));
        assert!(referenced.contains("HK"));
        assert!(referenced.contains("SG"));
        assert!(!referenced.contains("JP"));
    }
}
