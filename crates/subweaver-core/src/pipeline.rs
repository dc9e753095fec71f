// Pipeline facade
//
// One invocation = one stateless computation. Each stage hands an immutable
// snapshot to the next; nothing here is shared across invocations, which is
// what makes per-source failure isolation trivially correct.

use indexmap::IndexMap;
use tracing::debug;

use crate::assemble::assemble;
use crate::filter::FilterConfig;
use crate::model::{Node, Profile, Template};
use crate::policy::{PolicyTable, compose};
use crate::region::RegionTable;
use crate::synth::{HealthCheck, synthesize};

/// The whole aggregation engine: filter, classify, synthesize, compose,
/// assemble. All four tables are read-only for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub filter: FilterConfig,
    pub regions: RegionTable,
    pub health: HealthCheck,
    pub policy: PolicyTable,
}

impl Pipeline {
    /// Run the full pipeline over a fetched template and the per-source raw
    /// node lists (in merge order). Never fails: sources that filter down to
    /// nothing simply contribute nothing, and unmatched destinations fall
    /// back to the default recipe.
    pub fn run(&self, mut template: Template, sources: IndexMap<String, Vec<Node>>) -> Profile {
        // Filter each source independently; drop sources left empty.
        let filtered: IndexMap<String, Vec<Node>> = sources
            .into_iter()
            .map(|(name, nodes)| (name, self.filter.filter(nodes)))
            .filter(|(_, nodes)| !nodes.is_empty())
            .collect();

        // Global node pool in merge order across sources.
        let all_nodes: Vec<Node> = filtered.values().flatten().cloned().collect();

        // One group per non-empty (source, region) pair, plus the
        // region -> group-label index the composer consumes. Every
        // configured region gets an index entry even when empty.
        let mut groups_by_region: IndexMap<String, Vec<String>> = self
            .regions
            .codes()
            .map(|code| (code.to_owned(), Vec::new()))
            .collect();
        let mut groups = Vec::new();
        for (name, nodes) in &filtered {
            for group in synthesize(name, nodes, &self.regions, &self.health) {
                if let Some(labels) = groups_by_region.get_mut(&group.region) {
                    labels.push(group.tag.clone());
                }
                groups.push(group);
            }
        }

        // Tags that classified into no region stay available to the master
        // selector as the miscellaneous pool.
        let misc_pool: Vec<String> = all_nodes
            .iter()
            .filter(|n| self.regions.is_unclassified(&n.tag))
            .map(|n| n.tag.clone())
            .collect();

        debug!(
            sources = filtered.len(),
            nodes = all_nodes.len(),
            groups = groups.len(),
            misc = misc_pool.len(),
            "pipeline snapshot"
        );

        compose(&mut template, &self.policy, &groups_by_region, &misc_pool);

        assemble(template, groups, all_nodes)
    }
}
