//! Knowledge-graph ingest and prerequisite-cycle detection.
//!
//! [`ingest`] merges a generated [`ConceptMap`] into the node store. Concepts whose
//! name already exists keep their node and learning state; new concepts receive the
//! next unused `cNNN` id. Prerequisite names are resolved to ids, dangling and
//! self references are dropped, and any cycle the new edges introduce is either
//! broken (default) or rejected.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use petgraph::algo::{astar, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::warn;

use crate::error::EngineError;
use crate::generator::ConceptMap;
use crate::learning::types::{BloomLevel, KnowledgeNode, DEFAULT_EASE, MIN_EASE};
use crate::store::NodeMap;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Starting `p_know` for new nodes.
    pub p_init: f64,
    /// Generated difficulty is capped at this Bloom level.
    pub max_initial_bloom: u8,
    /// Starting ease factor for new nodes.
    pub default_ease: f64,
    /// Fail the build on a cycle instead of breaking it.
    pub reject_cycles: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            p_init: 0.1,
            max_initial_bloom: BloomLevel::Apply.level(),
            default_ease: DEFAULT_EASE,
            reject_cycles: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The named prerequisite is not a known concept.
    Unknown,
    /// The concept listed itself.
    SelfReference,
    /// Removing this edge broke a prerequisite cycle.
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedPrerequisite {
    pub concept_id: String,
    pub prerequisite: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Ids of nodes created by this build, in concept-map order.
    pub created: Vec<String>,
    /// Ids of existing nodes the concept map named again.
    pub reused: Vec<String>,
    pub dropped_prerequisites: Vec<DroppedPrerequisite>,
    /// Each cycle found, as the id path `a -> b -> ... -> a` minus the repeat.
    pub broken_cycles: Vec<Vec<String>>,
}

pub fn format_concept_id(index: usize) -> String {
    format!("c{index:03}")
}

fn concept_index(id: &str) -> Option<usize> {
    id.strip_prefix('c')?.parse().ok()
}

/// One past the highest numeric `cNNN` id in the store.
pub fn next_concept_index(nodes: &NodeMap) -> usize {
    nodes
        .keys()
        .filter_map(|id| concept_index(id))
        .max()
        .map_or(0, |max| max + 1)
}

/// Order ids by their numeric suffix, so `c999` comes before `c1000`.
/// Ids outside the `cNNN` form sort after numbered ones, as plain strings.
pub fn compare_concept_ids(a: &str, b: &str) -> Ordering {
    match (concept_index(a), concept_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merge `map` into `nodes`.
pub fn ingest(
    nodes: &mut NodeMap,
    map: &ConceptMap,
    options: &IngestOptions,
) -> Result<IngestReport, EngineError> {
    let mut report = IngestReport::default();

    let mut id_by_name: HashMap<String, String> = nodes
        .values()
        .map(|n| (normalize(&n.name), n.concept_id.clone()))
        .collect();

    let mut next_index = next_concept_index(nodes);
    let mut new_concepts: Vec<(&str, String)> = Vec::new();
    let mut seen = HashSet::new();

    for concept in &map.concepts {
        let key = normalize(concept);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        match id_by_name.get(&key) {
            Some(existing) => report.reused.push(existing.clone()),
            None => {
                let id = format_concept_id(next_index);
                next_index += 1;
                id_by_name.insert(key, id.clone());
                new_concepts.push((concept.as_str(), id));
            }
        }
    }

    let descriptions = normalized_lookup(&map.descriptions);
    let prerequisites = normalized_lookup(&map.prerequisites_map);
    let difficulties = normalized_lookup(&map.difficulty_levels);
    let max_bloom = options
        .max_initial_bloom
        .clamp(BloomLevel::Remember.level(), BloomLevel::Create.level());

    for (name, id) in &new_concepts {
        let key = normalize(name);
        let description = descriptions.get(&key).map(|d| d.to_string()).unwrap_or_default();
        let mut node = KnowledgeNode::new(id.clone(), name.trim(), description);
        node.p_know = options.p_init;
        node.ease_factor = options.default_ease.max(MIN_EASE);
        node.bloom_level = difficulties
            .get(&key)
            .map_or(1, |d| **d)
            .clamp(BloomLevel::Remember.level(), max_bloom);

        for prereq in prerequisites.get(&key).map(|v| v.as_slice()).unwrap_or_default() {
            match id_by_name.get(&normalize(prereq)) {
                Some(pid) if pid == id => report.dropped_prerequisites.push(DroppedPrerequisite {
                    concept_id: id.clone(),
                    prerequisite: prereq.clone(),
                    reason: DropReason::SelfReference,
                }),
                Some(pid) => {
                    if !node.prerequisites.contains(pid) {
                        node.prerequisites.push(pid.clone());
                    }
                }
                None => {
                    warn!(concept_id = %id, prerequisite = %prereq, "dropping unknown prerequisite");
                    report.dropped_prerequisites.push(DroppedPrerequisite {
                        concept_id: id.clone(),
                        prerequisite: prereq.clone(),
                        reason: DropReason::Unknown,
                    });
                }
            }
        }

        nodes.insert(id.clone(), node);
        report.created.push(id.clone());
    }

    while let Some(cycle) = find_cycle(nodes) {
        if options.reject_cycles {
            return Err(EngineError::PrerequisiteCycle { cycle });
        }
        let (Some(first), Some(last)) = (cycle.first(), cycle.last()) else {
            break;
        };
        warn!(cycle = %cycle.join(" -> "), "breaking prerequisite cycle");
        if let Some(closing) = nodes.get_mut(last) {
            closing.prerequisites.retain(|p| p != first);
        }
        report.dropped_prerequisites.push(DroppedPrerequisite {
            concept_id: last.clone(),
            prerequisite: first.clone(),
            reason: DropReason::Cycle,
        });
        report.broken_cycles.push(cycle);
    }

    Ok(report)
}

fn normalized_lookup<V>(map: &HashMap<String, V>) -> HashMap<String, &V> {
    map.iter().map(|(k, v)| (normalize(k), v)).collect()
}

/// Directed prerequisite graph. An edge runs from a node to each of its prerequisites;
/// prerequisites naming missing nodes are left out.
fn prerequisite_graph(nodes: &NodeMap) -> DiGraph<&str, ()> {
    let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());
    let index: HashMap<&str, NodeIndex> = nodes
        .keys()
        .map(|id| (id.as_str(), graph.add_node(id.as_str())))
        .collect();

    for (id, node) in nodes {
        for prereq in &node.prerequisites {
            if let (Some(&from), Some(&to)) = (index.get(id.as_str()), index.get(prereq.as_str())) {
                graph.update_edge(from, to, ());
            }
        }
    }
    graph
}

/// Find one prerequisite cycle, returned as the id path in edge order.
///
/// For a returned path `[a, b, c]` the edges are `a -> b -> c -> a`, with `a` the
/// lowest id in the cycle's strongly connected component.
pub fn find_cycle(nodes: &NodeMap) -> Option<Vec<String>> {
    let graph = prerequisite_graph(nodes);
    tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1 || scc.first().is_some_and(|&n| graph.contains_edge(n, n))
        })
        .filter_map(|scc| cycle_through(&graph, &scc))
        .min_by(|a, b| compare_concept_ids(&a[0], &b[0]))
}

/// Shortest cycle through the lowest id of a strongly connected component.
fn cycle_through(graph: &DiGraph<&str, ()>, scc: &[NodeIndex]) -> Option<Vec<String>> {
    let start = *scc
        .iter()
        .min_by(|&&a, &&b| compare_concept_ids(graph[a], graph[b]))?;
    let next = graph
        .neighbors(start)
        .filter(|n| scc.contains(n))
        .min_by(|&a, &b| compare_concept_ids(graph[a], graph[b]))?;

    // Every path from `next` back to `start` stays inside the component.
    let (_, path) = astar(graph, next, |n| n == start, |_| 1u32, |_| 0)?;
    let (_, inner) = path.split_last()?;

    let mut cycle = Vec::with_capacity(path.len());
    cycle.push(graph[start].to_string());
    cycle.extend(inner.iter().map(|&n| graph[n].to_string()));
    Some(cycle)
}
