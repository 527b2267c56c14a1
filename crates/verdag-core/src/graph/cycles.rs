//! Acyclicity certification for freshly built graphs.
//!
//! Builds a petgraph view of the successor map and runs a topological sort.
//! On failure the strongly connected components are logged so the whole loop
//! is visible, and the vertex closing the cycle is returned in the error.
//!
//! Filtered graphs skip this check: removing vertices from a DAG and
//! bridging over them cannot close a cycle.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{error, instrument};

use crate::error::GraphError;
use crate::version::Version;

/// Certify that `edges_fw` describes a DAG.
///
/// # Errors
///
/// Returns [`GraphError::CycleDetected`] naming a version on a cycle, or
/// [`GraphError::UnknownVersion`] if an edge points outside the key set.
#[instrument(skip_all, fields(versions = edges_fw.len()))]
pub fn validate_no_cycles<V: Version>(
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
) -> Result<(), GraphError> {
    let graph = successor_graph(edges_fw)?;

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => {
            for members in find_cycles(&graph) {
                error!(cycle = ?members, "version graph cycle");
            }
            Err(GraphError::CycleDetected {
                version: graph[cycle.node_id()].friendly_version(),
            })
        }
    }
}

fn successor_graph<V: Version>(
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
) -> Result<DiGraph<&V, ()>, GraphError> {
    let mut graph = DiGraph::<&V, ()>::with_capacity(edges_fw.len(), edges_fw.len());
    let index: BTreeMap<&V, NodeIndex> = edges_fw
        .keys()
        .map(|version| (version, graph.add_node(version)))
        .collect();

    for (from, successors) in edges_fw {
        let from_idx = index[from];
        for to in successors {
            let Some(&to_idx) = index.get(to) else {
                return Err(GraphError::UnknownVersion {
                    version: to.friendly_version(),
                });
            };
            graph.add_edge(from_idx, to_idx, ());
        }
    }
    Ok(graph)
}

/// Each cycle as the sorted friendly names of one strongly connected
/// component. Self-loops are one-element cycles.
fn find_cycles<V: Version>(graph: &DiGraph<&V, ()>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut names: Vec<String> = component
                .into_iter()
                .map(|idx| graph[idx].friendly_version())
                .collect();
            names.sort_unstable();
            names
        })
        .collect();

    cycles.sort_unstable();
    cycles
}
