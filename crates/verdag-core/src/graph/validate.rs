//! Structural validation: edge symmetry and connectivity.
//!
//! # Connectivity sweeps
//!
//! 1. **Forward sweep** from the roots (every vertex without predecessors)
//!    along successor edges, layer by layer. Records the layer at which each
//!    vertex is first reached, marks vertices with several successors as
//!    branch points and collects the vertices without successors as tips.
//! 2. **Backward sweep** from those tips along predecessor edges. A vertex's
//!    value is overwritten on every later layer, so it ends up holding the
//!    longest path to any tip. The vertices without predecessors reached by
//!    this sweep must be exactly the roots of step 1.
//! 3. **Component sweep** (built graphs only): an undirected walk from the
//!    oldest declared root must reach every declared root. A second island
//!    component has its own roots, which the directed sweeps would happily
//!    accept, so this is where islands surface. Detached roots, versions whose
//!    whole ancestry shares no side with them, may sit on islands of their
//!    own.
//!
//! Filtered graphs run the directed sweeps only. Cutting a version out can
//! legitimately split a graph, e.g. a side branch that never merges back
//! loses its fork point to a `min` bound.
//!
//! Any disagreement is an [`GraphError::InconsistentGraph`] carrying both
//! root sets.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error, instrument};

use crate::error::GraphError;
use crate::graph::friendly_names;
use crate::version::Version;

/// Derived structure of a validated graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStructure<V: Version> {
    pub roots: BTreeSet<V>,
    pub tips: BTreeSet<V>,
    /// Longest path to a tip, restricted to roots.
    pub paths_to_tip: BTreeMap<V, usize>,
    /// Vertices with more than one successor.
    pub branch_points: BTreeSet<V>,
}

/// Check that both edge maps have the same keys and are exact inverses.
///
/// # Errors
///
/// Returns [`GraphError::BrokenEdgeSymmetry`] naming the first edge whose
/// reverse entry is missing, or [`GraphError::UnknownVersion`] for a key
/// present in only one map.
pub fn check_edge_symmetry<V: Version>(
    edges_back: &BTreeMap<V, BTreeSet<V>>,
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
) -> Result<(), GraphError> {
    if let Some(stray) = edges_back
        .keys()
        .find(|v| !edges_fw.contains_key(*v))
        .or_else(|| edges_fw.keys().find(|v| !edges_back.contains_key(*v)))
    {
        return Err(GraphError::UnknownVersion {
            version: stray.friendly_version(),
        });
    }

    for (from, successors) in edges_fw {
        for to in successors {
            if !edges_back.get(to).is_some_and(|preds| preds.contains(from)) {
                return Err(broken(from, to));
            }
        }
    }
    for (to, predecessors) in edges_back {
        for from in predecessors {
            if !edges_fw.get(from).is_some_and(|succs| succs.contains(to)) {
                return Err(broken(from, to));
            }
        }
    }
    Ok(())
}

fn broken<V: Version>(from: &V, to: &V) -> GraphError {
    GraphError::BrokenEdgeSymmetry {
        from: from.friendly_version(),
        to: to.friendly_version(),
    }
}

/// How the component sweep treats island components.
#[derive(Debug)]
pub enum IslandCheck<'a, V: Version> {
    /// Every root outside `detached` must share one component.
    Reject { detached: &'a BTreeSet<V> },
    /// Directed sweeps only.
    Skip,
}

/// Run the connectivity sweeps and derive roots, tips and root ranking.
///
/// Expects symmetric, acyclic edge maps.
///
/// # Errors
///
/// Returns [`GraphError::InconsistentGraph`] when the sweeps disagree on the
/// root set.
#[instrument(skip_all, fields(versions = edges_back.len()))]
pub fn find_branch_structure<V: Version>(
    edges_back: &BTreeMap<V, BTreeSet<V>>,
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
    islands: IslandCheck<'_, V>,
) -> Result<BranchStructure<V>, GraphError> {
    let roots: BTreeSet<V> = edges_back
        .iter()
        .filter(|(_, preds)| preds.is_empty())
        .map(|(v, _)| v.clone())
        .collect();

    let mut first_reached = BTreeMap::new();
    let mut branch_points = BTreeSet::new();
    let tips = sweep(
        &roots,
        edges_fw,
        &mut first_reached,
        &mut branch_points,
        Record::FirstVisit,
    );

    let mut longest_to_tip = BTreeMap::new();
    let walk_roots = sweep(
        &tips,
        edges_back,
        &mut longest_to_tip,
        &mut BTreeSet::new(),
        Record::Longest,
    );

    if walk_roots != roots {
        return Err(inconsistent(&roots, &walk_roots));
    }

    if let IslandCheck::Reject { detached } = islands {
        check_components(&roots, detached, edges_back, edges_fw)?;
    }

    let paths_to_tip = roots
        .iter()
        .map(|root| (root.clone(), longest_to_tip.get(root).copied().unwrap_or_default()))
        .collect();

    debug!(
        roots = roots.len(),
        tips = tips.len(),
        branch_points = branch_points.len(),
        "branch structure derived"
    );

    Ok(BranchStructure {
        roots,
        tips,
        paths_to_tip,
        branch_points,
    })
}

fn inconsistent<V: Version>(tree_roots: &BTreeSet<V>, walk_roots: &BTreeSet<V>) -> GraphError {
    let err = GraphError::InconsistentGraph {
        tree_roots: friendly_names(tree_roots),
        walk_roots: friendly_names(walk_roots),
    };
    error!(%err, "root sets disagree");
    err
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    FirstVisit,
    Longest,
}

/// Breadth-first layering away from `start`. Returns the vertices with no
/// further neighbors.
fn sweep<V: Version>(
    start: &BTreeSet<V>,
    next: &BTreeMap<V, BTreeSet<V>>,
    path_lengths: &mut BTreeMap<V, usize>,
    branch_points: &mut BTreeSet<V>,
    record: Record,
) -> BTreeSet<V> {
    let mut current_layer: BTreeSet<&V> = start.iter().collect();
    let mut ends = BTreeSet::new();
    let mut path_length = 0;

    while !current_layer.is_empty() {
        let mut next_layer = BTreeSet::new();

        for version in current_layer {
            let neighbors = next.get(version).map_or(0, |n| {
                next_layer.extend(n.iter());
                n.len()
            });

            if neighbors == 0 {
                ends.insert(version.clone());
            } else if neighbors > 1 {
                branch_points.insert(version.clone());
            }

            match record {
                Record::FirstVisit => {
                    path_lengths.entry(version.clone()).or_insert(path_length);
                }
                Record::Longest => {
                    path_lengths.insert(version.clone(), path_length);
                }
            }
        }

        current_layer = next_layer;
        path_length += 1;
    }

    ends
}

fn check_components<V: Version>(
    roots: &BTreeSet<V>,
    detached: &BTreeSet<V>,
    edges_back: &BTreeMap<V, BTreeSet<V>>,
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
) -> Result<(), GraphError> {
    let Some(first) = roots.iter().find(|r| !detached.contains(*r)) else {
        return Ok(());
    };

    let component_roots = roots_in_component(first, roots, edges_back, edges_fw);
    if roots
        .iter()
        .all(|r| component_roots.contains(r) || detached.contains(r))
    {
        Ok(())
    } else {
        Err(inconsistent(roots, &component_roots))
    }
}

/// Roots reachable from `first` when edges are walked in both directions.
fn roots_in_component<V: Version>(
    first: &V,
    roots: &BTreeSet<V>,
    edges_back: &BTreeMap<V, BTreeSet<V>>,
    edges_fw: &BTreeMap<V, BTreeSet<V>>,
) -> BTreeSet<V> {

    let mut visited: BTreeSet<&V> = BTreeSet::from([first]);
    let mut stack = vec![first];
    while let Some(version) = stack.pop() {
        let around = edges_back
            .get(version)
            .into_iter()
            .chain(edges_fw.get(version))
            .flatten();
        for neighbor in around {
            if visited.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    roots.iter().filter(|r| visited.contains(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    type Edges = BTreeMap<u32, BTreeSet<u32>>;

    fn derive(back: &Edges, fw: &Edges) -> Result<BranchStructure<u32>, GraphError> {
        find_branch_structure(back, fw, IslandCheck::Reject { detached: &BTreeSet::new() })
    }

    fn edges(nodes: &[u32], links: &[(u32, u32)]) -> (Edges, Edges) {
        let mut back: Edges = nodes.iter().map(|n| (*n, BTreeSet::new())).collect();
        let mut fw: Edges = back.clone();
        for &(from, to) in links {
            back.entry(to).or_default().insert(from);
            fw.entry(from).or_default().insert(to);
        }
        (back, fw)
    }

    #[test]
    fn symmetric_edges_pass() {
        let (back, fw) = edges(&[1, 2, 3], &[(1, 2), (2, 3)]);
        assert!(check_edge_symmetry(&back, &fw).is_ok());
    }

    #[test]
    fn missing_reverse_edge_is_reported() {
        let (back, mut fw) = edges(&[1, 2], &[(1, 2)]);
        fw.insert(1, BTreeSet::new());
        assert_eq!(
            check_edge_symmetry(&back, &fw),
            Err(GraphError::BrokenEdgeSymmetry {
                from: "1".to_string(),
                to: "2".to_string()
            })
        );
    }

    #[test]
    fn key_sets_must_match() {
        let (back, mut fw) = edges(&[1, 2], &[(1, 2)]);
        fw.insert(9, BTreeSet::new());
        assert!(matches!(
            check_edge_symmetry(&back, &fw),
            Err(GraphError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn linear_chain_structure() {
        let (back, fw) = edges(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let structure = derive(&back, &fw).expect("consistent");
        assert_eq!(structure.roots, BTreeSet::from([1]));
        assert_eq!(structure.tips, BTreeSet::from([3]));
        assert_eq!(structure.paths_to_tip, BTreeMap::from([(1, 2)]));
        assert!(structure.branch_points.is_empty());
    }

    #[test]
    fn longest_path_wins_for_root_ranking() {
        // 1 → 2 → 3 → 4 and a shortcut 1 → 4
        let (back, fw) = edges(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (1, 4)]);
        let structure = derive(&back, &fw).expect("consistent");
        assert_eq!(structure.paths_to_tip.get(&1), Some(&3));
        assert_eq!(structure.branch_points, BTreeSet::from([1]));
    }

    #[test]
    fn two_roots_joined_by_merge_are_consistent() {
        let (back, fw) = edges(&[1, 2, 3], &[(1, 3), (2, 3)]);
        let structure = derive(&back, &fw).expect("consistent");
        assert_eq!(structure.roots, BTreeSet::from([1, 2]));
    }

    #[test]
    fn island_component_is_inconsistent() {
        let (back, fw) = edges(&[1, 2, 10, 11], &[(1, 2), (10, 11)]);
        let err = derive(&back, &fw).expect_err("islands");
        assert_eq!(
            err,
            GraphError::InconsistentGraph {
                tree_roots: vec!["1".to_string(), "10".to_string()],
                walk_roots: vec!["1".to_string()],
            }
        );
    }

    #[test]
    fn detached_island_is_accepted() {
        let (back, fw) = edges(&[1, 2, 10, 11], &[(1, 2), (10, 11)]);
        let detached = BTreeSet::from([10]);
        let structure = find_branch_structure(&back, &fw, IslandCheck::Reject { detached: &detached })
            .expect("detached root may stand alone");
        assert_eq!(structure.roots, BTreeSet::from([1, 10]));
        assert_eq!(structure.tips, BTreeSet::from([2, 11]));
    }

    #[test]
    fn detached_roots_do_not_excuse_declared_islands() {
        let (back, fw) = edges(&[1, 2, 10, 11, 20], &[(1, 2), (10, 11)]);
        let detached = BTreeSet::from([20]);
        let err = find_branch_structure(&back, &fw, IslandCheck::Reject { detached: &detached })
            .expect_err("10 is declared");
        assert!(matches!(err, GraphError::InconsistentGraph { .. }));
    }

    #[test]
    fn skipped_island_check_accepts_split_graph() {
        let (back, fw) = edges(&[1, 2, 10, 11], &[(1, 2), (10, 11)]);
        let structure = find_branch_structure(&back, &fw, IslandCheck::Skip).expect("split graph");
        assert_eq!(structure.roots, BTreeSet::from([1, 10]));
    }

    #[test]
    fn empty_graph_has_no_structure() {
        let (back, fw) = edges(&[], &[]);
        let structure = derive(&back, &fw).expect("consistent");
        assert!(structure.roots.is_empty());
        assert!(structure.tips.is_empty());
    }
}
