#![allow(dead_code)]

use critgen::canon::{CanonicalForm, Canonicalizer, RefinementCanonicalizer};
use critgen::colouring::is_colourable;
use critgen::critical::is_vertex_critical;
use critgen::forbidden::{
    Scope, contains_bull, contains_clique, contains_fork, contains_gem, contains_induced_cycle,
    contains_induced_diamond, contains_induced_path, contains_p4_plus_p1, has_cycle_shorter_than,
};
use critgen::planarity::{Dmp, PlanarityTest};
use critgen::{Graph, SearchConfig};
use itertools::Itertools;
use std::collections::BTreeSet;

pub fn forms(graphs: &[Graph]) -> BTreeSet<CanonicalForm> {
    let mut canon = RefinementCanonicalizer::new();
    graphs.iter().map(|g| canon.canonical_form(g)).collect()
}

pub fn config(tokens: &str) -> SearchConfig {
    let tokens: Vec<&str> = tokens.split_whitespace().collect();
    SearchConfig::from_tokens(&tokens).expect("test tokens are valid")
}

/// Membership in the class, checked on the whole graph.
pub fn in_class(config: &SearchConfig, g: &Graph, planarity: &mut Dmp) -> bool {
    let all = Scope::All;
    !(config.path.is_some_and(|t| contains_induced_path(g, t, all, None))
        || config.cycle.is_some_and(|c| contains_induced_cycle(g, c, all))
        || config.girth.is_some_and(|b| has_cycle_shorter_than(g, b, all))
        || (config.diamond_free && contains_induced_diamond(g, all))
        || (config.k4_free && contains_clique(g, 4, all))
        || (config.k5_free && contains_clique(g, 5, all))
        || (config.bull_free && contains_bull(g, all))
        || (config.fork_free && contains_fork(g, all))
        || (config.gem_free && contains_gem(g, all))
        || (config.p4_plus_p1_free && contains_p4_plus_p1(g, all))
        || (config.bipartite && !is_colourable(g, 2))
        || (config.planar && !planarity.is_planar(g).unwrap()))
}

/// Every critical graph of the class, found by trying all labelled graphs.
///
/// A graph is critical when it is uncolourable, in the class, vertex-critical
/// and (unless only vertex-criticality is asked for) has no proper spanning
/// subgraph that is uncolourable and in the class.
pub fn brute_force(config: &SearchConfig) -> Vec<Graph> {
    let k = config.k;
    let mut planarity = Dmp::new();
    let mut canon = RefinementCanonicalizer::new();
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();

    for n in 1..=config.max_vertices {
        let pairs: Vec<(usize, usize)> = (0..n).tuple_combinations().collect();
        let total = 1usize << pairs.len();
        let mut bad = vec![false; total];
        let mut bad_below = vec![false; total];
        for mask in 0..total {
            let edges: Vec<(usize, usize)> = pairs
                .iter()
                .enumerate()
                .filter(|&(i, _)| mask >> i & 1 == 1)
                .map(|(_, &e)| e)
                .collect();
            let g = Graph::from_edges(n, &edges);
            bad[mask] = !is_colourable(&g, k) && in_class(config, &g, &mut planarity);
            bad_below[mask] = (0..pairs.len())
                .filter(|&i| mask >> i & 1 == 1)
                .map(|i| mask & !(1 << i))
                .any(|sub| bad[sub] || bad_below[sub]);

            let minimal = config.vertex_critical || !bad_below[mask];
            if bad[mask]
                && minimal
                && is_vertex_critical(&g, k, false)
                && seen.insert(canon.canonical_form(&g))
            {
                found.push(g);
            }
        }
    }
    found
}
