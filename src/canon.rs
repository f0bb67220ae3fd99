//! Canonical forms for isomorphism rejection.
//!
//! [`RefinementCanonicalizer`] runs an individualisation/refinement search:
//! equitable partitions are refined by neighbour counts, the first
//! non-singleton cell is individualised vertex by vertex, and every discrete
//! partition yields a relabelled adjacency matrix. The largest matrix is the
//! canonical form. Automorphisms found between equal leaves prune children
//! that lie in one orbit of the pointwise stabiliser of the current prefix.

use crate::graph::{Graph, VertexSet, bit, members};
use std::fmt;

/// Byte encoding of a canonically relabelled graph. Two graphs of the same
/// order have equal forms exactly when they are isomorphic.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalForm(Box<[u8]>);

impl CanonicalForm {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn from_rows(n: usize, rows: &[u64]) -> Self {
        let width = n.div_ceil(8);
        let mut bytes = Vec::with_capacity(1 + n * width);
        bytes.push(n as u8);
        for row in rows {
            bytes.extend_from_slice(&row.to_le_bytes()[..width]);
        }
        CanonicalForm(bytes.into_boxed_slice())
    }
}

impl fmt::Debug for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalForm(")?;
        for b in self.0.iter() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Source of canonical forms.
pub trait Canonicalizer {
    fn canonical_form(&mut self, g: &Graph) -> CanonicalForm;
}

#[derive(Debug, Default)]
pub struct RefinementCanonicalizer {
    leaves: u64,
}

impl RefinementCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves visited over the lifetime of this canonicalizer.
    pub fn leaves_visited(&self) -> u64 {
        self.leaves
    }
}

impl Canonicalizer for RefinementCanonicalizer {
    fn canonical_form(&mut self, g: &Graph) -> CanonicalForm {
        let n = g.order();
        if n == 0 {
            return CanonicalForm::from_rows(0, &[]);
        }
        let mut search = LeafSearch {
            rows: g.rows(),
            n,
            best: None,
            first_below: vec![None; n + 1],
            generators: Vec::new(),
            prefix: Vec::with_capacity(n),
            leaves: 0,
        };
        let mut cells = vec![g.vertices()];
        refine(g.rows(), &mut cells);
        search.descend(cells);
        self.leaves += search.leaves;
        let (cert, _) = search.best.unwrap_or_default();
        CanonicalForm::from_rows(n, &cert)
    }
}

/// =============== Partition refinement ===============

/// Splits cells by neighbour counts into each splitter cell until the
/// partition is equitable. Cell order depends only on the graph and the
/// starting partition, never on vertex labels.
fn refine(rows: &[VertexSet], cells: &mut Vec<VertexSet>) {
    'restart: loop {
        for s in 0..cells.len() {
            let splitter = cells[s];
            let mut split_any = false;
            let mut next = Vec::with_capacity(cells.len() + 4);
            for &cell in cells.iter() {
                if cell.count_ones() == 1 {
                    next.push(cell);
                    continue;
                }
                let mut groups: Vec<(u32, VertexSet)> = Vec::new();
                for v in members(cell) {
                    let c = (rows[v] & splitter).count_ones();
                    match groups.iter_mut().find(|(k, _)| *k == c) {
                        Some((_, set)) => *set |= bit(v),
                        None => groups.push((c, bit(v))),
                    }
                }
                if groups.len() > 1 {
                    split_any = true;
                    groups.sort_unstable_by_key(|&(k, _)| k);
                    next.extend(groups.into_iter().map(|(_, set)| set));
                } else {
                    next.push(cell);
                }
            }
            if split_any {
                *cells = next;
                continue 'restart;
            }
        }
        return;
    }
}

type Labelling = Vec<usize>;

struct LeafSearch<'a> {
    rows: &'a [VertexSet],
    n: usize,
    best: Option<(Vec<u64>, Labelling)>,
    /// First leaf below each node of the current path, by depth.
    first_below: Vec<Option<(Vec<u64>, Labelling)>>,
    /// Automorphisms found so far, as vertex maps.
    generators: Vec<Vec<usize>>,
    prefix: Vec<usize>,
    leaves: u64,
}

impl LeafSearch<'_> {
    /// Explores the node whose individualised vertices are `self.prefix`.
    /// Returns `Some(d)` when the subtree below depth `d` turned out to be an
    /// automorphic image of one already explored.
    fn descend(&mut self, cells: Vec<VertexSet>) -> Option<usize> {
        let depth = self.prefix.len();
        let Some(target) = cells.iter().position(|c| c.count_ones() > 1) else {
            return self.leaf(&cells);
        };
        let cell = cells[target];
        let mut tried: VertexSet = 0;
        for v in members(cell) {
            if tried != 0 && self.in_orbit_of(v, tried) {
                continue;
            }
            tried |= bit(v);
            let mut child = Vec::with_capacity(cells.len() + 1);
            child.extend_from_slice(&cells[..target]);
            child.push(bit(v));
            child.push(cell & !bit(v));
            child.extend_from_slice(&cells[target + 1..]);
            refine(self.rows, &mut child);
            self.prefix.push(v);
            let jump = self.descend(child);
            self.prefix.pop();
            if let Some(d) = jump {
                if d < depth {
                    self.first_below[depth] = None;
                    return Some(d);
                }
            }
        }
        self.first_below[depth] = None;
        None
    }

    fn leaf(&mut self, cells: &[VertexSet]) -> Option<usize> {
        self.leaves += 1;
        let depth = self.prefix.len();
        let lab: Labelling = cells.iter().map(|c| c.trailing_zeros() as usize).collect();
        let mut pos = vec![0usize; self.n];
        for (i, &v) in lab.iter().enumerate() {
            pos[v] = i;
        }
        let cert: Vec<u64> = lab
            .iter()
            .map(|&v| members(self.rows[v]).fold(0u64, |acc, w| acc | bit(pos[w])))
            .collect();

        // An equal leaf under an ancestor gives an automorphism fixing that
        // ancestor's prefix, which maps this whole branch onto explored ground.
        let matched = (0..depth).rev().find(|&d| {
            self.first_below[d]
                .as_ref()
                .is_some_and(|(c, _)| *c == cert)
        });
        let reference = match matched {
            Some(d) => self.first_below[d].as_ref(),
            None => self.best.as_ref().filter(|(c, _)| *c == cert),
        };
        if let Some((_, ref_lab)) = reference {
            let mut gamma = vec![0usize; self.n];
            for (i, &v) in ref_lab.iter().enumerate() {
                gamma[v] = lab[i];
            }
            self.generators.push(gamma);
        }

        for slot in self.first_below.iter_mut().take(depth) {
            if slot.is_none() {
                *slot = Some((cert.clone(), lab.clone()));
            }
        }
        if self.best.as_ref().is_none_or(|(b, _)| cert > *b) {
            self.best = Some((cert, lab));
        }
        matched
    }

    /// `v` shares an orbit with a member of `tried` under the automorphisms
    /// fixing the current prefix pointwise.
    fn in_orbit_of(&self, v: usize, tried: VertexSet) -> bool {
        let mut parent: Vec<usize> = (0..self.n).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for gamma in &self.generators {
            if self.prefix.iter().any(|&p| gamma[p] != p) {
                continue;
            }
            for (x, &y) in gamma.iter().enumerate() {
                let (rx, ry) = (find(&mut parent, x), find(&mut parent, y));
                if rx != ry {
                    parent[rx] = ry;
                }
            }
        }
        let root = find(&mut parent, v);
        members(tried).any(|w| find(&mut parent, w) == root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::algo::is_isomorphic;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn relabel(g: &Graph, perm: &[usize]) -> Graph {
        let edges: Vec<_> = g.edges().map(|(u, v)| (perm[u], perm[v])).collect();
        Graph::from_edges(g.order(), &edges)
    }

    fn random_graph(rng: &mut StdRng, n: usize, p: f64) -> Graph {
        let mut edges = Vec::new();
        for u in 0..n {
            for v in (u + 1)..n {
                if rng.gen_bool(p) {
                    edges.push((u, v));
                }
            }
        }
        Graph::from_edges(n, &edges)
    }

    #[test]
    fn relabelled_graphs_share_a_form() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut canon = RefinementCanonicalizer::new();
        for round in 0..60 {
            let n = 3 + round % 9;
            let g = random_graph(&mut rng, n, 0.4);
            let mut perm: Vec<usize> = (0..n).collect();
            for i in (1..n).rev() {
                perm.swap(i, rng.gen_range(0..=i));
            }
            let h = relabel(&g, &perm);
            assert_eq!(canon.canonical_form(&g), canon.canonical_form(&h), "{g:?} vs {h:?}");
        }
    }

    #[test]
    fn forms_agree_with_petgraph_isomorphism() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut canon = RefinementCanonicalizer::new();
        let graphs: Vec<Graph> = (0..80).map(|_| random_graph(&mut rng, 6, 0.5)).collect();
        let forms: Vec<_> = graphs.iter().map(|g| canon.canonical_form(g)).collect();
        for i in 0..graphs.len() {
            for j in (i + 1)..graphs.len() {
                let iso = is_isomorphic(&graphs[i].to_petgraph(), &graphs[j].to_petgraph());
                assert_eq!(forms[i] == forms[j], iso, "{:?} / {:?}", graphs[i], graphs[j]);
            }
        }
    }

    #[test]
    fn symmetric_graphs_stay_cheap() {
        let mut canon = RefinementCanonicalizer::new();
        canon.canonical_form(&Graph::complete(16));
        canon.canonical_form(&Graph::from_edges(16, &[]));
        canon.canonical_form(&Graph::cycle(16));
        assert!(canon.leaves_visited() < 5_000, "{}", canon.leaves_visited());
    }

    #[test]
    fn regular_non_isomorphic_graphs_differ() {
        // C6 and two disjoint triangles are both 2-regular.
        let c6 = Graph::cycle(6);
        let triangles = Graph::from_edges(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]);
        let mut canon = RefinementCanonicalizer::new();
        assert_ne!(canon.canonical_form(&c6), canon.canonical_form(&triangles));
    }
}
