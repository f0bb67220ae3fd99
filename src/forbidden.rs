//! Detectors for forbidden (induced) subgraphs.
//!
//! Every detector takes a [`Scope`]. With `Scope::Newest(z)` only copies
//! containing `z` are searched: the graph without `z` is known to be free of
//! the pattern. `Scope::All` searches the whole graph and is used after
//! arbitrary edge removals and for seed graphs.

use crate::graph::{Graph, VertexSet, bit, first_n, members};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Newest(usize),
    All,
}

impl Scope {
    /// Scope for a graph whose last vertex was just added.
    pub fn newest(g: &Graph) -> Scope {
        match g.newest() {
            Some(z) => Scope::Newest(z),
            None => Scope::All,
        }
    }

    fn anchor(self) -> Option<usize> {
        match self {
            Scope::Newest(z) => Some(z),
            Scope::All => None,
        }
    }

    fn admits(self, set: VertexSet) -> bool {
        match self {
            Scope::Newest(z) => set & bit(z) != 0,
            Scope::All => true,
        }
    }
}

/// =============== Previously found paths ===============

/// Number of forbidden paths remembered per vertex count.
pub const RING_CAPACITY: usize = 20;

/// FIFO ring of induced paths that recently rejected a graph of one fixed
/// order. Siblings often contain the same path, so it is tried first.
#[derive(Clone, Debug, Default)]
pub struct PathRing {
    paths: VecDeque<Vec<usize>>,
}

impl PathRing {
    pub fn new() -> Self {
        PathRing {
            paths: VecDeque::with_capacity(RING_CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn push(&mut self, path: &[usize]) {
        if self.paths.len() == RING_CAPACITY {
            self.paths.pop_front();
        }
        self.paths.push_back(path.to_vec());
    }

    /// A remembered path that is still an induced path of `g` and lies in `scope`.
    pub fn find(&self, g: &Graph, scope: Scope) -> Option<&[usize]> {
        self.paths
            .iter()
            .find(|p| {
                let set = p.iter().fold(0, |acc, &v| acc | bit(v));
                scope.admits(set) && is_induced_path(g, p)
            })
            .map(Vec::as_slice)
    }
}

/// `path` lists the vertices of an induced path of `g`, in order.
pub fn is_induced_path(g: &Graph, path: &[usize]) -> bool {
    let n = g.order();
    if path.iter().any(|&v| v >= n) {
        return false;
    }
    let set = path.iter().fold(0, |acc, &v| acc | bit(v));
    if set.count_ones() as usize != path.len() {
        return false;
    }
    path.iter().enumerate().all(|(i, &v)| {
        let mut expected = 0;
        if i > 0 {
            expected |= bit(path[i - 1]);
        }
        if i + 1 < path.len() {
            expected |= bit(path[i + 1]);
        }
        g.nbhd(v) & set == expected
    })
}

/// =============== Induced paths ===============

/// Depth-first enumeration of induced paths. With an anchor the path grows
/// as two arms out of the anchor; otherwise from every start vertex.
struct PathSearch<'a, F> {
    rows: &'a [VertexSet],
    allowed: VertexSet,
    len: usize,
    left: Vec<usize>,
    right: Vec<usize>,
    set: VertexSet,
    visit: F,
}

impl<F: FnMut(&[usize]) -> bool> PathSearch<'_, F> {
    fn report(&mut self) -> bool {
        let mut path: Vec<usize> = self.left.iter().rev().copied().collect();
        path.extend_from_slice(&self.right);
        (self.visit)(&path)
    }

    fn grow_left(&mut self, two_sided: bool) -> bool {
        if self.left.len() + self.right.len() == self.len {
            return self.report();
        }
        let end = self.left[self.left.len() - 1];
        for v in members(self.rows[end] & self.allowed & !self.set) {
            if self.rows[v] & self.set == bit(end) {
                self.left.push(v);
                self.set |= bit(v);
                let found = self.grow_left(two_sided);
                self.set &= !bit(v);
                self.left.pop();
                if found {
                    return true;
                }
            }
        }
        // Anchor strictly inside the path: continue on the other side. An
        // empty left arm is the same as a left arm grown to full length.
        two_sided && self.left.len() > 1 && self.grow_right()
    }

    fn grow_right(&mut self) -> bool {
        if self.left.len() + self.right.len() == self.len {
            return self.report();
        }
        let end = *self.right.last().unwrap_or(&self.left[0]);
        for v in members(self.rows[end] & self.allowed & !self.set) {
            if self.rows[v] & self.set == bit(end) {
                self.right.push(v);
                self.set |= bit(v);
                let found = self.grow_right();
                self.set &= !bit(v);
                self.right.pop();
                if found {
                    return true;
                }
            }
        }
        false
    }
}

/// Calls `visit` on induced paths with `len` vertices inside `allowed`
/// (through `anchor` if given) until it returns `true`.
pub fn find_induced_path<F>(
    g: &Graph,
    len: usize,
    allowed: VertexSet,
    anchor: Option<usize>,
    visit: F,
) -> bool
where
    F: FnMut(&[usize]) -> bool,
{
    if len == 0 {
        return false;
    }
    let allowed = allowed & g.vertices();
    let mut search = PathSearch {
        rows: g.rows(),
        allowed,
        len,
        left: Vec::with_capacity(len),
        right: Vec::with_capacity(len),
        set: 0,
        visit,
    };
    match anchor {
        Some(z) => {
            if allowed & bit(z) == 0 {
                return false;
            }
            search.left.push(z);
            search.set = bit(z);
            search.grow_left(true)
        }
        None => members(allowed).any(|s| {
            search.left.clear();
            search.left.push(s);
            search.set = bit(s);
            search.grow_left(false)
        }),
    }
}

/// Looks for an induced path on `t` vertices; a hit is remembered in `ring`.
pub fn contains_induced_path(
    g: &Graph,
    t: usize,
    scope: Scope,
    ring: Option<&mut PathRing>,
) -> bool {
    match ring {
        Some(ring) => {
            if ring.find(g, scope).is_some() {
                return true;
            }
            let mut hit = None;
            let found = find_induced_path(g, t, g.vertices(), scope.anchor(), |p| {
                hit = Some(p.to_vec());
                true
            });
            if let Some(path) = hit {
                ring.push(&path);
            }
            found
        }
        None => find_induced_path(g, t, g.vertices(), scope.anchor(), |_| true),
    }
}

/// =============== Induced cycles ===============

fn cycle_from(
    rows: &[VertexSet],
    first: usize,
    end: usize,
    set: VertexSet,
    remaining: usize,
    allowed: VertexSet,
) -> bool {
    let candidates = rows[end] & allowed & !set;
    if remaining == 1 {
        let closing = bit(end) | bit(first);
        return members(candidates & rows[first]).any(|v| rows[v] & set == closing);
    }
    members(candidates).any(|v| {
        rows[v] & set == bit(end)
            && cycle_from(rows, first, v, set | bit(v), remaining - 1, allowed)
    })
}

/// Induced cycle on `c` vertices through `z`, using only `allowed` vertices.
pub fn induced_cycle_through(g: &Graph, z: usize, c: usize, allowed: VertexSet) -> bool {
    if c < 3 || allowed & bit(z) == 0 {
        return false;
    }
    cycle_from(g.rows(), z, z, bit(z), c - 1, allowed & g.vertices())
}

fn induced_cycle_within(g: &Graph, c: usize, allowed: VertexSet) -> bool {
    // Every cycle is found from its smallest vertex.
    members(allowed).any(|s| induced_cycle_through(g, s, c, allowed & !first_n(s)))
}

pub fn contains_induced_cycle(g: &Graph, c: usize, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => induced_cycle_through(g, z, c, g.vertices()),
        Scope::All => induced_cycle_within(g, c, g.vertices()),
    }
}

/// =============== Cliques ===============

fn has_clique(rows: &[VertexSet], candidates: VertexSet, size: usize) -> bool {
    if size == 0 {
        return true;
    }
    if (candidates.count_ones() as usize) < size {
        return false;
    }
    members(candidates).any(|v| has_clique(rows, candidates & rows[v] & !first_n(v + 1), size - 1))
}

/// Complete subgraph on `size` vertices.
pub fn contains_clique(g: &Graph, size: usize, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => size >= 1 && has_clique(g.rows(), g.nbhd(z), size - 1),
        Scope::All => has_clique(g.rows(), g.vertices(), size),
    }
}

pub fn contains_triangle(g: &Graph, scope: Scope) -> bool {
    contains_clique(g, 3, scope)
}

/// =============== Diamonds ===============

/// K4 minus an edge as a (not necessarily induced) subgraph.
pub fn contains_diamond(g: &Graph, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => {
            let nz = g.nbhd(z);
            members(nz).any(|a| {
                // z on the middle edge, or z one of the two tips.
                (g.nbhd(a) & nz).count_ones() >= 2
                    || members(g.nbhd(a) & nz).any(|b| (g.nbhd(a) & g.nbhd(b)).count_ones() >= 2)
            })
        }
        Scope::All => g
            .edges()
            .any(|(a, b)| (g.nbhd(a) & g.nbhd(b)).count_ones() >= 2),
    }
}

fn has_non_edge(g: &Graph, set: VertexSet) -> bool {
    members(set).any(|p| set & !g.nbhd(p) & !bit(p) != 0)
}

pub fn contains_induced_diamond(g: &Graph, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => {
            let nz = g.nbhd(z);
            members(nz).any(|a| {
                let common = g.nbhd(a) & nz;
                // z on the middle edge za: two non-adjacent common neighbours.
                if has_non_edge(g, common) {
                    return true;
                }
                // z a tip: middle edge ab, other tip w not adjacent to z.
                members(common).any(|b| g.nbhd(a) & g.nbhd(b) & !nz & !bit(z) != 0)
            })
        }
        Scope::All => g
            .edges()
            .any(|(a, b)| has_non_edge(g, g.nbhd(a) & g.nbhd(b))),
    }
}

/// =============== Wheels ===============

/// The 5-wheel: a hub adjacent to every vertex of a 5-cycle. Rims are found
/// as induced 5-cycles inside the hub's neighbourhood, which finds every W5
/// of a K4-free graph.
pub fn contains_w5(g: &Graph, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => {
            induced_cycle_within(g, 5, g.nbhd(z))
                || members(g.nbhd(z)).any(|h| induced_cycle_through(g, z, 5, g.nbhd(h)))
        }
        Scope::All => (0..g.order()).any(|h| induced_cycle_within(g, 5, g.nbhd(h))),
    }
}

/// =============== Gem, bull, fork ===============

/// P4 plus a vertex dominating it, checked from every possible hub.
pub fn contains_gem(g: &Graph, scope: Scope) -> bool {
    match scope {
        Scope::Newest(z) => {
            find_induced_path(g, 4, g.nbhd(z), None, |_| true)
                || members(g.nbhd(z))
                    .any(|h| find_induced_path(g, 4, g.nbhd(h), Some(z), |_| true))
        }
        Scope::All => (0..g.order()).any(|h| find_induced_path(g, 4, g.nbhd(h), None, |_| true)),
    }
}

/// Triangle `abc` with pendant `d` at `a` and pendant `e` at `b`.
pub fn contains_bull(g: &Graph, scope: Scope) -> bool {
    let n = g.order();
    for a in 0..n {
        for b in members(g.nbhd(a)) {
            for c in members(g.nbhd(a) & g.nbhd(b)) {
                let nc = g.nbhd(c) | bit(c);
                let ds = g.nbhd(a) & !g.nbhd(b) & !nc & !bit(b);
                for d in members(ds) {
                    let es = g.nbhd(b) & !g.nbhd(a) & !nc & !bit(a) & !g.nbhd(d) & !bit(d);
                    for e in members(es) {
                        let set = bit(a) | bit(b) | bit(c) | bit(d) | bit(e);
                        if scope.admits(set) {
                            return true;
                        }
                    }
                }
            }
        }
    }
    false
}

/// `K_{1,4}` with two of its edges subdivided: centre `c`, leaves `l1..l4`,
/// and `p1`, `p2` hanging off `l1`, `l2`.
pub fn contains_fork(g: &Graph, scope: Scope) -> bool {
    let n = g.order();
    for c in 0..n {
        let nc = g.nbhd(c);
        let closed_c = nc | bit(c);
        for l1 in members(nc) {
            for l2 in members(nc & !g.nbhd(l1) & !first_n(l1 + 1)) {
                let ps1 = g.nbhd(l1) & !closed_c & !g.nbhd(l2);
                let ps2 = g.nbhd(l2) & !closed_c & !g.nbhd(l1);
                for p1 in members(ps1) {
                    for p2 in members(ps2 & !g.nbhd(p1) & !bit(p1)) {
                        let core = bit(c) | bit(l1) | bit(l2) | bit(p1) | bit(p2);
                        let rest = nc
                            & !(g.nbhd(l1) | g.nbhd(l2) | g.nbhd(p1) | g.nbhd(p2))
                            & !(bit(l1) | bit(l2));
                        let found = match scope {
                            Scope::Newest(z) if core & bit(z) == 0 => {
                                rest & bit(z) != 0 && rest & !g.nbhd(z) & !bit(z) != 0
                            }
                            _ => has_non_edge(g, rest),
                        };
                        if found {
                            return true;
                        }
                    }
                }
            }
        }
    }
    false
}

/// =============== P4 + P1 ===============

/// An induced P4 together with a vertex adjacent to none of it.
pub fn contains_p4_plus_p1(g: &Graph, scope: Scope) -> bool {
    let all = g.vertices();
    let has_isolated_partner = |p: &[usize]| {
        let closed = p.iter().fold(0, |acc, &v| acc | bit(v) | g.nbhd(v));
        all & !closed != 0
    };
    match scope {
        Scope::Newest(z) => {
            find_induced_path(g, 4, all & !g.nbhd(z) & !bit(z), None, |_| true)
                || find_induced_path(g, 4, all, Some(z), has_isolated_partner)
        }
        Scope::All => find_induced_path(g, 4, all, None, has_isolated_partner),
    }
}

/// =============== Girth ===============

/// Length of a shortest cycle through `z`.
pub fn shortest_cycle_through(g: &Graph, z: usize) -> Option<usize> {
    let nz = g.nbhd(z);
    let mut best: Option<usize> = None;
    // BFS in G - z from each neighbour towards the others.
    for a in members(nz) {
        let mut seen = bit(a) | bit(z);
        let mut frontier = bit(a);
        let mut dist = 0;
        while frontier != 0 {
            if best.is_some_and(|b| dist + 2 >= b) {
                break;
            }
            if dist > 0 && frontier & nz != 0 {
                best = Some(best.map_or(dist + 2, |b| b.min(dist + 2)));
                break;
            }
            let mut next = 0;
            for v in members(frontier) {
                next |= g.nbhd(v);
            }
            next &= !seen;
            seen |= next;
            frontier = next;
            dist += 1;
        }
    }
    best
}

pub fn girth(g: &Graph) -> Option<usize> {
    (0..g.order()).filter_map(|z| shortest_cycle_through(g, z)).min()
}

/// Some cycle with fewer than `bound` vertices.
pub fn has_cycle_shorter_than(g: &Graph, bound: usize, scope: Scope) -> bool {
    let short = |z: usize| shortest_cycle_through(g, z).is_some_and(|len| len < bound);
    match scope {
        Scope::Newest(z) => short(z),
        Scope::All => (0..g.order()).any(short),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path(n: usize) -> Graph {
        let edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
        Graph::from_edges(n, &edges)
    }

    fn wheel(rim: usize) -> Graph {
        let mut edges: Vec<_> = (0..rim).map(|i| (i, (i + 1) % rim)).collect();
        edges.extend((0..rim).map(|i| (i, rim)));
        Graph::from_edges(rim + 1, &edges)
    }

    #[rstest]
    #[case(5, 5, true)]
    #[case(5, 6, false)]
    #[case(7, 6, true)]
    fn paths_in_paths(#[case] n: usize, #[case] t: usize, #[case] expected: bool) {
        let g = path(n);
        assert_eq!(contains_induced_path(&g, t, Scope::All, None), expected);
        for z in 0..n {
            assert_eq!(contains_induced_path(&g, t, Scope::Newest(z), None), expected);
        }
    }

    #[test]
    fn newest_scope_finds_interior_anchor() {
        // P5 with the anchor in the middle.
        let g = Graph::from_edges(5, &[(0, 1), (1, 4), (4, 2), (2, 3)]);
        assert!(contains_induced_path(&g, 5, Scope::Newest(4), None));
        assert!(!contains_induced_path(&g, 6, Scope::Newest(4), None));
    }

    #[test]
    fn cycles_have_long_paths_but_not_too_long() {
        let c7 = Graph::cycle(7);
        assert!(contains_induced_path(&c7, 6, Scope::All, None));
        assert!(!contains_induced_path(&c7, 7, Scope::All, None));
        assert!(contains_induced_cycle(&c7, 7, Scope::Newest(3)));
        assert!(!contains_induced_cycle(&c7, 5, Scope::All));
    }

    #[test]
    fn antiholes_are_p5_free() {
        for n in [7, 9] {
            assert!(!contains_induced_path(&Graph::antihole(n), 5, Scope::All, None));
            assert!(contains_induced_path(&Graph::antihole(n), 4, Scope::All, None));
        }
    }

    #[test]
    fn ring_remembers_paths() {
        let mut ring = PathRing::new();
        let g = path(5);
        assert!(contains_induced_path(&g, 5, Scope::All, Some(&mut ring)));
        assert_eq!(ring.len(), 1);
        assert!(ring.find(&g, Scope::All).is_some());
        let mut closed = g.clone();
        closed.add_edge(0, 4);
        assert!(ring.find(&closed, Scope::All).is_none());
        for _ in 0..(RING_CAPACITY + 3) {
            ring.push(&[0, 1]);
        }
        assert_eq!(ring.len(), RING_CAPACITY);
    }

    #[test]
    fn cliques_and_triangles() {
        let k5 = Graph::complete(5);
        assert!(contains_clique(&k5, 5, Scope::Newest(4)));
        assert!(!contains_clique(&k5, 6, Scope::All));
        assert!(!contains_triangle(&Graph::cycle(5), Scope::All));
        assert!(contains_triangle(&wheel(5), Scope::Newest(5)));
    }

    #[test]
    fn diamonds() {
        let diamond = Graph::from_edges(4, &[(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)]);
        for z in 0..4 {
            assert!(contains_diamond(&diamond, Scope::Newest(z)));
            assert!(contains_induced_diamond(&diamond, Scope::Newest(z)));
        }
        let k4 = Graph::complete(4);
        assert!(contains_diamond(&k4, Scope::All));
        assert!(!contains_induced_diamond(&k4, Scope::All));
        assert!(!contains_induced_diamond(&k4, Scope::Newest(3)));
    }

    #[test]
    fn wheels() {
        let w5 = wheel(5);
        assert!(contains_w5(&w5, Scope::All));
        assert!(contains_w5(&w5, Scope::Newest(5)));
        assert!(contains_w5(&w5, Scope::Newest(2)));
        assert!(!contains_w5(&wheel(6), Scope::All));
    }

    #[test]
    fn gem_bull_fork() {
        let gem = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (4, 0), (4, 1), (4, 2), (4, 3)]);
        assert!(contains_gem(&gem, Scope::All));
        assert!(contains_gem(&gem, Scope::Newest(4)));
        assert!(contains_gem(&gem, Scope::Newest(0)));
        assert!(contains_gem(&wheel(5), Scope::All));
        assert!(!contains_gem(&wheel(4), Scope::All));

        let bull = Graph::from_edges(5, &[(0, 1), (1, 2), (0, 2), (0, 3), (1, 4)]);
        assert!(contains_bull(&bull, Scope::All));
        assert!(contains_bull(&bull, Scope::Newest(4)));
        assert!(!contains_bull(&Graph::cycle(5), Scope::All));

        let fork = Graph::from_edges(7, &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 5), (2, 6)]);
        assert!(contains_fork(&fork, Scope::All));
        for z in 0..7 {
            assert!(contains_fork(&fork, Scope::Newest(z)));
        }
        let mut spoiled = fork.clone();
        spoiled.add_edge(3, 4);
        assert!(!contains_fork(&spoiled, Scope::All));
    }

    #[test]
    fn p4_plus_p1() {
        let mut g = path(4);
        g.add_vertex(0);
        assert!(contains_p4_plus_p1(&g, Scope::All));
        assert!(contains_p4_plus_p1(&g, Scope::Newest(4)));
        assert!(!contains_p4_plus_p1(&path(5), Scope::All));
        assert!(contains_p4_plus_p1(&path(6), Scope::All));
    }

    #[test]
    fn girth_of_small_graphs() {
        assert_eq!(girth(&Graph::cycle(7)), Some(7));
        assert_eq!(girth(&path(5)), None);
        assert_eq!(girth(&wheel(5)), Some(3));
        let c4 = Graph::cycle(4);
        assert!(has_cycle_shorter_than(&c4, 5, Scope::Newest(0)));
        assert!(!has_cycle_shorter_than(&c4, 4, Scope::All));
    }
}
