//! Exact backtracking colouring.
//!
//! Every query runs on a [`ColouringProblem`]: the live graph with some
//! vertices switched off and, optionally, a few extra edges. Colours are
//! numbered from 1; `None` means no proper colouring fits in the budget.

use crate::graph::{Graph, VertexSet, bit, members};

/// A proper colouring found by the oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Colouring {
    colours: Vec<u8>,
    used: usize,
}

impl Colouring {
    /// Colour of `v`, or 0 if `v` was not part of the problem.
    #[inline]
    pub fn colour_of(&self, v: usize) -> u8 {
        self.colours[v]
    }

    /// Number of distinct colours used.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Set of vertices carrying colour `c`.
    pub fn class(&self, c: u8) -> VertexSet {
        self.colours
            .iter()
            .enumerate()
            .filter(|&(_, &x)| x == c)
            .fold(0, |acc, (v, _)| acc | bit(v))
    }
}

/// One colouring query: rows restricted to `active`, plus optional extra edges.
#[derive(Clone, Debug)]
pub struct ColouringProblem {
    rows: Vec<VertexSet>,
    active: VertexSet,
}

impl ColouringProblem {
    pub fn new(g: &Graph) -> Self {
        ColouringProblem {
            rows: g.rows().to_vec(),
            active: g.vertices(),
        }
    }

    /// Drops `removed` from the problem.
    pub fn without(mut self, removed: VertexSet) -> Self {
        self.active &= !removed;
        self
    }

    /// Adds edges between `u` and every vertex of `others`.
    pub fn with_edges(mut self, u: usize, others: VertexSet) -> Self {
        let others = others & !bit(u);
        self.rows[u] |= others;
        for w in members(others) {
            self.rows[w] |= bit(u);
        }
        self
    }

    pub fn active(&self) -> VertexSet {
        self.active
    }

    /// A colouring with at most `k` colours.
    pub fn colour(&self, k: usize) -> Option<Colouring> {
        Search::new(self, k).run(&[], k)
    }

    pub fn is_colourable(&self, k: usize) -> bool {
        self.colour(k).is_some()
    }

    /// A colouring with at most `k` colours in which every vertex of `same`
    /// receives colour 1. `None` as well when `same` is not independent.
    pub fn colour_with_same(&self, k: usize, same: VertexSet) -> Option<Colouring> {
        let same = same & self.active;
        if k == 0 && same != 0 {
            return None;
        }
        if members(same).any(|v| self.rows[v] & same != 0) {
            return None;
        }
        let start: Vec<(usize, u8)> = members(same).map(|v| (v, 1)).collect();
        Search::new(self, k).run(&start, k)
    }

    /// A colouring with at most `k` colours extending `start`.
    ///
    /// # Panics
    /// If `start` uses a colour outside `1..=k`, names an inactive vertex, or
    /// gives two adjacent vertices the same colour.
    pub fn colour_from(&self, k: usize, start: &[(usize, u8)]) -> Option<Colouring> {
        for &(v, c) in start {
            assert!(
                c >= 1 && (c as usize) <= k,
                "start colour {c} of vertex {v} outside 1..={k}"
            );
            assert!(self.active & bit(v) != 0, "start vertex {v} is not active");
            for &(w, d) in start {
                assert!(
                    !(c == d && self.rows[v] & bit(w) != 0),
                    "adjacent vertices {v} and {w} share start colour {c}"
                );
            }
        }
        Search::new(self, k).run(start, k)
    }

    /// Smallest number of colours of a proper colouring.
    pub fn chromatic_number(&self) -> usize {
        let n = self.active.count_ones() as usize;
        Search::new(self, n)
            .run(&[], 1)
            .map_or(0, |c| c.used())
    }
}

pub fn is_colourable(g: &Graph, k: usize) -> bool {
    ColouringProblem::new(g).is_colourable(k)
}

pub fn chromatic_number(g: &Graph) -> usize {
    ColouringProblem::new(g).chromatic_number()
}

/// =============== Backtracking state ===============

struct Search<'a> {
    rows: &'a [VertexSet],
    /// Colours are `1..stride`.
    stride: usize,
    colour: Vec<u8>,
    /// How many coloured neighbours of `v` carry colour `c`, at `v * stride + c`.
    blocked: Vec<u8>,
    /// Number of distinct colours forbidden at each vertex.
    nofc: Vec<u8>,
    uncoloured: VertexSet,
    /// One more than the best colour count found so far.
    minsofar: usize,
    good_enough: usize,
    best: Option<Vec<u8>>,
    done: bool,
}

impl<'a> Search<'a> {
    fn new(problem: &'a ColouringProblem, bound: usize) -> Self {
        let n = problem.rows.len();
        let stride = bound + 1;
        Search {
            rows: &problem.rows,
            stride,
            colour: vec![0; n],
            blocked: vec![0; n * stride],
            nofc: vec![0; n],
            uncoloured: problem.active,
            minsofar: bound + 1,
            good_enough: 0,
            best: None,
            done: false,
        }
    }

    /// Runs the search and stops early once at most `good_enough` colours suffice.
    fn run(mut self, start: &[(usize, u8)], good_enough: usize) -> Option<Colouring> {
        self.good_enough = good_enough;
        let mut used = 0;
        for &(v, c) in start {
            if self.colour[v] != 0 {
                continue;
            }
            if self.blocked[v * self.stride + c as usize] > 0 {
                return None;
            }
            self.assign(v, c);
            used = used.max(c as usize);
        }
        if used >= self.minsofar {
            return None;
        }
        if self.uncoloured != 0
            && members(self.uncoloured).any(|w| self.nofc[w] as usize >= self.minsofar - 1)
        {
            return None;
        }
        self.colour_next(used);
        let best = self.best?;
        let used = best
            .iter()
            .filter(|&&c| c != 0)
            .fold(0u64, |acc, &c| acc | (1u64 << c))
            .count_ones() as usize;
        Some(Colouring { colours: best, used })
    }

    fn colour_next(&mut self, used: usize) {
        if self.uncoloured == 0 {
            self.minsofar = used;
            self.best = Some(self.colour.clone());
            if used <= self.good_enough {
                self.done = true;
            }
            return;
        }

        // Most forbidden colours first, ties broken by uncoloured degree.
        let mut next = usize::MAX;
        let mut key = (0u8, 0u32);
        for w in members(self.uncoloured) {
            let k = (self.nofc[w], (self.rows[w] & self.uncoloured).count_ones());
            if next == usize::MAX || k > key {
                next = w;
                key = k;
            }
        }

        let mut c = 1;
        while c <= used + 1 && c < self.minsofar {
            if self.blocked[next * self.stride + c] == 0 {
                let feasible = self.assign(next, c as u8);
                if feasible {
                    self.colour_next(used.max(c));
                }
                self.unassign(next, c as u8);
                if self.done {
                    return;
                }
            }
            c += 1;
        }
    }

    /// Colours `v` with `c` and reports whether every uncoloured neighbour
    /// still has a colour below the bound.
    fn assign(&mut self, v: usize, c: u8) -> bool {
        self.colour[v] = c;
        self.uncoloured &= !bit(v);
        let mut feasible = true;
        for w in members(self.rows[v] & self.uncoloured) {
            let slot = w * self.stride + c as usize;
            if self.blocked[slot] == 0 {
                self.nofc[w] += 1;
                if self.nofc[w] as usize >= self.minsofar - 1 {
                    feasible = false;
                }
            }
            self.blocked[slot] += 1;
        }
        feasible
    }

    fn unassign(&mut self, v: usize, c: u8) {
        for w in members(self.rows[v] & self.uncoloured) {
            let slot = w * self.stride + c as usize;
            self.blocked[slot] -= 1;
            if self.blocked[slot] == 0 {
                self.nofc[w] -= 1;
            }
        }
        self.colour[v] = 0;
        self.uncoloured |= bit(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_proper(g: &Graph, c: &Colouring, active: VertexSet) -> bool {
        members(active).all(|v| {
            c.colour_of(v) != 0 && members(g.nbhd(v) & active).all(|w| c.colour_of(w) != c.colour_of(v))
        })
    }

    #[rstest]
    #[case(5)]
    #[case(7)]
    #[case(9)]
    fn odd_cycles_need_three_colours(#[case] n: usize) {
        let g = Graph::cycle(n);
        assert!(!is_colourable(&g, 2));
        let c = ColouringProblem::new(&g).colour(3).unwrap();
        assert!(is_proper(&g, &c, g.vertices()));
        assert_eq!(chromatic_number(&g), 3);
    }

    #[rstest]
    #[case(Graph::complete(4), 4)]
    #[case(Graph::antihole(7), 4)]
    #[case(Graph::antihole(9), 5)]
    #[case(Graph::cycle(6), 2)]
    #[case(Graph::from_edges(3, &[]), 1)]
    fn known_chromatic_numbers(#[case] g: Graph, #[case] chi: usize) {
        assert_eq!(chromatic_number(&g), chi);
        assert!(is_colourable(&g, chi));
        assert!(!is_colourable(&g, chi - 1));
    }

    #[test]
    fn planted_colouring_is_recovered() {
        // Complete 4-partite graph with parts of size 2.
        let mut edges = Vec::new();
        for u in 0..8 {
            for v in (u + 1)..8 {
                if u / 2 != v / 2 {
                    edges.push((u, v));
                }
            }
        }
        let g = Graph::from_edges(8, &edges);
        let c = ColouringProblem::new(&g).colour(4).unwrap();
        assert!(is_proper(&g, &c, g.vertices()));
        assert!(ColouringProblem::new(&g).colour(3).is_none());
    }

    #[test]
    fn removed_vertices_and_extra_edges() {
        let g = Graph::complete(4);
        let p = ColouringProblem::new(&g).without(bit(3));
        assert!(p.is_colourable(3));
        assert!(!p.is_colourable(2));
        let path = Graph::from_edges(3, &[(0, 1), (1, 2)]);
        assert!(ColouringProblem::new(&path).is_colourable(2));
        assert!(!ColouringProblem::new(&path).with_edges(0, bit(2)).is_colourable(2));
    }

    #[test]
    fn same_colour_requests() {
        let c5 = Graph::cycle(5);
        let p = ColouringProblem::new(&c5);
        let c = p.colour_with_same(3, bit(0) | bit(2)).unwrap();
        assert_eq!(c.colour_of(0), c.colour_of(2));
        assert!(p.colour_with_same(3, bit(0) | bit(1)).is_none());
        // In C4 opposite vertices must share a colour in every 2-colouring.
        let c4 = Graph::cycle(4);
        assert!(ColouringProblem::new(&c4).colour_with_same(2, bit(0) | bit(2)).is_some());
        let c6 = Graph::cycle(6);
        assert!(ColouringProblem::new(&c6).colour_with_same(2, bit(0) | bit(3)).is_none());
    }

    #[test]
    fn start_colourings_are_extended() {
        let c4 = Graph::cycle(4);
        let p = ColouringProblem::new(&c4);
        assert!(p.colour_from(2, &[(0, 1), (1, 2)]).is_some());
        assert!(p.colour_from(2, &[(0, 1), (2, 2)]).is_none());
        let c = p.colour_from(3, &[(0, 3), (2, 1)]).unwrap();
        assert_eq!(c.colour_of(0), 3);
        assert!(is_proper(&c4, &c, c4.vertices()));
    }

    #[test]
    #[should_panic]
    fn malformed_start_colouring_is_fatal() {
        let c4 = Graph::cycle(4);
        ColouringProblem::new(&c4).colour_from(2, &[(0, 1), (1, 1)]);
    }

    #[test]
    fn empty_problem_uses_no_colours() {
        let g = Graph::complete(1);
        let c = ColouringProblem::new(&g).without(bit(0)).colour(1).unwrap();
        assert_eq!(c.used(), 0);
    }
}
