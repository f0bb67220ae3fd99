//! Colour domination: constraints between vertices that follow from
//! colourability rather than from edges.

use crate::colouring::{Colouring, ColouringProblem};
use crate::graph::{Graph, VertexSet, bit, members};
use itertools::Itertools;
use std::collections::HashMap;

/// What is known about which pairs may share a colour in `G - removed`.
struct Removal {
    problem: ColouringProblem,
    can_share: Vec<VertexSet>,
    cannot_share: Vec<VertexSet>,
}

impl Removal {
    fn record(&mut self, colouring: &Colouring) {
        for c in 1..=colouring.used() as u8 {
            let class = colouring.class(c) & self.problem.active();
            for x in members(class) {
                self.can_share[x] |= class;
            }
        }
    }
}

/// Lazily computed hidden edges of `G - S` for the removed sets `S` asked
/// about so far.
///
/// A hidden edge of `G - S` joins two non-adjacent vertices that receive
/// different colours in every k-colouring of `G - S`.
pub struct ColourDomination<'g> {
    g: &'g Graph,
    k: usize,
    removals: HashMap<VertexSet, Removal>,
}

impl<'g> ColourDomination<'g> {
    pub fn new(g: &'g Graph, k: usize) -> Self {
        ColourDomination {
            g,
            k,
            removals: HashMap::new(),
        }
    }

    fn removal(&mut self, removed: VertexSet) -> &mut Removal {
        let (g, k) = (self.g, self.k);
        self.removals.entry(removed).or_insert_with(|| {
            let n = g.order();
            let mut removal = Removal {
                problem: ColouringProblem::new(g).without(removed),
                can_share: (0..n).map(bit).collect(),
                cannot_share: vec![0; n],
            };
            if let Some(c) = removal.problem.colour(k) {
                removal.record(&c);
            }
            removal
        })
    }

    pub fn is_hidden_edge(&mut self, u: usize, a: usize, b: usize) -> bool {
        self.is_hidden_edge_in(bit(u), a, b)
    }

    /// `a - b` is a hidden edge of `G - removed`.
    pub fn is_hidden_edge_in(&mut self, removed: VertexSet, a: usize, b: usize) -> bool {
        if a == b || (bit(a) | bit(b)) & removed != 0 || self.g.has_edge(a, b) {
            return false;
        }
        let k = self.k;
        let removal = self.removal(removed);
        if removal.can_share[a] & bit(b) != 0 {
            return false;
        }
        if removal.cannot_share[a] & bit(b) != 0 {
            return true;
        }
        match removal.problem.colour_with_same(k, bit(a) | bit(b)) {
            Some(c) => {
                removal.record(&c);
                false
            }
            None => {
                removal.cannot_share[a] |= bit(b);
                removal.cannot_share[b] |= bit(a);
                true
            }
        }
    }

    /// Every neighbour of `u` is adjacent to `v` or joined to it by a hidden
    /// edge of `G - u`.
    pub fn dominates(&mut self, u: usize, v: usize) -> bool {
        if u == v || self.g.has_edge(u, v) {
            return false;
        }
        let rest = self.g.nbhd(u) & !self.g.nbhd(v);
        members(rest).all(|w| self.is_hidden_edge(u, w, v))
    }

    /// Position by position, `a_i` is not adjacent to `b_i` and every
    /// neighbour of `a_i` outside `a` is adjacent to `b_i` or joined to it by
    /// a hidden edge of `G - a`.
    pub fn dominates_copy(&mut self, a: &[usize], b: &[usize]) -> bool {
        let g = self.g;
        let side = a.iter().fold(0, |acc, &v| acc | bit(v));
        a.iter().zip(b).all(|(&ai, &bi)| {
            !g.has_edge(ai, bi)
                && members(g.nbhd(ai) & !side & !g.nbhd(bi)).all(|w| self.is_hidden_edge_in(side, w, bi))
        })
    }
}

/// Some k-colouring of `G - v` uses all `k` colours on `N(v)`.
pub fn neighbourhood_takes_all_colours(g: &Graph, v: usize, k: usize) -> bool {
    let nbhd = g.nbhd(v);
    if (nbhd.count_ones() as usize) < k {
        return false;
    }
    let problem = ColouringProblem::new(g).without(bit(v));
    let Some(c) = problem.colour(k) else {
        return false;
    };
    let used_on_nbhd = members(nbhd).map(|w| c.colour_of(w)).unique().count();
    if used_on_nbhd == k {
        return true;
    }
    // Colours are interchangeable: give a k-subset of N(v) the colours 1..=k.
    members(nbhd).combinations(k).any(|chosen| {
        let start: Vec<(usize, u8)> = chosen
            .iter()
            .enumerate()
            .map(|(i, &w)| (w, (i + 1) as u8))
            .collect();
        problem.colour_from(k, &start).is_some()
    })
}

/// In `G - removed`, vertices `a` and `b` can receive the same colour.
pub fn can_share_colour(g: &Graph, k: usize, removed: VertexSet, a: usize, b: usize) -> bool {
    ColouringProblem::new(g)
        .without(removed)
        .colour_with_same(k, bit(a) | bit(b))
        .is_some()
}

/// In some k-colouring of `G - v`, vertex `x` gets a colour that appears on
/// no vertex of `old_nbhd`.
pub fn can_take_fresh_colour(g: &Graph, k: usize, v: usize, x: usize, old_nbhd: VertexSet) -> bool {
    ColouringProblem::new(g)
        .without(bit(v))
        .with_edges(x, old_nbhd & !bit(v))
        .is_colourable(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_edges_in_an_odd_wheel_minus_hub() {
        // C5 plus a vertex 5 adjacent to 0 and 2: in 3-colourings of the C5
        // vertices 0 and 2 may share, 0 and 1 never (adjacent).
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (5, 0), (5, 2)]);
        let mut dom = ColourDomination::new(&g, 3);
        assert!(!dom.is_hidden_edge(5, 0, 2));
        assert!(!dom.is_hidden_edge(5, 0, 1));
    }

    #[test]
    fn two_colour_parity_creates_hidden_edges() {
        // Path 0-1-2-3 plus vertex 4 adjacent to 0: with 2 colours in G - 4,
        // 0 and 3 lie at odd distance and can never share a colour.
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (4, 0)]);
        let mut dom = ColourDomination::new(&g, 2);
        assert!(dom.is_hidden_edge(4, 0, 3));
        assert!(!dom.is_hidden_edge(4, 0, 2));
        // N(4) = {0} and 0 is hidden-adjacent to 3, so 4 is dominated by 3.
        assert!(dom.dominates(4, 3));
        assert!(!dom.dominates(4, 2));
    }

    #[test]
    fn hidden_edges_after_removing_an_edge() {
        // The path 1-0-5-4-3-2. Without the edge 0-1 the rest is the path
        // 2-3-4-5, where 2 and 5 never share one of two colours.
        let g = Graph::from_edges(6, &[(0, 1), (2, 3), (3, 4), (4, 5), (0, 5)]);
        let side = bit(0) | bit(1);
        let mut two = ColourDomination::new(&g, 2);
        assert!(two.is_hidden_edge_in(side, 5, 2));
        assert!(!two.is_hidden_edge_in(side, 5, 3));
        assert!(!two.is_hidden_edge_in(side, 0, 2));
        assert!(two.dominates_copy(&[0, 1], &[2, 3]));
        let mut three = ColourDomination::new(&g, 3);
        assert!(!three.is_hidden_edge_in(side, 5, 2));
        assert!(!three.dominates_copy(&[0, 1], &[2, 3]));
    }

    #[test]
    fn neighbourhood_colours() {
        // In C4 the two neighbours of 0 share a colour in every 2-colouring.
        let c4 = Graph::cycle(4);
        assert!(!neighbourhood_takes_all_colours(&c4, 0, 2));
        assert!(!neighbourhood_takes_all_colours(&c4, 0, 3));
        // Hub of W5 minus one rim edge: the rim is a P5, 3 colours fit on it.
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (5, 0), (5, 1), (5, 2), (5, 3), (5, 4)]);
        assert!(neighbourhood_takes_all_colours(&g, 5, 3));
        assert!(!neighbourhood_takes_all_colours(&g, 5, 6));
    }

    #[test]
    fn destruction_checks() {
        let c4 = Graph::cycle(4);
        assert!(can_share_colour(&c4, 2, 0, 0, 2));
        assert!(!can_share_colour(&c4, 2, 0, 0, 1));
        // Path 0-1-2 plus vertex 3 adjacent to 2: in G - 1 with 2 colours the
        // vertex 3 can avoid the colour of 0.
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert!(can_take_fresh_colour(&g, 2, 1, 3, bit(0) | bit(2)));
        assert!(!can_take_fresh_colour(&g, 1, 1, 3, bit(0) | bit(2)));
    }
}
