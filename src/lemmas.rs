//! Pruning lemmas.
//!
//! A colourable graph that is not yet critical must be broken up by some
//! later vertex: a dominated vertex needs a neighbour its dominator lacks, a
//! vertex of low degree needs more neighbours, and so on. Every lemma finds
//! one such structure and turns it into a [`Target`]; the search then only
//! tries neighbourhoods for the next vertex that attack the target. The
//! lemmas run in a fixed priority order and the first hit wins.

use crate::colouring::ColouringProblem;
use crate::domination::{ColourDomination, neighbourhood_takes_all_colours};
use crate::extension::{ChildCheck, Pass};
use crate::graph::{Graph, VertexSet, bit, first_n, members};
use itertools::Itertools;

/// What the next vertex has to attack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// `N(attach)` is (colour-)dominated by `N(avoid)`.
    Similar { attach: usize, avoid: usize },
    /// Two disjoint labelled copies of one pattern, `a` dominated by `b`
    /// position by position.
    Pair { a: Vec<usize>, b: Vec<usize> },
    LowDegree { vertex: usize },
    AtLeastOne { vertices: VertexSet },
    Unrestricted,
}

impl Target {
    /// Enumerator sweeps for this target on the parent graph `g`.
    pub fn passes(&self, g: &Graph) -> Vec<Pass> {
        let all = g.vertices();
        match self {
            &Target::Similar { attach, avoid } => vec![Pass {
                required: bit(attach),
                forbidden: bit(avoid),
                at_least_one: all,
                check: Some(ChildCheck::ShareColour {
                    removed: bit(attach),
                    partner: avoid,
                }),
            }],
            Target::Pair { a, b } => {
                let side = vertex_set(a);
                a.iter()
                    .zip(b)
                    .map(|(&ai, &bi)| Pass {
                        required: bit(ai),
                        forbidden: bit(bi),
                        at_least_one: all,
                        check: Some(ChildCheck::ShareColour {
                            removed: side,
                            partner: bi,
                        }),
                    })
                    .collect()
            }
            &Target::LowDegree { vertex } => vec![Pass {
                required: bit(vertex),
                forbidden: 0,
                at_least_one: all,
                check: Some(ChildCheck::FreshColour {
                    vertex,
                    old_nbhd: g.nbhd(vertex),
                }),
            }],
            &Target::AtLeastOne { vertices } => vec![Pass {
                at_least_one: vertices,
                ..Pass::unrestricted(all)
            }],
            Target::Unrestricted => vec![Pass::unrestricted(all)],
        }
    }
}

/// The colourable parent graph a lemma looks at.
#[derive(Clone, Copy, Debug)]
pub struct LemmaContext<'g> {
    pub g: &'g Graph,
    /// Colour budget.
    pub k: usize,
}

pub trait Lemma {
    fn name(&self) -> &'static str;

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target>;

    /// Every target this lemma would accept, best first. Lemmas that do not
    /// offer a choice return at most the one from [`Lemma::detect`].
    fn candidates(&self, ctx: &LemmaContext<'_>) -> Vec<Target> {
        self.detect(ctx).into_iter().collect()
    }
}

/// All lemmas in priority order, ending with the unrestricted fallback.
pub fn standard_lemmas() -> Vec<Box<dyn Lemma>> {
    vec![
        Box::new(SimilarVertices),
        Box::new(ColourDominatedSimilar),
        Box::new(LowDegree),
        Box::new(ColourDominatedLowDegree),
        Box::new(SimilarPairs),
        Box::new(ColourDominatedPairs),
        Box::new(Crowns),
        Box::new(CutVertex),
        Box::new(Fallback),
    ]
}

/// Only the fallback: every non-empty neighbourhood is tried.
pub fn fallback_only() -> Vec<Box<dyn Lemma>> {
    vec![Box::new(Fallback)]
}

fn vertex_set(vertices: &[usize]) -> VertexSet {
    vertices.iter().fold(0, |acc, &v| acc | bit(v))
}

/// Vertices ordered by increasing degree, ties by index.
fn by_degree(g: &Graph) -> Vec<usize> {
    (0..g.order()).sorted_by_key(|&v| (g.degree(v), v)).collect()
}

/// =============== Similar vertices ===============

/// `N(u)` is contained in `N(v)`.
pub struct SimilarVertices;

impl SimilarVertices {
    fn pairs(g: &Graph) -> Vec<(usize, usize)> {
        let n = g.order();
        (0..n)
            .cartesian_product(0..n)
            .filter(|&(u, v)| u != v && g.nbhd(u) & !g.nbhd(v) == 0)
            .sorted_by_key(|&(u, v)| (g.degree(u), std::cmp::Reverse(g.degree(v)), u, v))
            .collect()
    }
}

impl Lemma for SimilarVertices {
    fn name(&self) -> &'static str {
        "similar vertices"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        Self::pairs(ctx.g)
            .into_iter()
            .next()
            .map(|(attach, avoid)| Target::Similar { attach, avoid })
    }

    fn candidates(&self, ctx: &LemmaContext<'_>) -> Vec<Target> {
        Self::pairs(ctx.g)
            .into_iter()
            .map(|(attach, avoid)| Target::Similar { attach, avoid })
            .collect()
    }
}

/// `N(u)` is contained in `N(v)` plus the hidden edges of `v` in `G - u`.
pub struct ColourDominatedSimilar;

impl Lemma for ColourDominatedSimilar {
    fn name(&self) -> &'static str {
        "colour-dominated similar vertices"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        let g = ctx.g;
        let order = by_degree(g);
        let mut domination = ColourDomination::new(g, ctx.k);
        for &u in &order {
            if let Some(&v) = order.iter().rev().find(|&&v| domination.dominates(u, v)) {
                return Some(Target::Similar { attach: u, avoid: v });
            }
        }
        None
    }
}

/// =============== Low degree ===============

/// A vertex with fewer than `k` neighbours.
pub struct LowDegree;

impl Lemma for LowDegree {
    fn name(&self) -> &'static str {
        "low degree"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        (0..ctx.g.order())
            .filter(|&v| ctx.g.degree(v) < ctx.k)
            .min_by_key(|&v| ctx.g.degree(v))
            .map(|vertex| Target::LowDegree { vertex })
    }
}

/// A vertex whose neighbourhood never sees all `k` colours in `G - v`.
pub struct ColourDominatedLowDegree;

impl Lemma for ColourDominatedLowDegree {
    fn name(&self) -> &'static str {
        "colour-dominated low degree"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        by_degree(ctx.g)
            .into_iter()
            .find(|&v| !neighbourhood_takes_all_colours(ctx.g, v, ctx.k))
            .map(|vertex| Target::LowDegree { vertex })
    }
}

/// =============== Similar structures ===============

/// A small connected pattern. Every vertex after the first is adjacent to
/// an earlier one.
struct Pattern {
    order: usize,
    edges: &'static [(usize, usize)],
}

impl Pattern {
    fn adjacent(&self, i: usize, j: usize) -> bool {
        self.edges.contains(&(i.min(j), i.max(j)))
    }
}

const PATTERNS: [Pattern; 5] = [
    // edge
    Pattern { order: 2, edges: &[(0, 1)] },
    // triangle
    Pattern { order: 3, edges: &[(0, 1), (0, 2), (1, 2)] },
    // diamond, middle edge 1-2
    Pattern { order: 4, edges: &[(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)] },
    // P4
    Pattern { order: 4, edges: &[(0, 1), (1, 2), (2, 3)] },
    // P6
    Pattern { order: 6, edges: &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)] },
];

/// Labelled induced copies of `pattern` in `g`.
fn embeddings(g: &Graph, pattern: &Pattern) -> Vec<Vec<usize>> {
    fn grow(g: &Graph, pattern: &Pattern, partial: &mut Vec<usize>, used: VertexSet, out: &mut Vec<Vec<usize>>) {
        let i = partial.len();
        if i == pattern.order {
            out.push(partial.clone());
            return;
        }
        let mut candidates = g.vertices() & !used;
        if let Some(j) = (0..i).find(|&j| pattern.adjacent(i, j)) {
            candidates &= g.nbhd(partial[j]);
        }
        for x in members(candidates) {
            if (0..i).all(|j| g.has_edge(partial[j], x) == pattern.adjacent(i, j)) {
                partial.push(x);
                grow(g, pattern, partial, used | bit(x), out);
                partial.pop();
            }
        }
    }
    let mut out = Vec::new();
    grow(g, pattern, &mut Vec::with_capacity(pattern.order), 0, &mut out);
    out
}

/// First pair of disjoint copies of `pattern`, smallest degree sum on the
/// `a` side first, that `dominated(a, b)` accepts.
fn disjoint_pair<F>(g: &Graph, pattern: &Pattern, mut dominated: F) -> Option<Target>
where
    F: FnMut(&[usize], &[usize]) -> bool,
{
    let copies = embeddings(g, pattern);
    let by_degree_sum = copies
        .iter()
        .sorted_by_key(|copy| copy.iter().map(|&v| g.degree(v)).sum::<usize>());
    for a in by_degree_sum {
        let side_a = vertex_set(a);
        for b in &copies {
            if side_a & vertex_set(b) == 0 && dominated(a, b) {
                return Some(Target::Pair {
                    a: a.clone(),
                    b: b.clone(),
                });
            }
        }
    }
    None
}

/// Two disjoint copies of an edge, triangle, diamond, P4 or P6 with
/// `N(a_i) - A` inside `N(b_i) - B` for every position `i`.
pub struct SimilarPairs;

impl Lemma for SimilarPairs {
    fn name(&self) -> &'static str {
        "similar pairs"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        let g = ctx.g;
        PATTERNS.iter().find_map(|p| {
            disjoint_pair(g, p, |a, b| {
                let (side_a, side_b) = (vertex_set(a), vertex_set(b));
                a.iter()
                    .zip(b)
                    .all(|(&ai, &bi)| g.nbhd(ai) & !side_a & !(g.nbhd(bi) & !side_b) == 0)
            })
        })
    }
}

/// Two disjoint edges or triangles where `N(a_i) - A` lies in `N(b_i)` plus
/// the hidden edges of `b_i` in `G - A`.
pub struct ColourDominatedPairs;

impl Lemma for ColourDominatedPairs {
    fn name(&self) -> &'static str {
        "colour-dominated pairs"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        let mut domination = ColourDomination::new(ctx.g, ctx.k);
        PATTERNS[..2]
            .iter()
            .find_map(|p| disjoint_pair(ctx.g, p, |a, b| domination.dominates_copy(a, b)))
    }
}

/// =============== Crowns and cut vertices ===============

/// First induced cycle inside `allowed` that `accept` takes.
fn find_induced_cycle<F>(g: &Graph, allowed: VertexSet, mut accept: F) -> Option<Vec<usize>>
where
    F: FnMut(&[usize]) -> bool,
{
    fn extend<F: FnMut(&[usize]) -> bool>(
        g: &Graph,
        allowed: VertexSet,
        path: &mut Vec<usize>,
        set: VertexSet,
        accept: &mut F,
    ) -> bool {
        let first = path[0];
        let end = path[path.len() - 1];
        for v in members(g.nbhd(end) & allowed & !set) {
            let touching = g.nbhd(v) & set;
            if path.len() >= 2 && touching == bit(end) | bit(first) {
                path.push(v);
                if accept(&path[..]) {
                    return true;
                }
                path.pop();
            } else if touching == bit(end) {
                path.push(v);
                if extend(g, allowed, path, set | bit(v), accept) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
    let allowed = allowed & g.vertices();
    for s in members(allowed) {
        // Cycles are found from their smallest vertex.
        let mut path = vec![s];
        if extend(g, allowed & !first_n(s), &mut path, bit(s), &mut accept) {
            return Some(path);
        }
    }
    None
}

/// Induced cycles of vertices with degree exactly `k`: even ones for any
/// `k`, odd ones for `k = 3` when their outer neighbours cannot all share a
/// colour once the cycle is gone.
pub struct Crowns;

impl Crowns {
    fn even(g: &Graph, k: usize) -> Option<Vec<usize>> {
        let tight = (0..g.order()).filter(|&v| g.degree(v) == k).fold(0, |acc, v| acc | bit(v));
        find_induced_cycle(g, tight, |c| c.len() % 2 == 0)
    }

    fn odd(g: &Graph) -> Option<Vec<usize>> {
        let cubic = (0..g.order()).filter(|&v| g.degree(v) == 3).fold(0, |acc, v| acc | bit(v));
        find_induced_cycle(g, cubic, |c| {
            if c.len() % 2 == 0 {
                return false;
            }
            let cycle = vertex_set(c);
            let outer = c.iter().fold(0, |acc, &v| acc | g.nbhd(v)) & !cycle;
            ColouringProblem::new(g)
                .without(cycle)
                .colour_with_same(3, outer)
                .is_none()
        })
    }
}

impl Lemma for Crowns {
    fn name(&self) -> &'static str {
        "crowns"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        let cycle = Self::even(ctx.g, ctx.k).or_else(|| if ctx.k == 3 { Self::odd(ctx.g) } else { None })?;
        Some(Target::AtLeastOne {
            vertices: vertex_set(&cycle),
        })
    }
}

/// Connected components of the subgraph induced by `within`.
fn components(g: &Graph, within: VertexSet) -> Vec<VertexSet> {
    let mut rest = within;
    let mut out = Vec::new();
    while rest != 0 {
        let mut component = bit(rest.trailing_zeros() as usize);
        let mut frontier = component;
        while frontier != 0 {
            let reach = members(frontier).fold(0, |acc, v| acc | g.nbhd(v));
            frontier = reach & rest & !component;
            component |= frontier;
        }
        rest &= !component;
        out.push(component);
    }
    out
}

/// A cut vertex `v` of a connected graph: the smallest component of `G - v`
/// needs another neighbour.
pub struct CutVertex;

impl Lemma for CutVertex {
    fn name(&self) -> &'static str {
        "cut vertex"
    }

    fn detect(&self, ctx: &LemmaContext<'_>) -> Option<Target> {
        let g = ctx.g;
        let all = g.vertices();
        if g.order() < 3 || components(g, all).len() != 1 {
            return None;
        }
        (0..g.order())
            .filter_map(|v| {
                let parts = components(g, all & !bit(v));
                if parts.len() < 2 {
                    return None;
                }
                parts.into_iter().min_by_key(|c| c.count_ones())
            })
            .min_by_key(|c| c.count_ones())
            .map(|vertices| Target::AtLeastOne { vertices })
    }
}

/// =============== Fallback ===============

pub struct Fallback;

impl Lemma for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn detect(&self, _ctx: &LemmaContext<'_>) -> Option<Target> {
        Some(Target::Unrestricted)
    }
}
