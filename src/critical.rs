//! Criticality of graphs that are already known to be uncolourable.

use crate::colouring::ColouringProblem;
use crate::graph::{Graph, bit};

/// Deleting any single vertex leaves a `k`-colourable graph.
///
/// With `skip_newest` the last vertex is not tried: deleting it gives back a
/// parent that is known to be colourable.
pub fn is_vertex_critical(g: &Graph, k: usize, skip_newest: bool) -> bool {
    let n = g.order();
    let last = if skip_newest { n.saturating_sub(1) } else { n };
    let problem = ColouringProblem::new(g);
    (0..last).all(|v| problem.clone().without(bit(v)).is_colourable(k))
}

/// No set of edges can be deleted while keeping the graph uncolourable and
/// inside the class described by `admissible`.
///
/// Edges whose single removal already gives a colourable graph are tried
/// first: every superset of such a removal is colourable as well, so those
/// branches close at once.
pub fn is_edge_critical<F>(g: &mut Graph, k: usize, admissible: F) -> bool
where
    F: Fn(&Graph) -> bool,
{
    let edges: Vec<(usize, usize)> = g.edges().collect();
    let (mut order, rest): (Vec<_>, Vec<_>) = edges.into_iter().partition(|&(u, v)| {
        let without = g.without_edge(u, v);
        ColouringProblem::new(&without).is_colourable(k)
    });
    order.extend(rest);
    !removal_keeps_class(g, k, &order, 0, &admissible)
}

/// Some non-empty subset of `edges[from..]` can be removed with the graph
/// staying uncolourable and admissible.
fn removal_keeps_class<F>(
    g: &mut Graph,
    k: usize,
    edges: &[(usize, usize)],
    from: usize,
    admissible: &F,
) -> bool
where
    F: Fn(&Graph) -> bool,
{
    for i in from..edges.len() {
        let (u, v) = edges[i];
        let mut without = g.without_edge(u, v);
        if ColouringProblem::new(&without).is_colourable(k) {
            continue;
        }
        if admissible(&without) || removal_keeps_class(&mut without, k, edges, i + 1, admissible) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::is_colourable;
    use crate::forbidden::{Scope, contains_induced_cycle, contains_triangle};
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn complete_graphs_are_critical(#[case] k: usize) {
        let mut g = Graph::complete(k + 1);
        assert!(!is_colourable(&g, k));
        assert!(is_vertex_critical(&g, k, false));
        assert!(is_edge_critical(&mut g, k, |_| true));

        let mut minus = Graph::complete(k + 1);
        minus.remove_edge(0, 1);
        assert!(is_colourable(&minus, k));
    }

    #[test]
    fn odd_cycle_with_chord_is_not_vertex_critical() {
        // C5 plus chord 0-2: deleting 3 leaves the triangle 0-1-2.
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)]);
        assert!(!is_colourable(&g, 2));
        assert!(!is_vertex_critical(&g, 2, false));
        // The newest vertex 4 is skipped; vertex 3 is still a counterexample.
        assert!(!is_vertex_critical(&g, 2, true));
    }

    #[test]
    fn edge_criticality_depends_on_the_class() {
        // Diamond with tips 0 and 1: dropping a rim edge keeps a triangle.
        let mut diamond = Graph::from_edges(4, &[(0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert!(!is_colourable(&diamond, 2));
        assert!(!is_edge_critical(&mut diamond, 2, |_| true));
        // Inside the triangle-free class nothing smaller is admissible.
        assert!(is_edge_critical(&mut diamond, 2, |g| !contains_triangle(g, Scope::All)));
        assert!(diamond.is_consistent());
        assert_eq!(diamond.edge_count(), 5);
    }

    #[test]
    fn deeper_removals_are_found() {
        // C7 with chords 0-2 and 0-4. Without 0-2 an induced C5 remains; only
        // after dropping 0-4 as well is the odd hole C7 left.
        let mut g = Graph::cycle(7);
        g.add_edge(0, 2);
        g.add_edge(0, 4);
        assert!(!is_colourable(&g, 2));
        let no_odd_cycle_up_to = |len: usize| {
            move |h: &Graph| {
                !contains_triangle(h, Scope::All)
                    && (5..=len).step_by(2).all(|c| !contains_induced_cycle(h, c, Scope::All))
            }
        };
        assert!(!is_edge_critical(&mut g, 2, no_odd_cycle_up_to(5)));
        assert!(is_edge_critical(&mut g, 2, no_odd_cycle_up_to(7)));
        assert!(g.is_consistent());
        assert_eq!(g.edge_count(), 9);
    }
}
