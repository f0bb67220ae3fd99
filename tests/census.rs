mod common;

use common::{brute_force, config, forms};
use critgen::{Split, generate};
use rstest::rstest;

#[rstest]
#[case("6 c2")]
#[case("6 c2 g4")]
#[case("6 c3")]
#[case("6 c3 vertexcritical")]
#[case("6 c3 P5")]
#[case("6 c3 C4")]
#[case("6 c3 C5 vertexcritical")]
#[case("6 c3 diamondfree")]
#[case("6 c3 K4 vertexcritical")]
#[case("6 c3 bull")]
#[case("6 c3 fork")]
#[case("6 c3 gem")]
#[case("6 c3 P4P1")]
#[case("6 c3 planar")]
#[case("6 c1 bipartite")]
#[case("6 c2 bipartite")]
#[case("6 c4")]
fn matches_brute_force(#[case] tokens: &str, #[values(false, true)] from_single_vertex: bool) {
    let mut config = config(tokens);
    config.from_single_vertex = from_single_vertex;
    let expected = brute_force(&config);
    let (graphs, _) = generate(config).unwrap();
    assert_eq!(graphs.len(), expected.len(), "{tokens}");
    assert_eq!(forms(&graphs), forms(&expected), "{tokens}");
}

#[test]
fn three_critical_p6_free_graphs_are_c3_and_c5() {
    let (graphs, summary) = generate(config("12 c2 P6")).unwrap();
    assert_eq!(forms(&graphs), forms(&[critgen::Graph::cycle(3), critgen::Graph::cycle(5)]));
    assert_eq!(summary.emitted(), 2);
}

#[test]
fn first_four_critical_p5_free_graph_is_k4() {
    let (graphs, _) = generate(config("8 c3 P5")).unwrap();
    assert_eq!(graphs.first(), Some(&critgen::Graph::complete(4)));
}

#[rstest]
#[case("7 c3 P5")]
#[case("7 c3 vertexcritical")]
#[case("8 c2 P7")]
#[case("7 c3 diamondfree P6")]
fn lemmas_do_not_lose_graphs(#[case] tokens: &str) {
    let with = config(tokens);
    let mut without = with.clone();
    without.lemmas = false;
    let mut fewest = with.clone();
    fewest.least_children = Some(5);

    let reference = forms(&generate(without).unwrap().0);
    assert_eq!(forms(&generate(with).unwrap().0), reference, "{tokens}");
    assert_eq!(forms(&generate(fewest).unwrap().0), reference, "{tokens}");
}

#[rstest]
#[case("10 c3 P5")]
#[case("10 c2 P8")]
#[case("9 c3 P6 vertexcritical")]
fn seeded_split_branches_cover_the_run(#[case] tokens: &str) {
    let whole = config(tokens);
    assert!(!whole.from_single_vertex);
    let reference = forms(&generate(whole.clone()).unwrap().0);

    let mut union = Vec::new();
    for rest in 0..3 {
        let mut branch = whole.clone();
        branch.split = Some(Split { rest, modulo: 3 });
        union.extend(generate(branch).unwrap().0);
    }
    assert_eq!(forms(&union), reference, "{tokens}");
}

#[test]
fn bipartite_class_has_only_an_edge() {
    let (graphs, _) = generate(config("8 c1 bipartite")).unwrap();
    assert_eq!(graphs, vec![critgen::Graph::complete(2)]);
    assert!(generate(config("8 c3 bipartite")).unwrap().0.is_empty());
}
