//! Search parameters and their command-line token syntax.

use crate::error::{Error, Result};
use crate::graph::MAX_VERTICES;
use serde::{Deserialize, Serialize};

pub const USAGE: &str = "usage: critgen <n> c<k> [P<x>] [C<x>] [diamondfree] [K4] [K5] [bull] [fork] [gem] \
[P4P1] [planar] [bipartite] [g<x>] [vertexcritical] [mod <rest> <modulo>]";

/// Run only branch `rest` out of `modulo` at the split level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub rest: usize,
    pub modulo: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Largest vertex count generated.
    pub max_vertices: usize,
    /// Colour budget: output graphs are not `k`-colourable.
    pub k: usize,
    /// Forbidden induced path on this many vertices.
    pub path: Option<usize>,
    /// Forbidden induced cycle on this many vertices.
    pub cycle: Option<usize>,
    pub diamond_free: bool,
    pub k4_free: bool,
    pub k5_free: bool,
    pub bull_free: bool,
    pub fork_free: bool,
    pub gem_free: bool,
    pub p4_plus_p1_free: bool,
    pub planar: bool,
    /// Only 2-colourable graphs.
    pub bipartite: bool,
    /// Smallest allowed cycle length.
    pub girth: Option<usize>,
    /// Emit vertex-critical graphs instead of critical ones.
    pub vertex_critical: bool,
    pub split: Option<Split>,
    pub from_single_vertex: bool,
    pub lemmas: bool,
    /// From this vertex count on, similar-vertex targets are chosen by the
    /// fewest surviving children.
    pub least_children: Option<usize>,
    /// Confirm edge-criticality before emitting.
    pub edge_check: bool,
}

impl SearchConfig {
    pub fn new(max_vertices: usize, k: usize) -> Self {
        SearchConfig {
            max_vertices,
            k,
            path: None,
            cycle: None,
            diamond_free: false,
            k4_free: false,
            k5_free: false,
            bull_free: false,
            fork_free: false,
            gem_free: false,
            p4_plus_p1_free: false,
            planar: false,
            bipartite: false,
            girth: None,
            vertex_critical: false,
            split: None,
            from_single_vertex: false,
            lemmas: true,
            least_children: None,
            edge_check: true,
        }
    }

    /// Parses the positional tokens `n c<k> [P<x>] [C<x>] ... [mod <rest> <modulo>]`.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut tokens = tokens.iter().map(AsRef::as_ref);
        let Some(first) = tokens.next() else {
            return Err(Error::Usage("missing vertex count".to_string()));
        };
        let max_vertices = parse_number(first, first)?;
        let mut k = None;
        let mut config = SearchConfig::new(max_vertices, 0);

        while let Some(token) = tokens.next() {
            match token {
                "diamondfree" => config.diamond_free = true,
                "K4" => config.k4_free = true,
                "K5" => config.k5_free = true,
                "bull" => config.bull_free = true,
                "fork" => config.fork_free = true,
                "gem" | "Gem" => config.gem_free = true,
                "P4P1" => config.p4_plus_p1_free = true,
                "planar" => config.planar = true,
                "bipartite" => config.bipartite = true,
                "vertexcritical" => config.vertex_critical = true,
                "mod" => {
                    let (Some(rest), Some(modulo)) = (tokens.next(), tokens.next()) else {
                        return Err(Error::invalid(token, "expected `mod <rest> <modulo>`"));
                    };
                    config.split = Some(Split {
                        rest: parse_number(rest, rest)?,
                        modulo: parse_number(modulo, modulo)?,
                    });
                }
                _ => {
                    let (head, value) = token.split_at(token.chars().next().map_or(0, char::len_utf8));
                    let value = match head {
                        "c" | "P" | "C" | "g" => parse_number(token, value)?,
                        _ => return Err(Error::invalid(token, "unknown option")),
                    };
                    let slot = match head {
                        "c" => &mut k,
                        "P" => &mut config.path,
                        "C" => &mut config.cycle,
                        _ => &mut config.girth,
                    };
                    if slot.replace(value).is_some() {
                        return Err(Error::invalid(token, "given more than once"));
                    }
                }
            }
        }

        config.k = k.ok_or_else(|| Error::Usage("missing colour budget c<k>".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges that the search relies on.
    pub fn validate(&self) -> Result<()> {
        let n = self.max_vertices;
        if n == 0 {
            return Err(Error::invalid(&n.to_string(), "vertex count must be positive"));
        }
        if n > MAX_VERTICES {
            return Err(Error::TooManyVertices {
                requested: n,
                max: MAX_VERTICES,
            });
        }
        if self.k == 0 {
            return Err(Error::invalid("c0", "the colour budget must be at least 1"));
        }
        if let Some(t) = self.path.filter(|&t| t < 2) {
            return Err(Error::invalid(&format!("P{t}"), "paths need at least 2 vertices"));
        }
        if let Some(c) = self.cycle.filter(|&c| c < 3) {
            return Err(Error::invalid(&format!("C{c}"), "cycles need at least 3 vertices"));
        }
        if let Some(g) = self.girth.filter(|&g| g < 3) {
            return Err(Error::invalid(&format!("g{g}"), "girth is at least 3"));
        }
        if let Some(split) = self.split {
            if split.modulo == 0 || split.rest >= split.modulo {
                return Err(Error::invalid(
                    &format!("mod {} {}", split.rest, split.modulo),
                    "need 0 <= rest < modulo",
                ));
            }
        }
        Ok(())
    }

    /// Neighbours of the new vertex must be pairwise non-adjacent.
    pub fn triangle_free(&self) -> bool {
        self.bipartite || self.cycle == Some(3) || self.girth.is_some_and(|g| g > 3)
    }

    /// Vertex count at which the modulo split happens; 0 without a split.
    pub fn split_level(&self) -> usize {
        match self.split {
            Some(split) if split.modulo > 1 => {
                let n = self.max_vertices;
                n.saturating_sub(5).max(9).min(20).min(n.saturating_sub(1))
            }
            _ => 0,
        }
    }
}

fn parse_number(token: &str, digits: &str) -> Result<usize> {
    digits
        .parse()
        .map_err(|_| Error::invalid(token, "expected a non-negative number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_a_full_command_line() {
        let config = SearchConfig::from_tokens(&[
            "14", "c3", "P5", "diamondfree", "K4", "gem", "planar", "g4", "vertexcritical", "mod", "2", "7",
        ])
        .unwrap();
        assert_eq!(config.max_vertices, 14);
        assert_eq!(config.k, 3);
        assert_eq!(config.path, Some(5));
        assert_eq!(config.cycle, None);
        assert!(config.diamond_free && config.k4_free && config.gem_free && config.planar);
        assert!(!config.fork_free && !config.bull_free);
        assert_eq!(config.girth, Some(4));
        assert!(config.vertex_critical);
        assert_eq!(config.split, Some(Split { rest: 2, modulo: 7 }));
        assert!(config.triangle_free());
        assert_eq!(config.split_level(), 9);
    }

    #[rstest]
    #[case(&[], "missing vertex count")]
    #[case(&["10"], "missing colour budget")]
    #[case(&["ten", "c3"], "non-negative number")]
    #[case(&["10", "c3", "P"], "non-negative number")]
    #[case(&["10", "c3", "X7"], "unknown option")]
    #[case(&["10", "c3", "P5", "P6"], "more than once")]
    #[case(&["10", "c3", "mod", "1"], "mod <rest> <modulo>")]
    #[case(&["10", "c3", "mod", "3", "3"], "rest < modulo")]
    #[case(&["10", "c0"], "at least 1")]
    #[case(&["10", "c3", "C2"], "at least 3")]
    fn rejects_malformed_tokens(#[case] tokens: &[&str], #[case] message: &str) {
        let err = SearchConfig::from_tokens(tokens).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn bipartite_graphs_have_independent_neighbourhoods() {
        let config = SearchConfig::from_tokens(&["8", "c1", "bipartite"]).unwrap();
        assert!(config.bipartite);
        assert!(config.triangle_free());
        assert!(!SearchConfig::new(8, 1).triangle_free());
    }

    #[test]
    fn vertex_count_is_bounded() {
        let err = SearchConfig::from_tokens(&["65", "c3"]).unwrap_err();
        assert!(matches!(err, Error::TooManyVertices { requested: 65, max: 64 }));
    }

    #[rstest]
    #[case(30, 20)]
    #[case(16, 11)]
    #[case(12, 9)]
    #[case(8, 7)]
    fn split_levels(#[case] n: usize, #[case] level: usize) {
        let mut config = SearchConfig::new(n, 3);
        assert_eq!(config.split_level(), 0);
        config.split = Some(Split { rest: 0, modulo: 1 });
        assert_eq!(config.split_level(), 0);
        config.split = Some(Split { rest: 0, modulo: 4 });
        assert_eq!(config.split_level(), level);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SearchConfig::from_tokens(&["11", "c2", "C5", "bull"]).unwrap();
        let text = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
