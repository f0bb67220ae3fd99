//! The augmentation search.
//!
//! Graphs grow one vertex at a time. Every candidate neighbourhood for the
//! new vertex runs through a fixed pipeline of cheap checks, then the
//! colouring oracle, then the isomorphism cache. Uncolourable survivors are
//! emitted, colourable ones are extended again.

use crate::cache::IsoCache;
use crate::canon::{Canonicalizer, RefinementCanonicalizer};
use crate::colouring::ColouringProblem;
use crate::config::SearchConfig;
use crate::critical::{is_edge_critical, is_vertex_critical};
use crate::domination::{can_share_colour, can_take_fresh_colour};
use crate::error::Result;
use crate::extension::{ChildCheck, Verdict, for_each_extension};
use crate::forbidden::{
    PathRing, Scope, contains_bull, contains_clique, contains_diamond, contains_fork, contains_gem,
    contains_induced_cycle, contains_induced_diamond, contains_induced_path, contains_p4_plus_p1,
    contains_triangle, contains_w5, has_cycle_shorter_than,
};
use crate::graph::{Graph, VertexSet};
use crate::lemmas::{Lemma, LemmaContext, Target, fallback_only, standard_lemmas};
use crate::output::{CollectSink, GraphSink};
use crate::planarity::{Dmp, PlanarityTest};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// =============== Check pipeline ===============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Patterns that survive adding neighbours to the new vertex: small
    /// cliques, short cycles, odd cycles when bipartite, non-planarity and
    /// uncolourable obstructions.
    Structural,
    ForbiddenCycle,
    /// The new vertex must break the domination its lemma targeted.
    Destruction,
    ForbiddenPath,
    SmallPatterns,
    LowDegreeRecheck,
}

pub const PIPELINE: [Stage; 6] = [
    Stage::Structural,
    Stage::ForbiddenCycle,
    Stage::Destruction,
    Stage::ForbiddenPath,
    Stage::SmallPatterns,
    Stage::LowDegreeRecheck,
];

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Structural => "structural",
            Stage::ForbiddenCycle => "forbidden cycle",
            Stage::Destruction => "destruction",
            Stage::ForbiddenPath => "forbidden path",
            Stage::SmallPatterns => "small patterns",
            Stage::LowDegreeRecheck => "low degree re-check",
        }
    }

    /// Verdict when the check fails.
    pub fn on_failure(self) -> Verdict {
        match self {
            Stage::Structural | Stage::Destruction | Stage::LowDegreeRecheck => Verdict::PruneSupersets,
            Stage::ForbiddenCycle | Stage::ForbiddenPath | Stage::SmallPatterns => Verdict::Prune,
        }
    }
}

/// Monotone exclusions: once they hit, every larger neighbourhood of the
/// newest vertex is excluded as well.
fn structurally_excluded(
    config: &SearchConfig,
    planarity: &mut dyn PlanarityTest,
    g: &Graph,
    scope: Scope,
) -> Result<bool> {
    let n = g.order();
    let k = config.k;
    let excluded = (config.triangle_free() && contains_triangle(g, scope))
        || config.girth.is_some_and(|girth| has_cycle_shorter_than(g, girth, scope))
        || (config.k4_free && contains_clique(g, 4, scope))
        || (config.k5_free && contains_clique(g, 5, scope))
        // With K4 excluded, an induced diamond is the same as any diamond.
        || (config.diamond_free && config.k4_free && contains_diamond(g, scope))
        || (config.bipartite && !ColouringProblem::new(g).is_colourable(2))
        // A proper subgraph that already needs k + 1 colours.
        || (n > k + 1 && contains_clique(g, k + 1, scope))
        || (k == 3 && n > 6 && contains_w5(g, scope));
    Ok(excluded || (config.planar && !planarity.is_planar(g)?))
}

/// Induced patterns other than the forbidden path and cycle.
fn small_pattern_found(config: &SearchConfig, g: &Graph, scope: Scope) -> bool {
    (config.diamond_free && !config.k4_free && contains_induced_diamond(g, scope))
        || (config.fork_free && contains_fork(g, scope))
        || (config.bull_free && contains_bull(g, scope))
        || (config.gem_free && contains_gem(g, scope))
        || (config.p4_plus_p1_free && contains_p4_plus_p1(g, scope))
}

/// Free of every induced pattern of `config`. Subgraph-closed constraints
/// are left out: deleting edges cannot break them.
fn free_of_induced_patterns(config: &SearchConfig, g: &Graph, scope: Scope) -> bool {
    !config.cycle.is_some_and(|c| contains_induced_cycle(g, c, scope))
        && !config.path.is_some_and(|t| contains_induced_path(g, t, scope, None))
        && !small_pattern_found(config, g, scope)
}

/// =============== Run summary ===============

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub order: usize,
    /// Colourable graphs stored in the cache.
    pub accepted: u64,
    pub emitted: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: String,
    pub pruned: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub levels: Vec<LevelSummary>,
    pub stages: Vec<StageSummary>,
}

const NOT_CRITICAL: &str = "vertex criticality";
const ISOMORPHIC: &str = "isomorphism";

impl RunSummary {
    fn new(max_vertices: usize) -> Self {
        let names = PIPELINE.iter().map(|s| s.name()).chain([NOT_CRITICAL, ISOMORPHIC]);
        RunSummary {
            levels: (0..=max_vertices)
                .map(|order| LevelSummary {
                    order,
                    ..LevelSummary::default()
                })
                .collect(),
            stages: names
                .map(|name| StageSummary {
                    stage: name.to_string(),
                    pruned: 0,
                })
                .collect(),
        }
    }

    fn count_prune(&mut self, stage: &str) {
        if let Some(entry) = self.stages.iter_mut().find(|s| s.stage == stage) {
            entry.pruned += 1;
        }
    }

    pub fn emitted(&self) -> u64 {
        self.levels.iter().map(|l| l.emitted).sum()
    }

    pub fn accepted(&self) -> u64 {
        self.levels.iter().map(|l| l.accepted).sum()
    }
}

/// =============== Generator ===============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Live,
    /// Dry run for the least-children choice: nothing is stored or emitted.
    Count,
}

pub struct Generator<'a> {
    config: SearchConfig,
    split_level: usize,
    cache: IsoCache,
    canon: Box<dyn Canonicalizer + 'a>,
    planarity: Box<dyn PlanarityTest + 'a>,
    lemmas: Vec<Box<dyn Lemma>>,
    /// Recently found forbidden paths, per vertex count.
    rings: Vec<PathRing>,
    sink: &'a mut dyn GraphSink,
    summary: RunSummary,
    split_counter: usize,
    counted: u64,
    progress: Option<ProgressBar>,
}

impl<'a> Generator<'a> {
    pub fn new(config: SearchConfig, sink: &'a mut dyn GraphSink) -> Result<Self> {
        config.validate()?;
        let n = config.max_vertices;
        Ok(Generator {
            split_level: config.split_level(),
            cache: IsoCache::new(n),
            canon: Box::new(RefinementCanonicalizer::new()),
            planarity: Box::new(Dmp::new()),
            lemmas: if config.lemmas { standard_lemmas() } else { fallback_only() },
            rings: (0..=n).map(|_| PathRing::new()).collect(),
            sink,
            summary: RunSummary::new(n),
            split_counter: 0,
            counted: 0,
            progress: None,
            config,
        })
    }

    pub fn with_canonicalizer(mut self, canon: impl Canonicalizer + 'a) -> Self {
        self.canon = Box::new(canon);
        self
    }

    pub fn with_planarity_test(mut self, test: impl PlanarityTest + 'a) -> Self {
        self.planarity = Box::new(test);
        self
    }

    /// Reports accepted graphs on `bar` and the emitted count as its message.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the whole search and flushes the sink.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(config = ?self.config, split_level = self.split_level, "starting search");
        for (name, seed) in self.seeds() {
            self.plant(&name, seed)?;
        }
        self.sink.finish()?;
        for level in self.summary.levels.iter().filter(|l| l.accepted + l.emitted > 0) {
            info!(
                order = level.order,
                accepted = level.accepted,
                emitted = level.emitted,
                "level summary"
            );
        }
        if let Some(bar) = &self.progress {
            bar.finish_with_message(format!("✔ {} graphs emitted", self.summary.emitted()));
        }
        Ok(self.summary.clone())
    }

    /// Starting graphs. Every critical graph other than `K_{k+1}` has an
    /// induced odd hole or odd antihole, so these cover all outputs.
    fn seeds(&self) -> Vec<(String, Graph)> {
        let (n, k) = (self.config.max_vertices, self.config.k);
        if self.config.from_single_vertex {
            return vec![("K1".to_string(), Graph::complete(1))];
        }
        let mut seeds = Vec::new();
        if k < n {
            seeds.push((format!("K{}", k + 1), Graph::complete(k + 1)));
        }
        for len in (5..=n).step_by(2) {
            seeds.push((format!("C{len}"), Graph::cycle(len)));
        }
        for len in (7..=n).step_by(2) {
            seeds.push((format!("co-C{len}"), Graph::antihole(len)));
        }
        seeds
    }

    fn plant(&mut self, name: &str, mut seed: Graph) -> Result<()> {
        let k = self.config.k;
        seed.set_capacity(self.config.max_vertices);
        let scope = Scope::All;
        if structurally_excluded(&self.config, self.planarity.as_mut(), &seed, scope)?
            || !free_of_induced_patterns(&self.config, &seed, scope)
        {
            debug!(seed = name, "seed outside the class");
            return Ok(());
        }
        let colourable = ColouringProblem::new(&seed).is_colourable(k);
        if !colourable && !is_vertex_critical(&seed, k, false) {
            debug!(seed = name, "seed is not critical");
            return Ok(());
        }
        let form = self.canon.canonical_form(&seed);
        if !self.cache.lookup_or_insert(form, seed.order()) {
            return Ok(());
        }
        info!(seed = name, order = seed.order(), colourable, "planting seed");
        self.settle(&mut seed, colourable)
    }

    /// Handles a graph that was just stored in the cache.
    fn settle(&mut self, g: &mut Graph, colourable: bool) -> Result<()> {
        let n = g.order();
        if colourable {
            self.summary.levels[n].accepted += 1;
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
            if !g.is_full() && self.take_split_branch(n) {
                self.extend(g)?;
            }
        } else if self.is_wanted(g) {
            self.emit(g)?;
        }
        Ok(())
    }

    fn is_wanted(&self, g: &mut Graph) -> bool {
        if self.config.vertex_critical || !self.config.edge_check {
            return true;
        }
        let config = &self.config;
        is_edge_critical(g, config.k, |h| free_of_induced_patterns(config, h, Scope::All))
    }

    fn emit(&mut self, g: &Graph) -> Result<()> {
        let n = g.order();
        // Every branch reaches the graphs up to the split level; branch 0 emits them.
        if self.config.split.is_some_and(|s| s.rest != 0) && n <= self.split_level {
            return Ok(());
        }
        self.sink.write(g)?;
        self.summary.levels[n].emitted += 1;
        debug!(order = n, edges = g.edge_count(), "emitted {g:?}");
        if let Some(bar) = &self.progress {
            bar.set_message(format!("{} emitted", self.summary.emitted()));
        }
        Ok(())
    }

    fn take_split_branch(&mut self, order: usize) -> bool {
        let Some(split) = self.config.split else {
            return true;
        };
        if self.split_level == 0 || order != self.split_level {
            return true;
        }
        let take = self.split_counter % split.modulo == split.rest;
        self.split_counter += 1;
        take
    }

    fn extend(&mut self, g: &mut Graph) -> Result<()> {
        let target = self.choose_target(g)?;
        trace!(order = g.order(), ?target, "extending");
        let rows = g.rows().to_vec();
        let triangle_free = self.config.triangle_free();
        for pass in target.passes(g) {
            for_each_extension(&rows, &pass, triangle_free, |nbhd| {
                self.try_child(g, nbhd, pass.check, Mode::Live)
            })?;
        }
        Ok(())
    }

    fn choose_target(&mut self, g: &mut Graph) -> Result<Target> {
        let fewest = self
            .config
            .least_children
            .is_some_and(|level| g.order() >= level);
        let ctx = LemmaContext {
            g: &*g,
            k: self.config.k,
        };
        let mut options = Vec::new();
        for lemma in &self.lemmas {
            options = if fewest {
                lemma.candidates(&ctx)
            } else {
                lemma.detect(&ctx).into_iter().collect()
            };
            if !options.is_empty() {
                trace!(lemma = lemma.name(), options = options.len(), "lemma applies");
                break;
            }
        }
        if options.len() <= 1 {
            return Ok(options.pop().unwrap_or(Target::Unrestricted));
        }
        self.fewest_children(g, options)
    }

    /// The target whose passes leave the fewest new children, by dry run.
    fn fewest_children(&mut self, g: &mut Graph, options: Vec<Target>) -> Result<Target> {
        let rows = g.rows().to_vec();
        let triangle_free = self.config.triangle_free();
        let mut best: Option<(u64, Target)> = None;
        for target in options {
            self.counted = 0;
            for pass in target.passes(g) {
                for_each_extension(&rows, &pass, triangle_free, |nbhd| {
                    self.try_child(g, nbhd, pass.check, Mode::Count)
                })?;
            }
            if best.as_ref().is_none_or(|(fewest, _)| self.counted < *fewest) {
                best = Some((self.counted, target));
            }
        }
        Ok(best.map_or(Target::Unrestricted, |(_, target)| target))
    }

    fn run_stage(&mut self, stage: Stage, child: &Graph, check: Option<ChildCheck>) -> Result<Verdict> {
        let config = &self.config;
        let k = config.k;
        let z = child.order() - 1;
        let scope = Scope::Newest(z);
        let failed = match stage {
            Stage::Structural => structurally_excluded(config, self.planarity.as_mut(), child, scope)?,
            Stage::ForbiddenCycle => config
                .cycle
                .is_some_and(|c| c > 3 && contains_induced_cycle(child, c, scope)),
            Stage::Destruction => matches!(
                check,
                Some(ChildCheck::ShareColour { removed, partner })
                    if !can_share_colour(child, k, removed, z, partner)
            ),
            Stage::ForbiddenPath => match config.path {
                Some(t) => contains_induced_path(child, t, scope, Some(&mut self.rings[z + 1])),
                None => false,
            },
            Stage::SmallPatterns => small_pattern_found(config, child, scope),
            Stage::LowDegreeRecheck => matches!(
                check,
                Some(ChildCheck::FreshColour { vertex, old_nbhd })
                    if !can_take_fresh_colour(child, k, vertex, z, old_nbhd)
            ),
        };
        Ok(if failed { stage.on_failure() } else { Verdict::Pass })
    }

    fn try_child(
        &mut self,
        g: &mut Graph,
        nbhd: VertexSet,
        check: Option<ChildCheck>,
        mode: Mode,
    ) -> Result<Verdict> {
        let mut child = g.push_vertex(nbhd);
        let n = child.order();
        for stage in PIPELINE {
            let verdict = self.run_stage(stage, &child, check)?;
            if verdict != Verdict::Pass {
                if mode == Mode::Live {
                    self.summary.count_prune(stage.name());
                }
                return Ok(verdict);
            }
        }

        let k = self.config.k;
        let colourable = ColouringProblem::new(&child).is_colourable(k);
        if !colourable && !is_vertex_critical(&child, k, true) {
            if mode == Mode::Live {
                self.summary.count_prune(NOT_CRITICAL);
            }
            return Ok(Verdict::Prune);
        }
        // An uncolourable child is a spanning subgraph of every superset, so
        // those cannot be edge-critical.
        let handled = if colourable || self.config.vertex_critical {
            Verdict::Pass
        } else {
            Verdict::PruneSupersets
        };

        let form = self.canon.canonical_form(&child);
        match mode {
            Mode::Count => {
                if !self.cache.contains(&form, n) {
                    self.counted += 1;
                }
            }
            Mode::Live => {
                if self.cache.lookup_or_insert(form, n) {
                    self.settle(&mut child, colourable)?;
                } else {
                    self.summary.count_prune(ISOMORPHIC);
                }
            }
        }
        Ok(handled)
    }
}

/// Runs a search and collects everything it emits.
pub fn generate(config: SearchConfig) -> Result<(Vec<Graph>, RunSummary)> {
    let mut sink = CollectSink::new();
    let summary = Generator::new(config, &mut sink)?.run()?;
    Ok((sink.into_graphs(), summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::CanonicalForm;
    use crate::config::Split;
    use std::collections::BTreeSet;

    fn forms(graphs: &[Graph]) -> BTreeSet<CanonicalForm> {
        let mut canon = RefinementCanonicalizer::new();
        graphs.iter().map(|g| canon.canonical_form(g)).collect()
    }

    fn odd_cycles(lengths: &[usize]) -> BTreeSet<CanonicalForm> {
        forms(&lengths.iter().map(|&l| Graph::cycle(l)).collect::<Vec<_>>())
    }

    #[test]
    fn stage_failures_map_to_verdicts() {
        assert_eq!(Stage::Structural.on_failure(), Verdict::PruneSupersets);
        assert_eq!(Stage::ForbiddenPath.on_failure(), Verdict::Prune);
        assert_eq!(Stage::LowDegreeRecheck.on_failure(), Verdict::PruneSupersets);
        assert_eq!(PIPELINE.len(), 6);
    }

    #[test]
    fn one_colour_gives_a_single_edge() {
        let (graphs, summary) = generate(SearchConfig::new(6, 1)).unwrap();
        assert_eq!(graphs, vec![Graph::complete(2)]);
        assert_eq!(summary.emitted(), 1);
    }

    #[test]
    fn two_colours_give_odd_cycles_from_seeds() {
        let (graphs, _) = generate(SearchConfig::new(9, 2)).unwrap();
        assert_eq!(forms(&graphs), odd_cycles(&[3, 5, 7, 9]));
    }

    #[test]
    fn two_colours_give_odd_cycles_from_a_single_vertex() {
        let mut config = SearchConfig::new(7, 2);
        config.from_single_vertex = true;
        let (graphs, summary) = generate(config).unwrap();
        assert_eq!(graphs.len(), 3);
        assert_eq!(forms(&graphs), odd_cycles(&[3, 5, 7]));
        assert!(summary.accepted() > 0);
    }

    #[test]
    fn forbidden_paths_cut_long_cycles() {
        let config = SearchConfig::from_tokens(&["9", "c2", "P6"]).unwrap();
        let (graphs, _) = generate(config).unwrap();
        assert_eq!(forms(&graphs), odd_cycles(&[3, 5]));
    }

    #[test]
    fn k4_comes_first_for_three_colours() {
        let config = SearchConfig::from_tokens(&["7", "c3", "P5"]).unwrap();
        let (graphs, _) = generate(config).unwrap();
        assert_eq!(graphs.first(), Some(&Graph::complete(4)));
        // W5 is P5-free and 4-critical.
        assert!(graphs.iter().any(|g| g.order() == 6 && g.edge_count() == 10));
    }

    #[test]
    fn split_branches_partition_the_output() {
        let whole = generate(SearchConfig::from_tokens(&["11", "c2"]).unwrap()).unwrap().0;
        let mut parts = Vec::new();
        for rest in 0..3 {
            let mut config = SearchConfig::new(11, 2);
            config.from_single_vertex = true;
            config.split = Some(Split { rest, modulo: 3 });
            parts.extend(generate(config).unwrap().0);
        }
        // Branches keep separate caches, so only the set of classes is compared.
        assert!(parts.len() >= whole.len());
        assert_eq!(forms(&parts), forms(&whole));
    }

    #[test]
    fn least_children_keeps_the_output() {
        let plain = SearchConfig::from_tokens(&["7", "c3", "P5"]).unwrap();
        let mut fewest = plain.clone();
        fewest.least_children = Some(4);
        assert_eq!(forms(&generate(plain).unwrap().0), forms(&generate(fewest).unwrap().0));
    }
}
