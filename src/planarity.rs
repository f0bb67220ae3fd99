//! Planarity testing.
//!
//! [`Dmp`] splits the graph into biconnected blocks and embeds each block with
//! the Demoucron–Malgrange–Pertuiset face-insertion algorithm. A graph is
//! planar exactly when all of its blocks are.

use crate::error::{Error, Result};
use crate::graph::{Graph, VertexSet, bit, members};
use std::collections::VecDeque;

pub trait PlanarityTest {
    fn is_planar(&mut self, g: &Graph) -> Result<bool>;
}

/// Demoucron–Malgrange–Pertuiset embedding per biconnected block, behind an
/// Euler-bound prefilter.
#[derive(Debug, Default)]
pub struct Dmp {
    blocks_embedded: u64,
}

impl Dmp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks that needed a full embedding attempt.
    pub fn blocks_embedded(&self) -> u64 {
        self.blocks_embedded
    }
}

impl PlanarityTest for Dmp {
    fn is_planar(&mut self, g: &Graph) -> Result<bool> {
        if !within_euler_bound(g.order(), g.edge_count()) {
            return Ok(false);
        }
        for block in blocks(g) {
            if block.count_ones() < 5 {
                continue;
            }
            self.blocks_embedded += 1;
            if !Embedding::new(g, block).complete()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A simple planar graph on `n >= 3` vertices has at most `3n - 6` edges.
fn within_euler_bound(n: usize, m: usize) -> bool {
    n < 3 || m <= 3 * n - 6
}

/// =============== Biconnected blocks ===============

const UNSEEN: usize = usize::MAX;

struct BlockSearch<'a> {
    rows: &'a [VertexSet],
    disc: Vec<usize>,
    low: Vec<usize>,
    time: usize,
    edges: Vec<(usize, usize)>,
    found: Vec<VertexSet>,
}

impl BlockSearch<'_> {
    fn visit(&mut self, u: usize, parent: Option<usize>) {
        self.disc[u] = self.time;
        self.low[u] = self.time;
        self.time += 1;
        for v in members(self.rows[u]) {
            if self.disc[v] == UNSEEN {
                self.edges.push((u, v));
                self.visit(v, Some(u));
                self.low[u] = self.low[u].min(self.low[v]);
                if self.low[v] >= self.disc[u] {
                    let mut block = 0;
                    while let Some((a, b)) = self.edges.pop() {
                        block |= bit(a) | bit(b);
                        if (a, b) == (u, v) {
                            break;
                        }
                    }
                    self.found.push(block);
                }
            } else if Some(v) != parent && self.disc[v] < self.disc[u] {
                self.edges.push((u, v));
                self.low[u] = self.low[u].min(self.disc[v]);
            }
        }
    }
}

/// Vertex sets of the biconnected blocks of `g`. Bridges are blocks of two
/// vertices; isolated vertices belong to no block.
pub fn blocks(g: &Graph) -> Vec<VertexSet> {
    let n = g.order();
    let mut search = BlockSearch {
        rows: g.rows(),
        disc: vec![UNSEEN; n],
        low: vec![UNSEEN; n],
        time: 0,
        edges: Vec::new(),
        found: Vec::new(),
    };
    for v in 0..n {
        if search.disc[v] == UNSEEN {
            search.visit(v, None);
        }
    }
    search.found
}

/// =============== Face insertion ===============

/// A piece of the block that is not embedded yet.
#[derive(Debug)]
enum Fragment {
    /// A single edge between two embedded vertices.
    Edge(usize, usize),
    /// A component of the unembedded vertices with the embedded vertices it
    /// touches.
    Component { inner: VertexSet, attachments: VertexSet },
}

impl Fragment {
    fn attachments(&self) -> VertexSet {
        match *self {
            Fragment::Edge(u, v) => bit(u) | bit(v),
            Fragment::Component { attachments, .. } => attachments,
        }
    }
}

struct Embedding {
    block: VertexSet,
    /// Block adjacency; rows of vertices outside the block are empty.
    rows: Vec<VertexSet>,
    placed: VertexSet,
    placed_rows: Vec<VertexSet>,
    /// Faces as cyclic vertex sequences.
    faces: Vec<Vec<usize>>,
}

impl Embedding {
    fn new(g: &Graph, block: VertexSet) -> Self {
        let rows = (0..g.order())
            .map(|v| if block & bit(v) != 0 { g.nbhd(v) & block } else { 0 })
            .collect();
        Embedding {
            block,
            rows,
            placed: 0,
            placed_rows: vec![0; g.order()],
            faces: Vec::new(),
        }
    }

    /// Embeds the whole block, or reports that some fragment fits no face.
    fn complete(mut self) -> Result<bool> {
        let m = self.rows.iter().map(|r| r.count_ones() as usize).sum::<usize>() / 2;
        if !within_euler_bound(self.block.count_ones() as usize, m) {
            return Ok(false);
        }
        let cycle = self.initial_cycle()?;
        self.mark(&cycle);
        if let (Some(&first), Some(&last)) = (cycle.first(), cycle.last()) {
            self.placed_rows[first] |= bit(last);
            self.placed_rows[last] |= bit(first);
        }
        self.faces = vec![cycle.clone(), cycle];

        loop {
            let fragments = self.fragments();
            if fragments.is_empty() {
                return Ok(true);
            }
            let masks: Vec<VertexSet> = self
                .faces
                .iter()
                .map(|f| f.iter().fold(0, |acc, &v| acc | bit(v)))
                .collect();
            let mut choice = None;
            for fragment in &fragments {
                let need = fragment.attachments();
                let mut fitting = masks.iter().enumerate().filter(|&(_, m)| m & need == need);
                let Some((face, _)) = fitting.next() else {
                    return Ok(false);
                };
                let forced = fitting.next().is_none();
                if forced || choice.is_none() {
                    choice = Some((fragment, face));
                }
                if forced {
                    break;
                }
            }
            let Some((fragment, face)) = choice else {
                return Ok(false);
            };
            let path = self.path_through(fragment)?;
            self.split_face(face, path);
        }
    }

    /// A cycle through the lowest block vertex and its first neighbour.
    fn initial_cycle(&self) -> Result<Vec<usize>> {
        let u = self.block.trailing_zeros() as usize;
        let v = self.rows[u].trailing_zeros() as usize;
        // Shortest v..u path avoiding the edge uv.
        let mut parent = vec![UNSEEN; self.rows.len()];
        let mut queue = VecDeque::from([v]);
        let mut seen = bit(v);
        while let Some(x) = queue.pop_front() {
            let mut next = self.rows[x] & !seen;
            if x == v {
                next &= !bit(u);
            }
            for y in members(next) {
                parent[y] = x;
                seen |= bit(y);
                if y == u {
                    let mut cycle = vec![u];
                    let mut cur = x;
                    while cur != v {
                        cycle.push(cur);
                        cur = parent[cur];
                    }
                    cycle.push(v);
                    return Ok(cycle);
                }
                queue.push_back(y);
            }
        }
        Err(Error::Embedding(format!("block without a cycle through {u}-{v}")))
    }

    fn mark(&mut self, path: &[usize]) {
        for w in path.windows(2) {
            self.placed_rows[w[0]] |= bit(w[1]);
            self.placed_rows[w[1]] |= bit(w[0]);
        }
        self.placed |= path.iter().fold(0, |acc, &v| acc | bit(v));
    }

    fn fragments(&self) -> Vec<Fragment> {
        let mut out = Vec::new();
        for u in members(self.placed) {
            let open = self.rows[u] & self.placed & !self.placed_rows[u];
            for v in members(open).filter(|&v| v > u) {
                out.push(Fragment::Edge(u, v));
            }
        }
        let mut rest = self.block & !self.placed;
        while rest != 0 {
            let mut inner = bit(rest.trailing_zeros() as usize);
            let mut frontier = inner;
            while frontier != 0 {
                let reach = members(frontier).fold(0, |acc, x| acc | self.rows[x]);
                frontier = reach & rest & !inner;
                inner |= frontier;
            }
            rest &= !inner;
            let attachments = members(inner).fold(0, |acc, x| acc | self.rows[x]) & self.placed;
            out.push(Fragment::Component { inner, attachments });
        }
        out
    }

    /// A path through `fragment` between two of its attachments.
    fn path_through(&self, fragment: &Fragment) -> Result<Vec<usize>> {
        let (inner, attachments) = match *fragment {
            Fragment::Edge(u, v) => return Ok(vec![u, v]),
            Fragment::Component { inner, attachments } => (inner, attachments),
        };
        let mut ends = members(attachments);
        let (Some(a), Some(b)) = (ends.next(), ends.next()) else {
            return Err(Error::Embedding(format!(
                "fragment {inner:#b} has a single attachment inside a block"
            )));
        };
        let mut parent = vec![UNSEEN; self.rows.len()];
        let mut seen = 0;
        let mut queue = VecDeque::new();
        for x in members(self.rows[a] & inner) {
            parent[x] = a;
            seen |= bit(x);
            queue.push_back(x);
        }
        while let Some(x) = queue.pop_front() {
            if self.rows[x] & bit(b) != 0 {
                let mut path = vec![b, x];
                let mut cur = x;
                while parent[cur] != a {
                    cur = parent[cur];
                    path.push(cur);
                }
                path.push(a);
                path.reverse();
                return Ok(path);
            }
            for y in members(self.rows[x] & inner & !seen) {
                parent[y] = x;
                seen |= bit(y);
                queue.push_back(y);
            }
        }
        Err(Error::Embedding(format!(
            "fragment {inner:#b} does not connect its attachments {a} and {b}"
        )))
    }

    /// Draws `path` inside face `index`, splitting it in two.
    fn split_face(&mut self, index: usize, mut path: Vec<usize>) {
        let face = self.faces.swap_remove(index);
        let position = |v: usize| face.iter().position(|&f| f == v).unwrap_or(UNSEEN);
        let (mut i, mut j) = (position(path[0]), position(path[path.len() - 1]));
        if i > j {
            path.reverse();
            std::mem::swap(&mut i, &mut j);
        }
        let interior = &path[1..path.len() - 1];

        let mut first = face[i..=j].to_vec();
        first.extend(interior.iter().rev());
        let mut second = face[j..].to_vec();
        second.extend_from_slice(&face[..=i]);
        second.extend_from_slice(interior);

        self.faces.push(first);
        self.faces.push(second);
        self.mark(&path);
    }
}
