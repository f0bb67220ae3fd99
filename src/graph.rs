use petgraph::graph::{NodeIndex, UnGraph};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Largest vertex count a [`Graph`] can hold: one `u64` bitset row per vertex.
pub const MAX_VERTICES: usize = 64;

/// A set of vertices packed into one machine word.
pub type VertexSet = u64;

#[inline]
pub const fn bit(v: usize) -> VertexSet {
    1u64 << v
}

/// Mask of the vertices `0..n`.
#[inline]
pub const fn first_n(n: usize) -> VertexSet {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

/// Iterates the members of a [`VertexSet`] in increasing order.
#[derive(Clone, Copy, Debug)]
pub struct Members(VertexSet);

impl Iterator for Members {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let v = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Members {}

#[inline]
pub fn members(set: VertexSet) -> Members {
    Members(set)
}

/// =============== Graph under construction ===============
///
/// Simple undirected graph kept in two synchronised forms: sorted neighbour
/// lists and one bitset row per vertex. Vertices are only ever appended and
/// removed at the end, so the live graph behaves like a stack.
#[derive(Clone)]
pub struct Graph {
    adj: Vec<Vec<usize>>,
    rows: Vec<VertexSet>,
    capacity: usize,
}

impl Graph {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity <= MAX_VERTICES,
            "graph capacity {capacity} exceeds {MAX_VERTICES}"
        );
        Graph {
            adj: Vec::with_capacity(capacity),
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Graph on `n` vertices with the given edges. It can grow to
    /// `MAX_VERTICES`.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Graph::with_capacity(MAX_VERTICES);
        for _ in 0..n {
            g.add_vertex(0);
        }
        for &(u, v) in edges {
            if !g.has_edge(u, v) {
                g.add_edge(u, v);
            }
        }
        g
    }

    pub fn complete(n: usize) -> Self {
        let mut g = Graph::with_capacity(MAX_VERTICES);
        for v in 0..n {
            g.add_vertex(first_n(v));
        }
        g
    }

    /// The cycle `0 - 1 - ... - (n-1) - 0`.
    pub fn cycle(n: usize) -> Self {
        assert!(n >= 3, "a cycle needs at least 3 vertices");
        let edges: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Graph::from_edges(n, &edges)
    }

    /// Complement of the cycle on `n` vertices.
    pub fn antihole(n: usize) -> Self {
        assert!(n >= 5, "an antihole needs at least 5 vertices");
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 2)..n {
                if !(i == 0 && j == n - 1) {
                    edges.push((i, j));
                }
            }
        }
        Graph::from_edges(n, &edges)
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.adj.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lets the graph grow to `capacity` vertices.
    pub fn set_capacity(&mut self, capacity: usize) {
        assert!(capacity <= MAX_VERTICES && capacity >= self.order());
        self.capacity = capacity;
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.order() >= self.capacity
    }

    /// Mask of all current vertices.
    #[inline]
    pub fn vertices(&self) -> VertexSet {
        first_n(self.order())
    }

    #[inline]
    pub fn neighbours(&self, v: usize) -> &[usize] {
        &self.adj[v]
    }

    #[inline]
    pub fn nbhd(&self, v: usize) -> VertexSet {
        self.rows[v]
    }

    #[inline]
    pub fn rows(&self) -> &[VertexSet] {
        &self.rows
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.adj[v].len()
    }

    #[inline]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.rows[u] & bit(v) != 0
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// All edges `(u, v)` with `u < v`, in lexicographic order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, list)| list.iter().filter(move |&&v| v > u).map(move |&v| (u, v)))
    }

    pub fn newest(&self) -> Option<usize> {
        self.order().checked_sub(1)
    }

    /// Appends a vertex adjacent to exactly `nbhd` and returns its index.
    pub fn add_vertex(&mut self, nbhd: VertexSet) -> usize {
        let v = self.order();
        assert!(v < self.capacity, "graph is full ({} vertices)", self.capacity);
        debug_assert_eq!(nbhd & !self.vertices(), 0, "neighbour outside the graph");
        let mut list = Vec::with_capacity(nbhd.count_ones() as usize + 4);
        for u in members(nbhd) {
            // v is the largest index, so pushing keeps every list sorted.
            self.adj[u].push(v);
            self.rows[u] |= bit(v);
            list.push(u);
        }
        self.adj.push(list);
        self.rows.push(nbhd);
        v
    }

    /// Exact inverse of the last [`Graph::add_vertex`].
    pub fn remove_last_vertex(&mut self) {
        let v = self.order() - 1;
        let list = self.adj.pop().unwrap_or_default();
        self.rows.pop();
        for u in list {
            let popped = self.adj[u].pop();
            debug_assert_eq!(popped, Some(v));
            self.rows[u] &= !bit(v);
        }
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        assert!(u != v && !self.has_edge(u, v), "edge {u}-{v} already present");
        insert_sorted(&mut self.adj[u], v);
        insert_sorted(&mut self.adj[v], u);
        self.rows[u] |= bit(v);
        self.rows[v] |= bit(u);
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) {
        remove_sorted(&mut self.adj[u], v);
        remove_sorted(&mut self.adj[v], u);
        self.rows[u] &= !bit(v);
        self.rows[v] &= !bit(u);
    }

    /// Appends a vertex for the lifetime of the returned guard.
    pub fn push_vertex(&mut self, nbhd: VertexSet) -> VertexGuard<'_> {
        self.add_vertex(nbhd);
        VertexGuard { graph: self }
    }

    /// Removes the edge `u-v` for the lifetime of the returned guard.
    pub fn without_edge(&mut self, u: usize, v: usize) -> EdgeGuard<'_> {
        self.remove_edge(u, v);
        EdgeGuard { graph: self, u, v }
    }

    /// Both representations describe the same symmetric, loop-free graph.
    pub fn is_consistent(&self) -> bool {
        let n = self.order();
        (0..n).all(|v| {
            let list = &self.adj[v];
            list.windows(2).all(|w| w[0] < w[1])
                && list.iter().fold(0, |acc, &u| acc | bit(u)) == self.rows[v]
                && self.rows[v] & bit(v) == 0
                && members(self.rows[v]).all(|u| u < n && self.rows[u] & bit(v) != 0)
        })
    }

    pub fn to_petgraph(&self) -> UnGraph<(), ()> {
        let mut g = UnGraph::<(), ()>::with_capacity(self.order(), self.edge_count());
        let nodes: Vec<NodeIndex> = (0..self.order()).map(|_| g.add_node(())).collect();
        for (u, v) in self.edges() {
            g.add_edge(nodes[u], nodes[v], ());
        }
        g
    }
}

/// Equal labelled graphs; the capacity is ignored.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl Eq for Graph {}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Graph(n={}; ", self.order())?;
        for (i, (u, v)) in self.edges().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{u}-{v}")?;
        }
        write!(f, ")")
    }
}

fn insert_sorted(list: &mut Vec<usize>, v: usize) {
    let pos = list.partition_point(|&x| x < v);
    list.insert(pos, v);
}

fn remove_sorted(list: &mut Vec<usize>, v: usize) {
    match list.binary_search(&v) {
        Ok(pos) => {
            list.remove(pos);
        }
        Err(_) => panic!("{v} is not in the neighbourhood {list:?}"),
    }
}

/// Undoes [`Graph::push_vertex`] on drop.
pub struct VertexGuard<'a> {
    graph: &'a mut Graph,
}

impl Deref for VertexGuard<'_> {
    type Target = Graph;
    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl DerefMut for VertexGuard<'_> {
    fn deref_mut(&mut self) -> &mut Graph {
        self.graph
    }
}

impl Drop for VertexGuard<'_> {
    fn drop(&mut self) {
        self.graph.remove_last_vertex();
    }
}

/// Undoes [`Graph::without_edge`] on drop.
pub struct EdgeGuard<'a> {
    graph: &'a mut Graph,
    u: usize,
    v: usize,
}

impl Deref for EdgeGuard<'_> {
    type Target = Graph;
    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl DerefMut for EdgeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Graph {
        self.graph
    }
}

impl Drop for EdgeGuard<'_> {
    fn drop(&mut self) {
        self.graph.add_edge(self.u, self.v);
    }
}
