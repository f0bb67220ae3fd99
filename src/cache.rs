//! Isomorphism rejection: one splay tree of canonical forms per vertex count.

use crate::canon::CanonicalForm;
use std::cmp::Ordering;

#[derive(Debug)]
struct Node {
    key: CanonicalForm,
    left: Option<usize>,
    right: Option<usize>,
}

/// Top-down splay tree over byte keys, stored in an arena.
#[derive(Debug, Default)]
pub struct SplayTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl SplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn cmp_at(&self, key: &[u8], node: usize) -> Ordering {
        key.cmp(self.nodes[node].key.as_bytes())
    }

    /// Splays the node closest to `key` to the root of the subtree `t` and
    /// returns the new root.
    fn splay(&mut self, mut t: usize, key: &[u8]) -> usize {
        // Left tree holds keys below `key`, right tree keys above it.
        let mut left_root: Option<usize> = None;
        let mut left_last: Option<usize> = None;
        let mut right_root: Option<usize> = None;
        let mut right_last: Option<usize> = None;

        loop {
            match self.cmp_at(key, t) {
                Ordering::Less => {
                    let Some(mut l) = self.nodes[t].left else { break };
                    if self.cmp_at(key, l) == Ordering::Less {
                        // rotate right
                        self.nodes[t].left = self.nodes[l].right;
                        self.nodes[l].right = Some(t);
                        t = l;
                        match self.nodes[t].left {
                            Some(next) => l = next,
                            None => break,
                        }
                    }
                    // link right
                    match right_last {
                        Some(r) => self.nodes[r].left = Some(t),
                        None => right_root = Some(t),
                    }
                    right_last = Some(t);
                    t = l;
                }
                Ordering::Greater => {
                    let Some(mut r) = self.nodes[t].right else { break };
                    if self.cmp_at(key, r) == Ordering::Greater {
                        // rotate left
                        self.nodes[t].right = self.nodes[r].left;
                        self.nodes[r].left = Some(t);
                        t = r;
                        match self.nodes[t].right {
                            Some(next) => r = next,
                            None => break,
                        }
                    }
                    // link left
                    match left_last {
                        Some(l) => self.nodes[l].right = Some(t),
                        None => left_root = Some(t),
                    }
                    left_last = Some(t);
                    t = r;
                }
                Ordering::Equal => break,
            }
        }

        // assemble
        if let Some(l) = left_last {
            self.nodes[l].right = self.nodes[t].left;
            self.nodes[t].left = left_root;
        }
        if let Some(r) = right_last {
            self.nodes[r].left = self.nodes[t].right;
            self.nodes[t].right = right_root;
        }
        t
    }

    /// Inserts `key` unless an equal key is present; returns whether it was new.
    pub fn insert(&mut self, key: CanonicalForm) -> bool {
        let Some(root) = self.root else {
            self.nodes.push(Node {
                key,
                left: None,
                right: None,
            });
            self.root = Some(0);
            return true;
        };
        let t = self.splay(root, key.as_bytes());
        self.root = Some(t);
        let (left, right) = match self.cmp_at(key.as_bytes(), t) {
            Ordering::Equal => return false,
            Ordering::Less => {
                let left = self.nodes[t].left.take();
                (left, Some(t))
            }
            Ordering::Greater => {
                let right = self.nodes[t].right.take();
                (Some(t), right)
            }
        };
        self.nodes.push(Node { key, left, right });
        self.root = Some(self.nodes.len() - 1);
        true
    }

    /// Membership test; splays like any other access.
    pub fn contains(&mut self, key: &[u8]) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let t = self.splay(root, key);
        self.root = Some(t);
        self.cmp_at(key, t) == Ordering::Equal
    }

    /// Keys in increasing order.
    pub fn keys(&self) -> Vec<&CanonicalForm> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(c) = cur {
                stack.push(c);
                cur = self.nodes[c].left;
            }
            if let Some(c) = stack.pop() {
                out.push(&self.nodes[c].key);
                cur = self.nodes[c].right;
            }
        }
        out
    }
}

/// Canonical forms seen so far, bucketed by vertex count.
#[derive(Debug, Default)]
pub struct IsoCache {
    trees: Vec<SplayTree>,
}

impl IsoCache {
    pub fn new(max_vertices: usize) -> Self {
        IsoCache {
            trees: (0..=max_vertices).map(|_| SplayTree::new()).collect(),
        }
    }

    fn tree(&mut self, n: usize) -> &mut SplayTree {
        if n >= self.trees.len() {
            self.trees.resize_with(n + 1, SplayTree::new);
        }
        &mut self.trees[n]
    }

    /// Records `form` for order `n`; `false` if an isomorphic graph was seen.
    pub fn lookup_or_insert(&mut self, form: CanonicalForm, n: usize) -> bool {
        self.tree(n).insert(form)
    }

    /// Like [`IsoCache::lookup_or_insert`] without recording anything.
    pub fn contains(&mut self, form: &CanonicalForm, n: usize) -> bool {
        self.tree(n).contains(form.as_bytes())
    }

    /// Number of stored classes of order `n`.
    pub fn count(&self, n: usize) -> usize {
        self.trees.get(n).map_or(0, SplayTree::len)
    }
}
