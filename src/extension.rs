//! Candidate neighbourhoods for the next vertex.

use crate::graph::{VertexSet, bit, members};

/// Outcome of one check on a freshly extended graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Reject this neighbourhood only.
    Prune,
    /// Reject this neighbourhood and every superset of it.
    PruneSupersets,
}

/// Condition the child has to meet because of the lemma that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildCheck {
    /// In `child - removed` the new vertex can share a colour with `partner`.
    ShareColour { removed: VertexSet, partner: usize },
    /// In `child - vertex` the new vertex can avoid every colour on `old_nbhd`.
    FreshColour { vertex: usize, old_nbhd: VertexSet },
}

/// One sweep of the subset enumerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pass {
    pub required: VertexSet,
    pub forbidden: VertexSet,
    /// Candidates must meet this set.
    pub at_least_one: VertexSet,
    pub check: Option<ChildCheck>,
}

impl Pass {
    /// Every non-empty subset of `vertices`.
    pub fn unrestricted(vertices: VertexSet) -> Self {
        Pass {
            required: 0,
            forbidden: 0,
            at_least_one: vertices,
            check: None,
        }
    }
}

/// Calls `visit` on every neighbourhood allowed by `pass`, in increasing
/// index order. A set answered with [`Verdict::PruneSupersets`] skips the
/// supersets that extend it with later indices, i.e. its own subtree of the
/// enumeration. Supersets reached through an earlier index are still visited.
///
/// With `triangle_free` no chosen vertex may be adjacent to another one.
pub fn for_each_extension<E, F>(
    rows: &[VertexSet],
    pass: &Pass,
    triangle_free: bool,
    mut visit: F,
) -> Result<(), E>
where
    F: FnMut(VertexSet) -> Result<Verdict, E>,
{
    let mut blocked = pass.forbidden;
    if pass.required & pass.forbidden != 0 {
        return Ok(());
    }
    if triangle_free {
        blocked |= members(pass.required).fold(0, |acc, v| acc | rows[v]);
        if blocked & pass.required != 0 {
            return Ok(());
        }
    }
    let walk = Walk {
        rows,
        at_least_one: pass.at_least_one,
        triangle_free,
    };
    walk.descend(pass.required, blocked, 0, &mut visit)
}

struct Walk<'a> {
    rows: &'a [VertexSet],
    at_least_one: VertexSet,
    triangle_free: bool,
}

impl Walk<'_> {
    fn descend<E, F>(&self, chosen: VertexSet, blocked: VertexSet, next: usize, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(VertexSet) -> Result<Verdict, E>,
    {
        if chosen & self.at_least_one != 0 && visit(chosen)? == Verdict::PruneSupersets {
            return Ok(());
        }
        for v in next..self.rows.len() {
            if (chosen | blocked) & bit(v) != 0 {
                continue;
            }
            let blocked = if self.triangle_free { blocked | self.rows[v] } else { blocked };
            self.descend(chosen | bit(v), blocked, v + 1, visit)?;
        }
        Ok(())
    }
}
