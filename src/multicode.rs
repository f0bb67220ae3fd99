//! The multicode graph format.
//!
//! A graph on `n` vertices is the byte `n` followed, for every vertex
//! `i < n - 1`, by the 1-based indices of its neighbours `j > i` in
//! increasing order and a terminating `0`. Graphs are simply concatenated.

use crate::error::{Error, Result};
use crate::graph::{Graph, MAX_VERTICES};
use std::io::{self, BufReader, Read};

pub fn encode(g: &Graph) -> Vec<u8> {
    let n = g.order();
    let mut out = Vec::with_capacity(1 + n + 2 * g.edge_count());
    out.push(n as u8);
    for i in 0..n.saturating_sub(1) {
        out.extend(g.neighbours(i).iter().filter(|&&j| j > i).map(|&j| (j + 1) as u8));
        out.push(0);
    }
    out
}

/// Decodes the first graph of `bytes` and returns it with the number of
/// bytes it used.
pub fn decode(bytes: &[u8]) -> Result<(Graph, usize)> {
    let mut cursor = Cursor::new(bytes.iter().map(|&b| Ok(b)));
    let g = cursor.read_graph()?.ok_or_else(|| Error::Multicode {
        offset: 0,
        reason: "empty input".to_string(),
    })?;
    Ok((g, cursor.offset))
}

struct Cursor<I> {
    bytes: I,
    offset: usize,
}

impl<I: Iterator<Item = io::Result<u8>>> Cursor<I> {
    fn new(bytes: I) -> Self {
        Cursor { bytes, offset: 0 }
    }

    fn error(&self, reason: String) -> Error {
        Error::Multicode {
            offset: self.offset,
            reason,
        }
    }

    fn pull(&mut self) -> Result<Option<u8>> {
        let byte = self.bytes.next().transpose()?;
        if byte.is_some() {
            self.offset += 1;
        }
        Ok(byte)
    }

    /// Reads one graph; `Ok(None)` at a clean end of input.
    fn read_graph(&mut self) -> Result<Option<Graph>> {
        let start = self.offset;
        let Some(n) = self.pull()? else {
            return Ok(None);
        };
        let n = usize::from(n);
        if n > MAX_VERTICES {
            return Err(Error::Multicode {
                offset: start,
                reason: format!("{n} vertices, at most {MAX_VERTICES} are supported"),
            });
        }
        let mut g = Graph::with_capacity(MAX_VERTICES);
        for _ in 0..n {
            g.add_vertex(0);
        }
        for i in 0..n.saturating_sub(1) {
            let mut last = i + 1;
            loop {
                let Some(b) = self.pull()? else {
                    return Err(self.error(format!("input ends inside the list of vertex {}", i + 1)));
                };
                if b == 0 {
                    break;
                }
                let j = usize::from(b);
                if j <= last || j > n {
                    return Err(self.error(format!(
                        "neighbour {j} of vertex {} out of order or range",
                        i + 1
                    )));
                }
                g.add_edge(i, j - 1);
                last = j;
            }
        }
        Ok(Some(g))
    }
}

/// Streams graphs out of concatenated multicode.
pub struct MulticodeReader<R> {
    cursor: Cursor<io::Bytes<BufReader<R>>>,
}

impl<R: Read> MulticodeReader<R> {
    pub fn new(inner: R) -> Self {
        MulticodeReader {
            cursor: Cursor::new(BufReader::new(inner).bytes()),
        }
    }
}

impl<R: Read> Iterator for MulticodeReader<R> {
    type Item = Result<Graph>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.read_graph().transpose()
    }
}
