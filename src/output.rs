use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::multicode;
use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Receives every graph the search emits.
pub trait GraphSink {
    fn write(&mut self, g: &Graph) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Concatenated multicode, the default output.
pub struct MulticodeSink<W: Write> {
    out: W,
}

impl<W: Write> MulticodeSink<W> {
    pub fn new(out: W) -> Self {
        MulticodeSink { out }
    }
}

impl<W: Write> GraphSink for MulticodeSink<W> {
    fn write(&mut self, g: &Graph) -> Result<()> {
        self.out.write_all(&multicode::encode(g))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// A graph as stored in JSON, with 1-indexed edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub node_count: usize,
    pub edges: Vec<(usize, usize)>,
}

impl SerializableGraph {
    pub fn from_petgraph(graph: &UnGraph<(), ()>) -> Self {
        let edges = graph
            .edge_indices()
            .filter_map(|e| graph.edge_endpoints(e))
            // Shift to 1-indexed for output
            .map(|(u, v)| (u.index() + 1, v.index() + 1))
            .collect();
        SerializableGraph {
            node_count: graph.node_count(),
            edges,
        }
    }

    pub fn to_graph(&self) -> Result<Graph> {
        let n = self.node_count;
        let mut edges = Vec::with_capacity(self.edges.len());
        for &(u, v) in &self.edges {
            if u == 0 || v == 0 || u > n || v > n || u == v {
                return Err(Error::invalid(&format!("{u}-{v}"), format!("not an edge of a graph on {n} vertices")));
            }
            edges.push((u - 1, v - 1));
        }
        Ok(Graph::from_edges(n, &edges))
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }
}

impl<W: Write> GraphSink for JsonLinesSink<W> {
    fn write(&mut self, g: &Graph) -> Result<()> {
        serde_json::to_writer(&mut self.out, &SerializableGraph::from_petgraph(&g.to_petgraph()))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps emitted graphs in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    graphs: Vec<Graph>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn into_graphs(self) -> Vec<Graph> {
        self.graphs
    }
}

impl GraphSink for CollectSink {
    fn write(&mut self, g: &Graph) -> Result<()> {
        self.graphs.push(g.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicode::MulticodeReader;

    #[test]
    fn json_lines_use_one_based_edges() {
        let mut buf = Vec::new();
        let mut sink = JsonLinesSink::new(&mut buf);
        sink.write(&Graph::complete(3)).unwrap();
        sink.write(&Graph::cycle(4)).unwrap();
        sink.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"node_count":3,"edges":[[1,2],[1,3],[2,3]]}"#);
        let back: SerializableGraph = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.to_graph().unwrap(), Graph::cycle(4));
    }

    #[test]
    fn bad_json_edges_are_rejected() {
        let g = SerializableGraph {
            node_count: 3,
            edges: vec![(1, 4)],
        };
        assert!(matches!(g.to_graph(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn multicode_sink_output_reads_back() {
        let mut buf = Vec::new();
        {
            let mut sink = MulticodeSink::new(&mut buf);
            sink.write(&Graph::cycle(5)).unwrap();
            sink.write(&Graph::complete(4)).unwrap();
            sink.finish().unwrap();
        }
        let graphs: Vec<Graph> = MulticodeReader::new(buf.as_slice()).collect::<Result<_>>().unwrap();
        assert_eq!(graphs, vec![Graph::cycle(5), Graph::complete(4)]);
    }

    #[test]
    fn collect_sink_keeps_order() {
        let mut sink = CollectSink::new();
        sink.write(&Graph::complete(2)).unwrap();
        sink.write(&Graph::cycle(3)).unwrap();
        assert_eq!(sink.graphs().len(), 2);
        assert_eq!(sink.into_graphs()[1], Graph::cycle(3));
    }
}
