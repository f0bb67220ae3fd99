//! Exhaustive generation of `(k+1)`-critical graphs in hereditary classes.
//!
//! The search starts from a few uncolourable seeds, grows graphs one vertex
//! at a time and keeps only the augmentations that a critical graph could
//! need. Structural lemmas about critical graphs decide where the next
//! vertex has to attach; a per-size isomorphism cache rejects repeats.
//!
//! ```no_run
//! use critgen::{SearchConfig, generate};
//!
//! let config = SearchConfig::from_tokens(&["12", "c3", "P5"])?;
//! let (graphs, summary) = generate(config)?;
//! println!("{} graphs, {} emitted", graphs.len(), summary.emitted());
//! # Ok::<(), critgen::Error>(())
//! ```

pub mod cache;
pub mod canon;
pub mod colouring;
pub mod config;
pub mod critical;
pub mod domination;
pub mod engine;
pub mod error;
pub mod extension;
pub mod forbidden;
pub mod graph;
pub mod lemmas;
pub mod multicode;
pub mod output;
pub mod planarity;

pub use config::{SearchConfig, Split, USAGE};
pub use engine::{Generator, LevelSummary, RunSummary, StageSummary, generate};
pub use error::{Error, Result};
pub use graph::{Graph, MAX_VERTICES, VertexSet};
pub use multicode::MulticodeReader;
pub use output::{CollectSink, GraphSink, JsonLinesSink, MulticodeSink, SerializableGraph};
