//! Faonet computes network-science metrics over bipartite trade networks built from trade-flow
//! tables (exporter, importer, value).
//!
//! # Basic usage
//!
//! A [`TradeTable`](table::TradeTable) is loaded from one or more CSV files and turned into a
//! [`BipartiteGraph`](bipartite::BipartiteGraph): reporters on one side, partners on the other,
//! edges weighted by trade value. Degree, strength and betweenness centrality (on the bipartite
//! graph and on both of its projections, with raw and inverted weights) can then be computed for
//! every node.
//!
//! ```rust
//! use faonet::analysis::{analyse, AnalysisConfig};
//! use faonet::bipartite::Group;
//! use faonet::table::TradeTable;
//!
//! let csv = "\
//! Reporter Countries,Partner Countries,Value
//! A,X,10
//! A,Y,20
//! B,Y,30
//! C,Z,40
//! ";
//! let table = TradeTable::from_reader(csv.as_bytes())?;
//!
//! // Build the graph and compute the metrics of each node.
//! let report = analyse(&table, &AnalysisConfig::default())?;
//!
//! assert_eq!(report.graph.graph().vertex_count(), 6);
//! assert_eq!(report.degrees(Group::Reporter), vec![2, 1, 1]);
//!
//! for row in &report.metrics {
//!     println!("{} {} {:.3}", row.node, row.degree, row.betweenness_bipartite);
//! }
//! # Ok::<(), faonet::Error>(())
//! ```

pub mod analysis;
pub mod betweenness;
pub mod bipartite;
pub mod edge;
mod error;
pub mod export;
pub mod filtering;
pub mod fitting;
pub mod graph;
pub mod metrics;
pub mod projection;
pub mod table;

pub use error::{Error, Result};
