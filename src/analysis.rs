//! The whole pipeline: table, bipartite graph, per-node metrics.

use serde::Deserialize;

use crate::{
    bipartite::{BipartiteGraph, BuildConfig, Group},
    error::{Error, Result},
    fitting::{fit_degrees, FitConfig, PowerLawFit},
    metrics::{node_metrics, MetricsConfig, NodeMetrics},
    table::{TradeRecord, TradeTable},
};

/// Restricts an analysis to the rows of a single year.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct YearFilter {
    pub column: String,
    pub year: i32,
}

/// Configuration for [`analyse`].
///
/// # Examples
///
/// ```
/// use faonet::analysis::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert!(config.prune_zero_weights);
/// assert!(config.year.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub build: BuildConfig,
    pub year: Option<YearFilter>,
    /// Whether edges weighing exactly zero are dropped before computing metrics.
    ///
    /// Default: true
    pub prune_zero_weights: bool,
    pub metrics: MetricsConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            year: None,
            prune_zero_weights: true,
            metrics: MetricsConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new(build: BuildConfig) -> Self {
        Self {
            build,
            ..Self::default()
        }
    }

    pub fn with_year(mut self, column: impl Into<String>, year: i32) -> Self {
        self.year = Some(YearFilter {
            column: column.into(),
            year,
        });
        self
    }

    pub fn with_prune_zero_weights(mut self, prune: bool) -> Self {
        self.prune_zero_weights = prune;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }
}

/// The graph an analysis ran on and the metrics of its nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkReport {
    pub graph: BipartiteGraph,
    pub metrics: Vec<NodeMetrics>,
}

impl NetworkReport {
    /// The degrees of one side, in label order.
    pub fn degrees(&self, group: Group) -> Vec<usize> {
        self.metrics
            .iter()
            .filter(|row| row.group == group)
            .map(|row| row.degree)
            .collect()
    }

    /// Fits a truncated power law to the degree distribution of one side.
    pub fn fit_degrees(&self, group: Group, config: &FitConfig) -> Result<PowerLawFit> {
        fit_degrees(&self.degrees(group), config)
    }
}

/// Builds the bipartite graph of a trade table and computes the metrics of every node.
///
/// # Examples
///
/// ```
/// use faonet::analysis::{analyse, AnalysisConfig};
/// use faonet::table::TradeTable;
///
/// let mut table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);
/// table.push_row(["A", "X", "10"]);
/// table.push_row(["A", "Y", "0"]);
///
/// let report = analyse(&table, &AnalysisConfig::default())?;
///
/// assert_eq!(report.graph.graph().edge_count(), 1);
/// assert_eq!(report.metrics.len(), 3);
/// # Ok::<(), faonet::Error>(())
/// ```
pub fn analyse(table: &TradeTable, config: &AnalysisConfig) -> Result<NetworkReport> {
    let mut graph = match &config.year {
        Some(filter) => {
            let columns = config.build.columns.clone().with_year(filter.column.as_str());
            let records: Vec<TradeRecord> = table
                .records(&columns)?
                .into_iter()
                .filter(|record| record.year == Some(filter.year))
                .collect();

            tracing::debug!(year = filter.year, rows = records.len(), "filtered records by year");

            if records.is_empty() {
                return Err(Error::EmptyTable);
            }
            BipartiteGraph::from_records(records, config.build.merge)
        }
        None => BipartiteGraph::from_table(table, &config.build)?,
    };

    if config.prune_zero_weights {
        graph = graph.remove_zero_weight_edges();
    }

    let metrics = node_metrics(&graph, &config.metrics);

    Ok(NetworkReport { graph, metrics })
}
