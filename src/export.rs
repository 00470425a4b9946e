//! Writing graphs as GML and metric tables as CSV.

use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{
    bipartite::{BipartiteGraph, Node},
    error::Result,
};

/// Writes the graph in GML.
///
/// Nodes carry a `group` attribute (0 for reporters, 1 for partners) and edges a `weight`
/// attribute. A label present on both sides is suffixed with its group so every label stays
/// unique.
///
/// # Examples
///
/// ```
/// use faonet::bipartite::{BipartiteGraph, MergePolicy};
/// use faonet::export::write_gml;
/// use faonet::table::TradeRecord;
///
/// let graph = BipartiteGraph::from_records([TradeRecord::new("A", "X", 2.5)], MergePolicy::Sum);
///
/// let mut out = Vec::new();
/// write_gml(&graph, &mut out)?;
/// let gml = String::from_utf8(out).unwrap();
///
/// assert!(gml.contains("label \"A\""));
/// assert!(gml.contains("weight 2.5"));
/// # Ok::<(), faonet::Error>(())
/// ```
pub fn write_gml<W: Write>(graph: &BipartiteGraph, mut writer: W) -> Result<()> {
    let reporter_labels: HashSet<&str> = graph.reporters().iter().map(Node::label).collect();
    let shared: HashSet<&str> = graph
        .partners()
        .iter()
        .map(Node::label)
        .filter(|label| reporter_labels.contains(label))
        .collect();

    let ids: BTreeMap<&Node, usize> = graph
        .graph()
        .vertices()
        .enumerate()
        .map(|(id, node)| (node, id))
        .collect();

    writeln!(writer, "graph [")?;

    for (node, id) in &ids {
        let label = if shared.contains(node.label()) {
            format!("{} ({})", node.label(), node.group())
        } else {
            node.label().to_owned()
        };

        writeln!(writer, "  node [")?;
        writeln!(writer, "    id {id}")?;
        writeln!(writer, "    label \"{}\"", escape(&label))?;
        writeln!(writer, "    group {}", node.group().index())?;
        writeln!(writer, "  ]")?;
    }

    for (edge, weight) in graph.graph().edges() {
        // Both endpoints are vertices of the graph.
        if let (Some(source), Some(target)) = (ids.get(edge.source()), ids.get(edge.target())) {
            writeln!(writer, "  edge [")?;
            writeln!(writer, "    source {source}")?;
            writeln!(writer, "    target {target}")?;
            writeln!(writer, "    weight {}", number(weight))?;
            writeln!(writer, "  ]")?;
        }
    }

    writeln!(writer, "]")?;
    writer.flush()?;

    Ok(())
}

/// Writes the graph to a GML file.
pub fn export_gml<P: AsRef<Path>>(graph: &BipartiteGraph, path: P) -> Result<()> {
    write_gml(graph, BufWriter::new(File::create(path.as_ref())?))?;

    tracing::debug!(path = %path.as_ref().display(), "exported graph");

    Ok(())
}

/// Serializes rows as CSV, the field names of the first row forming the header.
pub fn write_rows<W, T>(rows: &[T], writer: W) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Saves rows to a CSV file.
pub fn save_rows<P, T>(rows: &[T], path: P) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    write_rows(rows, File::create(path)?)
}

//
// Helpers
//

/// GML strings are ASCII and can't hold double quotes. Quotes, ampersands and every non-ASCII
/// character are written as HTML entities.
fn escape(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            c if c.is_ascii() => escaped.push(c),
            c => escaped.push_str(&format!("&#{};", u32::from(c))),
        }
    }
    escaped
}

/// Non-finite reals are spelled the way GML readers expect.
fn number(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_owned()
    } else if value == f64::INFINITY {
        "INF".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        format!("{value:?}")
    }
}
