//! Human-readable record summaries

use std::fmt;

use super::{Entry, OutputRecord, Parameters, Table, Value, Variables};

/// One line of a summary, or a nested block of lines
enum Node {
    Line(String),
    Block(Vec<(String, Node)>),
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    format!("{n} {}", if n == 1 { singular } else { plural })
}

fn table_line(table: &Table) -> String {
    format!(
        "Table with {} and {}",
        plural(table.ncols(), "variable", "variables"),
        plural(table.nrows(), "row", "rows")
    )
}

fn value_line(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("{b} (bool)"),
        Value::Int(i) => format!("{i} (int)"),
        Value::Float(x) => format!("{x} (float)"),
        Value::Str(s) => {
            let len = s.chars().count();
            let head: String = s.chars().take(30).collect();
            if len > 20 {
                format!("'{head}...' (length {len}) (str)")
            } else {
                format!("'{head}' (str)")
            }
        }
        Value::List(items) => format!("List with {}", plural(items.len(), "entry", "entries")),
        Value::Map(map) => format!("Dictionary with {}", plural(map.len(), "key", "keys")),
        Value::Opaque(type_name) => format!("Object of type {type_name}"),
    }
}

fn entry_node(entry: &Entry) -> Node {
    match entry {
        Entry::Table(t) => Node::Line(table_line(t)),
        Entry::Value(v) => Node::Line(value_line(v)),
        Entry::Group(children) => Node::Block(
            children
                .iter()
                .map(|(k, child)| (k.clone(), entry_node(child)))
                .collect(),
        ),
    }
}

impl OutputRecord {
    fn summary_nodes(&self) -> Vec<(String, Node)> {
        let mut nodes = Vec::new();
        if let Some(log) = &self.log {
            nodes.push((
                "log".to_string(),
                Node::Line(format!("Dictionary with {}", plural(log.len(), "key", "keys"))),
            ));
        }
        match &self.parameters {
            Parameters::Empty => {}
            Parameters::Fixed(map) => nodes.push((
                "parameters".to_string(),
                Node::Line(format!("Dictionary with {}", plural(map.len(), "key", "keys"))),
            )),
            Parameters::Sampled { constants, sample } => {
                let mut children = Vec::new();
                if let Some(c) = constants {
                    children.push((
                        "constants".to_string(),
                        Node::Line(format!("Dictionary with {}", plural(c.len(), "key", "keys"))),
                    ));
                }
                if let Some(s) = sample {
                    children.push(("sample".to_string(), Node::Line(table_line(s))));
                }
                nodes.push(("parameters".to_string(), Node::Block(children)));
            }
        }
        match &self.variables {
            Variables::Empty => {}
            Variables::Single(t) => nodes.push(("variables".to_string(), Node::Line(table_line(t)))),
            Variables::PerType(tables) => nodes.push((
                "variables".to_string(),
                Node::Block(
                    tables
                        .iter()
                        .map(|(k, t)| (k.clone(), Node::Line(table_line(t))))
                        .collect(),
                ),
            )),
        }
        if let Some(t) = &self.reporters {
            nodes.push(("reporters".to_string(), Node::Line(table_line(t))));
        }
        for (key, sens) in [
            ("sensitivity", &self.sensitivity),
            ("sensitivity_conf", &self.sensitivity_conf),
        ] {
            if let Some(s) = sens {
                nodes.push((
                    key.to_string(),
                    Node::Line(format!(
                        "Sensitivity table with {} and {}",
                        plural(s.column_keys().len(), "column", "columns"),
                        plural(s.rows().len(), "row", "rows")
                    )),
                ));
            }
        }
        for (key, entry) in &self.other {
            nodes.push((key.clone(), entry_node(entry)));
        }
        nodes
    }

    /// One-line summary, e.g. `OutputRecord {3 entries}`
    #[must_use]
    pub fn short_summary(&self) -> String {
        let n = self.len();
        format!(
            "OutputRecord {{{n} entr{}}}",
            if n == 1 { "y" } else { "ies" }
        )
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[(String, Node)], depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    for (key, node) in nodes {
        write!(f, "\n{indent}'{key}': ")?;
        match node {
            Node::Line(line) => f.write_str(line)?,
            Node::Block(children) => write_nodes(f, children, depth + 1)?,
        }
    }
    Ok(())
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputRecord {")?;
        write_nodes(f, &self.summary_nodes(), 0)?;
        f.write_str("\n}")
    }
}
