//! Embedded structured data (JSON-LD).
//!
//! Pages may carry any number of `application/ld+json` blocks. Only nodes
//! typed as a person or an organization are kept; they are shallow-merged
//! in page order so later nodes override earlier ones key by key. A block
//! that fails to parse contributes nothing.

use serde_json::{Map, Value};

/// Merged person/organization properties for one page.
pub type StructuredData = Map<String, Value>;

const PROFILE_TYPES: &[&str] = &["Person", "Organization"];

fn type_matches(node: &Map<String, Value>) -> bool {
    let declared = |t: &str| {
        let t = t.rsplit(['/', ':']).next().unwrap_or(t);
        PROFILE_TYPES.contains(&t)
    };

    match node.get("@type") {
        Some(Value::String(t)) => declared(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(declared),
        _ => false,
    }
}

/// Flatten top-level arrays and `@graph` containers into candidate nodes.
fn collect_nodes(value: Value, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| collect_nodes(item, out)),
        Value::Object(mut node) => {
            if let Some(graph) = node.remove("@graph") {
                collect_nodes(graph, out);
            }
            if type_matches(&node) {
                out.push(node);
            }
        }
        _ => {}
    }
}

/// Parse one block into its person/organization nodes.
///
/// Returns `None` when the block is not valid JSON.
pub fn parse_block(raw: &str) -> Option<Vec<Map<String, Value>>> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("ignoring malformed structured data block: {e}");
            return None;
        }
    };

    let mut nodes = Vec::new();
    collect_nodes(value, &mut nodes);
    Some(nodes)
}

/// Parse and shallow-merge every block.
pub fn merge_blocks<I, S>(blocks: I) -> StructuredData
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = StructuredData::new();
    for node in blocks.into_iter().filter_map(|raw| parse_block(raw.as_ref())).flatten() {
        merged.extend(node);
    }
    merged
}

/// Reduce a JSON value to display text.
///
/// Objects give their `name`, then their `url`; arrays give their first
/// element that reduces to something.
pub fn reduce(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(node) => return node.get("name").and_then(reduce).or_else(|| node.get("url").and_then(reduce)),
        Value::Array(items) => return items.iter().find_map(reduce),
        Value::Bool(_) | Value::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Follow `path` through nested objects (taking the first element of any
/// array on the way) and reduce the value found there.
pub fn lookup(data: &StructuredData, path: &[&str]) -> Option<String> {
    let (first, rest) = path.split_first()?;
    let mut current = data.get(*first)?;

    for key in rest {
        current = match current {
            Value::Array(items) => items.first()?.get(*key)?,
            other => other.get(*key)?,
        };
    }

    reduce(current)
}
