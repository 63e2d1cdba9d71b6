//! SPARQL-Results-JSON reader and writer (spec §6).
//!
//! Grammar: a top-level object with `head.vars` (array of names), an
//! optional `boolean`, and `results.bindings` (an array of objects keyed
//! by variable name whose values are `{ type, value, datatype?,
//! xml:lang? }`). The reader is chunked rather than building one
//! `serde_json::Value` for the whole document: it locates the top-level
//! `head`/`boolean`/`results` members by brace-balanced scanning, then
//! walks `results.bindings` element by element, handing each closed
//! `{...}` object to `serde_json` individually so a row is available as
//! soon as its object closes.

use crate::error::ResultsError;
use crate::literal::Literal;
use crate::results::{BindingsResult, GraphResult, QueryResult};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BindingTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
}

impl BindingTerm {
    fn into_literal(self) -> Literal {
        match self.kind.as_str() {
            "uri" => Literal::uri(self.value),
            "bnode" => Literal::blank(self.value),
            _ => match (self.datatype, self.lang) {
                (Some(datatype), _) => Literal::Udt { lexical: self.value.into(), datatype: datatype.into() },
                (None, Some(lang)) => Literal::lang_string(self.value, lang),
                (None, None) => Literal::plain_string(self.value),
            },
        }
    }
}

type BindingObject = HashMap<String, BindingTerm>;

/// Find the raw text of a top-level JSON object member, by scanning
/// brace/bracket/string nesting rather than materializing a full value
/// tree. Returns `None` if the key is absent at the top level.
fn find_top_level_member<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let bytes = json.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    let needle = format!("\"{key}\"");
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
        if depth == 1 && json[i..].starts_with(&needle) {
            let mut j = i + needle.len();
            while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] as char == ':' {
                j += 1;
                while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                    j += 1;
                }
                let start = j;
                let end = scan_value_end(json, start)?;
                return Some(&json[start..end]);
            }
        }
        i += 1;
    }
    None
}

/// Given the start byte of a JSON value, return the exclusive end byte.
fn scan_value_end(json: &str, start: usize) -> Option<usize> {
    let bytes = json.as_bytes();
    let first = *bytes.get(start)? as char;
    if first == '{' || first == '[' {
        let close = if first == '{' { '}' } else { ']' };
        let open = first;
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape = false;
        for (offset, b) in bytes[start..].iter().enumerate() {
            let c = *b as char;
            if in_string {
                if escape {
                    escape = false;
                } else if c == '\\' {
                    escape = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            if c == '"' {
                in_string = true;
            } else if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
        }
        None
    } else if first == '"' {
        let mut escape = false;
        for (offset, b) in bytes[start + 1..].iter().enumerate() {
            let c = *b as char;
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                return Some(start + 1 + offset + 1);
            }
        }
        None
    } else {
        let mut end = start;
        while end < bytes.len() && !matches!(bytes[end] as char, ',' | '}' | ']' | '\n' | '\r' | '\t' | ' ') {
            end += 1;
        }
        Some(end)
    }
}

/// Split a top-level JSON array's text (including the enclosing
/// brackets) into the raw text of each element, without parsing the
/// elements themselves. This is the "chunked" step: the caller decodes
/// each chunk independently as soon as it is sliced.
fn split_array_elements(array_text: &str) -> Vec<&str> {
    let bytes = array_text.as_bytes();
    let mut elements = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    let mut start: Option<usize> = None;
    for (i, b) in bytes.iter().enumerate() {
        let c = *b as char;
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => {
                if depth == 1 && start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' | ']' => {
                depth -= 1;
                if depth == 1 {
                    if let Some(s) = start.take() {
                        elements.push(&array_text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    elements
}

/// Parse a full SPARQL-Results-JSON document into a `QueryResult`,
/// chunking the bindings array per the grammar in spec §6.
pub fn parse_query_result(json: &str) -> Result<QueryResult, ResultsError> {
    if let Some(boolean_text) = find_top_level_member(json, "boolean") {
        let value: bool = serde_json::from_str(boolean_text.trim())
            .map_err(|source| ResultsError::Json { context: "boolean".to_string(), source })?;
        return Ok(QueryResult::Boolean(value));
    }

    let head_text = find_top_level_member(json, "head")
        .ok_or_else(|| ResultsError::Malformed("missing required \"head\" member".to_string()))?;
    let head: Head =
        serde_json::from_str(head_text).map_err(|source| ResultsError::Json { context: "head".to_string(), source })?;

    let results_text = find_top_level_member(json, "results")
        .ok_or_else(|| ResultsError::Malformed("missing required \"results\" member".to_string()))?;
    let bindings_text = find_top_level_member(results_text, "bindings")
        .ok_or_else(|| ResultsError::Malformed("missing \"results.bindings\" array".to_string()))?;

    let mut rows = Vec::new();
    for (i, chunk) in split_array_elements(bindings_text).into_iter().enumerate() {
        let object: BindingObject = serde_json::from_str(chunk)
            .map_err(|source| ResultsError::Json { context: format!("results.bindings[{i}]"), source })?;
        let mut row = Row::new(head.vars.len(), 0, i as u64);
        for (name, term) in object {
            if let Some(offset) = head.vars.iter().position(|v| v == &name) {
                row.set(offset, Some(term.into_literal()));
            }
        }
        rows.push(row);
    }
    Ok(QueryResult::Bindings(BindingsResult::new(head.vars, rows)))
}

/// Parse a SPARQL-Results-JSON document describing a graph result: a
/// non-standard extension this engine supports for comparator round
/// trips, shaped as `{"graph": [{"subject":..,"predicate":..,"object":..}, ...]}`.
pub fn parse_graph_result(json: &str) -> Result<QueryResult, ResultsError> {
    #[derive(Deserialize)]
    struct WireTriple {
        subject: BindingTerm,
        predicate: BindingTerm,
        object: BindingTerm,
    }
    #[derive(Deserialize)]
    struct Wire {
        graph: Vec<WireTriple>,
    }
    let wire: Wire = serde_json::from_str(json).map_err(|source| ResultsError::Json { context: "graph".to_string(), source })?;
    let triples = wire
        .graph
        .into_iter()
        .map(|t| crate::triple::Triple::new(t.subject.into_literal(), t.predicate.into_literal(), t.object.into_literal()))
        .collect();
    Ok(QueryResult::Graph(GraphResult::new(triples)))
}

#[derive(Serialize)]
struct WireHead<'a> {
    vars: &'a [String],
}

#[derive(Serialize)]
struct WireBindingTerm {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
}

fn literal_to_wire(literal: &Literal) -> WireBindingTerm {
    match literal {
        Literal::Uri(_) => WireBindingTerm { kind: "uri", value: literal.as_string(), datatype: None, lang: None },
        Literal::Blank(_) => WireBindingTerm { kind: "bnode", value: literal.as_string(), datatype: None, lang: None },
        Literal::Str { lang, datatype, .. } => WireBindingTerm {
            kind: "literal",
            value: literal.as_string(),
            datatype: datatype.as_ref().map(|d| d.to_string()),
            lang: lang.as_ref().map(|l| l.to_string()),
        },
        Literal::Udt { datatype, .. } => {
            WireBindingTerm { kind: "literal", value: literal.as_string(), datatype: Some(datatype.to_string()), lang: None }
        }
        _ => WireBindingTerm { kind: "literal", value: literal.as_string(), datatype: None, lang: None },
    }
}

/// Write a bindings result as a SPARQL-Results-JSON document.
pub fn write_bindings<W: Write>(mut out: W, result: &BindingsResult) -> Result<(), ResultsError> {
    let mut bindings = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        let mut object = serde_json::Map::new();
        for (offset, name) in result.variables.iter().enumerate() {
            if let Some(value) = row.get(offset) {
                object.insert(name.clone(), serde_json::to_value(literal_to_wire(value)).unwrap());
            }
        }
        bindings.push(serde_json::Value::Object(object));
    }
    let document = serde_json::json!({
        "head": WireHead { vars: &result.variables },
        "results": { "bindings": bindings },
    });
    serde_json::to_writer_pretty(&mut out, &document).map_err(|source| ResultsError::Json { context: "write bindings".to_string(), source })?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Write a boolean result (ASK query) as SPARQL-Results-JSON.
pub fn write_boolean<W: Write>(mut out: W, value: bool) -> Result<(), ResultsError> {
    let document = serde_json::json!({ "head": {}, "boolean": value });
    serde_json::to_writer_pretty(&mut out, &document).map_err(|source| ResultsError::Json { context: "write boolean".to_string(), source })?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultsReader;

    #[test]
    fn parses_head_vars_and_bindings_in_declared_order() {
        let json = r#"{
            "head": { "vars": ["x", "y"] },
            "results": {
                "bindings": [
                    { "x": { "type": "uri", "value": "http://a" }, "y": { "type": "literal", "value": "1" } },
                    { "x": { "type": "bnode", "value": "b0" } }
                ]
            }
        }"#;
        let result = parse_query_result(json).unwrap();
        assert!(result.is_bindings());
        assert_eq!(result.variables(), &["x".to_string(), "y".to_string()]);
        let QueryResult::Bindings(bindings) = result else { panic!("expected bindings") };
        assert_eq!(bindings.rows.len(), 2);
        assert_eq!(bindings.rows[0].get(0).unwrap().as_string(), "http://a");
        assert!(bindings.rows[1].is_unbound(1));
    }

    #[test]
    fn parses_a_boolean_result() {
        let json = r#"{ "head": {}, "boolean": true }"#;
        let result = parse_query_result(json).unwrap();
        assert_eq!(result.get_boolean(), Some(true));
    }

    #[test]
    fn missing_head_is_malformed() {
        let json = r#"{ "results": { "bindings": [] } }"#;
        assert!(matches!(parse_query_result(json), Err(ResultsError::Malformed(_))));
    }

    #[test]
    fn write_then_parse_round_trips_a_simple_binding() {
        let mut row = Row::new(1, 1, 0);
        row.set(0, Some(Literal::integer(42)));
        let original = BindingsResult::new(vec!["n".to_string()], vec![row]);
        let mut buf = Vec::new();
        write_bindings(&mut buf, &original).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let parsed = parse_query_result(&text).unwrap();
        let QueryResult::Bindings(b) = parsed else { panic!("expected bindings") };
        assert_eq!(b.rows[0].get(0).unwrap().as_string(), "42");
    }
}
