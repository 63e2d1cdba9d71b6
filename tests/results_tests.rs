//! End-to-end SPARQL-Results-JSON round trips through the public API.

use rowsource_engine::literal::Literal;
use rowsource_engine::results::json::{parse_query_result, write_bindings, write_boolean};
use rowsource_engine::results::table::write_table;
use rowsource_engine::results::{BindingsResult, QueryResult, ResultsReader};
use rowsource_engine::row::Row;

#[test]
fn a_multi_row_document_parses_with_rows_in_declared_order() {
    let json = r#"{
        "head": { "vars": ["name", "age"] },
        "results": {
            "bindings": [
                { "name": { "type": "literal", "value": "Alice" }, "age": { "type": "literal", "value": "30", "datatype": "http://www.w3.org/2001/XMLSchema#integer" } },
                { "name": { "type": "literal", "value": "Bob" } }
            ]
        }
    }"#;
    let mut result = parse_query_result(json).unwrap();
    assert_eq!(result.variables(), &["name".to_string(), "age".to_string()]);
    let first = result.next().unwrap();
    assert_eq!(first.get(0).unwrap().as_string(), "Alice");
    let second = result.next().unwrap();
    assert_eq!(second.get(0).unwrap().as_string(), "Bob");
    assert!(second.is_unbound(1));
    assert!(result.next().is_none());
}

#[test]
fn writing_then_parsing_preserves_every_cell() {
    let mut row = Row::new(2, 1, 0);
    row.set(0, Some(Literal::uri("http://example.org/a")));
    row.set(1, Some(Literal::lang_string("bonjour", "fr")));
    let original = BindingsResult::new(vec!["s".to_string(), "label".to_string()], vec![row]);

    let mut buf = Vec::new();
    write_bindings(&mut buf, &original).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let parsed = parse_query_result(&text).unwrap();
    let QueryResult::Bindings(b) = parsed else { panic!("expected bindings") };
    assert_eq!(b.rows[0].get(0).unwrap().as_string(), "http://example.org/a");
    assert_eq!(b.rows[0].get(1).unwrap().as_string(), "bonjour");
}

#[test]
fn boolean_documents_round_trip() {
    let mut buf = Vec::new();
    write_boolean(&mut buf, false).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let parsed = parse_query_result(&text).unwrap();
    assert_eq!(parsed.get_boolean(), Some(false));
}

#[test]
fn table_writer_emits_one_line_per_row_with_a_header() {
    let mut row = Row::new(1, 1, 0);
    row.set(0, Some(Literal::integer(7)));
    let result = BindingsResult::new(vec!["n".to_string()], vec![row]);
    let mut buf = Vec::new();
    write_table(&mut buf, &result).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "n\n7\n");
}
