//! A minimal plain-text table writer for bindings results, used by the
//! comparator's `--debug` output mode. Not a registered serialization
//! format: columns are separated by a single tab and unbound cells
//! render as an empty field, sufficient for a human to eyeball a
//! mismatch without round-tripping through it.

use crate::results::BindingsResult;
use std::io::{self, Write};

pub fn write_table<W: Write>(mut out: W, result: &BindingsResult) -> io::Result<()> {
    writeln!(out, "{}", result.variables.join("\t"))?;
    for row in &result.rows {
        let cells: Vec<String> = (0..result.variables.len())
            .map(|offset| row.get(offset).map(|l| l.as_string()).unwrap_or_default())
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::row::Row;

    #[test]
    fn renders_header_then_one_line_per_row() {
        let mut row = Row::new(2, 1, 0);
        row.set(0, Some(Literal::integer(1)));
        let result = BindingsResult::new(vec!["x".to_string(), "y".to_string()], vec![row]);
        let mut buf = Vec::new();
        write_table(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "x\ty\n1\t\n");
    }
}
