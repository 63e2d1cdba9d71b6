//! `Graph` (spec §4.4): for `GRAPH ?g { P }` where `?g` is a variable,
//! iterates the dataset's named graphs in order. For each one it binds
//! the variable to the graph's IRI (stamped as row origin), resets the
//! inner pattern rowsource, and emits all matching rows tagged with
//! that origin. A graph with no name is skipped. Finishes when every
//! graph has been exhausted.

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

pub struct Graph {
    id: RowSourceId,
    inner: Box<RowSource>,
    named_graphs: Vec<Literal>,
    graph_index: usize,
    current_graph: Option<Literal>,
    started_any: bool,
    graph_variable_name: String,
    graph_column_offset: usize,
    variables: VariablesTable,
    next_offset: u64,
}

impl Graph {
    pub fn new(inner: RowSource, named_graphs: Vec<Literal>, graph_variable_name: impl Into<String>) -> Self {
        Graph {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            named_graphs,
            graph_index: 0,
            current_graph: None,
            started_any: false,
            graph_variable_name: graph_variable_name.into(),
            graph_column_offset: 0,
            variables: VariablesTable::new(),
            next_offset: 0,
        }
    }
}

impl RowSourceOp for Graph {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.set_requirements(true);
        self.inner.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()?;
        if self.variables.size() > 0 {
            return Ok(());
        }
        let mut variables = self.inner.variables().clone();
        self.graph_column_offset = variables.insert_named(self.graph_variable_name.clone());
        self.variables = variables;
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        loop {
            if self.current_graph.is_none() {
                loop {
                    if self.graph_index >= self.named_graphs.len() {
                        return Ok(None);
                    }
                    let iri = self.named_graphs[self.graph_index].clone();
                    self.graph_index += 1;
                    if iri.as_string().is_empty() {
                        continue;
                    }
                    self.inner.set_origin(Some(iri.clone()));
                    if self.started_any {
                        self.inner.reset()?;
                    }
                    self.started_any = true;
                    self.current_graph = Some(iri);
                    break;
                }
            }

            match self.inner.read_row()? {
                Some(mut row) => {
                    row.resize(self.variables.size());
                    row.set(self.graph_column_offset, self.current_graph.clone());
                    row.set_offset(self.next_offset);
                    self.next_offset += 1;
                    return Ok(Some(row));
                }
                None => self.current_graph = None,
            }
        }
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        Err(RowSourceError::ResetNotSupported)
    }

    fn set_requirements(&mut self, _preserve: bool) {}

    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource> {
        if i == 0 {
            Some(&self.inner)
        } else {
            None
        }
    }

    fn set_origin(&mut self, _term: Option<Literal>) {}

    fn size(&self) -> usize {
        self.variables.size()
    }

    fn variables(&self) -> &VariablesTable {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowsource::sequence::Sequence;

    fn pattern_with_one_row() -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("s");
        let mut row = Row::new(1, 1, 0);
        row.set(0, Some(Literal::uri("http://subject")));
        RowSource::Sequence(Sequence::new(vec![row], vars))
    }

    #[test]
    fn emits_one_tagged_row_per_named_graph() {
        let graphs = vec![Literal::uri("http://g1"), Literal::uri("http://g2")];
        let mut op = Graph::new(pattern_with_one_row(), graphs, "g");
        op.ensure_variables().unwrap();
        op.init().unwrap();

        let first = op.read_row().unwrap().unwrap();
        assert_eq!(first.get(1).unwrap().as_string(), "http://g1");
        let second = op.read_row().unwrap().unwrap();
        assert_eq!(second.get(1).unwrap().as_string(), "http://g2");
        assert!(op.read_row().unwrap().is_none());
    }

    #[test]
    fn unnamed_graphs_are_skipped() {
        let graphs = vec![Literal::uri(""), Literal::uri("http://g1")];
        let mut op = Graph::new(pattern_with_one_row(), graphs, "g");
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let row = op.read_row().unwrap().unwrap();
        assert_eq!(row.get(1).unwrap().as_string(), "http://g1");
    }
}
