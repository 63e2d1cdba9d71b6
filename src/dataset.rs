//! The minimal dataset contract the `Graph` rowsource iterates (spec
//! §4.4): named graphs in a stable order, each identified by an IRI
//! literal. The engine only consumes this abstraction; how a dataset is
//! populated (parsed from a file, held in memory, backed by storage) is
//! outside this crate's scope.

use crate::literal::Literal;

pub trait Dataset {
    /// Named graphs in iteration order. A dataset with no named graphs
    /// yields an empty slice, which makes the `Graph` operator finish
    /// immediately without emitting any rows.
    fn named_graphs(&self) -> &[Literal];
}

/// An in-memory dataset, used by tests and the comparator CLI's
/// `--query` mode, where the data graph is loaded wholesale up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    named_graphs: Vec<Literal>,
}

impl InMemoryDataset {
    pub fn new(named_graphs: Vec<Literal>) -> Self {
        InMemoryDataset { named_graphs }
    }
}

impl Dataset for InMemoryDataset {
    fn named_graphs(&self) -> &[Literal] {
        &self.named_graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset_has_no_named_graphs() {
        let dataset = InMemoryDataset::default();
        assert!(dataset.named_graphs().is_empty());
    }

    #[test]
    fn named_graphs_preserve_construction_order() {
        let dataset = InMemoryDataset::new(vec![Literal::uri("http://g1"), Literal::uri("http://g2")]);
        assert_eq!(dataset.named_graphs()[0].as_string(), "http://g1");
        assert_eq!(dataset.named_graphs()[1].as_string(), "http://g2");
    }
}
