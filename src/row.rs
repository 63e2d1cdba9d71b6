//! The row model (spec §3): a fixed-width vector of optional literal
//! cells plus a producer back-reference, an emission offset and a
//! GroupBy tag.

/// Identifies the rowsource that produced a row, without holding a
/// strong reference to it (rows frequently outlive the exact moment
/// their producer is borrowed, e.g. while sorting a materialized batch).
pub type RowSourceId = u64;

/// `-1` means the row has not been passed through a `GroupBy`.
pub const UNGROUPED: i64 = -1;

#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Option<crate::literal::Literal>>,
    rowsource: RowSourceId,
    offset: u64,
    group_id: i64,
}

impl Row {
    pub fn new(size: usize, rowsource: RowSourceId, offset: u64) -> Self {
        Row {
            values: vec![None; size],
            rowsource,
            offset,
            group_id: UNGROUPED,
        }
    }

    pub fn from_values(values: Vec<Option<crate::literal::Literal>>, rowsource: RowSourceId, offset: u64) -> Self {
        Row {
            values,
            rowsource,
            offset,
            group_id: UNGROUPED,
        }
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, offset: usize) -> Option<&crate::literal::Literal> {
        self.values.get(offset).and_then(|v| v.as_ref())
    }

    pub fn set(&mut self, offset: usize, value: Option<crate::literal::Literal>) {
        self.values[offset] = value;
    }

    pub fn is_unbound(&self, offset: usize) -> bool {
        self.values.get(offset).map(|v| v.is_none()).unwrap_or(true)
    }

    pub fn values(&self) -> &[Option<crate::literal::Literal>] {
        &self.values
    }

    pub fn resize(&mut self, new_size: usize) {
        self.values.resize(new_size, None);
    }

    pub fn rowsource(&self) -> RowSourceId {
        self.rowsource
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn set_group_id(&mut self, group_id: i64) {
        self.group_id = group_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn new_row_is_fully_unbound() {
        let row = Row::new(3, 1, 0);
        assert!((0..3).all(|i| row.is_unbound(i)));
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut row = Row::new(2, 1, 0);
        row.set(0, Some(Literal::integer(5)));
        assert_eq!(row.get(0).unwrap().as_string(), "5");
        assert!(row.is_unbound(1));
    }

    #[test]
    fn default_group_id_is_ungrouped() {
        let row = Row::new(1, 1, 0);
        assert_eq!(row.group_id(), UNGROUPED);
    }

    #[test]
    fn resize_pads_with_unbound_cells() {
        let mut row = Row::new(1, 1, 0);
        row.set(0, Some(Literal::integer(1)));
        row.resize(3);
        assert_eq!(row.size(), 3);
        assert!(row.is_unbound(1));
        assert!(row.is_unbound(2));
    }
}
