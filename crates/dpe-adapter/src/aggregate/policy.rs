use serde_json::Value;

/// Decides how rows from different sources are paired up and what the merged
/// row looks like.
///
/// Every row handed to a policy is a comparison row: the row's own content
/// with its nested rows removed (see [`dpe_dom::comparison_row`]).
pub trait RowAggregatePolicy {
    /// The merged row shown when every source has the row and all values
    /// match.
    fn generate_aggregate_row(&self, row: &AggregateRow) -> Value;

    /// The merged row shown when sources disagree or some source lacks the
    /// row.
    fn generate_values_differ_row(&self, row: &AggregateRow) -> Value;

    /// Whether `new_row` from one source is the same logical row as
    /// `existing_row` from another.
    fn same_row(&self, new_row: &Value, existing_row: &Value) -> bool;

    /// Whether two contributions of the same logical row show the same value.
    fn values_match(&self, left: &Value, right: &Value) -> bool;
}

impl<T: RowAggregatePolicy + ?Sized> RowAggregatePolicy for Box<T> {
    fn generate_aggregate_row(&self, row: &AggregateRow) -> Value {
        (**self).generate_aggregate_row(row)
    }

    fn generate_values_differ_row(&self, row: &AggregateRow) -> Value {
        (**self).generate_values_differ_row(row)
    }

    fn same_row(&self, new_row: &Value, existing_row: &Value) -> bool {
        (**self).same_row(new_row, existing_row)
    }

    fn values_match(&self, left: &Value, right: &Value) -> bool {
        (**self).values_match(left, right)
    }
}

/// Read-only view of one aggregate node handed to row generators.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    all_match: bool,
    adapter_count: usize,
    contributors: Vec<(usize, Value)>,
}

impl AggregateRow {
    /// `contributors` pairs an adapter index with that adapter's comparison
    /// row, in adapter order.
    pub fn new(all_match: bool, adapter_count: usize, contributors: Vec<(usize, Value)>) -> Self {
        Self {
            all_match,
            adapter_count,
            contributors,
        }
    }

    pub fn all_match(&self) -> bool {
        self.all_match
    }

    /// Number of adapters attached to the aggregate, contributing or not.
    pub fn adapter_count(&self) -> usize {
        self.adapter_count
    }

    pub fn contributors(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.contributors.iter().map(|(adapter, row)| (*adapter, row))
    }

    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }

    /// Number of attached adapters that do not have this row.
    pub fn missing_count(&self) -> usize {
        self.adapter_count.saturating_sub(self.contributors.len())
    }

    pub fn value_for(&self, adapter: usize) -> Option<&Value> {
        self.contributors
            .iter()
            .find(|(index, _)| *index == adapter)
            .map(|(_, row)| row)
    }

    /// The row of the lowest-indexed contributing adapter.
    pub fn representative(&self) -> Option<&Value> {
        self.contributors.first().map(|(_, row)| row)
    }
}
