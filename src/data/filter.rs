use super::model::{Row, Table};

// ---------------------------------------------------------------------------
// Filter predicate: substring tests over the derived fields
// ---------------------------------------------------------------------------

/// The `name`, `sn` and `search` filters of a query.
///
/// Each present filter must match (logical AND); `search` itself matches a
/// row when either its name or its identifier contains the term. Terms are
/// literal substrings. Empty terms count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Lowercased, tested against `Row::normalized_name`.
    name: Option<String>,
    /// Case-sensitive, tested against `Row::identifier`.
    sn: Option<String>,
    search: Option<SearchTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchTerm {
    lowered: String,
    raw: String,
}

impl Filter {
    pub fn new(name: Option<&str>, sn: Option<&str>, search: Option<&str>) -> Self {
        Self {
            name: non_empty(name).map(str::to_lowercase),
            sn: non_empty(sn).map(str::to_string),
            search: non_empty(search).map(|term| SearchTerm {
                lowered: term.to_lowercase(),
                raw: term.to_string(),
            }),
        }
    }

    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.sn.is_none() && self.search.is_none()
    }

    pub fn matches(&self, row: &Row) -> bool {
        if let Some(name) = &self.name {
            if !row.normalized_name.contains(name.as_str()) {
                return false;
            }
        }
        if let Some(sn) = &self.sn {
            if !row.identifier.contains(sn.as_str()) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            if !row.normalized_name.contains(term.lowered.as_str())
                && !row.identifier.contains(term.raw.as_str())
            {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Return indices of rows that pass `filter`, in table order.
pub fn filtered_indices(table: &Table, filter: &Filter) -> Vec<usize> {
    if filter.is_empty() {
        return (0..table.len()).collect();
    }
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| filter.matches(row))
        .map(|(i, _)| i)
        .collect()
}

/// Return indices of rows whose identifier contains `sn`, in table order.
pub fn identifier_matches(table: &Table, sn: &str) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.identifier.contains(sn))
        .map(|(i, _)| i)
        .collect()
}
