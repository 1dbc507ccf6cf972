use std::cmp::Ordering;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Names under which the derived fields are emitted and can be sorted on.
pub const DERIVED_PRICE: &str = "_price";
pub const DERIVED_NAME: &str = "_name";
pub const DERIVED_IDENTIFIER: &str = "_sn";

// ---------------------------------------------------------------------------
// Row – one line of the source file
// ---------------------------------------------------------------------------

/// A single parsed row plus the fields derived from it at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Raw cell text, one entry per table column. Missing cells are `""`.
    pub cells: Vec<String>,
    /// Lowercased `name` column, or `""` when the table has none.
    pub normalized_name: String,
    /// Numeric `price`, if one could be recovered from the cell text.
    pub normalized_price: Option<f64>,
    /// Value of the table's identifier column.
    pub identifier: String,
}

impl Row {
    /// Cell text for column `index`, `""` when out of range.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Table – an immutable snapshot of the source file
// ---------------------------------------------------------------------------

/// The full parsed dataset. Never mutated once built; a reload produces a
/// new `Table`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Rows in source order.
    pub rows: Vec<Row>,
    /// Header names, in source order, made unique.
    pub columns: Vec<String>,
    /// Index into `columns` of the column every row's identifier comes from.
    pub identifier_column: usize,
}

impl Table {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Name of the resolved identifier column.
    pub fn identifier_column_name(&self) -> &str {
        self.columns
            .get(self.identifier_column)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Borrow a row for JSON rendering.
    pub fn view<'a>(&'a self, row: &'a Row) -> RowView<'a> {
        RowView {
            columns: &self.columns,
            row,
        }
    }
}

// ---------------------------------------------------------------------------
// SortKey – a resolved `sort` parameter
// ---------------------------------------------------------------------------

/// The field a sort request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Name,
    Identifier,
    /// A literal source column, by index.
    Column(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    /// Resolve a `sort` value such as `price`, `-sn` or `vendor` against
    /// `table`. Unknown keys resolve to `None` (no sort).
    pub fn resolve(spec: &str, table: &Table) -> Option<Self> {
        let (descending, key) = match spec.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let field = match key {
            "price" | DERIVED_PRICE => SortField::Price,
            "name" | DERIVED_NAME => SortField::Name,
            "sn" | DERIVED_IDENTIFIER => SortField::Identifier,
            other => SortField::Column(table.column_index(other)?),
        };
        Some(Self { field, descending })
    }

    /// Compare two rows under this key.
    ///
    /// Rows without a price always sort after rows with one, in either
    /// direction.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = match self.field {
            SortField::Price => match (a.normalized_price, b.normalized_price) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            },
            SortField::Name => a.normalized_name.cmp(&b.normalized_name),
            SortField::Identifier => a.identifier.cmp(&b.identifier),
            SortField::Column(index) => a.cell(index).cmp(b.cell(index)),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A row rendered as a flat JSON object: every source column in header
/// order, then `_price`, `_name` and `_sn`.
///
/// A source column that shares a name with a derived field is shadowed by it.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (index, column) in self.columns.iter().enumerate() {
            if is_derived(column) {
                continue;
            }
            map.serialize_entry(column, self.row.cell(index))?;
        }
        map.serialize_entry(DERIVED_PRICE, &self.row.normalized_price)?;
        map.serialize_entry(DERIVED_NAME, &self.row.normalized_name)?;
        map.serialize_entry(DERIVED_IDENTIFIER, &self.row.identifier)?;
        map.end()
    }
}

fn is_derived(column: &str) -> bool {
    matches!(column, DERIVED_PRICE | DERIVED_NAME | DERIVED_IDENTIFIER)
}

/// One page of a filtered, sorted query.
#[derive(Debug, serde::Serialize)]
pub struct Page<'a> {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub data: Vec<RowView<'a>>,
}

/// Every row whose identifier contains a given substring.
#[derive(Debug, serde::Serialize)]
pub struct Lookup<'a> {
    pub total: usize,
    pub data: Vec<RowView<'a>>,
}
